use crate::config::Config;
use crate::db::Store;

pub async fn cmd_items_list(config: &Config) -> anyhow::Result<()> {
    let store = Store::new(&config.general.database_path).await?;
    let items = store.list_items().await?;

    if items.is_empty() {
        println!("No items in the catalog.");
        return Ok(());
    }

    println!("Items ({} total)", items.len());
    println!("{:-<70}", "");
    println!("{:<6} {:<14} {:<30} {:>8} {:>10}", "ID", "Code", "Name", "Qty", "Rate");

    for item in &items {
        println!(
            "{:<6} {:<14} {:<30} {:>8} {:>10.2}",
            item.id, item.code, item.name, item.quantity, item.rate
        );
    }

    let stock_value: f64 = items.iter().map(|i| i.quantity as f64 * i.rate).sum();
    println!();
    println!("Total stock value: {stock_value:.2}");

    Ok(())
}
