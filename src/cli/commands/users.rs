use crate::config::Config;
use crate::db::Store;

pub async fn cmd_users_list(config: &Config) -> anyhow::Result<()> {
    let store = Store::new(&config.general.database_path).await?;
    let users = store.list_users().await?;

    if users.is_empty() {
        println!("No users registered.");
        return Ok(());
    }

    println!("Users ({} total)", users.len());
    println!("{:-<70}", "");

    for user in users {
        let indicator = if user.status.is_verified() { "✓" } else { "…" };
        println!("{} {} <{}>", indicator, user.username, user.email);
        println!(
            "  ID: {} | Status: {} | Roles: {}",
            user.id,
            user.status,
            user.authorities.join(", ")
        );
    }

    println!();
    println!("Legend: ✓ Verified | … Awaiting email verification");

    Ok(())
}

pub async fn cmd_users_show(config: &Config, id: i32) -> anyhow::Result<()> {
    let store = Store::new(&config.general.database_path).await?;

    let Some(user) = store.get_user(id).await? else {
        println!("User with ID {id} not found.");
        return Ok(());
    };

    println!("User: {}", user.username);
    println!("{:-<70}", "");
    println!("ID:          {}", user.id);
    println!("Email:       {}", user.email);
    println!("Status:      {}", user.status);
    println!("Authorities: {}", user.authorities.join(", "));
    println!("Created:     {}", user.created_at);
    println!("Updated:     {}", user.updated_at);

    if let Some(verifier) = store.get_email_verifier_by_user_id(user.id).await? {
        println!();
        println!(
            "Pending verification sent to {} at {}",
            verifier.email, verifier.created_at
        );
    }

    Ok(())
}

pub async fn cmd_users_delete(config: &Config, id: i32, yes: bool) -> anyhow::Result<()> {
    let store = Store::new(&config.general.database_path).await?;

    let Some(user) = store.get_user(id).await? else {
        println!("User with ID {id} not found.");
        return Ok(());
    };

    if !yes {
        println!("Delete user '{}' (ID: {})?", user.username, user.id);
        println!("Enter 'y' to confirm, anything else to cancel:");

        let mut input = String::new();
        std::io::stdin().read_line(&mut input)?;

        if !input.trim().eq_ignore_ascii_case("y") {
            println!("Cancelled.");
            return Ok(());
        }
    }

    if store.delete_user(id).await? {
        println!("✓ Deleted: {}", user.username);
    } else {
        println!("Failed to delete user.");
    }

    Ok(())
}
