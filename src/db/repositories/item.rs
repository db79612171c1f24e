use crate::entities::{items, prelude::*};
use anyhow::{Context, Result};
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, QueryOrder, Set};
use tracing::info;

pub use crate::entities::items::Model as Item;

/// Column values for inserting or replacing an item.
#[derive(Debug, Clone, PartialEq)]
pub struct ItemFields {
    pub name: String,
    pub code: String,
    pub description: Option<String>,
    pub quantity: i64,
    pub rate: f64,
}

/// Repository for inventory items
pub struct ItemRepository {
    conn: DatabaseConnection,
}

impl ItemRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn list(&self) -> Result<Vec<Item>> {
        Items::find()
            .order_by_asc(items::Column::Id)
            .all(&self.conn)
            .await
            .context("Failed to list items")
    }

    pub async fn get(&self, id: i32) -> Result<Option<Item>> {
        Items::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query item by ID")
    }

    pub async fn add(&self, fields: ItemFields) -> Result<Item> {
        let now = chrono::Utc::now().to_rfc3339();

        let item = items::ActiveModel {
            name: Set(fields.name),
            code: Set(fields.code),
            description: Set(fields.description),
            quantity: Set(fields.quantity),
            rate: Set(fields.rate),
            created_at: Set(now.clone()),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&self.conn)
        .await?;

        info!("Added item {}: {}", item.id, item.code);
        Ok(item)
    }

    /// Replaces all editable columns. Returns `None` when the item does not exist.
    pub async fn update(&self, id: i32, fields: ItemFields) -> Result<Option<Item>> {
        let Some(existing) = Items::find_by_id(id).one(&self.conn).await? else {
            return Ok(None);
        };

        let mut active: items::ActiveModel = existing.into();
        active.name = Set(fields.name);
        active.code = Set(fields.code);
        active.description = Set(fields.description);
        active.quantity = Set(fields.quantity);
        active.rate = Set(fields.rate);
        active.updated_at = Set(chrono::Utc::now().to_rfc3339());

        let item = active.update(&self.conn).await?;
        Ok(Some(item))
    }

    pub async fn remove(&self, id: i32) -> Result<bool> {
        let result = Items::delete_by_id(id).exec(&self.conn).await?;

        let removed = result.rows_affected > 0;
        if removed {
            info!("Removed item with ID: {}", id);
        }
        Ok(removed)
    }
}
