//! Domain service for the inventory catalog.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::db::{Item, ItemFields};

/// Errors specific to item operations.
#[derive(Debug, Error)]
pub enum ItemError {
    #[error("Item not found: {0}")]
    NotFound(i32),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<sea_orm::DbErr> for ItemError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for ItemError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

/// Client-supplied item fields for create and full update.
#[derive(Debug, Clone, Deserialize)]
pub struct ItemInput {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub quantity: i64,
    #[serde(default)]
    pub rate: f64,
}

impl ItemInput {
    /// Checks the field rules and returns trimmed column values.
    pub fn validate(self) -> Result<ItemFields, ItemError> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(ItemError::Validation("Item name cannot be empty".to_string()));
        }

        let code = self.code.trim();
        if code.is_empty() {
            return Err(ItemError::Validation("Item code cannot be empty".to_string()));
        }

        if self.quantity < 0 {
            return Err(ItemError::Validation(
                "Quantity cannot be negative".to_string(),
            ));
        }

        if !self.rate.is_finite() || self.rate < 0.0 {
            return Err(ItemError::Validation(
                "Rate must be a non-negative number".to_string(),
            ));
        }

        let description = self
            .description
            .map(|d| d.trim().to_string())
            .filter(|d| !d.is_empty());

        Ok(ItemFields {
            name: name.to_string(),
            code: code.to_string(),
            description,
            quantity: self.quantity,
            rate: self.rate,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ItemDto {
    pub id: i32,
    pub name: String,
    pub code: String,
    pub description: Option<String>,
    pub quantity: i64,
    pub rate: f64,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Item> for ItemDto {
    fn from(item: Item) -> Self {
        Self {
            id: item.id,
            name: item.name,
            code: item.code,
            description: item.description,
            quantity: item.quantity,
            rate: item.rate,
            created_at: item.created_at,
            updated_at: item.updated_at,
        }
    }
}

/// Domain service trait for items.
#[async_trait::async_trait]
pub trait ItemService: Send + Sync {
    async fn list(&self) -> Result<Vec<ItemDto>, ItemError>;

    async fn get(&self, id: i32) -> Result<ItemDto, ItemError>;

    /// Creates an item. A code already in use yields [`ItemError::Conflict`].
    async fn create(&self, input: ItemInput) -> Result<ItemDto, ItemError>;

    /// Replaces every field of an existing item.
    async fn update(&self, id: i32, input: ItemInput) -> Result<ItemDto, ItemError>;

    async fn delete(&self, id: i32) -> Result<(), ItemError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(name: &str, code: &str, quantity: i64, rate: f64) -> ItemInput {
        ItemInput {
            name: name.to_string(),
            code: code.to_string(),
            description: None,
            quantity,
            rate,
        }
    }

    #[test]
    fn test_validate_trims_fields() {
        let fields = ItemInput {
            description: Some("   ".to_string()),
            ..input("  Bolt ", " B-1 ", 3, 0.25)
        }
        .validate()
        .unwrap();

        assert_eq!(fields.name, "Bolt");
        assert_eq!(fields.code, "B-1");
        assert_eq!(fields.description, None);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        assert!(matches!(
            input(" ", "B-1", 1, 1.0).validate(),
            Err(ItemError::Validation(_))
        ));
        assert!(matches!(
            input("Bolt", "", 1, 1.0).validate(),
            Err(ItemError::Validation(_))
        ));
        assert!(matches!(
            input("Bolt", "B-1", -1, 1.0).validate(),
            Err(ItemError::Validation(_))
        ));
        assert!(matches!(
            input("Bolt", "B-1", 1, -0.5).validate(),
            Err(ItemError::Validation(_))
        ));
        assert!(matches!(
            input("Bolt", "B-1", 1, f64::NAN).validate(),
            Err(ItemError::Validation(_))
        ));
    }

    #[test]
    fn test_validate_accepts_zero_stock() {
        assert!(input("Bolt", "B-1", 0, 0.0).validate().is_ok());
    }
}
