//! `SeaORM` implementation of the `ItemService` trait.

use async_trait::async_trait;

use crate::db::{Store, unique_violation};
use crate::services::item_service::{ItemDto, ItemError, ItemInput, ItemService};

pub struct SeaOrmItemService {
    store: Store,
}

impl SeaOrmItemService {
    #[must_use]
    pub const fn new(store: Store) -> Self {
        Self { store }
    }

    fn map_write_error(code: &str, err: anyhow::Error) -> ItemError {
        if unique_violation(&err).is_some() {
            ItemError::Conflict(format!("Item code already exists: {code}"))
        } else {
            ItemError::from(err)
        }
    }
}

#[async_trait]
impl ItemService for SeaOrmItemService {
    async fn list(&self) -> Result<Vec<ItemDto>, ItemError> {
        let items = self.store.list_items().await?;
        Ok(items.into_iter().map(ItemDto::from).collect())
    }

    async fn get(&self, id: i32) -> Result<ItemDto, ItemError> {
        self.store
            .get_item(id)
            .await?
            .map(ItemDto::from)
            .ok_or(ItemError::NotFound(id))
    }

    async fn create(&self, input: ItemInput) -> Result<ItemDto, ItemError> {
        let fields = input.validate()?;
        let code = fields.code.clone();

        let item = self
            .store
            .add_item(fields)
            .await
            .map_err(|e| Self::map_write_error(&code, e))?;

        Ok(item.into())
    }

    async fn update(&self, id: i32, input: ItemInput) -> Result<ItemDto, ItemError> {
        let fields = input.validate()?;
        let code = fields.code.clone();

        self.store
            .update_item(id, fields)
            .await
            .map_err(|e| Self::map_write_error(&code, e))?
            .map(ItemDto::from)
            .ok_or(ItemError::NotFound(id))
    }

    async fn delete(&self, id: i32) -> Result<(), ItemError> {
        if self.store.remove_item(id).await? {
            Ok(())
        } else {
            Err(ItemError::NotFound(id))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn setup() -> SeaOrmItemService {
        let db_path = std::env::temp_dir().join(format!(
            "stockkeeper-item-service-test-{}.db",
            uuid::Uuid::new_v4()
        ));
        let store = Store::new(&format!("sqlite:{}", db_path.display()))
            .await
            .expect("failed to open store");
        SeaOrmItemService::new(store)
    }

    fn input(name: &str, code: &str) -> ItemInput {
        ItemInput {
            name: name.to_string(),
            code: code.to_string(),
            description: Some("Steel".to_string()),
            quantity: 10,
            rate: 1.5,
        }
    }

    #[tokio::test]
    async fn test_create_get_update_delete() {
        let service = setup().await;

        let created = service.create(input("Bolt", "B-1")).await.unwrap();
        assert_eq!(created.code, "B-1");
        assert_eq!(service.get(created.id).await.unwrap(), created);

        let updated = service
            .update(
                created.id,
                ItemInput {
                    quantity: 4,
                    ..input("Bolt M6", "B-1")
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.name, "Bolt M6");
        assert_eq!(updated.quantity, 4);

        service.delete(created.id).await.unwrap();
        assert!(matches!(
            service.get(created.id).await,
            Err(ItemError::NotFound(id)) if id == created.id
        ));
        assert!(matches!(
            service.delete(created.id).await,
            Err(ItemError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_duplicate_code_is_conflict() {
        let service = setup().await;

        service.create(input("Bolt", "B-1")).await.unwrap();
        let nut = service.create(input("Nut", "N-1")).await.unwrap();

        assert!(matches!(
            service.create(input("Other bolt", "B-1")).await,
            Err(ItemError::Conflict(_))
        ));
        assert!(matches!(
            service.update(nut.id, input("Nut", "B-1")).await,
            Err(ItemError::Conflict(_))
        ));
        assert_eq!(service.list().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_update_missing_item() {
        let service = setup().await;

        assert!(matches!(
            service.update(404, input("Bolt", "B-1")).await,
            Err(ItemError::NotFound(404))
        ));
    }

    #[tokio::test]
    async fn test_invalid_input_writes_nothing() {
        let service = setup().await;

        assert!(matches!(
            service.create(input("", "B-1")).await,
            Err(ItemError::Validation(_))
        ));
        assert!(service.list().await.unwrap().is_empty());
    }
}
