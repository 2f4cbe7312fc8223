use shared::{CreateItemRequest, StockItem, StockKind};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use uuid::Uuid;
use crate::error::{parse_item_id, InventoryError};
use crate::store::{bounded, NewStockItem, StockStore};

/// Read and register stock items.
pub struct Catalog {
    store: Arc<dyn StockStore>,
    op_timeout: Duration,
}

impl Catalog {
    pub fn new(store: Arc<dyn StockStore>, op_timeout: Duration) -> Self {
        Self { store, op_timeout }
    }

    pub async fn list(&self, kind: StockKind) -> Result<Vec<StockItem>, InventoryError> {
        Ok(bounded(self.op_timeout, self.store.list_items(kind)).await?)
    }

    pub async fn get(&self, kind: StockKind, item_id: &str) -> Result<StockItem, InventoryError> {
        let item_id = parse_item_id(item_id)?;
        bounded(self.op_timeout, self.store.get_item(kind, item_id))
            .await?
            .ok_or(InventoryError::NotFound { kind, item_id })
    }

    pub async fn create(&self, kind: StockKind, request: CreateItemRequest) -> Result<StockItem, InventoryError> {
        let name = request.name.trim();
        if name.is_empty() {
            return Err(InventoryError::invalid("name is required"));
        }
        if request.quantity < 0 {
            return Err(InventoryError::invalid("quantity must be >= 0"));
        }

        let new_item = NewStockItem {
            item_id: Uuid::new_v4(),
            name: name.to_string(),
            quantity: request.quantity,
        };
        let item = bounded(self.op_timeout, self.store.insert_item(kind, new_item)).await?;

        info!("Registered {} item {} ({}) with quantity {}", kind, item.item_id, item.name, item.quantity);
        Ok(item)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory_store::MemoryStockStore;
    use crate::testing::{FlakyStore, TEST_TIMEOUT};

    fn catalog() -> Catalog {
        Catalog::new(Arc::new(MemoryStockStore::new()), TEST_TIMEOUT)
    }

    #[tokio::test]
    async fn create_stores_trimmed_name_and_quantity() {
        let catalog = catalog();
        let item = catalog
            .create(StockKind::Medicine, CreateItemRequest::new("  Paracetamol ", 10))
            .await
            .unwrap();

        assert_eq!(item.name, "Paracetamol");
        assert_eq!(item.quantity, 10);
        assert_eq!(catalog.get(StockKind::Medicine, &item.item_id.to_string()).await.unwrap(), item);
    }

    #[tokio::test]
    async fn create_accepts_zero_quantity() {
        let item = catalog()
            .create(StockKind::Tool, CreateItemRequest::new("Stretcher", 0))
            .await
            .unwrap();
        assert_eq!(item.quantity, 0);
    }

    #[tokio::test]
    async fn create_rejects_blank_name_and_negative_quantity() {
        let catalog = catalog();

        let err = catalog
            .create(StockKind::Tool, CreateItemRequest::new("  ", 1))
            .await
            .unwrap_err();
        assert!(matches!(err, InventoryError::InvalidArgument(_)));

        let err = catalog
            .create(StockKind::Tool, CreateItemRequest::new("Crutches", -1))
            .await
            .unwrap_err();
        assert!(matches!(err, InventoryError::InvalidArgument(_)));

        assert!(catalog.list(StockKind::Tool).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn list_is_newest_first_and_repeatable() {
        let catalog = catalog();
        for name in ["Gauze", "Betadine", "Cotton"] {
            catalog
                .create(StockKind::Medicine, CreateItemRequest::new(name, 5))
                .await
                .unwrap();
        }

        let first = catalog.list(StockKind::Medicine).await.unwrap();
        let names: Vec<_> = first.iter().map(|item| item.name.as_str()).collect();
        assert_eq!(names, ["Cotton", "Betadine", "Gauze"]);

        let second = catalog.list(StockKind::Medicine).await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn get_reports_missing_and_malformed_ids() {
        let catalog = catalog();
        let missing = Uuid::new_v4();

        let err = catalog.get(StockKind::Medicine, &missing.to_string()).await.unwrap_err();
        assert!(matches!(err, InventoryError::NotFound { item_id, .. } if item_id == missing));

        let err = catalog.get(StockKind::Medicine, "").await.unwrap_err();
        assert!(matches!(err, InventoryError::InvalidArgument(_)));
    }

    #[tokio::test]
    async fn stalled_store_surfaces_as_storage_unavailable() {
        let store = Arc::new(FlakyStore::new());
        store.stall_reads(true);
        let catalog = Catalog::new(store, TEST_TIMEOUT);

        let err = catalog.list(StockKind::Tool).await.unwrap_err();
        assert!(matches!(err, InventoryError::StorageUnavailable(_)));
    }
}
