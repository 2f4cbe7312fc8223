use shared::{ReservationRecord, StockKind};
use std::sync::Arc;
use std::time::Duration;
use crate::error::{parse_item_id, InventoryError};
use crate::store::{bounded, StockStore};

/// Read side of the reservation ledger. Rows are only ever written by the
/// reservation engine.
pub struct LedgerQuery {
    store: Arc<dyn StockStore>,
    op_timeout: Duration,
}

impl LedgerQuery {
    pub fn new(store: Arc<dyn StockStore>, op_timeout: Duration) -> Self {
        Self { store, op_timeout }
    }

    pub async fn list(&self, kind: StockKind) -> Result<Vec<ReservationRecord>, InventoryError> {
        Ok(bounded(self.op_timeout, self.store.list_reservations(kind)).await?)
    }

    pub async fn list_for_item(&self, kind: StockKind, item_id: &str) -> Result<Vec<ReservationRecord>, InventoryError> {
        let item_id = parse_item_id(item_id)?;
        if bounded(self.op_timeout, self.store.get_item(kind, item_id)).await?.is_none() {
            return Err(InventoryError::NotFound { kind, item_id });
        }
        Ok(bounded(self.op_timeout, self.store.list_reservations_for_item(kind, item_id)).await?)
    }
}
