use async_trait::async_trait;
use shared::{ReservationRecord, StockItem, StockKind};
use std::future::Future;
use std::time::Duration;
use uuid::Uuid;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] diesel::result::Error),

    #[error("connection pool error: {0}")]
    Pool(String),

    #[error("store operation timed out after {0:?}")]
    Timeout(Duration),

    #[error("stock item {0} has no row to update")]
    MissingRow(Uuid),

    #[error("outcome unconfirmed: {0}")]
    Unconfirmed(String),

    #[error("{0}")]
    Backend(String),
}

#[derive(Debug, Clone)]
pub struct NewStockItem {
    pub item_id: Uuid,
    pub name: String,
    pub quantity: i32,
}

#[derive(Debug, Clone)]
pub struct NewReservation {
    pub record_id: Uuid,
    pub item_id: Uuid,
    pub requester_label: String,
    pub location_label: String,
    pub quantity: i32,
}

#[async_trait]
pub trait StockStore: Send + Sync {
    async fn list_items(&self, kind: StockKind) -> Result<Vec<StockItem>, StoreError>;

    async fn get_item(&self, kind: StockKind, item_id: Uuid) -> Result<Option<StockItem>, StoreError>;

    async fn insert_item(&self, kind: StockKind, item: NewStockItem) -> Result<StockItem, StoreError>;

    // `None` when the `quantity >= n` guard matched zero rows.
    async fn decrement_if_available(
        &self,
        kind: StockKind,
        item_id: Uuid,
        quantity: i32,
    ) -> Result<Option<StockItem>, StoreError>;

    async fn credit(&self, kind: StockKind, item_id: Uuid, quantity: i32) -> Result<(), StoreError>;

    async fn append_reservation(
        &self,
        kind: StockKind,
        entry: NewReservation,
    ) -> Result<ReservationRecord, StoreError>;

    async fn reserve_atomic(
        &self,
        kind: StockKind,
        entry: NewReservation,
    ) -> Result<Option<ReservationRecord>, StoreError>;

    async fn list_reservations(&self, kind: StockKind) -> Result<Vec<ReservationRecord>, StoreError>;

    async fn get_reservation(
        &self,
        kind: StockKind,
        record_id: Uuid,
    ) -> Result<Option<ReservationRecord>, StoreError>;

    async fn list_reservations_for_item(
        &self,
        kind: StockKind,
        item_id: Uuid,
    ) -> Result<Vec<ReservationRecord>, StoreError>;
}

pub async fn bounded<T, F>(limit: Duration, op: F) -> Result<T, StoreError>
where
    F: Future<Output = Result<T, StoreError>>,
{
    tokio::time::timeout(limit, op)
        .await
        .map_err(|_| StoreError::Timeout(limit))?
}
