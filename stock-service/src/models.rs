use diesel::prelude::*;
use uuid::Uuid;
use chrono::{DateTime, Utc};
use shared::*;

// Both kinds share column layouts, so one row struct serves `medicine` and `tools`.
#[derive(Debug, Clone, Queryable)]
pub struct DbStockItem {
    pub item_id: Uuid,
    pub name: String,
    pub quantity: i32,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Queryable)]
pub struct DbReservation {
    pub record_id: Uuid,
    pub item_id: Uuid,
    pub requester_label: String,
    pub location_label: String,
    pub quantity: i32,
    pub created_at: DateTime<Utc>,
}

impl From<DbStockItem> for StockItem {
    fn from(row: DbStockItem) -> Self {
        Self {
            item_id: row.item_id,
            name: row.name,
            quantity: row.quantity,
            created_at: row.created_at,
        }
    }
}

impl From<DbReservation> for ReservationRecord {
    fn from(row: DbReservation) -> Self {
        Self {
            record_id: row.record_id,
            item_id: row.item_id,
            requester_label: row.requester_label,
            location_label: row.location_label,
            quantity: row.quantity,
            created_at: row.created_at,
        }
    }
}
