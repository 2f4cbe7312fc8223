use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;
use shared::{ReservationRecord, StockItem, StockKind};
use std::collections::HashMap;
use uuid::Uuid;
use crate::store::{NewReservation, NewStockItem, StockStore, StoreError};

#[derive(Default)]
struct Tables {
    // Insertion order; listings walk these in reverse.
    items: Vec<StockItem>,
    ledger: Vec<ReservationRecord>,
}

impl Tables {
    fn item_mut(&mut self, item_id: Uuid) -> Option<&mut StockItem> {
        self.items.iter_mut().find(|item| item.item_id == item_id)
    }

    fn push_reservation(&mut self, entry: NewReservation) -> Result<ReservationRecord, StoreError> {
        if !self.items.iter().any(|item| item.item_id == entry.item_id) {
            return Err(StoreError::Backend(format!(
                "ledger row references unknown item {}",
                entry.item_id
            )));
        }
        if self.ledger.iter().any(|record| record.record_id == entry.record_id) {
            return Err(StoreError::Backend(format!(
                "duplicate ledger record {}",
                entry.record_id
            )));
        }
        let record = ReservationRecord {
            record_id: entry.record_id,
            item_id: entry.item_id,
            requester_label: entry.requester_label,
            location_label: entry.location_label,
            quantity: entry.quantity,
            created_at: Utc::now(),
        };
        self.ledger.push(record.clone());
        Ok(record)
    }
}

/// Process-local store for development runs and tests. Each call takes the
/// table lock once, so the guarded decrement and the atomic reservation are
/// evaluated against a consistent view.
#[derive(Default)]
pub struct MemoryStockStore {
    tables: Mutex<HashMap<StockKind, Tables>>,
}

impl MemoryStockStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn with_tables<T>(&self, kind: StockKind, f: impl FnOnce(&mut Tables) -> T) -> T {
        let mut tables = self.tables.lock();
        f(tables.entry(kind).or_default())
    }
}

#[async_trait]
impl StockStore for MemoryStockStore {
    async fn list_items(&self, kind: StockKind) -> Result<Vec<StockItem>, StoreError> {
        Ok(self.with_tables(kind, |t| t.items.iter().rev().cloned().collect()))
    }

    async fn get_item(&self, kind: StockKind, item_id: Uuid) -> Result<Option<StockItem>, StoreError> {
        Ok(self.with_tables(kind, |t| t.item_mut(item_id).map(|item| item.clone())))
    }

    async fn insert_item(&self, kind: StockKind, item: NewStockItem) -> Result<StockItem, StoreError> {
        self.with_tables(kind, |t| {
            if t.items.iter().any(|existing| existing.item_id == item.item_id) {
                return Err(StoreError::Backend(format!("duplicate item {}", item.item_id)));
            }
            let created = StockItem {
                item_id: item.item_id,
                name: item.name,
                quantity: item.quantity,
                created_at: Utc::now(),
            };
            t.items.push(created.clone());
            Ok(created)
        })
    }

    async fn decrement_if_available(
        &self,
        kind: StockKind,
        item_id: Uuid,
        quantity: i32,
    ) -> Result<Option<StockItem>, StoreError> {
        Ok(self.with_tables(kind, |t| match t.item_mut(item_id) {
            Some(item) if item.quantity >= quantity => {
                item.quantity -= quantity;
                Some(item.clone())
            }
            _ => None,
        }))
    }

    async fn credit(&self, kind: StockKind, item_id: Uuid, quantity: i32) -> Result<(), StoreError> {
        self.with_tables(kind, |t| match t.item_mut(item_id) {
            Some(item) => {
                item.quantity += quantity;
                Ok(())
            }
            None => Err(StoreError::MissingRow(item_id)),
        })
    }

    async fn append_reservation(
        &self,
        kind: StockKind,
        entry: NewReservation,
    ) -> Result<ReservationRecord, StoreError> {
        self.with_tables(kind, |t| t.push_reservation(entry))
    }

    async fn reserve_atomic(
        &self,
        kind: StockKind,
        entry: NewReservation,
    ) -> Result<Option<ReservationRecord>, StoreError> {
        self.with_tables(kind, |t| {
            let available = match t.item_mut(entry.item_id) {
                Some(item) => item.quantity >= entry.quantity,
                None => false,
            };
            if !available {
                return Ok(None);
            }
            let (item_id, quantity) = (entry.item_id, entry.quantity);
            let record = t.push_reservation(entry)?;
            if let Some(item) = t.item_mut(item_id) {
                item.quantity -= quantity;
            }
            Ok(Some(record))
        })
    }

    async fn list_reservations(&self, kind: StockKind) -> Result<Vec<ReservationRecord>, StoreError> {
        Ok(self.with_tables(kind, |t| t.ledger.iter().rev().cloned().collect()))
    }

    async fn get_reservation(
        &self,
        kind: StockKind,
        record_id: Uuid,
    ) -> Result<Option<ReservationRecord>, StoreError> {
        Ok(self.with_tables(kind, |t| {
            t.ledger.iter().find(|record| record.record_id == record_id).cloned()
        }))
    }

    async fn list_reservations_for_item(
        &self,
        kind: StockKind,
        item_id: Uuid,
    ) -> Result<Vec<ReservationRecord>, StoreError> {
        Ok(self.with_tables(kind, |t| {
            t.ledger
                .iter()
                .rev()
                .filter(|record| record.item_id == item_id)
                .cloned()
                .collect()
        }))
    }
}
