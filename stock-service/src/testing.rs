//! Test doubles: a fault-injecting store and a recording hazard sink.

use async_trait::async_trait;
use parking_lot::Mutex;
use shared::{ReservationRecord, StockHazard, StockItem, StockKind};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use uuid::Uuid;
use crate::hazard::HazardSink;
use crate::memory_store::MemoryStockStore;
use crate::store::{NewReservation, NewStockItem, StockStore, StoreError};

pub const TEST_TIMEOUT: Duration = Duration::from_millis(200);

pub async fn seed_item(store: &dyn StockStore, kind: StockKind, name: &str, quantity: i32) -> StockItem {
    store
        .insert_item(
            kind,
            NewStockItem {
                item_id: Uuid::new_v4(),
                name: name.to_string(),
                quantity,
            },
        )
        .await
        .unwrap()
}

/// Wraps [`MemoryStockStore`] and fails or stalls selected operations.
#[derive(Default)]
pub struct FlakyStore {
    inner: MemoryStockStore,
    stall_reads: AtomicBool,
    fail_appends: AtomicBool,
    fail_credits: AtomicBool,
    fail_lookups: AtomicBool,
    // Writes that commit and then never acknowledge.
    hang_after_decrement: AtomicBool,
    hang_after_append: AtomicBool,
    // Ledger writes that hang before reaching the table.
    hang_before_append: AtomicBool,
    // Units another caller takes right before our next guarded write.
    interloper: Mutex<Option<i32>>,
}

impl FlakyStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stall_reads(&self, on: bool) {
        self.stall_reads.store(on, Ordering::SeqCst);
    }

    pub fn fail_appends(&self, on: bool) {
        self.fail_appends.store(on, Ordering::SeqCst);
    }

    pub fn fail_credits(&self, on: bool) {
        self.fail_credits.store(on, Ordering::SeqCst);
    }

    pub fn fail_lookups(&self, on: bool) {
        self.fail_lookups.store(on, Ordering::SeqCst);
    }

    pub fn hang_after_decrement(&self, on: bool) {
        self.hang_after_decrement.store(on, Ordering::SeqCst);
    }

    pub fn hang_after_append(&self, on: bool) {
        self.hang_after_append.store(on, Ordering::SeqCst);
    }

    pub fn hang_before_append(&self, on: bool) {
        self.hang_before_append.store(on, Ordering::SeqCst);
    }

    pub fn race_next_decrement(&self, quantity: i32) {
        *self.interloper.lock() = Some(quantity);
    }

    async fn maybe_stall(&self) {
        hang_if(&self.stall_reads).await;
    }

    async fn run_interloper(&self, kind: StockKind, item_id: Uuid) -> Result<(), StoreError> {
        let stolen = self.interloper.lock().take();
        if let Some(quantity) = stolen {
            self.inner.decrement_if_available(kind, item_id, quantity).await?;
        }
        Ok(())
    }
}

async fn hang_if(flag: &AtomicBool) {
    if flag.load(Ordering::SeqCst) {
        std::future::pending::<()>().await;
    }
}

#[async_trait]
impl StockStore for FlakyStore {
    async fn list_items(&self, kind: StockKind) -> Result<Vec<StockItem>, StoreError> {
        self.maybe_stall().await;
        self.inner.list_items(kind).await
    }

    async fn get_item(&self, kind: StockKind, item_id: Uuid) -> Result<Option<StockItem>, StoreError> {
        self.maybe_stall().await;
        self.inner.get_item(kind, item_id).await
    }

    async fn insert_item(&self, kind: StockKind, item: NewStockItem) -> Result<StockItem, StoreError> {
        self.inner.insert_item(kind, item).await
    }

    async fn decrement_if_available(
        &self,
        kind: StockKind,
        item_id: Uuid,
        quantity: i32,
    ) -> Result<Option<StockItem>, StoreError> {
        self.run_interloper(kind, item_id).await?;
        let decremented = self.inner.decrement_if_available(kind, item_id, quantity).await?;
        hang_if(&self.hang_after_decrement).await;
        Ok(decremented)
    }

    async fn credit(&self, kind: StockKind, item_id: Uuid, quantity: i32) -> Result<(), StoreError> {
        if self.fail_credits.load(Ordering::SeqCst) {
            return Err(StoreError::Backend("injected credit failure".to_string()));
        }
        self.inner.credit(kind, item_id, quantity).await
    }

    async fn append_reservation(
        &self,
        kind: StockKind,
        entry: NewReservation,
    ) -> Result<ReservationRecord, StoreError> {
        if self.fail_appends.load(Ordering::SeqCst) {
            return Err(StoreError::Backend("injected ledger failure".to_string()));
        }
        hang_if(&self.hang_before_append).await;
        let record = self.inner.append_reservation(kind, entry).await?;
        hang_if(&self.hang_after_append).await;
        Ok(record)
    }

    async fn reserve_atomic(
        &self,
        kind: StockKind,
        entry: NewReservation,
    ) -> Result<Option<ReservationRecord>, StoreError> {
        self.run_interloper(kind, entry.item_id).await?;
        // A failed ledger insert aborts the whole transaction.
        if self.fail_appends.load(Ordering::SeqCst) {
            return Err(StoreError::Backend("injected ledger failure".to_string()));
        }
        hang_if(&self.hang_before_append).await;
        let record = self.inner.reserve_atomic(kind, entry).await?;
        hang_if(&self.hang_after_append).await;
        Ok(record)
    }

    async fn list_reservations(&self, kind: StockKind) -> Result<Vec<ReservationRecord>, StoreError> {
        self.maybe_stall().await;
        self.inner.list_reservations(kind).await
    }

    async fn get_reservation(
        &self,
        kind: StockKind,
        record_id: Uuid,
    ) -> Result<Option<ReservationRecord>, StoreError> {
        if self.fail_lookups.load(Ordering::SeqCst) {
            return Err(StoreError::Backend("injected lookup failure".to_string()));
        }
        self.inner.get_reservation(kind, record_id).await
    }

    async fn list_reservations_for_item(
        &self,
        kind: StockKind,
        item_id: Uuid,
    ) -> Result<Vec<ReservationRecord>, StoreError> {
        self.maybe_stall().await;
        self.inner.list_reservations_for_item(kind, item_id).await
    }
}

#[derive(Default)]
pub struct RecordingHazardSink {
    pub hazards: Mutex<Vec<StockHazard>>,
    failing: bool,
    stalling: bool,
}

impl RecordingHazardSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            failing: true,
            ..Self::default()
        }
    }

    pub fn stalling() -> Self {
        Self {
            stalling: true,
            ..Self::default()
        }
    }

    pub fn reported(&self) -> Vec<StockHazard> {
        self.hazards.lock().clone()
    }
}

#[async_trait]
impl HazardSink for RecordingHazardSink {
    async fn report(&self, hazard: &StockHazard) -> anyhow::Result<()> {
        self.hazards.lock().push(hazard.clone());
        if self.stalling {
            std::future::pending::<()>().await;
        }
        if self.failing {
            anyhow::bail!("hazard topic unreachable");
        }
        Ok(())
    }
}
