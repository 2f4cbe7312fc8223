use shared::{ReservationRecord, ReserveRequest, StockHazard, StockKind};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};
use uuid::Uuid;
use crate::error::{parse_item_id, InventoryError};
use crate::hazard::HazardSink;
use crate::store::{bounded, NewReservation, StockStore, StoreError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum ReservationMode {
    /// Guarded decrement and ledger append commit together or not at all.
    Transactional,
    /// Separate single-row writes, undone by a best-effort credit on failure.
    Compensating,
}

pub struct ReservationEngine {
    store: Arc<dyn StockStore>,
    hazards: Arc<dyn HazardSink>,
    mode: ReservationMode,
    op_timeout: Duration,
}

impl ReservationEngine {
    pub fn new(
        store: Arc<dyn StockStore>,
        hazards: Arc<dyn HazardSink>,
        mode: ReservationMode,
        op_timeout: Duration,
    ) -> Self {
        Self { store, hazards, mode, op_timeout }
    }

    /// Never retries; a `ConcurrentConflict` may be retried by the caller.
    pub async fn reserve(&self, kind: StockKind, request: ReserveRequest) -> Result<ReservationRecord, InventoryError> {
        let entry = validate(request)?;
        let (item_id, quantity) = (entry.item_id, entry.quantity);

        let item = bounded(self.op_timeout, self.store.get_item(kind, item_id))
            .await?
            .ok_or(InventoryError::NotFound { kind, item_id })?;
        if item.quantity < quantity {
            return Err(InventoryError::InsufficientStock {
                kind,
                item_id,
                requested: quantity,
                available: item.quantity,
            });
        }

        let record = match self.mode {
            ReservationMode::Transactional => self.reserve_in_transaction(kind, entry).await?,
            ReservationMode::Compensating => self.reserve_with_compensation(kind, entry).await?,
        };

        info!(
            "Reserved {} unit(s) of {} item {} for {} at {} (record {})",
            record.quantity, kind, record.item_id, record.requester_label, record.location_label, record.record_id
        );
        Ok(record)
    }

    async fn reserve_in_transaction(&self, kind: StockKind, entry: NewReservation) -> Result<ReservationRecord, InventoryError> {
        let (item_id, record_id) = (entry.item_id, entry.record_id);
        match bounded(self.op_timeout, self.store.reserve_atomic(kind, entry)).await {
            Ok(Some(record)) => Ok(record),
            Ok(None) => {
                warn!("Guarded decrement on {} item {} matched no rows", kind, item_id);
                Err(InventoryError::ConcurrentConflict { kind, item_id })
            }
            // Both writes or neither; the ledger row tells which.
            Err(timeout @ StoreError::Timeout(_)) => match self.find_record(kind, record_id).await {
                Ok(Some(record)) => Ok(record),
                _ => Err(InventoryError::StorageUnavailable(timeout)),
            },
            Err(e) => Err(e.into()),
        }
    }

    async fn reserve_with_compensation(&self, kind: StockKind, entry: NewReservation) -> Result<ReservationRecord, InventoryError> {
        let (item_id, quantity, record_id) = (entry.item_id, entry.quantity, entry.record_id);

        let decremented = match bounded(self.op_timeout, self.store.decrement_if_available(kind, item_id, quantity)).await {
            Ok(decremented) => decremented,
            Err(timeout @ StoreError::Timeout(_)) => {
                let unresolved = StoreError::Unconfirmed("guarded decrement may have committed without a ledger row".to_string());
                return Err(self.raise_hazard(kind, item_id, quantity, timeout, unresolved).await);
            }
            Err(e) => return Err(e.into()),
        };
        if decremented.is_none() {
            warn!("Guarded decrement on {} item {} matched no rows", kind, item_id);
            return Err(InventoryError::ConcurrentConflict { kind, item_id });
        }

        let cause = match bounded(self.op_timeout, self.store.append_reservation(kind, entry)).await {
            Ok(record) => return Ok(record),
            Err(e) => e,
        };

        // A timed-out append may still have landed; crediting it back would
        // count the same units twice.
        if let StoreError::Timeout(_) = cause {
            match self.find_record(kind, record_id).await {
                Ok(Some(record)) => return Ok(record),
                Ok(None) => {}
                Err(lookup) => return Err(self.raise_hazard(kind, item_id, quantity, cause, lookup).await),
            }
        }

        warn!("Ledger append for {} item {} failed, crediting {} unit(s) back: {}", kind, item_id, quantity, cause);
        match bounded(self.op_timeout, self.store.credit(kind, item_id, quantity)).await {
            Ok(()) => {
                info!("Compensated {} unit(s) on {} item {}", quantity, kind, item_id);
                Err(InventoryError::StorageUnavailable(cause))
            }
            Err(unresolved) => Err(self.raise_hazard(kind, item_id, quantity, cause, unresolved).await),
        }
    }

    async fn find_record(&self, kind: StockKind, record_id: Uuid) -> Result<Option<ReservationRecord>, StoreError> {
        let found = bounded(self.op_timeout, self.store.get_reservation(kind, record_id)).await?;
        if found.is_some() {
            warn!("Reservation {} on {} committed after its write timed out", record_id, kind);
        }
        Ok(found)
    }

    async fn raise_hazard(
        &self,
        kind: StockKind,
        item_id: Uuid,
        quantity: i32,
        cause: StoreError,
        unresolved: StoreError,
    ) -> InventoryError {
        let hazard = StockHazard::new(kind, item_id, quantity, cause.to_string(), unresolved.to_string());
        match tokio::time::timeout(self.op_timeout, self.hazards.report(&hazard)).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => error!("Failed to report stock hazard {}: {}", hazard.id, e),
            Err(_) => error!("Reporting stock hazard {} timed out after {:?}", hazard.id, self.op_timeout),
        }
        InventoryError::ConsistencyHazard { kind, item_id, quantity, cause, unresolved }
    }
}

fn validate(request: ReserveRequest) -> Result<NewReservation, InventoryError> {
    let item_id = parse_item_id(&request.item_id)?;
    if request.quantity <= 0 {
        return Err(InventoryError::invalid("quantity must be > 0"));
    }
    Ok(NewReservation {
        record_id: Uuid::new_v4(),
        item_id,
        requester_label: required("requester_label", request.requester_label)?,
        location_label: required("location_label", request.location_label)?,
        quantity: request.quantity,
    })
}

fn required(field: &str, value: String) -> Result<String, InventoryError> {
    if value.trim().is_empty() {
        return Err(InventoryError::invalid(format!("{} is required", field)));
    }
    Ok(value)
}
