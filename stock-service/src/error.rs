use shared::StockKind;
use uuid::Uuid;
use crate::store::StoreError;

/// Failure of a catalog, ledger or reservation operation.
#[derive(Debug, thiserror::Error)]
pub enum InventoryError {
    /// Malformed input. Nothing was read or written.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("{kind} item {item_id} not found")]
    NotFound { kind: StockKind, item_id: Uuid },

    /// The advisory availability check failed.
    #[error("insufficient stock for {kind} item {item_id}: requested {requested}, available {available}")]
    InsufficientStock {
        kind: StockKind,
        item_id: Uuid,
        requested: i32,
        available: i32,
    },

    /// The guarded decrement matched zero rows because another reservation
    /// won the race. Safe to retry from the availability check.
    #[error("concurrent reservation left insufficient stock for {kind} item {item_id}")]
    ConcurrentConflict { kind: StockKind, item_id: Uuid },

    #[error("storage unavailable: {0}")]
    StorageUnavailable(#[from] StoreError),

    /// Stock and ledger may disagree by `quantity` units: `cause` broke the
    /// reservation and `unresolved` kept it from being undone or confirmed.
    /// Persisted state needs manual reconciliation.
    #[error("stock consistency hazard on {kind} item {item_id} ({quantity} units): {cause}; unresolved: {unresolved}")]
    ConsistencyHazard {
        kind: StockKind,
        item_id: Uuid,
        quantity: i32,
        #[source]
        cause: StoreError,
        unresolved: StoreError,
    },
}

impl InventoryError {
    pub fn code(&self) -> &'static str {
        match self {
            InventoryError::InvalidArgument(_) => "invalid_argument",
            InventoryError::NotFound { .. } => "not_found",
            InventoryError::InsufficientStock { .. } => "insufficient_stock",
            InventoryError::ConcurrentConflict { .. } => "concurrent_conflict",
            InventoryError::StorageUnavailable(_) => "storage_unavailable",
            InventoryError::ConsistencyHazard { .. } => "consistency_hazard",
        }
    }

    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            InventoryError::ConcurrentConflict { .. } | InventoryError::StorageUnavailable(_)
        )
    }

    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        InventoryError::InvalidArgument(message.into())
    }
}

pub(crate) fn parse_item_id(raw: &str) -> Result<Uuid, InventoryError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(InventoryError::invalid("item_id is required"));
    }
    Uuid::parse_str(raw).map_err(|_| InventoryError::invalid("item_id is not a valid identifier"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn blank_item_id_is_required() {
        let err = parse_item_id("   ").unwrap_err();
        assert_eq!(err.to_string(), "invalid argument: item_id is required");
    }

    #[test]
    fn malformed_item_id_is_invalid() {
        let err = parse_item_id("medicine-42").unwrap_err();
        assert_eq!(err.code(), "invalid_argument");
    }

    #[test]
    fn item_id_is_trimmed_before_parsing() {
        let id = Uuid::new_v4();
        assert_eq!(parse_item_id(&format!(" {} ", id)).unwrap(), id);
    }

    #[test]
    fn only_races_and_storage_failures_are_retryable() {
        let id = Uuid::new_v4();
        assert!(InventoryError::ConcurrentConflict { kind: StockKind::Tool, item_id: id }.is_retryable());
        assert!(InventoryError::StorageUnavailable(StoreError::Backend("down".into())).is_retryable());
        assert!(!InventoryError::NotFound { kind: StockKind::Tool, item_id: id }.is_retryable());
        assert!(!InventoryError::invalid("quantity must be > 0").is_retryable());
    }

    #[test]
    fn hazard_keeps_its_cause_as_the_source() {
        let err = InventoryError::ConsistencyHazard {
            kind: StockKind::Medicine,
            item_id: Uuid::new_v4(),
            quantity: 4,
            cause: StoreError::Backend("insert failed".into()),
            unresolved: StoreError::Backend("update failed".into()),
        };
        assert_eq!(err.code(), "consistency_hazard");
        assert_eq!(err.source().unwrap().to_string(), "insert failed");
        assert!(err.to_string().contains("insert failed; unresolved: update failed"));
    }

    const _: () = {
        #[allow(dead_code)]
        fn assert_send_sync<T: Send + Sync>() {}

        #[allow(dead_code)]
        fn check() {
            assert_send_sync::<InventoryError>();
        }
    };
}
