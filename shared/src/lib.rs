use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{DateTime, Utc};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StockKind {
    Medicine,
    Tool,
}

impl StockKind {
    pub const ALL: [StockKind; 2] = [StockKind::Medicine, StockKind::Tool];

    pub fn as_str(&self) -> &'static str {
        match self {
            StockKind::Medicine => "medicine",
            StockKind::Tool => "tool",
        }
    }
}

impl fmt::Display for StockKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownStockKind(pub String);

impl fmt::Display for UnknownStockKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown stock kind: {}", self.0)
    }
}

impl std::error::Error for UnknownStockKind {}

impl FromStr for StockKind {
    type Err = UnknownStockKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "medicine" => Ok(StockKind::Medicine),
            "tool" => Ok(StockKind::Tool),
            other => Err(UnknownStockKind(other.to_string())),
        }
    }
}

/// A countable stock item. `quantity` is only ever changed by the reservation engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockItem {
    pub item_id: Uuid,
    pub name: String,
    pub quantity: i32,
    pub created_at: DateTime<Utc>,
}

/// One completed reservation. Ledger rows are append-only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReservationRecord {
    pub record_id: Uuid,
    pub item_id: Uuid,
    pub requester_label: String,
    pub location_label: String,
    pub quantity: i32,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateItemRequest {
    pub name: String,
    #[serde(default)]
    pub quantity: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReserveRequest {
    #[serde(default)]
    pub item_id: String,
    #[serde(default)]
    pub requester_label: String,
    #[serde(default)]
    pub location_label: String,
    pub quantity: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
    pub retryable: bool,
}

/// Emitted when a reservation may have left stock and ledger disagreeing:
/// a compensating credit failed, or a write timed out and its outcome could
/// not be confirmed. Needs manual reconciliation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockHazard {
    pub id: Uuid,
    pub kind: StockKind,
    pub item_id: Uuid,
    pub quantity: i32,
    pub cause: String,
    pub unresolved: String,
    pub detected_at: DateTime<Utc>,
}

impl ReserveRequest {
    pub fn new(
        item_id: impl Into<String>,
        requester_label: impl Into<String>,
        location_label: impl Into<String>,
        quantity: i32,
    ) -> Self {
        Self {
            item_id: item_id.into(),
            requester_label: requester_label.into(),
            location_label: location_label.into(),
            quantity,
        }
    }
}

impl CreateItemRequest {
    pub fn new(name: impl Into<String>, quantity: i32) -> Self {
        Self {
            name: name.into(),
            quantity,
        }
    }
}

impl StockHazard {
    pub fn new(
        kind: StockKind,
        item_id: Uuid,
        quantity: i32,
        cause: String,
        unresolved: String,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            item_id,
            quantity,
            cause,
            unresolved,
            detected_at: Utc::now(),
        }
    }
}
