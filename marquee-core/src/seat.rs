use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Persisted lifecycle state of a seat.
///
/// A closed enum rather than a free-form tag: `Open` seats carry no hold
/// data, `Held` seats carry both a hold reference and a hold timestamp,
/// `Allocated` seats keep the reference for audit but drop the timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SeatStatus {
    Open,
    Held,
    Allocated,
}

impl SeatStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SeatStatus::Open => "open",
            SeatStatus::Held => "held",
            SeatStatus::Allocated => "allocated",
        }
    }
}

impl std::str::FromStr for SeatStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "open" => Ok(SeatStatus::Open),
            "held" => Ok(SeatStatus::Held),
            "allocated" => Ok(SeatStatus::Allocated),
            other => Err(format!("unknown seat status: {}", other)),
        }
    }
}

/// A single sellable seat belonging to one event.
///
/// Price and label are fixed at seat creation (by the external seat-grid
/// generator); only `status`, `held_at` and `hold_reference` change here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Seat {
    pub id: Uuid,
    pub event_id: Uuid,
    pub price: f64,
    /// Descriptive label, e.g. "Row A Seat 1".
    pub label: String,
    pub status: SeatStatus,
    /// Set iff `status == Held`.
    pub held_at: Option<DateTime<Utc>>,
    /// Set iff `status` is `Held` or `Allocated`.
    pub hold_reference: Option<String>,
}

impl Seat {
    pub fn new(event_id: Uuid, price: f64, label: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            event_id,
            price,
            label: label.into(),
            status: SeatStatus::Open,
            held_at: None,
            hold_reference: None,
        }
    }
}

/// Read projection of a seat: persisted fields plus the status as perceived
/// at query time, after accounting for hold expiry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeatView {
    pub seat_id: Uuid,
    pub price: f64,
    pub label: String,
    pub status: SeatStatus,
}
