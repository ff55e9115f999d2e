use uuid::Uuid;

/// Failure taxonomy for the reservation core. Every variant carries enough
/// detail (seat ids, reference) for the caller to retry intelligently; the
/// core performs no internal retries.
#[derive(Debug, thiserror::Error)]
pub enum ReservationError {
    #[error("Event not found: {0}")]
    EventNotFound(Uuid),

    #[error("One or more seats not found: {missing:?}")]
    SeatsNotFound { missing: Vec<Uuid> },

    #[error("Hold not found: {0}")]
    HoldNotFound(String),

    #[error("Seats not available: {seat_ids:?}")]
    Unavailable { seat_ids: Vec<Uuid> },

    #[error("Hold {reference} has expired")]
    Expired { reference: String },

    #[error("Hold {reference} is already finalized")]
    AlreadyFinalized { reference: String },

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Storage error: {0}")]
    Store(String),
}

pub type ReservationResult<T> = Result<T, ReservationError>;
