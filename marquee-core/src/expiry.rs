use crate::seat::{Seat, SeatStatus};
use chrono::{DateTime, Duration, Utc};

/// Pure computation of a seat's effective status under the configured hold
/// duration. No persistence: callers decide whether an observed expiry is
/// written back (write paths) or merely projected (read paths).
#[derive(Debug, Clone, Copy)]
pub struct ExpiryPolicy {
    hold_duration: Duration,
}

impl ExpiryPolicy {
    pub fn new(hold_duration: Duration) -> Self {
        Self { hold_duration }
    }

    pub fn from_minutes(minutes: i64) -> Self {
        Self::new(Duration::minutes(minutes))
    }

    pub fn hold_duration(&self) -> Duration {
        self.hold_duration
    }

    /// Deadline of a hold taken at `held_at`.
    pub fn deadline(&self, held_at: DateTime<Utc>) -> DateTime<Utc> {
        held_at + self.hold_duration
    }

    /// A held seat lapses strictly after the hold duration elapses; elapsed
    /// time equal to the duration is still live.
    pub fn effective_status(
        &self,
        status: SeatStatus,
        held_at: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> SeatStatus {
        match (status, held_at) {
            (SeatStatus::Held, Some(held_at)) if now - held_at > self.hold_duration => {
                SeatStatus::Open
            }
            _ => status,
        }
    }

    pub fn effective_seat_status(&self, seat: &Seat, now: DateTime<Utc>) -> SeatStatus {
        self.effective_status(seat.status, seat.held_at, now)
    }

    /// True when a held seat's hold has lapsed.
    pub fn is_expired(&self, seat: &Seat, now: DateTime<Utc>) -> bool {
        seat.status == SeatStatus::Held
            && self.effective_seat_status(seat, now) == SeatStatus::Open
    }
}
