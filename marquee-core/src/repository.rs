use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::ReservationResult;
use crate::expiry::ExpiryPolicy;
use crate::reservation::ConfirmOutcome;
use crate::seat::Seat;

/// Storage seam for seat records.
///
/// Every write method is an atomic read-decide-write unit over the affected
/// seat set: an implementation must guarantee that for two concurrent
/// `claim_seats` calls with intersecting ids, at most one observes the
/// intersection as open. The decision rules themselves live in
/// [`crate::reservation`] (`claim_batch`, `confirm_batch`, `release_batch`);
/// implementations apply them inside their own critical section, via a
/// transaction with row locks or a single serialized mutex.
#[async_trait]
pub trait SeatStore: Send + Sync {
    async fn event_exists(&self, event_id: Uuid) -> ReservationResult<bool>;

    /// Lock-free read of every seat for an event, as persisted. May race
    /// with writers; never mutates state.
    async fn seats_for_event(&self, event_id: Uuid) -> ReservationResult<Vec<Seat>>;

    /// Atomically transition the given seats from effectively-open to held
    /// under `reference`. All-or-nothing: on any failure no seat changes.
    /// Returns the claimed seats as persisted.
    ///
    /// `seat_ids` arrive sorted and de-duplicated so implementations can
    /// lock rows in a deterministic order.
    async fn claim_seats(
        &self,
        seat_ids: &[Uuid],
        reference: &str,
        now: DateTime<Utc>,
        policy: ExpiryPolicy,
    ) -> ReservationResult<Vec<Seat>>;

    /// Atomically finalize the hold carrying `reference`. On the expired
    /// outcome the implementation must persist the reclaim (all seats back
    /// to open) before returning.
    async fn finalize_hold(
        &self,
        reference: &str,
        now: DateTime<Utc>,
        policy: ExpiryPolicy,
    ) -> ReservationResult<ConfirmOutcome>;

    /// Atomically reset every seat carrying `reference` to open, regardless
    /// of status or elapsed time. Returns the ids of the seats reset.
    async fn release_hold(&self, reference: &str) -> ReservationResult<Vec<Uuid>>;
}
