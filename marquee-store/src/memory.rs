use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use uuid::Uuid;

use marquee_core::error::{ReservationError, ReservationResult};
use marquee_core::expiry::ExpiryPolicy;
use marquee_core::repository::SeatStore;
use marquee_core::reservation::{claim_batch, confirm_batch, release_batch, ConfirmOutcome};
use marquee_core::seat::Seat;

#[derive(Default)]
struct Inner {
    events: HashSet<Uuid>,
    seats: HashMap<Uuid, Seat>,
}

/// In-memory seat store for tests and local development. A single async
/// mutex serializes every write path, which trivially satisfies the
/// atomic claim guarantee: overlapping claims never interleave.
#[derive(Default)]
pub struct MemorySeatStore {
    inner: Mutex<Inner>,
}

impl MemorySeatStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn add_event(&self) -> Uuid {
        let event_id = Uuid::new_v4();
        self.inner.lock().await.events.insert(event_id);
        event_id
    }

    pub async fn add_seat(
        &self,
        event_id: Uuid,
        price: f64,
        label: impl Into<String>,
    ) -> Uuid {
        let seat = Seat::new(event_id, price, label);
        let id = seat.id;
        self.inner.lock().await.seats.insert(id, seat);
        id
    }

    /// Seat record exactly as persisted, without expiry projection.
    pub async fn persisted_seat(&self, seat_id: Uuid) -> Option<Seat> {
        self.inner.lock().await.seats.get(&seat_id).cloned()
    }

    /// Rewrite the hold timestamp of every seat under `reference`. Test
    /// support: lets suites age a hold past its deadline without sleeping.
    pub async fn backdate_hold(&self, reference: &str, held_at: DateTime<Utc>) {
        let mut inner = self.inner.lock().await;
        for seat in inner.seats.values_mut() {
            if seat.hold_reference.as_deref() == Some(reference) {
                seat.held_at = Some(held_at);
            }
        }
    }

    fn seats_by_reference(inner: &Inner, reference: &str) -> Vec<Seat> {
        let mut seats: Vec<Seat> = inner
            .seats
            .values()
            .filter(|s| s.hold_reference.as_deref() == Some(reference))
            .cloned()
            .collect();
        seats.sort_by_key(|s| s.id);
        seats
    }

    fn write_back(inner: &mut Inner, seats: &[Seat]) {
        for seat in seats {
            inner.seats.insert(seat.id, seat.clone());
        }
    }
}

#[async_trait]
impl SeatStore for MemorySeatStore {
    async fn event_exists(&self, event_id: Uuid) -> ReservationResult<bool> {
        Ok(self.inner.lock().await.events.contains(&event_id))
    }

    async fn seats_for_event(&self, event_id: Uuid) -> ReservationResult<Vec<Seat>> {
        let inner = self.inner.lock().await;
        Ok(inner
            .seats
            .values()
            .filter(|s| s.event_id == event_id)
            .cloned()
            .collect())
    }

    async fn claim_seats(
        &self,
        seat_ids: &[Uuid],
        reference: &str,
        now: DateTime<Utc>,
        policy: ExpiryPolicy,
    ) -> ReservationResult<Vec<Seat>> {
        let mut inner = self.inner.lock().await;

        let mut seats: Vec<Seat> = seat_ids
            .iter()
            .filter_map(|id| inner.seats.get(id).cloned())
            .collect();

        claim_batch(&mut seats, seat_ids, reference, now, policy)?;

        Self::write_back(&mut inner, &seats);
        Ok(seats)
    }

    async fn finalize_hold(
        &self,
        reference: &str,
        now: DateTime<Utc>,
        policy: ExpiryPolicy,
    ) -> ReservationResult<ConfirmOutcome> {
        let mut inner = self.inner.lock().await;

        let mut seats = Self::seats_by_reference(&inner, reference);
        let outcome = confirm_batch(&mut seats, reference, now, policy)?;

        Self::write_back(&mut inner, &seats);
        Ok(outcome)
    }

    async fn release_hold(&self, reference: &str) -> ReservationResult<Vec<Uuid>> {
        let mut inner = self.inner.lock().await;

        let mut seats = Self::seats_by_reference(&inner, reference);
        if seats.is_empty() {
            return Err(ReservationError::HoldNotFound(reference.to_string()));
        }

        let released = release_batch(&mut seats);
        Self::write_back(&mut inner, &seats);
        Ok(released)
    }
}
