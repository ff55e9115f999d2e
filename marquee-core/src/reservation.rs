use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::error::{ReservationError, ReservationResult};
use crate::expiry::ExpiryPolicy;
use crate::repository::SeatStore;
use crate::seat::{Seat, SeatStatus, SeatView};

/// Result of acquiring a hold: the shared reference, the seats it covers,
/// the price summed at hold time, and the payment deadline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HoldReceipt {
    pub reference: String,
    pub seat_ids: Vec<Uuid>,
    pub requester_email: String,
    pub total_price: f64,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfirmationReceipt {
    pub reference: String,
    pub seat_ids: Vec<Uuid>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CancellationReceipt {
    pub reference: String,
    pub cancelled_seat_ids: Vec<Uuid>,
}

/// Outcome of the confirm decision, as applied by a store inside its
/// critical section. `Expired` means the whole hold was reclaimed to open
/// and the mutation must be persisted before surfacing the failure.
#[derive(Debug, Clone)]
pub enum ConfirmOutcome {
    Allocated { seat_ids: Vec<Uuid> },
    Expired { seat_ids: Vec<Uuid> },
}

/// Generate an opaque hold reference: first 8 hex characters of a v4 UUID,
/// uppercased.
pub fn new_hold_reference() -> String {
    Uuid::new_v4().simple().to_string()[..8].to_uppercase()
}

/// Claim decision for one batch of loaded seats. `seats` are the records
/// found for `requested`; the function checks existence and effective
/// availability, then marks every seat held under `reference`. All or
/// nothing: any failure leaves `seats` untouched.
pub fn claim_batch(
    seats: &mut [Seat],
    requested: &[Uuid],
    reference: &str,
    now: DateTime<Utc>,
    policy: ExpiryPolicy,
) -> ReservationResult<()> {
    let mut missing: Vec<Uuid> = requested
        .iter()
        .filter(|id| !seats.iter().any(|s| s.id == **id))
        .copied()
        .collect();
    if !missing.is_empty() {
        missing.sort();
        return Err(ReservationError::SeatsNotFound { missing });
    }

    let mut unavailable: Vec<Uuid> = seats
        .iter()
        .filter(|s| policy.effective_seat_status(s, now) != SeatStatus::Open)
        .map(|s| s.id)
        .collect();
    if !unavailable.is_empty() {
        unavailable.sort();
        return Err(ReservationError::Unavailable { seat_ids: unavailable });
    }

    for seat in seats.iter_mut() {
        seat.status = SeatStatus::Held;
        seat.held_at = Some(now);
        seat.hold_reference = Some(reference.to_string());
    }
    Ok(())
}

/// Confirm decision for the seats carrying one hold reference. If any held
/// seat has lapsed the whole hold is void: every held seat is reclaimed to
/// open and the `Expired` outcome returned. A reference whose seats are no
/// longer held (already finalized) fails explicitly rather than silently
/// re-confirming.
pub fn confirm_batch(
    seats: &mut [Seat],
    reference: &str,
    now: DateTime<Utc>,
    policy: ExpiryPolicy,
) -> ReservationResult<ConfirmOutcome> {
    if seats.is_empty() {
        return Err(ReservationError::HoldNotFound(reference.to_string()));
    }
    if !seats.iter().any(|s| s.status == SeatStatus::Held) {
        return Err(ReservationError::AlreadyFinalized {
            reference: reference.to_string(),
        });
    }

    if seats.iter().any(|s| policy.is_expired(s, now)) {
        let mut reclaimed = Vec::with_capacity(seats.len());
        for seat in seats.iter_mut().filter(|s| s.status == SeatStatus::Held) {
            seat.status = SeatStatus::Open;
            seat.held_at = None;
            seat.hold_reference = None;
            reclaimed.push(seat.id);
        }
        return Ok(ConfirmOutcome::Expired { seat_ids: reclaimed });
    }

    let mut allocated = Vec::with_capacity(seats.len());
    for seat in seats.iter_mut().filter(|s| s.status == SeatStatus::Held) {
        seat.status = SeatStatus::Allocated;
        seat.held_at = None;
        // Reference retained for audit.
        allocated.push(seat.id);
    }
    Ok(ConfirmOutcome::Allocated { seat_ids: allocated })
}

/// Unconditional release: every seat in the batch returns to open with hold
/// timestamp and reference cleared, whatever its current status.
pub fn release_batch(seats: &mut [Seat]) -> Vec<Uuid> {
    let mut released = Vec::with_capacity(seats.len());
    for seat in seats.iter_mut() {
        seat.status = SeatStatus::Open;
        seat.held_at = None;
        seat.hold_reference = None;
        released.push(seat.id);
    }
    released
}

/// Orchestrates the reservation lifecycle over a [`SeatStore`]: listing with
/// effective status, atomic multi-seat hold acquisition, payment
/// confirmation, and cancellation.
pub struct ReservationManager {
    store: Arc<dyn SeatStore>,
    policy: ExpiryPolicy,
}

impl ReservationManager {
    pub fn new(store: Arc<dyn SeatStore>, policy: ExpiryPolicy) -> Self {
        Self { store, policy }
    }

    pub fn policy(&self) -> ExpiryPolicy {
        self.policy
    }

    /// Read-only projection of an event's seats with effective status.
    /// Expired holds are reported open but never written back here; the
    /// authoritative reclaim happens on the next write path touching them.
    pub async fn list_seats(&self, event_id: Uuid) -> ReservationResult<Vec<SeatView>> {
        if !self.store.event_exists(event_id).await? {
            return Err(ReservationError::EventNotFound(event_id));
        }

        let mut seats = self.store.seats_for_event(event_id).await?;
        seats.sort_by(|a, b| a.label.cmp(&b.label));

        let now = Utc::now();
        Ok(seats
            .into_iter()
            .map(|seat| SeatView {
                seat_id: seat.id,
                price: seat.price,
                label: seat.label.clone(),
                status: self.policy.effective_seat_status(&seat, now),
            })
            .collect())
    }

    /// Atomically claim a set of seats under one fresh hold reference.
    /// Either every requested seat becomes held or none changes state.
    /// The requester identity is recorded for attribution only; it plays
    /// no part in the claim decision.
    pub async fn acquire_hold(
        &self,
        seat_ids: &[Uuid],
        requester_email: &str,
    ) -> ReservationResult<HoldReceipt> {
        if seat_ids.is_empty() {
            return Err(ReservationError::Validation(
                "seat_ids must not be empty".to_string(),
            ));
        }

        // Sorted, de-duplicated ids give stores a deterministic lock order.
        let mut ids: Vec<Uuid> = seat_ids.to_vec();
        ids.sort();
        ids.dedup();

        let reference = new_hold_reference();
        let now = Utc::now();

        let seats = self
            .store
            .claim_seats(&ids, &reference, now, self.policy)
            .await?;

        let total_price: f64 = seats.iter().map(|s| s.price).sum();
        let expires_at = self.policy.deadline(now);

        info!(
            reference = %reference,
            seats = seats.len(),
            requester = %requester_email,
            %expires_at,
            "hold acquired"
        );

        Ok(HoldReceipt {
            reference,
            seat_ids: ids,
            requester_email: requester_email.to_string(),
            total_price,
            expires_at,
        })
    }

    /// Finalize a hold into a permanent allocation. An expired hold is
    /// reclaimed in full as a side effect of the failure.
    pub async fn confirm(&self, reference: &str) -> ReservationResult<ConfirmationReceipt> {
        let now = Utc::now();
        match self.store.finalize_hold(reference, now, self.policy).await? {
            ConfirmOutcome::Allocated { seat_ids } => {
                info!(reference = %reference, seats = seat_ids.len(), "hold confirmed");
                Ok(ConfirmationReceipt {
                    reference: reference.to_string(),
                    seat_ids,
                })
            }
            ConfirmOutcome::Expired { .. } => {
                info!(reference = %reference, "hold expired at confirmation, seats reclaimed");
                Err(ReservationError::Expired {
                    reference: reference.to_string(),
                })
            }
        }
    }

    /// Release every seat under a reference back to open. Unconditional:
    /// this also reopens already-allocated seats (see DESIGN.md for the
    /// rationale).
    pub async fn cancel(&self, reference: &str) -> ReservationResult<CancellationReceipt> {
        let cancelled_seat_ids = self.store.release_hold(reference).await?;
        info!(reference = %reference, seats = cancelled_seat_ids.len(), "hold cancelled");
        Ok(CancellationReceipt {
            reference: reference.to_string(),
            cancelled_seat_ids,
        })
    }
}
