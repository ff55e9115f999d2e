use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use marquee_core::error::{ReservationError, ReservationResult};
use marquee_core::expiry::ExpiryPolicy;
use marquee_core::repository::SeatStore;
use marquee_core::reservation::{claim_batch, confirm_batch, ConfirmOutcome};
use marquee_core::seat::Seat;

/// Postgres-backed seat store. Write paths run inside a transaction with
/// `SELECT ... FOR UPDATE`; callers pass seat ids pre-sorted, and the load
/// orders rows by id, so two overlapping claims always take row locks in
/// the same order.
pub struct PgSeatStore {
    pool: PgPool,
}

impl PgSeatStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct SeatRow {
    id: Uuid,
    event_id: Uuid,
    price: f64,
    label: String,
    status: String,
    held_at: Option<DateTime<Utc>>,
    hold_reference: Option<String>,
}

impl SeatRow {
    fn into_seat(self) -> ReservationResult<Seat> {
        let status = self
            .status
            .parse()
            .map_err(|e: String| ReservationError::Store(e))?;
        Ok(Seat {
            id: self.id,
            event_id: self.event_id,
            price: self.price,
            label: self.label,
            status,
            held_at: self.held_at,
            hold_reference: self.hold_reference,
        })
    }
}

fn store_err(e: sqlx::Error) -> ReservationError {
    ReservationError::Store(e.to_string())
}

const SEAT_COLUMNS: &str = "id, event_id, price, label, status, held_at, hold_reference";

async fn persist_seat(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    seat: &Seat,
) -> ReservationResult<()> {
    sqlx::query("UPDATE seats SET status = $1, held_at = $2, hold_reference = $3 WHERE id = $4")
        .bind(seat.status.as_str())
        .bind(seat.held_at)
        .bind(seat.hold_reference.as_deref())
        .bind(seat.id)
        .execute(&mut **tx)
        .await
        .map_err(store_err)?;
    Ok(())
}

#[async_trait]
impl SeatStore for PgSeatStore {
    async fn event_exists(&self, event_id: Uuid) -> ReservationResult<bool> {
        sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM events WHERE id = $1)")
            .bind(event_id)
            .fetch_one(&self.pool)
            .await
            .map_err(store_err)
    }

    async fn seats_for_event(&self, event_id: Uuid) -> ReservationResult<Vec<Seat>> {
        let rows = sqlx::query_as::<_, SeatRow>(&format!(
            "SELECT {} FROM seats WHERE event_id = $1 ORDER BY label",
            SEAT_COLUMNS
        ))
        .bind(event_id)
        .fetch_all(&self.pool)
        .await
        .map_err(store_err)?;

        rows.into_iter().map(SeatRow::into_seat).collect()
    }

    async fn claim_seats(
        &self,
        seat_ids: &[Uuid],
        reference: &str,
        now: DateTime<Utc>,
        policy: ExpiryPolicy,
    ) -> ReservationResult<Vec<Seat>> {
        let mut tx = self.pool.begin().await.map_err(store_err)?;

        let rows = sqlx::query_as::<_, SeatRow>(&format!(
            "SELECT {} FROM seats WHERE id = ANY($1) ORDER BY id FOR UPDATE",
            SEAT_COLUMNS
        ))
        .bind(seat_ids.to_vec())
        .fetch_all(&mut *tx)
        .await
        .map_err(store_err)?;

        let mut seats = rows
            .into_iter()
            .map(SeatRow::into_seat)
            .collect::<ReservationResult<Vec<Seat>>>()?;

        // Any failure here drops the transaction, releasing the row locks
        // with no seat modified.
        claim_batch(&mut seats, seat_ids, reference, now, policy)?;

        for seat in &seats {
            persist_seat(&mut tx, seat).await?;
        }
        tx.commit().await.map_err(store_err)?;

        Ok(seats)
    }

    async fn finalize_hold(
        &self,
        reference: &str,
        now: DateTime<Utc>,
        policy: ExpiryPolicy,
    ) -> ReservationResult<ConfirmOutcome> {
        let mut tx = self.pool.begin().await.map_err(store_err)?;

        let rows = sqlx::query_as::<_, SeatRow>(&format!(
            "SELECT {} FROM seats WHERE hold_reference = $1 ORDER BY id FOR UPDATE",
            SEAT_COLUMNS
        ))
        .bind(reference)
        .fetch_all(&mut *tx)
        .await
        .map_err(store_err)?;

        let mut seats = rows
            .into_iter()
            .map(SeatRow::into_seat)
            .collect::<ReservationResult<Vec<Seat>>>()?;

        let outcome = confirm_batch(&mut seats, reference, now, policy)?;

        // Both outcomes mutate: allocation on success, reclaim on expiry.
        for seat in &seats {
            persist_seat(&mut tx, seat).await?;
        }
        tx.commit().await.map_err(store_err)?;

        Ok(outcome)
    }

    async fn release_hold(&self, reference: &str) -> ReservationResult<Vec<Uuid>> {
        // Single-statement reset is atomic on its own; no explicit locks
        // needed. Unconditional by design, see ReservationManager::cancel.
        let ids: Vec<Uuid> = sqlx::query_scalar(
            "UPDATE seats
             SET status = 'open', held_at = NULL, hold_reference = NULL
             WHERE hold_reference = $1
             RETURNING id",
        )
        .bind(reference)
        .fetch_all(&self.pool)
        .await
        .map_err(store_err)?;

        if ids.is_empty() {
            return Err(ReservationError::HoldNotFound(reference.to_string()));
        }
        Ok(ids)
    }
}
