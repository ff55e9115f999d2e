use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use marquee_core::seat::SeatView;

use crate::error::AppError;
use crate::state::AppState;

#[derive(Debug, Serialize)]
struct SeatArrangementResponse {
    event_id: Uuid,
    seats: Vec<SeatView>,
}

#[derive(Debug, Deserialize)]
struct HoldRequest {
    seat_ids: Vec<Uuid>,
    requester_email: String,
}

#[derive(Debug, Serialize)]
struct HoldResponse {
    reference: String,
    seat_ids: Vec<Uuid>,
    total_price: f64,
    status: String,
    expires_at: DateTime<Utc>,
    message: String,
}

#[derive(Debug, Serialize)]
struct ConfirmResponse {
    reference: String,
    seat_ids: Vec<Uuid>,
    message: String,
}

#[derive(Debug, Serialize)]
struct CancelResponse {
    reference: String,
    cancelled_seat_ids: Vec<Uuid>,
    message: String,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/events/{event_id}/seats", get(list_seats))
        .route("/v1/holds", post(acquire_hold))
        .route("/v1/holds/{reference}/confirm", post(confirm_hold))
        .route("/v1/holds/{reference}/cancel", post(cancel_hold))
}

async fn list_seats(
    State(state): State<AppState>,
    Path(event_id): Path<Uuid>,
) -> Result<Json<SeatArrangementResponse>, AppError> {
    let seats = state.manager.list_seats(event_id).await?;
    Ok(Json(SeatArrangementResponse { event_id, seats }))
}

async fn acquire_hold(
    State(state): State<AppState>,
    Json(req): Json<HoldRequest>,
) -> Result<Json<HoldResponse>, AppError> {
    let receipt = state
        .manager
        .acquire_hold(&req.seat_ids, &req.requester_email)
        .await?;

    let minutes = state.manager.policy().hold_duration().num_minutes();
    let message = format!(
        "Seats held for {} minutes. Complete payment before {}",
        minutes,
        receipt.expires_at.format("%H:%M:%S")
    );

    Ok(Json(HoldResponse {
        reference: receipt.reference,
        seat_ids: receipt.seat_ids,
        total_price: receipt.total_price,
        status: "held".to_string(),
        expires_at: receipt.expires_at,
        message,
    }))
}

async fn confirm_hold(
    State(state): State<AppState>,
    Path(reference): Path<String>,
) -> Result<Json<ConfirmResponse>, AppError> {
    let confirmation = state.manager.confirm(&reference).await?;

    let message = format!(
        "Payment confirmed! {} seat(s) are now allocated.",
        confirmation.seat_ids.len()
    );
    Ok(Json(ConfirmResponse {
        reference: confirmation.reference,
        seat_ids: confirmation.seat_ids,
        message,
    }))
}

async fn cancel_hold(
    State(state): State<AppState>,
    Path(reference): Path<String>,
) -> Result<Json<CancelResponse>, AppError> {
    let cancellation = state.manager.cancel(&reference).await?;

    let message = format!(
        "Hold {} has been cancelled. Seats are open again.",
        cancellation.reference
    );
    Ok(Json(CancelResponse {
        reference: cancellation.reference,
        cancelled_seat_ids: cancellation.cancelled_seat_ids,
        message,
    }))
}
