use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use marquee_core::ReservationError;

/// HTTP boundary for the core failure taxonomy. Storage detail is logged
/// and replaced with a generic body; everything else surfaces verbatim so
/// callers can retry intelligently.
#[derive(Debug)]
pub struct AppError(pub ReservationError);

impl From<ReservationError> for AppError {
    fn from(err: ReservationError) -> Self {
        Self(err)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let err = self.0;
        let (status, error_message) = match &err {
            ReservationError::Validation(_) => (StatusCode::BAD_REQUEST, err.to_string()),
            ReservationError::EventNotFound(_)
            | ReservationError::SeatsNotFound { .. }
            | ReservationError::HoldNotFound(_) => (StatusCode::NOT_FOUND, err.to_string()),
            ReservationError::Unavailable { .. } | ReservationError::AlreadyFinalized { .. } => {
                (StatusCode::CONFLICT, err.to_string())
            }
            ReservationError::Expired { .. } => (StatusCode::GONE, err.to_string()),
            ReservationError::Store(msg) => {
                tracing::error!("Storage error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal Server Error".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}
