use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use railbook_core::Reject;
use serde_json::json;

#[derive(Debug)]
pub enum AppError {
    AuthenticationError(String),
    Reject(Reject),
    Anyhow(anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::AuthenticationError(msg) => (
                StatusCode::UNAUTHORIZED,
                Json(json!({ "error": msg, "reason": "UNAUTHENTICATED" })),
            )
                .into_response(),
            AppError::Reject(reject) => {
                let status = match reject.reason_code() {
                    "INVALID_REQUEST" => StatusCode::BAD_REQUEST,
                    "HOLD_NOT_FOUND" => StatusCode::NOT_FOUND,
                    "HOLD_EXPIRED" => StatusCode::GONE,
                    "UPSTREAM_UNAVAILABLE" => StatusCode::SERVICE_UNAVAILABLE,
                    "STATE_CORRUPTION" => StatusCode::INTERNAL_SERVER_ERROR,
                    // Seat contention, double conversion, stale targets,
                    // in-flight intents, trip gating: all conflicts with
                    // current state.
                    _ => StatusCode::CONFLICT,
                };
                if reject.is_recoverable() {
                    tracing::debug!(reason = reject.reason_code(), "request rejected");
                } else {
                    tracing::error!(reason = reject.reason_code(), error = %reject, "non-recoverable rejection");
                }
                let body = Json(json!({
                    "error": reject.to_string(),
                    "reason": reject.reason_code(),
                    "ids": reject.entity_ids(),
                }));
                (status, body).into_response()
            }
            AppError::Anyhow(err) => {
                tracing::error!("Internal Server Error: {}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "error": "Internal Server Error" })),
                )
                    .into_response()
            }
        }
    }
}

impl From<Reject> for AppError {
    fn from(reject: Reject) -> Self {
        Self::Reject(reject)
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        Self::Anyhow(err)
    }
}
