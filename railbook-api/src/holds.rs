use axum::{
    extract::{Path, State},
    routing::{delete, get, post},
    Extension, Json, Router,
};
use chrono::NaiveDate;
use railbook_core::session::SessionContext;
use railbook_domain::leg::{LegRef, PassengerType};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{error::AppError, state::AppState};

#[derive(Debug, Deserialize)]
struct CreateHoldRequest {
    departure_station: String,
    arrival_station: String,
    date: NaiveDate,
    train_no: String,
    seat_ids: Vec<String>,
    passenger_types: Vec<PassengerType>,
}

#[derive(Debug, Serialize)]
struct HoldResponse {
    hold_id: Uuid,
    seat_ids: Vec<String>,
    expires_at: i64,
    seconds_remaining: i64,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/holds", post(create_hold))
        .route("/v1/holds/{hold_id}", delete(cancel_hold))
        .route("/v1/holds/{hold_id}/remaining", get(time_remaining))
}

async fn create_hold(
    State(state): State<AppState>,
    Extension(ctx): Extension<SessionContext>,
    Json(req): Json<CreateHoldRequest>,
) -> Result<Json<HoldResponse>, AppError> {
    let leg = LegRef {
        departure_station: req.departure_station,
        arrival_station: req.arrival_station,
        date: req.date,
        train_no: req.train_no,
    };
    let hold = state
        .engine
        .create_hold(&ctx, &leg, req.seat_ids, req.passenger_types)
        .await?;
    let remaining = state.engine.hold_time_remaining(&ctx, hold.id).await?;
    Ok(Json(HoldResponse {
        hold_id: hold.id,
        seat_ids: hold.seat_ids,
        expires_at: hold.ttl_expiry.timestamp(),
        seconds_remaining: remaining.num_seconds(),
    }))
}

#[derive(Debug, Serialize)]
struct AckResponse {
    status: &'static str,
}

async fn cancel_hold(
    State(state): State<AppState>,
    Extension(ctx): Extension<SessionContext>,
    Path(hold_id): Path<Uuid>,
) -> Result<Json<AckResponse>, AppError> {
    state.engine.cancel_hold(&ctx, hold_id).await?;
    Ok(Json(AckResponse { status: "CANCELLED" }))
}

#[derive(Debug, Serialize)]
struct RemainingResponse {
    hold_id: Uuid,
    seconds_remaining: i64,
}

/// Read-only poll for UI countdowns; the engine stays the single authority
/// on whether the hold is still valid.
async fn time_remaining(
    State(state): State<AppState>,
    Extension(ctx): Extension<SessionContext>,
    Path(hold_id): Path<Uuid>,
) -> Result<Json<RemainingResponse>, AppError> {
    let remaining = state.engine.hold_time_remaining(&ctx, hold_id).await?;
    Ok(Json(RemainingResponse {
        hold_id,
        seconds_remaining: remaining.num_seconds(),
    }))
}
