use axum::{
    extract::{Path, State},
    routing::{delete, get, post},
    Extension, Json, Router,
};
use railbook_core::session::SessionContext;
use railbook_domain::reservation::Reservation;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{error::AppError, state::AppState};

#[derive(Debug, Deserialize)]
struct ConvertRequest {
    hold_id: Uuid,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/reservations/convert", post(convert))
        .route("/v1/reservations/{reservation_id}", get(show))
        .route("/v1/reservations/{reservation_id}", delete(cancel))
}

async fn convert(
    State(state): State<AppState>,
    Extension(ctx): Extension<SessionContext>,
    Json(req): Json<ConvertRequest>,
) -> Result<Json<Reservation>, AppError> {
    let reservation = state.engine.convert(&ctx, req.hold_id).await?;
    Ok(Json(reservation))
}

async fn show(
    State(state): State<AppState>,
    Extension(ctx): Extension<SessionContext>,
    Path(reservation_id): Path<Uuid>,
) -> Result<Json<Reservation>, AppError> {
    let reservation = state.engine.reservation(&ctx, reservation_id).await?;
    Ok(Json(reservation))
}

#[derive(Debug, Serialize)]
struct AckResponse {
    status: &'static str,
}

async fn cancel(
    State(state): State<AppState>,
    Extension(ctx): Extension<SessionContext>,
    Path(reservation_id): Path<Uuid>,
) -> Result<Json<AckResponse>, AppError> {
    state.engine.cancel_reservation(&ctx, reservation_id).await?;
    Ok(Json(AckResponse { status: "CANCELLED" }))
}
