use axum::{
    extract::{Path, State},
    routing::post,
    Extension, Json, Router,
};
use railbook_booking::PaymentResolution;
use railbook_core::session::SessionContext;
use railbook_domain::payment::PaymentIntent;
use serde::Deserialize;
use uuid::Uuid;

use crate::{error::AppError, state::AppState};

#[derive(Debug, Deserialize)]
struct PrepareRequest {
    reservation_ids: Vec<Uuid>,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/payments/prepare", post(prepare))
        .route("/v1/payments/{intent_id}/execute", post(execute))
}

async fn prepare(
    State(state): State<AppState>,
    Extension(ctx): Extension<SessionContext>,
    Json(req): Json<PrepareRequest>,
) -> Result<Json<PaymentIntent>, AppError> {
    let intent = state
        .engine
        .prepare_payment(&ctx, req.reservation_ids)
        .await?;
    Ok(Json(intent))
}

async fn execute(
    State(state): State<AppState>,
    Extension(ctx): Extension<SessionContext>,
    Path(intent_id): Path<Uuid>,
) -> Result<Json<PaymentResolution>, AppError> {
    let resolution = state.engine.execute_payment(&ctx, intent_id).await?;
    Ok(Json(resolution))
}
