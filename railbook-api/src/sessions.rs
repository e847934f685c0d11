use axum::{
    extract::State,
    routing::{get, post},
    Extension, Json, Router,
};
use railbook_booking::SessionSnapshot;
use railbook_core::session::SessionContext;
use serde::Serialize;

use crate::{error::AppError, state::AppState};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/session/snapshot", get(snapshot))
        .route("/v1/session/restore", post(restore))
}

/// Full serialized session state, suitable for persisting across restarts.
async fn snapshot(
    State(state): State<AppState>,
    Extension(ctx): Extension<SessionContext>,
) -> Result<Json<SessionSnapshot>, AppError> {
    let snapshot = state.engine.snapshot(&ctx).await?;
    Ok(Json(snapshot))
}

#[derive(Debug, Serialize)]
struct AckResponse {
    status: &'static str,
}

async fn restore(
    State(state): State<AppState>,
    Extension(ctx): Extension<SessionContext>,
    Json(snapshot): Json<SessionSnapshot>,
) -> Result<Json<AckResponse>, AppError> {
    state.engine.restore(&ctx, snapshot).await?;
    Ok(Json(AckResponse { status: "RESTORED" }))
}
