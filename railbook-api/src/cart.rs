use axum::{
    extract::{Path, State},
    routing::{delete, get, post},
    Extension, Json, Router,
};
use railbook_booking::cart::CartEntry;
use railbook_core::session::SessionContext;
use railbook_domain::payment::PaymentIntent;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{error::AppError, state::AppState};

#[derive(Debug, Deserialize)]
struct AddItemRequest {
    reservation_id: Uuid,
}

#[derive(Debug, Deserialize)]
struct RemoveItemsRequest {
    reservation_ids: Vec<Uuid>,
}

#[derive(Debug, Serialize)]
struct CartView {
    entries: Vec<CartEntry>,
    selected_total_krw: i64,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/cart", get(view))
        .route("/v1/cart/items", post(add_item))
        .route("/v1/cart/items", delete(remove_items))
        .route("/v1/cart/items/all", delete(remove_all))
        .route("/v1/cart/items/{reservation_id}/toggle", post(toggle))
        .route("/v1/cart/toggle-all", post(toggle_all))
        .route("/v1/cart/checkout", post(checkout))
}

#[derive(Debug, Serialize)]
struct AckResponse {
    status: &'static str,
}

async fn view(
    State(state): State<AppState>,
    Extension(ctx): Extension<SessionContext>,
) -> Result<Json<CartView>, AppError> {
    let (entries, selected_total_krw) = state.engine.cart_view(&ctx).await?;
    Ok(Json(CartView {
        entries,
        selected_total_krw,
    }))
}

async fn add_item(
    State(state): State<AppState>,
    Extension(ctx): Extension<SessionContext>,
    Json(req): Json<AddItemRequest>,
) -> Result<Json<AckResponse>, AppError> {
    state.engine.cart_add(&ctx, req.reservation_id).await?;
    Ok(Json(AckResponse { status: "ADDED" }))
}

async fn remove_items(
    State(state): State<AppState>,
    Extension(ctx): Extension<SessionContext>,
    Json(req): Json<RemoveItemsRequest>,
) -> Result<Json<AckResponse>, AppError> {
    state.engine.cart_remove(&ctx, &req.reservation_ids).await?;
    Ok(Json(AckResponse { status: "REMOVED" }))
}

async fn remove_all(
    State(state): State<AppState>,
    Extension(ctx): Extension<SessionContext>,
) -> Result<Json<AckResponse>, AppError> {
    state.engine.cart_remove_all(&ctx).await?;
    Ok(Json(AckResponse { status: "REMOVED" }))
}

async fn toggle(
    State(state): State<AppState>,
    Extension(ctx): Extension<SessionContext>,
    Path(reservation_id): Path<Uuid>,
) -> Result<Json<AckResponse>, AppError> {
    state.engine.cart_toggle(&ctx, reservation_id).await?;
    Ok(Json(AckResponse { status: "TOGGLED" }))
}

async fn toggle_all(
    State(state): State<AppState>,
    Extension(ctx): Extension<SessionContext>,
) -> Result<Json<AckResponse>, AppError> {
    state.engine.cart_toggle_all(&ctx).await?;
    Ok(Json(AckResponse { status: "TOGGLED" }))
}

async fn checkout(
    State(state): State<AppState>,
    Extension(ctx): Extension<SessionContext>,
) -> Result<Json<PaymentIntent>, AppError> {
    let intent = state.engine.cart_checkout(&ctx).await?;
    Ok(Json(intent))
}
