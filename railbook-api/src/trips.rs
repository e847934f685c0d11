use axum::{
    extract::State,
    routing::{get, post},
    Extension, Json, Router,
};
use chrono::NaiveDate;
use railbook_core::session::SessionContext;
use railbook_domain::{
    hold::Hold,
    leg::{PassengerType, ScheduleOption},
    trip::Trip,
};
use serde::{Deserialize, Serialize};

use crate::{error::AppError, state::AppState};

#[derive(Debug, Deserialize)]
struct BeginTripRequest {
    departure_station: String,
    arrival_station: String,
    outbound_date: NaiveDate,
    return_date: NaiveDate,
}

#[derive(Debug, Deserialize)]
struct InboundSearchRequest {
    passenger_count: u32,
}

#[derive(Debug, Deserialize)]
struct InboundHoldRequest {
    train_no: String,
    seat_ids: Vec<String>,
    passenger_types: Vec<PassengerType>,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/trips", post(begin))
        .route("/v1/trips/current", get(current))
        .route("/v1/trips/inbound/search", post(inbound_search))
        .route("/v1/trips/inbound/holds", post(inbound_hold))
        .route("/v1/trips/total-fare", get(total_fare))
}

async fn begin(
    State(state): State<AppState>,
    Extension(ctx): Extension<SessionContext>,
    Json(req): Json<BeginTripRequest>,
) -> Result<Json<Trip>, AppError> {
    let trip = state
        .engine
        .trip_begin(
            &ctx,
            req.departure_station,
            req.arrival_station,
            req.outbound_date,
            req.return_date,
        )
        .await?;
    Ok(Json(trip))
}

async fn current(
    State(state): State<AppState>,
    Extension(ctx): Extension<SessionContext>,
) -> Result<Json<Option<Trip>>, AppError> {
    let trip = state.engine.trip_current(&ctx).await?;
    Ok(Json(trip))
}

#[derive(Debug, Serialize)]
struct InboundSearchResponse {
    options: Vec<ScheduleOption>,
}

async fn inbound_search(
    State(state): State<AppState>,
    Extension(ctx): Extension<SessionContext>,
    Json(req): Json<InboundSearchRequest>,
) -> Result<Json<InboundSearchResponse>, AppError> {
    let options = state
        .engine
        .trip_search_inbound(&ctx, req.passenger_count)
        .await?;
    Ok(Json(InboundSearchResponse { options }))
}

async fn inbound_hold(
    State(state): State<AppState>,
    Extension(ctx): Extension<SessionContext>,
    Json(req): Json<InboundHoldRequest>,
) -> Result<Json<Hold>, AppError> {
    let hold = state
        .engine
        .trip_hold_inbound(&ctx, req.train_no, req.seat_ids, req.passenger_types)
        .await?;
    Ok(Json(hold))
}

#[derive(Debug, Serialize)]
struct TotalFareResponse {
    total_fare_krw: i64,
}

async fn total_fare(
    State(state): State<AppState>,
    Extension(ctx): Extension<SessionContext>,
) -> Result<Json<TotalFareResponse>, AppError> {
    let total_fare_krw = state.engine.trip_total_fare(&ctx).await?;
    Ok(Json(TotalFareResponse { total_fare_krw }))
}
