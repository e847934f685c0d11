use axum::{extract::State, routing::post, Extension, Json, Router};
use chrono::NaiveDate;
use railbook_core::session::SessionContext;
use railbook_domain::leg::{LegRef, ScheduleOption};
use serde::{Deserialize, Serialize};

use crate::{error::AppError, state::AppState};

#[derive(Debug, Deserialize)]
struct SearchRequest {
    departure_station: String,
    arrival_station: String,
    date: NaiveDate,
    #[serde(default)]
    train_no: Option<String>,
    passenger_count: u32,
}

#[derive(Debug, Serialize)]
struct SearchResponse {
    options: Vec<ScheduleOption>,
}

pub fn routes() -> Router<AppState> {
    Router::new().route("/v1/search", post(search))
}

async fn search(
    State(state): State<AppState>,
    Extension(ctx): Extension<SessionContext>,
    Json(req): Json<SearchRequest>,
) -> Result<Json<SearchResponse>, AppError> {
    let leg = LegRef {
        departure_station: req.departure_station,
        arrival_station: req.arrival_station,
        date: req.date,
        train_no: req.train_no.unwrap_or_default(),
    };
    let options = state.engine.search(&ctx, &leg, req.passenger_count).await?;
    Ok(Json(SearchResponse { options }))
}
