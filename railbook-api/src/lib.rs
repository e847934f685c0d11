use axum::{http::Method, Router};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub mod auth;
pub mod cart;
pub mod config;
pub mod error;
pub mod holds;
pub mod middleware;
pub mod payments;
pub mod reservations;
pub mod search;
pub mod sessions;
pub mod state;
pub mod trips;

pub use state::AppState;

pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers([
            axum::http::header::AUTHORIZATION,
            axum::http::header::CONTENT_TYPE,
            axum::http::header::USER_AGENT,
        ]);

    // Everything except guest login requires a session token.
    let protected = Router::new()
        .merge(search::routes())
        .merge(holds::routes())
        .merge(reservations::routes())
        .merge(cart::routes())
        .merge(trips::routes())
        .merge(payments::routes())
        .merge(sessions::routes())
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::auth::session_auth_middleware,
        ));

    Router::new()
        .merge(auth::routes())
        .merge(protected)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
