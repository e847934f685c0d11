use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::Response,
};
use chrono::{TimeZone, Utc};
use jsonwebtoken::{decode, DecodingKey, Validation};
use railbook_core::session::SessionContext;
use serde::{Deserialize, Serialize};

use crate::state::AppState;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SessionClaims {
    pub sub: String,
    pub exp: usize,
}

/// Every booking operation requires an authenticated session; an
/// unauthenticated caller is turned away here, before the engine is reached,
/// and never fails silently deeper in the flow.
pub async fn session_auth_middleware(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let auth_header = req
        .headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .ok_or(StatusCode::UNAUTHORIZED)?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or(StatusCode::UNAUTHORIZED)?;

    let token_data = decode::<SessionClaims>(
        token,
        &DecodingKey::from_secret(state.auth.secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|_| StatusCode::UNAUTHORIZED)?;

    let expiry = Utc
        .timestamp_opt(token_data.claims.exp as i64, 0)
        .single()
        .ok_or(StatusCode::UNAUTHORIZED)?;
    let context = SessionContext::new(token_data.claims.sub, expiry);

    req.extensions_mut().insert(context);
    Ok(next.run(req).await)
}
