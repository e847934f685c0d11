use railbook_booking::BookingEngine;
use std::sync::Arc;

#[derive(Clone)]
pub struct AuthConfig {
    pub secret: String,
    pub expiration_seconds: u64,
}

#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<BookingEngine>,
    pub auth: AuthConfig,
}
