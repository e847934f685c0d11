use std::net::SocketAddr;
use std::sync::Arc;

use chrono::Duration;
use railbook_api::{
    app,
    config::Config,
    state::{AppState, AuthConfig},
};
use railbook_booking::{
    stub::{InMemorySeatSupplier, ScriptedGateway},
    BookingEngine, BookingRules,
};
use railbook_core::clock::SystemClock;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "railbook_api=debug,railbook_booking=debug,tower_http=debug,axum::rejection=trace"
                    .into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::load().expect("Failed to load config");
    tracing::info!("Starting Railbook API on port {}", config.server.port);

    let clock = Arc::new(SystemClock);
    let supplier = Arc::new(InMemorySeatSupplier::seeded(clock.clone()));
    let gateway = Arc::new(ScriptedGateway::new());

    let rules = BookingRules {
        hold_ttl: Duration::seconds(config.booking.hold_ttl_seconds as i64),
        payment_deadline: Duration::seconds(config.booking.payment_deadline_seconds as i64),
    };

    let engine = Arc::new(BookingEngine::new(supplier, gateway, clock, rules));

    let app_state = AppState {
        engine,
        auth: AuthConfig {
            secret: config.auth.jwt_secret.clone(),
            expiration_seconds: config.auth.jwt_expiration_seconds,
        },
    };

    let app = app(app_state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
    axum::serve(listener, app).await.unwrap();
}
