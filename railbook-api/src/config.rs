use serde::Deserialize;
use std::env;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub auth: AuthConfig,
    pub booking: BookingConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub jwt_expiration_seconds: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct BookingConfig {
    pub hold_ttl_seconds: u64,
    pub payment_deadline_seconds: u64,
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = config::Config::builder()
            .set_default("server.port", 8080)?
            .set_default("auth.jwt_secret", "railbook-dev-secret")?
            .set_default("auth.jwt_expiration_seconds", 3600)?
            .set_default("booking.hold_ttl_seconds", 600)?
            .set_default("booking.payment_deadline_seconds", 600)?
            // Config files are optional; defaults above keep a bare checkout
            // runnable without any config/ directory.
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{}", run_mode)).required(false))
            .add_source(config::File::with_name("config/local").required(false))
            // Eg. `RAILBOOK__SERVER__PORT=9000` overrides the port.
            .add_source(config::Environment::with_prefix("RAILBOOK").separator("__"))
            .build()?;

        s.try_deserialize()
    }
}
