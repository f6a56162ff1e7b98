//! Application settings.
//!
//! Layered loading: built-in defaults, then `config/default.toml`, then
//! `config/{RUN_ENV}.toml`, then environment variables. `APP__`-prefixed
//! variables address any key (`APP__SERVER__PORT=8080` sets
//! `server.port`); a handful of well-known plain variables map onto the
//! same keys for convenience.

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

/// Minimum accepted JWT secret length (256 bits).
pub const MIN_JWT_SECRET_LENGTH: usize = 32;

/// Plain environment variables mapped onto settings keys. These win over
/// config files and `APP__` variables.
const ENV_OVERRIDES: [(&str, &str); 7] = [
    ("server.host", "SERVER_HOST"),
    ("server.port", "SERVER_PORT"),
    ("database.url", "DATABASE_URL"),
    ("redis.url", "REDIS_URL"),
    ("jwt.secret", "JWT_SECRET"),
    ("snowflake.machine_id", "SNOWFLAKE_MACHINE_ID"),
    ("media.root", "MEDIA_ROOT"),
];

/// Top-level settings tree, one section per subsystem.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub server: ServerSettings,
    pub database: DatabaseSettings,
    pub redis: RedisSettings,
    pub jwt: JwtSettings,
    pub snowflake: SnowflakeSettings,
    pub cors: CorsSettings,
    pub media: MediaSettings,

    /// Deployment environment name; `production` flips JSON logs and
    /// https media URLs
    pub environment: String,
}

/// Listener binding.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

/// PostgreSQL connection target and pool sizing.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseSettings {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,

    /// Seconds to wait for a pooled connection before giving up
    pub acquire_timeout: u64,
}

/// Redis connection target for the event bus.
#[derive(Debug, Clone, Deserialize)]
pub struct RedisSettings {
    pub url: String,
}

/// Token signing and lifetime configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct JwtSettings {
    pub secret: String,
    pub access_token_expiry_minutes: i64,
    pub refresh_token_expiry_days: i64,
}

/// Snowflake generator identity. The pair must be unique per running
/// process across the deployment or IDs can collide.
#[derive(Debug, Clone, Deserialize)]
pub struct SnowflakeSettings {
    /// Machine/worker ID (0-31)
    pub machine_id: u16,

    /// Node ID within the machine (0-31)
    pub node_id: u16,
}

/// Allowed CORS origins; an empty list falls back to allow-any.
#[derive(Debug, Clone, Deserialize)]
pub struct CorsSettings {
    pub allowed_origins: Vec<String>,
}

/// Where uploaded images live on disk.
#[derive(Debug, Clone, Deserialize)]
pub struct MediaSettings {
    pub root: String,
}

impl Settings {
    /// Load settings from defaults, config files and the environment.
    ///
    /// # Errors
    ///
    /// Fails when a required key (database url, redis url, jwt secret)
    /// ends up unset, or the JWT secret is shorter than
    /// [`MIN_JWT_SECRET_LENGTH`].
    pub fn load() -> Result<Self, ConfigError> {
        // Pull in a .env file when present
        let _ = dotenvy::dotenv();

        let environment = std::env::var("RUN_ENV").unwrap_or_else(|_| "development".into());

        let mut builder = Config::builder()
            .set_default("environment", environment.clone())?
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 3000)?
            .set_default("database.max_connections", 10)?
            .set_default("database.min_connections", 2)?
            .set_default("database.acquire_timeout", 30)?
            .set_default("jwt.access_token_expiry_minutes", 15)?
            .set_default("jwt.refresh_token_expiry_days", 7)?
            .set_default("snowflake.machine_id", 1)?
            .set_default("snowflake.node_id", 1)?
            .set_default("cors.allowed_origins", vec!["http://localhost:3000"])?
            .set_default("media.root", "media")?
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", environment)).required(false))
            .add_source(
                Environment::default()
                    .prefix("APP")
                    .separator("__")
                    .try_parsing(true),
            );

        for (key, var) in ENV_OVERRIDES {
            builder = builder.set_override_option(key, std::env::var(var).ok())?;
        }

        let settings: Self = builder.build()?.try_deserialize()?;

        if settings.jwt.secret.len() < MIN_JWT_SECRET_LENGTH {
            return Err(ConfigError::Message(format!(
                "JWT secret must be at least {} characters, got {}",
                MIN_JWT_SECRET_LENGTH,
                settings.jwt.secret.len()
            )));
        }

        Ok(settings)
    }

    /// Whether the server runs in production mode.
    ///
    /// Controls JSON logging and the scheme used for absolute media URLs.
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}
