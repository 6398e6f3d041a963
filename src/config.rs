use std::env;
use std::time::Duration;

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub database: DatabaseConfig,
    pub metering: MeteringConfig,
    pub storage: StorageConfig,
    pub alerts: AlertConfig,
}

/// Database connection pool configuration
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout: Duration,
    pub idle_timeout: Duration,
    pub max_lifetime: Duration,
}

/// Quota metering configuration
#[derive(Debug, Clone)]
pub struct MeteringConfig {
    /// Upper bound on any single usage-store round trip.
    /// A timed-out store call is treated as a store failure (fail-closed).
    pub store_timeout: Duration,
    /// Interval between call-metering ticks; one tick books one minute
    pub call_tick_interval: Duration,
}

/// Object storage configuration
#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// Base directory for stored objects (defaults applied at use site)
    pub object_dir: Option<String>,
    /// Maximum accepted upload size in bytes
    pub max_upload_bytes: usize,
}

/// Quota alert webhook configuration
#[derive(Debug, Clone)]
pub struct AlertConfig {
    pub webhook_url: Option<String>,
    pub webhook_secret: Option<String>,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .map_err(|_| ConfigError::InvalidPort)?,
            database: DatabaseConfig::from_env()?,
            metering: MeteringConfig::from_env(),
            storage: StorageConfig::from_env(),
            alerts: AlertConfig::from_env(),
        })
    }
}

impl MeteringConfig {
    /// Load metering configuration from environment variables
    pub fn from_env() -> Self {
        Self {
            store_timeout: Duration::from_secs(
                env::var("STORE_TIMEOUT_SECS")
                    .unwrap_or_else(|_| "5".to_string())
                    .parse()
                    .unwrap_or(5),
            ),
            call_tick_interval: Duration::from_secs(
                env::var("CALL_TICK_INTERVAL_SECS")
                    .unwrap_or_else(|_| "60".to_string())
                    .parse()
                    .unwrap_or(60),
            ),
        }
    }
}

impl StorageConfig {
    /// Load storage configuration from environment variables
    pub fn from_env() -> Self {
        Self {
            object_dir: env::var("OBJECT_DIR").ok(),
            max_upload_bytes: env::var("MAX_UPLOAD_BYTES")
                .unwrap_or_else(|_| "52428800".to_string())
                .parse()
                .unwrap_or(52_428_800),
        }
    }
}

impl AlertConfig {
    /// Load alert configuration from environment variables
    pub fn from_env() -> Self {
        Self {
            webhook_url: env::var("QUOTA_WEBHOOK_URL").ok(),
            webhook_secret: env::var("QUOTA_WEBHOOK_SECRET").ok(),
        }
    }
}

impl DatabaseConfig {
    /// Load database configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let url = env::var("DATABASE_URL").map_err(|_| ConfigError::MissingDatabaseUrl)?;

        Ok(Self {
            url,
            max_connections: env::var("DATABASE_MAX_CONNECTIONS")
                .unwrap_or_else(|_| "10".to_string())
                .parse()
                .unwrap_or(10),
            min_connections: env::var("DATABASE_MIN_CONNECTIONS")
                .unwrap_or_else(|_| "1".to_string())
                .parse()
                .unwrap_or(1),
            acquire_timeout: Duration::from_secs(
                env::var("DATABASE_ACQUIRE_TIMEOUT_SECS")
                    .unwrap_or_else(|_| "5".to_string())
                    .parse()
                    .unwrap_or(5),
            ),
            idle_timeout: Duration::from_secs(
                env::var("DATABASE_IDLE_TIMEOUT_SECS")
                    .unwrap_or_else(|_| "600".to_string())
                    .parse()
                    .unwrap_or(600),
            ),
            max_lifetime: Duration::from_secs(
                env::var("DATABASE_MAX_LIFETIME_SECS")
                    .unwrap_or_else(|_| "1800".to_string())
                    .parse()
                    .unwrap_or(1800),
            ),
        })
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    MissingDatabaseUrl,
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "PORT must be a valid number"),
            ConfigError::MissingDatabaseUrl => {
                write!(f, "DATABASE_URL environment variable is required")
            }
        }
    }
}

impl std::error::Error for ConfigError {}
