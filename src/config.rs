//! Configuration management.
//!
//! Values are layered: built-in defaults, then an optional `config.*` file,
//! then `RX__`-prefixed environment variables with `__` as the nesting
//! separator (`RX__SERVER__PORT=9090`). Two bare escape hatches are honored
//! for deployment convenience: `DATABASE_URL` and `WEB_ORIGIN`.

use serde::Deserialize;
use std::net::SocketAddr;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Origins allowed by CORS. A single `*` entry allows any origin.
    #[serde(default = "default_cors_origins")]
    pub cors_origins: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Postgres connection string. When unset the server still starts, but
    /// store-backed endpoints fail and readiness reports `db: "unknown"`.
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default = "default_pool_min_size")]
    pub pool_min_size: u32,
    #[serde(default = "default_pool_max_size")]
    pub pool_max_size: u32,
    #[serde(default = "default_pool_timeout")]
    pub pool_timeout_seconds: u64,
    /// Upper bound on the readiness ping round trip.
    #[serde(default = "default_ping_timeout")]
    pub ping_timeout_seconds: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Use JSON formatting for logs (recommended for production)
    #[serde(default)]
    pub json: bool,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_cors_origins() -> Vec<String> {
    // Local dev origin of the browser UI.
    vec!["http://localhost:5173".to_string()]
}

fn default_pool_min_size() -> u32 {
    2
}

fn default_pool_max_size() -> u32 {
    20
}

fn default_pool_timeout() -> u64 {
    60
}

fn default_ping_timeout() -> u64 {
    2
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Config {
    /// Load configuration from defaults, config file, and environment.
    pub fn load() -> anyhow::Result<Self> {
        // Load .env file if present
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .set_default("server.host", default_host())?
            .set_default("server.port", default_port())?
            .set_default("server.cors_origins", default_cors_origins())?
            .set_default("database.pool_min_size", default_pool_min_size())?
            .set_default("database.pool_max_size", default_pool_max_size())?
            .set_default("database.pool_timeout_seconds", default_pool_timeout())?
            .set_default("database.ping_timeout_seconds", default_ping_timeout())?
            .set_default("logging.level", default_log_level())?
            .set_default("logging.json", false)?
            .add_source(config::File::with_name("config").required(false))
            // RX__DATABASE__URL -> config.database.url
            // Arrays use comma separator: RX__SERVER__CORS_ORIGINS=https://a.com,https://b.com
            .add_source(
                config::Environment::with_prefix("RX")
                    .prefix_separator("__")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("server.cors_origins")
                    .try_parsing(true),
            )
            .build()?;

        let mut config: Self = config.try_deserialize()?;

        // Bare DATABASE_URL sets `database.url` when no explicit override is present.
        if std::env::var("RX__DATABASE__URL").is_err() {
            if let Ok(url) = std::env::var("DATABASE_URL") {
                config.database.url = Some(url);
            }
        }

        // Bare WEB_ORIGIN (comma-separated or "*") sets the CORS allow list.
        if std::env::var("RX__SERVER__CORS_ORIGINS").is_err() {
            if let Ok(origins) = std::env::var("WEB_ORIGIN") {
                let parsed: Vec<String> = origins
                    .split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect();
                if !parsed.is_empty() {
                    config.server.cors_origins = parsed;
                }
            }
        }

        Ok(config)
    }

    pub fn socket_addr(&self) -> anyhow::Result<SocketAddr> {
        let addr = format!("{}:{}", self.server.host, self.server.port);
        Ok(addr.parse()?)
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.database.pool_max_size == 0 {
            return Err("database.pool_max_size must be > 0".to_string());
        }
        if self.database.pool_min_size > self.database.pool_max_size {
            return Err("database.pool_min_size must be <= database.pool_max_size".to_string());
        }
        if self.database.ping_timeout_seconds == 0 {
            return Err("database.ping_timeout_seconds must be > 0".to_string());
        }
        if self.server.cors_origins.is_empty() {
            return Err("server.cors_origins must not be empty".to_string());
        }
        Ok(())
    }
}
