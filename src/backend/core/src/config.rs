//! Configuration management.
//!
//! Values come from an optional TOML file layered under `SALON__*`
//! environment variables, e.g. `SALON__SERVER__PORT=9000`.

use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

use crate::appointments::BookingPolicies;
use crate::error::{Result, SalonError};
use crate::middleware::auth::AuthConfig;

const ENV_PREFIX: &str = "SALON";
const CONFIG_PATH_VAR: &str = "SALON_CONFIG";
const DEFAULT_CONFIG_PATH: &str = "salon.toml";

/// Main application configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub database: DatabaseConfig,

    #[serde(default)]
    pub auth: AuthSettings,

    #[serde(default)]
    pub observability: ObservabilityConfig,

    /// Transition and double-booking policies
    #[serde(default)]
    pub booking: BookingPolicies,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// HTTP server host
    #[serde(default = "default_host")]
    pub host: String,

    /// HTTP server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Requests running longer than this are answered with 408
    #[serde(default = "default_request_timeout", with = "humantime_serde")]
    pub request_timeout: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            request_timeout: default_request_timeout(),
        }
    }
}

impl ServerConfig {
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL, or `memory://` for the in-process store
    #[serde(default = "default_database_url")]
    pub url: String,

    /// Maximum number of connections
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    /// Minimum number of connections
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,

    #[serde(default = "default_acquire_timeout", with = "humantime_serde")]
    pub acquire_timeout: Duration,

    /// Apply pending migrations at startup
    #[serde(default = "default_run_migrations")]
    pub run_migrations: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: default_database_url(),
            max_connections: default_max_connections(),
            min_connections: default_min_connections(),
            acquire_timeout: default_acquire_timeout(),
            run_migrations: default_run_migrations(),
        }
    }
}

impl DatabaseConfig {
    pub fn is_in_memory(&self) -> bool {
        self.url.starts_with("memory://")
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthSettings {
    /// HMAC secret for bearer tokens. Required.
    pub jwt_secret: Option<String>,

    pub issuer: Option<String>,

    pub audience: Option<String>,

    #[serde(default = "default_leeway_secs")]
    pub leeway_secs: u64,
}

impl Default for AuthSettings {
    fn default() -> Self {
        Self {
            jwt_secret: None,
            issuer: None,
            audience: None,
            leeway_secs: default_leeway_secs(),
        }
    }
}

impl AuthSettings {
    /// Authenticator settings; fails when no secret is configured.
    pub fn to_auth_config(&self) -> Result<AuthConfig> {
        let secret = self
            .jwt_secret
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| SalonError::configuration("auth.jwt_secret is required"))?;

        let mut builder = AuthConfig::builder()
            .jwt_secret(secret)
            .leeway_secs(self.leeway_secs);
        if let Some(issuer) = &self.issuer {
            builder = builder.issuer(issuer.clone());
        }
        if let Some(audience) = &self.audience {
            builder = builder.audience(audience.clone());
        }
        Ok(builder.build())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Json,
    Pretty,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ObservabilityConfig {
    /// `EnvFilter` directive, e.g. `info` or `salon_core=debug,tower_http=info`
    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default)]
    pub log_format: LogFormat,

    /// OpenTelemetry OTLP endpoint
    pub otlp_endpoint: Option<String>,

    #[serde(default = "default_service_name")]
    pub service_name: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_format: LogFormat::default(),
            otlp_endpoint: None,
            service_name: default_service_name(),
        }
    }
}

// Default value functions
fn default_host() -> String { "0.0.0.0".to_string() }
fn default_port() -> u16 { 8080 }
fn default_request_timeout() -> Duration { Duration::from_secs(30) }
fn default_database_url() -> String { "memory://".to_string() }
fn default_max_connections() -> u32 { 20 }
fn default_min_connections() -> u32 { 2 }
fn default_acquire_timeout() -> Duration { Duration::from_secs(5) }
fn default_run_migrations() -> bool { true }
fn default_leeway_secs() -> u64 { 60 }
fn default_log_level() -> String { "info".to_string() }
fn default_service_name() -> String { "salon-server".to_string() }

impl Config {
    /// Load from `$SALON_CONFIG` (default `salon.toml`, optional) and the environment.
    pub fn load() -> Result<Self> {
        let path = std::env::var(CONFIG_PATH_VAR).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        let explicit = std::env::var_os(CONFIG_PATH_VAR).is_some();
        Self::build(Path::new(&path), explicit)
    }

    /// Load from a specific file path. The file must exist.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        Self::build(path.as_ref(), true)
    }

    fn build(path: &Path, required: bool) -> Result<Self> {
        let config = config::Config::builder()
            .add_source(config::File::from(path).required(required))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let cfg: Config = config.try_deserialize()?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Startup checks that serde defaults cannot express.
    pub fn validate(&self) -> Result<()> {
        self.auth.to_auth_config()?;
        if self.database.min_connections > self.database.max_connections {
            return Err(SalonError::configuration(format!(
                "database.min_connections ({}) exceeds database.max_connections ({})",
                self.database.min_connections, self.database.max_connections
            )));
        }
        if self.server.request_timeout.is_zero() {
            return Err(SalonError::configuration("server.request_timeout must be positive"));
        }
        Ok(())
    }
}
