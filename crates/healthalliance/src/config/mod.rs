use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};

use crate::access::ApiKeyAllowlist;

/// Keys accepted outside production when `API_KEYS` is not set.
pub const DEVELOPMENT_API_KEYS: &str = "dev-key-dkfz,dev-key-ukhd,dev-key-embl";

/// Distinguishes runtime behavior for different stages of the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Top-level configuration for the application.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub metrics: MetricsConfig,
    pub telemetry: TelemetryConfig,
    pub access: AccessConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = parse_port("APP_PORT", 8000)?;
        let metrics_port = parse_port("METRICS_PORT", 8001)?;

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let api_keys = match env::var("API_KEYS") {
            Ok(raw) => raw,
            Err(_) if environment == AppEnvironment::Production => String::new(),
            Err(_) => DEVELOPMENT_API_KEYS.to_string(),
        };

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            metrics: MetricsConfig { port: metrics_port },
            telemetry: TelemetryConfig {
                log_level,
                ansi: environment == AppEnvironment::Development,
            },
            access: AccessConfig { api_keys },
        })
    }
}

fn parse_port(variable: &'static str, default: u16) -> Result<u16, ConfigError> {
    match env::var(variable) {
        Ok(raw) => raw
            .trim()
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort { variable }),
        Err(_) => Ok(default),
    }
}

/// Settings controlling the HTTP server binding.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        resolve(&self.host, self.port)
    }
}

/// The Prometheus scrape listener shares the API host but binds its own port.
#[derive(Debug, Clone)]
pub struct MetricsConfig {
    pub port: u16,
}

impl MetricsConfig {
    pub fn socket_addr(&self, host: &str) -> Result<SocketAddr, ConfigError> {
        resolve(host, self.port)
    }
}

fn resolve(host: &str, port: u16) -> Result<SocketAddr, ConfigError> {
    if host.eq_ignore_ascii_case("localhost") {
        return Ok(SocketAddr::new(IpAddr::from([127, 0, 0, 1]), port));
    }

    let ip: IpAddr = host
        .parse()
        .map_err(|source| ConfigError::InvalidHost { source })?;

    Ok(SocketAddr::new(ip, port))
}

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
    pub ansi: bool,
}

/// Raw `API_KEYS` value; parsed into an allowlist once at startup.
#[derive(Debug, Clone)]
pub struct AccessConfig {
    pub api_keys: String,
}

impl AccessConfig {
    pub fn allowlist(&self) -> ApiKeyAllowlist {
        ApiKeyAllowlist::from_comma_separated(&self.api_keys)
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort { variable: &'static str },
    InvalidHost { source: std::net::AddrParseError },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort { variable } => write!(f, "{variable} must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidPort { .. } => None,
            ConfigError::InvalidHost { source } => Some(source),
        }
    }
}
