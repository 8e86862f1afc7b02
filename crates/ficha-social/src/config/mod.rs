use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};

use crate::pagination::PaginationSettings;
use crate::records::RecordPolicy;

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
    pub telemetry: TelemetryConfig,
    pub records: RecordsConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort)?;

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let local_nationality =
            env::var("APP_LOCAL_NATIONALITY").unwrap_or_else(|_| "chilena".to_string());
        let default_page_limit = numeric_var("APP_PAGE_LIMIT_DEFAULT", 20)?;
        let max_page_limit = numeric_var("APP_PAGE_LIMIT_MAX", 100)?;
        let minimum_interviews = numeric_var("APP_AUDIT_MIN_INTERVIEWS", 0)?;

        if default_page_limit == 0 || max_page_limit == 0 || default_page_limit > max_page_limit {
            return Err(ConfigError::InvalidPageLimits {
                default: default_page_limit,
                max: max_page_limit,
            });
        }

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            records: RecordsConfig {
                local_nationality,
                default_page_limit,
                max_page_limit,
                minimum_interviews,
            },
        })
    }
}

fn numeric_var(name: &'static str, default: u32) -> Result<u32, ConfigError> {
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse::<u32>()
            .map_err(|_| ConfigError::InvalidNumber { name }),
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
        if self.host.eq_ignore_ascii_case("localhost") {
            return Ok(SocketAddr::new(IpAddr::from([127, 0, 0, 1]), self.port));
        }

        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|source| ConfigError::InvalidHost { source })?;

        Ok(SocketAddr::new(ip, self.port))
    }
}

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

/// Intake record scoring, listing, and audit knobs.
#[derive(Debug, Clone)]
pub struct RecordsConfig {
    pub local_nationality: String,
    pub default_page_limit: u32,
    pub max_page_limit: u32,
    pub minimum_interviews: u32,
}

impl RecordsConfig {
    pub fn policy(&self) -> RecordPolicy {
        RecordPolicy {
            local_nationality: self.local_nationality.clone(),
            pagination: PaginationSettings {
                default_limit: self.default_page_limit,
                max_limit: self.max_page_limit,
            },
            minimum_interviews: self.minimum_interviews,
        }
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidNumber { name: &'static str },
    InvalidPageLimits { default: u32, max: u32 },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidNumber { name } => {
                write!(f, "{name} must be a non-negative integer")
            }
            ConfigError::InvalidPageLimits { default, max } => write!(
                f,
                "page limits must be positive with default <= max (default {default}, max {max})"
            ),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            ConfigError::InvalidPort
            | ConfigError::InvalidNumber { .. }
            | ConfigError::InvalidPageLimits { .. } => None,
        }
    }
}
