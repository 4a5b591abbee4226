use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};

use crate::workflows::assignment::{Criteria, CriteriaError};

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
    pub assignment: AssignmentSettings,
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

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            assignment: AssignmentSettings::from_env()?,
        })
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

/// Defaults applied to recommendation requests that do not override them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssignmentSettings {
    pub default_criteria: Criteria,
    pub post_decline_comments: bool,
    pub post_assignment_comments: bool,
}

impl Default for AssignmentSettings {
    fn default() -> Self {
        Self {
            default_criteria: Criteria::all(),
            post_decline_comments: true,
            post_assignment_comments: true,
        }
    }
}

impl AssignmentSettings {
    fn from_env() -> Result<Self, ConfigError> {
        let default_criteria = match env::var("ASSIGN_DISABLED_CRITERIA") {
            Ok(raw) => {
                let names = raw
                    .split(',')
                    .map(str::trim)
                    .filter(|name| !name.is_empty());
                Criteria::disabling(names).map_err(ConfigError::InvalidCriteria)?
            }
            Err(_) => Criteria::all(),
        };

        Ok(Self {
            default_criteria,
            post_decline_comments: flag_from_env("ASSIGN_POST_DECLINE_COMMENTS", true)?,
            post_assignment_comments: flag_from_env("ASSIGN_POST_ASSIGNMENT_COMMENTS", true)?,
        })
    }
}

fn flag_from_env(name: &'static str, default: bool) -> Result<bool, ConfigError> {
    let Ok(raw) = env::var(name) else {
        return Ok(default);
    };

    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidFlag { name, value: raw }),
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidCriteria(CriteriaError),
    InvalidFlag { name: &'static str, value: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidCriteria(err) => {
                write!(f, "ASSIGN_DISABLED_CRITERIA is invalid: {}", err)
            }
            ConfigError::InvalidFlag { name, value } => {
                write!(f, "{} must be a boolean, found '{}'", name, value)
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidPort | ConfigError::InvalidFlag { .. } => None,
            ConfigError::InvalidHost { source } => Some(source),
            ConfigError::InvalidCriteria(err) => Some(err),
        }
    }
}
