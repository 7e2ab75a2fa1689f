use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};

use crate::waitlist::{ActorId, ClassificationMode, WaitlistSettings, DEFAULT_WAITLIST_NOTICE};

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
    pub waitlist: WaitlistSettings,
    /// Actors granted both permissions needed for manual waitlist moves.
    pub operators: Vec<ActorId>,
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
        let format = LogFormat::from_str(
            &env::var("APP_LOG_FORMAT").unwrap_or_else(|_| "compact".to_string()),
        );

        let capacity_limit = env::var("WAITLIST_CAPACITY")
            .unwrap_or_else(|_| "10".to_string())
            .trim()
            .parse::<u64>()
            .map_err(|_| ConfigError::InvalidCapacity)?;

        let classification_mode = if flag("WAITLIST_SERIALIZED")? {
            ClassificationMode::Serialized
        } else {
            ClassificationMode::Racy
        };

        // Token fields stay raw here; they are resolved per evaluation.
        let waitlist = WaitlistSettings {
            capacity_limit,
            waitlist_enabled: env::var("WAITLIST_ENABLED").unwrap_or_else(|_| "On".to_string()),
            waitlist_threshold: env::var("WAITLIST_THRESHOLD")
                .unwrap_or_else(|_| "3".to_string()),
            waitlist_notice: env::var("WAITLIST_NOTICE")
                .unwrap_or_else(|_| DEFAULT_WAITLIST_NOTICE.to_string()),
            debug: flag("WAITLIST_DEBUG")?,
            classification_mode,
        };

        let operators = env::var("WAITLIST_OPERATORS")
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|actor| !actor.is_empty())
            .map(|actor| ActorId(actor.to_string()))
            .collect();

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level, format },
            waitlist,
            operators,
        })
    }
}

fn flag(name: &'static str) -> Result<bool, ConfigError> {
    let Ok(value) = env::var(name) else {
        return Ok(false);
    };

    match value.trim().to_ascii_lowercase().as_str() {
        "" | "0" | "false" | "no" | "off" => Ok(false),
        "1" | "true" | "yes" | "on" => Ok(true),
        _ => Err(ConfigError::InvalidFlag { name }),
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

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Compact,
    Json,
}

impl LogFormat {
    fn from_str(value: &str) -> Self {
        if value.trim().eq_ignore_ascii_case("json") {
            Self::Json
        } else {
            Self::Compact
        }
    }
}

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
    pub format: LogFormat,
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidCapacity,
    InvalidFlag { name: &'static str },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidCapacity => {
                write!(f, "WAITLIST_CAPACITY must be a non-negative integer")
            }
            ConfigError::InvalidFlag { name } => {
                write!(f, "{name} must be one of true/false, yes/no, on/off, 1/0")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            ConfigError::InvalidPort
            | ConfigError::InvalidCapacity
            | ConfigError::InvalidFlag { .. } => None,
        }
    }
}
