use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};

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
    pub claims: ClaimPolicyConfig,
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

        let claims = ClaimPolicyConfig::load()?;

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            claims,
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

/// Tracing and metrics controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

/// Policy knobs for the invitation claim protocol.
///
/// The upstream product never pinned these values, so they are explicit
/// configuration rather than inferred constants.
#[derive(Debug, Clone)]
pub struct ClaimPolicyConfig {
    /// Days an unclaimed invitation stays valid, measured from creation.
    pub validity_days: i64,
    /// Maximum number of record summaries exposed before a claim completes.
    pub preview_cap: usize,
    /// Per-commit mutation ceiling for the account-linking sweep.
    pub link_batch_size: usize,
}

impl ClaimPolicyConfig {
    fn load() -> Result<Self, ConfigError> {
        let validity_days = parse_env("INVITE_VALIDITY_DAYS", 30)?;
        let preview_cap = parse_env("INVITE_PREVIEW_CAP", 5)?;
        let link_batch_size = parse_env("INVITE_LINK_BATCH_SIZE", 400)?;

        if validity_days <= 0 {
            return Err(ConfigError::InvalidClaimPolicy {
                name: "INVITE_VALIDITY_DAYS",
            });
        }
        if link_batch_size == 0 {
            return Err(ConfigError::InvalidClaimPolicy {
                name: "INVITE_LINK_BATCH_SIZE",
            });
        }

        Ok(Self {
            validity_days,
            preview_cap,
            link_batch_size,
        })
    }
}

impl Default for ClaimPolicyConfig {
    fn default() -> Self {
        Self {
            validity_days: 30,
            preview_cap: 5,
            link_batch_size: 400,
        }
    }
}

fn parse_env<T: std::str::FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|_| ConfigError::InvalidClaimPolicy { name }),
        Err(_) => Ok(default),
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidClaimPolicy { name: &'static str },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidClaimPolicy { name } => {
                write!(f, "{name} must be a positive integer")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidPort => None,
            ConfigError::InvalidHost { source } => Some(source),
            ConfigError::InvalidClaimPolicy { .. } => None,
        }
    }
}
