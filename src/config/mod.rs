use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

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
    pub bureau: BureauSettings,
    pub screening: ScreeningSettings,
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

        let bureau = BureauSettings::from_env()?;
        let screening = ScreeningSettings::from_env()?;

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            bureau,
            screening,
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

/// Credit-bureau access settings.
///
/// The credential is optional on purpose: a missing `BUREAU_API_TOKEN`
/// selects the deterministic simulated registry instead of failing.
#[derive(Debug, Clone)]
pub struct BureauSettings {
    pub base_url: String,
    pub token: Option<String>,
    pub attempt_timeout: Duration,
    pub max_attempts: u32,
    pub backoff_unit: Duration,
}

impl BureauSettings {
    fn from_env() -> Result<Self, ConfigError> {
        let base_url = env::var("BUREAU_BASE_URL")
            .unwrap_or_else(|_| "https://api.bureau.example/v1".to_string());

        let token = env::var("BUREAU_API_TOKEN")
            .ok()
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty());

        let timeout_secs = env::var("BUREAU_TIMEOUT_SECS")
            .unwrap_or_else(|_| "12".to_string())
            .parse::<u64>()
            .map_err(|_| ConfigError::InvalidTimeout)?;

        Ok(Self {
            base_url,
            token,
            attempt_timeout: Duration::from_secs(timeout_secs),
            max_attempts: 3,
            backoff_unit: Duration::from_secs(1),
        })
    }
}

/// Pipeline pacing and policy dials.
#[derive(Debug, Clone)]
pub struct ScreeningSettings {
    pub stage_delay: Duration,
    pub account_block_probability: f64,
    pub cap_disqualified: bool,
}

impl ScreeningSettings {
    fn from_env() -> Result<Self, ConfigError> {
        let delay_ms = env::var("STAGE_DELAY_MS")
            .unwrap_or_else(|_| "400".to_string())
            .parse::<u64>()
            .map_err(|_| ConfigError::InvalidStageDelay)?;

        let cap_disqualified = env::var("BUREAU_DISQUALIFIED_POLICY")
            .map(|value| value.trim().eq_ignore_ascii_case("cap"))
            .unwrap_or(false);

        Ok(Self {
            stage_delay: Duration::from_millis(delay_ms),
            account_block_probability: 0.05,
            cap_disqualified,
        })
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidTimeout,
    InvalidStageDelay,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidTimeout => {
                write!(f, "BUREAU_TIMEOUT_SECS must be a whole number of seconds")
            }
            ConfigError::InvalidStageDelay => {
                write!(f, "STAGE_DELAY_MS must be a whole number of milliseconds")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            _ => None,
        }
    }
}
