use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
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
    pub extraction: ExtractionConfig,
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

        let escalation_threshold = match env::var("SCREENING_ESCALATION_THRESHOLD") {
            Ok(raw) => raw
                .trim()
                .parse::<u8>()
                .ok()
                .filter(|value| *value <= 100)
                .ok_or(ConfigError::InvalidEscalationThreshold)?,
            Err(_) => DEFAULT_ESCALATION_THRESHOLD,
        };

        let external_timeout_secs = match env::var("SCREENING_EXTERNAL_TIMEOUT_SECS") {
            Ok(raw) => raw
                .trim()
                .parse::<u64>()
                .ok()
                .filter(|value| *value > 0)
                .ok_or(ConfigError::InvalidTimeout)?,
            Err(_) => DEFAULT_EXTERNAL_TIMEOUT_SECS,
        };

        let external_endpoint = env::var("SCREENING_EXTERNAL_ENDPOINT")
            .ok()
            .filter(|value| !value.trim().is_empty());
        let external_model = env::var("SCREENING_EXTERNAL_MODEL")
            .unwrap_or_else(|_| DEFAULT_EXTERNAL_MODEL.to_string());
        let glossary_path = env::var("SCREENING_GLOSSARY_PATH")
            .ok()
            .filter(|value| !value.trim().is_empty())
            .map(PathBuf::from);

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            extraction: ExtractionConfig {
                escalation_threshold,
                external_endpoint,
                external_model,
                external_timeout_secs,
                glossary_path,
            },
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

pub const DEFAULT_ESCALATION_THRESHOLD: u8 = 60;
pub const DEFAULT_EXTERNAL_TIMEOUT_SECS: u64 = 20;
pub const DEFAULT_EXTERNAL_MODEL: &str = "clinical-extractor";

/// Cascade settings shared by every request. Credentials are never stored here; callers pass
/// them per request through `ExtractionOptions`.
#[derive(Debug, Clone)]
pub struct ExtractionConfig {
    pub escalation_threshold: u8,
    pub external_endpoint: Option<String>,
    pub external_model: String,
    pub external_timeout_secs: u64,
    pub glossary_path: Option<PathBuf>,
}

impl ExtractionConfig {
    pub fn external_timeout(&self) -> Duration {
        Duration::from_secs(self.external_timeout_secs)
    }
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            escalation_threshold: DEFAULT_ESCALATION_THRESHOLD,
            external_endpoint: None,
            external_model: DEFAULT_EXTERNAL_MODEL.to_string(),
            external_timeout_secs: DEFAULT_EXTERNAL_TIMEOUT_SECS,
            glossary_path: None,
        }
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidEscalationThreshold,
    InvalidTimeout,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidEscalationThreshold => write!(
                f,
                "SCREENING_ESCALATION_THRESHOLD must be an integer between 0 and 100"
            ),
            ConfigError::InvalidTimeout => write!(
                f,
                "SCREENING_EXTERNAL_TIMEOUT_SECS must be a positive number of seconds"
            ),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            ConfigError::InvalidPort
            | ConfigError::InvalidEscalationThreshold
            | ConfigError::InvalidTimeout => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::{Mutex, OnceLock};

    fn env_guard() -> &'static Mutex<()> {
        static GUARD: OnceLock<Mutex<()>> = OnceLock::new();
        GUARD.get_or_init(|| Mutex::new(()))
    }

    fn reset_env() {
        env::remove_var("APP_ENV");
        env::remove_var("APP_HOST");
        env::remove_var("APP_PORT");
        env::remove_var("APP_LOG_LEVEL");
        env::remove_var("SCREENING_ESCALATION_THRESHOLD");
        env::remove_var("SCREENING_EXTERNAL_ENDPOINT");
        env::remove_var("SCREENING_EXTERNAL_MODEL");
        env::remove_var("SCREENING_EXTERNAL_TIMEOUT_SECS");
        env::remove_var("SCREENING_GLOSSARY_PATH");
    }

    #[test]
    fn load_uses_defaults_when_env_missing() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        let config = AppConfig::load().expect("config loads with defaults");
        assert_eq!(config.environment, AppEnvironment::Development);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.telemetry.log_level, "info");
        assert_eq!(
            config.extraction.escalation_threshold,
            DEFAULT_ESCALATION_THRESHOLD
        );
        assert!(config.extraction.external_endpoint.is_none());
        assert_eq!(
            config.extraction.external_timeout(),
            Duration::from_secs(DEFAULT_EXTERNAL_TIMEOUT_SECS)
        );
    }

    #[test]
    fn accepts_localhost_host() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("APP_HOST", "localhost");
        let config = AppConfig::load().expect("config loads");
        let addr = config.server.socket_addr().expect("localhost resolves");
        assert_eq!(addr, SocketAddr::new(IpAddr::from([127, 0, 0, 1]), 3000));
        reset_env();
    }

    #[test]
    fn rejects_out_of_range_escalation_threshold() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("SCREENING_ESCALATION_THRESHOLD", "140");
        let error = AppConfig::load().expect_err("threshold above 100 rejected");
        assert!(matches!(error, ConfigError::InvalidEscalationThreshold));
        reset_env();
    }

    #[test]
    fn reads_external_layer_settings() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("SCREENING_EXTERNAL_ENDPOINT", "https://extractor.internal/v1/extract");
        env::set_var("SCREENING_EXTERNAL_TIMEOUT_SECS", "5");
        let config = AppConfig::load().expect("config loads");
        assert_eq!(
            config.extraction.external_endpoint.as_deref(),
            Some("https://extractor.internal/v1/extract")
        );
        assert_eq!(config.extraction.external_timeout(), Duration::from_secs(5));
        reset_env();
    }
}
