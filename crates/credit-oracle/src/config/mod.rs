use std::env;
use std::path::PathBuf;

mod scoring;

pub use scoring::{ProviderConfig, ScoringConfig, Thresholds};

use crate::scoring::{ParamError, RangeError, WeightError};

pub const DEFAULT_CONFIG_PATH: &str = "config/oracle.json";

/// Distinguishes runtime behavior for different stages of deployment.
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

/// Top-level process configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub oracle: OracleConfig,
    pub telemetry: TelemetryConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let config_path = env::var("ORACLE_CONFIG_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH));

        let usd_rate = match env::var("ORACLE_USD_RATE") {
            Ok(raw) => parse_rate(&raw)?,
            Err(_) => 1.0,
        };

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        Ok(Self {
            environment,
            oracle: OracleConfig {
                config_path,
                usd_rate,
            },
            telemetry: TelemetryConfig { log_level },
        })
    }
}

/// Where the scoring bundle lives and how loans are quoted.
#[derive(Debug, Clone)]
pub struct OracleConfig {
    pub config_path: PathBuf,
    pub usd_rate: f64,
}

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

pub fn parse_rate(raw: &str) -> Result<f64, ConfigError> {
    match raw.trim().parse::<f64>() {
        Ok(rate) if rate.is_finite() && rate > 0.0 => Ok(rate),
        _ => Err(ConfigError::InvalidRate(raw.to_string())),
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("ORACLE_USD_RATE must be a positive number, got `{0}`")]
    InvalidRate(String),
    #[error("unable to read scoring configuration {}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("scoring configuration is not valid: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid ranges: {0}")]
    Range(#[from] RangeError),
    #[error("unknown provider `{0}` in minimum_requirements")]
    UnknownProvider(String),
    #[error("provider `{provider}` weights: {source}")]
    Weights {
        provider: &'static str,
        #[source]
        source: WeightError,
    },
    #[error("provider `{provider}` params: {source}")]
    Params {
        provider: &'static str,
        #[source]
        source: ParamError,
    },
    #[error("provider `{provider}` threshold `{key}` must be finite and non-negative")]
    Threshold { provider: &'static str, key: String },
}
