use crate::cli::Overrides;
use chrono::{NaiveDate, Utc};
use credit_oracle::config::AppConfig;
use credit_oracle::error::AppError;
use credit_oracle::scoring::{FixedRate, ScoringError};
use credit_oracle::{telemetry, OracleEngine, ScoringConfig};
use tracing::info;

/// Everything a command needs once configuration has been resolved.
pub(crate) struct Runtime {
    pub(crate) engine: OracleEngine,
    pub(crate) rates: FixedRate,
    pub(crate) now: NaiveDate,
}

impl Runtime {
    pub(crate) fn prepare(overrides: Overrides) -> Result<Self, AppError> {
        let mut config = AppConfig::load()?;
        if let Some(path) = overrides.config {
            config.oracle.config_path = path;
        }
        if let Some(rate) = overrides.usd_rate {
            config.oracle.usd_rate = rate;
        }

        telemetry::init(&config.telemetry)?;

        let scoring = ScoringConfig::load(&config.oracle.config_path)?;
        let engine = OracleEngine::new(&scoring)?;
        let rates = FixedRate::new(config.oracle.usd_rate).map_err(ScoringError::from)?;
        let now = overrides.now.unwrap_or_else(|| Utc::now().date_naive());

        info!(
            ?config.environment,
            config = %config.oracle.config_path.display(),
            %now,
            "credit oracle ready"
        );

        Ok(Self { engine, rates, now })
    }
}

pub fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}
