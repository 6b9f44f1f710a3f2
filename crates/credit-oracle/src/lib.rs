//! Credit scoring engine.
//!
//! Raw provider records flow upward through metric functions, category
//! aggregators and the model composer into a score, a risk tier and a
//! loan offer. Every data-quality failure is folded into feedback; only
//! configuration defects surface as errors.

pub mod batch;
pub mod config;
pub mod error;
pub mod providers;
pub mod scoring;
pub mod telemetry;

pub use config::{AppConfig, ConfigError, ScoringConfig};
pub use error::AppError;
pub use providers::{CreditReport, OracleEngine};
