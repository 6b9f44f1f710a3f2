//! Provider-independent scoring primitives: bins, matrices, rewards,
//! sub-scores, feedback, aggregation, composition, risk and interpretation.

pub mod aggregate;
pub mod bins;
pub mod composer;
pub mod feedback;
pub mod interpret;
pub mod metric;
pub mod params;
pub mod ranges;
pub mod risk;
pub mod timeline;
pub mod weights;

pub use aggregate::{category_score, CategoryRun};
pub use bins::{round2, BinArray, LogBase, MatrixSpec, Rewards, ScoringMatrix};
pub use composer::{compose, Composite, WeightSet};
pub use feedback::{CategoryFeedback, FetchFeedback, Observation, ProviderFeedback};
pub use interpret::{
    interpret, qualitative_feedback, FixedRate, Interpretation, Messages, RateError, RateSource,
};
pub use metric::{loan_duedate, Measured, MetricError, MetricResult, Subscore};
pub use params::{ParamError, RawParams};
pub use ranges::{LoanRange, QualitativeRange, RangeError, Ranges, ScoreRange};
pub use risk::{calc_risk, Risk, RiskLevel};
pub use weights::{CategoryLayout, CategoryWeights, ModelWeights, RawCategoryWeights, WeightError};

/// Failures that indicate a configuration or programming defect.
///
/// Unlike [`MetricError`], these abort the scoring request.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ScoringError {
    #[error("expected {expected} weights, found {found} sub-scores")]
    WeightMismatch { expected: usize, found: usize },
    #[error("category `{category}` ran metrics {ran:?} but declares {declared:?}")]
    MetricOrder {
        category: &'static str,
        declared: Vec<&'static str>,
        ran: Vec<&'static str>,
    },
    #[error("model has no category `{0}`")]
    UnknownCategory(&'static str),
    #[error("{0} is not a number")]
    NotANumber(&'static str),
    #[error("loan range has no entry {index} (length {len})")]
    LoanOutOfRange { index: usize, len: usize },
    #[error("qualitative range has no label for bin {bin}")]
    QualityOutOfRange { bin: usize },
    #[error("provider `{0}` is not configured")]
    ProviderNotConfigured(&'static str),
    #[error(transparent)]
    Rate(#[from] RateError),
}
