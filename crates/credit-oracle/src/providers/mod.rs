//! Provider adapters and the engine that dispatches to them.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::info;

pub mod coinbase;
pub mod covalent;
pub mod plaid;

use crate::config::{ConfigError, ScoringConfig, Thresholds};
use crate::scoring::{
    calc_risk, compose, interpret, qualitative_feedback, CategoryLayout, Interpretation, Messages,
    ModelWeights, ParamError, ProviderFeedback, RateSource, RawParams, Ranges, Risk, ScoreRange,
    ScoringError, WeightSet,
};

use coinbase::{CoinbaseFeedback, CoinbaseParams, CoinbaseRecords};
use covalent::{CovalentFeedback, CovalentParams, CovalentRecords, ErcRank};
use plaid::{PlaidFeedback, PlaidParams, PlaidRecords};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    Plaid,
    Coinbase,
    Covalent,
}

impl ProviderKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Plaid => "plaid",
            Self::Coinbase => "coinbase",
            Self::Covalent => "covalent",
        }
    }

    /// Categories and metrics in declared order.
    pub fn layout(self) -> &'static [CategoryLayout] {
        match self {
            Self::Plaid => plaid::LAYOUT,
            Self::Coinbase => coinbase::LAYOUT,
            Self::Covalent => covalent::LAYOUT,
        }
    }

    /// Category whose zero score switches the composer to penalty weights.
    pub fn disqualifying_category(self) -> &'static str {
        match self {
            Self::Plaid => plaid::CREDIT,
            Self::Coinbase => coinbase::KYC,
            Self::Covalent => covalent::CREDIBILITY,
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown provider `{0}`")]
pub struct UnknownProvider(pub String);

impl FromStr for ProviderKind {
    type Err = UnknownProvider;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "plaid" => Ok(Self::Plaid),
            "coinbase" => Ok(Self::Coinbase),
            "covalent" => Ok(Self::Covalent),
            other => Err(UnknownProvider(other.to_string())),
        }
    }
}

/// Direction of value relative to the borrower.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FlowDirection {
    Credit,
    Debit,
}

#[derive(Debug, thiserror::Error)]
pub enum RecordsError {
    #[error("unable to read records {}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("records are not valid: {0}")]
    Parse(#[from] serde_json::Error),
}

pub fn parse_records<T: DeserializeOwned>(raw: &str) -> Result<T, RecordsError> {
    Ok(serde_json::from_str(raw)?)
}

pub fn load_records<T: DeserializeOwned>(path: &Path) -> Result<T, RecordsError> {
    let raw = fs::read_to_string(path).map_err(|source| RecordsError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    parse_records(&raw)
}

/// Everything a provider needs to score one request.
#[derive(Debug, Clone)]
pub struct ProviderSetup<P> {
    pub params: P,
    pub model: ModelWeights,
    pub messages: Messages,
    pub thresholds: Thresholds,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryScore {
    pub category: &'static str,
    pub score: f64,
}

/// Raw engine output before risk and interpretation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreOutcome<F> {
    pub score: f64,
    pub composite: f64,
    pub weight_set: WeightSet,
    pub categories: Vec<CategoryScore>,
    pub feedback: F,
}

impl<F> ScoreOutcome<F> {
    pub(crate) fn compose(
        kind: ProviderKind,
        categories: Vec<CategoryScore>,
        feedback: F,
        model: &ModelWeights,
        range: &ScoreRange,
    ) -> Result<Self, ScoringError> {
        let scores: Vec<f64> = categories.iter().map(|category| category.score).collect();
        let composite = compose(&scores, model, kind.disqualifying_category(), range)?;
        Ok(Self {
            score: composite.score,
            composite: composite.composite,
            weight_set: composite.weight_set,
            categories,
            feedback,
        })
    }
}

/// Final answer for one borrower.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CreditReport<F> {
    pub provider: ProviderKind,
    pub score: f64,
    pub composite: f64,
    pub weight_set: WeightSet,
    pub risk: Option<Risk>,
    pub message: String,
    pub interpretation: Interpretation,
    pub categories: Vec<CategoryScore>,
    pub feedback: F,
}

impl<F: ProviderFeedback> CreditReport<F> {
    pub fn errors(&self) -> Vec<String> {
        self.feedback
            .categories()
            .into_iter()
            .flat_map(|(category, feedback)| {
                feedback
                    .failures()
                    .iter()
                    .map(move |failure| format!("{category}.{}: {}", failure.metric, failure.message))
            })
            .collect()
    }
}

/// Scoring entry point holding validated, per-request configuration.
#[derive(Debug, Clone)]
pub struct OracleEngine {
    ranges: Ranges,
    loan_unit: String,
    plaid: Option<ProviderSetup<PlaidParams>>,
    coinbase: Option<ProviderSetup<CoinbaseParams>>,
    covalent: Option<ProviderSetup<CovalentParams>>,
}

impl OracleEngine {
    pub fn new(config: &ScoringConfig) -> Result<Self, ConfigError> {
        let range = &config.ranges.score;
        Ok(Self {
            ranges: config.ranges.clone(),
            loan_unit: config.loan_unit.clone(),
            plaid: setup(config, ProviderKind::Plaid, range, PlaidParams::build)?,
            coinbase: setup(config, ProviderKind::Coinbase, range, CoinbaseParams::build)?,
            covalent: setup(config, ProviderKind::Covalent, range, CovalentParams::build)?,
        })
    }

    pub fn ranges(&self) -> &Ranges {
        &self.ranges
    }

    pub fn supports(&self, kind: ProviderKind) -> bool {
        match kind {
            ProviderKind::Plaid => self.plaid.is_some(),
            ProviderKind::Coinbase => self.coinbase.is_some(),
            ProviderKind::Covalent => self.covalent.is_some(),
        }
    }

    pub fn score_plaid(
        &self,
        records: &PlaidRecords,
        now: NaiveDate,
    ) -> Result<ScoreOutcome<PlaidFeedback>, ScoringError> {
        let setup = configured(&self.plaid, ProviderKind::Plaid)?;
        plaid::score(records, now, setup, &self.ranges.score)
    }

    pub fn score_coinbase(
        &self,
        records: &CoinbaseRecords,
        now: NaiveDate,
    ) -> Result<ScoreOutcome<CoinbaseFeedback>, ScoringError> {
        let setup = configured(&self.coinbase, ProviderKind::Coinbase)?;
        coinbase::score(records, now, setup, &self.ranges.score)
    }

    pub fn score_covalent(
        &self,
        records: &CovalentRecords,
        erc_rank: &ErcRank,
        now: NaiveDate,
    ) -> Result<ScoreOutcome<CovalentFeedback>, ScoringError> {
        let setup = configured(&self.covalent, ProviderKind::Covalent)?;
        covalent::score(records, erc_rank, now, setup, &self.ranges.score)
    }

    pub fn report_plaid(
        &self,
        records: &PlaidRecords,
        now: NaiveDate,
        rates: &dyn RateSource,
    ) -> Result<CreditReport<PlaidFeedback>, ScoringError> {
        let setup = configured(&self.plaid, ProviderKind::Plaid)?;
        let outcome = plaid::score(records, now, setup, &self.ranges.score)?;
        self.report(ProviderKind::Plaid, outcome, &setup.messages, rates)
    }

    pub fn report_coinbase(
        &self,
        records: &CoinbaseRecords,
        now: NaiveDate,
        rates: &dyn RateSource,
    ) -> Result<CreditReport<CoinbaseFeedback>, ScoringError> {
        let setup = configured(&self.coinbase, ProviderKind::Coinbase)?;
        let outcome = coinbase::score(records, now, setup, &self.ranges.score)?;
        self.report(ProviderKind::Coinbase, outcome, &setup.messages, rates)
    }

    pub fn report_covalent(
        &self,
        records: &CovalentRecords,
        erc_rank: &ErcRank,
        now: NaiveDate,
        rates: &dyn RateSource,
    ) -> Result<CreditReport<CovalentFeedback>, ScoringError> {
        let setup = configured(&self.covalent, ProviderKind::Covalent)?;
        let outcome = covalent::score(records, erc_rank, now, setup, &self.ranges.score)?;
        self.report(ProviderKind::Covalent, outcome, &setup.messages, rates)
    }

    fn report<F: ProviderFeedback>(
        &self,
        provider: ProviderKind,
        outcome: ScoreOutcome<F>,
        messages: &Messages,
        rates: &dyn RateSource,
    ) -> Result<CreditReport<F>, ScoringError> {
        let disqualified = outcome.feedback.disqualified();
        let score = if disqualified {
            self.ranges.score.head()
        } else {
            outcome.score
        };
        let risk = if disqualified {
            None
        } else {
            Some(calc_risk(score, &self.ranges.score, &self.ranges.loan)?)
        };

        let interpretation = interpret(score, &outcome.feedback, &self.ranges)?;
        let message = qualitative_feedback(
            messages,
            &self.loan_unit,
            score,
            &outcome.feedback,
            &self.ranges,
            rates,
        )?;
        info!(
            provider = provider.as_str(),
            score,
            disqualified,
            risk = ?risk.map(|risk| risk.risk_level),
            "credit report ready"
        );

        Ok(CreditReport {
            provider,
            score,
            composite: outcome.composite,
            weight_set: outcome.weight_set,
            risk,
            message,
            interpretation,
            categories: outcome.categories,
            feedback: outcome.feedback,
        })
    }
}

fn setup<P>(
    config: &ScoringConfig,
    kind: ProviderKind,
    range: &ScoreRange,
    build: fn(&RawParams, &ScoreRange) -> Result<P, ParamError>,
) -> Result<Option<ProviderSetup<P>>, ConfigError> {
    let Some(provider) = config.provider(kind) else {
        return Ok(None);
    };
    let params = build(&provider.params, range).map_err(|source| ConfigError::Params {
        provider: kind.as_str(),
        source,
    })?;
    Ok(Some(ProviderSetup {
        params,
        model: provider.model.clone(),
        messages: provider.messages.clone(),
        thresholds: provider.thresholds.clone(),
    }))
}

fn configured<P>(
    setup: &Option<ProviderSetup<P>>,
    kind: ProviderKind,
) -> Result<&ProviderSetup<P>, ScoringError> {
    setup
        .as_ref()
        .ok_or(ScoringError::ProviderNotConfigured(kind.as_str()))
}
