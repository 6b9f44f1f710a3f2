use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::ConfigError;
use crate::providers::ProviderKind;
use crate::scoring::{
    LoanRange, Messages, ModelWeights, QualitativeRange, RawCategoryWeights, RawParams, Ranges,
    ScoreRange,
};

const DEFAULT_LOAN_UNIT: &str = "NEAR";

fn default_loan_unit() -> String {
    DEFAULT_LOAN_UNIT.to_string()
}

#[derive(Debug, Deserialize)]
struct RawScoringConfig {
    score_range: Vec<f64>,
    loan_range: Vec<f64>,
    qualitative_range: Vec<String>,
    #[serde(default = "default_loan_unit")]
    loan_unit: String,
    minimum_requirements: BTreeMap<String, RawProviderConfig>,
}

#[derive(Debug, Deserialize)]
struct RawProviderConfig {
    #[serde(default)]
    thresholds: BTreeMap<String, f64>,
    params: RawParams,
    scores: RawScores,
    messages: Messages,
}

#[derive(Debug, Deserialize)]
struct RawScores {
    models: BTreeMap<String, RawCategoryWeights>,
}

/// Open map of numeric limits a provider consults.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Thresholds(BTreeMap<String, f64>);

impl Thresholds {
    pub fn get(&self, key: &str) -> Option<f64> {
        self.0.get(key).copied()
    }

    /// A count-like threshold, falling back to `default` when unset.
    pub fn count_or(&self, key: &str, default: usize) -> usize {
        self.get(key).map_or(default, |value| value as usize)
    }
}

impl From<BTreeMap<String, f64>> for Thresholds {
    fn from(value: BTreeMap<String, f64>) -> Self {
        Self(value)
    }
}

/// Validated configuration for one provider.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderConfig {
    pub thresholds: Thresholds,
    pub params: RawParams,
    pub model: ModelWeights,
    pub messages: Messages,
}

/// The scoring bundle: ranges shared by every provider plus per-provider
/// parameters, weights and messages.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoringConfig {
    pub ranges: Ranges,
    pub loan_unit: String,
    providers: BTreeMap<ProviderKind, ProviderConfig>,
}

impl ScoringConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&raw)
    }

    pub fn from_json(raw: &str) -> Result<Self, ConfigError> {
        let raw: RawScoringConfig = serde_json::from_str(raw)?;

        let score = ScoreRange::new(raw.score_range)?;
        let loan = LoanRange::new(raw.loan_range, &score)?;
        let quality = QualitativeRange::new(raw.qualitative_range, &score)?;

        let mut providers = BTreeMap::new();
        for (name, provider) in raw.minimum_requirements {
            let kind: ProviderKind = name
                .parse()
                .map_err(|_| ConfigError::UnknownProvider(name.clone()))?;
            providers.insert(kind, validate_provider(kind, provider)?);
        }
        debug!(providers = providers.len(), "scoring configuration loaded");

        Ok(Self {
            ranges: Ranges {
                score,
                loan,
                quality,
            },
            loan_unit: raw.loan_unit,
            providers,
        })
    }

    pub fn provider(&self, kind: ProviderKind) -> Option<&ProviderConfig> {
        self.providers.get(&kind)
    }

    pub fn providers(&self) -> impl Iterator<Item = (ProviderKind, &ProviderConfig)> {
        self.providers.iter().map(|(kind, config)| (*kind, config))
    }
}

fn validate_provider(
    kind: ProviderKind,
    raw: RawProviderConfig,
) -> Result<ProviderConfig, ConfigError> {
    let provider = kind.as_str();

    let model =
        ModelWeights::from_raw(&raw.scores.models, kind.layout()).map_err(|source| {
            ConfigError::Weights { provider, source }
        })?;

    for key in raw.params.metrics.keys() {
        raw.params
            .bins(key)
            .map_err(|source| ConfigError::Params { provider, source })?;
    }
    for key in raw.params.matrices.keys() {
        raw.params
            .matrix(key)
            .map_err(|source| ConfigError::Params { provider, source })?;
    }

    if let Some((key, _)) = raw
        .thresholds
        .iter()
        .find(|(_, value)| !value.is_finite() || **value < 0.0)
    {
        return Err(ConfigError::Threshold {
            provider,
            key: key.clone(),
        });
    }

    Ok(ProviderConfig {
        thresholds: Thresholds::from(raw.thresholds),
        params: raw.params,
        model,
        messages: raw.messages,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn coinbase_bundle() -> serde_json::Value {
        json!({
            "score_range": [300, 500, 640, 740, 850],
            "loan_range": [0, 1000, 5000, 10000, 25000],
            "qualitative_range": ["poor", "fair", "good", "excellent"],
            "minimum_requirements": {
                "coinbase": {
                    "thresholds": {"months_history": 12},
                    "params": {
                        "metrics": {"duration": [90, 180, 365]},
                        "matrices": {
                            "activity_volume": {"shape": [4, 4], "scalars": [4.5, 4.5]}
                        }
                    },
                    "scores": {"models": {
                        "kyc": {"weight": 0.1, "penalty_weight": 0.0, "metrics": {"kyc": 1.0}},
                        "history": {"weight": 0.1, "penalty_weight": 0.2,
                            "metrics": {"history_acc_longevity": 1.0}},
                        "liquidity": {"weight": 0.4, "penalty_weight": 0.4, "metrics": {
                            "liquidity_tot_balance_now": 0.4,
                            "liquidity_avg_running_balance": 0.6}},
                        "activity": {"weight": 0.4, "penalty_weight": 0.4, "metrics": {
                            "activity_credit_volume_count": 0.2,
                            "activity_debit_volume_count": 0.2,
                            "activity_credit_consistency": 0.2,
                            "activity_debit_consistency": 0.2,
                            "activity_profit_since_inception": 0.2}}
                    }},
                    "messages": {"success": "{} {} {} {}", "failed": "denied"}
                }
            }
        })
    }

    #[test]
    fn loads_a_valid_bundle() {
        let config = ScoringConfig::from_json(&coinbase_bundle().to_string()).expect("valid bundle");
        assert_eq!(config.loan_unit, "NEAR");
        let coinbase = config.provider(ProviderKind::Coinbase).expect("configured");
        assert_eq!(coinbase.thresholds.count_or("months_history", 24), 12);
        assert!(config.provider(ProviderKind::Plaid).is_none());
    }

    #[test]
    fn rejects_misaligned_qualitative_range() {
        let mut bundle = coinbase_bundle();
        bundle["qualitative_range"] = json!(["poor", "good"]);
        let error = ScoringConfig::from_json(&bundle.to_string()).expect_err("length mismatch");
        assert!(matches!(error, ConfigError::Range(_)));
    }

    #[test]
    fn rejects_unknown_providers_and_weights() {
        let mut bundle = coinbase_bundle();
        bundle["minimum_requirements"]["kraken"] = bundle["minimum_requirements"]["coinbase"].clone();
        let error = ScoringConfig::from_json(&bundle.to_string()).expect_err("unknown provider");
        assert!(matches!(error, ConfigError::UnknownProvider(name) if name == "kraken"));

        let mut bundle = coinbase_bundle();
        bundle["minimum_requirements"]["coinbase"]["scores"]["models"]["kyc"]["weight"] = json!(0.5);
        let error = ScoringConfig::from_json(&bundle.to_string()).expect_err("weights off");
        assert!(matches!(error, ConfigError::Weights { provider: "coinbase", .. }));
    }

    #[test]
    fn rejects_descending_bins() {
        let mut bundle = coinbase_bundle();
        bundle["minimum_requirements"]["coinbase"]["params"]["metrics"]["duration"] =
            json!([365, 90]);
        let error = ScoringConfig::from_json(&bundle.to_string()).expect_err("descending");
        assert!(matches!(error, ConfigError::Params { provider: "coinbase", .. }));
    }
}
