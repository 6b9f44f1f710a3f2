use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A value a metric noticed while scoring.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Observation {
    Flag(bool),
    Count(i64),
    Amount(f64),
    Text(String),
    List(Vec<String>),
}

impl Observation {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Count(value) => Some(*value as f64),
            Self::Amount(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_flag(&self) -> Option<bool> {
        match self {
            Self::Flag(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            Self::List(values) => Some(values),
            _ => None,
        }
    }
}

impl From<bool> for Observation {
    fn from(value: bool) -> Self {
        Self::Flag(value)
    }
}

impl From<i64> for Observation {
    fn from(value: i64) -> Self {
        Self::Count(value)
    }
}

impl From<usize> for Observation {
    fn from(value: usize) -> Self {
        Self::Count(i64::try_from(value).unwrap_or(i64::MAX))
    }
}

impl From<f64> for Observation {
    fn from(value: f64) -> Self {
        Self::Amount(value)
    }
}

impl From<String> for Observation {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<&str> for Observation {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<Vec<String>> for Observation {
    fn from(value: Vec<String>) -> Self {
        Self::List(value)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricFailure {
    pub metric: String,
    pub message: String,
}

/// Observations and failures gathered for one category.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CategoryFeedback {
    #[serde(flatten)]
    observations: BTreeMap<String, Observation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    failures: Vec<MetricFailure>,
}

impl CategoryFeedback {
    pub fn observe(&mut self, name: impl Into<String>, value: impl Into<Observation>) {
        self.observations.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&Observation> {
        self.observations.get(name)
    }

    pub fn observations(&self) -> &BTreeMap<String, Observation> {
        &self.observations
    }

    /// Record a failure. The first failure becomes the category error.
    pub fn record_failure(&mut self, metric: impl Into<String>, message: impl Into<String>) {
        let message = message.into();
        if self.error.is_none() {
            self.error = Some(message.clone());
        }
        self.failures.push(MetricFailure {
            metric: metric.into(),
            message,
        });
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn has_error(&self) -> bool {
        self.error.is_some()
    }

    pub fn failures(&self) -> &[MetricFailure] {
        &self.failures
    }

    pub fn reports(&self, message: &str) -> bool {
        self.failures.iter().any(|failure| failure.message == message)
    }
}

/// Failures raised before any metric ran, keyed by stage.
pub type FetchFeedback = BTreeMap<String, String>;

/// Per-provider feedback record consumed by interpretation.
pub trait ProviderFeedback {
    /// Categories in declared order.
    fn categories(&self) -> Vec<(&'static str, &CategoryFeedback)>;

    /// Whether the borrower failed the provider's identity gate.
    fn disqualified(&self) -> bool;

    /// Installments recommended for the loan, when known.
    fn loan_duedate(&self) -> Option<i64>;

    /// Fixed-key values surfaced in the numeric interpretation.
    fn highlights(&self) -> Vec<(&'static str, Option<Observation>)>;

    /// Sentences appended to the success message, without trailing periods.
    fn narrative(&self) -> Vec<String>;

    /// Provider advice that replaces the generic error sentence.
    fn advice(&self) -> Option<String> {
        None
    }

    /// Suggestion appended to the generic error sentence.
    fn retry_hint(&self) -> &'static str;

    /// Extra boolean advice flags beyond the per-category error flags.
    fn advice_flags(&self) -> Vec<(&'static str, bool)> {
        Vec::new()
    }

    /// Names of categories that recorded at least one failure.
    fn failing_categories(&self) -> Vec<&'static str> {
        self.categories()
            .into_iter()
            .filter(|(_, feedback)| feedback.has_error())
            .map(|(name, _)| name)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_failure_wins_the_category_error() {
        let mut feedback = CategoryFeedback::default();
        feedback.record_failure("credit_mix", "no credit card");
        feedback.record_failure("credit_limit", "no credit limit");
        assert_eq!(feedback.error(), Some("no credit card"));
        assert_eq!(feedback.failures().len(), 2);
        assert!(feedback.reports("no credit limit"));
    }

    #[test]
    fn serializes_observations_flat() {
        let mut feedback = CategoryFeedback::default();
        feedback.observe("credit_cards", 2_usize);
        feedback.observe("card_names", vec!["gold".to_string()]);
        let value = serde_json::to_value(&feedback).expect("serializable");
        assert_eq!(value["credit_cards"], 2);
        assert_eq!(value["card_names"][0], "gold");
        assert!(value.get("error").is_none());
    }

    #[test]
    fn observation_deserializes_untagged() {
        let parsed: Vec<Observation> =
            serde_json::from_str(r#"[true, 3, 2.5, "text", ["a", "b"]]"#).expect("valid json");
        assert_eq!(
            parsed,
            vec![
                Observation::Flag(true),
                Observation::Count(3),
                Observation::Amount(2.5),
                Observation::Text("text".into()),
                Observation::List(vec!["a".into(), "b".into()]),
            ]
        );
    }
}
