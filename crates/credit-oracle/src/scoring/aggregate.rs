use tracing::{debug, warn};

use super::feedback::CategoryFeedback;
use super::metric::{MetricResult, Subscore};
use super::weights::CategoryWeights;
use super::ScoringError;

/// Weighted dot product of metric sub-scores.
pub fn category_score(subscores: &[f64], weights: &[f64]) -> Result<f64, ScoringError> {
    if subscores.len() != weights.len() {
        return Err(ScoringError::WeightMismatch {
            expected: weights.len(),
            found: subscores.len(),
        });
    }
    Ok(subscores
        .iter()
        .zip(weights)
        .map(|(score, weight)| score * weight)
        .sum())
}

/// Metric outcomes for one category, collected in declared order.
#[derive(Debug)]
pub struct CategoryRun {
    category: &'static str,
    outcomes: Vec<(&'static str, MetricResult)>,
}

impl CategoryRun {
    pub fn new(category: &'static str) -> Self {
        Self {
            category,
            outcomes: Vec::new(),
        }
    }

    pub fn with(mut self, metric: &'static str, outcome: MetricResult) -> Self {
        self.outcomes.push((metric, outcome));
        self
    }

    /// Fold the outcomes into `feedback` and return the category score.
    ///
    /// Failed metrics contribute a zero sub-score and record their message.
    pub fn finish(
        self,
        weights: &CategoryWeights,
        feedback: &mut CategoryFeedback,
    ) -> Result<f64, ScoringError> {
        let declared: Vec<&'static str> = weights.metric_names().collect();
        let ran: Vec<&'static str> = self.outcomes.iter().map(|(name, _)| *name).collect();
        if declared != ran {
            return Err(ScoringError::MetricOrder {
                category: self.category,
                declared,
                ran,
            });
        }

        let mut subscores = Vec::with_capacity(self.outcomes.len());
        for (metric, outcome) in self.outcomes {
            match outcome {
                Ok(measured) => {
                    for (name, value) in measured.observations {
                        feedback.observe(name, value);
                    }
                    subscores.push(measured.subscore);
                }
                Err(error) => {
                    warn!(category = self.category, metric, %error, "metric failed");
                    feedback.record_failure(metric, error.to_string());
                    subscores.push(Subscore::ZERO);
                }
            }
        }

        let values: Vec<f64> = subscores.iter().map(|score| score.value()).collect();
        let score = category_score(&values, &weights.metric_weights())?;
        debug!(category = self.category, subscores = ?values, score, "category scored");
        Ok(score)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::metric::{Measured, MetricError};

    fn weights() -> CategoryWeights {
        CategoryWeights {
            name: "credit",
            weight: 1.0,
            penalty_weight: None,
            metrics: vec![("credit_mix", 0.5), ("credit_length", 0.5)],
        }
    }

    #[test]
    fn dot_product_requires_matching_lengths() {
        assert_eq!(category_score(&[1.0, 0.5], &[0.5, 0.5]).expect("aligned"), 0.75);
        assert!(matches!(
            category_score(&[1.0], &[0.5, 0.5]),
            Err(ScoringError::WeightMismatch {
                expected: 2,
                found: 1
            })
        ));
    }

    #[test]
    fn failed_metric_scores_zero_and_records_message() {
        let mut feedback = CategoryFeedback::default();
        let score = CategoryRun::new("credit")
            .with("credit_mix", Err(MetricError::Missing("no credit card")))
            .with(
                "credit_length",
                Measured::new(0.8).map(|measured| measured.observe("credit_duration_days", 400_i64)),
            )
            .finish(&weights(), &mut feedback)
            .expect("aligned");

        assert!((score - 0.4).abs() < 1e-12);
        assert_eq!(feedback.error(), Some("no credit card"));
        assert!(feedback.get("credit_duration_days").is_some());
    }

    #[test]
    fn out_of_order_metrics_are_a_programming_error() {
        let mut feedback = CategoryFeedback::default();
        let result = CategoryRun::new("credit")
            .with("credit_length", Measured::new(1.0))
            .with("credit_mix", Measured::new(1.0))
            .finish(&weights(), &mut feedback);
        assert!(matches!(result, Err(ScoringError::MetricOrder { .. })));
    }
}
