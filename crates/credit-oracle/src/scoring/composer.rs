use serde::Serialize;
use tracing::info;

use super::aggregate::category_score;
use super::ranges::ScoreRange;
use super::weights::ModelWeights;
use super::ScoringError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WeightSet {
    Normal,
    Penalty,
}

/// Category scores folded into the visible score.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Composite {
    pub score: f64,
    pub composite: f64,
    pub weight_set: WeightSet,
}

/// Combine category scores (in declared order) into the final score.
///
/// When `disqualifying` scored exactly zero and the model carries penalty
/// weights, those replace the normal weights.
pub fn compose(
    category_scores: &[f64],
    model: &ModelWeights,
    disqualifying: &'static str,
    range: &ScoreRange,
) -> Result<Composite, ScoringError> {
    let position = model
        .categories()
        .iter()
        .position(|category| category.name == disqualifying)
        .ok_or(ScoringError::UnknownCategory(disqualifying))?;
    let gate = category_scores
        .get(position)
        .copied()
        .ok_or(ScoringError::WeightMismatch {
            expected: model.categories().len(),
            found: category_scores.len(),
        })?;

    let (weights, weight_set) = match model.penalty_weights() {
        Some(penalty) if gate == 0.0 => (penalty, WeightSet::Penalty),
        _ => (model.weights(), WeightSet::Normal),
    };

    let composite = category_score(category_scores, &weights)?;
    if composite.is_nan() {
        return Err(ScoringError::NotANumber("composite score"));
    }
    let composite = composite.clamp(0.0, 1.0);
    let score = range.rescale(composite);
    info!(score, composite, weight_set = ?weight_set, "composite scored");

    Ok(Composite {
        score,
        composite,
        weight_set,
    })
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use crate::scoring::weights::{CategoryLayout, RawCategoryWeights};

    const LAYOUT: &[CategoryLayout] = &[
        CategoryLayout {
            name: "credit",
            metrics: &["credit_mix"],
        },
        CategoryLayout {
            name: "velocity",
            metrics: &["velocity_slope"],
        },
    ];

    fn model(penalty: bool) -> ModelWeights {
        let mut raw = BTreeMap::new();
        for (name, metric, weight, penalty_weight) in [
            ("credit", "credit_mix", 0.5, 0.0),
            ("velocity", "velocity_slope", 0.5, 1.0),
        ] {
            raw.insert(
                name.to_string(),
                RawCategoryWeights {
                    weight,
                    penalty_weight: penalty.then_some(penalty_weight),
                    metrics: BTreeMap::from([(metric.to_string(), 1.0)]),
                },
            );
        }
        ModelWeights::from_raw(&raw, LAYOUT).expect("valid model")
    }

    fn range() -> ScoreRange {
        ScoreRange::new(vec![300.0, 500.0, 640.0, 740.0, 850.0]).expect("valid range")
    }

    #[test]
    fn uses_normal_weights_when_gate_category_scores() {
        let composite = compose(&[0.6, 0.4], &model(true), "credit", &range()).expect("composes");
        assert_eq!(composite.weight_set, WeightSet::Normal);
        assert!((composite.composite - 0.5).abs() < 1e-12);
        assert!((composite.score - 575.0).abs() < 1e-9);
    }

    #[test]
    fn switches_to_penalty_weights_when_gate_is_zero() {
        let composite = compose(&[0.0, 0.8], &model(true), "credit", &range()).expect("composes");
        assert_eq!(composite.weight_set, WeightSet::Penalty);
        assert!((composite.composite - 0.8).abs() < 1e-12);
    }

    #[test]
    fn stays_on_normal_weights_without_penalty_config() {
        let composite = compose(&[0.0, 0.8], &model(false), "credit", &range()).expect("composes");
        assert_eq!(composite.weight_set, WeightSet::Normal);
        assert!((composite.composite - 0.4).abs() < 1e-12);
    }
}
