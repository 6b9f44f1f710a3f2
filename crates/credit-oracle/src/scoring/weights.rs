use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

const WEIGHT_TOLERANCE: f64 = 1e-6;

/// Category name and the metric names it scores, in declared order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CategoryLayout {
    pub name: &'static str,
    pub metrics: &'static [&'static str],
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum WeightError {
    #[error("model declares unknown category `{0}`")]
    UnknownCategory(String),
    #[error("model is missing category `{0}`")]
    MissingCategory(&'static str),
    #[error("category `{category}` declares unknown metric `{metric}`")]
    UnknownMetric { category: String, metric: String },
    #[error("category `{category}` is missing metric `{metric}`")]
    MissingMetric {
        category: &'static str,
        metric: &'static str,
    },
    #[error("{set} weights sum to {sum}, expected 1")]
    Sum { set: &'static str, sum: f64 },
    #[error("penalty weights must be set on every category or none (missing on `{0}`)")]
    PartialPenalty(&'static str),
    #[error("weight for `{0}` must be finite and non-negative")]
    Invalid(String),
}

/// Weights as they appear in the configuration bundle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawCategoryWeights {
    pub weight: f64,
    #[serde(default)]
    pub penalty_weight: Option<f64>,
    pub metrics: BTreeMap<String, f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryWeights {
    pub name: &'static str,
    pub weight: f64,
    pub penalty_weight: Option<f64>,
    pub metrics: Vec<(&'static str, f64)>,
}

impl CategoryWeights {
    pub fn metric_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.metrics.iter().map(|(name, _)| *name)
    }

    pub fn metric_weights(&self) -> Vec<f64> {
        self.metrics.iter().map(|(_, weight)| *weight).collect()
    }
}

/// Validated weights for one provider, aligned with its category layout.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelWeights {
    categories: Vec<CategoryWeights>,
}

impl ModelWeights {
    pub fn from_raw(
        raw: &BTreeMap<String, RawCategoryWeights>,
        layout: &[CategoryLayout],
    ) -> Result<Self, WeightError> {
        if let Some(unknown) = raw
            .keys()
            .find(|name| !layout.iter().any(|category| category.name == name.as_str()))
        {
            return Err(WeightError::UnknownCategory(unknown.clone()));
        }

        let mut categories = Vec::with_capacity(layout.len());
        for category in layout {
            let entry = raw
                .get(category.name)
                .ok_or(WeightError::MissingCategory(category.name))?;
            categories.push(Self::align(category, entry)?);
        }

        let model = Self { categories };
        model.check_sums()?;
        Ok(model)
    }

    fn align(
        layout: &CategoryLayout,
        raw: &RawCategoryWeights,
    ) -> Result<CategoryWeights, WeightError> {
        if let Some(unknown) = raw
            .metrics
            .keys()
            .find(|metric| !layout.metrics.iter().any(|known| *known == metric.as_str()))
        {
            return Err(WeightError::UnknownMetric {
                category: layout.name.to_string(),
                metric: unknown.clone(),
            });
        }

        let mut metrics = Vec::with_capacity(layout.metrics.len());
        for metric in layout.metrics {
            let weight = *raw.metrics.get(*metric).ok_or(WeightError::MissingMetric {
                category: layout.name,
                metric: *metric,
            })?;
            check_weight(metric, weight)?;
            metrics.push((*metric, weight));
        }

        check_weight(layout.name, raw.weight)?;
        if let Some(penalty) = raw.penalty_weight {
            check_weight(layout.name, penalty)?;
        }

        Ok(CategoryWeights {
            name: layout.name,
            weight: raw.weight,
            penalty_weight: raw.penalty_weight,
            metrics,
        })
    }

    fn check_sums(&self) -> Result<(), WeightError> {
        let sum: f64 = self.categories.iter().map(|category| category.weight).sum();
        if (sum - 1.0).abs() > WEIGHT_TOLERANCE {
            return Err(WeightError::Sum { set: "model", sum });
        }

        let with_penalty = self
            .categories
            .iter()
            .filter(|category| category.penalty_weight.is_some())
            .count();
        if with_penalty == 0 {
            return Ok(());
        }
        if let Some(missing) = self
            .categories
            .iter()
            .find(|category| category.penalty_weight.is_none())
        {
            return Err(WeightError::PartialPenalty(missing.name));
        }

        let sum: f64 = self
            .categories
            .iter()
            .filter_map(|category| category.penalty_weight)
            .sum();
        if (sum - 1.0).abs() > WEIGHT_TOLERANCE {
            return Err(WeightError::Sum {
                set: "penalty",
                sum,
            });
        }
        Ok(())
    }

    pub fn categories(&self) -> &[CategoryWeights] {
        &self.categories
    }

    pub fn category(&self, name: &str) -> Option<&CategoryWeights> {
        self.categories.iter().find(|category| category.name == name)
    }

    pub fn weights(&self) -> Vec<f64> {
        self.categories.iter().map(|category| category.weight).collect()
    }

    /// Penalty weights, when every category carries one.
    pub fn penalty_weights(&self) -> Option<Vec<f64>> {
        self.categories
            .iter()
            .map(|category| category.penalty_weight)
            .collect()
    }
}

fn check_weight(name: &str, weight: f64) -> Result<(), WeightError> {
    if weight.is_finite() && weight >= 0.0 {
        Ok(())
    } else {
        Err(WeightError::Invalid(name.to_string()))
    }
}
