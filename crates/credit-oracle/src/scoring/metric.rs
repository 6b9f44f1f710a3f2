use serde::Serialize;

use super::bins::BinArray;
use super::feedback::Observation;

/// Longest repayment schedule, in months, a loan offer may carry.
pub const LOAN_DUEDATE_CEILING_MONTHS: i64 = 6;

/// Why a single metric could not produce a sub-score.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum MetricError {
    /// Records lack the data the metric needs. The message is user facing.
    #[error("{0}")]
    Missing(&'static str),
    /// Records are present but unusable. The message is user facing.
    #[error("{0}")]
    Invalid(&'static str),
    #[error("index ({row}, {col}) is outside the {rows}x{cols} scoring matrix")]
    MatrixOutOfRange {
        row: usize,
        col: usize,
        rows: usize,
        cols: usize,
    },
    #[error("index {index} is outside the {len} configured rewards")]
    RewardOutOfRange { index: usize, len: usize },
    #[error("division by zero while computing {0}")]
    DivisionByZero(&'static str),
    #[error("{0} is not a number")]
    NotANumber(&'static str),
}

/// Metric output in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize)]
#[serde(transparent)]
pub struct Subscore(f64);

impl Subscore {
    pub const ZERO: Self = Self(0.0);

    /// NaN is rejected, everything else is clamped into `[0, 1]`.
    pub fn new(value: f64) -> Result<Self, MetricError> {
        if value.is_nan() {
            return Err(MetricError::NotANumber("sub-score"));
        }
        Ok(Self(value.clamp(0.0, 1.0)))
    }

    pub fn value(self) -> f64 {
        self.0
    }
}

/// A successful metric: its sub-score plus what it observed along the way.
#[derive(Debug, Clone, PartialEq)]
pub struct Measured {
    pub subscore: Subscore,
    pub observations: Vec<(&'static str, Observation)>,
}

impl Measured {
    pub fn new(value: f64) -> Result<Self, MetricError> {
        Ok(Self {
            subscore: Subscore::new(value)?,
            observations: Vec::new(),
        })
    }

    pub fn observe(mut self, name: &'static str, value: impl Into<Observation>) -> Self {
        self.observations.push((name, value.into()));
        self
    }
}

pub type MetricResult = Result<Measured, MetricError>;

/// Number of monthly installments offered to a borrower whose history
/// spans `history_days`.
pub fn loan_duedate(history_days: i64, due_date: &BinArray) -> Result<i64, MetricError> {
    if history_days < 0 {
        return Err(MetricError::Invalid("transaction history lies in the future"));
    }
    let months = history_days / 30;
    let index = due_date.digitize(months as f64);
    let installments = match due_date.edges().get(index) {
        Some(edge) => *edge as i64,
        None => LOAN_DUEDATE_CEILING_MONTHS,
    };
    Ok(installments.min(LOAN_DUEDATE_CEILING_MONTHS))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subscore_clamps_and_rejects_nan() {
        assert_eq!(Subscore::new(1.7).expect("finite").value(), 1.0);
        assert_eq!(Subscore::new(-0.2).expect("finite").value(), 0.0);
        assert_eq!(
            Subscore::new(f64::NAN),
            Err(MetricError::NotANumber("sub-score"))
        );
    }

    #[test]
    fn measured_keeps_observations_in_order() {
        let measured = Measured::new(0.4)
            .expect("finite")
            .observe("first", 1_i64)
            .observe("second", "two");
        let names: Vec<_> = measured.observations.iter().map(|(name, _)| *name).collect();
        assert_eq!(names, vec!["first", "second"]);
    }

    #[test]
    fn duedate_grows_with_history() {
        let due_date = BinArray::new(vec![3.0, 4.0, 5.0]).expect("ascending");
        assert_eq!(loan_duedate(30, &due_date).expect("valid"), 3);
        assert_eq!(loan_duedate(120, &due_date).expect("valid"), 4);
        assert_eq!(loan_duedate(400, &due_date).expect("valid"), 6);
        assert!(loan_duedate(-5, &due_date).is_err());
    }
}
