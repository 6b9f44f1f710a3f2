use serde::{Deserialize, Serialize};

/// Validation failures for the externally configured ranges.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RangeError {
    #[error("score range needs at least two breakpoints, found {0}")]
    TooShort(usize),
    #[error("score range must be finite and strictly increasing (breakpoint {index})")]
    NotIncreasing { index: usize },
    #[error("loan range has {found} entries but the score range has {expected}")]
    LoanLength { expected: usize, found: usize },
    #[error("loan amounts must be finite and non-negative (entry {index})")]
    InvalidLoan { index: usize },
    #[error("qualitative range has {found} labels but the score range has {expected} bins")]
    QualityLength { expected: usize, found: usize },
}

/// Ascending breakpoints partitioning the visible score into quality bins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<f64>", into = "Vec<f64>")]
pub struct ScoreRange(Vec<f64>);

impl ScoreRange {
    pub fn new(breakpoints: Vec<f64>) -> Result<Self, RangeError> {
        if breakpoints.len() < 2 {
            return Err(RangeError::TooShort(breakpoints.len()));
        }

        for (index, pair) in breakpoints.windows(2).enumerate() {
            if !pair[0].is_finite() || !pair[1].is_finite() || pair[0] >= pair[1] {
                return Err(RangeError::NotIncreasing { index: index + 1 });
            }
        }

        Ok(Self(breakpoints))
    }

    /// Lowest reachable score.
    pub fn head(&self) -> f64 {
        self.0[0]
    }

    /// Highest reachable score.
    pub fn tail(&self) -> f64 {
        self.0[self.0.len() - 1]
    }

    pub fn breakpoints(&self) -> &[f64] {
        &self.0
    }

    pub fn bins(&self) -> usize {
        self.0.len() - 1
    }

    pub fn clamp(&self, score: f64) -> f64 {
        score.clamp(self.head(), self.tail())
    }

    /// Index of the bin holding `score`.
    ///
    /// Bins are right-closed: a score sitting on an interior breakpoint
    /// belongs to the bin below it, the minimum belongs to the first bin.
    /// A "greatest breakpoint <= score" lookup would instead place 640 in
    /// `[640, 740]`, reading the next loan tier and a `high` risk; here it
    /// stays in `[500, 640]`, earning that bin's ceiling and `low` risk.
    pub fn bin_of(&self, score: f64) -> usize {
        let score = self.clamp(score);
        let position = self.0.partition_point(|edge| *edge < score);
        position.saturating_sub(1).min(self.bins() - 1)
    }

    /// Affine map from a `[0, 1]` composite onto the visible range.
    pub fn rescale(&self, composite: f64) -> f64 {
        self.head() + (self.tail() - self.head()) * composite
    }
}

impl TryFrom<Vec<f64>> for ScoreRange {
    type Error = RangeError;

    fn try_from(value: Vec<f64>) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ScoreRange> for Vec<f64> {
    fn from(value: ScoreRange) -> Self {
        value.0
    }
}

/// Loan ceilings aligned with the score range breakpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LoanRange(Vec<f64>);

impl LoanRange {
    pub fn new(amounts: Vec<f64>, score_range: &ScoreRange) -> Result<Self, RangeError> {
        let expected = score_range.breakpoints().len();
        if amounts.len() != expected {
            return Err(RangeError::LoanLength {
                expected,
                found: amounts.len(),
            });
        }

        if let Some(index) = amounts
            .iter()
            .position(|amount| !amount.is_finite() || *amount < 0.0)
        {
            return Err(RangeError::InvalidLoan { index });
        }

        Ok(Self(amounts))
    }

    pub fn amounts(&self) -> &[f64] {
        &self.0
    }

    pub fn get(&self, index: usize) -> Option<f64> {
        self.0.get(index).copied()
    }
}

/// Human labels, one per score bin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QualitativeRange(Vec<String>);

impl QualitativeRange {
    pub fn new(labels: Vec<String>, score_range: &ScoreRange) -> Result<Self, RangeError> {
        let expected = score_range.bins();
        if labels.len() != expected {
            return Err(RangeError::QualityLength {
                expected,
                found: labels.len(),
            });
        }
        Ok(Self(labels))
    }

    pub fn label(&self, bin: usize) -> Option<&str> {
        self.0.get(bin).map(String::as_str)
    }
}

/// The three read-only ranges every scoring request consults.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Ranges {
    pub score: ScoreRange,
    pub loan: LoanRange,
    pub quality: QualitativeRange,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn range() -> ScoreRange {
        ScoreRange::new(vec![300.0, 500.0, 640.0, 740.0, 850.0]).expect("valid range")
    }

    #[test]
    fn rejects_descending_or_short_ranges() {
        assert_eq!(ScoreRange::new(vec![300.0]), Err(RangeError::TooShort(1)));
        assert_eq!(
            ScoreRange::new(vec![850.0, 300.0]),
            Err(RangeError::NotIncreasing { index: 1 })
        );
        assert!(ScoreRange::new(vec![300.0, 300.0, 850.0]).is_err());
    }

    #[test]
    fn breakpoints_fall_into_the_lower_bin() {
        let range = range();
        assert_eq!(range.bin_of(300.0), 0);
        assert_eq!(range.bin_of(500.0), 0);
        assert_eq!(range.bin_of(500.5), 1);
        assert_eq!(range.bin_of(600.0), 1);
        assert_eq!(range.bin_of(850.0), 3);
        assert_eq!(range.bin_of(1200.0), 3);
        assert_eq!(range.bin_of(10.0), 0);
    }

    #[test]
    fn parallel_ranges_must_match_the_score_range() {
        let range = range();
        assert!(LoanRange::new(vec![0.0, 1000.0], &range).is_err());
        assert!(QualitativeRange::new(vec!["poor".to_string()], &range).is_err());
        let labels = ["poor", "fair", "good", "excellent"]
            .iter()
            .map(|label| label.to_string())
            .collect();
        let quality = QualitativeRange::new(labels, &range).expect("four labels");
        assert_eq!(quality.label(2), Some("good"));
    }

    #[test]
    fn rescales_composite_into_range() {
        let range = range();
        assert_eq!(range.rescale(0.0), 300.0);
        assert_eq!(range.rescale(1.0), 850.0);
        assert_eq!(range.rescale(0.5), 575.0);
    }
}
