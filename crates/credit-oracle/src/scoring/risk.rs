use serde::{Deserialize, Serialize};

use super::ranges::{LoanRange, ScoreRange};
use super::ScoringError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    High,
    Medium,
    Low,
}

impl RiskLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Risk {
    pub loan_amount: u64,
    pub risk_level: RiskLevel,
}

/// Loan ceiling offered for a score: the amount at the top of its bin.
pub fn loan_amount(
    score: f64,
    score_range: &ScoreRange,
    loan_range: &LoanRange,
) -> Result<u64, ScoringError> {
    let bin = score_range.bin_of(score);
    let amount = loan_range
        .get(bin + 1)
        .ok_or(ScoringError::LoanOutOfRange {
            index: bin + 1,
            len: loan_range.amounts().len(),
        })?;
    Ok(amount.trunc() as u64)
}

/// Risk tier from the position of `score` inside its bin, split in thirds.
pub fn calc_risk(
    score: f64,
    score_range: &ScoreRange,
    loan_range: &LoanRange,
) -> Result<Risk, ScoringError> {
    let score = score_range.clamp(score);
    let bin = score_range.bin_of(score);
    let breakpoints = score_range.breakpoints();
    let (lower, upper) = (breakpoints[bin], breakpoints[bin + 1]);
    let third = (upper - lower) / 3.0;

    let risk_level = if score <= lower + third {
        RiskLevel::High
    } else if score <= lower + 2.0 * third {
        RiskLevel::Medium
    } else {
        RiskLevel::Low
    };

    Ok(Risk {
        loan_amount: loan_amount(score, score_range, loan_range)?,
        risk_level,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ranges() -> (ScoreRange, LoanRange) {
        let score = ScoreRange::new(vec![300.0, 500.0, 640.0, 740.0, 850.0]).expect("valid");
        let loan = LoanRange::new(vec![0.0, 1000.0, 5000.0, 10000.0, 25000.0], &score)
            .expect("aligned");
        (score, loan)
    }

    #[test]
    fn score_in_last_third_is_low_risk() {
        let (score, loan) = ranges();
        let risk = calc_risk(600.0, &score, &loan).expect("in range");
        assert_eq!(risk.loan_amount, 5000);
        assert_eq!(risk.risk_level, RiskLevel::Low);
    }

    #[test]
    fn thirds_are_inclusive_on_the_upper_side() {
        let (score, loan) = ranges();
        assert_eq!(
            calc_risk(300.0, &score, &loan).expect("in range").risk_level,
            RiskLevel::High
        );
        assert_eq!(
            calc_risk(540.0, &score, &loan).expect("in range").risk_level,
            RiskLevel::High
        );
        assert_eq!(
            calc_risk(580.0, &score, &loan).expect("in range").risk_level,
            RiskLevel::Medium
        );
    }

    #[test]
    fn third_boundaries_fall_to_the_riskier_tier() {
        let (score, loan) = ranges();
        let third = (640.0 - 500.0) / 3.0;
        let first = 500.0 + third;
        let second = 500.0 + 2.0 * third;
        for (value, expected) in [
            (first, RiskLevel::High),
            (first + 1e-9, RiskLevel::Medium),
            (second, RiskLevel::Medium),
            (second + 1e-9, RiskLevel::Low),
        ] {
            let risk = calc_risk(value, &score, &loan).expect("in range");
            assert_eq!(risk.risk_level, expected, "score {value}");
            assert_eq!(risk.loan_amount, 5000, "score {value}");
        }
    }

    #[test]
    fn extremes_map_to_first_and_last_tiers() {
        let (score, loan) = ranges();
        assert_eq!(calc_risk(300.0, &score, &loan).expect("min").loan_amount, 1000);
        let top = calc_risk(850.0, &score, &loan).expect("max");
        assert_eq!(top.loan_amount, 25000);
        assert_eq!(top.risk_level, RiskLevel::Low);
        assert_eq!(calc_risk(999.0, &score, &loan).expect("clamped"), top);
    }

    #[test]
    fn breakpoint_belongs_to_lower_bin() {
        let (score, loan) = ranges();
        let risk = calc_risk(640.0, &score, &loan).expect("in range");
        assert_eq!(risk.loan_amount, 5000);
        assert_eq!(risk.risk_level, RiskLevel::Low);
    }
}
