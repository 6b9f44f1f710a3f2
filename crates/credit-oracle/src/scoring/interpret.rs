use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::feedback::{Observation, ProviderFeedback};
use super::ranges::Ranges;
use super::risk::loan_amount;
use super::ScoringError;

/// Quality reported for disqualified borrowers.
pub const DISQUALIFIED_QUALITY: &str = "very poor";

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RateError {
    #[error("no conversion rate from {from} to {to}")]
    Unavailable { from: String, to: String },
    #[error("conversion rate {0} must be finite and positive")]
    Invalid(f64),
}

/// Currency conversion used to quote the loan in its alternate unit.
pub trait RateSource {
    fn rate(&self, from: &str, to: &str) -> Result<f64, RateError>;
}

/// A constant conversion rate, regardless of the currency pair.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixedRate {
    rate: f64,
}

impl FixedRate {
    pub fn new(rate: f64) -> Result<Self, RateError> {
        if rate.is_finite() && rate > 0.0 {
            Ok(Self { rate })
        } else {
            Err(RateError::Invalid(rate))
        }
    }
}

impl RateSource for FixedRate {
    fn rate(&self, _from: &str, _to: &str) -> Result<f64, RateError> {
        Ok(self.rate)
    }
}

/// User-facing message templates for one provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Messages {
    pub success: String,
    pub failed: String,
    #[serde(default)]
    pub not_qualified: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreSummary {
    pub score_exist: bool,
    pub points: i64,
    pub quality: String,
    pub loan_amount: Option<u64>,
    pub loan_duedate: Option<i64>,
    #[serde(flatten)]
    pub highlights: BTreeMap<String, Option<Observation>>,
}

/// Numeric explanation of a score.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Interpretation {
    pub score: ScoreSummary,
    pub advice: BTreeMap<String, bool>,
}

pub fn interpret<F: ProviderFeedback>(
    score: f64,
    feedback: &F,
    ranges: &Ranges,
) -> Result<Interpretation, ScoringError> {
    let mut advice: BTreeMap<String, bool> = feedback
        .categories()
        .into_iter()
        .map(|(name, category)| (format!("{name}_error"), category.has_error()))
        .collect();
    for (flag, value) in feedback.advice_flags() {
        advice.insert(flag.to_string(), value);
    }

    let highlights = feedback
        .highlights()
        .into_iter()
        .map(|(name, value)| (name.to_string(), value))
        .collect();

    if feedback.disqualified() {
        return Ok(Interpretation {
            score: ScoreSummary {
                score_exist: false,
                points: ranges.score.head() as i64,
                quality: DISQUALIFIED_QUALITY.to_string(),
                loan_amount: None,
                loan_duedate: None,
                highlights,
            },
            advice,
        });
    }

    Ok(Interpretation {
        score: ScoreSummary {
            score_exist: true,
            points: score as i64,
            quality: quality_of(score, ranges)?.to_string(),
            loan_amount: Some(loan_amount(score, &ranges.score, &ranges.loan)?),
            loan_duedate: feedback.loan_duedate(),
            highlights,
        },
        advice,
    })
}

/// Sentence-level explanation of a score, ending with a period.
pub fn qualitative_feedback<F: ProviderFeedback>(
    messages: &Messages,
    loan_unit: &str,
    score: f64,
    feedback: &F,
    ranges: &Ranges,
    rates: &dyn RateSource,
) -> Result<String, ScoringError> {
    if feedback.disqualified() {
        return Ok(messages.failed.clone());
    }

    let quality = quality_of(score, ranges)?;
    let loan = loan_amount(score, &ranges.score, &ranges.loan)?;
    let rate = rates.rate("USD", loan_unit)?;
    let converted = (loan as f64 * rate).round() as i64;

    let mut message = fill_placeholders(
        &messages.success,
        &[
            quality.to_uppercase(),
            (score as i64).to_string(),
            converted.to_string(),
            loan.to_string(),
        ],
    );
    if let Some(installments) = feedback.loan_duedate() {
        message.push_str(&format!(
            " over a recommended pay back period of {installments} monthly installments"
        ));
    }
    message.push('.');

    let mut sentences = feedback.narrative();
    let failing = feedback.failing_categories();
    if !failing.is_empty() {
        let sentence = feedback.advice().unwrap_or_else(|| {
            format!(
                "An error occurred while computing the score metric called {}. \
                 As a result, your score was rounded down. {}",
                comma_separated(&failing),
                feedback.retry_hint()
            )
        });
        sentences.push(sentence);
    }
    for sentence in sentences {
        message.push(' ');
        message.push_str(&sentence);
        message.push('.');
    }
    Ok(message)
}

fn quality_of(score: f64, ranges: &Ranges) -> Result<&str, ScoringError> {
    let bin = ranges.score.bin_of(score);
    ranges
        .quality
        .label(bin)
        .ok_or(ScoringError::QualityOutOfRange { bin })
}

/// Replace each `{}` in `template` with the next argument.
pub fn fill_placeholders(template: &str, args: &[String]) -> String {
    let mut filled = String::with_capacity(template.len());
    let mut args = args.iter();
    let mut rest = template;
    while let Some(position) = rest.find("{}") {
        filled.push_str(&rest[..position]);
        match args.next() {
            Some(arg) => filled.push_str(arg),
            None => filled.push_str("{}"),
        }
        rest = &rest[position + 2..];
    }
    filled.push_str(rest);
    filled
}

/// `a`, `a and b`, `a, b, and c`.
pub fn comma_separated(items: &[&str]) -> String {
    match items {
        [] => String::new(),
        [only] => (*only).to_string(),
        [first, second] => format!("{first} and {second}"),
        [head @ .., last] => format!("{}, and {last}", head.join(", ")),
    }
}

/// Whole dollars with thousands separators.
pub fn format_usd(amount: f64) -> String {
    let rounded = amount.round() as i64;
    let digits = rounded.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (index, digit) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }
    if rounded < 0 {
        format!("-{grouped}")
    } else {
        grouped
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fills_placeholders_in_order() {
        let filled = fill_placeholders(
            "{} - {} points, loan {} ({})",
            &["GOOD".into(), "700".into(), "3".into()],
        );
        assert_eq!(filled, "GOOD - 700 points, loan 3 ({})");
    }

    #[test]
    fn oxford_comma_lists() {
        assert_eq!(comma_separated(&["credit"]), "credit");
        assert_eq!(comma_separated(&["credit", "velocity"]), "credit and velocity");
        assert_eq!(
            comma_separated(&["credit", "velocity", "stability"]),
            "credit, velocity, and stability"
        );
    }

    #[test]
    fn formats_dollars_with_separators() {
        assert_eq!(format_usd(1234567.4), "1,234,567");
        assert_eq!(format_usd(999.6), "1,000");
        assert_eq!(format_usd(-4200.0), "-4,200");
        assert_eq!(format_usd(12.0), "12");
    }

    #[test]
    fn fixed_rate_must_be_positive() {
        assert!(FixedRate::new(0.0).is_err());
        let rate = FixedRate::new(0.5).expect("positive");
        assert_eq!(rate.rate("USD", "NEAR").expect("fixed"), 0.5);
    }
}
