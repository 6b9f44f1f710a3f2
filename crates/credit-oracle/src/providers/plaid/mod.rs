//! Bank aggregator adapter: accounts and transactions from linked banks.

use chrono::NaiveDate;
use serde::Serialize;

mod metadata;
pub mod metrics;
mod params;
mod records;

#[cfg(test)]
mod tests;

pub use metadata::PlaidMetadata;
pub use params::PlaidParams;
pub use records::{AccountGroup, PlaidAccount, PlaidBalances, PlaidRecords, PlaidTransaction};

use super::{CategoryScore, ProviderKind, ProviderSetup, ScoreOutcome};
use crate::scoring::interpret::format_usd;
use crate::scoring::{
    CategoryFeedback, CategoryLayout, CategoryRun, FetchFeedback, Observation, ProviderFeedback,
    ScoreRange, ScoringError,
};
use metrics::NO_CREDIT_CARD;

pub const CREDIT: &str = "credit";
pub const VELOCITY: &str = "velocity";
pub const STABILITY: &str = "stability";
pub const DIVERSITY: &str = "diversity";

pub const LAYOUT: &[CategoryLayout] = &[
    CategoryLayout {
        name: CREDIT,
        metrics: &[
            "credit_mix",
            "credit_limit",
            "credit_util_ratio",
            "credit_interest",
            "credit_length",
            "credit_livelihood",
        ],
    },
    CategoryLayout {
        name: VELOCITY,
        metrics: &[
            "velocity_deposits",
            "velocity_withdrawals",
            "velocity_net_flow",
            "velocity_slope",
            "velocity_txn_count",
        ],
    },
    CategoryLayout {
        name: STABILITY,
        metrics: &["stability_balance", "stability_running_balance"],
    },
    CategoryLayout {
        name: DIVERSITY,
        metrics: &["diversity_acc_count", "diversity_profile"],
    },
];

const DEFAULT_RECENT_MONTHS: usize = 12;
const DEFAULT_EXTENDED_MONTHS: usize = 24;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PlaidFeedback {
    pub fetch: FetchFeedback,
    pub credit: CategoryFeedback,
    pub velocity: CategoryFeedback,
    pub stability: CategoryFeedback,
    pub diversity: CategoryFeedback,
}

impl ProviderFeedback for PlaidFeedback {
    fn categories(&self) -> Vec<(&'static str, &CategoryFeedback)> {
        vec![
            (CREDIT, &self.credit),
            (VELOCITY, &self.velocity),
            (STABILITY, &self.stability),
            (DIVERSITY, &self.diversity),
        ]
    }

    fn disqualified(&self) -> bool {
        !self.fetch.is_empty()
    }

    fn loan_duedate(&self) -> Option<i64> {
        match self.stability.get("loan_duedate") {
            Some(Observation::Count(months)) => Some(*months),
            _ => None,
        }
    }

    fn highlights(&self) -> Vec<(&'static str, Option<Observation>)> {
        let card_names = self
            .credit
            .get("card_names")
            .and_then(Observation::as_list)
            .filter(|names| !names.is_empty())
            .map(|names| Observation::List(names.iter().map(|name| capitalize(name)).collect()));
        vec![
            ("card_names", card_names),
            (
                "cum_balance",
                self.stability.get("cumulative_current_balance").cloned(),
            ),
            ("bank_accounts", self.diversity.get("bank_accounts").cloned()),
        ]
    }

    fn narrative(&self) -> Vec<String> {
        let mut sentences = Vec::new();
        if let Some(names) = self
            .credit
            .get("card_names")
            .and_then(Observation::as_list)
            .filter(|names| !names.is_empty())
        {
            let plural = if names.len() > 1 { "s" } else { "" };
            sentences.push(format!(
                "Part of your score is based on the transaction history of your {} credit card{plural}",
                names.join(", ")
            ));
        }
        if let Some(balance) = self
            .stability
            .get("cumulative_current_balance")
            .and_then(Observation::as_f64)
        {
            let bank = self
                .diversity
                .get("bank_name")
                .and_then(Observation::as_text)
                .unwrap_or("your bank");
            sentences.push(format!(
                "Your total current balance is ${} USD across all accounts held with {bank}",
                format_usd(balance)
            ));
        }
        sentences
    }

    fn advice(&self) -> Option<String> {
        self.credit.reports(NO_CREDIT_CARD).then(|| {
            "NEARoracle found no credit card associated with your bank account. \
             Credit scores rely heavily on credit card history. Improve your score \
             by selecting a different bank account which shows credit history"
                .to_string()
        })
    }

    fn retry_hint(&self) -> &'static str {
        "Try again later or select an alternative bank account if you have one"
    }

    fn advice_flags(&self) -> Vec<(&'static str, bool)> {
        vec![("credit_exist", !self.credit.reports(NO_CREDIT_CARD))]
    }
}

fn capitalize(value: &str) -> String {
    let mut chars = value.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Identity gate run before any metric.
pub fn kyc(records: &PlaidRecords, now: NaiveDate) -> Result<(), &'static str> {
    if records.accounts.is_empty() {
        return Err("no accounts found");
    }
    let oldest = metadata::settled(records)
        .first()
        .map(|txn| txn.date)
        .ok_or("no transactions found")?;
    if (now - oldest).num_days() <= 0 {
        return Err("no transaction history before today");
    }
    let balance: f64 = records
        .accounts
        .iter()
        .filter_map(|account| account.balances.current)
        .sum();
    if balance == 0.0 {
        return Err("zero balance across all accounts");
    }
    Ok(())
}

pub fn score(
    records: &PlaidRecords,
    now: NaiveDate,
    setup: &ProviderSetup<PlaidParams>,
    range: &ScoreRange,
) -> Result<ScoreOutcome<PlaidFeedback>, ScoringError> {
    let mut feedback = PlaidFeedback::default();
    if let Some(bank) = &records.institution_name {
        feedback.diversity.observe("bank_name", bank.as_str());
    }
    if let Err(reason) = kyc(records, now) {
        feedback.fetch.insert("kyc".to_string(), reason.to_string());
    }

    let meta = PlaidMetadata::build(records, now);
    let params = &setup.params;
    let model = &setup.model;
    let recent = setup
        .thresholds
        .count_or("months_history", DEFAULT_RECENT_MONTHS);
    let extended = setup
        .thresholds
        .count_or("months_history_extended", DEFAULT_EXTENDED_MONTHS);
    let weights = move |name: &'static str| {
        model
            .category(name)
            .ok_or(ScoringError::UnknownCategory(name))
    };

    let credit = CategoryRun::new(CREDIT)
        .with("credit_mix", metrics::credit_mix(&meta, params))
        .with("credit_limit", metrics::credit_limit(&meta, params))
        .with("credit_util_ratio", metrics::credit_util_ratio(&meta, params))
        .with("credit_interest", metrics::credit_interest(&meta, params))
        .with("credit_length", metrics::credit_length(&meta, params))
        .with("credit_livelihood", metrics::credit_livelihood(&meta, params))
        .finish(weights(CREDIT)?, &mut feedback.credit)?;

    let velocity = CategoryRun::new(VELOCITY)
        .with("velocity_deposits", metrics::velocity_deposits(&meta, params))
        .with("velocity_withdrawals", metrics::velocity_withdrawals(&meta, params))
        .with("velocity_net_flow", metrics::velocity_net_flow(&meta, params, recent))
        .with("velocity_slope", metrics::velocity_slope(&meta, params, extended))
        .with("velocity_txn_count", metrics::velocity_txn_count(&meta, params))
        .finish(weights(VELOCITY)?, &mut feedback.velocity)?;

    let stability = CategoryRun::new(STABILITY)
        .with("stability_balance", metrics::stability_balance(&meta, params))
        .with(
            "stability_running_balance",
            metrics::stability_running_balance(&meta, params, recent),
        )
        .finish(weights(STABILITY)?, &mut feedback.stability)?;
    match metrics::loan_duedate(&meta, params) {
        Ok(months) => feedback.stability.observe("loan_duedate", months),
        Err(error) => feedback
            .stability
            .record_failure("loan_duedate", error.to_string()),
    }

    let diversity = CategoryRun::new(DIVERSITY)
        .with("diversity_acc_count", metrics::diversity_acc_count(&meta, params))
        .with("diversity_profile", metrics::diversity_profile(&meta, params))
        .finish(weights(DIVERSITY)?, &mut feedback.diversity)?;

    let categories = vec![
        CategoryScore {
            category: CREDIT,
            score: credit,
        },
        CategoryScore {
            category: VELOCITY,
            score: velocity,
        },
        CategoryScore {
            category: STABILITY,
            score: stability,
        },
        CategoryScore {
            category: DIVERSITY,
            score: diversity,
        },
    ];
    ScoreOutcome::compose(ProviderKind::Plaid, categories, feedback, model, range)
}
