//! Exchange account adapter.

use chrono::NaiveDate;
use serde::Serialize;

pub mod metrics;
mod params;
mod records;

#[cfg(test)]
mod tests;

pub use params::CoinbaseParams;
pub use records::{CoinbaseAccount, CoinbaseRecords, CoinbaseTransaction, TransactionKind};

use super::{CategoryScore, FlowDirection, ProviderKind, ProviderSetup, ScoreOutcome};
use crate::scoring::interpret::format_usd;
use crate::scoring::{
    CategoryFeedback, CategoryLayout, CategoryRun, Observation, ProviderFeedback, ScoreRange,
    ScoringError,
};

pub const KYC: &str = "kyc";
pub const HISTORY: &str = "history";
pub const LIQUIDITY: &str = "liquidity";
pub const ACTIVITY: &str = "activity";

pub const LAYOUT: &[CategoryLayout] = &[
    CategoryLayout {
        name: KYC,
        metrics: &["kyc"],
    },
    CategoryLayout {
        name: HISTORY,
        metrics: &["history_acc_longevity"],
    },
    CategoryLayout {
        name: LIQUIDITY,
        metrics: &["liquidity_tot_balance_now", "liquidity_avg_running_balance"],
    },
    CategoryLayout {
        name: ACTIVITY,
        metrics: &[
            "activity_credit_volume_count",
            "activity_debit_volume_count",
            "activity_credit_consistency",
            "activity_debit_consistency",
            "activity_profit_since_inception",
        ],
    },
];

const DEFAULT_MONTHS: usize = 12;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CoinbaseFeedback {
    pub kyc: CategoryFeedback,
    pub history: CategoryFeedback,
    pub liquidity: CategoryFeedback,
    pub activity: CategoryFeedback,
}

impl ProviderFeedback for CoinbaseFeedback {
    fn categories(&self) -> Vec<(&'static str, &CategoryFeedback)> {
        vec![
            (KYC, &self.kyc),
            (HISTORY, &self.history),
            (LIQUIDITY, &self.liquidity),
            (ACTIVITY, &self.activity),
        ]
    }

    fn disqualified(&self) -> bool {
        self.kyc.get("verified").and_then(Observation::as_flag) == Some(false)
    }

    fn loan_duedate(&self) -> Option<i64> {
        match self.liquidity.get("loan_duedate") {
            Some(Observation::Count(months)) => Some(*months),
            _ => None,
        }
    }

    fn highlights(&self) -> Vec<(&'static str, Option<Observation>)> {
        vec![
            ("wallet_age(days)", self.history.get("wallet_age(days)").cloned()),
            ("current_balance", self.liquidity.get("current_balance").cloned()),
        ]
    }

    fn narrative(&self) -> Vec<String> {
        let age = self
            .history
            .get("wallet_age(days)")
            .and_then(Observation::as_f64);
        let balance = self
            .liquidity
            .get("current_balance")
            .and_then(Observation::as_f64);
        let sentence = match (age, balance) {
            (Some(age), Some(balance)) => format!(
                "Your Coinbase account has been active for {age} days and your total balance \
                 across all wallets is ${} USD",
                format_usd(balance)
            ),
            (Some(age), None) => format!("Your Coinbase account has been active for {age} days"),
            (None, Some(balance)) => format!(
                "Your total balance across all wallets is ${} USD",
                format_usd(balance)
            ),
            (None, None) => return Vec::new(),
        };
        vec![sentence]
    }

    fn retry_hint(&self) -> &'static str {
        "Try to log into Coinbase again later"
    }
}

pub fn score(
    records: &CoinbaseRecords,
    now: NaiveDate,
    setup: &ProviderSetup<CoinbaseParams>,
    range: &ScoreRange,
) -> Result<ScoreOutcome<CoinbaseFeedback>, ScoringError> {
    let mut feedback = CoinbaseFeedback::default();
    let params = &setup.params;
    let model = &setup.model;
    let months = setup.thresholds.count_or("months_history", DEFAULT_MONTHS);
    let weights = move |name: &'static str| {
        model
            .category(name)
            .ok_or(ScoringError::UnknownCategory(name))
    };

    let kyc = CategoryRun::new(KYC)
        .with("kyc", metrics::kyc(records))
        .finish(weights(KYC)?, &mut feedback.kyc)?;

    let history = CategoryRun::new(HISTORY)
        .with(
            "history_acc_longevity",
            metrics::history_acc_longevity(records, params, now),
        )
        .finish(weights(HISTORY)?, &mut feedback.history)?;

    let liquidity = CategoryRun::new(LIQUIDITY)
        .with(
            "liquidity_tot_balance_now",
            metrics::liquidity_tot_balance_now(records, params),
        )
        .with(
            "liquidity_avg_running_balance",
            metrics::liquidity_avg_running_balance(records, params, now, months),
        )
        .finish(weights(LIQUIDITY)?, &mut feedback.liquidity)?;
    match metrics::loan_duedate(records, params, now) {
        Ok(installments) => feedback.liquidity.observe("loan_duedate", installments),
        Err(error) => feedback
            .liquidity
            .record_failure("loan_duedate", error.to_string()),
    }

    let activity = CategoryRun::new(ACTIVITY)
        .with(
            "activity_credit_volume_count",
            metrics::activity_volume_count(records, params, FlowDirection::Credit),
        )
        .with(
            "activity_debit_volume_count",
            metrics::activity_volume_count(records, params, FlowDirection::Debit),
        )
        .with(
            "activity_credit_consistency",
            metrics::activity_consistency(records, params, FlowDirection::Credit, now),
        )
        .with(
            "activity_debit_consistency",
            metrics::activity_consistency(records, params, FlowDirection::Debit, now),
        )
        .with(
            "activity_profit_since_inception",
            metrics::activity_profit_since_inception(records, params),
        )
        .finish(weights(ACTIVITY)?, &mut feedback.activity)?;

    let categories = vec![
        CategoryScore {
            category: KYC,
            score: kyc,
        },
        CategoryScore {
            category: HISTORY,
            score: history,
        },
        CategoryScore {
            category: LIQUIDITY,
            score: liquidity,
        },
        CategoryScore {
            category: ACTIVITY,
            score: activity,
        },
    ];
    ScoreOutcome::compose(ProviderKind::Coinbase, categories, feedback, model, range)
}
