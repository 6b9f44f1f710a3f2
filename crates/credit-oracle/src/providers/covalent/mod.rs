//! Wallet explorer adapter.

use chrono::NaiveDate;
use serde::Serialize;

mod cleanup;
pub mod metrics;
mod params;
mod records;

#[cfg(test)]
mod tests;

pub use cleanup::{purge_portfolio, swiffer_duster, top_erc_balances, top_erc_portfolio};
pub use params::CovalentParams;
pub use records::{
    BalanceSheet, ChainTransaction, CovalentBundle, CovalentRecords, DecodedEvent, ErcRank,
    Holding, HoldingQuote, LogEvent, Portfolio, PortfolioToken, TokenBalance, TransactionLog,
};

use super::{CategoryScore, FlowDirection, ProviderKind, ProviderSetup, ScoreOutcome};
use crate::scoring::interpret::format_usd;
use crate::scoring::{
    CategoryFeedback, CategoryLayout, CategoryRun, FetchFeedback, Observation, ProviderFeedback,
    ScoreRange, ScoringError,
};

pub const CREDIBILITY: &str = "credibility";
pub const WEALTH: &str = "wealth";
pub const TRAFFIC: &str = "traffic";
pub const STAMINA: &str = "stamina";

pub const LAYOUT: &[CategoryLayout] = &[
    CategoryLayout {
        name: CREDIBILITY,
        metrics: &["credibility_kyc", "credibility_oldest_txn"],
    },
    CategoryLayout {
        name: WEALTH,
        metrics: &[
            "wealth_capital_now",
            "wealth_capital_now_adjusted",
            "wealth_volume_per_txn",
        ],
    },
    CategoryLayout {
        name: TRAFFIC,
        metrics: &[
            "traffic_credit",
            "traffic_debit",
            "traffic_dustiness",
            "traffic_running_balance",
            "traffic_frequency",
        ],
    },
    CategoryLayout {
        name: STAMINA,
        metrics: &[
            "stamina_methods_count",
            "stamina_coins_count",
            "stamina_dexterity",
        ],
    },
];

const DEFAULT_MINIMUM_TRANSACTIONS: usize = 1;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CovalentFeedback {
    pub fetch: FetchFeedback,
    pub credibility: CategoryFeedback,
    pub wealth: CategoryFeedback,
    pub traffic: CategoryFeedback,
    pub stamina: CategoryFeedback,
}

impl ProviderFeedback for CovalentFeedback {
    fn categories(&self) -> Vec<(&'static str, &CategoryFeedback)> {
        vec![
            (CREDIBILITY, &self.credibility),
            (WEALTH, &self.wealth),
            (TRAFFIC, &self.traffic),
            (STAMINA, &self.stamina),
        ]
    }

    fn disqualified(&self) -> bool {
        !self.fetch.is_empty()
            || self.credibility.get("verified").and_then(Observation::as_flag) == Some(false)
    }

    fn loan_duedate(&self) -> Option<i64> {
        match self.stamina.get("loan_duedate") {
            Some(Observation::Count(months)) => Some(*months),
            _ => None,
        }
    }

    fn highlights(&self) -> Vec<(&'static str, Option<Observation>)> {
        vec![
            ("longevity_days", self.credibility.get("longevity_days").cloned()),
            ("cum_balance_now", self.wealth.get("cum_balance_now").cloned()),
        ]
    }

    fn narrative(&self) -> Vec<String> {
        let age = self
            .credibility
            .get("longevity_days")
            .and_then(Observation::as_f64);
        let balance = self
            .wealth
            .get("cum_balance_now")
            .and_then(Observation::as_f64);
        let sentence = match (age, balance) {
            (Some(age), Some(balance)) => format!(
                "Your ETH wallet address has been active for {age} days and your total balance \
                 across all cryptocurrencies owned is ${} USD",
                format_usd(balance)
            ),
            (Some(age), None) => format!("Your ETH wallet address has been active for {age} days"),
            (None, Some(balance)) => format!(
                "Your total balance across all cryptocurrencies owned is ${} USD",
                format_usd(balance)
            ),
            (None, None) => return Vec::new(),
        };
        vec![sentence]
    }

    fn retry_hint(&self) -> &'static str {
        "Try to log into MetaMask again later"
    }
}

/// Identity gate run before any metric.
pub fn kyc(records: &CovalentRecords, minimum_transactions: usize) -> Result<(), &'static str> {
    if records.transactions.items.len() < minimum_transactions {
        return Err("not enough transactions");
    }
    if records.balances.items.is_empty() {
        return Err("no token balances found");
    }
    if records.portfolio.items.is_empty() {
        return Err("no portfolio found");
    }
    Ok(())
}

pub fn score(
    records: &CovalentRecords,
    erc_rank: &ErcRank,
    now: NaiveDate,
    setup: &ProviderSetup<CovalentParams>,
    range: &ScoreRange,
) -> Result<ScoreOutcome<CovalentFeedback>, ScoringError> {
    let mut feedback = CovalentFeedback::default();
    let minimum = setup
        .thresholds
        .count_or("minimum_transactions", DEFAULT_MINIMUM_TRANSACTIONS);
    if let Err(reason) = kyc(records, minimum) {
        feedback.fetch.insert("kyc".to_string(), reason.to_string());
    }

    let params = &setup.params;
    let model = &setup.model;
    let weights = move |name: &'static str| {
        model
            .category(name)
            .ok_or(ScoringError::UnknownCategory(name))
    };

    let credibility = CategoryRun::new(CREDIBILITY)
        .with("credibility_kyc", metrics::credibility_kyc(records))
        .with(
            "credibility_oldest_txn",
            metrics::credibility_oldest_txn(records, params, now),
        )
        .finish(weights(CREDIBILITY)?, &mut feedback.credibility)?;

    let wealth = CategoryRun::new(WEALTH)
        .with("wealth_capital_now", metrics::wealth_capital_now(records, params))
        .with(
            "wealth_capital_now_adjusted",
            metrics::wealth_capital_now_adjusted(records, erc_rank, params),
        )
        .with("wealth_volume_per_txn", metrics::wealth_volume_per_txn(records, params))
        .finish(weights(WEALTH)?, &mut feedback.wealth)?;

    let traffic = CategoryRun::new(TRAFFIC)
        .with(
            "traffic_credit",
            metrics::traffic_volume(records, params, FlowDirection::Credit),
        )
        .with(
            "traffic_debit",
            metrics::traffic_volume(records, params, FlowDirection::Debit),
        )
        .with("traffic_dustiness", metrics::traffic_dustiness(records, params))
        .with(
            "traffic_running_balance",
            metrics::traffic_running_balance(records, erc_rank, params),
        )
        .with("traffic_frequency", metrics::traffic_frequency(records, params, now))
        .finish(weights(TRAFFIC)?, &mut feedback.traffic)?;

    let stamina = CategoryRun::new(STAMINA)
        .with("stamina_methods_count", metrics::stamina_methods_count(records, params))
        .with(
            "stamina_coins_count",
            metrics::stamina_coins_count(records, erc_rank, params),
        )
        .with(
            "stamina_dexterity",
            metrics::stamina_dexterity(records, erc_rank, params),
        )
        .finish(weights(STAMINA)?, &mut feedback.stamina)?;
    match metrics::loan_duedate(records, params, now) {
        Ok(months) => feedback.stamina.observe("loan_duedate", months),
        Err(error) => feedback
            .stamina
            .record_failure("loan_duedate", error.to_string()),
    }

    let categories = vec![
        CategoryScore {
            category: CREDIBILITY,
            score: credibility,
        },
        CategoryScore {
            category: WEALTH,
            score: wealth,
        },
        CategoryScore {
            category: TRAFFIC,
            score: traffic,
        },
        CategoryScore {
            category: STAMINA,
            score: stamina,
        },
    ];
    ScoreOutcome::compose(ProviderKind::Covalent, categories, feedback, model, range)
}
