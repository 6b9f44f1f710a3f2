use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate};
use serde_json::json;

use crate::config::Thresholds;
use crate::providers::plaid::{
    PlaidAccount, PlaidBalances, PlaidParams, PlaidRecords, PlaidTransaction, LAYOUT,
};
use crate::providers::ProviderSetup;
use crate::scoring::{Messages, ModelWeights, RawCategoryWeights, RawParams, ScoreRange};

pub(super) fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).expect("valid date")
}

pub(super) fn now() -> NaiveDate {
    date(2024, 6, 15)
}

pub(super) fn score_range() -> ScoreRange {
    ScoreRange::new(vec![300.0, 500.0, 640.0, 740.0, 850.0]).expect("valid range")
}

pub(super) fn raw_params() -> RawParams {
    let matrix = json!({"shape": [4, 4], "scalars": [1.0, 1.0], "normalize": true});
    serde_json::from_value(json!({
        "metrics": {
            "duration": [90, 180, 365],
            "count_zero": [0, 1, 2],
            "credit_util_pct": [0.1, 0.3, 0.5],
            "frequency_interest": [0.1, 0.3, 0.5],
            "count_txn": [5, 10, 20],
            "flow_ratio": [0.5, 1, 2],
            "slope": [-1, 0, 1],
            "slope_lr": [-50, 0, 50],
            "due_date": [3, 4, 5],
            "volume_credit": [0.5, 2, 5],
            "volume_deposit": [0.5, 1.5, 3],
            "volume_withdraw": [0.5, 1.5, 3],
            "volume_balance": [1, 5, 10],
            "volume_invest": [1, 5, 10]
        },
        "matrices": {
            "credit_mix": matrix,
            "activity_volume": matrix,
            "activity_consistency": matrix,
            "diversity_velocity": matrix
        }
    }))
    .expect("valid params")
}

pub(super) fn params() -> PlaidParams {
    PlaidParams::build(&raw_params(), &score_range()).expect("complete params")
}

fn category(weight: f64, penalty: f64, metrics: &[(&str, f64)]) -> RawCategoryWeights {
    RawCategoryWeights {
        weight,
        penalty_weight: Some(penalty),
        metrics: metrics
            .iter()
            .map(|(name, weight)| (name.to_string(), *weight))
            .collect(),
    }
}

pub(super) fn model() -> ModelWeights {
    let mut raw = BTreeMap::new();
    raw.insert(
        "credit".to_string(),
        category(
            0.4,
            0.0,
            &[
                ("credit_mix", 0.2),
                ("credit_limit", 0.2),
                ("credit_util_ratio", 0.15),
                ("credit_interest", 0.15),
                ("credit_length", 0.15),
                ("credit_livelihood", 0.15),
            ],
        ),
    );
    raw.insert(
        "velocity".to_string(),
        category(
            0.3,
            0.5,
            &[
                ("velocity_deposits", 0.2),
                ("velocity_withdrawals", 0.2),
                ("velocity_net_flow", 0.2),
                ("velocity_slope", 0.2),
                ("velocity_txn_count", 0.2),
            ],
        ),
    );
    raw.insert(
        "stability".to_string(),
        category(
            0.2,
            0.3,
            &[("stability_balance", 0.5), ("stability_running_balance", 0.5)],
        ),
    );
    raw.insert(
        "diversity".to_string(),
        category(
            0.1,
            0.2,
            &[("diversity_acc_count", 0.5), ("diversity_profile", 0.5)],
        ),
    );
    ModelWeights::from_raw(&raw, LAYOUT).expect("valid model")
}

pub(super) fn setup() -> ProviderSetup<PlaidParams> {
    ProviderSetup {
        params: params(),
        model: model(),
        messages: Messages {
            success: "Your score is {} - {} points, good for {} NEAR (${} USD)".to_string(),
            failed: "Your score could not be computed".to_string(),
            not_qualified: None,
        },
        thresholds: Thresholds::default(),
    }
}

pub(super) fn account(
    id: &str,
    kind: &str,
    subtype: &str,
    current: f64,
    limit: Option<f64>,
) -> PlaidAccount {
    PlaidAccount {
        account_id: id.to_string(),
        kind: kind.to_string(),
        subtype: Some(subtype.to_string()),
        name: Some(format!("Plaid {subtype}")),
        official_name: None,
        balances: PlaidBalances {
            current: Some(current),
            available: limit.map(|limit| limit - current),
            limit,
        },
    }
}

pub(super) fn txn(account: &str, date: NaiveDate, amount: f64, category: &[&str]) -> PlaidTransaction {
    PlaidTransaction {
        account_id: account.to_string(),
        date,
        amount,
        category: category.iter().map(|label| label.to_string()).collect(),
        pending: false,
    }
}

/// First day of each month from March 2023 through June 2024.
fn months() -> impl Iterator<Item = NaiveDate> {
    let mut month = date(2023, 3, 1);
    std::iter::from_fn(move || {
        if month > date(2024, 6, 1) {
            return None;
        }
        let current = month;
        month = if month.month() == 12 {
            date(month.year() + 1, 1, 1)
        } else {
            date(month.year(), month.month() + 1, 1)
        };
        Some(current)
    })
}

fn checking_history(account: &str) -> Vec<PlaidTransaction> {
    months()
        .flat_map(|month| {
            vec![
                txn(account, month, -2500.0, &["Transfer", "Payroll"]),
                txn(account, month.with_day(3).expect("day"), 1200.0, &["Payment", "Rent"]),
                txn(
                    account,
                    month.with_day(10).expect("day"),
                    150.0,
                    &["Service", "Utilities"],
                ),
            ]
        })
        .collect()
}

fn card_history(account: &str) -> Vec<PlaidTransaction> {
    let mut history: Vec<PlaidTransaction> = months()
        .map(|month| {
            txn(
                account,
                month.with_day(12).expect("day"),
                300.0,
                &["Shops", "Supermarkets and Groceries"],
            )
        })
        .collect();
    history.push(txn(
        account,
        date(2024, 2, 20),
        25.0,
        &["Bank Fees", "Interest Charged"],
    ));
    history
}

/// Checking, credit card and savings with fifteen months of history.
pub(super) fn records() -> PlaidRecords {
    let mut transactions = checking_history("chk");
    transactions.extend(card_history("card"));
    PlaidRecords {
        institution_name: Some("First Platypus Bank".to_string()),
        accounts: vec![
            account("chk", "depository", "checking", 25000.0, None),
            account("card", "credit", "credit card", 800.0, Some(5000.0)),
            account("sav", "depository", "savings", 3000.0, None),
        ],
        transactions,
    }
}

/// Same borrower without any credit card.
pub(super) fn records_without_card() -> PlaidRecords {
    let mut records = records();
    records.accounts.retain(|account| account.kind != "credit");
    records.transactions.retain(|txn| txn.account_id != "card");
    records
}
