use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use serde_json::json;

use crate::config::Thresholds;
use crate::providers::coinbase::{
    CoinbaseAccount, CoinbaseParams, CoinbaseRecords, CoinbaseTransaction, TransactionKind, LAYOUT,
};
use crate::providers::ProviderSetup;
use crate::scoring::{Messages, ModelWeights, RawCategoryWeights, RawParams, ScoreRange};

pub(super) fn now() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, 15).expect("valid date")
}

pub(super) fn at(year: i32, month: u32, day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, 12, 0, 0)
        .single()
        .expect("valid timestamp")
}

pub(super) fn score_range() -> ScoreRange {
    ScoreRange::new(vec![300.0, 500.0, 640.0, 740.0, 850.0]).expect("valid range")
}

pub(super) fn params() -> CoinbaseParams {
    let matrix = json!({"shape": [4, 4], "scalars": [1.0, 1.0], "normalize": true});
    let raw: RawParams = serde_json::from_value(json!({
        "metrics": {
            "due_date": [3, 4, 5],
            "duration": [90, 180, 365],
            "count_txn": [5, 10, 20],
            "volume_balance": [1, 5, 10],
            "volume_profit": [0.5, 2, 5],
            "volume_txn": [1, 5, 10]
        },
        "matrices": {"activity_volume": matrix, "activity_consistency": matrix}
    }))
    .expect("valid params");
    CoinbaseParams::build(&raw, &score_range()).expect("complete params")
}

pub(super) fn model() -> ModelWeights {
    let entries: [(&str, f64, f64, &[&str]); 4] = [
        ("kyc", 0.1, 0.0, &["kyc"]),
        ("history", 0.2, 0.3, &["history_acc_longevity"]),
        (
            "liquidity",
            0.35,
            0.35,
            &["liquidity_tot_balance_now", "liquidity_avg_running_balance"],
        ),
        (
            "activity",
            0.35,
            0.35,
            &[
                "activity_credit_volume_count",
                "activity_debit_volume_count",
                "activity_credit_consistency",
                "activity_debit_consistency",
                "activity_profit_since_inception",
            ],
        ),
    ];
    let raw: BTreeMap<String, RawCategoryWeights> = entries
        .iter()
        .map(|(name, weight, penalty, metrics)| {
            let share = 1.0 / metrics.len() as f64;
            (
                name.to_string(),
                RawCategoryWeights {
                    weight: *weight,
                    penalty_weight: Some(*penalty),
                    metrics: metrics
                        .iter()
                        .map(|metric| (metric.to_string(), share))
                        .collect(),
                },
            )
        })
        .collect();
    ModelWeights::from_raw(&raw, LAYOUT).expect("valid model")
}

pub(super) fn setup() -> ProviderSetup<CoinbaseParams> {
    ProviderSetup {
        params: params(),
        model: model(),
        messages: Messages {
            success: "{} - {} points, {} NEAR (${} USD)".to_string(),
            failed: "We could not verify your Coinbase account".to_string(),
            not_qualified: None,
        },
        thresholds: Thresholds::default(),
    }
}

pub(super) fn transaction(
    id: usize,
    kind: TransactionKind,
    native_amount: f64,
    created_at: DateTime<Utc>,
) -> CoinbaseTransaction {
    CoinbaseTransaction {
        id: format!("txn-{id}"),
        account_id: "btc".to_string(),
        kind,
        status: "completed".to_string(),
        amount: native_amount / 40000.0,
        native_amount,
        created_at,
    }
}

/// Seventeen months of monthly buys and sells plus one pending buy.
pub(super) fn records() -> CoinbaseRecords {
    let mut transactions = Vec::new();
    let mut id = 0;
    for (year, month) in (1..=12)
        .map(|month| (2023, month))
        .chain((1..=5).map(|month| (2024, month)))
    {
        id += 1;
        transactions.push(transaction(id, TransactionKind::Buy, 400.0, at(year, month, 5)));
        id += 1;
        transactions.push(transaction(id, TransactionKind::Sell, -150.0, at(year, month, 20)));
    }
    let mut pending = transaction(id + 1, TransactionKind::Buy, 9000.0, at(2024, 6, 1));
    pending.status = "pending".to_string();
    transactions.push(pending);

    CoinbaseRecords {
        accounts: vec![
            CoinbaseAccount {
                id: "btc".to_string(),
                currency: "BTC".to_string(),
                balance: 0.15,
                native_balance: 6000.0,
                created_at: at(2022, 1, 10),
            },
            CoinbaseAccount {
                id: "usd".to_string(),
                currency: "USD".to_string(),
                balance: 500.0,
                native_balance: 500.0,
                created_at: at(2022, 3, 1),
            },
        ],
        transactions,
    }
}
