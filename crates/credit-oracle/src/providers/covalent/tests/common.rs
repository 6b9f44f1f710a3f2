use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use serde_json::json;

use crate::config::Thresholds;
use crate::providers::covalent::{
    BalanceSheet, ChainTransaction, CovalentParams, CovalentRecords, DecodedEvent, ErcRank,
    Holding, HoldingQuote, LogEvent, Portfolio, PortfolioToken, TokenBalance, TransactionLog,
    LAYOUT,
};
use crate::providers::ProviderSetup;
use crate::scoring::{Messages, ModelWeights, RawCategoryWeights, RawParams, ScoreRange};

pub(super) const ADDRESS: &str = "0xA11CE";

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

pub(super) fn params() -> CovalentParams {
    let matrix = json!({"shape": [4, 4], "scalars": [1.0, 1.0], "normalize": true});
    let raw: RawParams = serde_json::from_value(json!({
        "metrics": {
            "duration": [90, 180, 365],
            "due_date": [3, 4, 5],
            "volume_now": [1, 5, 10],
            "volume_per_txn": [0.1, 0.5, 1],
            "count_to_four": [1, 2, 3],
            "count_operations": [5, 10, 20],
            "frequency_txn": [1, 2, 4]
        },
        "matrices": {
            "activity_volume": matrix,
            "activity_consistency": matrix,
            "diversity_methods": matrix
        }
    }))
    .expect("valid params");
    CovalentParams::build(&raw, &score_range()).expect("complete params")
}

pub(super) fn model() -> ModelWeights {
    let entries: [(&str, f64, f64, &[&str]); 4] = [
        (
            "credibility",
            0.2,
            0.0,
            &["credibility_kyc", "credibility_oldest_txn"],
        ),
        (
            "wealth",
            0.3,
            0.4,
            &[
                "wealth_capital_now",
                "wealth_capital_now_adjusted",
                "wealth_volume_per_txn",
            ],
        ),
        (
            "traffic",
            0.3,
            0.3,
            &[
                "traffic_credit",
                "traffic_debit",
                "traffic_dustiness",
                "traffic_running_balance",
                "traffic_frequency",
            ],
        ),
        (
            "stamina",
            0.2,
            0.3,
            &[
                "stamina_methods_count",
                "stamina_coins_count",
                "stamina_dexterity",
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

pub(super) fn setup_with(thresholds: Thresholds) -> ProviderSetup<CovalentParams> {
    ProviderSetup {
        params: params(),
        model: model(),
        messages: Messages {
            success: "{} - {} points, {} NEAR (${} USD)".to_string(),
            failed: "We could not verify your wallet".to_string(),
            not_qualified: None,
        },
        thresholds,
    }
}

pub(super) fn setup() -> ProviderSetup<CovalentParams> {
    setup_with(Thresholds::default())
}

pub(super) fn erc_rank() -> ErcRank {
    [("WBTC", 1.0), ("ETH", 2.0), ("USDC", 6.0)]
        .into_iter()
        .map(|(ticker, rank)| (ticker.to_string(), rank))
        .collect()
}

fn event(name: &str) -> LogEvent {
    LogEvent {
        decoded: Some(DecodedEvent {
            name: name.to_string(),
        }),
    }
}

pub(super) fn transaction(
    from: &str,
    to: &str,
    value_quote: f64,
    block_signed_at: DateTime<Utc>,
    events: &[&str],
) -> ChainTransaction {
    ChainTransaction {
        block_signed_at,
        successful: true,
        value_quote,
        from_address: from.to_string(),
        to_address: Some(to.to_string()),
        log_events: events.iter().map(|name| event(name)).collect(),
    }
}

fn holding(timestamp: DateTime<Utc>, balance: f64, quote: f64) -> Holding {
    Holding {
        timestamp,
        close: HoldingQuote { balance, quote },
    }
}

fn token(symbol: &str, holdings: Vec<Holding>) -> PortfolioToken {
    PortfolioToken {
        contract_ticker_symbol: symbol.to_string(),
        holdings,
    }
}

/// Seventeen months of deposits and swaps, one dust transfer and one
/// reverted transfer.
pub(super) fn records() -> CovalentRecords {
    let mut items = Vec::new();
    for (year, month) in (1..=12)
        .map(|month| (2023, month))
        .chain((1..=5).map(|month| (2024, month)))
    {
        items.push(transaction(
            "0xfeed",
            "0xa11ce",
            1000.0,
            at(year, month, 10),
            &["Transfer"],
        ));
        items.push(transaction(
            ADDRESS,
            "0xdex",
            400.0,
            at(year, month, 20),
            &["Swap", "Transfer"],
        ));
    }
    items.push(transaction("0xspam", ADDRESS, 0.0, at(2024, 2, 2), &["Airdrop"]));
    let mut reverted = transaction(ADDRESS, "0xdex", 50.0, at(2024, 3, 3), &["Swap"]);
    reverted.successful = false;
    items.push(reverted);

    CovalentRecords {
        address: ADDRESS.to_string(),
        balances: BalanceSheet {
            quote_currency: "USD".to_string(),
            items: vec![
                TokenBalance {
                    contract_ticker_symbol: "ETH".to_string(),
                    quote: 3000.0,
                },
                TokenBalance {
                    contract_ticker_symbol: "USDC".to_string(),
                    quote: 1500.0,
                },
                TokenBalance {
                    contract_ticker_symbol: "JUNK".to_string(),
                    quote: 20.0,
                },
            ],
        },
        transactions: TransactionLog {
            quote_currency: "USD".to_string(),
            items,
        },
        portfolio: Portfolio {
            quote_currency: "USD".to_string(),
            items: vec![
                token(
                    "ETH",
                    vec![
                        holding(at(2024, 6, 14), 1.0, 4000.0),
                        holding(at(2024, 6, 12), 1.0, 2000.0),
                        holding(at(2024, 6, 13), 2.0, 1500.0),
                    ],
                ),
                token(
                    "USDC",
                    vec![
                        holding(at(2024, 6, 12), 1500.0, 1500.0),
                        holding(at(2024, 6, 13), 1500.0, 1500.0),
                    ],
                ),
                token("JUNK", vec![holding(at(2024, 6, 12), 10.0, 0.0)]),
            ],
        },
    }
}

pub(super) fn empty_records() -> CovalentRecords {
    CovalentRecords {
        address: ADDRESS.to_string(),
        balances: BalanceSheet {
            quote_currency: "USD".to_string(),
            items: Vec::new(),
        },
        transactions: TransactionLog {
            quote_currency: "USD".to_string(),
            items: Vec::new(),
        },
        portfolio: Portfolio {
            quote_currency: "USD".to_string(),
            items: Vec::new(),
        },
    }
}
