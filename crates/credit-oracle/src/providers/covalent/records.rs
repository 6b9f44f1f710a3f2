use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Ticker -> market capitalisation rank; lower ranks are larger tokens.
pub type ErcRank = BTreeMap<String, f64>;

/// Explorer responses for one wallet address.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CovalentRecords {
    pub address: String,
    pub balances: BalanceSheet,
    pub transactions: TransactionLog,
    pub portfolio: Portfolio,
}

/// Records file layout accepted by the command line: explorer responses
/// plus the rank map captured alongside them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CovalentBundle {
    #[serde(flatten)]
    pub records: CovalentRecords,
    #[serde(default)]
    pub erc_rank: ErcRank,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BalanceSheet {
    pub quote_currency: String,
    #[serde(default)]
    pub items: Vec<TokenBalance>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenBalance {
    pub contract_ticker_symbol: String,
    #[serde(default, deserialize_with = "null_as_zero")]
    pub quote: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionLog {
    pub quote_currency: String,
    #[serde(default)]
    pub items: Vec<ChainTransaction>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChainTransaction {
    pub block_signed_at: DateTime<Utc>,
    #[serde(default)]
    pub successful: bool,
    #[serde(default, deserialize_with = "null_as_zero")]
    pub value_quote: f64,
    pub from_address: String,
    #[serde(default)]
    pub to_address: Option<String>,
    #[serde(default)]
    pub log_events: Vec<LogEvent>,
}

impl ChainTransaction {
    pub fn date(&self) -> NaiveDate {
        self.block_signed_at.date_naive()
    }

    pub fn is_from(&self, address: &str) -> bool {
        self.from_address.eq_ignore_ascii_case(address)
    }

    pub fn is_to(&self, address: &str) -> bool {
        self.to_address
            .as_deref()
            .is_some_and(|to| to.eq_ignore_ascii_case(address))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEvent {
    #[serde(default)]
    pub decoded: Option<DecodedEvent>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecodedEvent {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Portfolio {
    pub quote_currency: String,
    #[serde(default)]
    pub items: Vec<PortfolioToken>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioToken {
    pub contract_ticker_symbol: String,
    #[serde(default)]
    pub holdings: Vec<Holding>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Holding {
    pub timestamp: DateTime<Utc>,
    pub close: HoldingQuote,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HoldingQuote {
    #[serde(default, deserialize_with = "null_as_zero")]
    pub balance: f64,
    #[serde(default, deserialize_with = "null_as_zero")]
    pub quote: f64,
}

fn null_as_zero<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<f64>::deserialize(deserializer)?.unwrap_or(0.0))
}
