use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::providers::FlowDirection;

/// Wallets and transactions pulled from an exchange account.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CoinbaseRecords {
    #[serde(default)]
    pub accounts: Vec<CoinbaseAccount>,
    #[serde(default)]
    pub transactions: Vec<CoinbaseTransaction>,
}

impl CoinbaseRecords {
    /// Completed transactions, oldest first.
    pub fn completed(&self) -> Vec<&CoinbaseTransaction> {
        let mut completed: Vec<&CoinbaseTransaction> = self
            .transactions
            .iter()
            .filter(|txn| txn.is_completed())
            .collect();
        completed.sort_by_key(|txn| txn.created_at);
        completed
    }

    /// Total wallet value in USD.
    pub fn balance(&self) -> f64 {
        self.accounts
            .iter()
            .map(|account| account.native_balance)
            .sum()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoinbaseAccount {
    pub id: String,
    pub currency: String,
    #[serde(default)]
    pub balance: f64,
    /// Balance quoted in USD.
    #[serde(default)]
    pub native_balance: f64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoinbaseTransaction {
    pub id: String,
    pub account_id: String,
    #[serde(rename = "type")]
    pub kind: TransactionKind,
    #[serde(default = "completed_status")]
    pub status: String,
    #[serde(default)]
    pub amount: f64,
    /// Amount quoted in USD.
    #[serde(default)]
    pub native_amount: f64,
    pub created_at: DateTime<Utc>,
}

fn completed_status() -> String {
    "completed".to_string()
}

impl CoinbaseTransaction {
    pub fn is_completed(&self) -> bool {
        self.status.eq_ignore_ascii_case("completed")
    }

    pub fn date(&self) -> NaiveDate {
        self.created_at.date_naive()
    }

    pub fn volume(&self) -> f64 {
        self.native_amount.abs()
    }

    /// USD change to the wallet balance.
    pub fn signed_volume(&self) -> Option<f64> {
        match self.kind.direction()? {
            FlowDirection::Credit => Some(self.volume()),
            FlowDirection::Debit => Some(-self.volume()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    Buy,
    Receive,
    FiatDeposit,
    ExchangeDeposit,
    Sell,
    Send,
    FiatWithdrawal,
    ExchangeWithdrawal,
    #[serde(other)]
    Other,
}

impl TransactionKind {
    pub fn direction(self) -> Option<FlowDirection> {
        match self {
            Self::Buy | Self::Receive | Self::FiatDeposit | Self::ExchangeDeposit => {
                Some(FlowDirection::Credit)
            }
            Self::Sell | Self::Send | Self::FiatWithdrawal | Self::ExchangeWithdrawal => {
                Some(FlowDirection::Debit)
            }
            Self::Other => None,
        }
    }
}
