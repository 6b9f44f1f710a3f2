use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Accounts and transactions as returned by the bank aggregator.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlaidRecords {
    #[serde(default)]
    pub institution_name: Option<String>,
    #[serde(default)]
    pub accounts: Vec<PlaidAccount>,
    #[serde(default)]
    pub transactions: Vec<PlaidTransaction>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaidAccount {
    pub account_id: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub subtype: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub official_name: Option<String>,
    #[serde(default)]
    pub balances: PlaidBalances,
}

impl PlaidAccount {
    pub fn group(&self) -> Option<AccountGroup> {
        let subtype = self.subtype.as_deref().map(str::to_ascii_lowercase);
        match (self.kind.to_ascii_lowercase().as_str(), subtype.as_deref()) {
            ("credit", _) => Some(AccountGroup::CreditCard),
            ("depository", Some("checking")) => Some(AccountGroup::Checking),
            ("depository", Some("savings")) => Some(AccountGroup::Savings),
            _ => None,
        }
    }

    pub fn is_depository(&self) -> bool {
        self.kind.eq_ignore_ascii_case("depository")
    }

    pub fn is_investment(&self) -> bool {
        self.kind.eq_ignore_ascii_case("investment")
    }

    pub fn display_name(&self) -> Option<&str> {
        self.official_name.as_deref().or(self.name.as_deref())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlaidBalances {
    #[serde(default)]
    pub current: Option<f64>,
    #[serde(default)]
    pub available: Option<f64>,
    #[serde(default)]
    pub limit: Option<f64>,
}

/// A posted or pending transaction. Positive amounts leave the account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaidTransaction {
    pub account_id: String,
    pub date: NaiveDate,
    pub amount: f64,
    #[serde(default)]
    pub category: Vec<String>,
    #[serde(default)]
    pub pending: bool,
}

impl PlaidTransaction {
    /// Case-insensitive match against any category label.
    pub fn has_category(&self, label: &str) -> bool {
        self.category
            .iter()
            .any(|category| category.eq_ignore_ascii_case(label))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountGroup {
    CreditCard,
    Checking,
    Savings,
}
