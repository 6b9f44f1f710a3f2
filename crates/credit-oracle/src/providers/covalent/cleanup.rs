//! Record preparation shared by the explorer metrics.

use super::records::{BalanceSheet, ErcRank, Portfolio, TransactionLog};
use crate::scoring::MetricError;

pub const USD: &str = "USD";
pub const NOT_USD: &str = "quote_currency should be USD";

/// Successful transactions that moved value. Applying it twice changes nothing.
pub fn swiffer_duster(log: &TransactionLog) -> Result<TransactionLog, MetricError> {
    if log.quote_currency != USD {
        return Err(MetricError::Invalid(NOT_USD));
    }
    Ok(TransactionLog {
        quote_currency: log.quote_currency.clone(),
        items: log
            .items
            .iter()
            .filter(|txn| txn.successful && txn.value_quote > 0.0)
            .cloned()
            .collect(),
    })
}

/// Tokens that carried value at some point in their holding history.
pub fn purge_portfolio(portfolio: &Portfolio) -> Result<Portfolio, MetricError> {
    if portfolio.quote_currency != USD {
        return Err(MetricError::Invalid(NOT_USD));
    }
    Ok(Portfolio {
        quote_currency: portfolio.quote_currency.clone(),
        items: portfolio
            .items
            .iter()
            .filter(|token| token.holdings.iter().any(|holding| holding.close.quote > 0.0))
            .cloned()
            .collect(),
    })
}

pub fn top_erc_balances(balances: &BalanceSheet, ranks: &ErcRank) -> BalanceSheet {
    BalanceSheet {
        quote_currency: balances.quote_currency.clone(),
        items: balances
            .items
            .iter()
            .filter(|token| ranks.contains_key(&token.contract_ticker_symbol))
            .cloned()
            .collect(),
    }
}

pub fn top_erc_portfolio(portfolio: &Portfolio, ranks: &ErcRank) -> Portfolio {
    Portfolio {
        quote_currency: portfolio.quote_currency.clone(),
        items: portfolio
            .items
            .iter()
            .filter(|token| ranks.contains_key(&token.contract_ticker_symbol))
            .cloned()
            .collect(),
    }
}
