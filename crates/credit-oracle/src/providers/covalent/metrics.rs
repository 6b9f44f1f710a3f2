use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;

use super::cleanup::{
    purge_portfolio, swiffer_duster, top_erc_balances, top_erc_portfolio, NOT_USD, USD,
};
use super::params::CovalentParams;
use super::records::{ChainTransaction, CovalentRecords, ErcRank, Holding, PortfolioToken};
use crate::providers::FlowDirection;
use crate::scoring::timeline::mean;
use crate::scoring::{loan_duedate as duedate, round2, Measured, MetricError, MetricResult};

const NO_TRANSACTIONS: &str = "no transactions";
const NO_RANKED_TOKEN: &str = "no ranked token in portfolio";

fn oldest(txns: &[ChainTransaction]) -> Option<NaiveDate> {
    txns.iter().map(ChainTransaction::date).min()
}

fn ranked_portfolio(
    records: &CovalentRecords,
    ranks: &ErcRank,
) -> Result<Vec<PortfolioToken>, MetricError> {
    let tokens = top_erc_portfolio(&purge_portfolio(&records.portfolio)?, ranks).items;
    if tokens.is_empty() {
        return Err(MetricError::Missing(NO_RANKED_TOKEN));
    }
    Ok(tokens)
}

pub fn credibility_kyc(records: &CovalentRecords) -> MetricResult {
    let verified =
        !records.balances.items.is_empty() && !records.transactions.items.is_empty();
    Ok(Measured::new(if verified { 1.0 } else { 0.0 })?.observe("verified", verified))
}

pub fn credibility_oldest_txn(
    records: &CovalentRecords,
    params: &CovalentParams,
    now: NaiveDate,
) -> MetricResult {
    let first = oldest(&records.transactions.items).ok_or(MetricError::Missing(NO_TRANSACTIONS))?;
    let age = (now - first).num_days().max(0);
    let index = params.duration.digitize(age as f64);
    Ok(Measured::new(params.fico_medians.at(index)?)?.observe("longevity_days", age))
}

pub fn wealth_capital_now(records: &CovalentRecords, params: &CovalentParams) -> MetricResult {
    let balances = &records.balances;
    if balances.quote_currency != USD {
        return Err(MetricError::Invalid(NOT_USD));
    }
    if balances.items.is_empty() {
        return Err(MetricError::Missing("no balances"));
    }
    let total: f64 = balances.items.iter().map(|token| token.quote).sum();
    let index = params.volume_now.digitize(total);
    Ok(Measured::new(params.fico_medians.at(index)?)?.observe("cum_balance_now", round2(total)))
}

/// Capital held in ranked tokens only.
pub fn wealth_capital_now_adjusted(
    records: &CovalentRecords,
    ranks: &ErcRank,
    params: &CovalentParams,
) -> MetricResult {
    if records.balances.quote_currency != USD {
        return Err(MetricError::Invalid(NOT_USD));
    }
    let total: f64 = top_erc_balances(&records.balances, ranks)
        .items
        .iter()
        .map(|token| token.quote)
        .sum();
    if total <= 0.0 {
        return Err(MetricError::Missing("no ranked tokens held"));
    }
    let index = params.volume_now.digitize(total);
    Ok(Measured::new(params.fico_medians.at(index)?)?
        .observe("cum_balance_now_adjusted", round2(total)))
}

pub fn wealth_volume_per_txn(records: &CovalentRecords, params: &CovalentParams) -> MetricResult {
    let dusted = swiffer_duster(&records.transactions)?;
    let values: Vec<f64> = dusted.items.iter().map(|txn| txn.value_quote).collect();
    let average = mean(&values).ok_or(MetricError::Missing(NO_TRANSACTIONS))?;
    let index = params.volume_per_txn.digitize(average);
    Ok(Measured::new(params.fico_medians.at(index)?)?
        .observe("avg_volume_per_txn", round2(average)))
}

/// Incoming (credit) or outgoing (debit) transfers of the wallet.
pub fn traffic_volume(
    records: &CovalentRecords,
    params: &CovalentParams,
    direction: FlowDirection,
) -> MetricResult {
    let dusted = swiffer_duster(&records.transactions)?;
    let address = records.address.as_str();
    let flowing: Vec<&ChainTransaction> = dusted
        .items
        .iter()
        .filter(|txn| match direction {
            FlowDirection::Credit => txn.is_to(address),
            FlowDirection::Debit => txn.is_from(address),
        })
        .collect();
    if flowing.is_empty() {
        return Err(MetricError::Missing(NO_TRANSACTIONS));
    }
    let volume: f64 = flowing.iter().map(|txn| txn.value_quote).sum();
    let m = params.count_operations.digitize(flowing.len() as f64);
    let n = params.volume_now.digitize(volume);
    let (count_key, volume_key) = match direction {
        FlowDirection::Credit => ("count_credit_txns", "volume_credit_txns"),
        FlowDirection::Debit => ("count_debit_txns", "volume_debit_txns"),
    };
    Ok(Measured::new(params.activity_volume.get(m, n)?)?
        .observe(count_key, flowing.len())
        .observe(volume_key, round2(volume)))
}

/// Share of successful transactions that moved value.
pub fn traffic_dustiness(records: &CovalentRecords, params: &CovalentParams) -> MetricResult {
    let dusted = swiffer_duster(&records.transactions)?;
    let successful = records
        .transactions
        .items
        .iter()
        .filter(|txn| txn.successful)
        .count();
    if successful == 0 {
        return Err(MetricError::Missing(NO_TRANSACTIONS));
    }
    let ratio = dusted.items.len() as f64 / successful as f64;
    let index = params.dust_ratio.digitize(ratio);
    Ok(Measured::new(params.fico_medians.at(index)?)?.observe("non_dust_ratio", round2(ratio)))
}

/// Average closing value of the best-ranked token still in the portfolio.
pub fn traffic_running_balance(
    records: &CovalentRecords,
    ranks: &ErcRank,
    params: &CovalentParams,
) -> MetricResult {
    let tokens = ranked_portfolio(records, ranks)?;
    let best = tokens
        .iter()
        .filter_map(|token| Some((ranks.get(&token.contract_ticker_symbol)?, token)))
        .min_by(|a, b| a.0.total_cmp(b.0))
        .map(|(_, token)| token)
        .ok_or(MetricError::Missing(NO_RANKED_TOKEN))?;
    let quotes: Vec<f64> = best.holdings.iter().map(|holding| holding.close.quote).collect();
    let average = mean(&quotes).ok_or(MetricError::Missing("no holdings history"))?;
    let index = params.volume_now.digitize(average);
    Ok(Measured::new(params.fico_medians.at(index)?)?
        .observe("best_token", best.contract_ticker_symbol.as_str())
        .observe("avg_running_balance_best_token", round2(average)))
}

/// Wallet age against the average number of transactions per month.
pub fn traffic_frequency(
    records: &CovalentRecords,
    params: &CovalentParams,
    now: NaiveDate,
) -> MetricResult {
    let dusted = swiffer_duster(&records.transactions)?;
    let first = oldest(&dusted.items).ok_or(MetricError::Missing(NO_TRANSACTIONS))?;
    let age = (now - first).num_days().max(0);
    let months = (age / 30).max(1);
    let frequency = dusted.items.len() as f64 / months as f64;
    let m = params.duration.digitize(age as f64);
    let n = params.frequency_txn.digitize(frequency);
    Ok(Measured::new(params.activity_consistency.get(m, n)?)?
        .observe("txn_frequency", round2(frequency)))
}

/// Distinct decoded contract methods against the number of calls.
pub fn stamina_methods_count(records: &CovalentRecords, params: &CovalentParams) -> MetricResult {
    let dusted = swiffer_duster(&records.transactions)?;
    let mut calls: BTreeMap<String, usize> = BTreeMap::new();
    for event in dusted.items.iter().flat_map(|txn| &txn.log_events) {
        if let Some(decoded) = &event.decoded {
            *calls.entry(decoded.name.clone()).or_default() += 1;
        }
    }
    if calls.is_empty() {
        return Err(MetricError::Missing("no decoded methods"));
    }
    let total: usize = calls.values().sum();
    let m = params.count_to_four.digitize(calls.len() as f64);
    let n = params.count_operations.digitize(total as f64);
    Ok(Measured::new(params.diversity_methods.get(m, n)?)?
        .observe("method_calls", total)
        .observe("methods", calls.into_keys().collect::<Vec<_>>()))
}

/// Ranked coins currently held against their combined value.
pub fn stamina_coins_count(
    records: &CovalentRecords,
    ranks: &ErcRank,
    params: &CovalentParams,
) -> MetricResult {
    let held: Vec<_> = top_erc_balances(&records.balances, ranks)
        .items
        .into_iter()
        .filter(|token| token.quote > 0.0)
        .collect();
    if held.is_empty() {
        return Err(MetricError::Missing("no ranked tokens held"));
    }
    let coins: BTreeSet<&str> = held
        .iter()
        .map(|token| token.contract_ticker_symbol.as_str())
        .collect();
    let value: f64 = held.iter().map(|token| token.quote).sum();
    let m = params.count_to_four.digitize(coins.len() as f64);
    let n = params.volume_now.digitize(value);
    Ok(Measured::new(params.diversity_methods.get(m, n)?)?
        .observe("unique_coins", coins.len())
        .observe("value_unique_coins", round2(value)))
}

/// Holdings increased below the token's mean close quote, or decreased above it.
fn smart_trades(holdings: &[Holding]) -> usize {
    let mut ordered: Vec<&Holding> = holdings.iter().collect();
    ordered.sort_by_key(|holding| holding.timestamp);
    let quotes: Vec<f64> = ordered.iter().map(|holding| holding.close.quote).collect();
    let Some(average) = mean(&quotes) else {
        return 0;
    };
    ordered
        .windows(2)
        .filter(|pair| {
            let (before, after) = (pair[0], pair[1]);
            let quote = after.close.quote;
            (after.close.balance > before.close.balance && quote < average)
                || (after.close.balance < before.close.balance && quote > average)
        })
        .count()
}

pub fn stamina_dexterity(
    records: &CovalentRecords,
    ranks: &ErcRank,
    params: &CovalentParams,
) -> MetricResult {
    let tokens = ranked_portfolio(records, ranks)?;
    let count: usize = tokens.iter().map(|token| smart_trades(&token.holdings)).sum();
    let index = params.count_operations.digitize(count as f64);
    Ok(Measured::new(params.fico_medians.at(index)?)?.observe("count_smart_trades", count))
}

/// Installments recommended from the oldest transaction that moved value.
pub fn loan_duedate(
    records: &CovalentRecords,
    params: &CovalentParams,
    now: NaiveDate,
) -> Result<i64, MetricError> {
    let dusted = swiffer_duster(&records.transactions)?;
    let first = oldest(&dusted.items).ok_or(MetricError::Missing(NO_TRANSACTIONS))?;
    duedate((now - first).num_days(), &params.due_date)
}
