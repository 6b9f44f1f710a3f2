use chrono::NaiveDate;

use super::params::CoinbaseParams;
use super::records::{CoinbaseRecords, CoinbaseTransaction};
use crate::providers::FlowDirection;
use crate::scoring::timeline::{
    mean, month_end_balances, monthly_buckets, recency_weighted_mean, trailing,
};
use crate::scoring::{loan_duedate as duedate, round2, Measured, MetricError, MetricResult};

/// Penalty per month that closed with a negative balance.
pub const OVERDRAFT_PENALTY: f64 = 0.025;

const NO_HISTORY: &str = "no transaction history";

fn flowing(records: &CoinbaseRecords, direction: FlowDirection) -> Vec<&CoinbaseTransaction> {
    records
        .completed()
        .into_iter()
        .filter(|txn| txn.kind.direction() == Some(direction))
        .collect()
}

pub fn kyc(records: &CoinbaseRecords) -> MetricResult {
    let verified = !records.accounts.is_empty() && !records.completed().is_empty();
    Ok(Measured::new(if verified { 1.0 } else { 0.0 })?.observe("verified", verified))
}

pub fn history_acc_longevity(
    records: &CoinbaseRecords,
    params: &CoinbaseParams,
    now: NaiveDate,
) -> MetricResult {
    let opened = records
        .accounts
        .iter()
        .map(|account| account.created_at.date_naive())
        .min()
        .ok_or(MetricError::Missing("no accounts"))?;
    let age = (now - opened).num_days().max(0);
    let index = params.duration.digitize(age as f64);
    Ok(Measured::new(params.fico_medians.at(index)?)?.observe("wallet_age(days)", age))
}

pub fn liquidity_tot_balance_now(records: &CoinbaseRecords, params: &CoinbaseParams) -> MetricResult {
    let balance = records.balance();
    if balance <= 0.0 {
        return Err(MetricError::Missing("no balance"));
    }
    let index = params.volume_balance.digitize(balance);
    Ok(Measured::new(params.fico_medians.at(index)?)?
        .observe("current_balance", round2(balance)))
}

pub fn liquidity_avg_running_balance(
    records: &CoinbaseRecords,
    params: &CoinbaseParams,
    now: NaiveDate,
    months: usize,
) -> MetricResult {
    let completed = records.completed();
    if completed.is_empty() {
        return Err(MetricError::Missing(NO_HISTORY));
    }
    let balances = trailing(
        month_end_balances(
            records.balance(),
            completed
                .iter()
                .filter_map(|txn| Some((txn.date(), txn.signed_volume()?))),
            now,
        ),
        months,
    );
    let weighted =
        recency_weighted_mean(&balances).ok_or(MetricError::Missing("no consistent net flow"))?;
    let overdrafts = balances.iter().filter(|balance| **balance < 0.0).count();

    let m = params.duration.digitize((balances.len() * 30) as f64);
    let n = params.volume_balance.digitize(weighted);
    let score = (params.activity_consistency.get(m, n)? - OVERDRAFT_PENALTY * overdrafts as f64)
        .max(0.0);
    Ok(Measured::new(round2(score))?.observe("avg_running_balance", round2(weighted)))
}

pub fn activity_volume_count(
    records: &CoinbaseRecords,
    params: &CoinbaseParams,
    direction: FlowDirection,
) -> MetricResult {
    let txns = flowing(records, direction);
    if txns.is_empty() {
        return Err(MetricError::Missing(NO_HISTORY));
    }
    let volume: f64 = txns.iter().map(|txn| txn.volume()).sum();
    let m = params.count_txn.digitize(txns.len() as f64);
    let n = params.volume_txn.digitize(volume);
    let (count_key, volume_key) = match direction {
        FlowDirection::Credit => ("credit_count", "credit_volume"),
        FlowDirection::Debit => ("debit_count", "debit_volume"),
    };
    Ok(Measured::new(params.activity_volume.get(m, n)?)?
        .observe(count_key, txns.len())
        .observe(volume_key, round2(volume)))
}

pub fn activity_consistency(
    records: &CoinbaseRecords,
    params: &CoinbaseParams,
    direction: FlowDirection,
    now: NaiveDate,
) -> MetricResult {
    let buckets = monthly_buckets(
        flowing(records, direction)
            .into_iter()
            .map(|txn| (txn.date(), txn.volume())),
        now,
    );
    let totals: Vec<f64> = buckets.iter().map(|bucket| bucket.total).collect();
    let average = mean(&totals).ok_or(MetricError::Missing(NO_HISTORY))?;
    let m = params.duration.digitize((buckets.len() * 30) as f64);
    let n = params.volume_txn.digitize(average);
    let key = match direction {
        FlowDirection::Credit => "credit_avg_monthly_volume",
        FlowDirection::Debit => "debit_avg_monthly_volume",
    };
    Ok(Measured::new(params.activity_consistency.get(m, n)?)?.observe(key, round2(average)))
}

pub fn activity_profit_since_inception(
    records: &CoinbaseRecords,
    params: &CoinbaseParams,
) -> MetricResult {
    let bought: f64 = flowing(records, FlowDirection::Credit)
        .iter()
        .map(|txn| txn.volume())
        .sum();
    let sold: f64 = flowing(records, FlowDirection::Debit)
        .iter()
        .map(|txn| txn.volume())
        .sum();
    let profit = records.balance() + sold - bought;
    if profit <= 0.0 {
        return Err(MetricError::Missing("no net profit"));
    }
    let index = params.volume_profit.digitize(profit);
    Ok(Measured::new(params.fico_medians.at(index)?)?.observe("profit", round2(profit)))
}

/// Installments recommended from the oldest completed transaction.
pub fn loan_duedate(
    records: &CoinbaseRecords,
    params: &CoinbaseParams,
    now: NaiveDate,
) -> Result<i64, MetricError> {
    let oldest = records
        .completed()
        .first()
        .map(|txn| txn.date())
        .ok_or(MetricError::Missing(NO_HISTORY))?;
    duedate((now - oldest).num_days(), &params.due_date)
}
