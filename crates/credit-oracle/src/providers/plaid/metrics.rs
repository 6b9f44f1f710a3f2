//! Bank aggregator metrics. Every function maps metadata onto one sub-score.

use super::metadata::{CheckingMetadata, CreditMetadata, PlaidMetadata};
use super::params::PlaidParams;
use crate::scoring::timeline::{mean, recency_weighted_mean, slope, trailing};
use crate::scoring::{loan_duedate as duedate, round2, Measured, MetricError, MetricResult};

/// Direction reported when no month closed with a net outflow.
pub const FLOW_DIRECTION_CEILING: f64 = 10.0;
/// Penalty per month that closed overdrawn.
pub const OVERDRAFT_PENALTY: f64 = 0.025;
/// Net flow history long enough to trust a fitted slope.
const SLOPE_FIT_MONTHS: usize = 10;

pub const NO_CREDIT_CARD: &str = "no credit card";

fn credit(meta: &PlaidMetadata) -> Result<&CreditMetadata, MetricError> {
    meta.credit.as_ref().ok_or(MetricError::Missing(NO_CREDIT_CARD))
}

fn checking(meta: &PlaidMetadata) -> Result<&CheckingMetadata, MetricError> {
    meta.checking
        .as_ref()
        .ok_or(MetricError::Missing("no checking account"))
}

pub fn credit_mix(meta: &PlaidMetadata, params: &PlaidParams) -> MetricResult {
    let credit = credit(meta)?;
    let m = params
        .count_zero
        .digitize(credit.summary.account_count as f64);
    let n = params.duration.digitize(credit.summary.timespan_days as f64);
    Ok(Measured::new(params.credit_mix.get(m, n)?)?
        .observe("credit_cards", credit.summary.account_count)
        .observe("card_names", credit.card_names.clone()))
}

pub fn credit_limit(meta: &PlaidMetadata, params: &PlaidParams) -> MetricResult {
    let credit = credit(meta)?;
    if credit.total_limit <= 0.0 {
        return Err(MetricError::Missing("no credit limit"));
    }
    let m = params.duration.digitize(credit.summary.timespan_days as f64);
    let n = params.volume_credit.digitize(credit.total_limit);
    Ok(Measured::new(params.activity_volume.get(m, n)?)?
        .observe("credit_limit", round2(credit.total_limit)))
}

pub fn credit_util_ratio(meta: &PlaidMetadata, params: &PlaidParams) -> MetricResult {
    let utilization = credit(meta)?
        .utilization
        .ok_or(MetricError::Missing("no credit card purchases"))?;
    let m = params.duration.digitize((utilization.months * 30) as f64);
    let n = params.credit_util_pct.digitize(utilization.avg_ratio);
    Ok(Measured::new(params.activity_consistency.get(m, n)?)?
        .observe("utilization_ratio", round2(utilization.avg_ratio)))
}

/// Interest-charge frequency scored from the top of the rewards down, so the
/// rarest charges earn the full reward. This inverts a plain `fico_medians`
/// lookup, which would reward frequent charges.
pub fn credit_interest(meta: &PlaidMetadata, params: &PlaidParams) -> MetricResult {
    let interest = credit(meta)?
        .interest
        .ok_or(MetricError::Missing("no credit card history"))?;
    if interest.months == 0.0 {
        return Err(MetricError::DivisionByZero("interest frequency"));
    }
    let frequency = interest.count as f64 / interest.months;
    let index = params.frequency_interest.digitize(frequency);
    Ok(Measured::new(params.fico_medians.at_mirrored(index)?)?
        .observe("count_charged_interest", interest.count))
}

pub fn credit_length(meta: &PlaidMetadata, params: &PlaidParams) -> MetricResult {
    let credit = credit(meta)?;
    let index = params.duration.digitize(credit.summary.timespan_days as f64);
    Ok(Measured::new(params.fico_medians.at(index)?)?
        .observe("credit_duration_days", credit.summary.timespan_days))
}

pub fn credit_livelihood(meta: &PlaidMetadata, params: &PlaidParams) -> MetricResult {
    let credit = credit(meta)?;
    if credit.summary.avg_monthly_count == 0.0 {
        return Err(MetricError::Missing("no credit card transactions"));
    }
    let index = params
        .count_lively
        .digitize(credit.summary.avg_monthly_count);
    Ok(Measured::new(params.fico_medians.at(index)?)?
        .observe("avg_count_monthly_txn", credit.summary.avg_monthly_count.round() as i64))
}

pub fn velocity_deposits(meta: &PlaidMetadata, params: &PlaidParams) -> MetricResult {
    let payroll = checking(meta)?
        .payroll
        .ok_or(MetricError::Missing("no deposits"))?;
    let m = params.count_zero.digitize(payroll.avg_monthly_count);
    let n = params.volume_deposit.digitize(payroll.avg_monthly_value);
    Ok(Measured::new(params.diversity_velocity.get(m, n)?)?
        .observe("deposits", round2(payroll.avg_monthly_count))
        .observe("deposits_volume", round2(payroll.avg_monthly_value)))
}

pub fn velocity_withdrawals(meta: &PlaidMetadata, params: &PlaidParams) -> MetricResult {
    let expenses = &checking(meta)?.expenses;
    if expenses.is_empty() {
        return Err(MetricError::Missing("no withdrawals"));
    }
    let count: f64 = expenses.values().map(|flow| flow.avg_monthly_count).sum();
    let volume: f64 = expenses.values().map(|flow| flow.avg_monthly_value).sum();
    let m = params.count_zero.digitize(count);
    let n = params.volume_withdraw.digitize(volume);
    Ok(Measured::new(params.diversity_velocity.get(m, n)?)?
        .observe("withdrawals", round2(count))
        .observe("withdrawals_volume", round2(volume)))
}

/// Non-negative months over negative months, capped when nothing was
/// negative. Quiet months with no net flow count on the positive side.
fn flow_direction(flows: &[f64]) -> f64 {
    let positive = flows.iter().filter(|flow| **flow >= 0.0).count();
    let negative = flows.iter().filter(|flow| **flow < 0.0).count();
    if negative == 0 {
        FLOW_DIRECTION_CEILING
    } else {
        positive as f64 / negative as f64
    }
}

pub fn velocity_net_flow(meta: &PlaidMetadata, params: &PlaidParams, months: usize) -> MetricResult {
    let flows = trailing(checking(meta)?.net_flows.clone(), months);
    let magnitudes: Vec<f64> = flows.iter().map(|flow| flow.abs()).collect();
    let magnitude = mean(&magnitudes).ok_or(MetricError::Missing("no consistent net flow"))?;
    let direction = flow_direction(&flows);
    let m = params.flow_ratio.digitize(direction);
    let n = params.volume_flow.digitize(magnitude);
    Ok(Measured::new(params.activity_volume.get(m, n)?)?
        .observe("avg_net_flow", round2(magnitude))
        .observe("flow_direction", round2(direction)))
}

pub fn velocity_slope(meta: &PlaidMetadata, params: &PlaidParams, months: usize) -> MetricResult {
    let flows = trailing(checking(meta)?.net_flows.clone(), months);
    if flows.is_empty() {
        return Err(MetricError::Missing("no consistent net flow"));
    }
    let has_outflow = flows.iter().any(|flow| *flow < 0.0);

    if flows.len() >= SLOPE_FIT_MONTHS || !has_outflow {
        let fitted = slope(&flows).ok_or(MetricError::Missing("not enough net flow history"))?;
        let index = params.slope_lr.digitize(fitted);
        return Ok(Measured::new(params.fico_medians.at(index)?)?
            .observe("slope", round2(fitted)));
    }

    let inflow: f64 = flows.iter().filter(|flow| **flow > 0.0).sum();
    let outflow: f64 = flows.iter().filter(|flow| **flow < 0.0).sum();
    let direction = flow_direction(&flows);
    let mut magnitude = (inflow / outflow).abs();
    if direction < 1.0 {
        magnitude = -magnitude;
    }
    let m = params.slope.digitize(direction);
    let n = params.slope.digitize(magnitude);
    Ok(Measured::new(params.activity_volume.get_transposed(m, n)?)?
        .observe("monthly_flow", round2(magnitude)))
}

pub fn velocity_txn_count(meta: &PlaidMetadata, params: &PlaidParams) -> MetricResult {
    let checking = checking(meta)?;
    let index = params.count_txn.digitize(checking.summary.avg_monthly_count);
    Ok(Measured::new(params.fico_medians.at(index)?)?
        .observe("count_monthly_txn", checking.summary.avg_monthly_count.round() as i64))
}

pub fn stability_balance(meta: &PlaidMetadata, params: &PlaidParams) -> MetricResult {
    if meta.total_balance <= 0.0 {
        return Err(MetricError::Missing("no balance"));
    }
    let index = params.volume_balance.digitize(meta.total_balance);
    Ok(Measured::new(params.fico_medians.at(index)?)?
        .observe("cumulative_current_balance", round2(meta.total_balance)))
}

pub fn stability_running_balance(
    meta: &PlaidMetadata,
    params: &PlaidParams,
    months: usize,
) -> MetricResult {
    let checking = checking(meta)?;
    let balances = trailing(checking.month_end_balances.clone(), months);
    let weighted =
        recency_weighted_mean(&balances).ok_or(MetricError::Missing("no running balance"))?;
    let overdrafts = balances.iter().filter(|balance| **balance < 0.0).count();

    let m = params.duration.digitize(checking.summary.timespan_days as f64);
    let n = params.volume_min.digitize(weighted);
    let score = (params.activity_consistency.get(m, n)? - OVERDRAFT_PENALTY * overdrafts as f64)
        .max(0.0);
    Ok(Measured::new(round2(score))?
        .observe("min_running_balance", round2(weighted))
        .observe("min_running_timeframe", checking.summary.timespan_days)
        .observe("overdraft_months", overdrafts))
}

pub fn diversity_acc_count(meta: &PlaidMetadata, params: &PlaidParams) -> MetricResult {
    let count = meta.account_count();
    if count == 0 {
        return Err(MetricError::Missing("no accounts"));
    }
    let m = params.count_accounts.digitize(count as f64);
    let n = params.duration.digitize(meta.longest_timespan_days() as f64);
    Ok(Measured::new(params.diversity_velocity.get(m, n)?)?.observe("bank_accounts", count))
}

pub fn diversity_profile(meta: &PlaidMetadata, params: &PlaidParams) -> MetricResult {
    let savings = meta.savings.as_ref().map_or(0.0, |savings| savings.current_balance);
    let earnings = meta
        .checking
        .as_ref()
        .map_or(0.0, |checking| checking.investment_earnings);
    let balance = savings + meta.investment_balance + earnings;
    if balance <= 0.0 {
        return Err(MetricError::Missing("no investing nor savings accounts"));
    }
    let index = params.volume_invest.digitize(balance);
    Ok(Measured::new(params.fico_medians.at(index)?)?
        .observe("savings_and_investments", round2(balance)))
}

/// Installments recommended from the longest account history.
pub fn loan_duedate(meta: &PlaidMetadata, params: &PlaidParams) -> Result<i64, MetricError> {
    duedate(meta.longest_timespan_days(), &params.due_date)
}
