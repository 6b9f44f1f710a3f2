use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate};

/// Calendar month used as a bucket key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MonthKey {
    pub year: i32,
    pub month: u32,
}

impl MonthKey {
    pub fn of(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    pub fn next(self) -> Self {
        if self.month == 12 {
            Self {
                year: self.year + 1,
                month: 1,
            }
        } else {
            Self {
                year: self.year,
                month: self.month + 1,
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MonthBucket {
    pub month: MonthKey,
    pub count: usize,
    pub total: f64,
}

/// Contiguous monthly buckets from the first entry's month up to the month
/// before `now`. Months without entries are zero-filled.
pub fn monthly_buckets<I>(entries: I, now: NaiveDate) -> Vec<MonthBucket>
where
    I: IntoIterator<Item = (NaiveDate, f64)>,
{
    let current = MonthKey::of(now);
    let mut grouped: BTreeMap<MonthKey, (usize, f64)> = BTreeMap::new();
    for (date, amount) in entries {
        let key = MonthKey::of(date);
        if key >= current {
            continue;
        }
        let slot = grouped.entry(key).or_insert((0, 0.0));
        slot.0 += 1;
        slot.1 += amount;
    }

    let Some(first) = grouped.keys().next().copied() else {
        return Vec::new();
    };

    let mut buckets = Vec::new();
    let mut month = first;
    while month < current {
        let (count, total) = grouped.get(&month).copied().unwrap_or((0, 0.0));
        buckets.push(MonthBucket {
            month,
            count,
            total,
        });
        month = month.next();
    }
    buckets
}

/// Keep at most the last `months` buckets.
pub fn trailing<T>(mut values: Vec<T>, months: usize) -> Vec<T> {
    if values.len() > months {
        values.drain(..values.len() - months);
    }
    values
}

/// Month-end balances for every complete month, oldest first.
///
/// `flows` are signed balance changes; balances are rebuilt backwards from
/// `current_balance`, which holds as of `now`.
pub fn month_end_balances<I>(current_balance: f64, flows: I, now: NaiveDate) -> Vec<f64>
where
    I: IntoIterator<Item = (NaiveDate, f64)>,
{
    let current = MonthKey::of(now);
    let mut per_month: BTreeMap<MonthKey, f64> = BTreeMap::new();
    for (date, amount) in flows {
        if date > now {
            continue;
        }
        *per_month.entry(MonthKey::of(date)).or_insert(0.0) += amount;
    }

    let Some(first) = per_month.keys().next().copied() else {
        return Vec::new();
    };

    let mut months = Vec::new();
    let mut month = first;
    while month < current {
        months.push(month);
        month = month.next();
    }

    let mut balance = current_balance - per_month.get(&current).copied().unwrap_or(0.0);
    let mut balances = Vec::with_capacity(months.len());
    for month in months.iter().rev() {
        balances.push(balance);
        balance -= per_month.get(month).copied().unwrap_or(0.0);
    }
    balances.reverse();
    balances
}

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

/// Least-squares slope of `values` against their index.
pub fn slope(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let n = values.len() as f64;
    let x_mean = (n - 1.0) / 2.0;
    let y_mean = values.iter().sum::<f64>() / n;
    let (covariance, variance) = values.iter().enumerate().fold(
        (0.0, 0.0),
        |(covariance, variance), (index, value)| {
            let dx = index as f64 - x_mean;
            (covariance + dx * (value - y_mean), variance + dx * dx)
        },
    );
    Some(covariance / variance)
}

/// `n` evenly spaced values from `start` to `end` inclusive.
pub fn linspace(start: f64, end: f64, n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (end - start) / (n - 1) as f64;
            (0..n).map(|index| start + step * index as f64).collect()
        }
    }
}

/// Average of `values` (oldest first) with linearly increasing weights, so
/// the latest value weighs the most.
pub fn recency_weighted_mean(values: &[f64]) -> Option<f64> {
    let weights = linspace(0.01, 1.0, values.len());
    let total: f64 = weights.iter().sum();
    if total == 0.0 {
        return None;
    }
    Some(
        values
            .iter()
            .zip(&weights)
            .map(|(value, weight)| value * weight)
            .sum::<f64>()
            / total,
    )
}
