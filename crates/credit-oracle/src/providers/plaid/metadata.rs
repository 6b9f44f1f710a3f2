use std::collections::BTreeMap;

use chrono::NaiveDate;

use super::records::{AccountGroup, PlaidAccount, PlaidRecords, PlaidTransaction};
use crate::scoring::timeline::{mean, month_end_balances, monthly_buckets, MonthBucket};

const INTERNAL_TRANSFER: &str = "Internal Account Transfer";
const PAYROLL: &str = "Payroll";
const INTEREST_CHARGED: &str = "Interest Charged";
const INVESTMENTS: &str = "Financial Planning and Investments";
const INTEREST_LOOKBACK_DAYS: i64 = 730;
const INTEREST_LOOKBACK_MONTHS: f64 = 24.0;
const MIN_FLOW_AMOUNT: f64 = 5.0;
const MIN_EXPENSE_AMOUNT: f64 = 15.0;

/// Recurring expense labels and the feedback key each one reports under.
pub const EXPENSES: &[(&str, &str)] = &[
    ("rent", "Rent"),
    ("insurance", "Insurance"),
    ("utilities", "Utilities"),
    ("loans_mortgages", "Loans and Mortgages"),
    ("subscription", "Subscription"),
];

#[derive(Debug, Clone, PartialEq)]
pub struct GroupSummary {
    pub account_count: usize,
    pub current_balance: f64,
    pub timespan_days: i64,
    pub avg_monthly_count: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BestCard {
    pub account_id: String,
    pub limit: f64,
    pub txn_count: usize,
    pub age_days: i64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Utilization {
    pub months: usize,
    pub avg_ratio: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InterestCharges {
    pub count: usize,
    pub months: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CreditMetadata {
    pub summary: GroupSummary,
    pub card_names: Vec<String>,
    pub total_limit: f64,
    pub best_card: Option<BestCard>,
    pub utilization: Option<Utilization>,
    pub interest: Option<InterestCharges>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlowSummary {
    pub avg_monthly_count: f64,
    pub avg_monthly_value: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CheckingMetadata {
    pub summary: GroupSummary,
    /// Monthly net inflow for complete months, oldest first.
    pub net_flows: Vec<f64>,
    /// Month-end balance for complete months, oldest first.
    pub month_end_balances: Vec<f64>,
    pub payroll: Option<FlowSummary>,
    pub expenses: BTreeMap<&'static str, FlowSummary>,
    pub investment_earnings: f64,
}

/// Per-group aggregates computed once and shared by every Plaid metric.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaidMetadata {
    pub credit: Option<CreditMetadata>,
    pub checking: Option<CheckingMetadata>,
    pub savings: Option<GroupSummary>,
    pub total_balance: f64,
    pub investment_balance: f64,
}

impl PlaidMetadata {
    pub fn build(records: &PlaidRecords, now: NaiveDate) -> Self {
        let transactions = settled(records);
        let (cards, card_txns) = in_group(records, &transactions, AccountGroup::CreditCard);
        let (checking, checking_txns) = in_group(records, &transactions, AccountGroup::Checking);
        let (savings, savings_txns) = in_group(records, &transactions, AccountGroup::Savings);

        let total_balance = records
            .accounts
            .iter()
            .map(|account| {
                if account.is_depository() {
                    account.balances.current.unwrap_or(0.0)
                } else {
                    account.balances.available.unwrap_or(0.0)
                }
            })
            .sum();
        let investment_balance = records
            .accounts
            .iter()
            .filter(|account| account.is_investment())
            .filter_map(|account| account.balances.current)
            .sum();

        Self {
            credit: (!cards.is_empty()).then(|| credit_metadata(&cards, &card_txns, now)),
            checking: (!checking.is_empty())
                .then(|| checking_metadata(&checking, &checking_txns, now)),
            savings: (!savings.is_empty()).then(|| summarize(&savings, &savings_txns, now)),
            total_balance,
            investment_balance,
        }
    }

    pub fn account_count(&self) -> usize {
        self.credit.as_ref().map_or(0, |credit| credit.summary.account_count)
            + self
                .checking
                .as_ref()
                .map_or(0, |checking| checking.summary.account_count)
            + self.savings.as_ref().map_or(0, |savings| savings.account_count)
    }

    pub fn longest_timespan_days(&self) -> i64 {
        [
            self.credit.as_ref().map(|credit| credit.summary.timespan_days),
            self.checking
                .as_ref()
                .map(|checking| checking.summary.timespan_days),
            self.savings.as_ref().map(|savings| savings.timespan_days),
        ]
        .into_iter()
        .flatten()
        .max()
        .unwrap_or(0)
    }
}

/// Posted transactions, oldest first.
pub fn settled(records: &PlaidRecords) -> Vec<&PlaidTransaction> {
    let mut transactions: Vec<&PlaidTransaction> = records
        .transactions
        .iter()
        .filter(|txn| !txn.pending)
        .collect();
    transactions.sort_by_key(|txn| txn.date);
    transactions
}

fn in_group<'r>(
    records: &'r PlaidRecords,
    transactions: &[&'r PlaidTransaction],
    group: AccountGroup,
) -> (Vec<&'r PlaidAccount>, Vec<&'r PlaidTransaction>) {
    let accounts: Vec<&PlaidAccount> = records
        .accounts
        .iter()
        .filter(|account| account.group() == Some(group))
        .collect();
    let txns = transactions
        .iter()
        .copied()
        .filter(|txn| {
            accounts
                .iter()
                .any(|account| account.account_id == txn.account_id)
        })
        .collect();
    (accounts, txns)
}

fn age_days(txns: &[&PlaidTransaction], now: NaiveDate) -> i64 {
    txns.iter()
        .map(|txn| txn.date)
        .min()
        .map_or(0, |oldest| (now - oldest).num_days().max(0))
}

fn avg_count(buckets: &[MonthBucket]) -> f64 {
    let counts: Vec<f64> = buckets.iter().map(|bucket| bucket.count as f64).collect();
    mean(&counts).unwrap_or(0.0)
}

fn summarize(
    accounts: &[&PlaidAccount],
    txns: &[&PlaidTransaction],
    now: NaiveDate,
) -> GroupSummary {
    let buckets = monthly_buckets(txns.iter().map(|txn| (txn.date, txn.amount)), now);
    GroupSummary {
        account_count: accounts.len(),
        current_balance: accounts
            .iter()
            .filter_map(|account| account.balances.current)
            .sum(),
        timespan_days: age_days(txns, now),
        avg_monthly_count: avg_count(&buckets),
    }
}

fn flow_summary<I>(txns: I, now: NaiveDate) -> Option<FlowSummary>
where
    I: IntoIterator<Item = (NaiveDate, f64)>,
{
    let buckets = monthly_buckets(txns, now);
    let totals: Vec<f64> = buckets.iter().map(|bucket| bucket.total).collect();
    Some(FlowSummary {
        avg_monthly_count: avg_count(&buckets),
        avg_monthly_value: mean(&totals)?,
    })
}

/// Lowercased card name with the word "credit" dropped.
fn card_name(account: &PlaidAccount) -> Option<String> {
    let name = account.display_name()?;
    let cleaned: Vec<&str> = name
        .split_whitespace()
        .filter(|word| !word.eq_ignore_ascii_case("credit"))
        .collect();
    Some(cleaned.join(" ").to_lowercase())
}

fn best_card(
    cards: &[&PlaidAccount],
    txns: &[&PlaidTransaction],
    now: NaiveDate,
) -> Option<BestCard> {
    let mut best: Option<(f64, BestCard)> = None;
    for card in cards {
        let own: Vec<&PlaidTransaction> = txns
            .iter()
            .copied()
            .filter(|txn| txn.account_id == card.account_id)
            .collect();
        let candidate = BestCard {
            account_id: card.account_id.clone(),
            limit: card.balances.limit.unwrap_or(0.0),
            txn_count: own.len(),
            age_days: age_days(&own, now),
        };
        let merit =
            candidate.limit + candidate.txn_count as f64 * 10.0 + candidate.age_days as f64 * 3.0;
        if best.as_ref().map_or(true, |(top, _)| merit > *top) {
            best = Some((merit, candidate));
        }
    }
    best.map(|(_, card)| card)
}

fn credit_metadata(
    cards: &[&PlaidAccount],
    txns: &[&PlaidTransaction],
    now: NaiveDate,
) -> CreditMetadata {
    let best = best_card(cards, txns, now);

    let (utilization, interest) = match &best {
        Some(card) => {
            let own: Vec<&PlaidTransaction> = txns
                .iter()
                .copied()
                .filter(|txn| txn.account_id == card.account_id)
                .collect();
            (utilization(card, &own, now), interest(card, &own, now))
        }
        None => (None, None),
    };

    CreditMetadata {
        summary: summarize(cards, txns, now),
        card_names: cards.iter().filter_map(|card| card_name(card)).collect(),
        total_limit: cards
            .iter()
            .filter_map(|card| card.balances.limit)
            .sum(),
        best_card: best,
        utilization,
        interest,
    }
}

fn utilization(card: &BestCard, txns: &[&PlaidTransaction], now: NaiveDate) -> Option<Utilization> {
    if card.limit <= 0.0 {
        return None;
    }
    let purchases = monthly_buckets(
        txns.iter()
            .filter(|txn| txn.amount > 0.0)
            .map(|txn| (txn.date, txn.amount)),
        now,
    );
    let ratios: Vec<f64> = purchases
        .iter()
        .map(|bucket| bucket.total / card.limit)
        .collect();
    Some(Utilization {
        months: ratios.len(),
        avg_ratio: mean(&ratios)?,
    })
}

fn interest(card: &BestCard, txns: &[&PlaidTransaction], now: NaiveDate) -> Option<InterestCharges> {
    if txns.is_empty() {
        return None;
    }
    let count = txns
        .iter()
        .filter(|txn| (now - txn.date).num_days() <= INTEREST_LOOKBACK_DAYS)
        .filter(|txn| txn.has_category(INTEREST_CHARGED))
        .count();
    let months = (card.age_days as f64 / 30.0)
        .round()
        .min(INTEREST_LOOKBACK_MONTHS);
    Some(InterestCharges { count, months })
}

fn checking_metadata(
    accounts: &[&PlaidAccount],
    txns: &[&PlaidTransaction],
    now: NaiveDate,
) -> CheckingMetadata {
    let summary = summarize(accounts, txns, now);

    let net_flows = monthly_buckets(
        txns.iter()
            .filter(|txn| txn.amount.abs() > MIN_FLOW_AMOUNT)
            .filter(|txn| !txn.has_category(INTERNAL_TRANSFER))
            .map(|txn| (txn.date, -txn.amount)),
        now,
    )
    .into_iter()
    .map(|bucket| bucket.total)
    .collect();

    let balances = month_end_balances(
        summary.current_balance,
        txns.iter().map(|txn| (txn.date, -txn.amount)),
        now,
    );

    let payroll = flow_summary(
        txns.iter()
            .filter(|txn| txn.amount < 0.0 && txn.has_category(PAYROLL))
            .map(|txn| (txn.date, -txn.amount)),
        now,
    );

    let expenses = EXPENSES
        .iter()
        .filter_map(|(key, label)| {
            flow_summary(
                txns.iter()
                    .filter(|txn| txn.amount > MIN_EXPENSE_AMOUNT && txn.has_category(label))
                    .map(|txn| (txn.date, txn.amount)),
                now,
            )
            .map(|summary| (*key, summary))
        })
        .collect();

    let investment_earnings = txns
        .iter()
        .filter(|txn| txn.amount < 0.0 && txn.has_category(INVESTMENTS))
        .map(|txn| -txn.amount)
        .sum();

    CheckingMetadata {
        summary,
        net_flows,
        month_end_balances: balances,
        payroll,
        expenses,
        investment_earnings,
    }
}
