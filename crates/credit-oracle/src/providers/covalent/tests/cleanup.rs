use super::common::*;
use crate::providers::covalent::cleanup::NOT_USD;
use crate::providers::covalent::{
    purge_portfolio, swiffer_duster, top_erc_balances, top_erc_portfolio,
};
use crate::scoring::MetricError;

#[test]
fn duster_drops_reverted_and_zero_value_transactions() {
    let records = records();
    let dusted = swiffer_duster(&records.transactions).expect("quoted in USD");
    assert_eq!(records.transactions.items.len(), 36);
    assert_eq!(dusted.items.len(), 34);
    assert!(dusted
        .items
        .iter()
        .all(|txn| txn.successful && txn.value_quote > 0.0));
    assert_eq!(swiffer_duster(&dusted), Ok(dusted));
}

#[test]
fn duster_rejects_non_usd_quotes() {
    let mut records = records();
    records.transactions.quote_currency = "EUR".to_string();
    assert_eq!(
        swiffer_duster(&records.transactions),
        Err(MetricError::Invalid(NOT_USD))
    );
}

#[test]
fn purge_drops_tokens_that_never_carried_value() {
    let purged = purge_portfolio(&records().portfolio).expect("quoted in USD");
    let symbols: Vec<&str> = purged
        .items
        .iter()
        .map(|token| token.contract_ticker_symbol.as_str())
        .collect();
    assert_eq!(symbols, vec!["ETH", "USDC"]);
}

#[test]
fn unranked_tokens_are_filtered_out() {
    let records = records();
    let ranks = erc_rank();
    let balances = top_erc_balances(&records.balances, &ranks);
    assert_eq!(balances.items.len(), 2);
    assert!(balances
        .items
        .iter()
        .all(|token| ranks.contains_key(&token.contract_ticker_symbol)));

    let portfolio = top_erc_portfolio(&records.portfolio, &ranks);
    assert!(portfolio
        .items
        .iter()
        .all(|token| token.contract_ticker_symbol != "JUNK"));
}

#[test]
fn params_are_a_pure_function_of_config() {
    let first = params();
    assert_eq!(first, params());
    let expected = [0.18, 0.49, 0.71];
    assert_eq!(first.dust_ratio.edges().len(), expected.len());
    for (edge, want) in first.dust_ratio.edges().iter().zip(expected) {
        assert!((edge - want).abs() < 1e-9, "{edge} != {want}");
    }
    assert_eq!(first.volume_now.edges(), &[1000.0, 5000.0, 10000.0]);
}
