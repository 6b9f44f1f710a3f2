//! Manifest-driven scoring of many borrowers in one run.

use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::providers::coinbase::CoinbaseRecords;
use crate::providers::covalent::CovalentBundle;
use crate::providers::plaid::PlaidRecords;
use crate::providers::{load_records, CreditReport, OracleEngine, ProviderKind};
use crate::scoring::{ProviderFeedback, RateSource, RiskLevel};

/// One manifest row: who to score, from which provider, against which file.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct BatchEntry {
    pub id: String,
    pub provider: String,
    pub records: PathBuf,
    #[serde(default)]
    pub now: Option<NaiveDate>,
}

/// One output row per manifest entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchSummary {
    pub id: String,
    pub provider: String,
    pub score: Option<i64>,
    pub risk_level: Option<RiskLevel>,
    pub loan_amount: Option<u64>,
    pub quality: Option<String>,
    pub errors: String,
}

impl BatchSummary {
    pub fn from_report<F: ProviderFeedback>(id: &str, report: &CreditReport<F>) -> Self {
        let mut errors: Vec<String> = report
            .feedback
            .disqualified()
            .then(|| "disqualified".to_string())
            .into_iter()
            .collect();
        errors.extend(report.errors());
        Self {
            id: id.to_string(),
            provider: report.provider.to_string(),
            score: Some(report.score as i64),
            risk_level: report.risk.map(|risk| risk.risk_level),
            loan_amount: report.interpretation.score.loan_amount,
            quality: Some(report.interpretation.score.quality.clone()),
            errors: errors.join("; "),
        }
    }

    pub fn failed(entry: &BatchEntry, message: impl Into<String>) -> Self {
        Self {
            id: entry.id.clone(),
            provider: entry.provider.clone(),
            score: None,
            risk_level: None,
            loan_amount: None,
            quality: None,
            errors: message.into(),
        }
    }
}

pub fn read_manifest<R: Read>(reader: R) -> Result<Vec<BatchEntry>, csv::Error> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    csv_reader.deserialize().collect()
}

pub fn write_summaries<W: Write>(writer: W, rows: &[BatchSummary]) -> Result<(), csv::Error> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    for row in rows {
        csv_writer.serialize(row)?;
    }
    csv_writer.flush()?;
    Ok(())
}

/// Score every entry. A failing entry yields a row carrying its error text.
pub fn run_batch(
    engine: &OracleEngine,
    entries: &[BatchEntry],
    default_now: NaiveDate,
    rates: &dyn RateSource,
) -> Vec<BatchSummary> {
    entries
        .iter()
        .map(|entry| {
            run_entry(engine, entry, default_now, rates).unwrap_or_else(|message| {
                warn!(id = %entry.id, provider = %entry.provider, %message, "batch entry failed");
                BatchSummary::failed(entry, message)
            })
        })
        .collect()
}

fn run_entry(
    engine: &OracleEngine,
    entry: &BatchEntry,
    default_now: NaiveDate,
    rates: &dyn RateSource,
) -> Result<BatchSummary, String> {
    let kind: ProviderKind = entry.provider.parse().map_err(|err| format!("{err}"))?;
    let now = entry.now.unwrap_or(default_now);
    let path = entry.records.as_path();
    match kind {
        ProviderKind::Plaid => {
            let records: PlaidRecords = load(path)?;
            let report = engine
                .report_plaid(&records, now, rates)
                .map_err(|err| err.to_string())?;
            Ok(BatchSummary::from_report(&entry.id, &report))
        }
        ProviderKind::Coinbase => {
            let records: CoinbaseRecords = load(path)?;
            let report = engine
                .report_coinbase(&records, now, rates)
                .map_err(|err| err.to_string())?;
            Ok(BatchSummary::from_report(&entry.id, &report))
        }
        ProviderKind::Covalent => {
            let bundle: CovalentBundle = load(path)?;
            let report = engine
                .report_covalent(&bundle.records, &bundle.erc_rank, now, rates)
                .map_err(|err| err.to_string())?;
            Ok(BatchSummary::from_report(&entry.id, &report))
        }
    }
}

fn load<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, String> {
    load_records(path).map_err(|err| err.to_string())
}
