use crate::cli::{BatchArgs, ScoreArgs};
use crate::infra::Runtime;
use credit_oracle::batch::{self, read_manifest, write_summaries};
use credit_oracle::error::AppError;
use credit_oracle::providers::coinbase::CoinbaseRecords;
use credit_oracle::providers::covalent::CovalentBundle;
use credit_oracle::providers::plaid::PlaidRecords;
use credit_oracle::providers::{load_records, CreditReport, ProviderKind};
use credit_oracle::scoring::ProviderFeedback;
use serde::Serialize;
use std::fs::File;
use std::io;
use tracing::info;

pub(crate) fn run_score(args: ScoreArgs, runtime: &Runtime) -> Result<(), AppError> {
    let ScoreArgs {
        provider,
        records,
        summary,
    } = args;
    let Runtime { engine, rates, now } = runtime;

    let rendered = match provider {
        ProviderKind::Plaid => {
            let records: PlaidRecords = load_records(&records)?;
            render(&engine.report_plaid(&records, *now, rates)?, summary)?
        }
        ProviderKind::Coinbase => {
            let records: CoinbaseRecords = load_records(&records)?;
            render(&engine.report_coinbase(&records, *now, rates)?, summary)?
        }
        ProviderKind::Covalent => {
            let bundle: CovalentBundle = load_records(&records)?;
            render(
                &engine.report_covalent(&bundle.records, &bundle.erc_rank, *now, rates)?,
                summary,
            )?
        }
    };
    println!("{rendered}");
    Ok(())
}

pub(crate) fn run_batch(args: BatchArgs, runtime: &Runtime) -> Result<(), AppError> {
    let entries = read_manifest(File::open(&args.manifest)?)?;
    let rows = batch::run_batch(&runtime.engine, &entries, runtime.now, &runtime.rates);

    match args.output {
        Some(path) => write_summaries(File::create(path)?, &rows)?,
        None => write_summaries(io::stdout().lock(), &rows)?,
    }

    let failed = rows.iter().filter(|row| row.score.is_none()).count();
    info!(rows = rows.len(), failed, "batch finished");
    Ok(())
}

fn render<F>(report: &CreditReport<F>, summary: bool) -> Result<String, AppError>
where
    F: ProviderFeedback + Serialize,
{
    if !summary {
        return Ok(serde_json::to_string_pretty(report)?);
    }

    let score = &report.interpretation.score;
    let mut lines = vec![
        format!("Provider: {}", report.provider),
        format!("Score: {} ({})", score.points, score.quality),
    ];
    match report.risk {
        Some(risk) => lines.push(format!(
            "Risk: {}, loan up to {}",
            risk.risk_level.as_str(),
            risk.loan_amount
        )),
        None => lines.push("Risk: not qualified".to_string()),
    }
    if let Some(installments) = score.loan_duedate {
        lines.push(format!("Pay back: {installments} monthly installments"));
    }
    lines.push(String::new());
    lines.push(report.message.clone());

    let errors = report.errors();
    if !errors.is_empty() {
        lines.push(String::new());
        lines.push("Metric errors".to_string());
        lines.extend(errors.into_iter().map(|error| format!("- {error}")));
    }
    Ok(lines.join("\n"))
}
