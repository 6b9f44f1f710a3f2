use crate::infra::{parse_date, Runtime};
use crate::report::{run_batch, run_score};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use credit_oracle::config::parse_rate;
use credit_oracle::error::AppError;
use credit_oracle::providers::ProviderKind;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "Credit Oracle",
    about = "Score bank, exchange and wallet records from the command line",
    version
)]
struct Cli {
    #[command(flatten)]
    overrides: Overrides,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Score one record file and print the credit report
    Score(ScoreArgs),
    /// Score every row of a CSV manifest and write one summary row each
    Batch(BatchArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct Overrides {
    /// Scoring configuration bundle (defaults to ORACLE_CONFIG_PATH)
    #[arg(long, global = true)]
    pub(crate) config: Option<PathBuf>,
    /// USD to loan unit conversion rate (defaults to ORACLE_USD_RATE)
    #[arg(long, global = true, value_parser = parse_rate)]
    pub(crate) usd_rate: Option<f64>,
    /// Scoring date (YYYY-MM-DD, defaults to today in UTC)
    #[arg(long, global = true, value_parser = parse_date)]
    pub(crate) now: Option<NaiveDate>,
}

#[derive(Args, Debug)]
pub(crate) struct ScoreArgs {
    /// Provider that produced the records: plaid, coinbase or covalent
    pub(crate) provider: ProviderKind,
    /// Provider records as JSON
    #[arg(long)]
    pub(crate) records: PathBuf,
    /// Print a short human-readable summary instead of the JSON report
    #[arg(long)]
    pub(crate) summary: bool,
}

#[derive(Args, Debug)]
pub(crate) struct BatchArgs {
    /// CSV manifest with columns id,provider,records,now
    #[arg(long)]
    pub(crate) manifest: PathBuf,
    /// Write the summary CSV here instead of stdout
    #[arg(long)]
    pub(crate) output: Option<PathBuf>,
}

pub(crate) fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let runtime = Runtime::prepare(cli.overrides)?;

    match cli.command {
        Command::Score(args) => run_score(args, &runtime),
        Command::Batch(args) => run_batch(args, &runtime),
    }
}
