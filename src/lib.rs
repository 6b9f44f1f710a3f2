mod cli;
mod infra;
mod report;

use credit_oracle::error::AppError;

pub use infra::parse_date;

pub fn run() -> Result<(), AppError> {
    cli::run()
}
