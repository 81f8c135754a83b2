mod cli;
mod infra;
mod report;
mod routes;
mod server;

use allocation_curator::error::AppError;

pub async fn run() -> Result<(), AppError> {
    cli::run().await
}
