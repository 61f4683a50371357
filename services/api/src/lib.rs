mod cli;
mod commands;
mod infra;
mod metrics;
mod routes;
mod server;

use healthalliance::error::AppError;

pub async fn run() -> Result<(), AppError> {
    cli::run().await
}
