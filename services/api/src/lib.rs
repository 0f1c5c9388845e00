mod cli;
mod demo;
mod infra;
mod report;
mod routes;
mod server;

use gc_screening::error::AppError;

pub async fn run() -> Result<(), AppError> {
    cli::run().await
}
