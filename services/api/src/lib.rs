mod cli;
mod commands;
mod infra;
mod routes;
mod server;

use atar_calc::error::AppError;

pub async fn run() -> Result<(), AppError> {
    cli::run().await
}
