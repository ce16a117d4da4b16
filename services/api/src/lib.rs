mod cli;
mod demo;
mod infra;
mod routes;
mod server;

use labour_mobility::error::AppError;

pub async fn run() -> Result<(), AppError> {
    cli::run().await
}
