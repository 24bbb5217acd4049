//! appsearch - Mac App Store search for Alfred
//!
//! Prints an Alfred Script Filter document whose icons point at locally cached
//! app artwork.

use std::process::ExitCode;

use clap::Parser;
use tracing::error;

use appsearch::app;
use appsearch::cli::{Cli, RunConfig};
use appsearch::{logging, signal};

/// Parses arguments, runs the search and returns the JSON document
async fn run(cli: &Cli) -> Result<String, Box<dyn std::error::Error>> {
    let config = RunConfig::from_cli(cli)?;
    let cancel = signal::shutdown_token();
    let feedback = app::run(&config, &cancel).await?;
    Ok(feedback.to_json()?)
}

#[tokio::main]
async fn main() -> ExitCode {
    logging::init();

    let cli = Cli::parse();
    match run(&cli).await {
        Ok(json) => {
            // Nothing reaches stdout unless the whole batch succeeded
            println!("{}", json);
            ExitCode::SUCCESS
        }
        Err(err) => {
            error!(error = %err, "fatal error");
            ExitCode::FAILURE
        }
    }
}
