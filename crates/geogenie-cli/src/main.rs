//! GeoGenie CLI - Command-line interface
//!
//! Turns a plain-language request into a confirmed geoprocessing run on
//! GeoJSON layers loaded for the invocation.

mod cli;
mod commands;
mod config_loader;
mod errors;
mod interactive;
mod output;
mod output_types;
mod progress;

use clap::Parser;
use cli::Cli;
use output::OutputWriter;
use std::process::ExitCode;

fn main() -> ExitCode {
    // Logs go to stderr so --json output stays parseable
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let output = OutputWriter::new(cli.json);

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(runtime) => runtime,
        Err(e) => {
            output.error(format!("Failed to start async runtime: {}", e));
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(commands::execute(cli, &output)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            let error = errors::from_anyhow(error);
            if output.is_json() {
                output.error(&error);
            } else {
                error.display();
            }
            ExitCode::FAILURE
        }
    }
}
