// Copyright 2025
// Licensed under the Elastic License v2.0

#![warn(clippy::all)]

mod cli;
mod config;
mod datasets;
mod encode;
mod engine;
mod error;
mod fetch;
mod loader;
mod parser;
mod schema;

use clap::Parser;
use dotenvy::dotenv;

use crate::cli::Cli;
use crate::config::Config;
use crate::engine::Engine;
use crate::error::EtlError;

#[tokio::main]
async fn main() {
    dotenv().ok();
    let cli = Cli::parse();

    // RUST_LOG wins over --log-level
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&cli.log_level)),
        )
        .init();

    let config = match Config::resolve(cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}", render_error(&e));
            std::process::exit(exit_code(&e));
        }
    };
    config.print_banner();

    match Engine::new(config).run().await {
        Ok(summary) => {
            print!("{}", engine::format_summary(&summary));
        }
        Err(e) => {
            // the last line of output is the error kind and message; the
            // full chain lives in the audit row
            eprintln!("{}", render_error(&e));
            std::process::exit(exit_code(&e));
        }
    }
}

fn exit_code(err: &anyhow::Error) -> i32 {
    err.downcast_ref::<EtlError>()
        .map(EtlError::exit_code)
        .unwrap_or(1)
}

fn render_error(err: &anyhow::Error) -> String {
    match err.downcast_ref::<EtlError>() {
        Some(etl) => etl.to_string(),
        None => format!("error: {:#}", err),
    }
}
