// SPDX-FileCopyrightText: 2026 Invitrack Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Invitrack - credits Discord members for the approved members they invite.
//!
//! This is the binary entry point.

mod check_config;
mod serve;
mod shutdown;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use invitrack_config::{ConfigError, InvitrackConfig};

/// Invitrack - Discord invite tracker.
#[derive(Parser, Debug)]
#[command(name = "invitrack", version, about, long_about = None)]
struct Cli {
    /// Read configuration from this file instead of the standard locations.
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug, PartialEq, Eq)]
enum Commands {
    /// Connect to Discord and track invites (the default).
    Serve,
    /// Validate the configuration and print the effective values.
    CheckConfig,
}

fn load_config(path: Option<&PathBuf>) -> Result<InvitrackConfig, Vec<ConfigError>> {
    match path {
        Some(path) => invitrack_config::load_and_validate_path(path),
        None => invitrack_config::load_and_validate(),
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match load_config(cli.config.as_ref()) {
        Ok(config) => config,
        Err(errors) => {
            invitrack_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => {
            if let Err(e) = serve::run_serve(config).await {
                eprintln!("error: {e}");
                std::process::exit(1);
            }
        }
        Commands::CheckConfig => match check_config::report(&config) {
            Ok(report) => print!("{report}"),
            Err(e) => {
                eprintln!("error: {e}");
                std::process::exit(1);
            }
        },
    }
}
