// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Courier - a multi-tenant messaging gateway.
//!
//! This is the binary entry point for the Courier server.

use clap::{Parser, Subcommand};

mod control;
mod loopback;
mod serve;
mod shutdown;

/// Courier - a multi-tenant messaging gateway.
#[derive(Parser, Debug)]
#[command(name = "courier", version, about, long_about = None)]
struct Cli {
    /// Path to an explicit config file (defaults to the XDG hierarchy).
    #[arg(long, global = true)]
    config: Option<std::path::PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the gateway: session manager, executors, and control API.
    Serve,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(errors) => {
            for error in &errors {
                eprintln!("courier: config error: {error}");
            }
            std::process::exit(1);
        }
    };

    match cli.command {
        Some(Commands::Serve) => {
            if let Err(e) = serve::run_serve(config).await {
                eprintln!("courier: {e}");
                std::process::exit(1);
            }
        }
        None => {
            println!("courier: use --help for available commands");
        }
    }
}

fn load_config(
    path: Option<&std::path::Path>,
) -> Result<courier_config::CourierConfig, Vec<String>> {
    match path {
        Some(path) => {
            let config = courier_config::load_config_from_path(path)
                .map_err(|e| e.into_iter().map(|e| e.to_string()).collect::<Vec<_>>())?;
            courier_config::validation::validate_config(&config)?;
            Ok(config)
        }
        None => courier_config::load_and_validate(),
    }
}
