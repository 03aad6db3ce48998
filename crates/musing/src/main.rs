// SPDX-FileCopyrightText: 2026 Musing Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Musing - a tiny service that thinks out loud.
//!
//! This is the binary entry point for the Musing server and its operator CLI.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

mod check;
mod history;
mod serve;

use clap::{Parser, Subcommand};

/// Musing - a tiny service that thinks out loud.
#[derive(Parser, Debug)]
#[command(name = "musing", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the HTTP server.
    Serve,
    /// Print items from the timeline, newest first.
    History {
        /// Number of items to show.
        #[arg(long, default_value_t = 20)]
        limit: usize,
        /// Number of newest items to skip.
        #[arg(long, default_value_t = 0)]
        offset: usize,
        /// Output JSON instead of text.
        #[arg(long)]
        json: bool,
    },
    /// Validate configuration and check the store and provider settings.
    Check {
        /// Disable colored output.
        #[arg(long)]
        plain: bool,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match musing_config::load_and_validate() {
        Ok(config) => config,
        Err(errors) => {
            musing_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    let result = match cli.command {
        Some(Commands::Serve) => serve::run_serve(config).await,
        Some(Commands::History {
            limit,
            offset,
            json,
        }) => history::run_history(&config, limit, offset, json).await,
        Some(Commands::Check { plain }) => check::run_check(&config, plain).await,
        None => {
            println!("musing: use --help for available commands");
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
