// SPDX-FileCopyrightText: 2026 Edubridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Edubridge - keeps EduPage portal sessions alive for stored accounts.
//!
//! This is the binary entry point.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use edubridge::fetch::{FetchRequest, FetchTarget, run_fetch};
use edubridge::serve::{init_tracing, run_serve};
use edubridge_config::EdubridgeConfig;
use edubridge_core::PortalError;
use tracing::error;

/// Edubridge - EduPage portal session bridge.
#[derive(Parser, Debug)]
#[command(name = "edubridge", version, about, long_about = None)]
struct Cli {
    /// Read configuration from this file instead of the XDG hierarchy.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Restore stored sessions and keep them alive until stopped.
    Serve,
    /// Log in once and print a snapshot as JSON.
    Fetch {
        #[arg(value_enum)]
        target: FetchTarget,
        /// School subdomain (`myschool`) or full portal host.
        #[arg(long)]
        server: String,
        #[arg(long)]
        username: String,
        /// Store the account so `serve` restores it.
        #[arg(long)]
        remember: bool,
    },
    /// Validate configuration and print the effective values.
    Config,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let loaded = match &cli.config {
        Some(path) => edubridge_config::load_and_validate_path(path),
        None => edubridge_config::load_and_validate(),
    };
    let config = match loaded {
        Ok(config) => config,
        Err(errors) => {
            edubridge_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    let result = match cli.command {
        Some(Commands::Serve) => {
            init_tracing(&config.logging);
            run_serve(config).await
        }
        Some(Commands::Fetch {
            target,
            server,
            username,
            remember,
        }) => {
            init_tracing(&config.logging);
            let request = FetchRequest {
                target,
                server,
                username,
                remember,
            };
            run_fetch(&config, &request).await
        }
        Some(Commands::Config) => print_config(&config),
        None => {
            println!("edubridge: use --help for available commands");
            Ok(())
        }
    };

    if let Err(e) = result {
        error!(kind = e.kind(), error = %e, "command failed");
        eprintln!("edubridge: {} error: {}", e.kind(), e.chain_message());
        std::process::exit(1);
    }
}

fn print_config(config: &EdubridgeConfig) -> Result<(), PortalError> {
    let rendered = toml::to_string_pretty(config)
        .map_err(|e| PortalError::Config(format!("failed to render configuration: {e}")))?;
    println!("{rendered}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    #[cfg(not(target_env = "msvc"))]
    fn jemalloc_is_active() {
        use tikv_jemalloc_ctl::{epoch, stats};
        epoch::advance().unwrap();
        let allocated = stats::allocated::read().unwrap();
        assert!(allocated > 0, "jemalloc should report non-zero allocation");
    }

    #[test]
    fn cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn fetch_arguments_parse() {
        let cli = Cli::try_parse_from([
            "edubridge", "fetch", "timeline", "--server", "myschool", "--username", "jana",
        ])
        .unwrap();
        match cli.command {
            Some(Commands::Fetch {
                target, remember, ..
            }) => {
                assert_eq!(target, FetchTarget::Timeline);
                assert!(!remember);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn default_config_renders_as_toml() {
        print_config(&EdubridgeConfig::default()).unwrap();
    }
}
