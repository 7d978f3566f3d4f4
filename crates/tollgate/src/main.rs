// SPDX-FileCopyrightText: 2026 Tollgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Tollgate - a policy-enforcement gate for priced AI-model calls.
//!
//! This binary is the reference consumer of the decision engine's
//! synchronous contract. Exit codes from `decide` are scriptable:
//! 0 = allowed/substituted, 10 = pending approval, 20 = rejected.

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod approvals;
mod decide;
mod usage;

/// Tollgate - a policy-enforcement gate for priced AI-model calls.
#[derive(Parser, Debug)]
#[command(name = "tollgate", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Decide whether a proposed model run may proceed.
    Decide(decide::DecideArgs),
    /// Inspect and resolve queued approval requests.
    Approvals(approvals::ApprovalsArgs),
    /// Show recorded spend for the current day and month.
    Usage(usage::UsageArgs),
    /// Validate the configuration and report problems.
    Doctor,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Doctor renders config diagnostics itself, before the normal
    // load-or-die path.
    if matches!(cli.command, Commands::Doctor) {
        return run_doctor();
    }

    let config = match tollgate_config::load_and_validate() {
        Ok(config) => config,
        Err(errors) => {
            tollgate_config::render_errors(&errors);
            return ExitCode::FAILURE;
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config.gate.log_level.clone())),
        )
        .with_writer(std::io::stderr)
        .init();

    let result = match cli.command {
        Commands::Decide(args) => decide::run(&config, args).await,
        Commands::Approvals(args) => approvals::run(&config, args).await,
        Commands::Usage(args) => usage::run(&config, args).await,
        Commands::Doctor => unreachable!("handled above"),
    };

    match result {
        Ok(code) => code,
        Err(err) => {
            eprintln!("tollgate: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run_doctor() -> ExitCode {
    match tollgate_config::load_and_validate() {
        Ok(config) => {
            println!(
                "configuration ok: gate `{}`, {} priced model(s), {} blocked entr(ies)",
                config.gate.name,
                config.pricing.models.len(),
                config.model_policy.blocked.len()
            );
            ExitCode::SUCCESS
        }
        Err(errors) => {
            tollgate_config::render_errors(&errors);
            ExitCode::FAILURE
        }
    }
}
