// SPDX-FileCopyrightText: 2026 Tollgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `tollgate decide` command implementation.
//!
//! Runs one decision against the configured policy and persisted ledger,
//! prints the outcome, and exits with a scriptable status code so shell
//! pipelines can gate on the result without parsing output.

use std::io::IsTerminal;
use std::process::ExitCode;
use std::sync::Arc;

use chrono::Utc;
use clap::Args;
use colored::Colorize;
use tollgate_approvals::ApprovalQueue;
use tollgate_config::TollgateConfig;
use tollgate_core::{RunRequest, TollgateError};
use tollgate_cost::{HeuristicEstimator, TiktokenEstimator, TokenEstimator, UsageLedger};
use tollgate_engine::{DecisionEngine, DecisionOutcome};
use tollgate_policy::SharedPolicy;
use tollgate_storage::Database;

/// Arguments for `tollgate decide`.
#[derive(Args, Debug)]
pub struct DecideArgs {
    /// Agent identity making the request.
    #[arg(long)]
    pub agent: String,

    /// Model the agent wants to use.
    #[arg(long)]
    pub model: String,

    /// Prompt text. Mutually exclusive with --prompt-file.
    #[arg(long, conflicts_with = "prompt_file")]
    pub prompt: Option<String>,

    /// Read the prompt from a file.
    #[arg(long)]
    pub prompt_file: Option<String>,

    /// Declared output budget in tokens (0 = let the estimator pick).
    #[arg(long, default_value_t = 0)]
    pub max_output_tokens: u32,

    /// Insist on the requested model; over the soft threshold this queues
    /// for approval instead of substituting.
    #[arg(long)]
    pub premium: bool,

    /// Count prompt tokens with the exact cl100k tokenizer instead of the
    /// character heuristic.
    #[arg(long)]
    pub exact_tokens: bool,

    /// Emit the outcome as JSON.
    #[arg(long)]
    pub json: bool,

    /// Disable colored output.
    #[arg(long)]
    pub plain: bool,
}

/// Run the `tollgate decide` command.
pub async fn run(config: &TollgateConfig, args: DecideArgs) -> Result<ExitCode, TollgateError> {
    let prompt_text = match (&args.prompt, &args.prompt_file) {
        (Some(prompt), _) => prompt.clone(),
        (None, Some(path)) => std::fs::read_to_string(path).map_err(|e| {
            TollgateError::Internal(format!("failed to read prompt file `{path}`: {e}"))
        })?,
        (None, None) => String::new(),
    };

    let request = RunRequest {
        agent_id: args.agent.clone(),
        requested_model: args.model.clone(),
        prompt_text,
        declared_max_output_tokens: args.max_output_tokens,
        premium_requested: args.premium,
    };

    let estimator: Arc<dyn TokenEstimator> = if args.exact_tokens {
        Arc::new(TiktokenEstimator::cl100k_base()?)
    } else {
        Arc::new(HeuristicEstimator)
    };

    let db = Database::open(&config.storage.database_path, config.storage.wal_mode).await?;
    let policy = Arc::new(SharedPolicy::new(config));
    let engine = DecisionEngine::new(
        policy,
        estimator,
        UsageLedger::new(db.clone()),
        ApprovalQueue::new(db.clone()),
    );

    let outcome = engine.decide(&request, Utc::now()).await?;
    db.close().await?;

    if args.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&outcome)
                .unwrap_or_else(|_| "{}".to_string())
        );
    } else {
        let use_color = !args.plain && std::io::stdout().is_terminal();
        print_outcome(&outcome, use_color);
    }

    Ok(exit_code_for(&outcome))
}

/// 0 = run may proceed, 10 = waiting on a human, 20 = policy said no.
fn exit_code_for(outcome: &DecisionOutcome) -> ExitCode {
    match outcome {
        DecisionOutcome::Allowed { .. } | DecisionOutcome::Substituted { .. } => {
            ExitCode::SUCCESS
        }
        DecisionOutcome::PendingApproval { .. } => ExitCode::from(10),
        DecisionOutcome::Rejected { .. } => ExitCode::from(20),
    }
}

fn print_outcome(outcome: &DecisionOutcome, use_color: bool) {
    let paint = |s: &str, color: &str| -> String {
        if !use_color {
            return s.to_string();
        }
        match color {
            "green" => s.green().bold().to_string(),
            "yellow" => s.yellow().bold().to_string(),
            "red" => s.red().bold().to_string(),
            _ => s.to_string(),
        }
    };

    match outcome {
        DecisionOutcome::Allowed {
            model,
            estimate,
            warning,
        } => {
            println!(
                "{} {} (est. ${:.4})",
                paint("allowed", "green"),
                model,
                estimate.amount_usd
            );
            if let Some(warning) = warning {
                println!("  {} {}", paint("warning:", "yellow"), warning);
            }
        }
        DecisionOutcome::Substituted {
            from_model,
            to_model,
            estimate,
        } => {
            println!(
                "{} {} -> {} (est. ${:.4})",
                paint("substituted", "yellow"),
                from_model,
                to_model,
                estimate.amount_usd
            );
        }
        DecisionOutcome::Rejected {
            detail,
            suggested_fallback,
            ..
        } => {
            println!("{} {}", paint("rejected", "red"), detail);
            if let Some(fallback) = suggested_fallback {
                println!("  try: {fallback}");
            }
        }
        DecisionOutcome::PendingApproval {
            request_id,
            estimate,
        } => {
            println!(
                "{} request {} (est. ${:.4}) awaits review",
                paint("pending approval", "yellow"),
                request_id,
                estimate.amount_usd
            );
        }
    }
}
