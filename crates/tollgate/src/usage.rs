// SPDX-FileCopyrightText: 2026 Tollgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `tollgate usage` command implementation.
//!
//! Reads the usage ledger and prints today's and this month's recorded
//! spend, optionally broken down per model for one agent.

use std::process::ExitCode;

use chrono::Utc;
use clap::Args;
use serde::Serialize;
use tollgate_config::TollgateConfig;
use tollgate_core::TollgateError;
use tollgate_cost::{UsageLedger, day_key, month_key};
use tollgate_storage::Database;

/// Arguments for `tollgate usage`.
#[derive(Args, Debug)]
pub struct UsageArgs {
    /// Restrict totals to one agent and include its per-model breakdown.
    #[arg(long)]
    pub agent: Option<String>,

    /// Emit totals as JSON.
    #[arg(long)]
    pub json: bool,
}

/// Structured output for `--json` mode.
#[derive(Debug, Serialize)]
struct UsageReport {
    day: String,
    month: String,
    day_total_usd: f64,
    month_total_usd: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    agent: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    month_by_model: Option<Vec<(String, f64)>>,
}

/// Run the `tollgate usage` command.
pub async fn run(config: &TollgateConfig, args: UsageArgs) -> Result<ExitCode, TollgateError> {
    let db = Database::open(&config.storage.database_path, config.storage.wal_mode).await?;
    let ledger = UsageLedger::new(db.clone());

    let now = Utc::now();
    let day = day_key(now);
    let month = month_key(now);

    let (day_total, month_total, month_by_model) = match &args.agent {
        Some(agent) => (
            ledger.agent_period_total(&day, agent).await?,
            ledger.agent_period_total(&month, agent).await?,
            Some(ledger.cost_by_model(&month, agent).await?),
        ),
        None => (
            ledger.period_total(&day).await?,
            ledger.period_total(&month).await?,
            None,
        ),
    };
    db.close().await?;

    if args.json {
        let report = UsageReport {
            day,
            month,
            day_total_usd: day_total,
            month_total_usd: month_total,
            agent: args.agent,
            month_by_model,
        };
        println!(
            "{}",
            serde_json::to_string_pretty(&report).unwrap_or_else(|_| "{}".to_string())
        );
    } else {
        match &args.agent {
            Some(agent) => println!("usage for agent `{agent}`"),
            None => println!("usage across all agents"),
        }
        println!("  today ({day}):       ${day_total:.4}");
        println!("  this month ({month}): ${month_total:.4}");
        if let Some(breakdown) = month_by_model {
            for (model, cost) in breakdown {
                println!("    {model}: ${cost:.4}");
            }
        }
    }

    Ok(ExitCode::SUCCESS)
}
