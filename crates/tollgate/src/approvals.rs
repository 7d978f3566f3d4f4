// SPDX-FileCopyrightText: 2026 Tollgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `tollgate approvals` command implementation.
//!
//! Lists the pending queue and records human dispositions. Deciding an
//! already-decided record fails loudly rather than overwriting it.

use std::process::ExitCode;

use chrono::Utc;
use clap::{Args, Subcommand};
use tollgate_approvals::ApprovalQueue;
use tollgate_config::TollgateConfig;
use tollgate_core::TollgateError;
use tollgate_storage::Database;

/// Arguments for `tollgate approvals`.
#[derive(Args, Debug)]
pub struct ApprovalsArgs {
    #[command(subcommand)]
    pub command: ApprovalsCommand,
}

/// Approval queue subcommands.
#[derive(Subcommand, Debug)]
pub enum ApprovalsCommand {
    /// List pending approval requests, oldest first.
    List {
        /// Emit records as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Approve a pending request.
    Approve {
        /// Record id as printed by `decide` or `list`.
        id: String,
        /// Reviewer name recorded on the decision.
        #[arg(long)]
        reviewer: String,
    },
    /// Reject a pending request.
    Reject {
        /// Record id as printed by `decide` or `list`.
        id: String,
        /// Reviewer name recorded on the decision.
        #[arg(long)]
        reviewer: String,
    },
}

/// Run the `tollgate approvals` command.
pub async fn run(
    config: &TollgateConfig,
    args: ApprovalsArgs,
) -> Result<ExitCode, TollgateError> {
    let db = Database::open(&config.storage.database_path, config.storage.wal_mode).await?;
    let queue = ApprovalQueue::new(db.clone());

    let code = match args.command {
        ApprovalsCommand::List { json } => {
            let pending = queue.list_pending().await?;
            if json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&pending)
                        .unwrap_or_else(|_| "[]".to_string())
                );
            } else if pending.is_empty() {
                println!("no pending approvals");
            } else {
                for record in &pending {
                    println!(
                        "{}  {}  {}  ${:.4}  {}",
                        record.id,
                        record.created_at,
                        record.agent_id,
                        record.estimated_cost_usd,
                        record.requested_model,
                    );
                }
            }
            ExitCode::SUCCESS
        }
        ApprovalsCommand::Approve { id, reviewer } => {
            let record = queue.decide(&id, true, &reviewer, Utc::now()).await?;
            println!("approved {} (reviewer: {reviewer})", record.id);
            ExitCode::SUCCESS
        }
        ApprovalsCommand::Reject { id, reviewer } => {
            let record = queue.decide(&id, false, &reviewer, Utc::now()).await?;
            println!("rejected {} (reviewer: {reviewer})", record.id);
            ExitCode::SUCCESS
        }
    };

    db.close().await?;
    Ok(code)
}
