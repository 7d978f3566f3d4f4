// SPDX-FileCopyrightText: 2026 Tollgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The decision engine.
//!
//! One `decide` call per proposed run: block check, cost estimation, then
//! an ordered threshold ladder. The ladder encodes the outcome precedence
//! Rejected > PendingApproval > Substituted > Allowed — when several
//! conditions fire at once, the most restrictive wins because it is
//! checked first.
//!
//! Budget-consuming outcomes commit to the ledger before they are
//! returned; if the commit fails the whole decision fails, so callers
//! never see an Allowed/Substituted whose accounting was lost.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tollgate_approvals::ApprovalQueue;
use tollgate_core::{CostEstimate, RunRequest, TollgateError};
use tollgate_cost::{TokenEstimator, UsageLedger, month_key};
use tollgate_policy::{PolicySnapshot, SharedPolicy};
use tracing::{info, warn};

use crate::outcome::{DecisionOutcome, RejectReason};

/// Orchestrates block policy, cost estimation, ledger thresholds, and the
/// approval queue into one decision per run request.
///
/// All methods take `&self`; the engine is shared across concurrent
/// requests. Each decision loads one policy snapshot up front and uses it
/// for every check, so a concurrent policy reload can never produce a
/// half-old, half-new decision.
pub struct DecisionEngine {
    policy: Arc<SharedPolicy>,
    estimator: Arc<dyn TokenEstimator>,
    ledger: UsageLedger,
    approvals: ApprovalQueue,
}

impl DecisionEngine {
    /// Assemble an engine from its collaborators.
    pub fn new(
        policy: Arc<SharedPolicy>,
        estimator: Arc<dyn TokenEstimator>,
        ledger: UsageLedger,
        approvals: ApprovalQueue,
    ) -> Self {
        Self {
            policy,
            estimator,
            ledger,
            approvals,
        }
    }

    /// Decide whether a proposed run may proceed, at the instant `now`.
    ///
    /// `Err` means an operational failure (storage), not a policy "no" —
    /// rejections are ordinary [`DecisionOutcome`] values.
    pub async fn decide(
        &self,
        request: &RunRequest,
        now: DateTime<Utc>,
    ) -> Result<DecisionOutcome, TollgateError> {
        let snapshot = self.policy.load();
        let usage = self
            .estimator
            .estimate(&request.prompt_text, request.declared_max_output_tokens);
        let model = request.requested_model.as_str();

        // Hard blocks are advisory: report, suggest, never silently swap.
        let block = snapshot.blocks.status(model, now);
        if block.blocked {
            let estimate = snapshot.pricing.estimate(model, usage);
            let suggested = snapshot
                .blocks
                .fallback_for(model, now)
                .map(str::to_string);
            let until = block
                .blocked_until
                .map(|t| t.to_rfc3339())
                .unwrap_or_default();
            let reason_text = block.reason.unwrap_or_default();
            let outcome = DecisionOutcome::Rejected {
                reason: RejectReason::ModelBlocked,
                detail: format!(
                    "model `{model}` is blocked until {until}: {reason_text}"
                ),
                suggested_fallback: suggested,
                estimate: Some(estimate),
            };
            self.log_outcome(request, &snapshot, &outcome);
            return Ok(outcome);
        }

        let estimate = snapshot.pricing.estimate(model, usage);
        if !estimate.priced {
            let outcome = DecisionOutcome::Rejected {
                reason: RejectReason::UnpricedModel,
                detail: format!(
                    "model `{model}` has no pricing entry; refusing to treat it as free"
                ),
                suggested_fallback: None,
                estimate: Some(estimate),
            };
            self.log_outcome(request, &snapshot, &outcome);
            return Ok(outcome);
        }

        let month = month_key(now);
        let global_total = self.ledger.period_total(&month).await?;
        let agent_total = self
            .ledger
            .agent_period_total(&month, &request.agent_id)
            .await?;
        let amount = estimate.amount_usd;
        let thresholds = snapshot.thresholds;

        if let Some(hard) = thresholds.global_hard_usd
            && global_total + amount > hard
        {
            let outcome = DecisionOutcome::Rejected {
                reason: RejectReason::HardThresholdExceeded,
                detail: format!(
                    "global monthly spend would reach ${:.4}, over the ${hard:.2} hard threshold",
                    global_total + amount
                ),
                suggested_fallback: None,
                estimate: Some(estimate),
            };
            self.log_outcome(request, &snapshot, &outcome);
            return Ok(outcome);
        }

        if let Some(quota) = snapshot.agent_quota(&request.agent_id)
            && agent_total + amount > quota
        {
            let outcome = DecisionOutcome::Rejected {
                reason: RejectReason::AgentQuotaExceeded,
                detail: format!(
                    "agent `{}` monthly spend would reach ${:.4}, over its ${quota:.2} quota",
                    request.agent_id,
                    agent_total + amount
                ),
                suggested_fallback: None,
                estimate: Some(estimate),
            };
            self.log_outcome(request, &snapshot, &outcome);
            return Ok(outcome);
        }

        if let Some(per_run_hard) = thresholds.per_run_hard_usd
            && amount > per_run_hard
        {
            let outcome = DecisionOutcome::Rejected {
                reason: RejectReason::HardThresholdExceeded,
                detail: format!(
                    "estimated run cost ${amount:.4} exceeds the per-run hard limit ${per_run_hard:.2}"
                ),
                suggested_fallback: None,
                estimate: Some(estimate),
            };
            self.log_outcome(request, &snapshot, &outcome);
            return Ok(outcome);
        }

        if let Some(approval) = thresholds.per_run_approval_usd
            && amount > approval
        {
            return self.park_for_approval(request, &snapshot, &estimate, now).await;
        }

        if let Some(soft) = thresholds.per_run_soft_usd
            && amount > soft
        {
            // The caller insisting on the premium model turns a silent
            // substitution into a human sign-off.
            if request.premium_requested {
                return self.park_for_approval(request, &snapshot, &estimate, now).await;
            }

            match snapshot.blocks.fallback_for(model, now) {
                Some(fallback) => {
                    let fallback_estimate = snapshot.pricing.estimate(fallback, usage);
                    if !fallback_estimate.priced {
                        let outcome = DecisionOutcome::Rejected {
                            reason: RejectReason::UnpricedModel,
                            detail: format!(
                                "substitute `{fallback}` has no pricing entry; refusing to commit an unpriced run"
                            ),
                            suggested_fallback: None,
                            estimate: Some(fallback_estimate),
                        };
                        self.log_outcome(request, &snapshot, &outcome);
                        return Ok(outcome);
                    }
                    let fallback = fallback.to_string();
                    self.ledger
                        .commit(now, &request.agent_id, &fallback, fallback_estimate.amount_usd)
                        .await?;
                    let outcome = DecisionOutcome::Substituted {
                        from_model: model.to_string(),
                        to_model: fallback,
                        estimate: fallback_estimate,
                    };
                    self.log_outcome(request, &snapshot, &outcome);
                    return Ok(outcome);
                }
                None => {
                    // Soft limits are non-blocking; with no usable
                    // substitute the run proceeds, loudly.
                    warn!(
                        agent_id = %request.agent_id,
                        model,
                        amount_usd = amount,
                        soft_threshold = soft,
                        "over soft threshold with no usable fallback; allowing"
                    );
                    let warning = format!(
                        "estimated cost ${amount:.4} exceeds the ${soft:.2} soft threshold and no fallback model is usable"
                    );
                    return self
                        .allow(request, &snapshot, estimate, global_total, Some(warning), now)
                        .await;
                }
            }
        }

        self.allow(request, &snapshot, estimate, global_total, None, now)
            .await
    }

    /// Commit the requested model's amount and return `Allowed`, attaching
    /// the global warn-level warning when crossed.
    async fn allow(
        &self,
        request: &RunRequest,
        snapshot: &PolicySnapshot,
        estimate: CostEstimate,
        global_total: f64,
        mut warning: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<DecisionOutcome, TollgateError> {
        if let Some(warn_level) = snapshot.thresholds.global_warn_usd
            && global_total + estimate.amount_usd > warn_level
        {
            let text = format!(
                "global monthly spend is at ${:.4}, past the ${warn_level:.2} warn level",
                global_total + estimate.amount_usd
            );
            warning = Some(match warning {
                Some(existing) => format!("{existing}; {text}"),
                None => text,
            });
        }

        self.ledger
            .commit(
                now,
                &request.agent_id,
                &request.requested_model,
                estimate.amount_usd,
            )
            .await?;

        let outcome = DecisionOutcome::Allowed {
            model: request.requested_model.clone(),
            estimate,
            warning,
        };
        self.log_outcome(request, snapshot, &outcome);
        Ok(outcome)
    }

    /// Enqueue for human review and return `PendingApproval`. No ledger
    /// commit: budget is consumed only after approval.
    async fn park_for_approval(
        &self,
        request: &RunRequest,
        snapshot: &PolicySnapshot,
        estimate: &CostEstimate,
        now: DateTime<Utc>,
    ) -> Result<DecisionOutcome, TollgateError> {
        let request_id = self.approvals.enqueue(request, estimate, now).await?;
        let outcome = DecisionOutcome::PendingApproval {
            request_id,
            estimate: *estimate,
        };
        self.log_outcome(request, snapshot, &outcome);
        Ok(outcome)
    }

    /// Structured event for every terminal outcome. Out-of-scope
    /// notification hooks subscribe at the tracing layer.
    fn log_outcome(
        &self,
        request: &RunRequest,
        snapshot: &PolicySnapshot,
        outcome: &DecisionOutcome,
    ) {
        info!(
            agent_id = %request.agent_id,
            model = %request.requested_model,
            outcome = outcome.kind(),
            policy_version = snapshot.version,
            estimator = self.estimator.name(),
            "decision made"
        );
    }
}
