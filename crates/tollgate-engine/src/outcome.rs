// SPDX-FileCopyrightText: 2026 Tollgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The decision outcome taxonomy.
//!
//! Exactly one of four terminal states per request. Policy rejections are
//! values, not errors: a caller can always distinguish "the policy said
//! no" (a [`DecisionOutcome::Rejected`]) from an operational failure
//! (a `TollgateError` from the engine).

use serde::Serialize;
use tollgate_core::CostEstimate;

/// Why a run was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectReason {
    /// A global-monthly or per-run hard ceiling would be crossed.
    HardThresholdExceeded,
    /// The agent's monthly quota would be crossed.
    AgentQuotaExceeded,
    /// The requested model is temporarily blocked.
    ModelBlocked,
    /// No pricing entry exists for the model — a policy gap, never a
    /// free run.
    UnpricedModel,
}

/// The terminal result of one decision.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum DecisionOutcome {
    /// The run may proceed on the requested model. Budget was committed.
    Allowed {
        model: String,
        estimate: CostEstimate,
        /// Non-blocking spend warning (global warn level crossed, or no
        /// substitute was available for an over-soft run).
        #[serde(skip_serializing_if = "Option::is_none")]
        warning: Option<String>,
    },

    /// The run may proceed, but on a cheaper model. The substitute's
    /// budget was committed.
    Substituted {
        from_model: String,
        to_model: String,
        estimate: CostEstimate,
    },

    /// The run may not proceed. Nothing was committed.
    Rejected {
        reason: RejectReason,
        /// Human-readable explanation naming the threshold crossed where
        /// applicable.
        detail: String,
        /// Best substitute at decision time, when one exists. The caller
        /// may re-request with it; the gate never swaps on a hard block.
        #[serde(skip_serializing_if = "Option::is_none")]
        suggested_fallback: Option<String>,
        /// Estimate for the requested model, for transparency.
        #[serde(skip_serializing_if = "Option::is_none")]
        estimate: Option<CostEstimate>,
    },

    /// The run is parked for human sign-off. Nothing was committed;
    /// budget is consumed only after approval.
    PendingApproval {
        request_id: String,
        estimate: CostEstimate,
    },
}

impl DecisionOutcome {
    /// Short outcome tag for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Allowed { .. } => "allowed",
            Self::Substituted { .. } => "substituted",
            Self::Rejected { .. } => "rejected",
            Self::PendingApproval { .. } => "pending_approval",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_with_outcome_tag() {
        let outcome = DecisionOutcome::Rejected {
            reason: RejectReason::ModelBlocked,
            detail: "model `gpt-5` is blocked".to_string(),
            suggested_fallback: Some("gpt-codex".to_string()),
            estimate: None,
        };
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["outcome"], "rejected");
        assert_eq!(json["reason"], "model_blocked");
        assert_eq!(json["suggested_fallback"], "gpt-codex");
        assert!(json.get("estimate").is_none());
    }

    #[test]
    fn allowed_without_warning_omits_the_field() {
        let outcome = DecisionOutcome::Allowed {
            model: "gpt-codex".to_string(),
            estimate: CostEstimate {
                input_tokens: 10,
                output_tokens: 5,
                amount_usd: 0.001,
                priced: true,
            },
            warning: None,
        };
        let json = serde_json::to_value(&outcome).unwrap();
        assert!(json.get("warning").is_none());
        assert_eq!(outcome.kind(), "allowed");
    }
}
