// SPDX-FileCopyrightText: 2026 Tollgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common types shared across the Tollgate workspace.

use serde::{Deserialize, Serialize};

/// Token counts for one prospective or completed model call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    /// Number of input (prompt) tokens.
    pub input_tokens: u32,
    /// Number of output (completion) tokens.
    pub output_tokens: u32,
}

/// One proposed model invocation, as submitted by a caller.
///
/// Created per incoming call, never mutated, discarded after the decision.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunRequest {
    /// Identity of the agent asking to run.
    pub agent_id: String,
    /// Model the agent wants to use.
    pub requested_model: String,
    /// Full prompt text; only a bounded preview is ever persisted.
    pub prompt_text: String,
    /// Caller-declared output budget in tokens. Zero means "unknown" and
    /// lets the estimator pick a heuristic.
    pub declared_max_output_tokens: u32,
    /// The caller insists on the requested model. In the soft cost band
    /// this routes to human approval instead of silent substitution.
    pub premium_requested: bool,
}

/// An estimated cost for a prospective run.
///
/// `priced == false` means the model had no pricing entry; the amount is
/// then zero and MUST be treated as a policy gap, never as a free run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CostEstimate {
    /// Estimated input tokens.
    pub input_tokens: u32,
    /// Estimated output tokens.
    pub output_tokens: u32,
    /// Estimated cost in USD. Zero when unpriced.
    pub amount_usd: f64,
    /// Whether a pricing entry existed for the model.
    pub priced: bool,
}

impl CostEstimate {
    /// An estimate for a model with no pricing entry.
    pub fn unpriced(usage: TokenUsage) -> Self {
        Self {
            input_tokens: usage.input_tokens,
            output_tokens: usage.output_tokens,
            amount_usd: 0.0,
            priced: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unpriced_estimate_is_flagged_not_free() {
        let est = CostEstimate::unpriced(TokenUsage {
            input_tokens: 1000,
            output_tokens: 500,
        });
        assert!(!est.priced);
        assert_eq!(est.amount_usd, 0.0);
        assert_eq!(est.input_tokens, 1000);
    }

    #[test]
    fn run_request_round_trips_through_json() {
        let req = RunRequest {
            agent_id: "research-bot".into(),
            requested_model: "gpt-5".into(),
            prompt_text: "summarize this".into(),
            declared_max_output_tokens: 500,
            premium_requested: false,
        };
        let json = serde_json::to_string(&req).unwrap();
        let back: RunRequest = serde_json::from_str(&json).unwrap();
        assert_eq!(back.agent_id, "research-bot");
        assert_eq!(back.declared_max_output_tokens, 500);
        assert!(!back.premium_requested);
    }
}
