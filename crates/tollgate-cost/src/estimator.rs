// SPDX-FileCopyrightText: 2026 Tollgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Token estimation for prospective runs.
//!
//! The gate decides before a call is made, so it never has real token
//! counts — only an estimate derived from the prompt text and the caller's
//! declared output budget. [`TokenEstimator`] is the stable seam: the
//! default is a cheap character heuristic, and [`TiktokenEstimator`] shows
//! the same contract backed by an exact BPE tokenizer. Swapping one for
//! the other changes no caller.

use tiktoken_rs::CoreBPE;
use tollgate_core::{TokenUsage, TollgateError};

/// Produces an approximate (input, output) token count for a prospective
/// run. Implementations must be thread-safe; estimators are shared across
/// concurrent decisions.
pub trait TokenEstimator: Send + Sync {
    /// Estimate token usage from prompt text and a declared output budget.
    ///
    /// `declared_max_output_tokens == 0` means the caller did not declare
    /// a budget and the estimator picks its own output heuristic.
    fn estimate(&self, prompt_text: &str, declared_max_output_tokens: u32) -> TokenUsage;

    /// Human-readable name for logging.
    fn name(&self) -> &'static str;
}

/// When no output budget is declared, mirror the input size at half scale.
fn output_or_mirror(declared: u32, input_tokens: u32) -> u32 {
    if declared > 0 { declared } else { input_tokens / 2 }
}

/// Character-count heuristic: roughly 4 characters per token.
///
/// Deliberately approximate. Good enough for threshold checks against
/// prices quoted per thousand tokens; replace with [`TiktokenEstimator`]
/// when audit-grade counts matter.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeuristicEstimator;

/// Approximate characters per token for English-like text.
const CHARS_PER_TOKEN: usize = 4;

impl TokenEstimator for HeuristicEstimator {
    fn estimate(&self, prompt_text: &str, declared_max_output_tokens: u32) -> TokenUsage {
        let input_tokens = prompt_text.chars().count().div_ceil(CHARS_PER_TOKEN) as u32;
        TokenUsage {
            input_tokens,
            output_tokens: output_or_mirror(declared_max_output_tokens, input_tokens),
        }
    }

    fn name(&self) -> &'static str {
        "heuristic_chars_div_4"
    }
}

/// Exact input-token counting via tiktoken's `cl100k_base` encoding.
///
/// Output tokens are still the declared budget (or the mirror heuristic):
/// no tokenizer can count text that has not been generated yet.
pub struct TiktokenEstimator {
    encoding: CoreBPE,
}

impl TiktokenEstimator {
    /// Build the estimator, loading the embedded `cl100k_base` ranks.
    pub fn cl100k_base() -> Result<Self, TollgateError> {
        let encoding = tiktoken_rs::cl100k_base()
            .map_err(|e| TollgateError::Internal(format!("cl100k_base: {e}")))?;
        Ok(Self { encoding })
    }
}

impl TokenEstimator for TiktokenEstimator {
    fn estimate(&self, prompt_text: &str, declared_max_output_tokens: u32) -> TokenUsage {
        let input_tokens = self
            .encoding
            .encode_with_special_tokens(prompt_text)
            .len() as u32;
        TokenUsage {
            input_tokens,
            output_tokens: output_or_mirror(declared_max_output_tokens, input_tokens),
        }
    }

    fn name(&self) -> &'static str {
        "tiktoken_cl100k_base"
    }
}
