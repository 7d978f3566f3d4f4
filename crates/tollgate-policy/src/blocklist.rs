// SPDX-FileCopyrightText: 2026 Tollgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Temporarily blocked models and fallback selection.
//!
//! Blocks expire by timestamp and expiry is evaluated lazily: a model
//! whose `blocked_until` has passed is reported unblocked by every query
//! without any mutation. [`BlockPolicy::prune_expired`] exists as a
//! maintenance operation, but no query depends on it having run.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tollgate_config::model::ModelPolicyConfig;
use tracing::debug;

/// One temporarily blocked model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlockEntry {
    /// Instant at which the block lapses.
    pub blocked_until: DateTime<Utc>,
    /// Human-readable reason, echoed back to rejected callers.
    pub reason: String,
}

/// Result of a block query at a specific instant.
#[derive(Debug, Clone, Default)]
pub struct BlockStatus {
    /// Whether the model is blocked at the queried instant.
    pub blocked: bool,
    /// Reason, present only when blocked.
    pub reason: Option<String>,
    /// Expiry, present only when blocked.
    pub blocked_until: Option<DateTime<Utc>>,
}

/// Blocked-model set plus the substitution preference order.
#[derive(Debug, Clone, Default)]
pub struct BlockPolicy {
    blocked: BTreeMap<String, BlockEntry>,
    fallback_order: Vec<String>,
    default_model: Option<String>,
}

impl BlockPolicy {
    /// Build a block policy from the configuration section.
    ///
    /// Duplicate entries for the same model keep the later one, matching
    /// TOML's last-wins convention for repeated values.
    pub fn from_config(config: &ModelPolicyConfig) -> Self {
        let blocked = config
            .blocked
            .iter()
            .map(|entry| {
                (
                    entry.model.clone(),
                    BlockEntry {
                        blocked_until: entry.blocked_until,
                        reason: entry.reason.clone(),
                    },
                )
            })
            .collect();
        Self {
            blocked,
            fallback_order: config.fallback_order.clone(),
            default_model: config.default_model.clone(),
        }
    }

    /// Query whether a model is blocked at `now`.
    ///
    /// An entry with `blocked_until <= now` reports unblocked; the entry
    /// itself is left in place for `prune_expired` to collect.
    pub fn status(&self, model: &str, now: DateTime<Utc>) -> BlockStatus {
        match self.blocked.get(model) {
            Some(entry) if now < entry.blocked_until => BlockStatus {
                blocked: true,
                reason: Some(entry.reason.clone()),
                blocked_until: Some(entry.blocked_until),
            },
            _ => BlockStatus::default(),
        }
    }

    /// Pick the best substitute for a model at `now`.
    ///
    /// Walks `fallback_order` in declared order, skipping the requested
    /// model and anything blocked at the same instant; falls back to the
    /// configured default model under the same filters. The declared order
    /// is the determinism guarantee — never reshuffled.
    pub fn fallback_for(&self, model: &str, now: DateTime<Utc>) -> Option<&str> {
        self.fallback_order
            .iter()
            .chain(self.default_model.iter())
            .map(String::as_str)
            .find(|candidate| *candidate != model && !self.status(candidate, now).blocked)
    }

    /// Physically remove entries whose `blocked_until` has passed.
    ///
    /// Returns the number of entries removed. Purely maintenance — query
    /// results are identical whether or not this ever runs.
    pub fn prune_expired(&mut self, now: DateTime<Utc>) -> usize {
        let before = self.blocked.len();
        self.blocked.retain(|model, entry| {
            let keep = now < entry.blocked_until;
            if !keep {
                debug!(model, blocked_until = %entry.blocked_until, "pruned expired block");
            }
            keep
        });
        before - self.blocked.len()
    }

    /// Blocked entries that are still active at `now`, in model order.
    pub fn active_blocks(&self, now: DateTime<Utc>) -> Vec<(&str, &BlockEntry)> {
        self.blocked
            .iter()
            .filter(|(_, entry)| now < entry.blocked_until)
            .map(|(model, entry)| (model.as_str(), entry))
            .collect()
    }
}
