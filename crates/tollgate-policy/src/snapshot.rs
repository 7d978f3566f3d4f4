// SPDX-FileCopyrightText: 2026 Tollgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Versioned, immutable policy snapshots.
//!
//! The decision engine never reads ambient mutable configuration. It loads
//! one [`PolicySnapshot`] at the start of each decision from a
//! [`SharedPolicy`] and uses that snapshot for every check in the
//! decision. Reloading configuration while serving installs a new snapshot
//! atomically; in-flight decisions keep the one they loaded.

use std::collections::HashMap;
use std::sync::Arc;

use arc_swap::ArcSwap;
use tollgate_config::TollgateConfig;
use tollgate_cost::PricingTable;
use tracing::info;

use crate::blocklist::BlockPolicy;

/// Spend thresholds consumed by the decision engine, all in USD.
///
/// `None` disables the corresponding check — the documented default for
/// every threshold the configuration leaves out.
#[derive(Debug, Clone, Copy, Default)]
pub struct Thresholds {
    /// Monthly ceiling across all agents.
    pub global_hard_usd: Option<f64>,
    /// Monthly level at which allowed runs carry a warning.
    pub global_warn_usd: Option<f64>,
    /// Per-run level above which a run is substituted.
    pub per_run_soft_usd: Option<f64>,
    /// Per-run ceiling.
    pub per_run_hard_usd: Option<f64>,
    /// Per-run level above which a run queues for approval.
    pub per_run_approval_usd: Option<f64>,
}

/// One immutable view of the whole policy: pricing, thresholds, blocks,
/// and per-agent quotas.
#[derive(Debug, Clone)]
pub struct PolicySnapshot {
    /// Monotonic version, bumped on every reload.
    pub version: u64,
    /// Injected model pricing.
    pub pricing: PricingTable,
    /// Spend thresholds.
    pub thresholds: Thresholds,
    /// Blocked models and fallback order.
    pub blocks: BlockPolicy,
    quotas: HashMap<String, Option<f64>>,
    default_agent_quota_usd: Option<f64>,
}

impl PolicySnapshot {
    /// Build a snapshot from a validated configuration.
    pub fn from_config(config: &TollgateConfig, version: u64) -> Self {
        let quotas = config
            .agents
            .iter()
            .map(|agent| (agent.name.clone(), agent.monthly_quota_usd))
            .collect();
        Self {
            version,
            pricing: PricingTable::from_config(&config.pricing),
            thresholds: Thresholds {
                global_hard_usd: config.thresholds.global_hard_usd,
                global_warn_usd: config.thresholds.global_warn_usd,
                per_run_soft_usd: config.thresholds.per_run_soft_usd,
                per_run_hard_usd: config.thresholds.per_run_hard_usd,
                per_run_approval_usd: config.thresholds.per_run_approval_usd,
            },
            blocks: BlockPolicy::from_config(&config.model_policy),
            quotas,
            default_agent_quota_usd: config.thresholds.default_agent_quota_usd,
        }
    }

    /// Monthly quota for an agent.
    ///
    /// An explicit `[[agents]]` entry with a quota wins; an entry without
    /// one, or no entry at all, inherits the default agent quota. `None`
    /// means unlimited.
    pub fn agent_quota(&self, agent_id: &str) -> Option<f64> {
        match self.quotas.get(agent_id) {
            Some(Some(quota)) => Some(*quota),
            _ => self.default_agent_quota_usd,
        }
    }
}

/// Atomically swappable handle to the current policy snapshot.
pub struct SharedPolicy {
    current: ArcSwap<PolicySnapshot>,
}

impl SharedPolicy {
    /// Install version 1 from the startup configuration.
    pub fn new(config: &TollgateConfig) -> Self {
        Self {
            current: ArcSwap::from_pointee(PolicySnapshot::from_config(config, 1)),
        }
    }

    /// Load the current snapshot. One load per decision.
    pub fn load(&self) -> Arc<PolicySnapshot> {
        self.current.load_full()
    }

    /// Replace the policy from a freshly validated configuration.
    ///
    /// The new snapshot's version is the old one plus one. Decisions
    /// already holding the old snapshot are unaffected.
    pub fn reload(&self, config: &TollgateConfig) -> u64 {
        let version = self.current.load().version + 1;
        self.current
            .store(Arc::new(PolicySnapshot::from_config(config, version)));
        info!(version, "policy snapshot reloaded");
        version
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tollgate_config::load_config_from_str;

    fn config(toml_str: &str) -> TollgateConfig {
        load_config_from_str(toml_str).unwrap()
    }

    #[test]
    fn explicit_agent_quota_wins_over_default() {
        let snapshot = PolicySnapshot::from_config(
            &config(
                r#"
                [thresholds]
                default_agent_quota_usd = 25.0

                [[agents]]
                name = "research-bot"
                monthly_quota_usd = 40.0

                [[agents]]
                name = "intern-bot"
                "#,
            ),
            1,
        );
        assert_eq!(snapshot.agent_quota("research-bot"), Some(40.0));
        assert_eq!(snapshot.agent_quota("intern-bot"), Some(25.0));
        assert_eq!(snapshot.agent_quota("unknown-bot"), Some(25.0));
    }

    #[test]
    fn no_quota_anywhere_means_unlimited() {
        let snapshot = PolicySnapshot::from_config(&config(""), 1);
        assert_eq!(snapshot.agent_quota("anyone"), None);
    }

    #[test]
    fn reload_bumps_version_and_swaps_thresholds() {
        let shared = SharedPolicy::new(&config(
            r#"
            [thresholds]
            global_hard_usd = 100.0
            "#,
        ));
        let before = shared.load();
        assert_eq!(before.version, 1);
        assert_eq!(before.thresholds.global_hard_usd, Some(100.0));

        let version = shared.reload(&config(
            r#"
            [thresholds]
            global_hard_usd = 500.0
            "#,
        ));
        assert_eq!(version, 2);

        // The held snapshot is unchanged; a fresh load sees the new policy.
        assert_eq!(before.thresholds.global_hard_usd, Some(100.0));
        assert_eq!(shared.load().thresholds.global_hard_usd, Some(500.0));
    }
}
