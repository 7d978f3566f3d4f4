// SPDX-FileCopyrightText: 2026 Tollgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Tollgate policy gate.
//!
//! All structs use `#[serde(deny_unknown_fields)]` so unrecognized keys are
//! rejected at startup with actionable diagnostics instead of being
//! silently ignored. Every section is optional and defaults to a usable
//! value; in particular every threshold defaults to `None`, which means
//! "this limit is disabled".

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Top-level Tollgate configuration.
///
/// Loaded from TOML files following the XDG hierarchy, with environment
/// variable overrides. The decision engine never reads this directly — it
/// consumes an immutable `PolicySnapshot` built from one of these.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct TollgateConfig {
    /// Gate identity and logging.
    #[serde(default)]
    pub gate: GateConfig,

    /// SQLite persistence settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Spend thresholds. Absent values disable the corresponding check.
    #[serde(default)]
    pub thresholds: ThresholdConfig,

    /// Blocked models, fallback order, and the default substitute.
    #[serde(default)]
    pub model_policy: ModelPolicyConfig,

    /// Injected per-model pricing. Pricing is never fetched at runtime.
    #[serde(default)]
    pub pricing: PricingConfig,

    /// Per-agent monthly quota overrides.
    #[serde(default)]
    pub agents: Vec<AgentQuotaConfig>,
}

/// Gate identity and logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct GateConfig {
    /// Display name of this gate instance.
    #[serde(default = "default_gate_name")]
    pub name: String,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            name: default_gate_name(),
            log_level: default_log_level(),
        }
    }
}

fn default_gate_name() -> String {
    "tollgate".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

/// SQLite persistence configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Enable WAL (Write-Ahead Logging) mode.
    #[serde(default = "default_wal_mode")]
    pub wal_mode: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            wal_mode: default_wal_mode(),
        }
    }
}

fn default_database_path() -> String {
    dirs::data_dir()
        .map(|p| p.join("tollgate").join("tollgate.db"))
        .unwrap_or_else(|| std::path::PathBuf::from("tollgate.db"))
        .to_string_lossy()
        .into_owned()
}

fn default_wal_mode() -> bool {
    true
}

/// Spend thresholds, all in USD.
///
/// `None` disables the corresponding check. Per-run thresholds gate a
/// single estimated run; global thresholds gate the calendar-month total
/// across all agents.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ThresholdConfig {
    /// Monthly ceiling across all agents. Crossing it rejects the run.
    #[serde(default)]
    pub global_hard_usd: Option<f64>,

    /// Monthly level at which allowed runs carry a non-blocking warning.
    #[serde(default)]
    pub global_warn_usd: Option<f64>,

    /// Per-run level above which a run is substituted to a cheaper model.
    #[serde(default)]
    pub per_run_soft_usd: Option<f64>,

    /// Per-run ceiling. Crossing it rejects the run outright.
    #[serde(default)]
    pub per_run_hard_usd: Option<f64>,

    /// Per-run level above which a run is queued for human approval.
    #[serde(default)]
    pub per_run_approval_usd: Option<f64>,

    /// Monthly quota applied to agents without an explicit override.
    #[serde(default)]
    pub default_agent_quota_usd: Option<f64>,
}

/// Blocked models and substitution preferences.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ModelPolicyConfig {
    /// Temporarily blocked models. Entries expire by timestamp; expiry is
    /// always re-checked live, so stale entries are harmless.
    #[serde(default)]
    pub blocked: Vec<BlockedModelConfig>,

    /// Substitute preference list, walked in declared order.
    #[serde(default)]
    pub fallback_order: Vec<String>,

    /// Last-resort substitute when nothing in `fallback_order` is usable.
    #[serde(default)]
    pub default_model: Option<String>,
}

/// One temporarily blocked model.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct BlockedModelConfig {
    /// Model identifier to block.
    pub model: String,

    /// Instant at which the block lapses (RFC 3339).
    pub blocked_until: DateTime<Utc>,

    /// Human-readable reason, echoed back to rejected callers.
    #[serde(default)]
    pub reason: String,
}

/// Injected pricing table.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct PricingConfig {
    /// Model identifier to price entry. A model absent here is "unpriced"
    /// and the engine rejects runs against it.
    #[serde(default)]
    pub models: BTreeMap<String, PriceEntryConfig>,
}

/// Per-thousand-token prices for one model, in USD.
#[derive(Debug, Clone, Copy, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct PriceEntryConfig {
    /// USD per 1000 input tokens.
    pub input_per_1k_usd: f64,

    /// USD per 1000 output tokens.
    pub output_per_1k_usd: f64,
}

/// Monthly quota override for one agent.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AgentQuotaConfig {
    /// Agent identity as it appears in run requests.
    pub name: String,

    /// Monthly spend quota in USD. `None` inherits
    /// `thresholds.default_agent_quota_usd`.
    #[serde(default)]
    pub monthly_quota_usd: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_has_no_limits() {
        let config = TollgateConfig::default();
        assert!(config.thresholds.global_hard_usd.is_none());
        assert!(config.thresholds.per_run_soft_usd.is_none());
        assert!(config.model_policy.blocked.is_empty());
        assert!(config.pricing.models.is_empty());
        assert_eq!(config.gate.name, "tollgate");
    }

    #[test]
    fn pricing_table_deserializes_from_toml() {
        let toml_str = r#"
            [pricing.models.gpt-5]
            input_per_1k_usd = 0.10
            output_per_1k_usd = 0.30

            [pricing.models."gpt-4.1"]
            input_per_1k_usd = 0.05
            output_per_1k_usd = 0.15
        "#;
        let config: TollgateConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.pricing.models.len(), 2);
        let entry = &config.pricing.models["gpt-5"];
        assert!((entry.input_per_1k_usd - 0.10).abs() < f64::EPSILON);
        assert!((entry.output_per_1k_usd - 0.30).abs() < f64::EPSILON);
    }

    #[test]
    fn blocked_model_parses_rfc3339_expiry() {
        let toml_str = r#"
            [[model_policy.blocked]]
            model = "gpt-5"
            blocked_until = "2026-09-01T00:00:00Z"
            reason = "runaway spend incident"
        "#;
        let config: TollgateConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.model_policy.blocked.len(), 1);
        let entry = &config.model_policy.blocked[0];
        assert_eq!(entry.model, "gpt-5");
        assert_eq!(entry.blocked_until.to_rfc3339(), "2026-09-01T00:00:00+00:00");
    }

    #[test]
    fn agents_array_with_partial_quotas() {
        let toml_str = r#"
            [[agents]]
            name = "research-bot"
            monthly_quota_usd = 40.0

            [[agents]]
            name = "intern-bot"
        "#;
        let config: TollgateConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.agents.len(), 2);
        assert_eq!(config.agents[0].monthly_quota_usd, Some(40.0));
        assert!(config.agents[1].monthly_quota_usd.is_none());
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let toml_str = r#"
            [thresholds]
            global_hard_us = 100.0
        "#;
        assert!(toml::from_str::<TollgateConfig>(toml_str).is_err());
    }
}
