// SPDX-FileCopyrightText: 2026 Tollgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Validates semantic constraints that cannot be expressed via serde
//! attributes: non-negative money values, threshold ordering, duplicate
//! agent names, and the shape of the model policy.

use std::collections::HashSet;

use crate::diagnostic::ConfigError;
use crate::model::TollgateConfig;

/// Validate a deserialized configuration for semantic correctness.
///
/// Collects ALL violations rather than failing fast, so a bad config is
/// fixed in one pass.
pub fn validate_config(config: &TollgateConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    if config.storage.database_path.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "storage.database_path must not be empty".to_string(),
        });
    }

    // Every threshold is money; none may be negative.
    let thresholds = [
        ("global_hard_usd", config.thresholds.global_hard_usd),
        ("global_warn_usd", config.thresholds.global_warn_usd),
        ("per_run_soft_usd", config.thresholds.per_run_soft_usd),
        ("per_run_hard_usd", config.thresholds.per_run_hard_usd),
        (
            "per_run_approval_usd",
            config.thresholds.per_run_approval_usd,
        ),
        (
            "default_agent_quota_usd",
            config.thresholds.default_agent_quota_usd,
        ),
    ];
    for (key, value) in thresholds {
        if let Some(v) = value
            && v < 0.0
        {
            errors.push(ConfigError::Validation {
                message: format!("thresholds.{key} must be non-negative, got {v}"),
            });
        }
    }

    // A warn level above the hard ceiling could never fire.
    if let (Some(warn), Some(hard)) = (
        config.thresholds.global_warn_usd,
        config.thresholds.global_hard_usd,
    ) && warn > hard
    {
        errors.push(ConfigError::Validation {
            message: format!(
                "thresholds.global_warn_usd ({warn}) must not exceed global_hard_usd ({hard})"
            ),
        });
    }

    // Substitution must kick in before the approval queue does.
    if let (Some(soft), Some(approval)) = (
        config.thresholds.per_run_soft_usd,
        config.thresholds.per_run_approval_usd,
    ) && soft > approval
    {
        errors.push(ConfigError::Validation {
            message: format!(
                "thresholds.per_run_soft_usd ({soft}) must not exceed per_run_approval_usd ({approval})"
            ),
        });
    }

    for (model, entry) in &config.pricing.models {
        if entry.input_per_1k_usd < 0.0 || entry.output_per_1k_usd < 0.0 {
            errors.push(ConfigError::Validation {
                message: format!("pricing.models.{model} prices must be non-negative"),
            });
        }
    }

    for (i, block) in config.model_policy.blocked.iter().enumerate() {
        if block.model.trim().is_empty() {
            errors.push(ConfigError::Validation {
                message: format!("model_policy.blocked[{i}].model must not be empty"),
            });
        }
    }

    let mut seen_fallbacks = HashSet::new();
    for model in &config.model_policy.fallback_order {
        if !seen_fallbacks.insert(model) {
            errors.push(ConfigError::Validation {
                message: format!("duplicate model `{model}` in model_policy.fallback_order"),
            });
        }
    }

    let mut seen_agents = HashSet::new();
    for (i, agent) in config.agents.iter().enumerate() {
        if agent.name.trim().is_empty() {
            errors.push(ConfigError::Validation {
                message: format!("agents[{i}].name must not be empty"),
            });
        } else if !seen_agents.insert(&agent.name) {
            errors.push(ConfigError::Validation {
                message: format!("duplicate agent name `{}` in [[agents]] array", agent.name),
            });
        }
        if let Some(quota) = agent.monthly_quota_usd
            && quota < 0.0
        {
            errors.push(ConfigError::Validation {
                message: format!(
                    "agents[{i}].monthly_quota_usd must be non-negative, got {quota}"
                ),
            });
        }
    }

    if errors.is_empty() { Ok(()) } else { Err(errors) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::AgentQuotaConfig;

    fn message_of(e: &ConfigError) -> String {
        e.to_string()
    }

    #[test]
    fn default_config_validates() {
        assert!(validate_config(&TollgateConfig::default()).is_ok());
    }

    #[test]
    fn negative_threshold_fails() {
        let mut config = TollgateConfig::default();
        config.thresholds.per_run_soft_usd = Some(-0.01);
        let errors = validate_config(&config).unwrap_err();
        assert!(errors.iter().any(|e| message_of(e).contains("per_run_soft_usd")));
    }

    #[test]
    fn warn_above_hard_fails() {
        let mut config = TollgateConfig::default();
        config.thresholds.global_warn_usd = Some(300.0);
        config.thresholds.global_hard_usd = Some(250.0);
        let errors = validate_config(&config).unwrap_err();
        assert!(errors.iter().any(|e| message_of(e).contains("global_warn_usd")));
    }

    #[test]
    fn soft_above_approval_fails() {
        let mut config = TollgateConfig::default();
        config.thresholds.per_run_soft_usd = Some(2.0);
        config.thresholds.per_run_approval_usd = Some(1.0);
        let errors = validate_config(&config).unwrap_err();
        assert!(
            errors
                .iter()
                .any(|e| message_of(e).contains("per_run_approval_usd"))
        );
    }

    #[test]
    fn duplicate_agents_fail() {
        let mut config = TollgateConfig::default();
        config.agents = vec![
            AgentQuotaConfig {
                name: "bot".to_string(),
                monthly_quota_usd: Some(10.0),
            },
            AgentQuotaConfig {
                name: "bot".to_string(),
                monthly_quota_usd: None,
            },
        ];
        let errors = validate_config(&config).unwrap_err();
        assert!(errors.iter().any(|e| message_of(e).contains("duplicate agent name")));
    }

    #[test]
    fn duplicate_fallback_entries_fail() {
        let mut config = TollgateConfig::default();
        config.model_policy.fallback_order =
            vec!["gpt-codex".to_string(), "gpt-codex".to_string()];
        let errors = validate_config(&config).unwrap_err();
        assert!(errors.iter().any(|e| message_of(e).contains("fallback_order")));
    }

    #[test]
    fn multiple_violations_are_all_collected() {
        let mut config = TollgateConfig::default();
        config.storage.database_path = "  ".to_string();
        config.thresholds.global_hard_usd = Some(-1.0);
        let errors = validate_config(&config).unwrap_err();
        assert!(errors.len() >= 2);
    }
}
