// SPDX-FileCopyrightText: 2026 Tollgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Injected model pricing and cost calculation.
//!
//! Pricing is loaded from configuration, never fetched at runtime. A model
//! without an entry is a distinct, explicit outcome: `price()` returns
//! `None` and estimates come back flagged unpriced with a zero amount. The
//! decision engine treats that as a policy gap, not a free run.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tollgate_config::model::PricingConfig;
use tollgate_core::{CostEstimate, TokenUsage};

/// Per-thousand-token prices for one model, in USD.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceEntry {
    /// USD per 1000 input tokens.
    pub input_per_1k_usd: f64,
    /// USD per 1000 output tokens.
    pub output_per_1k_usd: f64,
}

/// Immutable model-to-price lookup.
#[derive(Debug, Clone, Default)]
pub struct PricingTable {
    entries: BTreeMap<String, PriceEntry>,
}

impl PricingTable {
    /// Build a pricing table from the configuration section.
    pub fn from_config(config: &PricingConfig) -> Self {
        let entries = config
            .models
            .iter()
            .map(|(model, entry)| {
                (
                    model.clone(),
                    PriceEntry {
                        input_per_1k_usd: entry.input_per_1k_usd,
                        output_per_1k_usd: entry.output_per_1k_usd,
                    },
                )
            })
            .collect();
        Self { entries }
    }

    /// Look up the price entry for a model. `None` means unpriced — the
    /// caller decides what that implies, never this table.
    pub fn price(&self, model: &str) -> Option<&PriceEntry> {
        self.entries.get(model)
    }

    /// Estimate the cost of a run against this table.
    ///
    /// `amount = in/1000 * input_price + out/1000 * output_price`; an
    /// unpriced model yields a zero amount flagged `priced: false`.
    pub fn estimate(&self, model: &str, usage: TokenUsage) -> CostEstimate {
        match self.price(model) {
            Some(entry) => {
                let input = (usage.input_tokens as f64 / 1000.0) * entry.input_per_1k_usd;
                let output = (usage.output_tokens as f64 / 1000.0) * entry.output_per_1k_usd;
                CostEstimate {
                    input_tokens: usage.input_tokens,
                    output_tokens: usage.output_tokens,
                    amount_usd: input + output,
                    priced: true,
                }
            }
            None => CostEstimate::unpriced(usage),
        }
    }

    /// Number of priced models.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when no models are priced.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
