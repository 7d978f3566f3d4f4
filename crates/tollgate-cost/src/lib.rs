// SPDX-FileCopyrightText: 2026 Tollgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Cost estimation and usage accounting for the Tollgate policy gate.
//!
//! This crate provides:
//! - **Pricing**: config-injected per-model prices with explicit misses
//! - **Token estimation**: a pluggable estimator seam (heuristic default,
//!   exact tiktoken implementation)
//! - **Usage ledger**: durable day/month spend aggregation per agent

pub mod estimator;
pub mod ledger;
pub mod pricing;

pub use estimator::{HeuristicEstimator, TiktokenEstimator, TokenEstimator};
pub use ledger::{UsageLedger, day_key, month_key};
pub use pricing::{PriceEntry, PricingTable};
