// SPDX-FileCopyrightText: 2026 Tollgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The Tollgate decision engine.
//!
//! Ties the block policy, cost estimation, usage ledger, and approval
//! queue into one synchronous contract:
//! `decide(RunRequest, now) -> DecisionOutcome`. Any transport may wrap
//! it; the workspace binary is the reference consumer.

pub mod engine;
pub mod outcome;

pub use engine::DecisionEngine;
pub use outcome::{DecisionOutcome, RejectReason};
