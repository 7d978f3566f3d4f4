// SPDX-FileCopyrightText: 2026 Tollgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Tollgate policy gate.
//!
//! Provides the error taxonomy and common types used throughout the
//! Tollgate workspace. Everything here is transport-agnostic: the gate's
//! decision contract is a plain synchronous call, and any HTTP or CLI
//! surface wraps these types.

pub mod error;
pub mod types;

pub use error::TollgateError;
pub use types::{CostEstimate, RunRequest, TokenUsage};
