// SPDX-FileCopyrightText: 2026 Tollgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Model-blocking policy and versioned policy snapshots for Tollgate.
//!
//! [`BlockPolicy`] answers "is this model usable right now, and if not,
//! what should replace it"; [`PolicySnapshot`] bundles it with pricing,
//! thresholds, and quotas into the immutable view the decision engine
//! consumes.

pub mod blocklist;
pub mod snapshot;

pub use blocklist::{BlockEntry, BlockPolicy, BlockStatus};
pub use snapshot::{PolicySnapshot, SharedPolicy, Thresholds};
