// SPDX-FileCopyrightText: 2026 Tollgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Durable human-approval queue for Tollgate decisions.
//!
//! Runs whose estimated cost crosses the approval threshold are parked
//! here until a human approves or rejects them. The queue owns the record
//! lifecycle exclusively; the decision engine only enqueues and reads.

pub mod queue;

pub use queue::{ApprovalQueue, ApprovalRecord, Disposition};
