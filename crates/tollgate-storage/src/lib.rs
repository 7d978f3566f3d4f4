// SPDX-FileCopyrightText: 2026 Tollgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite persistence layer for the Tollgate policy gate.
//!
//! Provides WAL-mode SQLite storage with embedded migrations and a
//! single-writer concurrency model via `tokio-rusqlite`. The usage ledger
//! and the approval queue both build on the [`Database`] handle exported
//! here; they are the only suspension points in a decision.

pub mod database;
pub mod migrations;

pub use database::{Database, map_tr_err};
