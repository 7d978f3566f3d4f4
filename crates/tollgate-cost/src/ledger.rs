// SPDX-FileCopyrightText: 2026 Tollgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Durable usage ledger, aggregated by calendar period and agent.
//!
//! Every committed decision lands in two rows — the calendar-day and the
//! calendar-month bucket for the deciding agent — plus a per-model
//! breakdown for each. All four writes happen in one SQLite transaction,
//! so day and month totals can never diverge and the per-model breakdown
//! always sums to the period total.
//!
//! Increments use `ON CONFLICT .. DO UPDATE` so the read-modify-write
//! happens inside SQLite; combined with the single background writer
//! thread there is no lost-update window anywhere in Rust code.

use chrono::{DateTime, Utc};
use tollgate_core::TollgateError;
use tollgate_storage::{Database, map_tr_err};
use tracing::info;

/// Calendar-month period key, e.g. `2026-08`.
pub fn month_key(now: DateTime<Utc>) -> String {
    now.format("%Y-%m").to_string()
}

/// Calendar-day period key, e.g. `2026-08-06`.
pub fn day_key(now: DateTime<Utc>) -> String {
    now.format("%Y-%m-%d").to_string()
}

/// Persistent usage ledger backed by SQLite.
pub struct UsageLedger {
    db: Database,
}

impl UsageLedger {
    /// Create a ledger over an opened database.
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Commit one realized (or about-to-run) cost for an agent.
    ///
    /// Atomically increments total, run count, and the per-model breakdown
    /// for BOTH the day and the month bucket derived from `now`. Rows are
    /// created lazily on first commit and never deleted.
    pub async fn commit(
        &self,
        now: DateTime<Utc>,
        agent_id: &str,
        model: &str,
        amount_usd: f64,
    ) -> Result<(), TollgateError> {
        let day = day_key(now);
        let month = month_key(now);
        let agent = agent_id.to_string();
        let model_owned = model.to_string();

        self.db
            .connection()
            .call(move |conn| -> Result<(), rusqlite::Error> {
                let tx = conn.transaction()?;
                for period in [&day, &month] {
                    tx.execute(
                        "INSERT INTO usage_ledger (period_key, agent_id, total_cost_usd, run_count)
                         VALUES (?1, ?2, ?3, 1)
                         ON CONFLICT(period_key, agent_id) DO UPDATE SET
                             total_cost_usd = total_cost_usd + excluded.total_cost_usd,
                             run_count = run_count + 1",
                        rusqlite::params![period, agent, amount_usd],
                    )?;
                    tx.execute(
                        "INSERT INTO usage_by_model (period_key, agent_id, model, cost_usd)
                         VALUES (?1, ?2, ?3, ?4)
                         ON CONFLICT(period_key, agent_id, model) DO UPDATE SET
                             cost_usd = cost_usd + excluded.cost_usd",
                        rusqlite::params![period, agent, model_owned, amount_usd],
                    )?;
                }
                tx.commit()?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)?;

        info!(
            agent_id,
            model,
            amount_usd,
            day = %day_key(now),
            month = %month_key(now),
            "usage committed"
        );

        Ok(())
    }

    /// Total spend for a period across all agents.
    pub async fn period_total(&self, period_key: &str) -> Result<f64, TollgateError> {
        let period = period_key.to_string();
        self.db
            .connection()
            .call(move |conn| -> Result<f64, rusqlite::Error> {
                conn.query_row(
                    "SELECT COALESCE(SUM(total_cost_usd), 0.0) FROM usage_ledger
                     WHERE period_key = ?1",
                    rusqlite::params![period],
                    |row| row.get(0),
                )
            })
            .await
            .map_err(map_tr_err)
    }

    /// Total spend for one agent in a period.
    pub async fn agent_period_total(
        &self,
        period_key: &str,
        agent_id: &str,
    ) -> Result<f64, TollgateError> {
        let period = period_key.to_string();
        let agent = agent_id.to_string();
        self.db
            .connection()
            .call(move |conn| -> Result<f64, rusqlite::Error> {
                conn.query_row(
                    "SELECT COALESCE(SUM(total_cost_usd), 0.0) FROM usage_ledger
                     WHERE period_key = ?1 AND agent_id = ?2",
                    rusqlite::params![period, agent],
                    |row| row.get(0),
                )
            })
            .await
            .map_err(map_tr_err)
    }

    /// Committed run count for one agent in a period.
    pub async fn agent_run_count(
        &self,
        period_key: &str,
        agent_id: &str,
    ) -> Result<u64, TollgateError> {
        let period = period_key.to_string();
        let agent = agent_id.to_string();
        self.db
            .connection()
            .call(move |conn| -> Result<u64, rusqlite::Error> {
                conn.query_row(
                    "SELECT COALESCE(SUM(run_count), 0) FROM usage_ledger
                     WHERE period_key = ?1 AND agent_id = ?2",
                    rusqlite::params![period, agent],
                    |row| row.get(0),
                )
            })
            .await
            .map_err(map_tr_err)
    }

    /// Per-model cost breakdown for one agent in a period, largest first.
    pub async fn cost_by_model(
        &self,
        period_key: &str,
        agent_id: &str,
    ) -> Result<Vec<(String, f64)>, TollgateError> {
        let period = period_key.to_string();
        let agent = agent_id.to_string();
        self.db
            .connection()
            .call(move |conn| -> Result<Vec<(String, f64)>, rusqlite::Error> {
                let mut stmt = conn.prepare(
                    "SELECT model, cost_usd FROM usage_by_model
                     WHERE period_key = ?1 AND agent_id = ?2
                     ORDER BY cost_usd DESC, model ASC",
                )?;
                let rows = stmt
                    .query_map(rusqlite::params![period, agent], |row| {
                        Ok((row.get(0)?, row.get(1)?))
                    })?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(rows)
            })
            .await
            .map_err(map_tr_err)
    }
}
