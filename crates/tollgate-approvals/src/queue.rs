// SPDX-FileCopyrightText: 2026 Tollgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Durable queue of decisions awaiting human disposition.
//!
//! Records are created `pending`, transition to `approved` or `rejected`
//! exactly once, and are never deleted — the table is the audit trail.
//! A `decide` racing another `decide` on the same id has exactly one
//! winner; the loser gets `ApprovalAlreadyDecided` and the record is left
//! untouched. Linearizability comes from the single background writer
//! thread: both the disposition check and the update run in one closure.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use tollgate_core::{CostEstimate, RunRequest, TollgateError};
use tollgate_storage::{Database, map_tr_err};
use tracing::info;

/// Longest prompt prefix persisted with an approval record. The full
/// prompt never hits disk.
const PROMPT_PREVIEW_MAX_CHARS: usize = 240;

/// Timestamp format persisted to SQLite (sorts lexicographically).
const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3fZ";

/// Terminal and non-terminal states of an approval record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Disposition {
    /// Awaiting human review.
    Pending,
    /// Approved by a reviewer. Terminal.
    Approved,
    /// Rejected by a reviewer. Terminal.
    Rejected,
}

/// One queued decision awaiting (or having received) human disposition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApprovalRecord {
    /// Unique record identifier (UUID v4).
    pub id: String,
    /// Agent that asked to run.
    pub agent_id: String,
    /// Model the agent asked for.
    pub requested_model: String,
    /// Estimated input tokens at enqueue time.
    pub input_tokens: u32,
    /// Estimated output tokens at enqueue time.
    pub output_tokens: u32,
    /// Estimated cost in USD at enqueue time.
    pub estimated_cost_usd: f64,
    /// Bounded prefix of the prompt, for reviewer context.
    pub prompt_preview: String,
    /// Current disposition.
    pub disposition: Disposition,
    /// Reviewer who decided, absent while pending.
    pub reviewer: Option<String>,
    /// ISO 8601 creation timestamp.
    pub created_at: String,
    /// ISO 8601 decision timestamp, absent while pending.
    pub decided_at: Option<String>,
}

/// Persistent approval queue backed by SQLite.
pub struct ApprovalQueue {
    db: Database,
}

/// Outcome of the transactional decide closure, mapped to errors outside.
enum DecideRow {
    NotFound,
    AlreadyDecided,
    Updated(ApprovalRecord),
}

impl ApprovalQueue {
    /// Create a queue over an opened database.
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Queue a run for human review. Returns the generated record id.
    ///
    /// Enqueuing never touches the usage ledger: budget is consumed only
    /// after a human approves, by whoever executes the approved run.
    pub async fn enqueue(
        &self,
        request: &RunRequest,
        estimate: &CostEstimate,
        now: DateTime<Utc>,
    ) -> Result<String, TollgateError> {
        let id = uuid::Uuid::new_v4().to_string();
        let agent_id = request.agent_id.clone();
        let requested_model = request.requested_model.clone();
        let prompt_preview: String = request
            .prompt_text
            .chars()
            .take(PROMPT_PREVIEW_MAX_CHARS)
            .collect();
        let input_tokens = estimate.input_tokens;
        let output_tokens = estimate.output_tokens;
        let estimated_cost_usd = estimate.amount_usd;
        let created_at = now.format(TIMESTAMP_FORMAT).to_string();

        let id_for_insert = id.clone();
        self.db
            .connection()
            .call(move |conn| -> Result<(), rusqlite::Error> {
                conn.execute(
                    "INSERT INTO approvals (id, agent_id, requested_model, input_tokens, \
                     output_tokens, estimated_cost_usd, prompt_preview, disposition, created_at) \
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, 'pending', ?8)",
                    rusqlite::params![
                        id_for_insert,
                        agent_id,
                        requested_model,
                        input_tokens,
                        output_tokens,
                        estimated_cost_usd,
                        prompt_preview,
                        created_at,
                    ],
                )?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)?;

        info!(
            approval_id = %id,
            agent_id = %request.agent_id,
            model = %request.requested_model,
            estimated_cost_usd = estimate.amount_usd,
            "approval queued"
        );

        Ok(id)
    }

    /// All pending records, oldest first.
    pub async fn list_pending(&self) -> Result<Vec<ApprovalRecord>, TollgateError> {
        self.db
            .connection()
            .call(|conn| -> Result<Vec<ApprovalRecord>, rusqlite::Error> {
                let mut stmt = conn.prepare(
                    "SELECT id, agent_id, requested_model, input_tokens, output_tokens, \
                     estimated_cost_usd, prompt_preview, disposition, reviewer, created_at, \
                     decided_at FROM approvals WHERE disposition = 'pending' \
                     ORDER BY created_at ASC, id ASC",
                )?;
                let rows = stmt
                    .query_map([], row_to_record)?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(rows)
            })
            .await
            .map_err(map_tr_err)
    }

    /// Fetch one record by id, decided or not.
    pub async fn get(&self, id: &str) -> Result<Option<ApprovalRecord>, TollgateError> {
        let id = id.to_string();
        self.db
            .connection()
            .call(move |conn| -> Result<Option<ApprovalRecord>, rusqlite::Error> {
                let mut stmt = conn.prepare(
                    "SELECT id, agent_id, requested_model, input_tokens, output_tokens, \
                     estimated_cost_usd, prompt_preview, disposition, reviewer, created_at, \
                     decided_at FROM approvals WHERE id = ?1",
                )?;
                match stmt.query_row(rusqlite::params![id], row_to_record) {
                    Ok(record) => Ok(Some(record)),
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e),
                }
            })
            .await
            .map_err(map_tr_err)
    }

    /// Record a human disposition for a pending approval.
    ///
    /// Fails with `ApprovalNotFound` for an absent id and with
    /// `ApprovalAlreadyDecided` for a record whose disposition is already
    /// terminal; the existing record is never overwritten.
    pub async fn decide(
        &self,
        id: &str,
        approved: bool,
        reviewer: &str,
        now: DateTime<Utc>,
    ) -> Result<ApprovalRecord, TollgateError> {
        let id_owned = id.to_string();
        let reviewer_owned = reviewer.to_string();
        let disposition = if approved {
            Disposition::Approved
        } else {
            Disposition::Rejected
        };
        let decided_at = now.format(TIMESTAMP_FORMAT).to_string();

        let row = self
            .db
            .connection()
            .call(move |conn| -> Result<DecideRow, rusqlite::Error> {
                let tx = conn.transaction()?;

                let current: Option<String> = {
                    let mut stmt =
                        tx.prepare("SELECT disposition FROM approvals WHERE id = ?1")?;
                    match stmt.query_row(rusqlite::params![id_owned], |row| row.get(0)) {
                        Ok(d) => Some(d),
                        Err(rusqlite::Error::QueryReturnedNoRows) => None,
                        Err(e) => return Err(e),
                    }
                };

                match current.as_deref() {
                    None => {
                        tx.commit()?;
                        Ok(DecideRow::NotFound)
                    }
                    Some(d) if d != "pending" => {
                        tx.commit()?;
                        Ok(DecideRow::AlreadyDecided)
                    }
                    Some(_) => {
                        tx.execute(
                            "UPDATE approvals SET disposition = ?1, reviewer = ?2, \
                             decided_at = ?3 WHERE id = ?4",
                            rusqlite::params![
                                disposition.to_string(),
                                reviewer_owned,
                                decided_at,
                                id_owned
                            ],
                        )?;
                        let record = {
                            let mut stmt = tx.prepare(
                                "SELECT id, agent_id, requested_model, input_tokens, \
                                 output_tokens, estimated_cost_usd, prompt_preview, \
                                 disposition, reviewer, created_at, decided_at \
                                 FROM approvals WHERE id = ?1",
                            )?;
                            stmt.query_row(rusqlite::params![id_owned], row_to_record)?
                        };
                        tx.commit()?;
                        Ok(DecideRow::Updated(record))
                    }
                }
            })
            .await
            .map_err(map_tr_err)?;

        match row {
            DecideRow::NotFound => Err(TollgateError::ApprovalNotFound { id: id.to_string() }),
            DecideRow::AlreadyDecided => {
                Err(TollgateError::ApprovalAlreadyDecided { id: id.to_string() })
            }
            DecideRow::Updated(record) => {
                info!(
                    approval_id = %record.id,
                    disposition = %record.disposition,
                    reviewer,
                    "approval decided"
                );
                Ok(record)
            }
        }
    }
}

/// Map one `approvals` row to an [`ApprovalRecord`].
fn row_to_record(row: &rusqlite::Row<'_>) -> Result<ApprovalRecord, rusqlite::Error> {
    let disposition_str: String = row.get(7)?;
    let disposition = disposition_str.parse().map_err(|_| {
        rusqlite::Error::FromSqlConversionFailure(
            7,
            rusqlite::types::Type::Text,
            format!("bad disposition: {disposition_str}").into(),
        )
    })?;
    Ok(ApprovalRecord {
        id: row.get(0)?,
        agent_id: row.get(1)?,
        requested_model: row.get(2)?,
        input_tokens: row.get(3)?,
        output_tokens: row.get(4)?,
        estimated_cost_usd: row.get(5)?,
        prompt_preview: row.get(6)?,
        disposition,
        reviewer: row.get(8)?,
        created_at: row.get(9)?,
        decided_at: row.get(10)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tollgate_core::TokenUsage;

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 8, 6, 12, 0, 0).unwrap()
    }

    fn request(agent: &str, prompt: &str) -> RunRequest {
        RunRequest {
            agent_id: agent.to_string(),
            requested_model: "gpt-5".to_string(),
            prompt_text: prompt.to_string(),
            declared_max_output_tokens: 500,
            premium_requested: false,
        }
    }

    fn estimate(amount: f64) -> CostEstimate {
        CostEstimate {
            input_tokens: 1000,
            output_tokens: 500,
            amount_usd: amount,
            priced: true,
        }
    }

    async fn queue() -> ApprovalQueue {
        ApprovalQueue::new(Database::open_in_memory().await.unwrap())
    }

    #[tokio::test]
    async fn enqueue_then_list_pending_round_trip() {
        let queue = queue().await;
        let id = queue
            .enqueue(&request("bot-a", "expensive prompt"), &estimate(2.5), fixed_now())
            .await
            .unwrap();

        let pending = queue.list_pending().await.unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].id, id);
        assert_eq!(pending[0].disposition, Disposition::Pending);
        assert_eq!(pending[0].agent_id, "bot-a");
        assert!(pending[0].reviewer.is_none());
        assert!(pending[0].decided_at.is_none());
    }

    #[tokio::test]
    async fn approve_moves_record_out_of_pending() {
        let queue = queue().await;
        let id = queue
            .enqueue(&request("bot-a", "prompt"), &estimate(2.5), fixed_now())
            .await
            .unwrap();

        let decided = queue.decide(&id, true, "alice", fixed_now()).await.unwrap();
        assert_eq!(decided.disposition, Disposition::Approved);
        assert_eq!(decided.reviewer.as_deref(), Some("alice"));
        assert!(decided.decided_at.is_some());

        assert!(queue.list_pending().await.unwrap().is_empty());
        let stored = queue.get(&id).await.unwrap().unwrap();
        assert_eq!(stored.disposition, Disposition::Approved);
    }

    #[tokio::test]
    async fn second_decide_fails_and_leaves_record_unchanged() {
        let queue = queue().await;
        let id = queue
            .enqueue(&request("bot-a", "prompt"), &estimate(2.5), fixed_now())
            .await
            .unwrap();

        queue.decide(&id, false, "alice", fixed_now()).await.unwrap();
        let err = queue
            .decide(&id, true, "mallory", fixed_now())
            .await
            .unwrap_err();
        assert!(matches!(err, TollgateError::ApprovalAlreadyDecided { .. }));

        let stored = queue.get(&id).await.unwrap().unwrap();
        assert_eq!(stored.disposition, Disposition::Rejected);
        assert_eq!(stored.reviewer.as_deref(), Some("alice"));
    }

    #[tokio::test]
    async fn decide_unknown_id_is_not_found() {
        let queue = queue().await;
        let err = queue
            .decide("no-such-id", true, "alice", fixed_now())
            .await
            .unwrap_err();
        assert!(matches!(err, TollgateError::ApprovalNotFound { .. }));
    }

    #[tokio::test]
    async fn pending_list_is_ordered_by_creation() {
        let queue = queue().await;
        let t1 = Utc.with_ymd_and_hms(2026, 8, 6, 9, 0, 0).unwrap();
        let t2 = Utc.with_ymd_and_hms(2026, 8, 6, 10, 0, 0).unwrap();

        let late = queue
            .enqueue(&request("bot-b", "later"), &estimate(1.0), t2)
            .await
            .unwrap();
        let early = queue
            .enqueue(&request("bot-a", "earlier"), &estimate(1.0), t1)
            .await
            .unwrap();

        let pending = queue.list_pending().await.unwrap();
        assert_eq!(pending[0].id, early);
        assert_eq!(pending[1].id, late);
    }

    #[tokio::test]
    async fn prompt_preview_is_bounded() {
        let queue = queue().await;
        let long_prompt = "x".repeat(10_000);
        let id = queue
            .enqueue(&request("bot-a", &long_prompt), &estimate(1.0), fixed_now())
            .await
            .unwrap();

        let stored = queue.get(&id).await.unwrap().unwrap();
        assert_eq!(stored.prompt_preview.chars().count(), 240);
    }

    #[tokio::test]
    async fn rapid_enqueues_generate_unique_ids() {
        let db = Database::open_in_memory().await.unwrap();
        let mut handles = Vec::new();
        for i in 0..20 {
            let queue = ApprovalQueue::new(db.clone());
            handles.push(tokio::spawn(async move {
                queue
                    .enqueue(
                        &RunRequest {
                            agent_id: format!("bot-{i}"),
                            requested_model: "gpt-5".to_string(),
                            prompt_text: "p".to_string(),
                            declared_max_output_tokens: 0,
                            premium_requested: false,
                        },
                        &CostEstimate {
                            input_tokens: 1,
                            output_tokens: 1,
                            amount_usd: 0.01,
                            priced: true,
                        },
                        Utc.with_ymd_and_hms(2026, 8, 6, 12, 0, 0).unwrap(),
                    )
                    .await
            }));
        }

        let mut ids = std::collections::HashSet::new();
        for handle in handles {
            assert!(ids.insert(handle.await.unwrap().unwrap()));
        }
        assert_eq!(ids.len(), 20);
    }

    #[tokio::test]
    async fn racing_decides_have_one_winner() {
        let db = Database::open_in_memory().await.unwrap();
        let queue = ApprovalQueue::new(db.clone());
        let id = queue
            .enqueue(&request("bot-a", "prompt"), &estimate(2.0), fixed_now())
            .await
            .unwrap();

        let mut handles = Vec::new();
        for i in 0..5 {
            let queue = ApprovalQueue::new(db.clone());
            let id = id.clone();
            handles.push(tokio::spawn(async move {
                queue
                    .decide(&id, i % 2 == 0, &format!("reviewer-{i}"), fixed_now())
                    .await
            }));
        }

        let mut wins = 0;
        for handle in handles {
            if handle.await.unwrap().is_ok() {
                wins += 1;
            }
        }
        assert_eq!(wins, 1, "exactly one decide may win");
    }

    #[test]
    fn disposition_display_round_trips() {
        assert_eq!(Disposition::Pending.to_string(), "pending");
        assert_eq!(
            "approved".parse::<Disposition>().unwrap(),
            Disposition::Approved
        );
        assert!("garbage".parse::<Disposition>().is_err());
    }
}
