// SPDX-FileCopyrightText: 2026 Tollgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Tollgate policy gate.

use thiserror::Error;

/// The primary error type used across all Tollgate crates.
///
/// Policy rejections are NOT errors — they are ordinary
/// `DecisionOutcome::Rejected` values. This enum covers operational
/// failures only, so callers can distinguish "the policy said no"
/// from "the gate itself broke" and retry the latter.
#[derive(Debug, Error)]
pub enum TollgateError {
    /// Configuration errors (invalid TOML, missing sections, bad values).
    /// Fatal at startup, never produced per-request.
    #[error("configuration error: {0}")]
    Config(String),

    /// Storage backend errors (database open, query failure, migration).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// No approval record exists for the given id.
    #[error("approval not found: {id}")]
    ApprovalNotFound { id: String },

    /// The approval record was already decided; dispositions are set
    /// exactly once and never overwritten.
    #[error("approval already decided: {id}")]
    ApprovalAlreadyDecided { id: String },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl TollgateError {
    /// Wrap any error as a storage failure.
    pub fn storage<E>(source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Storage {
            source: Box::new(source),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_messages_name_the_record() {
        let err = TollgateError::ApprovalNotFound {
            id: "abc-123".into(),
        };
        assert!(err.to_string().contains("abc-123"));

        let err = TollgateError::ApprovalAlreadyDecided {
            id: "abc-123".into(),
        };
        assert!(err.to_string().contains("already decided"));
    }

    #[test]
    fn storage_wraps_source() {
        let err = TollgateError::storage(std::io::Error::other("disk gone"));
        assert!(err.to_string().contains("disk gone"));
    }
}
