//! Batch reindex audit records.
//!
//! One record per chunk of a batch reindex. Records only move forward:
//! Pending -> InProgress -> {Success, Failed}.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ulid::Ulid;

use crate::error::FjordError;

/// Lifecycle state of a batch record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchStatus {
    Pending,
    InProgress,
    Success,
    Failed,
}

impl BatchStatus {
    fn rank(self) -> u8 {
        match self {
            BatchStatus::Pending => 0,
            BatchStatus::InProgress => 1,
            BatchStatus::Success | BatchStatus::Failed => 2,
        }
    }

    /// Whether the record reached a final state.
    pub fn is_terminal(self) -> bool {
        matches!(self, BatchStatus::Success | BatchStatus::Failed)
    }

    /// Whether moving to `next` keeps the status monotonic.
    ///
    /// Re-entering InProgress is allowed so a redelivered chunk job can
    /// resume its record.
    pub fn can_transition_to(self, next: BatchStatus) -> bool {
        if self == BatchStatus::InProgress && next == BatchStatus::InProgress {
            return true;
        }
        !self.is_terminal() && next.rank() > self.rank()
    }
}

impl std::fmt::Display for BatchStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BatchStatus::Pending => write!(f, "pending"),
            BatchStatus::InProgress => write!(f, "in_progress"),
            BatchStatus::Success => write!(f, "success"),
            BatchStatus::Failed => write!(f, "failed"),
        }
    }
}

/// Persisted audit record for one chunk of a batch reindex.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchRecord {
    /// Record id (ULID)
    pub id: String,
    /// Batch this record belongs to
    pub batch_id: String,
    /// Human readable name, e.g. "feedback 2/10"
    pub name: String,
    pub status: BatchStatus,
    pub message: String,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub creation_time: DateTime<Utc>,
    #[serde(default, with = "chrono::serde::ts_milliseconds_option")]
    pub start_time: Option<DateTime<Utc>>,
    #[serde(default, with = "chrono::serde::ts_milliseconds_option")]
    pub end_time: Option<DateTime<Utc>>,
}

impl BatchRecord {
    /// Create a pending record for a chunk.
    pub fn new(batch_id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: Ulid::new().to_string(),
            batch_id: batch_id.into(),
            name: name.into(),
            status: BatchStatus::Pending,
            message: String::new(),
            creation_time: Utc::now(),
            start_time: None,
            end_time: None,
        }
    }

    fn transition(&mut self, next: BatchStatus) -> Result<(), FjordError> {
        if !self.status.can_transition_to(next) {
            return Err(FjordError::InvalidTransition {
                from: self.status,
                to: next,
            });
        }
        self.status = next;
        Ok(())
    }

    /// Mark the chunk as started.
    pub fn mark_in_progress(&mut self, message: impl Into<String>) -> Result<(), FjordError> {
        self.transition(BatchStatus::InProgress)?;
        self.start_time = Some(Utc::now());
        self.message = message.into();
        Ok(())
    }

    /// Mark the chunk as successfully indexed.
    pub fn mark_success(&mut self) -> Result<(), FjordError> {
        self.transition(BatchStatus::Success)?;
        self.end_time = Some(Utc::now());
        self.message = "Success!".to_string();
        Ok(())
    }

    /// Mark the chunk as failed with a diagnostic message.
    pub fn mark_fail(&mut self, message: impl Into<String>) -> Result<(), FjordError> {
        self.transition(BatchStatus::Failed)?;
        self.end_time = Some(Utc::now());
        self.message = message.into();
        Ok(())
    }

    /// Serialize to JSON bytes for storage
    pub fn to_bytes(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }

    /// Deserialize from JSON bytes
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_record_is_pending() {
        let rec = BatchRecord::new("batch-1", "feedback 1/1");
        assert_eq!(rec.status, BatchStatus::Pending);
        assert!(rec.start_time.is_none());
        assert!(rec.end_time.is_none());
    }

    #[test]
    fn test_success_path() {
        let mut rec = BatchRecord::new("batch-1", "feedback 1/1");
        rec.mark_in_progress("Reindexing into feedback").unwrap();
        assert_eq!(rec.status, BatchStatus::InProgress);
        assert!(rec.start_time.is_some());

        rec.mark_success().unwrap();
        assert_eq!(rec.status, BatchStatus::Success);
        assert!(rec.end_time.is_some());
    }

    #[test]
    fn test_status_never_reverses() {
        let mut rec = BatchRecord::new("batch-1", "feedback 1/1");
        rec.mark_in_progress("go").unwrap();
        rec.mark_fail("boom").unwrap();

        let err = rec.mark_in_progress("again").unwrap_err();
        assert!(matches!(
            err,
            FjordError::InvalidTransition {
                from: BatchStatus::Failed,
                to: BatchStatus::InProgress
            }
        ));
        assert!(rec.mark_success().is_err());
        assert_eq!(rec.status, BatchStatus::Failed);
        assert_eq!(rec.message, "boom");
    }

    #[test]
    fn test_in_progress_reentry_allowed() {
        assert!(BatchStatus::InProgress.can_transition_to(BatchStatus::InProgress));
        assert!(!BatchStatus::Pending.can_transition_to(BatchStatus::Pending));
        assert!(BatchStatus::Pending.can_transition_to(BatchStatus::Failed));
        assert!(!BatchStatus::Success.can_transition_to(BatchStatus::Failed));
    }

    #[test]
    fn test_record_json_format() {
        let rec = BatchRecord::new("batch-1", "feedback 1/1");
        let json = String::from_utf8(rec.to_bytes().unwrap()).unwrap();
        assert!(json.contains("\"status\":\"pending\""));
        assert!(json.contains("\"start_time\":null"));

        let decoded = BatchRecord::from_bytes(json.as_bytes()).unwrap();
        assert_eq!(decoded.id, rec.id);
        assert_eq!(
            decoded.creation_time.timestamp_millis(),
            rec.creation_time.timestamp_millis()
        );
    }
}
