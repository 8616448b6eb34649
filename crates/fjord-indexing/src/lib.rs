//! # fjord-indexing
//!
//! Asynchronous indexing pipeline for fjord.
//!
//! Entity saves and deletes are turned into jobs by the [`ChangeDetector`],
//! carried by a [`JobQueue`] and executed by the [`IndexingWorker`]. Failed
//! single-item jobs are rescheduled by the [`RetryPolicy`]; batch reindex
//! runs are split into chunks by the [`BatchReindexer`] and tracked as
//! persisted batch records.
//!
//! ## Components
//!
//! - [`DocTypeRegistry`]: resolves a type identifier to its extraction handler
//! - [`LocalQueue`]: in-process queue, jobs serialized as JSON
//! - [`IndexingWorker`]: runs index, unindex and chunk jobs
//! - [`ChangeDetector`]: live indexing on entity lifecycle events
//! - [`Notifier`]: best-effort operator notification

pub mod backend;
pub mod detector;
pub mod doctype;
pub mod error;
pub mod notify;
pub mod queue;
pub mod reindex;
pub mod retry;
pub mod worker;

#[cfg(test)]
pub(crate) mod testing;

pub use backend::SearchBackend;
pub use detector::{
    ChangeDetector, DetectorOutcome, EntityRef, LifecycleEvent, LiveIndexConfig, Signal,
};
pub use doctype::{DocType, DocTypeRegistry, ResponseDocType};
pub use error::IndexingError;
pub use notify::{notifier_from_settings, Notifier, TracingNotifier, WebhookNotifier};
pub use queue::{JobQueue, LocalQueue, QueueError, QueueReceiver};
pub use reindex::{plan_chunks, BatchReindexer, BatchSummary, ReindexPlan};
pub use retry::{RetryDecision, RetryPolicy};
pub use worker::{IndexingWorker, TaskOutcome, WorkerStats};
