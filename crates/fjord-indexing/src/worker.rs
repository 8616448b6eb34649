//! Indexing worker.
//!
//! Executes the three job kinds:
//! - `index_item`: fetch one entity, extract, bulk index and commit
//! - `unindex_item`: delete one document
//! - `index_chunk`: index a batch chunk while tracking its batch record
//!
//! Single-item failures are rescheduled through the [`RetryPolicy`] as a new
//! delayed job; the failing invocation itself never waits. Chunk jobs are not
//! retried: their record is marked failed and the error propagates.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use fjord_storage::{with_primary, EntityStore, Storage};
use fjord_search::SearchError;
use fjord_types::{ChunkJob, IndexDocument, Job, WorkItem};

use crate::backend::SearchBackend;
use crate::doctype::{DocType, DocTypeRegistry};
use crate::error::IndexingError;
use crate::queue::{JobQueue, QueueReceiver};
use crate::retry::{RetryDecision, RetryPolicy};

/// Result of a job that did not fail for good.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskOutcome {
    /// The job did its work
    Done,
    /// The job failed and a new attempt was enqueued
    RetryScheduled { attempt: u32, delay: Duration },
}

/// Counters of handled jobs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WorkerStats {
    pub succeeded: u64,
    pub retries_scheduled: u64,
    pub failed: u64,
    pub undecodable: u64,
}

#[derive(Default)]
struct Counters {
    succeeded: AtomicU64,
    retries_scheduled: AtomicU64,
    failed: AtomicU64,
    undecodable: AtomicU64,
}

/// Executes indexing jobs against the entity store and search indexes.
pub struct IndexingWorker {
    registry: Arc<DocTypeRegistry>,
    entities: Arc<dyn EntityStore>,
    records: Arc<Storage>,
    queue: Arc<dyn JobQueue>,
    retry: RetryPolicy,
    live_index: String,
    indexes: HashMap<String, Arc<dyn SearchBackend>>,
    counters: Counters,
}

impl IndexingWorker {
    /// Create a worker whose live jobs write into `live_index`.
    pub fn new(
        registry: Arc<DocTypeRegistry>,
        entities: Arc<dyn EntityStore>,
        records: Arc<Storage>,
        queue: Arc<dyn JobQueue>,
        retry: RetryPolicy,
        live_index: impl Into<String>,
        backend: Arc<dyn SearchBackend>,
    ) -> Self {
        let live_index = live_index.into();
        let mut indexes = HashMap::new();
        indexes.insert(live_index.clone(), backend);
        Self {
            registry,
            entities,
            records,
            queue,
            retry,
            live_index,
            indexes,
            counters: Counters::default(),
        }
    }

    /// Make another index available to chunk jobs.
    pub fn with_index(mut self, name: impl Into<String>, backend: Arc<dyn SearchBackend>) -> Self {
        self.indexes.insert(name.into(), backend);
        self
    }

    fn backend(&self, index: &str) -> Result<&Arc<dyn SearchBackend>, IndexingError> {
        self.indexes
            .get(index)
            .ok_or_else(|| IndexingError::UnknownIndex(index.to_string()))
    }

    /// Snapshot of the job counters.
    pub fn stats(&self) -> WorkerStats {
        WorkerStats {
            succeeded: self.counters.succeeded.load(Ordering::Relaxed),
            retries_scheduled: self.counters.retries_scheduled.load(Ordering::Relaxed),
            failed: self.counters.failed.load(Ordering::Relaxed),
            undecodable: self.counters.undecodable.load(Ordering::Relaxed),
        }
    }

    // ==================== Single item ====================

    /// Index one entity into the live index.
    pub fn index_item(&self, item: &WorkItem) -> Result<TaskOutcome, IndexingError> {
        debug!(
            doctype = %item.doctype,
            entity_id = item.entity_id,
            attempt = item.attempt_count,
            "Index attempt"
        );
        match self.try_index_item(item) {
            Ok(()) => Ok(TaskOutcome::Done),
            Err(err) => self.reschedule("index_item", Job::IndexItem, item, err),
        }
    }

    fn try_index_item(&self, item: &WorkItem) -> Result<(), IndexingError> {
        let doctype = self.registry.resolve(&item.doctype)?;
        let raw = self
            .entities
            .get_entity(doctype.model(), item.entity_id)?
            .ok_or_else(|| IndexingError::EntityNotFound {
                doctype: item.doctype.to_string(),
                entity_id: item.entity_id,
            })?;
        let doc = doctype.extract_doc(item.entity_id, &raw)?;

        let backend = self.backend(&self.live_index)?;
        commit_or_rollback(backend.as_ref(), |b| b.bulk_index(&[doc]).map(|_| ()))
    }

    /// Remove one entity from the live index.
    pub fn unindex_item(&self, item: &WorkItem) -> Result<TaskOutcome, IndexingError> {
        debug!(
            doctype = %item.doctype,
            entity_id = item.entity_id,
            attempt = item.attempt_count,
            "Unindex attempt"
        );
        match self.try_unindex_item(item) {
            Ok(()) => Ok(TaskOutcome::Done),
            Err(err) => self.reschedule("unindex_item", Job::UnindexItem, item, err),
        }
    }

    fn try_unindex_item(&self, item: &WorkItem) -> Result<(), IndexingError> {
        let doctype = self.registry.resolve(&item.doctype)?;
        let backend = self.backend(&self.live_index)?;
        commit_or_rollback(backend.as_ref(), |b| b.delete(&doctype.doc_id(item.entity_id)))
    }

    fn reschedule(
        &self,
        task: &'static str,
        make_job: fn(WorkItem) -> Job,
        item: &WorkItem,
        err: IndexingError,
    ) -> Result<TaskOutcome, IndexingError> {
        error!(
            task,
            doctype = %item.doctype,
            entity_id = item.entity_id,
            attempt = item.attempt_count,
            error = %err,
            "Error while live indexing"
        );

        match self.retry.decide(item.attempt_count) {
            RetryDecision::Retry {
                next_attempt,
                delay,
            } => {
                self.queue.enqueue_after(make_job(item.next_attempt()), delay)?;
                info!(
                    task,
                    entity_id = item.entity_id,
                    attempt = next_attempt,
                    delay_secs = delay.as_secs(),
                    "Retry scheduled"
                );
                Ok(TaskOutcome::RetryScheduled {
                    attempt: next_attempt,
                    delay,
                })
            }
            RetryDecision::GiveUp => Err(IndexingError::RetriesExhausted {
                task,
                doctype: item.doctype.to_string(),
                entity_id: item.entity_id,
                attempts: item.attempt_count,
                source: Box::new(err),
            }),
        }
    }

    // ==================== Batch chunk ====================

    /// Index a batch chunk with reads pinned to the primary store.
    ///
    /// Returns the number of documents indexed. The chunk's batch record ends
    /// up `Success`, or `Failed` with the error text when anything fails.
    pub async fn index_chunk(&self, job: &ChunkJob) -> Result<usize, IndexingError> {
        with_primary(async { self.index_chunk_pinned(job) }).await
    }

    fn index_chunk_pinned(&self, job: &ChunkJob) -> Result<usize, IndexingError> {
        let mut record = self
            .records
            .get_batch_record(&job.batch_id, &job.record_id)?
            .ok_or_else(|| IndexingError::RecordNotFound {
                batch_id: job.batch_id.clone(),
                record_id: job.record_id.clone(),
            })?;

        record.mark_in_progress(format!("Reindexing into {}", job.index))?;

        let result = self
            .records
            .put_batch_record(&record)
            .map_err(IndexingError::from)
            .and_then(|()| self.index_chunk_docs(job));
        match result {
            Ok(count) => {
                record.mark_success()?;
                self.records.put_batch_record(&record)?;
                info!(
                    batch_id = %job.batch_id,
                    record = %record.name,
                    count,
                    "Chunk indexed"
                );
                Ok(count)
            }
            Err(err) => {
                error!(
                    batch_id = %job.batch_id,
                    record = %record.name,
                    error = %err,
                    "Chunk failed"
                );
                let saved = record
                    .mark_fail(format!("Errored out {}", err))
                    .map_err(IndexingError::from)
                    .and_then(|()| self.records.put_batch_record(&record).map_err(Into::into));
                if let Err(save_err) = saved {
                    warn!(error = %save_err, "Could not record chunk failure");
                }
                Err(err)
            }
        }
    }

    fn index_chunk_docs(&self, job: &ChunkJob) -> Result<usize, IndexingError> {
        let (doctype_name, ids) = &job.chunk;
        let doctype = self.registry.resolve(doctype_name)?;
        let backend = self.backend(&job.index)?;

        let docs = self.extract_all(doctype.as_ref(), ids)?;
        commit_or_rollback(backend.as_ref(), |b| b.bulk_index(&docs))
    }

    fn extract_all(
        &self,
        doctype: &dyn DocType,
        ids: &[u64],
    ) -> Result<Vec<IndexDocument>, IndexingError> {
        let mut docs = Vec::with_capacity(ids.len());
        for &id in ids {
            match self.entities.get_entity(doctype.model(), id)? {
                Some(raw) => docs.push(doctype.extract_doc(id, &raw)?),
                // Deleted after the batch was planned
                None => debug!(
                    doctype = %doctype.name(),
                    entity_id = id,
                    "Skipping missing entity"
                ),
            }
        }
        Ok(docs)
    }

    // ==================== Dispatch ====================

    /// Run one job.
    pub async fn handle(&self, job: &Job) -> Result<TaskOutcome, IndexingError> {
        match job {
            Job::IndexItem(item) => self.index_item(item),
            Job::UnindexItem(item) => self.unindex_item(item),
            Job::IndexChunk(chunk) => self.index_chunk(chunk).await.map(|_| TaskOutcome::Done),
        }
    }

    async fn handle_logged(&self, job: Job) {
        match self.handle(&job).await {
            Ok(TaskOutcome::Done) => {
                self.counters.succeeded.fetch_add(1, Ordering::Relaxed);
            }
            Ok(TaskOutcome::RetryScheduled { .. }) => {
                self.counters.retries_scheduled.fetch_add(1, Ordering::Relaxed);
            }
            Err(e) => {
                self.counters.failed.fetch_add(1, Ordering::Relaxed);
                error!(task = job.task_name(), error = %e, "Job failed");
            }
        }
    }

    fn dropped(&self, err: impl std::fmt::Display) {
        self.counters.undecodable.fetch_add(1, Ordering::Relaxed);
        warn!(error = %err, "Dropping undecodable job");
    }

    /// Consume jobs until the queue closes or `cancel` fires.
    pub async fn run(&self, mut receiver: QueueReceiver, cancel: CancellationToken) {
        info!(index = %self.live_index, "Indexing worker started");
        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    info!("Indexing worker stopping");
                    break;
                }
                next = receiver.recv() => match next {
                    Some(Ok(job)) => self.handle_logged(job).await,
                    Some(Err(e)) => self.dropped(e),
                    None => {
                        info!("Queue closed, indexing worker stopping");
                        break;
                    }
                },
            }
        }
    }

    /// Handle every job that is ready now, then return the counters.
    ///
    /// Delayed jobs that are not yet due are left in the queue.
    pub async fn run_until_idle(&self, receiver: &mut QueueReceiver) -> WorkerStats {
        while let Some(next) = receiver.try_recv() {
            match next {
                Ok(job) => self.handle_logged(job).await,
                Err(e) => self.dropped(e),
            }
        }
        self.stats()
    }
}

/// Apply `write` and commit it. Staged changes are rolled back on failure so
/// a later commit cannot publish them.
fn commit_or_rollback<T>(
    backend: &dyn SearchBackend,
    write: impl FnOnce(&dyn SearchBackend) -> Result<T, SearchError>,
) -> Result<T, IndexingError> {
    match write(backend).and_then(|value| backend.commit().map(|()| value)) {
        Ok(value) => Ok(value),
        Err(err) => {
            if let Err(rollback_err) = backend.rollback() {
                warn!(error = %rollback_err, "Could not roll back index changes");
            }
            Err(err.into())
        }
    }
}
