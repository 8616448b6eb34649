//! Batch reindexing.
//!
//! A reindex run lists every entity id of the requested doctypes, splits the
//! ids into chunks and gives each chunk a `Pending` batch record plus one
//! `IndexChunk` job. All records of a run share one batch id so progress can
//! be followed with [`BatchSummary`].

use std::sync::Arc;

use serde::Serialize;
use tracing::{error, info};
use ulid::Ulid;

use fjord_storage::{EntityStore, Storage};
use fjord_types::{BatchRecord, BatchStatus, ChunkJob, Job, TypeIdentifier};

use crate::doctype::DocTypeRegistry;
use crate::error::IndexingError;
use crate::queue::JobQueue;

/// Split `ids` into consecutive chunks of at most `chunk_size` ids.
pub fn plan_chunks(
    doctype: &TypeIdentifier,
    ids: &[u64],
    chunk_size: usize,
) -> Vec<(TypeIdentifier, Vec<u64>)> {
    ids.chunks(chunk_size.max(1))
        .map(|chunk| (doctype.clone(), chunk.to_vec()))
        .collect()
}

/// What a reindex run enqueued.
#[derive(Debug, Clone, Serialize)]
pub struct ReindexPlan {
    pub batch_id: String,
    pub index: String,
    /// Number of entities across all chunks
    pub entities: usize,
    /// Record ids in chunk order
    pub record_ids: Vec<String>,
}

impl ReindexPlan {
    pub fn chunks(&self) -> usize {
        self.record_ids.len()
    }
}

/// Record counts per status for one batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BatchSummary {
    pub pending: usize,
    pub in_progress: usize,
    pub success: usize,
    pub failed: usize,
}

impl BatchSummary {
    pub fn from_records(records: &[BatchRecord]) -> Self {
        let mut summary = Self::default();
        for record in records {
            match record.status {
                BatchStatus::Pending => summary.pending += 1,
                BatchStatus::InProgress => summary.in_progress += 1,
                BatchStatus::Success => summary.success += 1,
                BatchStatus::Failed => summary.failed += 1,
            }
        }
        summary
    }

    pub fn total(&self) -> usize {
        self.pending + self.in_progress + self.success + self.failed
    }

    /// Every record reached a final state.
    pub fn is_complete(&self) -> bool {
        self.pending == 0 && self.in_progress == 0
    }
}

/// Plans batch reindex runs.
pub struct BatchReindexer {
    registry: Arc<DocTypeRegistry>,
    entities: Arc<dyn EntityStore>,
    records: Arc<Storage>,
    queue: Arc<dyn JobQueue>,
}

impl BatchReindexer {
    pub fn new(
        registry: Arc<DocTypeRegistry>,
        entities: Arc<dyn EntityStore>,
        records: Arc<Storage>,
        queue: Arc<dyn JobQueue>,
    ) -> Self {
        Self {
            registry,
            entities,
            records,
            queue,
        }
    }

    /// Create records and enqueue chunk jobs for every entity of `doctypes`.
    pub fn start_reindex(
        &self,
        index: &str,
        doctypes: &[TypeIdentifier],
        chunk_size: usize,
    ) -> Result<ReindexPlan, IndexingError> {
        if chunk_size == 0 {
            return Err(IndexingError::Config("chunk size must be > 0".to_string()));
        }

        let mut chunks = Vec::new();
        let mut entities = 0;
        for name in doctypes {
            let doctype = self.registry.resolve(name)?;
            let ids = self.entities.list_entity_ids(doctype.model())?;
            entities += ids.len();
            chunks.extend(plan_chunks(name, &ids, chunk_size));
        }

        let batch_id = Ulid::new().to_string();
        let total = chunks.len();
        info!(batch_id = %batch_id, index, entities, chunks = total, "Starting reindex");

        // Create every record before the first job can run
        let mut records = Vec::with_capacity(total);
        for n in 1..=total {
            let record = BatchRecord::new(&batch_id, format!("{} {}/{}", index, n, total));
            self.records.put_batch_record(&record)?;
            records.push(record);
        }

        for (n, (record, chunk)) in records.iter().zip(chunks).enumerate() {
            let job = Job::IndexChunk(ChunkJob {
                index: index.to_string(),
                batch_id: batch_id.clone(),
                record_id: record.id.clone(),
                chunk,
            });
            if let Err(err) = self.queue.enqueue(job) {
                error!(
                    batch_id = %batch_id,
                    record = %record.name,
                    error = %err,
                    "Could not enqueue chunk"
                );
                // No job will ever run for this record or any later one
                let message = format!("Errored out {}", err);
                for unsent in &records[n..] {
                    let mut unsent = unsent.clone();
                    unsent.mark_fail(message.clone())?;
                    self.records.put_batch_record(&unsent)?;
                }
                return Err(err.into());
            }
        }

        Ok(ReindexPlan {
            batch_id,
            index: index.to_string(),
            entities,
            record_ids: records.into_iter().map(|r| r.id).collect(),
        })
    }

    /// Records of one batch, or of every batch.
    pub fn records(&self, batch_id: Option<&str>) -> Result<Vec<BatchRecord>, IndexingError> {
        Ok(self.records.list_batch_records(batch_id)?)
    }

    /// Status counts for one batch.
    pub fn batch_summary(&self, batch_id: &str) -> Result<BatchSummary, IndexingError> {
        Ok(BatchSummary::from_records(&self.records(Some(batch_id))?))
    }
}
