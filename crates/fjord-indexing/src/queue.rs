//! Job queue client.
//!
//! Producers hand jobs to a [`JobQueue`] and return immediately. Delivery is
//! at least once with no ordering guarantee. Jobs cross the queue as JSON
//! bytes so the consumer only relies on the serialized form.
//!
//! [`LocalQueue`] is the in-process transport: an unbounded Tokio channel,
//! with delayed jobs held by a spawned timer task until they are due.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use fjord_types::Job;

/// Errors returned when handing a job to the queue.
#[derive(Debug, Error)]
pub enum QueueError {
    /// The transport to the queue is down or closed
    #[error("Queue transport unavailable: {0}")]
    TransportUnavailable(String),

    /// The job could not be encoded or decoded
    #[error("Job serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The queue refused the job
    #[error("Job rejected: {0}")]
    Rejected(String),
}

impl QueueError {
    /// Whether this failure comes from the transport rather than the job.
    pub fn is_transport_unavailable(&self) -> bool {
        matches!(self, QueueError::TransportUnavailable(_))
    }
}

/// Fire-and-forget job submission.
pub trait JobQueue: Send + Sync {
    /// Deliver `job` as soon as possible.
    fn enqueue(&self, job: Job) -> Result<(), QueueError>;

    /// Deliver `job` once `delay` has elapsed.
    fn enqueue_after(&self, job: Job, delay: Duration) -> Result<(), QueueError>;
}

/// In-process queue backed by an unbounded channel.
#[derive(Clone)]
pub struct LocalQueue {
    tx: mpsc::UnboundedSender<Vec<u8>>,
    delayed: Arc<AtomicUsize>,
}

/// Consumer side of a [`LocalQueue`].
pub struct QueueReceiver {
    rx: mpsc::UnboundedReceiver<Vec<u8>>,
}

impl LocalQueue {
    /// Create a queue and its receiver.
    pub fn new() -> (Self, QueueReceiver) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            Self {
                tx,
                delayed: Arc::new(AtomicUsize::new(0)),
            },
            QueueReceiver { rx },
        )
    }

    /// Delayed jobs that are not yet due.
    pub fn pending_delayed(&self) -> usize {
        self.delayed.load(Ordering::SeqCst)
    }

    fn closed() -> QueueError {
        QueueError::TransportUnavailable("queue receiver closed".to_string())
    }
}

impl JobQueue for LocalQueue {
    fn enqueue(&self, job: Job) -> Result<(), QueueError> {
        let bytes = job.to_bytes()?;
        self.tx.send(bytes).map_err(|_| Self::closed())?;
        debug!(task = job.task_name(), "Enqueued job");
        Ok(())
    }

    fn enqueue_after(&self, job: Job, delay: Duration) -> Result<(), QueueError> {
        let bytes = job.to_bytes()?;
        if self.tx.is_closed() {
            return Err(Self::closed());
        }
        let handle = tokio::runtime::Handle::try_current()
            .map_err(|e| QueueError::TransportUnavailable(e.to_string()))?;

        let tx = self.tx.clone();
        let delayed = self.delayed.clone();
        let task = job.task_name();
        delayed.fetch_add(1, Ordering::SeqCst);
        handle.spawn(async move {
            tokio::time::sleep(delay).await;
            if tx.send(bytes).is_err() {
                warn!(task, "Queue closed before delayed job was due");
            }
            delayed.fetch_sub(1, Ordering::SeqCst);
        });

        debug!(task, delay_secs = delay.as_secs(), "Enqueued delayed job");
        Ok(())
    }
}

impl QueueReceiver {
    /// Wait for the next job. `None` once every sender is gone.
    pub async fn recv(&mut self) -> Option<Result<Job, QueueError>> {
        let bytes = self.rx.recv().await?;
        Some(Job::from_bytes(&bytes).map_err(QueueError::from))
    }

    /// Next job if one is ready now.
    pub fn try_recv(&mut self) -> Option<Result<Job, QueueError>> {
        let bytes = self.rx.try_recv().ok()?;
        Some(Job::from_bytes(&bytes).map_err(QueueError::from))
    }
}
