//! Test doubles shared by the unit tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use fjord_search::SearchError;
use fjord_storage::{is_pinned, EntityStore, Storage, StorageError};
use fjord_types::{IndexDocument, Job, Response, TypeIdentifier};
use tempfile::TempDir;

use crate::backend::SearchBackend;
use crate::doctype::{DocTypeRegistry, ResponseDocType};
use crate::notify::Notifier;
use crate::queue::{JobQueue, QueueError};

pub fn response_type() -> TypeIdentifier {
    ResponseDocType::NAME.parse().unwrap()
}

pub fn registry() -> Arc<DocTypeRegistry> {
    let mut registry = DocTypeRegistry::new();
    registry.register(Arc::new(ResponseDocType::new().unwrap()));
    Arc::new(registry)
}

/// Storage with responses `ids` already saved.
pub fn storage_with_responses(ids: &[u64]) -> (Arc<Storage>, TempDir) {
    let dir = TempDir::new().unwrap();
    let storage = Storage::open(dir.path()).unwrap();
    for id in ids {
        let response = Response::new(*id, true, format!("response number {}", id));
        storage
            .put_entity(ResponseDocType::NAME, *id, &response.to_bytes().unwrap())
            .unwrap();
    }
    (Arc::new(storage), dir)
}

/// Queue that records what it is given.
#[derive(Default)]
pub struct RecordingQueue {
    pub immediate: Mutex<Vec<Job>>,
    pub delayed: Mutex<Vec<(Job, Duration)>>,
    fail_with: Mutex<Option<fn() -> QueueError>>,
}

impl RecordingQueue {
    pub fn failing(make_error: fn() -> QueueError) -> Self {
        Self {
            fail_with: Mutex::new(Some(make_error)),
            ..Default::default()
        }
    }

    fn check(&self) -> Result<(), QueueError> {
        match *self.fail_with.lock().unwrap() {
            Some(make_error) => Err(make_error()),
            None => Ok(()),
        }
    }

    pub fn immediate(&self) -> Vec<Job> {
        self.immediate.lock().unwrap().clone()
    }

    pub fn delayed(&self) -> Vec<(Job, Duration)> {
        self.delayed.lock().unwrap().clone()
    }
}

impl JobQueue for RecordingQueue {
    fn enqueue(&self, job: Job) -> Result<(), QueueError> {
        self.check()?;
        self.immediate.lock().unwrap().push(job);
        Ok(())
    }

    fn enqueue_after(&self, job: Job, delay: Duration) -> Result<(), QueueError> {
        self.check()?;
        self.delayed.lock().unwrap().push((job, delay));
        Ok(())
    }
}

/// Notifier that records (subject, message) pairs.
#[derive(Default)]
pub struct RecordingNotifier {
    pub sent: Mutex<Vec<(String, String)>>,
}

impl RecordingNotifier {
    pub fn sent(&self) -> Vec<(String, String)> {
        self.sent.lock().unwrap().clone()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, subject: &str, message: &str) {
        self.sent
            .lock()
            .unwrap()
            .push((subject.to_string(), message.to_string()));
    }
}

/// In-memory search backend; fails every call while `fail` is set and
/// only commits while `fail_commit` is set.
///
/// Writes are staged until `commit` and dropped by `rollback`.
#[derive(Default)]
pub struct MemoryBackend {
    pub docs: Mutex<Vec<IndexDocument>>,
    pub deleted: Mutex<Vec<String>>,
    pub staged: Mutex<Vec<IndexDocument>>,
    pub staged_deletes: Mutex<Vec<String>>,
    pub commits: AtomicUsize,
    pub rollbacks: AtomicUsize,
    pub fail: Mutex<bool>,
    pub fail_commit: Mutex<bool>,
}

impl MemoryBackend {
    pub fn failing() -> Self {
        Self {
            fail: Mutex::new(true),
            ..Default::default()
        }
    }

    pub fn failing_commit() -> Self {
        Self {
            fail_commit: Mutex::new(true),
            ..Default::default()
        }
    }

    pub fn rollbacks(&self) -> usize {
        self.rollbacks.load(Ordering::SeqCst)
    }

    fn check(&self) -> Result<(), SearchError> {
        if *self.fail.lock().unwrap() {
            return Err(SearchError::IndexLocked("backend down".to_string()));
        }
        Ok(())
    }

    pub fn doc_ids(&self) -> Vec<String> {
        self.docs.lock().unwrap().iter().map(|d| d.doc_id.clone()).collect()
    }
}

impl SearchBackend for MemoryBackend {
    fn bulk_index(&self, docs: &[IndexDocument]) -> Result<usize, SearchError> {
        self.check()?;
        self.staged.lock().unwrap().extend_from_slice(docs);
        Ok(docs.len())
    }

    fn delete(&self, doc_id: &str) -> Result<(), SearchError> {
        self.check()?;
        self.staged_deletes.lock().unwrap().push(doc_id.to_string());
        Ok(())
    }

    fn commit(&self) -> Result<(), SearchError> {
        self.check()?;
        if *self.fail_commit.lock().unwrap() {
            return Err(SearchError::IndexLocked("commit refused".to_string()));
        }
        let staged: Vec<_> = self.staged.lock().unwrap().drain(..).collect();
        self.docs.lock().unwrap().extend(staged);
        let deletes: Vec<_> = self.staged_deletes.lock().unwrap().drain(..).collect();
        self.deleted.lock().unwrap().extend(deletes);
        self.commits.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn rollback(&self) -> Result<(), SearchError> {
        self.staged.lock().unwrap().clear();
        self.staged_deletes.lock().unwrap().clear();
        self.rollbacks.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Entity store wrapper recording whether each read ran pinned.
pub struct PinProbeStore {
    inner: Arc<dyn EntityStore>,
    pub reads: Mutex<Vec<bool>>,
}

impl PinProbeStore {
    pub fn new(inner: Arc<dyn EntityStore>) -> Self {
        Self {
            inner,
            reads: Mutex::new(Vec::new()),
        }
    }

    pub fn reads(&self) -> Vec<bool> {
        self.reads.lock().unwrap().clone()
    }
}

impl EntityStore for PinProbeStore {
    fn get_entity(&self, model: &str, id: u64) -> Result<Option<Vec<u8>>, StorageError> {
        self.reads.lock().unwrap().push(is_pinned());
        self.inner.get_entity(model, id)
    }

    fn list_entity_ids(&self, model: &str) -> Result<Vec<u64>, StorageError> {
        self.inner.list_entity_ids(model)
    }
}
