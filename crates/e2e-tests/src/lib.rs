//! End-to-end test infrastructure for fjord.
//!
//! Provides a shared TestHarness wiring real RocksDB storage (with a
//! secondary instance as lagging replica), a Tantivy index, the local queue
//! and the indexing components.

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use fjord_indexing::{
    BatchReindexer, ChangeDetector, DocTypeRegistry, IndexingWorker, LifecycleEvent,
    LiveIndexConfig, LocalQueue, Notifier, QueueReceiver, ResponseDocType, RetryPolicy, Signal,
    WorkerStats,
};
use fjord_search::{FeedbackSearcher, SearchIndex, SearchIndexConfig, SearchIndexer};
use fjord_storage::{EntityStore, RoutedStore, Storage};
use fjord_types::{Response, TypeIdentifier};

pub const INDEX_NAME: &str = "feedback";

/// Notifier that keeps every notification for inspection.
#[derive(Default)]
pub struct CapturingNotifier {
    sent: Mutex<Vec<(String, String)>>,
}

impl CapturingNotifier {
    pub fn sent(&self) -> Vec<(String, String)> {
        self.sent.lock().expect("notifier lock poisoned").clone()
    }
}

impl Notifier for CapturingNotifier {
    fn notify(&self, subject: &str, message: &str) {
        self.sent
            .lock()
            .expect("notifier lock poisoned")
            .push((subject.to_string(), message.to_string()));
    }
}

/// Options for building a [`TestHarness`].
#[derive(Debug, Clone, Copy)]
pub struct HarnessOptions {
    pub live_index: bool,
    /// Read entities through a lagging secondary instance
    pub with_replica: bool,
}

impl Default for HarnessOptions {
    fn default() -> Self {
        Self {
            live_index: true,
            with_replica: false,
        }
    }
}

/// Shared test harness for E2E tests.
pub struct TestHarness {
    /// Keeps temp dir alive for the lifetime of the harness
    pub _temp_dir: tempfile::TempDir,
    pub storage: Arc<Storage>,
    pub replica: Option<Arc<Storage>>,
    pub search_index: SearchIndex,
    pub queue: Arc<LocalQueue>,
    pub receiver: Option<QueueReceiver>,
    pub notifier: Arc<CapturingNotifier>,
    pub detector: ChangeDetector,
    pub worker: IndexingWorker,
    pub reindexer: BatchReindexer,
    pub search_index_path: PathBuf,
}

impl TestHarness {
    /// Harness with live indexing on and no replica.
    pub fn new() -> Self {
        Self::with_options(HarnessOptions::default())
    }

    pub fn with_options(options: HarnessOptions) -> Self {
        let temp_dir = tempfile::TempDir::new().expect("Failed to create temp dir");
        let db_path = temp_dir.path().join("db");
        let storage = Arc::new(Storage::open(&db_path).expect("Failed to open test storage"));

        let replica = options.with_replica.then(|| {
            Arc::new(
                Storage::open_secondary(&db_path, &temp_dir.path().join("replica"))
                    .expect("Failed to open replica"),
            )
        });
        let entities: Arc<dyn EntityStore> = Arc::new(RoutedStore::new(
            storage.clone(),
            replica.clone().map(|r| r as Arc<dyn EntityStore>),
        ));

        let search_index_path = temp_dir.path().join("search-index");
        let search_index =
            SearchIndex::open_or_create(SearchIndexConfig::new(&search_index_path, INDEX_NAME))
                .expect("Failed to open search index");
        let indexer = Arc::new(SearchIndexer::new(&search_index).expect("Failed to open writer"));

        let mut registry = DocTypeRegistry::new();
        registry.register(Arc::new(ResponseDocType::new().expect("doctype")));
        let registry = Arc::new(registry);

        let (queue, receiver) = LocalQueue::new();
        let queue = Arc::new(queue);
        let notifier = Arc::new(CapturingNotifier::default());

        let mut detector = ChangeDetector::new(
            LiveIndexConfig {
                enabled: options.live_index,
            },
            registry.clone(),
            queue.clone(),
            notifier.clone(),
        );
        detector
            .register_live_index(response_type())
            .expect("Failed to register live index");

        let worker = IndexingWorker::new(
            registry.clone(),
            entities.clone(),
            storage.clone(),
            queue.clone(),
            RetryPolicy::default(),
            INDEX_NAME,
            indexer,
        );
        let reindexer = BatchReindexer::new(registry, entities, storage.clone(), queue.clone());

        Self {
            _temp_dir: temp_dir,
            storage,
            replica,
            search_index,
            queue,
            receiver: Some(receiver),
            notifier,
            detector,
            worker,
            reindexer,
            search_index_path,
        }
    }

    /// Store a response and fire the save event.
    pub fn save_response(&self, response: &Response) {
        self.storage
            .put_entity(
                ResponseDocType::NAME,
                response.id,
                &response.to_bytes().expect("Failed to serialize response"),
            )
            .expect("Failed to store response");
        self.detector
            .handle(&LifecycleEvent::new(Signal::PostSave, response_type(), response.id))
            .expect("Failed to handle save event");
    }

    /// Fire the delete event, then remove the response.
    pub fn delete_response(&self, id: u64) {
        self.detector
            .handle(&LifecycleEvent::new(Signal::PreDelete, response_type(), id))
            .expect("Failed to handle delete event");
        self.storage
            .delete_entity(ResponseDocType::NAME, id)
            .expect("Failed to delete response");
    }

    /// Replay primary writes into the replica, if any.
    pub fn catch_up_replica(&self) {
        if let Some(replica) = &self.replica {
            replica.catch_up().expect("Failed to catch up replica");
        }
    }

    pub fn receiver(&mut self) -> &mut QueueReceiver {
        self.receiver.as_mut().expect("queue receiver was closed")
    }

    /// Handle every job that is ready now.
    pub async fn drain(&mut self) -> WorkerStats {
        let mut receiver = self.receiver.take().expect("queue receiver was closed");
        let stats = self.worker.run_until_idle(&mut receiver).await;
        self.receiver = Some(receiver);
        stats
    }

    /// Drop the consumer side, making the queue transport unavailable.
    pub fn close_queue(&mut self) {
        self.receiver = None;
    }

    /// Fresh searcher over the committed index.
    pub fn searcher(&self) -> FeedbackSearcher {
        let searcher = FeedbackSearcher::new(&self.search_index).expect("Failed to open searcher");
        searcher.reload().expect("Failed to reload searcher");
        searcher
    }
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}

pub fn response_type() -> TypeIdentifier {
    ResponseDocType::NAME
        .parse()
        .expect("response type identifier")
}

/// Create `count` responses with ids starting at 1.
pub fn create_test_responses(count: u64, base_text: &str) -> Vec<Response> {
    (1..=count)
        .map(|id| {
            Response::new(id, id % 2 == 0, format!("{} {}", base_text, id))
                .with_url(format!("https://example.com/page/{}", id))
                .with_product("firefox")
        })
        .collect()
}
