//! Component wiring shared by the commands.

use std::fs;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{info, warn};

use fjord_indexing::{
    notifier_from_settings, BatchReindexer, ChangeDetector, DocTypeRegistry, IndexingWorker,
    LiveIndexConfig, LocalQueue, QueueReceiver, ResponseDocType, RetryPolicy, WorkerStats,
};
use fjord_search::{SearchIndex, SearchIndexConfig, SearchIndexer};
use fjord_storage::{EntityStore, RoutedStore, Storage};
use fjord_types::{Settings, TypeIdentifier};

/// Opened stores and the indexing components built on them.
pub struct App {
    pub settings: Settings,
    pub storage: Arc<Storage>,
    pub replica: Option<Arc<Storage>>,
    pub search: SearchIndex,
    pub registry: Arc<DocTypeRegistry>,
    pub queue: Arc<LocalQueue>,
    pub detector: ChangeDetector,
    pub worker: IndexingWorker,
    pub reindexer: BatchReindexer,
    receiver: QueueReceiver,
}

impl App {
    /// Open storage and the search index and wire the pipeline.
    pub fn open(settings: &Settings) -> Result<Self> {
        let db_path = settings.expanded_db_path();
        if let Some(parent) = db_path.parent() {
            fs::create_dir_all(parent).context("Failed to create database directory")?;
        }
        let storage = Arc::new(Storage::open(&db_path).context("Failed to open storage")?);

        let replica = match settings.expanded_replica_db_path() {
            Some(path) => {
                let replica = Storage::open_secondary(&db_path, &path)
                    .context("Failed to open replica storage")?;
                Some(Arc::new(replica))
            }
            None => None,
        };
        let entities: Arc<dyn EntityStore> = Arc::new(RoutedStore::new(
            storage.clone(),
            replica.clone().map(|r| r as Arc<dyn EntityStore>),
        ));

        let search = SearchIndex::open_or_create(SearchIndexConfig::new(
            settings.expanded_search_index_path(),
            settings.index_name.clone(),
        ))
        .context("Failed to open search index")?;
        let indexer = Arc::new(SearchIndexer::new(&search).context("Failed to open index writer")?);

        let mut registry = DocTypeRegistry::new();
        registry.register(Arc::new(ResponseDocType::new()?));
        let registry = Arc::new(registry);

        let (queue, receiver) = LocalQueue::new();
        let queue = Arc::new(queue);
        let notifier = notifier_from_settings(&settings.notify);

        let mut detector = ChangeDetector::new(
            LiveIndexConfig {
                enabled: settings.live_index,
            },
            registry.clone(),
            queue.clone(),
            notifier,
        );
        detector.register_live_index(response_type()?)?;

        let retry = RetryPolicy::from_settings(&settings.retry)?;
        let worker = IndexingWorker::new(
            registry.clone(),
            entities.clone(),
            storage.clone(),
            queue.clone(),
            retry,
            settings.index_name.clone(),
            indexer,
        );
        let reindexer =
            BatchReindexer::new(registry.clone(), entities, storage.clone(), queue.clone());

        Ok(Self {
            settings: settings.clone(),
            storage,
            replica,
            search,
            registry,
            queue,
            detector,
            worker,
            reindexer,
            receiver,
        })
    }

    /// Run every queued job, then report what happened.
    pub async fn drain(&mut self) -> Result<WorkerStats> {
        if let Some(replica) = &self.replica {
            replica.catch_up().context("Failed to refresh replica")?;
        }
        let stats = self.worker.run_until_idle(&mut self.receiver).await;
        info!(
            succeeded = stats.succeeded,
            retries = stats.retries_scheduled,
            failed = stats.failed,
            "Queue drained"
        );

        let pending = self.queue.pending_delayed();
        if pending > 0 {
            warn!(pending, "Retries are scheduled but will not run after exit");
        }
        Ok(stats)
    }
}

/// Type identifier of feedback responses.
pub fn response_type() -> Result<TypeIdentifier> {
    Ok(ResponseDocType::NAME.parse()?)
}
