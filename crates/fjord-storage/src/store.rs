//! Entity read interface used by the indexing worker.

use std::sync::Arc;

use tracing::trace;

use crate::db::Storage;
use crate::error::StorageError;
use crate::routing::{current_route, ReadRoute};

/// Read access to stored entities.
pub trait EntityStore: Send + Sync {
    /// Fetch the raw entity, `None` if it does not exist.
    fn get_entity(&self, model: &str, id: u64) -> Result<Option<Vec<u8>>, StorageError>;

    /// All ids of a model in ascending order.
    fn list_entity_ids(&self, model: &str) -> Result<Vec<u64>, StorageError>;
}

impl EntityStore for Storage {
    fn get_entity(&self, model: &str, id: u64) -> Result<Option<Vec<u8>>, StorageError> {
        Storage::get_entity(self, model, id)
    }

    fn list_entity_ids(&self, model: &str) -> Result<Vec<u64>, StorageError> {
        Storage::list_entity_ids(self, model)
    }
}

/// Entity store that routes reads between a primary and an optional replica.
///
/// Reads go to the replica unless the calling task is inside
/// [`crate::with_primary`]. Without a replica every read hits the primary.
pub struct RoutedStore {
    primary: Arc<dyn EntityStore>,
    replica: Option<Arc<dyn EntityStore>>,
}

impl RoutedStore {
    pub fn new(primary: Arc<dyn EntityStore>, replica: Option<Arc<dyn EntityStore>>) -> Self {
        Self { primary, replica }
    }

    /// Store with no replica; every read goes to the primary.
    pub fn primary_only(primary: Arc<dyn EntityStore>) -> Self {
        Self::new(primary, None)
    }

    fn route(&self) -> &dyn EntityStore {
        match (current_route(), &self.replica) {
            (ReadRoute::Replica, Some(replica)) => {
                trace!("Routing read to replica");
                replica.as_ref()
            }
            _ => {
                trace!("Routing read to primary");
                self.primary.as_ref()
            }
        }
    }
}

impl EntityStore for RoutedStore {
    fn get_entity(&self, model: &str, id: u64) -> Result<Option<Vec<u8>>, StorageError> {
        self.route().get_entity(model, id)
    }

    fn list_entity_ids(&self, model: &str) -> Result<Vec<u64>, StorageError> {
        self.route().list_entity_ids(model)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routing::with_primary;
    use tempfile::TempDir;

    const MODEL: &str = "feedback.response";

    #[tokio::test]
    async fn test_routes_to_replica_unless_pinned() {
        let primary_dir = TempDir::new().unwrap();
        let replica_dir = TempDir::new().unwrap();

        let primary = Arc::new(Storage::open(primary_dir.path()).unwrap());
        let replica =
            Arc::new(Storage::open_secondary(primary_dir.path(), replica_dir.path()).unwrap());
        let store = RoutedStore::new(primary.clone(), Some(replica.clone()));

        // Fresh write not yet replicated
        primary.put_entity(MODEL, 1, b"{}").unwrap();

        assert!(store.get_entity(MODEL, 1).unwrap().is_none());
        let pinned = with_primary(async { store.get_entity(MODEL, 1) }).await.unwrap();
        assert!(pinned.is_some());

        replica.catch_up().unwrap();
        assert!(store.get_entity(MODEL, 1).unwrap().is_some());
    }

    #[test]
    fn test_primary_only() {
        let dir = TempDir::new().unwrap();
        let primary = Arc::new(Storage::open(dir.path()).unwrap());
        primary.put_entity(MODEL, 4, b"{}").unwrap();

        let store = RoutedStore::primary_only(primary);
        assert_eq!(store.list_entity_ids(MODEL).unwrap(), vec![4]);
    }
}
