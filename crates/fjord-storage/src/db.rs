//! RocksDB wrapper for fjord storage.
//!
//! Provides:
//! - Database open with column family setup
//! - Secondary instances acting as lagging read replicas
//! - Entity put/get/delete and ordered id listing per model
//! - Batch record persistence

use rocksdb::{Direction, IteratorMode, Options, DB};
use std::path::Path;
use tracing::{debug, info};

use fjord_types::BatchRecord;

use crate::column_families::{build_cf_descriptors, ALL_CF_NAMES, CF_BATCH_RECORDS, CF_ENTITIES};
use crate::error::StorageError;
use crate::keys::{BatchRecordKey, EntityKey};

/// Main storage interface for fjord
pub struct Storage {
    db: DB,
    secondary: bool,
}

impl Storage {
    /// Open storage at the given path, creating if necessary
    pub fn open(path: &Path) -> Result<Self, StorageError> {
        info!("Opening storage at {:?}", path);

        let mut db_opts = Options::default();
        db_opts.create_if_missing(true);
        db_opts.create_missing_column_families(true);
        db_opts.set_max_background_jobs(4);

        let db = DB::open_cf_descriptors(&db_opts, path, build_cf_descriptors())?;

        Ok(Self {
            db,
            secondary: false,
        })
    }

    /// Open a secondary instance that follows the primary at `primary_path`.
    ///
    /// The secondary only sees primary writes after [`Storage::catch_up`],
    /// which makes it behave like a replica with replication lag.
    pub fn open_secondary(
        primary_path: &Path,
        secondary_path: &Path,
    ) -> Result<Self, StorageError> {
        info!(
            "Opening secondary storage at {:?} following {:?}",
            secondary_path, primary_path
        );

        let mut db_opts = Options::default();
        // Secondary instances must keep all files open
        db_opts.set_max_open_files(-1);

        let db = DB::open_cf_as_secondary(
            &db_opts,
            primary_path,
            secondary_path,
            ALL_CF_NAMES.iter().copied(),
        )?;

        Ok(Self {
            db,
            secondary: true,
        })
    }

    /// Replay primary writes into a secondary instance. No-op on a primary.
    pub fn catch_up(&self) -> Result<(), StorageError> {
        if self.secondary {
            self.db.try_catch_up_with_primary()?;
            debug!("Secondary caught up with primary");
        }
        Ok(())
    }

    fn cf(&self, name: &str) -> Result<&rocksdb::ColumnFamily, StorageError> {
        self.db
            .cf_handle(name)
            .ok_or_else(|| StorageError::ColumnFamilyNotFound(name.to_string()))
    }

    // ==================== Entity Methods ====================

    /// Store (insert or replace) an entity.
    pub fn put_entity(&self, model: &str, id: u64, bytes: &[u8]) -> Result<(), StorageError> {
        let cf = self.cf(CF_ENTITIES)?;
        let key = EntityKey::new(model, id);
        self.db.put_cf(cf, key.to_bytes(), bytes)?;
        debug!(model, id, "Stored entity");
        Ok(())
    }

    /// Get an entity by model and id.
    pub fn get_entity(&self, model: &str, id: u64) -> Result<Option<Vec<u8>>, StorageError> {
        let cf = self.cf(CF_ENTITIES)?;
        let key = EntityKey::new(model, id);
        let result = self.db.get_cf(cf, key.to_bytes())?;
        Ok(result)
    }

    /// Delete an entity. Returns whether it existed.
    pub fn delete_entity(&self, model: &str, id: u64) -> Result<bool, StorageError> {
        let cf = self.cf(CF_ENTITIES)?;
        let key = EntityKey::new(model, id).to_bytes();
        let existed = self.db.get_cf(cf, &key)?.is_some();
        if existed {
            self.db.delete_cf(cf, &key)?;
            debug!(model, id, "Deleted entity");
        }
        Ok(existed)
    }

    /// List all ids of a model in ascending order.
    pub fn list_entity_ids(&self, model: &str) -> Result<Vec<u64>, StorageError> {
        let cf = self.cf(CF_ENTITIES)?;
        let prefix = EntityKey::model_prefix(model);

        let mut ids = Vec::new();
        let iter = self
            .db
            .iterator_cf(cf, IteratorMode::From(&prefix, Direction::Forward));
        for item in iter {
            let (key, _) = item?;
            if !key.starts_with(&prefix) {
                break;
            }
            ids.push(EntityKey::from_bytes(&key)?.id);
        }
        Ok(ids)
    }

    /// Next free id for a model (highest stored id + 1, starting at 1).
    pub fn next_entity_id(&self, model: &str) -> Result<u64, StorageError> {
        let cf = self.cf(CF_ENTITIES)?;
        let prefix = EntityKey::model_prefix(model);
        let upper = EntityKey::new(model, u64::MAX).to_bytes();

        let mut iter = self
            .db
            .iterator_cf(cf, IteratorMode::From(&upper, Direction::Reverse));
        if let Some(item) = iter.next() {
            let (key, _) = item?;
            if key.starts_with(&prefix) {
                let last = EntityKey::from_bytes(&key)?.id;
                return Ok(last.saturating_add(1));
            }
        }
        Ok(1)
    }

    // ==================== Batch Record Methods ====================

    /// Create or overwrite a batch record.
    pub fn put_batch_record(&self, record: &BatchRecord) -> Result<(), StorageError> {
        let cf = self.cf(CF_BATCH_RECORDS)?;
        let key = BatchRecordKey::new(&record.batch_id, &record.id);
        self.db.put_cf(cf, key.to_bytes(), record.to_bytes()?)?;
        debug!(
            batch_id = %record.batch_id,
            record_id = %record.id,
            status = %record.status,
            "Saved batch record"
        );
        Ok(())
    }

    /// Get a batch record by batch and record id.
    pub fn get_batch_record(
        &self,
        batch_id: &str,
        record_id: &str,
    ) -> Result<Option<BatchRecord>, StorageError> {
        let cf = self.cf(CF_BATCH_RECORDS)?;
        let key = BatchRecordKey::new(batch_id, record_id);
        match self.db.get_cf(cf, key.to_bytes())? {
            Some(bytes) => Ok(Some(BatchRecord::from_bytes(&bytes)?)),
            None => Ok(None),
        }
    }

    /// List the records of one batch, or of every batch when `batch_id` is None.
    ///
    /// Records come back ordered by batch id, then record id (both ULIDs, so
    /// roughly creation order).
    pub fn list_batch_records(
        &self,
        batch_id: Option<&str>,
    ) -> Result<Vec<BatchRecord>, StorageError> {
        let cf = self.cf(CF_BATCH_RECORDS)?;
        let prefix = match batch_id {
            Some(id) => BatchRecordKey::batch_prefix(id),
            None => BatchRecordKey::all_prefix(),
        };

        let mut records = Vec::new();
        let iter = self
            .db
            .iterator_cf(cf, IteratorMode::From(&prefix, Direction::Forward));
        for item in iter {
            let (key, value) = item?;
            if !key.starts_with(&prefix) {
                break;
            }
            records.push(BatchRecord::from_bytes(&value)?);
        }
        Ok(records)
    }
}
