//! Column family definitions for RocksDB.
//!
//! - entities: JSON-encoded entities keyed by model and id
//! - batch_records: reindex audit records keyed by batch and record id

use rocksdb::{ColumnFamilyDescriptor, Options};

/// Column family name for stored entities
pub const CF_ENTITIES: &str = "entities";

/// Column family name for batch reindex records
pub const CF_BATCH_RECORDS: &str = "batch_records";

/// All column family names
pub const ALL_CF_NAMES: &[&str] = &[CF_ENTITIES, CF_BATCH_RECORDS];

/// Entities are read far more than written; compress them.
fn entities_options() -> Options {
    let mut opts = Options::default();
    opts.set_compression_type(rocksdb::DBCompressionType::Zstd);
    opts
}

/// Build all column family descriptors
pub fn build_cf_descriptors() -> Vec<ColumnFamilyDescriptor> {
    vec![
        ColumnFamilyDescriptor::new(CF_ENTITIES, entities_options()),
        ColumnFamilyDescriptor::new(CF_BATCH_RECORDS, Options::default()),
    ]
}
