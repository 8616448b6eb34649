//! Storage layer for the fjord indexing pipeline.
//!
//! Provides RocksDB-backed storage with:
//! - Column family isolation for entities and batch records
//! - Zero-padded keys so entity ids scan in numeric order
//! - Secondary (read replica) instances that lag the primary until caught up
//! - Scoped primary-store pinning for read-after-write consistency

pub mod column_families;
pub mod db;
pub mod error;
pub mod keys;
pub mod routing;
pub mod store;

pub use db::Storage;
pub use error::StorageError;
pub use keys::{BatchRecordKey, EntityKey};
pub use routing::{current_route, is_pinned, with_primary, ReadRoute};
pub use store::{EntityStore, RoutedStore};
