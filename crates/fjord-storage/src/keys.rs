//! Key encoding and decoding for storage layer.
//!
//! Entity keys: `ent:{model}:{id:020}`, so a prefix scan over one model
//! yields ids in numeric order.
//! Batch record keys: `rec:{batch_id}:{record_id}`, so all chunks of a batch
//! share a prefix.

use crate::error::StorageError;

/// Key for an entity of a given model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityKey {
    pub model: String,
    pub id: u64,
}

impl EntityKey {
    pub fn new(model: impl Into<String>, id: u64) -> Self {
        Self {
            model: model.into(),
            id,
        }
    }

    /// Encode key to bytes
    pub fn to_bytes(&self) -> Vec<u8> {
        format!("ent:{}:{:020}", self.model, self.id).into_bytes()
    }

    /// Decode key from bytes
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, StorageError> {
        let s = std::str::from_utf8(bytes)
            .map_err(|e| StorageError::Key(format!("Invalid UTF-8: {}", e)))?;

        // Model names may contain dots but never colons
        let parts: Vec<&str> = s.split(':').collect();
        if parts.len() != 3 || parts[0] != "ent" {
            return Err(StorageError::Key(format!("Invalid entity key format: {}", s)));
        }
        let id: u64 = parts[2]
            .parse()
            .map_err(|e| StorageError::Key(format!("Invalid entity id: {}", e)))?;

        Ok(Self {
            model: parts[1].to_string(),
            id,
        })
    }

    /// Prefix shared by all keys of a model
    pub fn model_prefix(model: &str) -> Vec<u8> {
        format!("ent:{}:", model).into_bytes()
    }
}

/// Key for a batch record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchRecordKey {
    pub batch_id: String,
    pub record_id: String,
}

impl BatchRecordKey {
    pub fn new(batch_id: impl Into<String>, record_id: impl Into<String>) -> Self {
        Self {
            batch_id: batch_id.into(),
            record_id: record_id.into(),
        }
    }

    /// Encode key to bytes
    pub fn to_bytes(&self) -> Vec<u8> {
        format!("rec:{}:{}", self.batch_id, self.record_id).into_bytes()
    }

    /// Prefix shared by all records of a batch
    pub fn batch_prefix(batch_id: &str) -> Vec<u8> {
        format!("rec:{}:", batch_id).into_bytes()
    }

    /// Prefix shared by all records
    pub fn all_prefix() -> Vec<u8> {
        b"rec:".to_vec()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_key_roundtrip() {
        let key = EntityKey::new("feedback.response", 42);
        let bytes = key.to_bytes();
        assert_eq!(
            String::from_utf8(bytes.clone()).unwrap(),
            "ent:feedback.response:00000000000000000042"
        );
        assert_eq!(EntityKey::from_bytes(&bytes).unwrap(), key);
    }

    #[test]
    fn test_entity_keys_sort_numerically() {
        let a = EntityKey::new("feedback.response", 9).to_bytes();
        let b = EntityKey::new("feedback.response", 10).to_bytes();
        assert!(a < b);
    }

    #[test]
    fn test_entity_key_rejects_garbage() {
        assert!(EntityKey::from_bytes(b"rec:abc:def").is_err());
        assert!(EntityKey::from_bytes(b"ent:feedback.response:notanumber").is_err());
    }

    #[test]
    fn test_batch_record_key_prefix() {
        let key = BatchRecordKey::new("01HBATCH", "01HREC");
        assert!(key.to_bytes().starts_with(&BatchRecordKey::batch_prefix("01HBATCH")));
        assert!(key.to_bytes().starts_with(&BatchRecordKey::all_prefix()));
    }
}
