//! Feedback response entity.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A piece of user feedback.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    pub id: u64,
    /// Happy or sad feedback
    pub happy: bool,
    pub description: String,
    /// Page the feedback was left about (may be empty)
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub product: String,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub platform: String,
    #[serde(default)]
    pub locale: String,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created: DateTime<Utc>,
}

impl Response {
    /// Create a response with the required fields; the rest default to empty.
    pub fn new(id: u64, happy: bool, description: impl Into<String>) -> Self {
        Self {
            id,
            happy,
            description: description.into(),
            url: String::new(),
            product: String::new(),
            version: String::new(),
            platform: String::new(),
            locale: String::new(),
            created: Utc::now(),
        }
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    pub fn with_product(mut self, product: impl Into<String>) -> Self {
        self.product = product.into();
        self
    }

    /// Serialize to JSON bytes
    pub fn to_bytes(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }

    /// Deserialize from JSON bytes
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(bytes)
    }
}
