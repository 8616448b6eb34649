//! Reference provider echoing the response back as a single link.

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tracing::debug;

use fjord_types::{Response, SuggestionLink};

use crate::error::SuggestError;
use crate::provider::Provider;

pub const PROVIDER: &str = "dummy";
pub const PROVIDER_VERSION: u32 = 1;

#[derive(Debug, Default)]
pub struct DummyProvider {
    loaded: AtomicBool,
}

impl DummyProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Provider for DummyProvider {
    fn name(&self) -> &str {
        PROVIDER
    }

    fn version(&self) -> u32 {
        PROVIDER_VERSION
    }

    async fn load(&self) -> Result<(), SuggestError> {
        if !self.loaded.swap(true, Ordering::SeqCst) {
            debug!("dummy load");
        }
        Ok(())
    }

    async fn get_suggestions(
        &self,
        response: &Response,
    ) -> Result<Vec<SuggestionLink>, SuggestError> {
        debug!(response_id = response.id, "dummy get_suggestions");
        Ok(vec![SuggestionLink {
            provider: PROVIDER.to_string(),
            provider_version: PROVIDER_VERSION,
            summary: format!("summary {}", response.description),
            description: format!("description {}", response.description),
            url: response.url.clone(),
        }])
    }
}
