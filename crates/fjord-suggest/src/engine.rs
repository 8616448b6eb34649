//! Provider registry and fan-out.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::{debug, info};

use fjord_types::{Response, SuggestionLink};

use crate::error::SuggestError;
use crate::provider::Provider;

/// Runs every registered provider for a response.
#[derive(Default)]
pub struct SuggestEngine {
    providers: Vec<Arc<dyn Provider>>,
    loaded: AtomicBool,
}

impl SuggestEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a provider. Providers registered after `load` need another `load`.
    pub fn register(&mut self, provider: Arc<dyn Provider>) {
        self.loaded.store(false, Ordering::SeqCst);
        self.providers.push(provider);
    }

    /// Names of registered providers in order.
    pub fn provider_names(&self) -> Vec<&str> {
        self.providers.iter().map(|p| p.name()).collect()
    }

    /// Load every provider.
    pub async fn load(&self) -> Result<(), SuggestError> {
        for provider in &self.providers {
            provider.load().await?;
            debug!(provider = provider.name(), version = provider.version(), "Provider loaded");
        }
        self.loaded.store(true, Ordering::SeqCst);
        info!(providers = self.providers.len(), "Suggestion providers loaded");
        Ok(())
    }

    /// Suggestions of all providers, grouped by provider in registration order.
    pub async fn get_suggestions(
        &self,
        response: &Response,
    ) -> Result<Vec<SuggestionLink>, SuggestError> {
        if !self.loaded.load(Ordering::SeqCst) {
            return Err(SuggestError::NotLoaded);
        }
        let mut links = Vec::new();
        for provider in &self.providers {
            links.extend(provider.get_suggestions(response).await?);
        }
        Ok(links)
    }
}
