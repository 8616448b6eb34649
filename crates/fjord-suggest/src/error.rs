//! Error types for suggestion providers.

use thiserror::Error;

/// Errors that can occur while loading or querying providers.
#[derive(Error, Debug)]
pub enum SuggestError {
    /// Provider failed to load its resources
    #[error("Provider {provider} failed to load: {message}")]
    Load { provider: String, message: String },

    /// Provider failed while producing suggestions
    #[error("Provider {provider} failed: {message}")]
    Provider { provider: String, message: String },

    /// Engine queried before `load`
    #[error("Suggestion providers not loaded")]
    NotLoaded,
}

impl SuggestError {
    pub fn load(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Load {
            provider: provider.into(),
            message: message.into(),
        }
    }

    pub fn provider(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Provider {
            provider: provider.into(),
            message: message.into(),
        }
    }
}
