//! Suggestion provider output.

use serde::{Deserialize, Serialize};

/// A suggested link produced by a suggestion provider for one response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuggestionLink {
    /// Name of the provider that produced this link
    pub provider: String,
    pub provider_version: u32,
    pub summary: String,
    pub description: String,
    pub url: String,
}
