//! Suggestion provider trait.

use async_trait::async_trait;

use fjord_types::{Response, SuggestionLink};

use crate::error::SuggestError;

/// A source of suggested links for feedback responses.
///
/// Implementations must be usable from many tasks at once; any state built
/// by `load` is read-only afterwards.
#[async_trait]
pub trait Provider: Send + Sync {
    /// Provider name recorded on every link it produces.
    fn name(&self) -> &str;

    /// Provider version recorded on every link it produces.
    fn version(&self) -> u32;

    /// One-time setup. Calling it again must be harmless.
    async fn load(&self) -> Result<(), SuggestError>;

    /// Suggestions for `response`, most relevant first. May be empty.
    ///
    /// The result depends only on the response and the loaded state.
    async fn get_suggestions(
        &self,
        response: &Response,
    ) -> Result<Vec<SuggestionLink>, SuggestError>;
}
