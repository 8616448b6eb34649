//! # fjord-suggest
//!
//! Suggestion providers produce links relevant to a feedback response.
//!
//! Providers implement [`Provider`]; the [`SuggestEngine`] loads each of them
//! once and collects their suggestions in registration order.
//!
//! ```rust,ignore
//! let mut engine = SuggestEngine::new();
//! engine.register(Arc::new(DummyProvider::new()));
//! engine.load().await?;
//! let links = engine.get_suggestions(&response).await?;
//! ```

pub mod dummy;
pub mod engine;
pub mod error;
pub mod provider;

pub use dummy::DummyProvider;
pub use engine::SuggestEngine;
pub use error::SuggestError;
pub use provider::Provider;
