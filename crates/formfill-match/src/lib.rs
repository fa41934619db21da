//! AI field matching.
//!
//! Orchestrates prompt construction ([`prompt`]), the chat-completion call
//! ([`client`]) and response post-processing ([`matcher`]). Failures that
//! prevent reaching the model are surfaced with a stable taxonomy the
//! boundary layer can map to status codes; a model call that succeeds but
//! returns unparseable JSON degrades to the empty-mappings result instead.

use thiserror::Error;

pub mod client;
pub mod matcher;
pub mod mock;
pub mod prompt;

pub use client::{ModelClient, OpenAiClient};
pub use matcher::FieldMatcher;
pub use prompt::Prompt;

#[derive(Error, Debug)]
pub enum MatchError {
    /// No usable credential: neither the caller nor the process supplied
    /// an API key. A configuration failure, never retried automatically.
    #[error("no API key configured; supply one in the request or set OPENAI_API_KEY")]
    MissingApiKey,
    #[error("model provider rejected the API key")]
    Auth,
    #[error("cannot reach model provider: {0}")]
    Connectivity(String),
    #[error("model provider rate limited the request; retry later")]
    RateLimited,
    /// Nothing was extracted from the submitted documents, so there is
    /// nothing to match against. Short-circuits before the model call.
    #[error("no text could be extracted from the submitted documents")]
    NoExtractedText,
    /// Catch-all for unexpected provider behavior, carrying the original
    /// message for diagnostics.
    #[error("field matching failed: {0}")]
    Processing(String),
}
