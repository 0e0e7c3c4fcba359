//! The [`Backend`] trait: how the gateway talks to named providers.
//!
//! A backend routes a prompt to one named provider and returns either the
//! finished text or a pull-based stream of text chunks. The concrete
//! implementation is [`HttpBackend`](crate::http::HttpBackend); tests use
//! hand-written stubs.

use std::time::Duration;

use async_trait::async_trait;
use futures_util::stream::BoxStream;

use crate::error::Result;
use crate::types::ChatMessage;

/// A stream of text chunks from a backend.
///
/// The stream may yield an error mid-sequence. Dropping it releases the
/// underlying connection.
pub type ChunkStream = BoxStream<'static, Result<String>>;

/// A collaborator that can invoke a named provider.
///
/// # Example
///
/// ```rust,ignore
/// use boomgate_llm::{Backend, ChatMessage};
/// use std::time::Duration;
///
/// async fn ask(backend: &dyn Backend) -> boomgate_llm::Result<String> {
///     backend
///         .complete_once("DeepInfra", "mistral-7b-instruct",
///             &[ChatMessage::user("What is 2+2?")], Duration::from_secs(25))
///         .await
/// }
/// ```
#[async_trait]
pub trait Backend: Send + Sync {
    /// Short identifier for logs (e.g. `"http"`).
    fn name(&self) -> &str;

    /// Run a single non-streaming completion.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError`](crate::error::BackendError) on network
    /// failure, non-success status, undecodable body, or timeout.
    async fn complete_once(
        &self,
        provider: &str,
        model: &str,
        messages: &[ChatMessage],
        timeout: Duration,
    ) -> Result<String>;

    /// Open a streaming completion.
    ///
    /// `timeout` bounds establishing the stream; the caller decides how long
    /// to keep pulling.
    async fn complete_stream(
        &self,
        provider: &str,
        model: &str,
        messages: &[ChatMessage],
        timeout: Duration,
    ) -> Result<ChunkStream>;
}
