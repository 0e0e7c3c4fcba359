//! Error types for boomgate-llm.
//!
//! Two taxonomies live here:
//!
//! - [`BackendError`] -- transport-level failures of a single backend call.
//!   These are retried by the orchestrator and never reach the caller.
//! - [`GatewayError`] -- caller errors reported immediately, without retry.

use thiserror::Error;

/// Errors that can occur when calling a backend provider.
#[derive(Error, Debug)]
pub enum BackendError {
    /// The HTTP request to the backend failed.
    #[error("request failed: {0}")]
    RequestFailed(String),

    /// Authentication with the backend was rejected (HTTP 401/403).
    #[error("authentication failed: {0}")]
    AuthFailed(String),

    /// The backend returned a rate-limit response (HTTP 429).
    #[error("rate limited: retry after {retry_after_ms}ms")]
    RateLimited {
        /// Suggested wait time before retrying, in milliseconds.
        retry_after_ms: u64,
    },

    /// The backend is not reachable with the current configuration.
    #[error("backend not configured: {0}")]
    NotConfigured(String),

    /// The backend returned a body that could not be understood.
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// The provider behind the backend reported an error in-band.
    #[error("upstream error: {0}")]
    Upstream(String),

    /// The attempt exceeded its per-attempt timeout.
    #[error("timeout")]
    Timeout,

    /// An HTTP-level error from reqwest.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// A JSON serialization/deserialization error.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Caller errors: the request itself is unusable.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GatewayError {
    /// The message was empty or whitespace only.
    #[error("message must not be empty")]
    EmptyMessage,

    /// The explicitly requested provider is not in the catalog.
    #[error("unknown provider: {0}")]
    UnknownProvider(String),

    /// The provider table is malformed (duplicate or blank names).
    #[error("invalid provider catalog: {0}")]
    Catalog(String),
}

impl GatewayError {
    /// Whether the error was caused by the caller's request.
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::EmptyMessage | Self::UnknownProvider(_))
    }
}

/// A convenience type alias for backend operations.
pub type Result<T> = std::result::Result<T, BackendError>;
