//! Request, reply and event types for the gateway core.
//!
//! [`ChatRequest`] is built once per inbound call and read-only afterwards.
//! [`ChatReply`] and [`StreamEvent`] carry results back to the boundary;
//! both know how to render themselves in the outbound wire shape.

use std::time::Duration;

use boomgate_types::config::RetryConfig;
use serde::{Deserialize, Serialize};

use crate::error::GatewayError;
use crate::validator::Rejection;

/// Model label used for cache keys and replies when the caller names no model.
pub const AUTO_MODEL: &str = "auto";
/// Provider label on replies produced by the local fallback responder.
pub const LOCAL_FALLBACK_PROVIDER: &str = "local-fallback";
/// Model label on replies produced by the local fallback responder.
pub const LOCAL_FALLBACK_MODEL: &str = "fallback";
/// Provider label on replies served from the response cache.
pub const CACHE_PROVIDER: &str = "cache";

/// A message in a chat conversation sent to a backend.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChatMessage {
    /// The role of the message author ("system", "user", "assistant").
    pub role: String,

    /// The content of the message.
    pub content: String,
}

impl ChatMessage {
    /// Create a message with role and content.
    pub fn new(role: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            content: content.into(),
        }
    }

    /// Create a system message.
    pub fn system(content: impl Into<String>) -> Self {
        Self::new("system", content)
    }

    /// Create a user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self::new("user", content)
    }

    /// Create an assistant message.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new("assistant", content)
    }
}

/// A chat request as seen by the core.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatRequest {
    /// The user's message. Must be non-empty.
    pub message: String,

    /// Provider to try first, bypassing task heuristics.
    pub explicit_provider: Option<String>,

    /// Model to request from every candidate instead of its default.
    pub explicit_model: Option<String>,

    /// Number of rounds over the candidate list.
    pub max_retries: u32,

    /// Upper bound for each backend attempt.
    pub timeout_per_attempt: Duration,

    /// Whether the caller wants a stream of events.
    pub streaming: bool,
}

impl ChatRequest {
    /// Create a request with default retry count and timeout.
    pub fn new(message: impl Into<String>) -> Self {
        let defaults = RetryConfig::default();
        Self {
            message: message.into(),
            explicit_provider: None,
            explicit_model: None,
            max_retries: defaults.max_retries,
            timeout_per_attempt: defaults.attempt_timeout(),
            streaming: false,
        }
    }

    /// Try `provider` first.
    pub fn with_provider(mut self, provider: impl Into<String>) -> Self {
        self.explicit_provider = Some(provider.into());
        self
    }

    /// Request `model` from every candidate.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.explicit_model = Some(model.into());
        self
    }

    /// Set the number of retry rounds.
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Set the per-attempt timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_per_attempt = timeout;
        self
    }

    /// Mark the request as streaming.
    pub fn streaming(mut self) -> Self {
        self.streaming = true;
        self
    }

    /// The explicit model, or [`AUTO_MODEL`].
    pub fn model_or_auto(&self) -> &str {
        self.explicit_model.as_deref().unwrap_or(AUTO_MODEL)
    }

    /// Reject requests that must never reach the selector.
    pub fn ensure_valid(&self) -> Result<(), GatewayError> {
        if self.message.trim().is_empty() {
            return Err(GatewayError::EmptyMessage);
        }
        Ok(())
    }
}

/// Inbound request body in the boundary wire shape.
///
/// `timeout` is in milliseconds. Both `snake_case` and `camelCase` spellings
/// of `max_retries` are accepted.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct InboundRequest {
    /// The user's message.
    #[serde(default)]
    pub message: String,

    /// Optional explicit provider.
    #[serde(default)]
    pub provider: Option<String>,

    /// Optional explicit model.
    #[serde(default)]
    pub model: Option<String>,

    /// Optional retry rounds.
    #[serde(default, alias = "maxRetries")]
    pub max_retries: Option<u32>,

    /// Optional per-attempt timeout in milliseconds.
    #[serde(default)]
    pub timeout: Option<u64>,

    /// Whether to stream events.
    #[serde(default)]
    pub streaming: bool,
}

impl InboundRequest {
    /// Build a core request, filling gaps from `defaults`.
    pub fn into_request(self, defaults: &RetryConfig) -> ChatRequest {
        ChatRequest {
            message: self.message,
            explicit_provider: self.provider.filter(|p| !p.trim().is_empty()),
            explicit_model: self.model.filter(|m| !m.trim().is_empty()),
            max_retries: self.max_retries.unwrap_or(defaults.max_retries),
            timeout_per_attempt: self
                .timeout
                .filter(|ms| *ms > 0)
                .map(Duration::from_millis)
                .unwrap_or_else(|| defaults.attempt_timeout()),
            streaming: self.streaming,
        }
    }
}

/// A (provider, model) pair under consideration for a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    /// Provider name.
    pub provider: String,

    /// Model to request from the provider.
    pub model: String,

    /// Position of the group this candidate came from; lower tiers are tried first.
    pub tier: usize,

    /// Copied from the provider descriptor.
    pub supports_stream: bool,
}

impl Candidate {
    /// Create a streaming-capable candidate.
    pub fn new(provider: impl Into<String>, model: impl Into<String>, tier: usize) -> Self {
        Self {
            provider: provider.into(),
            model: model.into(),
            tier,
            supports_stream: true,
        }
    }

    /// Mark the candidate as unable to stream.
    pub fn without_stream(mut self) -> Self {
        self.supports_stream = false;
        self
    }
}

/// What happened on a single backend attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum AttemptOutcome {
    /// The backend answered and the validator accepted the text.
    Success(String),

    /// The backend answered but the validator rejected the text.
    Rejected(Rejection),

    /// The call itself failed (network, timeout, backend exception).
    TransportError(String),
}

/// The record of one backend attempt.
#[derive(Debug, Clone, PartialEq)]
pub struct AttemptResult {
    /// Provider that was called.
    pub provider: String,

    /// Model that was requested.
    pub model: String,

    /// Outcome of the call.
    pub outcome: AttemptOutcome,

    /// Wall time spent on the call.
    pub elapsed: Duration,
}

/// Non-streaming reply in the outbound wire shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatReply {
    /// The answer text.
    pub response: String,

    /// Provider that produced it (`"cache"` or `"local-fallback"` for synthetic sources).
    pub provider: String,

    /// Model that produced it.
    pub model: String,

    /// Seconds spent resolving the request.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub elapsed: Option<f64>,

    /// Whether the reply came from the response cache.
    #[serde(default)]
    pub cached: bool,
}

/// One event of a streaming session.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamEvent {
    /// A provider attempt is starting.
    Start {
        /// Provider being attempted.
        provider: String,
    },

    /// A piece of generated text.
    Chunk {
        /// The text fragment.
        text: String,
        /// Provider that produced it.
        provider: String,
    },

    /// The stream finished successfully.
    Complete {
        /// Concatenation of every chunk of the successful attempt.
        full_text: String,
        /// Provider that produced the text.
        provider: String,
        /// Time since the session started.
        elapsed: Duration,
    },

    /// The session failed internally.
    Error {
        /// Human-readable failure description.
        message: String,
    },
}

impl StreamEvent {
    /// Whether the event ends a segment of the session.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Complete { .. } | Self::Error { .. })
    }

    /// Render the event in the outbound wire shape.
    ///
    /// `Start`/`Complete` carry a `status` discriminator, `Chunk` a `chunk`
    /// field and `Error` an `error` field.
    pub fn to_wire(&self) -> serde_json::Value {
        match self {
            Self::Start { provider } => serde_json::json!({
                "status": "start",
                "provider": provider,
            }),
            Self::Chunk { text, provider } => serde_json::json!({
                "chunk": text,
                "provider": provider,
            }),
            Self::Complete {
                full_text,
                provider,
                elapsed,
            } => serde_json::json!({
                "status": "complete",
                "text": full_text,
                "provider": provider,
                "elapsed": elapsed.as_secs_f64(),
            }),
            Self::Error { message } => serde_json::json!({ "error": message }),
        }
    }

    /// Render the event as a single line of JSON.
    pub fn to_line(&self) -> String {
        self.to_wire().to_string()
    }
}
