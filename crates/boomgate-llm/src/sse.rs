//! SSE (Server-Sent Events) line parser for OpenAI-compatible streaming.
//!
//! The multi-provider endpoint streams lines like:
//!
//! ```text
//! data: {"choices":[{"delta":{"content":"Hello"}}]}
//!
//! data: {"error":{"message":"provider unavailable"}}
//!
//! data: [DONE]
//! ```

use serde::Deserialize;

use crate::error::{BackendError, Result};

/// The sentinel value that marks the end of an SSE stream.
const DONE_SENTINEL: &str = "[DONE]";

/// One parsed SSE line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SseFrame {
    /// Nothing of interest (blank line, comment, non-data field, empty delta).
    Skip,
    /// A non-empty text delta.
    Text(String),
    /// End of stream.
    Done,
}

#[derive(Debug, Deserialize)]
struct DeltaFrame {
    #[serde(default)]
    choices: Vec<DeltaChoice>,
    #[serde(default)]
    error: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct DeltaChoice {
    #[serde(default)]
    delta: Option<Delta>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Delta {
    #[serde(default)]
    content: Option<String>,
}

/// Parse a single SSE line.
///
/// A `finish_reason` without content is reported as [`SseFrame::Done`].
///
/// # Errors
///
/// [`BackendError::Upstream`] when the frame carries an `error` object, and
/// [`BackendError::InvalidResponse`] when the payload is not valid JSON.
pub fn parse_sse_line(line: &str) -> Result<SseFrame> {
    let line = line.trim_end();

    if line.is_empty() || line.starts_with(':') {
        return Ok(SseFrame::Skip);
    }

    let Some(rest) = line.strip_prefix("data:") else {
        return Ok(SseFrame::Skip);
    };
    let payload = rest.trim_start();

    if payload.is_empty() {
        return Ok(SseFrame::Skip);
    }
    if payload == DONE_SENTINEL {
        return Ok(SseFrame::Done);
    }

    let frame: DeltaFrame = serde_json::from_str(payload)
        .map_err(|e| BackendError::InvalidResponse(format!("failed to parse SSE delta: {e}")))?;

    if let Some(err) = frame.error {
        return Err(BackendError::Upstream(error_text(&err)));
    }

    let Some(choice) = frame.choices.into_iter().next() else {
        return Ok(SseFrame::Skip);
    };

    match choice.delta.and_then(|d| d.content) {
        Some(text) if !text.is_empty() => Ok(SseFrame::Text(text)),
        _ if choice.finish_reason.is_some() => Ok(SseFrame::Done),
        _ => Ok(SseFrame::Skip),
    }
}

/// Extract a message from `{"message": ".."}` or a bare string.
pub(crate) fn error_text(err: &serde_json::Value) -> String {
    err.get("message")
        .and_then(|m| m.as_str())
        .or_else(|| err.as_str())
        .map(String::from)
        .unwrap_or_else(|| err.to_string())
}
