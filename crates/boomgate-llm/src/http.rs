//! HTTP backend speaking the OpenAI chat-completions format.
//!
//! [`HttpBackend`] targets a single multi-provider endpoint that accepts an
//! extra `provider` field naming the upstream provider to route to. Every
//! provider in the catalog is reached through the same base URL.

use std::time::Duration;

use async_trait::async_trait;
use boomgate_types::config::BackendConfig;
use futures_util::stream::{self, BoxStream, StreamExt};
use serde::Serialize;
use tracing::{debug, trace, warn};

use crate::backend::{Backend, ChunkStream};
use crate::error::{BackendError, Result};
use crate::sse::{SseFrame, error_text, parse_sse_line};
use crate::types::ChatMessage;

/// Request body sent to `/chat/completions`.
#[derive(Debug, Serialize)]
struct CompletionBody<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    provider: &'a str,
    stream: bool,
}

/// A [`Backend`] that posts to an OpenAI-compatible multi-provider endpoint.
pub struct HttpBackend {
    config: BackendConfig,
    http: reqwest::Client,
    api_key: Option<String>,
}

impl HttpBackend {
    /// Create a backend from configuration.
    ///
    /// The bearer token, if any, is read once from `config.api_key_env`.
    pub fn new(config: BackendConfig) -> Self {
        let api_key = config
            .api_key_env
            .as_deref()
            .and_then(|var| std::env::var(var).ok())
            .filter(|key| !key.is_empty());
        Self {
            config,
            http: reqwest::Client::new(),
            api_key,
        }
    }

    /// Create a backend with an explicit bearer token.
    pub fn with_api_key(config: BackendConfig, api_key: String) -> Self {
        Self {
            config,
            http: reqwest::Client::new(),
            api_key: Some(api_key),
        }
    }

    /// Returns the chat completions endpoint URL.
    fn completions_url(&self) -> String {
        let base = self.config.base_url.trim_end_matches('/');
        format!("{base}/chat/completions")
    }

    /// Post the request and map non-success statuses to errors.
    async fn send(
        &self,
        provider: &str,
        model: &str,
        messages: &[ChatMessage],
        stream: bool,
    ) -> Result<reqwest::Response> {
        let body = CompletionBody {
            model,
            messages,
            provider,
            stream,
        };

        debug!(
            provider = %provider,
            model = %model,
            stream,
            messages = messages.len(),
            "sending chat completion request"
        );

        let mut req = self
            .http
            .post(self.completions_url())
            .header("Content-Type", "application/json");
        if stream {
            req = req.header("Accept", "text/event-stream");
        }
        if let Some(ref key) = self.api_key {
            req = req.header("Authorization", format!("Bearer {key}"));
        }
        for (k, v) in &self.config.headers {
            req = req.header(k.as_str(), v.as_str());
        }

        let response = req.json(&body).send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        match status.as_u16() {
            429 => {
                let retry_ms = parse_retry_after_header(&response).unwrap_or(1000);
                let body = response.text().await.unwrap_or_default();
                warn!(
                    provider = %provider,
                    retry_after_ms = retry_ms,
                    body = %body,
                    "rate limited"
                );
                Err(BackendError::RateLimited {
                    retry_after_ms: retry_ms,
                })
            }
            401 | 403 => {
                let body = response.text().await.unwrap_or_default();
                Err(BackendError::AuthFailed(body))
            }
            _ => {
                let body = response.text().await.unwrap_or_default();
                Err(BackendError::RequestFailed(format!("HTTP {status}: {body}")))
            }
        }
    }
}

#[async_trait]
impl Backend for HttpBackend {
    fn name(&self) -> &str {
        "http"
    }

    async fn complete_once(
        &self,
        provider: &str,
        model: &str,
        messages: &[ChatMessage],
        timeout: Duration,
    ) -> Result<String> {
        let call = async {
            let response = self.send(provider, model, messages, false).await?;
            let body = response.text().await?;
            extract_content(&body)
        };
        tokio::time::timeout(timeout, call)
            .await
            .map_err(|_| BackendError::Timeout)?
    }

    async fn complete_stream(
        &self,
        provider: &str,
        model: &str,
        messages: &[ChatMessage],
        timeout: Duration,
    ) -> Result<ChunkStream> {
        let response = tokio::time::timeout(timeout, self.send(provider, model, messages, true))
            .await
            .map_err(|_| BackendError::Timeout)??;

        let bytes = response
            .bytes_stream()
            .map(|chunk| chunk.map(|b| b.to_vec()))
            .boxed();

        Ok(sse_text_stream(bytes, provider.to_owned()))
    }
}

/// Pull state for [`sse_text_stream`].
struct SseState {
    bytes: BoxStream<'static, std::result::Result<Vec<u8>, reqwest::Error>>,
    buffer: Vec<u8>,
    finished: bool,
    provider: String,
}

/// Turn a raw SSE byte stream into a stream of text deltas.
///
/// Bytes are only read from the network when the consumer polls. Lines are
/// split on raw bytes so a multi-byte character straddling two network
/// chunks is decoded intact.
fn sse_text_stream(
    bytes: BoxStream<'static, std::result::Result<Vec<u8>, reqwest::Error>>,
    provider: String,
) -> ChunkStream {
    let state = SseState {
        bytes,
        buffer: Vec::new(),
        finished: false,
        provider,
    };

    stream::unfold(state, |mut state| async move {
        loop {
            let line = if let Some(pos) = state.buffer.iter().position(|b| *b == b'\n') {
                let raw: Vec<u8> = state.buffer.drain(..=pos).collect();
                String::from_utf8_lossy(&raw).into_owned()
            } else if state.finished {
                if state.buffer.is_empty() {
                    return None;
                }
                let raw = std::mem::take(&mut state.buffer);
                String::from_utf8_lossy(&raw).into_owned()
            } else {
                match state.bytes.next().await {
                    Some(Ok(chunk)) => {
                        state.buffer.extend_from_slice(&chunk);
                        continue;
                    }
                    Some(Err(e)) => {
                        state.finished = true;
                        state.buffer.clear();
                        let err = BackendError::RequestFailed(format!("stream read error: {e}"));
                        return Some((Err(err), state));
                    }
                    None => {
                        state.finished = true;
                        continue;
                    }
                }
            };

            match parse_sse_line(&line) {
                Ok(SseFrame::Skip) => continue,
                Ok(SseFrame::Text(text)) => {
                    trace!(provider = %state.provider, len = text.len(), "streaming chunk");
                    return Some((Ok(text), state));
                }
                Ok(SseFrame::Done) => {
                    debug!(provider = %state.provider, "streaming complete");
                    return None;
                }
                Err(e) => {
                    state.finished = true;
                    state.buffer.clear();
                    return Some((Err(e), state));
                }
            }
        }
    })
    .boxed()
}

/// Pull the answer text out of a non-streaming response body.
///
/// Markup bodies are returned verbatim so the validator sees them.
fn extract_content(body: &str) -> Result<String> {
    let value: serde_json::Value = match serde_json::from_str(body) {
        Ok(v) => v,
        Err(e) if body.trim_start().starts_with('<') => {
            trace!(error = %e, "non-JSON markup body passed through");
            return Ok(body.to_owned());
        }
        Err(e) => {
            return Err(BackendError::InvalidResponse(format!(
                "failed to parse response: {e}"
            )));
        }
    };

    if let Some(err) = value.get("error").filter(|e| !e.is_null()) {
        return Err(BackendError::Upstream(error_text(err)));
    }

    value
        .pointer("/choices/0/message/content")
        .and_then(|c| c.as_str())
        .map(String::from)
        .ok_or_else(|| BackendError::InvalidResponse("missing choices[0].message.content".into()))
}

/// Read a numeric `Retry-After` header (seconds, possibly fractional).
fn parse_retry_after_header(response: &reqwest::Response) -> Option<u64> {
    let header_val = response
        .headers()
        .get("retry-after")
        .and_then(|v| v.to_str().ok())?;
    header_val
        .parse::<f64>()
        .ok()
        .map(|secs| (secs * 1000.0).max(0.0) as u64)
}

impl std::fmt::Debug for HttpBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpBackend")
            .field("base_url", &self.config.base_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "***"))
            .finish()
    }
}
