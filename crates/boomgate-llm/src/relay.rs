//! Streaming relay.
//!
//! Turns backend chunk streams into an outbound [`StreamEvent`] sequence on a
//! bounded channel. Candidates are tried in order; each attempted provider
//! gets its own `Start`. Chunks are forwarded as soon as they arrive and the
//! backend is only polled after the previous chunk was accepted by the
//! channel, so a slow caller slows the upstream read.
//!
//! A candidate fails when its stream cannot be opened, errors, times out,
//! leaks markup, or ends without a single chunk. The first candidate whose
//! stream ends cleanly with text produces the one `Complete`. If none does,
//! the local responder's text is streamed in word groups instead.
//!
//! Cancellation (token or dropped receiver) stops the relay even while the
//! backend is stalled; the backend stream is dropped immediately.

use std::sync::Arc;
use std::time::{Duration, Instant};

use boomgate_types::config::StreamConfig;
use futures_util::StreamExt;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::backend::Backend;
use crate::orchestrator::prompt_messages;
use crate::responder::{LocalResponder, word_groups};
use crate::types::{Candidate, ChatMessage, ChatRequest, LOCAL_FALLBACK_PROVIDER, StreamEvent};
use crate::validator::is_markup;

/// Longest markup marker, in characters; a marker split across two chunks
/// is caught by checking this much of the previous text.
const MARKER_WINDOW: usize = 9;

/// How a relay session ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelayOutcome {
    /// A provider's stream completed.
    Completed {
        /// The provider that completed.
        provider: String,
    },
    /// Every candidate failed; the local fallback text was streamed.
    Fallback,
    /// The caller went away or the token was cancelled.
    Cancelled,
}

/// How a single candidate attempt ended.
enum Attempt {
    Completed(String),
    Failed,
    Cancelled,
}

/// Streams candidate output to a caller, falling through on failure.
pub struct StreamingRelay {
    backend: Arc<dyn Backend>,
    responder: LocalResponder,
    config: StreamConfig,
}

impl StreamingRelay {
    /// Create a relay over `backend`.
    pub fn new(backend: Arc<dyn Backend>, config: StreamConfig) -> Self {
        Self {
            backend,
            responder: LocalResponder::new(),
            config,
        }
    }

    /// Run the relay on a background task and return the event receiver.
    ///
    /// If the relay task panics, an `Error` event is emitted followed by a
    /// complete local-fallback segment.
    pub fn spawn(
        self: Arc<Self>,
        request: ChatRequest,
        candidates: Vec<Candidate>,
        cancel: CancellationToken,
    ) -> mpsc::Receiver<StreamEvent> {
        let (tx, rx) = mpsc::channel(self.config.channel_capacity.max(1));

        tokio::spawn(async move {
            let start = Instant::now();
            let inner = {
                let relay = Arc::clone(&self);
                let request = request.clone();
                let tx = tx.clone();
                let cancel = cancel.clone();
                tokio::spawn(async move { relay.relay(&request, &candidates, &tx, &cancel).await })
            };

            match inner.await {
                Ok(outcome) => debug!(outcome = ?outcome, "relay finished"),
                Err(e) if e.is_panic() => {
                    error!(error = %e, "relay task panicked");
                    let event = StreamEvent::Error {
                        message: "internal error while streaming".into(),
                    };
                    if emit(&tx, &cancel, event).await {
                        self.stream_fallback(&request.message, &tx, &cancel, start)
                            .await;
                    }
                }
                Err(e) => debug!(error = %e, "relay task aborted"),
            }
        });

        rx
    }

    /// Stream `request` through `candidates` into `tx`.
    pub async fn relay(
        &self,
        request: &ChatRequest,
        candidates: &[Candidate],
        tx: &mpsc::Sender<StreamEvent>,
        cancel: &CancellationToken,
    ) -> RelayOutcome {
        let start = Instant::now();
        let messages = prompt_messages(&request.message);
        let mut attempted = 0u32;

        for candidate in candidates {
            if cancel.is_cancelled() || tx.is_closed() {
                return RelayOutcome::Cancelled;
            }
            if !candidate.supports_stream {
                debug!(provider = %candidate.provider, "skipping provider without streaming");
                continue;
            }

            attempted += 1;
            let started = StreamEvent::Start {
                provider: candidate.provider.clone(),
            };
            if !emit(tx, cancel, started).await {
                return RelayOutcome::Cancelled;
            }

            match self
                .stream_candidate(candidate, &messages, request.timeout_per_attempt, tx, cancel)
                .await
            {
                Attempt::Completed(full_text) => {
                    info!(
                        provider = %candidate.provider,
                        attempted,
                        elapsed_ms = start.elapsed().as_millis() as u64,
                        "stream completed"
                    );
                    let done = StreamEvent::Complete {
                        full_text,
                        provider: candidate.provider.clone(),
                        elapsed: start.elapsed(),
                    };
                    if !emit(tx, cancel, done).await {
                        return RelayOutcome::Cancelled;
                    }
                    return RelayOutcome::Completed {
                        provider: candidate.provider.clone(),
                    };
                }
                Attempt::Cancelled => return RelayOutcome::Cancelled,
                Attempt::Failed => {}
            }
        }

        info!(attempted, "all streaming providers failed, using local fallback");
        if self
            .stream_fallback(&request.message, tx, cancel, start)
            .await
        {
            RelayOutcome::Fallback
        } else {
            RelayOutcome::Cancelled
        }
    }

    /// Pull one candidate's stream, forwarding chunks.
    async fn stream_candidate(
        &self,
        candidate: &Candidate,
        messages: &[ChatMessage],
        timeout: Duration,
        tx: &mpsc::Sender<StreamEvent>,
        cancel: &CancellationToken,
    ) -> Attempt {
        let provider = candidate.provider.as_str();
        let open = self
            .backend
            .complete_stream(provider, &candidate.model, messages, timeout);

        let opened = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Attempt::Cancelled,
            _ = tx.closed() => return Attempt::Cancelled,
            r = tokio::time::timeout(timeout, open) => r,
        };
        let mut stream = match opened {
            Ok(Ok(stream)) => stream,
            Ok(Err(e)) => {
                warn!(provider = %provider, error = %e, "failed to open stream");
                return Attempt::Failed;
            }
            Err(_) => {
                warn!(provider = %provider, error = "timeout", "failed to open stream");
                return Attempt::Failed;
            }
        };

        let mut full_text = String::new();
        let mut chunks = 0usize;

        loop {
            let next = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Attempt::Cancelled,
                _ = tx.closed() => return Attempt::Cancelled,
                n = tokio::time::timeout(timeout, stream.next()) => n,
            };

            let text = match next {
                Ok(Some(Ok(text))) => text,
                Ok(None) => break,
                Ok(Some(Err(e))) => {
                    warn!(provider = %provider, chunks, error = %e, "stream failed");
                    return Attempt::Failed;
                }
                Err(_) => {
                    warn!(provider = %provider, chunks, error = "timeout", "stream stalled");
                    return Attempt::Failed;
                }
            };

            if markup_across(&full_text, &text) {
                warn!(provider = %provider, chunks, reason = "rejected", "markup in stream");
                return Attempt::Failed;
            }

            full_text.push_str(&text);
            chunks += 1;
            let event = StreamEvent::Chunk {
                text,
                provider: provider.to_owned(),
            };
            if !emit(tx, cancel, event).await {
                return Attempt::Cancelled;
            }
        }

        if chunks == 0 {
            warn!(provider = %provider, reason = "rejected", "stream ended without chunks");
            return Attempt::Failed;
        }
        Attempt::Completed(full_text)
    }

    /// Stream the local responder's text as a full segment.
    ///
    /// Returns `false` if cancelled before `Complete` was delivered.
    async fn stream_fallback(
        &self,
        message: &str,
        tx: &mpsc::Sender<StreamEvent>,
        cancel: &CancellationToken,
        start: Instant,
    ) -> bool {
        let text = self.responder.respond(message);
        let groups = word_groups(&text, self.config.fallback_chunk_groups);
        let delay = self.config.fallback_chunk_delay();

        let started = StreamEvent::Start {
            provider: LOCAL_FALLBACK_PROVIDER.into(),
        };
        if !emit(tx, cancel, started).await {
            return false;
        }

        let mut full_text = String::with_capacity(text.len());
        for group in groups {
            if !delay.is_zero() {
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => return false,
                    _ = tx.closed() => return false,
                    _ = tokio::time::sleep(delay) => {}
                }
            }
            full_text.push_str(&group);
            let event = StreamEvent::Chunk {
                text: group,
                provider: LOCAL_FALLBACK_PROVIDER.into(),
            };
            if !emit(tx, cancel, event).await {
                return false;
            }
        }

        let done = StreamEvent::Complete {
            full_text,
            provider: LOCAL_FALLBACK_PROVIDER.into(),
            elapsed: start.elapsed(),
        };
        emit(tx, cancel, done).await
    }
}

impl std::fmt::Debug for StreamingRelay {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamingRelay")
            .field("backend", &self.backend.name())
            .field("config", &self.config)
            .finish()
    }
}

/// Send `event` unless the session is cancelled. Returns `false` when the
/// event was not delivered.
async fn emit(
    tx: &mpsc::Sender<StreamEvent>,
    cancel: &CancellationToken,
    event: StreamEvent,
) -> bool {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => false,
        r = tx.send(event) => r.is_ok(),
    }
}

/// Whether appending `next` to `so_far` introduces a markup marker.
fn markup_across(so_far: &str, next: &str) -> bool {
    let tail_start = so_far
        .char_indices()
        .rev()
        .nth(MARKER_WINDOW - 1)
        .map(|(i, _)| i)
        .unwrap_or(0);
    let mut window = String::with_capacity(so_far.len() - tail_start + next.len());
    window.push_str(&so_far[tail_start..]);
    window.push_str(next);
    is_markup(&window)
}
