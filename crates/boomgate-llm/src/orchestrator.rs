//! Fallback orchestrator: the sequential retry loop.
//!
//! [`FallbackOrchestrator::resolve`] walks the candidate list one attempt at
//! a time. Every answer goes through the [validator](crate::validator); a
//! rejection or a transport error moves on to the next candidate. After the
//! last candidate the next round starts, re-shuffled within each tier, after
//! a linearly growing pause. When every round is spent the
//! [`LocalResponder`] answers instead.
//!
//! Attempts are never run in parallel. Each one is bounded by the request's
//! per-attempt timeout.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use crate::backend::Backend;
use crate::responder::LocalResponder;
use crate::selector::reshuffle;
use crate::types::{
    AttemptOutcome, AttemptResult, Candidate, ChatMessage, ChatRequest, LOCAL_FALLBACK_MODEL,
    LOCAL_FALLBACK_PROVIDER,
};
use crate::validator::validate;

/// System prompt sent ahead of every user message.
pub const SYSTEM_PROMPT: &str =
    "You are a helpful assistant. Reply in the language of the question and keep answers concise.";

/// The message list sent to a backend for `message`.
pub fn prompt_messages(message: &str) -> Vec<ChatMessage> {
    vec![ChatMessage::system(SYSTEM_PROMPT), ChatMessage::user(message)]
}

/// Pause before retry round `round` (0-indexed): `base * round`.
pub fn round_delay(base: Duration, round: u32) -> Duration {
    base.saturating_mul(round)
}

/// The terminal outcome of [`FallbackOrchestrator::resolve`].
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    /// Accepted answer text. Never empty.
    pub text: String,

    /// Provider that produced it, or `"local-fallback"`.
    pub provider: String,

    /// Model that produced it, or `"fallback"`.
    pub model: String,

    /// Backend calls made.
    pub attempts: u32,

    /// Time from the first attempt to the outcome.
    pub elapsed: Duration,

    /// Whether the text came from the local responder.
    pub from_fallback: bool,
}

/// Drives candidates through the backend until one yields an accepted answer.
pub struct FallbackOrchestrator {
    backend: Arc<dyn Backend>,
    responder: LocalResponder,
    base_delay: Duration,
}

impl FallbackOrchestrator {
    /// Create an orchestrator over `backend` with the given round backoff base.
    pub fn new(backend: Arc<dyn Backend>, base_delay: Duration) -> Self {
        Self {
            backend,
            responder: LocalResponder::new(),
            base_delay,
        }
    }

    /// Run one validated attempt against `candidate`.
    pub async fn attempt(
        &self,
        candidate: &Candidate,
        messages: &[ChatMessage],
        timeout: Duration,
    ) -> AttemptResult {
        let start = Instant::now();
        let call = self
            .backend
            .complete_once(&candidate.provider, &candidate.model, messages, timeout);

        // The backend bounds itself too; this also covers backends that don't.
        let outcome = match tokio::time::timeout(timeout, call).await {
            Err(_) => AttemptOutcome::TransportError("timeout".into()),
            Ok(Err(e)) => AttemptOutcome::TransportError(e.to_string()),
            Ok(Ok(raw)) => match validate(&raw) {
                Ok(text) => AttemptOutcome::Success(text),
                Err(rejection) => AttemptOutcome::Rejected(rejection),
            },
        };

        AttemptResult {
            provider: candidate.provider.clone(),
            model: candidate.model.clone(),
            outcome,
            elapsed: start.elapsed(),
        }
    }

    /// Resolve `request` to text. Never fails.
    ///
    /// Makes at most `max(request.max_retries, 1) * candidates.len()` backend
    /// calls before falling back to the local responder.
    pub async fn resolve(&self, request: &ChatRequest, mut candidates: Vec<Candidate>) -> Resolution {
        let start = Instant::now();
        let messages = prompt_messages(&request.message);
        let rounds = request.max_retries.max(1);
        let mut attempts = 0u32;

        for round in 0..rounds {
            if round > 0 {
                let delay = round_delay(self.base_delay, round);
                debug!(round, delay_ms = delay.as_millis() as u64, "starting retry round");
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
                reshuffle(&mut candidates, &mut rand::thread_rng());
            }

            for candidate in &candidates {
                attempts += 1;
                debug!(
                    provider = %candidate.provider,
                    model = %candidate.model,
                    round,
                    attempt = attempts,
                    "trying provider"
                );

                let result = self
                    .attempt(candidate, &messages, request.timeout_per_attempt)
                    .await;
                let elapsed_ms = result.elapsed.as_millis() as u64;

                match result.outcome {
                    AttemptOutcome::Success(text) => {
                        info!(
                            provider = %result.provider,
                            model = %result.model,
                            attempts,
                            elapsed_ms,
                            "provider answered"
                        );
                        return Resolution {
                            text,
                            provider: result.provider,
                            model: result.model,
                            attempts,
                            elapsed: start.elapsed(),
                            from_fallback: false,
                        };
                    }
                    AttemptOutcome::Rejected(rejection) => {
                        warn!(
                            provider = %result.provider,
                            reason = "rejected",
                            detail = %rejection,
                            elapsed_ms,
                            "validator rejected response"
                        );
                    }
                    AttemptOutcome::TransportError(error) => {
                        warn!(
                            provider = %result.provider,
                            error = %error,
                            elapsed_ms,
                            "provider call failed"
                        );
                    }
                }
            }
        }

        info!(
            attempts,
            candidates = candidates.len(),
            "all providers failed, using local fallback"
        );
        Resolution {
            text: self.responder.respond(&request.message),
            provider: LOCAL_FALLBACK_PROVIDER.into(),
            model: LOCAL_FALLBACK_MODEL.into(),
            attempts,
            elapsed: start.elapsed(),
            from_fallback: true,
        }
    }
}

impl std::fmt::Debug for FallbackOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FallbackOrchestrator")
            .field("backend", &self.backend.name())
            .field("base_delay", &self.base_delay)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::ChunkStream;
    use crate::error::{BackendError, Result};
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicU32, Ordering};

    /// Per-provider scripted reply; providers not in the map fail.
    struct ScriptedBackend {
        replies: HashMap<String, String>,
        calls: AtomicU32,
        seen: Mutex<Vec<String>>,
        called_at: Mutex<Vec<tokio::time::Instant>>,
        delay: Duration,
    }

    impl ScriptedBackend {
        fn failing() -> Self {
            Self::with(&[])
        }

        fn with(replies: &[(&str, &str)]) -> Self {
            Self {
                replies: replies
                    .iter()
                    .map(|(p, r)| ((*p).to_owned(), (*r).to_owned()))
                    .collect(),
                calls: AtomicU32::new(0),
                seen: Mutex::new(Vec::new()),
                called_at: Mutex::new(Vec::new()),
                delay: Duration::ZERO,
            }
        }
    }

    #[async_trait]
    impl Backend for ScriptedBackend {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn complete_once(
            &self,
            provider: &str,
            _model: &str,
            messages: &[ChatMessage],
            _timeout: Duration,
        ) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.seen.lock().unwrap().push(provider.to_owned());
            self.called_at.lock().unwrap().push(tokio::time::Instant::now());
            assert_eq!(messages[0].role, "system");
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            self.replies
                .get(provider)
                .cloned()
                .ok_or_else(|| BackendError::RequestFailed("connection refused".into()))
        }

        async fn complete_stream(
            &self,
            _provider: &str,
            _model: &str,
            _messages: &[ChatMessage],
            _timeout: Duration,
        ) -> Result<ChunkStream> {
            Err(BackendError::NotConfigured("no streaming".into()))
        }
    }

    fn candidates(names: &[&str]) -> Vec<Candidate> {
        names.iter().map(|n| Candidate::new(*n, "m", 0)).collect()
    }

    fn orchestrator(backend: Arc<ScriptedBackend>) -> FallbackOrchestrator {
        FallbackOrchestrator::new(backend, Duration::ZERO)
    }

    #[test]
    fn round_delay_grows_linearly() {
        let base = Duration::from_millis(1000);
        assert_eq!(round_delay(base, 1), Duration::from_millis(1000));
        assert_eq!(round_delay(base, 2), Duration::from_millis(2000));
    }

    #[tokio::test(start_paused = true)]
    async fn resolve_waits_between_rounds() {
        let backend = Arc::new(ScriptedBackend::failing());
        let base = Duration::from_secs(1);
        let orch = FallbackOrchestrator::new(backend.clone(), base);
        let req = ChatRequest::new("hello").with_max_retries(3);

        let res = orch.resolve(&req, candidates(&["A", "B"])).await;
        assert!(res.from_fallback);

        let times = backend.called_at.lock().unwrap().clone();
        assert_eq!(times.len(), 6);
        let gap = |i: usize| times[i] - times[i - 1];
        let about = |d: Duration, want: Duration| d >= want && d < want + Duration::from_millis(5);
        // No pause inside a round; round n starts base * n after the previous one.
        assert!(about(gap(1), Duration::ZERO));
        assert!(about(gap(2), base), "gap before round 1: {:?}", gap(2));
        assert!(about(gap(3), Duration::ZERO));
        assert!(about(gap(4), base * 2), "gap before round 2: {:?}", gap(4));
        assert!(about(gap(5), Duration::ZERO));
    }

    #[test]
    fn prompt_messages_shape() {
        let msgs = prompt_messages("hi");
        assert_eq!(msgs.len(), 2);
        assert_eq!(msgs[0].content, SYSTEM_PROMPT);
        assert_eq!(msgs[1], ChatMessage::user("hi"));
    }

    #[tokio::test]
    async fn first_success_wins() {
        let backend = Arc::new(ScriptedBackend::with(&[(
            "A",
            "  Paris is the capital of France.  ",
        )]));
        let orch = orchestrator(backend.clone());
        let req = ChatRequest::new("capital of France?");
        let res = orch.resolve(&req, candidates(&["A", "B"])).await;
        assert_eq!(res.text, "Paris is the capital of France.");
        assert_eq!(res.provider, "A");
        assert_eq!(res.attempts, 1);
        assert!(!res.from_fallback);
        assert_eq!(backend.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn rejection_advances_to_next() {
        let backend = Arc::new(ScriptedBackend::with(&[
            ("A", "<html><body>Cloudflare</body></html>"),
            ("B", "A perfectly reasonable answer."),
        ]));
        let orch = orchestrator(backend.clone());
        let res = orch
            .resolve(&ChatRequest::new("q"), candidates(&["A", "B"]))
            .await;
        assert_eq!(res.provider, "B");
        assert_eq!(res.attempts, 2);
    }

    #[tokio::test]
    async fn exhaustion_makes_rounds_times_candidates_attempts() {
        let backend = Arc::new(ScriptedBackend::failing());
        let orch = orchestrator(backend.clone());
        let req = ChatRequest::new("hello").with_max_retries(2);
        let res = orch.resolve(&req, candidates(&["A", "B", "C"])).await;

        assert_eq!(backend.calls.load(Ordering::SeqCst), 6);
        assert_eq!(res.attempts, 6);
        assert!(res.from_fallback);
        assert_eq!(res.provider, LOCAL_FALLBACK_PROVIDER);
        assert_eq!(res.model, LOCAL_FALLBACK_MODEL);
        assert!(!res.text.is_empty());
    }

    #[tokio::test]
    async fn zero_retries_still_tries_once() {
        let backend = Arc::new(ScriptedBackend::failing());
        let orch = orchestrator(backend.clone());
        let req = ChatRequest::new("hello").with_max_retries(0);
        orch.resolve(&req, candidates(&["A", "B"])).await;
        assert_eq!(backend.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn empty_candidates_fall_back_immediately() {
        let backend = Arc::new(ScriptedBackend::failing());
        let orch = orchestrator(backend.clone());
        let res = orch.resolve(&ChatRequest::new("hello"), vec![]).await;
        assert!(res.from_fallback);
        assert_eq!(res.attempts, 0);
    }

    #[tokio::test]
    async fn timeout_counts_as_transport_error() {
        let mut slow = ScriptedBackend::with(&[("Slow", "A perfectly reasonable answer.")]);
        slow.delay = Duration::from_millis(200);
        let orch = orchestrator(Arc::new(slow));

        let result = orch
            .attempt(
                &Candidate::new("Slow", "m", 0),
                &prompt_messages("q"),
                Duration::from_millis(20),
            )
            .await;
        assert_eq!(
            result.outcome,
            AttemptOutcome::TransportError("timeout".into())
        );
    }

    #[tokio::test]
    async fn rounds_revisit_every_candidate() {
        let backend = Arc::new(ScriptedBackend::failing());
        let orch = orchestrator(backend.clone());
        let req = ChatRequest::new("q").with_max_retries(3);
        orch.resolve(&req, candidates(&["A", "B"])).await;

        let seen = backend.seen.lock().unwrap().clone();
        assert_eq!(seen.len(), 6);
        for round in seen.chunks(2) {
            let mut names = round.to_vec();
            names.sort();
            assert_eq!(names, vec!["A", "B"]);
        }
    }
}
