//! The gateway facade.
//!
//! [`Gateway`] owns one of each component and exposes the two entry points a
//! boundary layer needs: [`Gateway::chat`] for a single JSON reply and
//! [`Gateway::chat_stream`] for an event stream.

use std::sync::Arc;
use std::time::Instant;

use boomgate_types::GatewayConfig;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::backend::Backend;
use crate::cache::ResponseCache;
use crate::catalog::ProviderCatalog;
use crate::error::GatewayError;
use crate::http::HttpBackend;
use crate::orchestrator::FallbackOrchestrator;
use crate::relay::StreamingRelay;
use crate::selector::ProviderSelector;
use crate::types::{CACHE_PROVIDER, ChatReply, ChatRequest, InboundRequest, StreamEvent};

/// Chat-completion gateway: selection, fallback, caching and streaming.
pub struct Gateway {
    config: GatewayConfig,
    selector: ProviderSelector,
    orchestrator: FallbackOrchestrator,
    relay: Arc<StreamingRelay>,
    cache: ResponseCache,
}

impl Gateway {
    /// Build a gateway that talks HTTP to `config.backend`.
    pub fn from_config(config: GatewayConfig) -> Result<Self, GatewayError> {
        let backend = Arc::new(HttpBackend::new(config.backend.clone()));
        Self::new(config, backend)
    }

    /// Build a gateway over an arbitrary backend.
    ///
    /// The catalog comes from `config.providers`, or the built-in table.
    pub fn new(config: GatewayConfig, backend: Arc<dyn Backend>) -> Result<Self, GatewayError> {
        let catalog = ProviderCatalog::from_config(&config)?;
        Ok(Self::with_catalog(config, catalog, backend))
    }

    /// Build a gateway from explicit parts.
    pub fn with_catalog(
        config: GatewayConfig,
        catalog: ProviderCatalog,
        backend: Arc<dyn Backend>,
    ) -> Self {
        let selector = ProviderSelector::new(Arc::new(catalog));
        let orchestrator = FallbackOrchestrator::new(Arc::clone(&backend), config.retry.base_delay());
        let relay = Arc::new(StreamingRelay::new(backend, config.stream.clone()));
        let cache = ResponseCache::new(&config.cache);
        Self {
            config,
            selector,
            orchestrator,
            relay,
            cache,
        }
    }

    /// The resolved configuration.
    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    /// The provider catalog.
    pub fn catalog(&self) -> &ProviderCatalog {
        self.selector.catalog()
    }

    /// The provider selector.
    pub fn selector(&self) -> &ProviderSelector {
        &self.selector
    }

    /// The response cache.
    pub fn cache(&self) -> &ResponseCache {
        &self.cache
    }

    /// Convert a wire request, filling defaults from the retry config.
    pub fn request_from(&self, inbound: InboundRequest) -> ChatRequest {
        inbound.into_request(&self.config.retry)
    }

    /// Resolve a request to a single reply.
    ///
    /// # Errors
    ///
    /// Only caller errors: an empty message or an unknown explicit provider.
    /// Backend failures end in a local-fallback reply instead.
    pub async fn chat(&self, request: &ChatRequest) -> Result<ChatReply, GatewayError> {
        request.ensure_valid()?;
        if let Some(ref name) = request.explicit_provider {
            self.catalog().lookup(name)?;
        }

        let start = Instant::now();
        let model_key = request.model_or_auto();

        if let Some(text) = self.cache.get(model_key, &request.message) {
            info!(model = %model_key, "cache hit");
            return Ok(ChatReply {
                response: text,
                provider: CACHE_PROVIDER.into(),
                model: model_key.to_owned(),
                elapsed: Some(start.elapsed().as_secs_f64()),
                cached: true,
            });
        }

        let candidates = self.selector.select(request)?;
        let resolution = self.orchestrator.resolve(request, candidates).await;

        if !resolution.from_fallback {
            self.cache.put(model_key, &request.message, resolution.text.clone());
        }
        debug!(
            provider = %resolution.provider,
            attempts = resolution.attempts,
            "chat resolved"
        );

        Ok(ChatReply {
            response: resolution.text,
            provider: resolution.provider,
            model: resolution.model,
            elapsed: Some(start.elapsed().as_secs_f64()),
            cached: false,
        })
    }

    /// Start a streaming session and return its event receiver.
    ///
    /// Must be called from within a Tokio runtime. Streaming replies are
    /// never cached.
    ///
    /// # Errors
    ///
    /// Only caller errors, as for [`chat`](Self::chat).
    pub fn chat_stream(
        &self,
        request: ChatRequest,
        cancel: CancellationToken,
    ) -> Result<mpsc::Receiver<StreamEvent>, GatewayError> {
        request.ensure_valid()?;
        let candidates = self.selector.select(&request)?;
        debug!(candidates = candidates.len(), "starting stream");
        Ok(Arc::clone(&self.relay).spawn(request, candidates, cancel))
    }
}

impl std::fmt::Debug for Gateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Gateway")
            .field("providers", &self.catalog().len())
            .field("orchestrator", &self.orchestrator)
            .field("relay", &self.relay)
            .field("cached", &self.cache.len())
            .finish()
    }
}
