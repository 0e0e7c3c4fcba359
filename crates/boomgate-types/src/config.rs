//! Configuration schema types.
//!
//! Every field has a default, so an empty JSON object is a valid config.
//! Keys may be written in `camelCase`; the [`loader`](crate::loader)
//! normalizes them to `snake_case` before deserializing.

use std::collections::HashMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, Result};
use crate::provider::ProviderDescriptor;

// ── Root config ──────────────────────────────────────────────────────────

/// Root configuration for the gateway.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct GatewayConfig {
    /// Where and how to reach the backend endpoint.
    #[serde(default)]
    pub backend: BackendConfig,

    /// Retry rounds, backoff and per-attempt timeout.
    #[serde(default)]
    pub retry: RetryConfig,

    /// Streaming relay tuning.
    #[serde(default)]
    pub stream: StreamConfig,

    /// Response cache settings.
    #[serde(default)]
    pub cache: CacheConfig,

    /// Replacement for the built-in provider table.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub providers: Option<Vec<ProviderDescriptor>>,
}

impl GatewayConfig {
    /// Check semantic constraints that serde cannot express.
    pub fn validate(&self) -> Result<()> {
        if self.backend.base_url.trim().is_empty() {
            return Err(ConfigError::Invalid {
                reason: "backend.base_url must not be empty".into(),
            });
        }
        if self.retry.attempt_timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                reason: "retry.attempt_timeout_secs must be > 0".into(),
            });
        }
        if self.stream.channel_capacity == 0 {
            return Err(ConfigError::Invalid {
                reason: "stream.channel_capacity must be > 0".into(),
            });
        }
        if self.stream.fallback_chunk_groups == 0 {
            return Err(ConfigError::Invalid {
                reason: "stream.fallback_chunk_groups must be > 0".into(),
            });
        }
        if let Some(ref providers) = self.providers
            && providers.is_empty()
        {
            return Err(ConfigError::Invalid {
                reason: "providers must list at least one provider when set".into(),
            });
        }
        Ok(())
    }
}

// ── Backend ──────────────────────────────────────────────────────────────

/// Connection settings for the OpenAI-compatible backend endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Base URL; `/chat/completions` is appended.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Environment variable holding an optional bearer token.
    #[serde(default)]
    pub api_key_env: Option<String>,

    /// Extra headers sent with every request.
    #[serde(default)]
    pub headers: HashMap<String, String>,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_key_env: None,
            headers: HashMap::new(),
        }
    }
}

fn default_base_url() -> String {
    "http://localhost:1337/v1".into()
}

// ── Retry ────────────────────────────────────────────────────────────────

/// Retry behavior of the fallback orchestrator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Retry rounds over the candidate list when the request names none.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Base backoff between rounds; round `n` waits `base * (n + 1)`.
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,

    /// Upper bound for a single backend attempt.
    #[serde(default = "default_attempt_timeout_secs")]
    pub attempt_timeout_secs: u64,
}

impl RetryConfig {
    /// Base backoff as a [`Duration`].
    pub fn base_delay(&self) -> Duration {
        Duration::from_millis(self.base_delay_ms)
    }

    /// Per-attempt timeout as a [`Duration`].
    pub fn attempt_timeout(&self) -> Duration {
        Duration::from_secs(self.attempt_timeout_secs)
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            base_delay_ms: default_base_delay_ms(),
            attempt_timeout_secs: default_attempt_timeout_secs(),
        }
    }
}

fn default_max_retries() -> u32 {
    3
}
fn default_base_delay_ms() -> u64 {
    1000
}
fn default_attempt_timeout_secs() -> u64 {
    25
}

// ── Stream ───────────────────────────────────────────────────────────────

/// Streaming relay tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamConfig {
    /// Bound of the outbound event channel (backpressure window).
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,

    /// Pause between simulated chunks of the local fallback text.
    #[serde(default = "default_fallback_chunk_delay_ms")]
    pub fallback_chunk_delay_ms: u64,

    /// Number of word groups the local fallback text is split into.
    #[serde(default = "default_fallback_chunk_groups")]
    pub fallback_chunk_groups: usize,
}

impl StreamConfig {
    /// Simulated chunk pacing as a [`Duration`].
    pub fn fallback_chunk_delay(&self) -> Duration {
        Duration::from_millis(self.fallback_chunk_delay_ms)
    }
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            channel_capacity: default_channel_capacity(),
            fallback_chunk_delay_ms: default_fallback_chunk_delay_ms(),
            fallback_chunk_groups: default_fallback_chunk_groups(),
        }
    }
}

fn default_channel_capacity() -> usize {
    32
}
fn default_fallback_chunk_delay_ms() -> u64 {
    100
}
fn default_fallback_chunk_groups() -> usize {
    5
}

// ── Cache ────────────────────────────────────────────────────────────────

/// Response cache settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Whether successful non-streaming responses are memoized.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Optional entry bound; oldest entries are evicted first.
    #[serde(default)]
    pub max_entries: Option<usize>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_entries: None,
        }
    }
}

fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_object_gives_defaults() {
        let cfg: GatewayConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(cfg.backend.base_url, "http://localhost:1337/v1");
        assert!(cfg.backend.api_key_env.is_none());
        assert_eq!(cfg.retry.max_retries, 3);
        assert_eq!(cfg.retry.base_delay(), Duration::from_secs(1));
        assert_eq!(cfg.retry.attempt_timeout(), Duration::from_secs(25));
        assert_eq!(cfg.stream.channel_capacity, 32);
        assert_eq!(cfg.stream.fallback_chunk_delay(), Duration::from_millis(100));
        assert_eq!(cfg.stream.fallback_chunk_groups, 5);
        assert!(cfg.cache.enabled);
        assert!(cfg.cache.max_entries.is_none());
        assert!(cfg.providers.is_none());
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let json = r#"{"retry": {"max_retries": 1}, "cache": {"enabled": false}}"#;
        let cfg: GatewayConfig = serde_json::from_str(json).unwrap();
        assert_eq!(cfg.retry.max_retries, 1);
        assert_eq!(cfg.retry.base_delay_ms, 1000);
        assert!(!cfg.cache.enabled);
    }

    #[test]
    fn validate_rejects_zero_capacity() {
        let mut cfg = GatewayConfig::default();
        cfg.stream.channel_capacity = 0;
        let err = cfg.validate().unwrap_err();
        assert!(err.to_string().contains("channel_capacity"));
    }

    #[test]
    fn validate_rejects_zero_timeout() {
        let mut cfg = GatewayConfig::default();
        cfg.retry.attempt_timeout_secs = 0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn validate_rejects_blank_base_url() {
        let mut cfg = GatewayConfig::default();
        cfg.backend.base_url = "  ".into();
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn validate_rejects_empty_provider_list() {
        let cfg = GatewayConfig {
            providers: Some(vec![]),
            ..GatewayConfig::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn providers_override_parses() {
        let json = r#"{
            "providers": [
                {"name": "DeepInfra", "default_model": "mistral-7b-instruct", "groups": ["primary"]}
            ]
        }"#;
        let cfg: GatewayConfig = serde_json::from_str(json).unwrap();
        let providers = cfg.providers.unwrap();
        assert_eq!(providers.len(), 1);
        assert!(providers[0].is_member_of("primary"));
    }

    #[test]
    fn serialize_skips_absent_providers() {
        let json = serde_json::to_string(&GatewayConfig::default()).unwrap();
        assert!(!json.contains("providers"));
        assert!(json.contains("base_url"));
    }
}
