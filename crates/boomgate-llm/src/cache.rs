//! In-process response cache.
//!
//! Memoizes validated, non-streaming responses keyed by
//! `(model-or-"auto", exact message)`. Thread-safe via `RwLock<HashMap>`;
//! concurrent writers to the same key race and the last one wins.
//!
//! Entries live until the process exits. When `max_entries` is set, the
//! oldest inserted key is evicted first.

use std::collections::{HashMap, VecDeque};
use std::sync::{PoisonError, RwLock};

use boomgate_types::config::CacheConfig;
use tracing::trace;

/// Cache key: model label (or `"auto"`) and the exact message text.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    model: String,
    message: String,
}

impl CacheKey {
    /// Build a key.
    pub fn new(model_or_auto: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            model: model_or_auto.into(),
            message: message.into(),
        }
    }
}

struct Inner {
    entries: HashMap<CacheKey, String>,
    /// Insertion order, for bounded eviction.
    order: VecDeque<CacheKey>,
}

/// Process-wide response cache.
pub struct ResponseCache {
    inner: RwLock<Inner>,
    enabled: bool,
    max_entries: Option<usize>,
}

impl ResponseCache {
    /// Create a cache from configuration.
    pub fn new(config: &CacheConfig) -> Self {
        Self {
            inner: RwLock::new(Inner {
                entries: HashMap::new(),
                order: VecDeque::new(),
            }),
            enabled: config.enabled,
            max_entries: config.max_entries.filter(|n| *n > 0),
        }
    }

    /// An enabled, unbounded cache.
    pub fn unbounded() -> Self {
        Self::new(&CacheConfig::default())
    }

    /// Look up a stored response.
    pub fn get(&self, model_or_auto: &str, message: &str) -> Option<String> {
        if !self.enabled {
            return None;
        }
        let key = CacheKey::new(model_or_auto, message);
        let inner = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        inner.entries.get(&key).cloned()
    }

    /// Store a response, overwriting any previous value for the key.
    pub fn put(&self, model_or_auto: &str, message: &str, text: impl Into<String>) {
        if !self.enabled {
            return;
        }
        let key = CacheKey::new(model_or_auto, message);
        let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);

        if inner.entries.insert(key.clone(), text.into()).is_none() {
            inner.order.push_back(key);
        }

        if let Some(max) = self.max_entries {
            while inner.entries.len() > max {
                let Some(oldest) = inner.order.pop_front() else {
                    break;
                };
                inner.entries.remove(&oldest);
                trace!(model = %oldest.model, "evicted cache entry");
            }
        }
    }

    /// Number of stored entries.
    pub fn len(&self) -> usize {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .entries
            .len()
    }

    /// Whether the cache holds no entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for ResponseCache {
    fn default() -> Self {
        Self::unbounded()
    }
}
