//! Provider descriptors, task tags and ranked group names.
//!
//! A [`ProviderDescriptor`] is the static, explicit record of what a backend
//! provider is and what it can do. Capability checks (auth, streaming) are
//! plain field reads; nothing is discovered at runtime.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Highest-reliability tier, tried first for unclassified messages.
pub const GROUP_PRIMARY: &str = "primary";
/// Second reliability tier.
pub const GROUP_SECONDARY: &str = "secondary";
/// Last reliability tier before the local fallback.
pub const GROUP_FALLBACK: &str = "fallback";

/// The reliability-ranked groups, in try order.
pub const RELIABILITY_TIERS: &[&str] = &[GROUP_PRIMARY, GROUP_SECONDARY, GROUP_FALLBACK];

/// A task category a message can be classified into, or a provider can
/// have an affinity for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskTag {
    /// Programming, infrastructure, algorithms.
    Technical,
    /// Stories, poems, slogans.
    Creative,
    /// Fact lookup and current events.
    Search,
    /// Low-latency providers. Affinity only; never produced by classification.
    Fast,
}

impl TaskTag {
    /// Lowercase tag name as used in config files and group names.
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskTag::Technical => "technical",
            TaskTag::Creative => "creative",
            TaskTag::Search => "search",
            TaskTag::Fast => "fast",
        }
    }
}

impl fmt::Display for TaskTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Static description of one backend provider.
///
/// Loaded once at startup into the provider catalog and never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderDescriptor {
    /// Unique provider identifier passed through to the backend (e.g. `"DeepInfra"`).
    pub name: String,

    /// Model requested from this provider when the caller names none.
    pub default_model: String,

    /// Ranked groups this provider belongs to (e.g. `"primary"`, `"technical"`).
    #[serde(default)]
    pub groups: BTreeSet<String>,

    /// Task categories this provider is good at.
    #[serde(default)]
    pub task_affinity: BTreeSet<TaskTag>,

    /// Provider needs credentials the gateway does not hold.
    #[serde(default)]
    pub requires_auth: bool,

    /// Provider can produce incremental output.
    #[serde(default = "default_supports_stream")]
    pub supports_stream: bool,
}

fn default_supports_stream() -> bool {
    true
}

impl ProviderDescriptor {
    /// Create a descriptor with no group membership or affinities.
    pub fn new(name: impl Into<String>, default_model: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            default_model: default_model.into(),
            groups: BTreeSet::new(),
            task_affinity: BTreeSet::new(),
            requires_auth: false,
            supports_stream: true,
        }
    }

    /// Add this provider to the given groups.
    pub fn in_groups(mut self, groups: &[&str]) -> Self {
        self.groups.extend(groups.iter().map(|g| (*g).to_owned()));
        self
    }

    /// Record task affinities.
    pub fn with_affinity(mut self, tags: &[TaskTag]) -> Self {
        self.task_affinity.extend(tags.iter().copied());
        self
    }

    /// Mark the provider as requiring credentials.
    pub fn requiring_auth(mut self) -> Self {
        self.requires_auth = true;
        self
    }

    /// Mark the provider as unable to stream.
    pub fn without_stream(mut self) -> Self {
        self.supports_stream = false;
        self
    }

    /// Whether the provider belongs to `group`.
    pub fn is_member_of(&self, group: &str) -> bool {
        self.groups.contains(group)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn task_tag_names_match_serde() {
        for tag in [
            TaskTag::Technical,
            TaskTag::Creative,
            TaskTag::Search,
            TaskTag::Fast,
        ] {
            let parsed: TaskTag = serde_json::from_str(&format!("\"{}\"", tag.as_str())).unwrap();
            assert_eq!(parsed, tag);
        }
        assert!(serde_json::from_str::<TaskTag>(r#""poetry""#).is_err());
    }

    #[test]
    fn task_tag_serializes_lowercase() {
        let json = serde_json::to_string(&TaskTag::Technical).unwrap();
        assert_eq!(json, r#""technical""#);
    }

    #[test]
    fn builder_helpers() {
        let d = ProviderDescriptor::new("You", "gpt-4o-mini")
            .in_groups(&[GROUP_PRIMARY, "technical"])
            .with_affinity(&[TaskTag::Technical, TaskTag::Search])
            .requiring_auth()
            .without_stream();
        assert!(d.is_member_of("primary"));
        assert!(d.is_member_of("technical"));
        assert!(!d.is_member_of("fallback"));
        assert!(d.task_affinity.contains(&TaskTag::Search));
        assert!(d.requires_auth);
        assert!(!d.supports_stream);
    }

    #[test]
    fn descriptor_deserialize_minimal() {
        let json = r#"{"name": "FreeGpt", "default_model": "gemini-1.5-pro"}"#;
        let d: ProviderDescriptor = serde_json::from_str(json).unwrap();
        assert_eq!(d.name, "FreeGpt");
        assert!(d.groups.is_empty());
        assert!(!d.requires_auth);
        assert!(d.supports_stream);
    }

    #[test]
    fn reliability_tiers_order() {
        assert_eq!(RELIABILITY_TIERS, &["primary", "secondary", "fallback"]);
    }
}
