//! Provider catalog.
//!
//! A static, versioned registry of [`ProviderDescriptor`]s. It is built once
//! at startup, either from the built-in table or from the `providers`
//! section of the config file, and is read-only afterwards.

use std::collections::HashMap;

use boomgate_types::provider::{
    GROUP_FALLBACK, GROUP_PRIMARY, GROUP_SECONDARY, RELIABILITY_TIERS,
};
use boomgate_types::{GatewayConfig, ProviderDescriptor, TaskTag};

use crate::error::GatewayError;

/// Revision of the built-in provider table.
pub const CATALOG_VERSION: &str = "2025.06";

const TECHNICAL: &str = "technical";
const CREATIVE: &str = "creative";
const SEARCH: &str = "search";

/// The built-in provider table.
fn builtin_table() -> Vec<ProviderDescriptor> {
    use TaskTag::{Creative, Fast, Search, Technical};

    vec![
        ProviderDescriptor::new("Qwen_Qwen_2_5_Max", "qwen-max")
            .in_groups(&[GROUP_PRIMARY, TECHNICAL, SEARCH])
            .with_affinity(&[Technical, Search]),
        ProviderDescriptor::new("AItianhu", "qwen-max").in_groups(&[GROUP_PRIMARY]),
        ProviderDescriptor::new("DeepInfra", "mistral-7b-instruct")
            .in_groups(&[GROUP_PRIMARY])
            .with_affinity(&[Fast]),
        ProviderDescriptor::new("DeepInfra_Mistral", "mixtral-8x7b-instruct")
            .in_groups(&[GROUP_PRIMARY, TECHNICAL])
            .with_affinity(&[Technical]),
        ProviderDescriptor::new("Qwen_Qwen_3", "qwen-turbo")
            .in_groups(&[GROUP_PRIMARY])
            .with_affinity(&[Fast]),
        ProviderDescriptor::new("Phind", "phind-70b")
            .in_groups(&[GROUP_PRIMARY, TECHNICAL, SEARCH])
            .with_affinity(&[Technical, Search]),
        ProviderDescriptor::new("AItianhu_Turbo", "qwen-turbo")
            .in_groups(&[GROUP_SECONDARY])
            .with_affinity(&[Fast]),
        ProviderDescriptor::new("Qwen_Qwen_2_5", "qwen-plus").in_groups(&[GROUP_SECONDARY]),
        ProviderDescriptor::new("DeepInfra_Llama", "llama-2-70b-chat")
            .in_groups(&[GROUP_SECONDARY]),
        ProviderDescriptor::new("GeminiPro", "gemini-pro")
            .in_groups(&[GROUP_SECONDARY, CREATIVE])
            .with_affinity(&[Creative]),
        ProviderDescriptor::new("Gemini", "gemini-pro")
            .in_groups(&[GROUP_SECONDARY])
            .with_affinity(&[Creative]),
        ProviderDescriptor::new("You", "claude-3.5-sonnet")
            .in_groups(&[GROUP_SECONDARY, GROUP_FALLBACK, TECHNICAL, SEARCH])
            .with_affinity(&[Technical, Search]),
        ProviderDescriptor::new("DeepInfra_Qwen", "qwen-14b-chat").in_groups(&[GROUP_FALLBACK]),
        ProviderDescriptor::new("DeepInfra_CodeLlama", "codellama-34b-instruct")
            .in_groups(&[TECHNICAL])
            .with_affinity(&[Technical]),
        ProviderDescriptor::new("DEEPSEEK", "deepseek-chat")
            .in_groups(&[TECHNICAL])
            .with_affinity(&[Technical]),
        ProviderDescriptor::new("Liaobots", "claude-3-5-sonnet-20241022")
            .in_groups(&[CREATIVE])
            .with_affinity(&[Creative]),
        ProviderDescriptor::new("FreeGpt", "gemini-1.5-pro")
            .in_groups(&[CREATIVE])
            .with_affinity(&[Creative])
            .without_stream(),
        ProviderDescriptor::new("Claude", "claude-2.0")
            .in_groups(&[CREATIVE])
            .with_affinity(&[Creative])
            .requiring_auth(),
    ]
}

/// Read-only registry of providers and their groups.
#[derive(Debug, Clone)]
pub struct ProviderCatalog {
    providers: Vec<ProviderDescriptor>,
    index: HashMap<String, usize>,
}

impl ProviderCatalog {
    /// The built-in table.
    pub fn builtin() -> Self {
        let providers = builtin_table();
        let index = providers
            .iter()
            .enumerate()
            .map(|(i, p)| (p.name.clone(), i))
            .collect();
        Self { providers, index }
    }

    /// Build a catalog from an explicit list, rejecting blank or duplicate names.
    pub fn from_descriptors(providers: Vec<ProviderDescriptor>) -> Result<Self, GatewayError> {
        if providers.is_empty() {
            return Err(GatewayError::Catalog("no providers".into()));
        }
        let mut index = HashMap::with_capacity(providers.len());
        for (i, p) in providers.iter().enumerate() {
            if p.name.trim().is_empty() {
                return Err(GatewayError::Catalog(format!("provider #{i} has a blank name")));
            }
            if p.default_model.trim().is_empty() {
                return Err(GatewayError::Catalog(format!(
                    "provider {} has a blank default model",
                    p.name
                )));
            }
            if index.insert(p.name.clone(), i).is_some() {
                return Err(GatewayError::Catalog(format!("duplicate provider {}", p.name)));
            }
        }
        Ok(Self { providers, index })
    }

    /// Use the config's `providers` list when present, the built-in table otherwise.
    pub fn from_config(config: &GatewayConfig) -> Result<Self, GatewayError> {
        match config.providers {
            Some(ref list) => Self::from_descriptors(list.clone()),
            None => Ok(Self::builtin()),
        }
    }

    /// Find a provider by exact name.
    pub fn lookup(&self, name: &str) -> Result<&ProviderDescriptor, GatewayError> {
        self.index
            .get(name)
            .map(|&i| &self.providers[i])
            .ok_or_else(|| GatewayError::UnknownProvider(name.to_owned()))
    }

    /// Members of `group`, in table order.
    pub fn members_of(&self, group: &str) -> Vec<&ProviderDescriptor> {
        self.providers
            .iter()
            .filter(|p| p.is_member_of(group))
            .collect()
    }

    /// Group names to fall through for `tag`: the task group, then the
    /// reliability tiers. `None` yields only the reliability tiers.
    pub fn groups_for(&self, tag: Option<TaskTag>) -> Vec<&'static str> {
        let mut groups = Vec::with_capacity(RELIABILITY_TIERS.len() + 1);
        if let Some(tag) = tag {
            groups.push(tag.as_str());
        }
        groups.extend_from_slice(RELIABILITY_TIERS);
        groups
    }

    /// Every provider, in table order.
    pub fn providers(&self) -> &[ProviderDescriptor] {
        &self.providers
    }

    /// Number of providers.
    pub fn len(&self) -> usize {
        self.providers.len()
    }

    /// Whether the catalog is empty.
    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}

impl Default for ProviderCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}
