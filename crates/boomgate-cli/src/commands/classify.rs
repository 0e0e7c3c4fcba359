//! `boomgate classify` -- show how a message would be routed.
//!
//! Prints the detected task tag, the matched keywords, the groups the
//! selector falls through, in order, and each group's members in catalog
//! order (the selector shuffles them per request).
//!
//! # Example
//!
//! ```text
//! boomgate classify "Fix this Python function"
//! boomgate classify "Write a poem" -c ./boomgate.json
//! ```

use std::sync::Arc;

use clap::Args;

use boomgate_llm::{ProviderCatalog, ProviderSelector, TaskProfile};

/// Arguments for the `classify` subcommand.
#[derive(Args)]
pub struct ClassifyArgs {
    /// Message to classify.
    pub message: String,

    /// Config file path (overrides auto-discovery).
    #[arg(short, long)]
    pub config: Option<String>,
}

/// Run the `classify` subcommand.
pub fn run(args: ClassifyArgs) -> anyhow::Result<()> {
    let config = super::load_config(args.config.as_deref())?;
    let selector = ProviderSelector::new(Arc::new(ProviderCatalog::from_config(&config)?));
    let (profile, groups) = selector.group_order(&args.message);
    let report = report(selector.catalog(), &profile, &groups);
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

fn report(catalog: &ProviderCatalog, profile: &TaskProfile, groups: &[&str]) -> serde_json::Value {
    let members: serde_json::Map<String, serde_json::Value> = groups
        .iter()
        .map(|group| {
            let names: Vec<&str> = catalog
                .members_of(group)
                .into_iter()
                .filter(|p| !p.requires_auth)
                .map(|p| p.name.as_str())
                .collect();
            ((*group).to_owned(), serde_json::json!(names))
        })
        .collect();

    serde_json::json!({
        "task": profile.tag.map(|t| t.as_str()),
        "keywords": profile.keywords,
        "groups": groups,
        "members": members,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use boomgate_types::ProviderDescriptor;

    fn classify(catalog: ProviderCatalog, message: &str) -> serde_json::Value {
        let selector = ProviderSelector::new(Arc::new(catalog));
        let (profile, groups) = selector.group_order(message);
        report(selector.catalog(), &profile, &groups)
    }

    #[test]
    fn technical_message_report() {
        let r = classify(ProviderCatalog::builtin(), "Explain the Dijkstra algorithm");
        assert_eq!(r["task"], "technical");
        assert_eq!(
            r["groups"],
            serde_json::json!(["technical", "primary", "secondary", "fallback"])
        );
        assert!(
            r["keywords"]
                .as_array()
                .unwrap()
                .contains(&serde_json::json!("algorithm"))
        );
        assert!(
            r["members"]["technical"]
                .as_array()
                .unwrap()
                .contains(&serde_json::json!("Phind"))
        );
    }

    #[test]
    fn unclassified_message_report() {
        let r = classify(ProviderCatalog::builtin(), "hello there");
        assert!(r["task"].is_null());
        assert_eq!(r["groups"], serde_json::json!(["primary", "secondary", "fallback"]));
    }

    #[test]
    fn members_come_from_the_given_catalog() {
        let catalog = ProviderCatalog::from_descriptors(vec![
            ProviderDescriptor::new("Muse", "muse-1").in_groups(&["creative"]),
            ProviderDescriptor::new("Gate", "gate-1")
                .in_groups(&["creative"])
                .requiring_auth(),
            ProviderDescriptor::new("Base", "base-1").in_groups(&["primary"]),
        ])
        .unwrap();
        let r = classify(catalog, "Write a poem about autumn");
        assert_eq!(r["members"]["creative"], serde_json::json!(["Muse"]));
        assert_eq!(r["members"]["primary"], serde_json::json!(["Base"]));
        assert_eq!(r["members"]["secondary"], serde_json::json!([]));
    }
}
