//! `boomgate providers` -- list the provider catalog.
//!
//! # Example
//!
//! ```text
//! boomgate providers
//! boomgate providers --group creative
//! ```

use clap::Args;
use comfy_table::{Table, presets::UTF8_FULL};

use boomgate_llm::{CATALOG_VERSION, ProviderCatalog};
use boomgate_types::ProviderDescriptor;

/// Arguments for the `providers` subcommand.
#[derive(Args)]
pub struct ProvidersArgs {
    /// Only show members of this group (e.g. "primary", "technical").
    #[arg(short, long)]
    pub group: Option<String>,

    /// Config file path (overrides auto-discovery).
    #[arg(short, long)]
    pub config: Option<String>,
}

/// Run the `providers` subcommand.
pub fn run(args: ProvidersArgs) -> anyhow::Result<()> {
    let config = super::load_config(args.config.as_deref())?;
    let catalog = ProviderCatalog::from_config(&config)?;
    let rows: Vec<&ProviderDescriptor> = match args.group {
        Some(ref group) => catalog.members_of(group),
        None => catalog.providers().iter().collect(),
    };

    if rows.is_empty() {
        println!("No providers match.");
        return Ok(());
    }

    println!("{}", provider_table(&rows));
    if config.providers.is_none() {
        println!("built-in catalog {CATALOG_VERSION}");
    }
    Ok(())
}

fn provider_table(rows: &[&ProviderDescriptor]) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(["PROVIDER", "MODEL", "GROUPS", "AFFINITY", "STREAM", "AUTH"]);

    for p in rows {
        let groups: Vec<&str> = p.groups.iter().map(String::as_str).collect();
        let affinity: Vec<&str> = p.task_affinity.iter().map(|t| t.as_str()).collect();
        table.add_row([
            p.name.clone(),
            p.default_model.clone(),
            groups.join(", "),
            affinity.join(", "),
            yes_no(p.supports_stream).into(),
            yes_no(p.requires_auth).into(),
        ]);
    }
    table
}

fn yes_no(flag: bool) -> &'static str {
    if flag { "yes" } else { "no" }
}
