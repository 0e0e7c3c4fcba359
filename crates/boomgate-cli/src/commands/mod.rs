//! CLI command implementations for `boomgate`.
//!
//! - [`chat`] -- One-shot or streaming chat through the gateway.
//! - [`providers`] -- Catalog listing.
//! - [`classify`] -- Task classification and group order.
//! - [`config_cmd`] -- Resolved configuration.

pub mod chat;
pub mod classify;
pub mod config_cmd;
pub mod providers;

use std::path::Path;

use boomgate_types::GatewayConfig;

/// Load configuration from the given path override or via auto-discovery.
///
/// Discovery falls back to `BOOMGATE_CONFIG`, then
/// `~/.boomgate/config.json`, then defaults.
pub fn load_config(config_override: Option<&str>) -> anyhow::Result<GatewayConfig> {
    if let Some(path) = config_override
        && !Path::new(path).exists()
    {
        anyhow::bail!("config file not found: {path}");
    }
    boomgate_types::loader::load_config(config_override.map(Path::new))
        .map_err(|e| anyhow::anyhow!("failed to load config: {e}"))
}
