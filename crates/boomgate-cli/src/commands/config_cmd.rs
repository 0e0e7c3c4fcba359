//! `boomgate config` -- display resolved configuration.
//!
//! # Example
//!
//! ```text
//! boomgate config show
//! boomgate config show -c ./boomgate.json
//! ```

use boomgate_types::GatewayConfig;

/// Display the resolved configuration as formatted JSON.
pub fn config_show(config: &GatewayConfig) {
    match serde_json::to_string_pretty(config) {
        Ok(json) => println!("{json}"),
        Err(e) => eprintln!("error: failed to serialize config: {e}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_serializes() {
        let value = serde_json::to_value(GatewayConfig::default()).unwrap();
        assert_eq!(value["retry"]["max_retries"], 3);
        assert_eq!(value["backend"]["base_url"], "http://localhost:1337/v1");
    }

    #[test]
    fn config_show_does_not_panic() {
        config_show(&GatewayConfig::default());
    }
}
