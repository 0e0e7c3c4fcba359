//! Configuration file discovery and loading.
//!
//! The discovery order is:
//! 1. An explicit path (e.g. the `--config` flag).
//! 2. `BOOMGATE_CONFIG` environment variable.
//! 3. `~/.boomgate/config.json`
//! 4. If none exists, an empty JSON object (all defaults).
//!
//! JSON keys are normalized from camelCase to snake_case before the value is
//! deserialized into [`GatewayConfig`].

use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::{debug, info, warn};

use crate::config::GatewayConfig;
use crate::error::{ConfigError, Result};

/// Environment variable that points at a config file.
pub const CONFIG_ENV_VAR: &str = "BOOMGATE_CONFIG";

/// Discover the config file path using the fallback chain.
///
/// Returns `None` when neither the env var is set nor the home-directory
/// file exists. A path taken from the env var is returned even if it does
/// not exist; [`load_config`] then falls back to defaults with a warning.
pub fn discover_config_path(home_dir: Option<PathBuf>) -> Option<PathBuf> {
    if let Ok(env_path) = std::env::var(CONFIG_ENV_VAR)
        && !env_path.is_empty()
    {
        return Some(PathBuf::from(env_path));
    }

    let candidate = home_dir?.join(".boomgate").join("config.json");
    candidate.exists().then_some(candidate)
}

/// Load, normalize, deserialize and validate the gateway configuration.
///
/// An explicit `override_path` must exist; a discovered path that does not
/// exist is treated as "no config".
pub fn load_config(override_path: Option<&Path>) -> Result<GatewayConfig> {
    let raw = match override_path {
        Some(path) => read_json(path)?,
        None => match discover_config_path(dirs::home_dir()) {
            Some(path) if path.exists() => read_json(&path)?,
            Some(path) => {
                warn!(path = %path.display(), "config path does not exist, using defaults");
                Value::Object(serde_json::Map::new())
            }
            None => {
                info!("no config file found, using defaults");
                Value::Object(serde_json::Map::new())
            }
        },
    };

    let config: GatewayConfig = serde_json::from_value(normalize_keys(raw))?;
    config.validate()?;
    Ok(config)
}

fn read_json(path: &Path) -> Result<Value> {
    debug!(path = %path.display(), "loading config file");
    let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(serde_json::from_str(&contents)?)
}

/// Sections whose keys are user data (header names), not field names.
const VERBATIM_SECTIONS: &[&str] = &["headers"];

/// Convert camelCase JSON keys to snake_case recursively.
///
/// The contents of [`VERBATIM_SECTIONS`] are left untouched.
pub fn normalize_keys(value: Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.into_iter()
                .map(|(key, val)| {
                    let key = camel_to_snake(&key);
                    if VERBATIM_SECTIONS.contains(&key.as_str()) {
                        (key, val)
                    } else {
                        (key, normalize_keys(val))
                    }
                })
                .collect(),
        ),
        Value::Array(arr) => Value::Array(arr.into_iter().map(normalize_keys).collect()),
        other => other,
    }
}

/// Convert a single camelCase string to snake_case.
///
/// A run of uppercase letters (an acronym) stays together; an underscore is
/// inserted before its last letter only when a lowercase letter follows.
pub fn camel_to_snake(name: &str) -> String {
    let chars: Vec<char> = name.chars().collect();
    let mut result = String::with_capacity(name.len() + 4);

    for (i, &ch) in chars.iter().enumerate() {
        if ch.is_uppercase() && i > 0 {
            let prev = chars[i - 1];
            let next = chars.get(i + 1).copied();
            if prev.is_lowercase()
                || (prev.is_uppercase() && next.is_some_and(|c| c.is_lowercase()))
            {
                result.push('_');
            }
        }
        result.push(ch.to_ascii_lowercase());
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Write;

    #[test]
    fn camel_to_snake_cases() {
        assert_eq!(camel_to_snake("maxRetries"), "max_retries");
        assert_eq!(camel_to_snake("attemptTimeoutSecs"), "attempt_timeout_secs");
        assert_eq!(camel_to_snake("already_snake"), "already_snake");
        assert_eq!(camel_to_snake("baseURL"), "base_url");
        assert_eq!(camel_to_snake("HTMLParser"), "html_parser");
    }

    #[test]
    fn normalize_keys_nested() {
        let input = json!({
            "retry": {"maxRetries": 2, "baseDelayMs": 5},
            "providers": [{"defaultModel": "qwen-max", "requiresAuth": true}]
        });
        let out = normalize_keys(input);
        assert_eq!(out["retry"]["max_retries"], 2);
        assert_eq!(out["retry"]["base_delay_ms"], 5);
        assert_eq!(out["providers"][0]["default_model"], "qwen-max");
        assert_eq!(out["providers"][0]["requires_auth"], true);
    }

    #[test]
    fn header_names_keep_their_spelling() {
        let input = json!({
            "backend": {
                "baseUrl": "http://gw.local/v1",
                "headers": {"XApiKey": "k", "HTTP-Referer": "boomgate"}
            }
        });
        let out = normalize_keys(input);
        assert_eq!(out["backend"]["base_url"], "http://gw.local/v1");
        assert_eq!(out["backend"]["headers"]["XApiKey"], "k");
        assert_eq!(out["backend"]["headers"]["HTTP-Referer"], "boomgate");
        assert!(out["backend"]["headers"].get("x_api_key").is_none());
    }

    #[test]
    fn load_explicit_path_with_camel_case() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"retry": {{"maxRetries": 1}}, "stream": {{"channelCapacity": 4}}}}"#
        )
        .unwrap();

        let cfg = load_config(Some(file.path())).unwrap();
        assert_eq!(cfg.retry.max_retries, 1);
        assert_eq!(cfg.stream.channel_capacity, 4);
    }

    #[test]
    fn load_explicit_missing_path_is_error() {
        let err = load_config(Some(Path::new("/nonexistent/boomgate.json"))).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn load_explicit_invalid_config_is_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"stream": {{"channelCapacity": 0}}}}"#).unwrap();
        let err = load_config(Some(file.path())).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { .. }));
    }

    #[test]
    fn env_var_pointing_nowhere_uses_defaults() {
        temp_env::with_var(
            CONFIG_ENV_VAR,
            Some("/tmp/.boomgate-test-nonexistent.json"),
            || {
                let cfg = load_config(None).unwrap();
                assert_eq!(cfg.retry.max_retries, 3);
            },
        );
    }

    #[test]
    fn env_var_is_discovered() {
        temp_env::with_var(CONFIG_ENV_VAR, Some("/srv/boomgate.json"), || {
            let path = discover_config_path(None).unwrap();
            assert_eq!(path, PathBuf::from("/srv/boomgate.json"));
        });
    }

    #[test]
    fn home_without_config_discovers_nothing() {
        let home = tempfile::tempdir().unwrap();
        temp_env::with_var_unset(CONFIG_ENV_VAR, || {
            assert!(discover_config_path(Some(home.path().to_path_buf())).is_none());
        });
    }

    #[test]
    fn home_config_is_discovered() {
        let home = tempfile::tempdir().unwrap();
        let dir = home.path().join(".boomgate");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("config.json"), "{}").unwrap();

        temp_env::with_var_unset(CONFIG_ENV_VAR, || {
            let path = discover_config_path(Some(home.path().to_path_buf())).unwrap();
            assert!(path.ends_with(".boomgate/config.json"));
        });
    }
}
