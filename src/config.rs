//! # Server Configuration
//!
//! Dispatcher settings, read from an optional TOML file and overridden by
//! environment variables.
//!
//! ```toml
//! path_prefix = "/api"
//! require_https = true
//! add_request_time = false
//! ```
//!
//! | Variable | Field |
//! |----------|-------|
//! | `ATTROUTER_PATH_PREFIX` | `path_prefix` |
//! | `ATTROUTER_REQUIRE_HTTPS` | `require_https` (`true`/`false`/`1`/`0`) |
//! | `ATTROUTER_ADD_REQUEST_TIME` | `add_request_time` |

use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;
use tracing::warn;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    /// Mount point stripped from request paths before matching, e.g. `/api`.
    pub path_prefix: String,
    /// Reject plain-HTTP requests with `403 httpsRequired`.
    pub require_https: bool,
    /// Add the elapsed time in seconds as a `time` key to object responses.
    pub add_request_time: bool,
}

fn parse_flag(name: &str, raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" | "" => Some(false),
        other => {
            warn!(variable = %name, value = %other, "Ignoring invalid boolean environment value");
            None
        }
    }
}

impl ServerConfig {
    pub fn from_toml_str(contents: &str) -> anyhow::Result<Self> {
        toml::from_str(contents).context("Failed to parse server config")
    }

    /// Read a TOML config file.
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read server config: {}", path.display()))?;
        toml::from_str(&contents)
            .with_context(|| format!("Failed to parse server config: {}", path.display()))
    }

    /// Defaults overridden by `ATTROUTER_*` variables.
    pub fn from_env() -> Self {
        Self::default().with_env_overrides()
    }

    /// Apply `ATTROUTER_*` variables on top of this config.
    #[must_use]
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides(|name| env::var(name).ok())
    }

    fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(prefix) = lookup("ATTROUTER_PATH_PREFIX") {
            self.path_prefix = prefix;
        }
        for (name, field) in [
            ("ATTROUTER_REQUIRE_HTTPS", &mut self.require_https),
            ("ATTROUTER_ADD_REQUEST_TIME", &mut self.add_request_time),
        ] {
            if let Some(flag) = lookup(name).and_then(|raw| parse_flag(name, &raw)) {
                *field = flag;
            }
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let config = ServerConfig::default();
        assert_eq!(config.path_prefix, "");
        assert!(!config.require_https);
        assert!(!config.add_request_time);
    }

    #[test]
    fn test_from_toml_partial() {
        let config = ServerConfig::from_toml_str("path_prefix = \"/api\"\n").unwrap();
        assert_eq!(config.path_prefix, "/api");
        assert!(!config.require_https);
        assert!(ServerConfig::from_toml_str("unknown = 1").is_err());
    }

    #[test]
    fn test_overrides() {
        let vars: HashMap<&str, &str> = [
            ("ATTROUTER_PATH_PREFIX", "/v1"),
            ("ATTROUTER_REQUIRE_HTTPS", "1"),
            ("ATTROUTER_ADD_REQUEST_TIME", "maybe"),
        ]
        .into_iter()
        .collect();
        let base = ServerConfig {
            add_request_time: true,
            ..ServerConfig::default()
        };
        let config = base.with_overrides(|name| vars.get(name).map(|v| v.to_string()));
        assert_eq!(config.path_prefix, "/v1");
        assert!(config.require_https);
        // invalid values leave the field untouched
        assert!(config.add_request_time);
    }

    #[test]
    fn test_load_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("server.toml");
        std::fs::write(&path, "require_https = true\nadd_request_time = true\n").unwrap();
        let config = ServerConfig::load(&path).unwrap();
        assert!(config.require_https && config.add_request_time);
        assert!(ServerConfig::load(dir.path().join("missing.toml")).is_err());
    }
}
