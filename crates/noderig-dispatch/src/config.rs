//! Dispatcher configuration.
//!
//! Settings are read from a JSON file named by `NODERIG_CONFIG`, then
//! individual values are overridden from the environment. Every field has a
//! default, so an empty object (or no file at all) is a valid config.

use std::path::Path;

use serde::{Deserialize, Serialize};

use noderig_rewrite::SeedOptions;

use crate::error::DispatchError;

/// Names the JSON configuration file.
pub const CONFIG_ENV: &str = "NODERIG_CONFIG";
/// Overrides [`DispatchConfig::defer_ticks`].
pub const DEFER_TICKS_ENV: &str = "NODERIG_DEFER_TICKS";

/// Enable flag for one handler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HandlerSetting {
    pub name: String,
    #[serde(default)]
    pub label: String,
    #[serde(default = "enabled_by_default")]
    pub enabled: bool,
}

fn enabled_by_default() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatchConfig {
    /// Per-handler settings. Handlers without an entry are enabled.
    pub handlers: Vec<HandlerSetting>,
    /// Host cycles between a notification and the rewrite it triggers.
    pub defer_ticks: u64,
    /// Upper bound on driver cycles before giving up on a fixpoint.
    pub max_cycles: usize,
    pub seed: SeedOptions,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        DispatchConfig {
            handlers: Vec::new(),
            defer_ticks: 1,
            max_cycles: 64,
            seed: SeedOptions::default(),
        }
    }
}

impl DispatchConfig {
    /// Reads a config file.
    pub fn load(path: &Path) -> Result<Self, DispatchError> {
        let text = std::fs::read_to_string(path).map_err(|source| DispatchError::ConfigIo {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| DispatchError::ConfigParse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Builds the config from the process environment.
    pub fn from_env() -> Result<Self, DispatchError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, DispatchError> {
        let mut config = match lookup(CONFIG_ENV) {
            Some(path) => Self::load(Path::new(&path))?,
            None => Self::default(),
        };
        if let Some(value) = lookup(DEFER_TICKS_ENV) {
            config.defer_ticks = value
                .trim()
                .parse()
                .map_err(|_| DispatchError::InvalidSetting {
                    key: DEFER_TICKS_ENV.to_string(),
                    value,
                })?;
        }
        Ok(config)
    }

    /// The effective deferral. A rewrite never runs in the cycle that
    /// triggered it.
    pub fn defer_ticks(&self) -> u64 {
        self.defer_ticks.max(1)
    }

    /// Adds an enabled entry for `name` unless one exists. Returns `true`
    /// if an entry was added.
    pub fn ensure_handler(&mut self, name: &str) -> bool {
        if self.handlers.iter().any(|s| s.name == name) {
            return false;
        }
        self.handlers.push(HandlerSetting {
            name: name.to_string(),
            label: name.to_string(),
            enabled: true,
        });
        true
    }

    pub fn is_enabled(&self, name: &str) -> bool {
        self.handlers
            .iter()
            .find(|s| s.name == name)
            .map_or(true, |s| s.enabled)
    }

    pub fn set_enabled(&mut self, name: &str, enabled: bool) {
        self.ensure_handler(name);
        if let Some(setting) = self.handlers.iter_mut().find(|s| s.name == name) {
            setting.enabled = enabled;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn empty_object_is_default() {
        let config: DispatchConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, DispatchConfig::default());
        assert_eq!(config.max_cycles, 64);
    }

    #[test]
    fn defer_ticks_never_below_one() {
        let config = DispatchConfig {
            defer_ticks: 0,
            ..Default::default()
        };
        assert_eq!(config.defer_ticks(), 1);
    }

    #[test]
    fn env_overrides_defer_ticks() {
        let config = DispatchConfig::from_lookup(lookup(&[(DEFER_TICKS_ENV, " 4 ")])).unwrap();
        assert_eq!(config.defer_ticks(), 4);

        let err = DispatchConfig::from_lookup(lookup(&[(DEFER_TICKS_ENV, "soon")])).unwrap_err();
        assert!(matches!(err, DispatchError::InvalidSetting { .. }));
    }

    #[test]
    fn missing_config_file_is_io_error() {
        let err = DispatchConfig::from_lookup(lookup(&[(CONFIG_ENV, "/nonexistent/noderig.json")]))
            .unwrap_err();
        assert!(matches!(err, DispatchError::ConfigIo { .. }));
    }

    #[test]
    fn handler_settings() {
        let mut config: DispatchConfig = serde_json::from_str(
            r#"{"handlers": [{"name": "Seed Randomizer", "enabled": false}]}"#,
        )
        .unwrap();
        assert!(!config.is_enabled("Seed Randomizer"));
        assert!(config.is_enabled("Single Socket Handler"));

        assert!(!config.ensure_handler("Seed Randomizer"));
        assert!(config.ensure_handler("Single Socket Handler"));
        assert_eq!(config.handlers.len(), 2);

        config.set_enabled("Seed Randomizer", true);
        assert!(config.is_enabled("Seed Randomizer"));
    }
}
