use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};
use warbler_guard::GuardConfig;
use warbler_social::DEFAULT_TIMELINE_LIMIT;

/// Environment variables consulted for the store location, lowest
/// precedence first.
pub const DATABASE_URL_VARS: [&str; 2] = ["DATABASE_URL", "WARBLER_DATABASE_URL"];

/// Runtime configuration for the `warbler` binary.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WarblerConfig {
    /// Store location: `memory:`, `file:<path>`, or a bare path.
    pub database_url: String,
    /// Maximum number of posts on a home timeline.
    pub timeline_limit: usize,
    /// Whether form submissions require a CSRF token. Only read by a web
    /// front end.
    pub csrf_enabled: bool,
}

impl Default for WarblerConfig {
    fn default() -> Self {
        Self {
            database_url: "memory:".into(),
            timeline_limit: DEFAULT_TIMELINE_LIMIT,
            csrf_enabled: true,
        }
    }
}

impl WarblerConfig {
    pub fn from_toml(text: &str) -> anyhow::Result<Self> {
        toml::from_str(text).context("invalid configuration")
    }

    /// Load configuration: defaults, then the TOML file at `path` if given,
    /// then environment overrides.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let mut config = match path {
            Some(path) => {
                let text = std::fs::read_to_string(path)
                    .with_context(|| format!("reading {}", path.display()))?;
                Self::from_toml(&text).with_context(|| format!("in {}", path.display()))?
            }
            None => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Override fields from environment variables looked up with `lookup`.
    /// Empty values are ignored.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        for key in DATABASE_URL_VARS {
            if let Some(value) = lookup(key).filter(|v| !v.trim().is_empty()) {
                self.database_url = value;
            }
        }
    }

    pub fn guard_config(&self) -> GuardConfig {
        GuardConfig {
            timeline_limit: self.timeline_limit,
        }
    }
}
