//! Configuration loading
//!
//! Defaults live in the struct; a repository-level `fanout.toml` (or a user
//! config under `~/.config/fanout/`) can override them, and `FANOUT_*`
//! environment variables always win. Command-line flags are applied on top of
//! the extracted struct by the CLI layer.

use anyhow::{Context, Result};
use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

/// Persistent defaults for a fanout run
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FanoutConfig {
    /// Maximum concurrent jobs; 0 means one per available CPU
    pub jobs: usize,

    /// Emit output blocks in job-index order instead of completion order
    pub keep_order: bool,
}

impl Default for FanoutConfig {
    fn default() -> Self {
        Self {
            jobs: 0,
            keep_order: false,
        }
    }
}

impl FanoutConfig {
    /// Load with the standard priority: built-in defaults, then user config,
    /// then `fanout.toml` in the working directory, then `FANOUT_*` env vars.
    pub fn load(custom_config: Option<&str>) -> Result<Self> {
        let mut figment = Figment::new();

        if let Some(custom_path) = custom_config {
            figment = figment.merge(Toml::file(custom_path));
        } else {
            figment = figment
                .merge(Toml::file(Self::user_config_path()))
                .merge(Toml::file("fanout.toml"));
        }
        figment = figment.merge(Env::prefixed("FANOUT_"));

        figment
            .extract()
            .context("invalid fanout configuration")
    }

    fn user_config_path() -> String {
        match std::env::var("HOME") {
            Ok(home) => format!("{home}/.config/fanout/config.toml"),
            Err(_) => "~/.config/fanout/config.toml".to_string(),
        }
    }
}
