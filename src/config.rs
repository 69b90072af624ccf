//! Configuration management with layered loading
//!
//! Precedence (lowest to highest):
//! 1. Compiled defaults
//! 2. Global config: `$XDG_CONFIG_HOME/stagetree/stagetree.toml`
//! 3. Explicit config file passed with `--config`
//! 4. Environment variables: `STAGETREE_*` prefix

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use config::{Config, ConfigError, Environment};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::application::ApplicationError;

/// Initial content of the store forest.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SeedKind {
    /// Demonstration topology
    #[default]
    Demo,
    /// No nodes at all
    Empty,
}

impl FromStr for SeedKind {
    type Err = ApplicationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "demo" => Ok(SeedKind::Demo),
            "empty" => Ok(SeedKind::Empty),
            other => Err(ApplicationError::Config {
                message: format!("unknown seed '{other}', expected 'demo' or 'empty'"),
            }),
        }
    }
}

impl fmt::Display for SeedKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SeedKind::Demo => write!(f, "demo"),
            SeedKind::Empty => write!(f, "empty"),
        }
    }
}

/// Unified configuration for stagetree.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    /// Initial store content on start and on reset
    pub seed: SeedKind,
    /// Show tombstoned nodes in text views
    pub show_tombstoned: bool,
    /// Print views as JSON instead of text trees
    pub json: bool,
    /// Abort a session on the first failing command
    pub strict: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            seed: SeedKind::Demo,
            show_tombstoned: true,
            json: false,
            strict: false,
        }
    }
}

/// Raw settings for intermediate parsing (`None` → not specified, inherit).
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawSettings {
    pub seed: Option<SeedKind>,
    pub show_tombstoned: Option<bool>,
    pub json: Option<bool>,
    pub strict: Option<bool>,
}

/// Get the XDG config directory for stagetree.
pub fn global_config_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "stagetree").map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the global config file.
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("stagetree.toml"))
}

/// Load a TOML file into RawSettings for manual merging.
fn load_raw_settings(path: &Path) -> Result<RawSettings, ApplicationError> {
    let content = std::fs::read_to_string(path).map_err(|e| ApplicationError::Config {
        message: format!("read {}: {}", path.display(), e),
    })?;
    toml::from_str(&content).map_err(|e| ApplicationError::Config {
        message: format!("parse {}: {}", path.display(), e),
    })
}

impl Settings {
    /// Merge overlay config onto self (base): overlay wins where specified.
    fn merge_with(&self, overlay: &RawSettings) -> Self {
        Self {
            seed: overlay.seed.unwrap_or(self.seed),
            show_tombstoned: overlay.show_tombstoned.unwrap_or(self.show_tombstoned),
            json: overlay.json.unwrap_or(self.json),
            strict: overlay.strict.unwrap_or(self.strict),
        }
    }

    /// Load settings with layered precedence.
    ///
    /// # Arguments
    /// * `config_file` - Optional explicit config file; it must exist
    ///
    /// # Precedence (lowest to highest)
    /// 1. Compiled defaults
    /// 2. Global config: `$XDG_CONFIG_HOME/stagetree/stagetree.toml`
    /// 3. Explicit config file
    /// 4. Environment variables: `STAGETREE_*`
    pub fn load(config_file: Option<&Path>) -> Result<Self, ApplicationError> {
        let mut current = Self::default();

        if let Some(global_path) = global_config_path() {
            if global_path.exists() {
                debug!("loading global config {}", global_path.display());
                let raw = load_raw_settings(&global_path)?;
                current = current.merge_with(&raw);
            }
        }

        if let Some(path) = config_file {
            debug!("loading config {}", path.display());
            let raw = load_raw_settings(path)?;
            current = current.merge_with(&raw);
        }

        Self::apply_env_overrides(current, env_source())
    }

    /// Apply `STAGETREE_*` environment variables as explicit overrides.
    fn apply_env_overrides(mut settings: Self, env: Environment) -> Result<Self, ApplicationError> {
        // Use config crate just for env var parsing
        let config = Config::builder()
            .add_source(env)
            .build()
            .map_err(config_err)?;

        if let Ok(val) = config.get_string("seed") {
            settings.seed = val.parse()?;
        }
        if let Ok(val) = config.get_bool("show_tombstoned") {
            settings.show_tombstoned = val;
        }
        if let Ok(val) = config.get_bool("json") {
            settings.json = val;
        }
        if let Ok(val) = config.get_bool("strict") {
            settings.strict = val;
        }

        Ok(settings)
    }

    /// Show the effective configuration as TOML.
    pub fn to_toml(&self) -> Result<String, ApplicationError> {
        toml::to_string_pretty(self).map_err(|e| ApplicationError::Config {
            message: format!("serialize config: {e}"),
        })
    }

    /// Generate a template config file.
    pub fn template() -> String {
        r#"# stagetree configuration
#
# Locations (by precedence, lowest to highest):
#   Global: ~/.config/stagetree/stagetree.toml
#   File:   --config <FILE>
#   Env:    STAGETREE_* environment variables (e.g. STAGETREE_SEED=empty)

# Initial store content: "demo" (sample tree) or "empty"
# seed = "demo"

# Show deleted (tombstoned) nodes in text views
# show_tombstoned = true

# Print views as JSON
# json = false

# Abort sessions on the first failing command
# strict = false
"#
        .to_string()
    }
}

/// `STAGETREE_SEED=empty` style variables; nested keys would use `__`.
fn env_source() -> Environment {
    Environment::with_prefix("STAGETREE")
        .prefix_separator("_")
        .separator("__")
}

fn config_err(e: ConfigError) -> ApplicationError {
    ApplicationError::Config {
        message: e.to_string(),
    }
}
