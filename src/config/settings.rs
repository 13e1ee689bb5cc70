//! TOML-based configuration for query building.
//!
//! Example configuration:
//! ```toml
//! [resolution]
//! deep_search = true      # search associations for unqualified field names
//! max_search_depth = 4
//!
//! [aliases]
//! separator = "__"
//!
//! [aggregate]
//! strict_aliases = false  # record collisions instead of overwriting
//! ```

use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use crate::resolve::joins::DEFAULT_ALIAS_SEPARATOR;
use crate::resolve::resolver::DEFAULT_MAX_SEARCH_DEPTH;

/// Error type for settings.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("Config file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Root configuration structure.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Settings {
    pub resolution: ResolutionSettings,
    pub aliases: AliasSettings,
    pub aggregate: AggregateSettings,
}

/// Path resolution settings.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ResolutionSettings {
    /// Search associations (depth-first, declaration order) for bare field
    /// names the root entity does not declare.
    pub deep_search: bool,

    /// Maximum number of associations the search may cross.
    pub max_search_depth: usize,
}

impl Default for ResolutionSettings {
    fn default() -> Self {
        Self {
            deep_search: true,
            max_search_depth: DEFAULT_MAX_SEARCH_DEPTH,
        }
    }
}

/// Join alias settings.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct AliasSettings {
    /// Placed between the root alias and each association name.
    pub separator: String,
}

impl Default for AliasSettings {
    fn default() -> Self {
        Self {
            separator: DEFAULT_ALIAS_SEPARATOR.to_string(),
        }
    }
}

/// Aggregation settings.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct AggregateSettings {
    /// When two aggregates share an output name, record an error and keep
    /// the first instead of letting the later one overwrite it.
    pub strict_aliases: bool,
}

impl Settings {
    /// Parse settings from TOML text and validate them.
    pub fn from_toml(content: &str) -> Result<Self, SettingsError> {
        let settings: Settings = toml::from_str(content)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load settings from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(SettingsError::FileNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Load settings from the default config file locations.
    ///
    /// Searches in order:
    /// 1. Environment variable `TRELLIS_CONFIG`
    /// 2. `./trellis.toml`
    /// 3. `~/.config/trellis/config.toml`
    pub fn load() -> Result<Self, SettingsError> {
        if let Ok(path) = env::var("TRELLIS_CONFIG") {
            return Self::from_file(&path);
        }

        let local_config = PathBuf::from("trellis.toml");
        if local_config.exists() {
            return Self::from_file(&local_config);
        }

        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("trellis").join("config.toml");
            if user_config.exists() {
                return Self::from_file(&user_config);
            }
        }

        Ok(Settings::default())
    }

    /// Reject values no build could work with.
    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.aliases.separator.is_empty() {
            return Err(SettingsError::InvalidConfig(
                "aliases.separator must not be empty".into(),
            ));
        }
        if self.resolution.deep_search && self.resolution.max_search_depth == 0 {
            return Err(SettingsError::InvalidConfig(
                "resolution.max_search_depth must be at least 1 when deep_search is enabled"
                    .into(),
            ));
        }
        Ok(())
    }
}
