//! Highlighting preferences persistence
//!
//! Stores user preferences in `~/.config/milord/config.yaml`

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::highlight::{MARKUP_HIGHLIGHTER, SPELLING_HIGHLIGHTER};

/// One entry of the ordered strategy list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HighlighterPref {
    /// Strategy name (e.g., "markup", "spelling")
    pub name: String,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_enabled() -> bool {
    true
}

fn default_highlighters() -> Vec<HighlighterPref> {
    [MARKUP_HIGHLIGHTER, SPELLING_HIGHLIGHTER]
        .into_iter()
        .map(|name| HighlighterPref {
            name: name.to_string(),
            enabled: true,
        })
        .collect()
}

/// Highlighting configuration that persists across sessions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HighlightConfig {
    /// Strategies in layer order with their enabled flags
    #[serde(default = "default_highlighters")]
    pub highlighters: Vec<HighlighterPref>,
    /// Word list for spell checking (defaults to `dictionary.txt` in the config dir)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dictionary: Option<PathBuf>,
}

impl Default for HighlightConfig {
    fn default() -> Self {
        Self {
            highlighters: default_highlighters(),
            dictionary: None,
        }
    }
}

impl HighlightConfig {
    /// Load config from disk, or return defaults if not found
    pub fn load() -> Self {
        let Some(path) = crate::config_paths::config_file() else {
            tracing::debug!("No config directory available, using defaults");
            return Self::default();
        };
        Self::load_from(&path)
    }

    /// Load config from a specific file, or return defaults if missing/invalid
    pub fn load_from(path: &Path) -> Self {
        if !path.exists() {
            tracing::debug!(
                "Config file not found at {}, using defaults",
                path.display()
            );
            return Self::default();
        }

        match std::fs::read_to_string(path) {
            Ok(content) => match serde_yaml::from_str(&content) {
                Ok(config) => {
                    tracing::info!("Loaded config from {}", path.display());
                    config
                }
                Err(e) => {
                    tracing::warn!("Failed to parse config at {}: {}", path.display(), e);
                    Self::default()
                }
            },
            Err(e) => {
                tracing::warn!("Failed to read config at {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    /// Save config to disk
    ///
    /// Creates the config directory if it doesn't exist.
    pub fn save(&self) -> Result<(), String> {
        let path = crate::config_paths::config_file()
            .ok_or_else(|| "No config directory available".to_string())?;
        self.save_to(&path)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), String> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| format!("Failed to create config directory: {}", e))?;
        }

        let content = serde_yaml::to_string(self)
            .map_err(|e| format!("Failed to serialize config: {}", e))?;

        std::fs::write(path, content)
            .map_err(|e| format!("Failed to write config to {}: {}", path.display(), e))?;

        tracing::info!("Saved config to {}", path.display());
        Ok(())
    }

    /// Dictionary to load: the configured path, else the default location
    pub fn dictionary_path(&self) -> Option<PathBuf> {
        self.dictionary
            .clone()
            .or_else(crate::config_paths::dictionary_file)
    }

    /// Enable or disable a strategy, appending it to the order if unlisted
    pub fn set_highlighter_enabled(&mut self, name: &str, enabled: bool) {
        match self.highlighters.iter_mut().find(|p| p.name == name) {
            Some(pref) => pref.enabled = enabled,
            None => self.highlighters.push(HighlighterPref {
                name: name.to_string(),
                enabled,
            }),
        }
    }

    pub fn is_enabled(&self, name: &str) -> bool {
        self.highlighters
            .iter()
            .find(|p| p.name == name)
            .map(|p| p.enabled)
            .unwrap_or(true)
    }
}
