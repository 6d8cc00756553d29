use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::llm::{DEFAULT_ENDPOINT, DEFAULT_MODEL};

/// Default settings file name, looked up in the working directory.
pub const SETTINGS_FILE: &str = "settings.json";

/// Persisted user settings.
///
/// A missing file yields the defaults; unknown fields in an existing file
/// are ignored so older files keep loading.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Settings {
    #[serde(default = "default_ollama_url")]
    pub ollama_url: String,
    #[serde(default = "default_model_name")]
    pub model_name: String,
}

fn default_ollama_url() -> String {
    DEFAULT_ENDPOINT.to_string()
}

fn default_model_name() -> String {
    DEFAULT_MODEL.to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            ollama_url: default_ollama_url(),
            model_name: default_model_name(),
        }
    }
}

impl Settings {
    /// Load settings, falling back to defaults when the file is absent.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings from {:?}", path))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse settings in {:?}", path))
    }

    /// Rewrite the settings file in full.
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string(self).context("Failed to serialize settings")?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write settings to {:?}", path))
    }
}
