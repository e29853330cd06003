//! Settings for the tool itself
//!
//! Optional JSON file under the user config root. Every field has a default,
//! so a missing file or a partial file both load cleanly.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

use crate::constants::{daemons, effects, paths};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Pause between stop and start when a daemon is reloaded by restart
    #[serde(default = "default_reload_settle_ms")]
    pub reload_settle_ms: u64,
    /// Inactive-window opacity written by `effects enable transparency`
    #[serde(default = "default_transparency_enabled_percent")]
    pub transparency_enabled_percent: u8,
    #[serde(default = "default_compositor")]
    pub compositor: DaemonSettings,
    #[serde(default = "default_panel")]
    pub panel: DaemonSettings,
    #[serde(default)]
    pub input: InputSettings,
}

/// Binary name and template location for a daemon-backed backend
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DaemonSettings {
    pub binary: String,
    pub template: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputSettings {
    #[serde(default = "default_input_snippet")]
    pub snippet: PathBuf,
}

fn default_log_level() -> String {
    "warn".to_string()
}

fn default_reload_settle_ms() -> u64 {
    daemons::RELOAD_SETTLE_MS
}

fn default_transparency_enabled_percent() -> u8 {
    effects::TRANSPARENCY_ENABLED_PERCENT
}

fn default_compositor() -> DaemonSettings {
    DaemonSettings {
        binary: daemons::COMPOSITOR.to_string(),
        template: PathBuf::from(paths::COMPOSITOR_TEMPLATE),
    }
}

fn default_panel() -> DaemonSettings {
    DaemonSettings {
        binary: daemons::PANEL.to_string(),
        template: PathBuf::from(paths::PANEL_TEMPLATE),
    }
}

fn default_input_snippet() -> PathBuf {
    PathBuf::from(paths::INPUT_SNIPPET)
}

impl Default for InputSettings {
    fn default() -> Self {
        Self {
            snippet: default_input_snippet(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            reload_settle_ms: default_reload_settle_ms(),
            transparency_enabled_percent: default_transparency_enabled_percent(),
            compositor: default_compositor(),
            panel: default_panel(),
            input: InputSettings::default(),
        }
    }
}

impl AppConfig {
    /// Default location of the settings file, if a config root exists
    pub fn path() -> Option<PathBuf> {
        let mut path = dirs::config_dir()?;
        path.push(paths::APP_DIR);
        path.push(paths::SETTINGS_FILENAME);
        Some(path)
    }

    /// Load from the default location; absent file or config root means defaults
    pub fn load() -> Result<Self> {
        match Self::path() {
            Some(path) => Self::load_from(&path),
            None => {
                debug!("No config directory, using built-in settings");
                Ok(Self::default())
            }
        }
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!(path = %path.display(), "Settings file not found, using defaults");
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings from {}", path.display()))?;
        let config: AppConfig = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse settings JSON in {}", path.display()))?;

        info!(path = %path.display(), "Loaded settings file");
        Ok(config)
    }

    pub fn reload_settle(&self) -> Duration {
        Duration::from_millis(self.reload_settle_ms)
    }

    /// Enabled transparency, kept within the percentage domain
    pub fn transparency_enabled(&self) -> u8 {
        self.transparency_enabled_percent.min(100)
    }
}
