//! Sandbox settings with persistence
//!
//! Settings are read from `~/.config/skitter/settings.toml` unless a path is
//! given on the command line.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use skitter_core::TimeConfig;
use skitter_game::PlayerConfig;
use tracing::{info, warn};

/// All sandbox settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SandboxSettings {
    pub time: TimeConfig,
    pub player: PlayerConfig,
    pub run: RunSettings,
}

impl SandboxSettings {
    /// Get the config directory path
    fn config_dir() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("skitter"))
    }

    /// Get the settings file path
    fn settings_path() -> Option<PathBuf> {
        Self::config_dir().map(|p| p.join("settings.toml"))
    }

    /// Load settings from `path`, or from the config directory
    ///
    /// Missing or unreadable files and invalid tuning fall back to defaults.
    pub fn load(path: Option<&Path>) -> Self {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => {
                let Some(path) = Self::settings_path() else {
                    warn!("Could not determine config directory");
                    return Self::default();
                };
                path
            }
        };

        if !path.exists() {
            info!("No settings file at {:?}, using defaults", path);
            return Self::default();
        }

        let settings: Self = match fs::read_to_string(&path) {
            Ok(content) => match toml::from_str(&content) {
                Ok(settings) => {
                    info!("Loaded settings from {:?}", path);
                    settings
                }
                Err(e) => {
                    warn!("Failed to parse settings: {}, using defaults", e);
                    return Self::default();
                }
            },
            Err(e) => {
                warn!("Failed to read settings file: {}, using defaults", e);
                return Self::default();
            }
        };

        if let Err(e) = settings.player.validate() {
            warn!("Invalid player tuning: {}, using defaults", e);
            return Self::default();
        }
        settings
    }

    /// Save settings to the config directory
    pub fn save(&self) -> anyhow::Result<()> {
        let Some(path) = Self::settings_path() else {
            anyhow::bail!("Could not determine config directory");
        };
        self.save_to(&path)
    }

    /// Save settings as TOML at `path`, creating parent directories
    pub fn save_to(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(dir) = path.parent() {
            if !dir.exists() {
                fs::create_dir_all(dir)?;
            }
        }

        let content = toml::to_string_pretty(self)?;
        fs::write(path, content)?;
        info!("Saved settings to {:?}", path);
        Ok(())
    }
}

/// How the scripted run is driven
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RunSettings {
    /// Simulated render frame length in seconds
    pub frame_delta: f32,
    /// Total simulated seconds
    pub duration: f32,
    /// Log the character every this many fixed ticks
    pub log_every: u64,
}

impl Default for RunSettings {
    fn default() -> Self {
        Self {
            frame_delta: 1.0 / 50.0,
            duration: 9.0,
            log_every: 15,
        }
    }
}
