//! Runtime settings and preferences
//!
//! Stored as JSON. Missing fields fall back to their defaults so older
//! files keep loading.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::consts::{DEFAULT_SPEED, MIN_BRIGHTNESS};
use crate::error::SettingsError;
use crate::pixels::Rgb;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Mode activated at startup
    pub mode: String,

    // === Animation ===
    /// Animation speed (0 - 255), read by modes that pace themselves
    pub speed: u8,
    /// Seed for scene randomness
    pub seed: u64,

    // === Display ===
    /// Panel brightness (0 - 255), floored at `MIN_BRIGHTNESS`
    pub brightness: u8,
    /// Marble color for the clock pattern
    pub clock_color: Rgb,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            mode: "Bounce".to_string(),

            speed: DEFAULT_SPEED,
            seed: 0x5eed,

            brightness: 255,
            clock_color: Rgb::WHITE,
        }
    }
}

impl Settings {
    /// Brightness actually sent to the panel
    pub fn effective_brightness(&self) -> u8 {
        self.brightness.max(MIN_BRIGHTNESS)
    }

    pub fn from_json(json: &str) -> Result<Self, SettingsError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String, SettingsError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Load settings from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        let settings = Self::from_json(&fs::read_to_string(path)?)?;
        log::info!("Loaded settings from {}", path.display());
        Ok(settings)
    }

    /// Save settings to a JSON file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), SettingsError> {
        let path = path.as_ref();
        fs::write(path, self.to_json()?)?;
        log::info!("Settings saved to {}", path.display());
        Ok(())
    }
}
