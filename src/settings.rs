//! Playground settings
//!
//! Persisted as JSON: a file on native (path from `BOUNCE_PIT_SETTINGS`),
//! LocalStorage on the web. Every field has a default taken from the
//! reference scene, so partial documents are fine.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::consts::{IMPACT_THRESHOLD, IMPULSE_SPEED, VOICE_VOLUME};
use crate::error::{PlaygroundError, Result};

/// Quality tiers. Chosen at deployment time; never switched while running.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum QualityPreset {
    /// 12-segment spheres, 8×32 torus, no MSAA, smaller population
    Reduced,
    /// 32-segment spheres, 16×100 torus, MSAA
    #[default]
    High,
}

impl QualityPreset {
    pub fn as_str(&self) -> &'static str {
        match self {
            QualityPreset::Reduced => "Reduced",
            QualityPreset::High => "High",
        }
    }
}

impl FromStr for QualityPreset {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "reduced" | "low" => Ok(QualityPreset::Reduced),
            "high" => Ok(QualityPreset::High),
            other => Err(format!("unknown quality preset '{other}'")),
        }
    }
}

/// GPU adapter hint forwarded to the renderer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum PowerPreference {
    #[default]
    Default,
    LowPower,
    HighPerformance,
}

/// Playground settings/preferences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Performance tier
    pub quality: QualityPreset,
    /// Overrides the tier's ball count
    pub population: Option<usize>,
    /// Scene RNG seed (spawn positions and colors)
    pub seed: u64,

    // === Assets (opaque, passed through) ===
    /// Filesystem root for native asset loading
    pub asset_root: String,
    pub texture_url: String,
    pub audio_url: String,
    pub environment_url: String,

    // === Behaviour ===
    /// Per-axis speed that counts as an impact
    pub impact_threshold: f32,
    /// Speed assigned on click
    pub impulse_speed: f32,
    /// Use the fixed-timestep accumulator (false = one variable step per frame)
    pub fixed_timestep: bool,
    /// Spawn the rotating platform
    pub platform: bool,

    // === Audio ===
    /// Impact voice gain (0.0 - 1.0)
    pub voice_volume: f32,
    pub muted: bool,

    // === HUD ===
    /// Attach the FPS counter probe
    pub show_fps: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            quality: QualityPreset::High,
            population: None,
            seed: 0x5eed_ba11,

            asset_root: "assets".to_string(),
            texture_url: "/brick.jpg".to_string(),
            audio_url: "/bounce2.mp3".to_string(),
            environment_url: "/pretoria_gardens_4k.hdr".to_string(),

            impact_threshold: IMPACT_THRESHOLD,
            impulse_speed: IMPULSE_SPEED,
            fixed_timestep: true,
            platform: true,

            voice_volume: VOICE_VOLUME,
            muted: false,

            show_fps: true,
        }
    }
}

impl Settings {
    /// Create settings for a quality preset
    pub fn from_preset(preset: QualityPreset) -> Self {
        Self {
            quality: preset,
            ..Self::default()
        }
    }

    /// Parse settings from JSON
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Serialize settings to pretty JSON
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Gain actually applied to voices
    pub fn effective_volume(&self) -> f32 {
        if self.muted {
            0.0
        } else {
            self.voice_volume.clamp(0.0, 1.0)
        }
    }

    /// Environment variable naming the native settings file
    pub const PATH_ENV: &'static str = "BOUNCE_PIT_SETTINGS";

    /// LocalStorage key
    #[cfg(target_arch = "wasm32")]
    const STORAGE_KEY: &'static str = "bounce_pit_settings";

    /// Read settings from a JSON file
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load_from(path: &std::path::Path) -> Result<Self> {
        let json = std::fs::read_to_string(path).map_err(|source| PlaygroundError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&json)
    }

    /// Load settings from the file named by `BOUNCE_PIT_SETTINGS`, or defaults
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load() -> Self {
        let Ok(path) = std::env::var(Self::PATH_ENV) else {
            log::info!("Using default settings");
            return Self::default();
        };
        match Self::load_from(std::path::Path::new(&path)) {
            Ok(settings) => {
                log::info!("Loaded settings from {path}");
                settings
            }
            Err(e) => {
                log::warn!("{e}; using default settings");
                Self::default()
            }
        }
    }

    /// Write settings back to the file named by `BOUNCE_PIT_SETTINGS`
    #[cfg(not(target_arch = "wasm32"))]
    pub fn save(&self) -> Result<()> {
        let Ok(path) = std::env::var(Self::PATH_ENV) else {
            return Ok(());
        };
        let json = self.to_json()?;
        std::fs::write(&path, json).map_err(|source| PlaygroundError::Io { path, source })
    }

    /// Load settings from LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn load() -> Self {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            if let Ok(Some(json)) = storage.get_item(Self::STORAGE_KEY) {
                match Self::from_json(&json) {
                    Ok(settings) => {
                        log::info!("Loaded settings from LocalStorage");
                        return settings;
                    }
                    Err(e) => log::warn!("{e}; using default settings"),
                }
            }
        }

        log::info!("Using default settings");
        Self::default()
    }

    /// Save settings to LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn save(&self) -> Result<()> {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            let json = self.to_json()?;
            let _ = storage.set_item(Self::STORAGE_KEY, &json);
            log::info!("Settings saved");
        }
        Ok(())
    }
}
