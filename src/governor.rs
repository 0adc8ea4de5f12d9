//! Performance governor
//!
//! A fixed bundle of cost bounds resolved once from the quality preset:
//! population, tessellation, render quality and sleep thresholds. The tier
//! is a deployment choice. Nothing here reacts to frame times at runtime.

use serde::{Deserialize, Serialize};

use crate::consts::{MAX_SUBSTEPS, SIM_DT};
use crate::settings::{PowerPreference, QualityPreset, Settings};
use crate::sim::SleepConfig;

/// Mesh segment counts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tessellation {
    /// Width and height segments for balls
    pub sphere_segments: u32,
    /// Segments around the torus tube
    pub torus_radial: u32,
    /// Segments along the torus ring
    pub torus_tubular: u32,
}

/// Global renderer configuration, applied at initialization
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RenderQuality {
    pub min_pixel_ratio: f32,
    pub max_pixel_ratio: f32,
    pub antialias: bool,
    pub power_preference: PowerPreference,
}

/// How the physics world is advanced each frame
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum StepMode {
    /// Accumulate frame time, step in `dt` increments, at most `max_substeps`
    Fixed { dt: f32, max_substeps: u32 },
    /// One step per frame with the (clamped) frame delta
    Variable { max_dt: f32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PerformanceGovernor {
    pub preset: QualityPreset,
    pub population: usize,
    pub tessellation: Tessellation,
    pub quality: RenderQuality,
    pub sleep: SleepConfig,
    pub step: StepMode,
}

impl PerformanceGovernor {
    pub fn for_preset(preset: QualityPreset) -> Self {
        match preset {
            QualityPreset::High => Self {
                preset,
                population: 150,
                tessellation: Tessellation {
                    sphere_segments: 32,
                    torus_radial: 16,
                    torus_tubular: 100,
                },
                quality: RenderQuality {
                    min_pixel_ratio: 1.0,
                    max_pixel_ratio: 2.0,
                    antialias: true,
                    power_preference: PowerPreference::Default,
                },
                sleep: SleepConfig {
                    speed_limit: 0.1,
                    time_limit: 1.0,
                },
                step: StepMode::Fixed {
                    dt: SIM_DT,
                    max_substeps: MAX_SUBSTEPS,
                },
            },
            QualityPreset::Reduced => Self {
                preset,
                population: 60,
                tessellation: Tessellation {
                    sphere_segments: 12,
                    torus_radial: 8,
                    torus_tubular: 32,
                },
                quality: RenderQuality {
                    min_pixel_ratio: 1.0,
                    max_pixel_ratio: 1.5,
                    antialias: false,
                    power_preference: PowerPreference::HighPerformance,
                },
                sleep: SleepConfig {
                    speed_limit: 0.3,
                    time_limit: 0.5,
                },
                step: StepMode::Fixed {
                    dt: SIM_DT,
                    max_substeps: 2,
                },
            },
        }
    }

    /// Resolve the preset and apply per-field overrides from settings
    pub fn from_settings(settings: &Settings) -> Self {
        let mut governor = Self::for_preset(settings.quality);
        if let Some(population) = settings.population {
            governor.population = population;
        }
        if !settings.fixed_timestep {
            governor.step = StepMode::Variable {
                max_dt: crate::consts::MAX_FRAME_DT,
            };
        }
        log::info!(
            "Quality {}: {} balls, {}-segment spheres, pixel ratio {}..{}, MSAA {}",
            governor.preset.as_str(),
            governor.population,
            governor.tessellation.sphere_segments,
            governor.quality.min_pixel_ratio,
            governor.quality.max_pixel_ratio,
            governor.quality.antialias,
        );
        governor
    }

    /// Clamp a device pixel ratio into the tier's range
    pub fn clamp_pixel_ratio(&self, device_ratio: f32) -> f32 {
        if !device_ratio.is_finite() {
            return self.quality.min_pixel_ratio;
        }
        device_ratio.clamp(self.quality.min_pixel_ratio, self.quality.max_pixel_ratio)
    }

    /// MSAA sample count for the render targets
    pub fn sample_count(&self) -> u32 {
        if self.quality.antialias { 4 } else { 1 }
    }
}
