//! Bounce Pit - a real-time ball pit playground
//!
//! Core modules:
//! - `sim`: Frame orchestration (physics step, transform sync, interaction, kinematics)
//! - `audio`: Impact-triggered voices over a pluggable audio backend
//! - `assets`: Non-blocking resource loading with per-resource readiness
//! - `governor`: Static performance tiers (sleep, tessellation, render quality)
//! - `stats`: Optional frame probes (FPS counter)
//! - `renderer`: GPU-facing instance/mesh data derived from the scene
//! - `platform`: Browser/native platform glue

pub mod assets;
pub mod audio;
pub mod camera;
pub mod error;
pub mod governor;
pub mod platform;
pub mod renderer;
pub mod settings;
pub mod sim;
pub mod stats;

pub use error::{PlaygroundError, Result};
pub use governor::PerformanceGovernor;
pub use settings::{QualityPreset, Settings};

use std::f32::consts::{PI, TAU};

use glam::Vec3;

/// Scene configuration constants
pub mod consts {
    use glam::Vec3;

    /// Fixed simulation timestep (60 Hz)
    pub const SIM_DT: f32 = 1.0 / 60.0;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 4;
    /// Longest frame delta fed to a variable-step world
    pub const MAX_FRAME_DT: f32 = 0.1;

    /// World gravity (m/s²)
    pub const GRAVITY: Vec3 = Vec3::new(0.0, -9.81, 0.0);

    /// Per-axis speed above which a ball counts as impacting
    pub const IMPACT_THRESHOLD: f32 = 0.1;
    /// Speed assigned to a clicked ball along the view direction
    pub const IMPULSE_SPEED: f32 = 10.0;

    /// Ball defaults
    pub const BALL_RADIUS: f32 = 0.5;
    pub const BALL_VISUAL_RADIUS: f32 = 0.7;
    pub const BALL_MASS: f32 = 1.0;
    pub const BALL_RESTITUTION: f32 = 0.8;
    pub const BALL_METALNESS: f32 = 1.0;
    pub const BALL_ROUGHNESS: f32 = 0.5;
    pub const HOVER_COLOR: [f32; 4] = [1.0, 0.0, 0.0, 1.0];

    /// Spawn column for dynamic balls
    pub const SPAWN_MIN: Vec3 = Vec3::new(-5.0, 0.0, -5.0);
    pub const SPAWN_MAX: Vec3 = Vec3::new(5.0, 150.0, 5.0);

    /// Ground plane
    pub const PLANE_HEIGHT: f32 = -10.0;
    pub const PLANE_SIZE: f32 = 100.0;

    /// Rotating platform (torus visual, box collider)
    pub const PLATFORM_POSITION: Vec3 = Vec3::new(0.0, -5.0, 0.0);
    pub const PLATFORM_RADIUS: f32 = 3.0;
    pub const PLATFORM_TUBE: f32 = 0.4;
    pub const PLATFORM_HALF_EXTENTS: Vec3 = Vec3::new(3.4, 0.4, 3.4);
    /// Authored spin per tick (radians, x/y/z)
    pub const PLATFORM_SPIN: Vec3 = Vec3::new(0.01, 0.02, 0.03);

    /// Default camera
    pub const CAMERA_POSITION: Vec3 = Vec3::new(0.0, 0.0, 15.0);
    pub const CAMERA_FOV_DEG: f32 = 75.0;

    /// Impact voice gain
    pub const VOICE_VOLUME: f32 = 0.5;
}

/// Wrap an angle to [-π, π)
#[inline]
pub fn wrap_angle(angle: f32) -> f32 {
    let shifted = (angle + PI).rem_euclid(TAU);
    // rem_euclid may round a tiny negative remainder up to TAU itself
    if shifted >= TAU { -PI } else { shifted - PI }
}

/// Wrap each Euler component to [-π, π)
#[inline]
pub fn wrap_euler(angles: Vec3) -> Vec3 {
    Vec3::new(wrap_angle(angles.x), wrap_angle(angles.y), wrap_angle(angles.z))
}

/// Convert HSL (hue in degrees, saturation/lightness in 0..=1) to linear RGB
pub fn hsl_to_rgb(hue: f32, saturation: f32, lightness: f32) -> [f32; 3] {
    let h = hue.rem_euclid(360.0) / 60.0;
    let c = (1.0 - (2.0 * lightness - 1.0).abs()) * saturation;
    let x = c * (1.0 - (h % 2.0 - 1.0).abs());
    let (r, g, b) = match h as u32 {
        0 => (c, x, 0.0),
        1 => (x, c, 0.0),
        2 => (0.0, c, x),
        3 => (0.0, x, c),
        4 => (x, 0.0, c),
        _ => (c, 0.0, x),
    };
    let m = lightness - c / 2.0;
    [r + m, g + m, b + m]
}
