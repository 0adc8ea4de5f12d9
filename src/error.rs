//! Crate error type
//!
//! Errors only surface at construction-time boundaries (settings, resource
//! requests). The per-frame tick never returns one; it degrades silently and
//! records what happened in its frame report.

use glam::Vec3;
use thiserror::Error;

use crate::sim::EntityId;

/// Playground error types
#[derive(Error, Debug)]
pub enum PlaygroundError {
    /// Settings JSON could not be parsed or serialized
    #[error("invalid settings: {0}")]
    Settings(#[from] serde_json::Error),

    /// Settings file could not be read
    #[error("failed to read {path}: {source}")]
    Io {
        /// Path that failed
        path: String,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// A resource fetch completed with a failure
    #[error("failed to load {url}: {reason}")]
    ResourceLoad {
        /// Requested URL
        url: String,
        /// Failure reason reported by the fetcher
        reason: String,
    },

    /// Entity id outside the registry
    #[error("unknown entity {}", .0.0)]
    UnknownEntity(EntityId),

    /// Camera view direction unusable for an impulse
    #[error("degenerate view direction ({}, {}, {})", .0.x, .0.y, .0.z)]
    DegenerateDirection(Vec3),

    /// Physics world has not been attached yet
    #[error("physics world not initialized")]
    WorldUninitialized,
}

/// Result alias used across the crate
pub type Result<T> = std::result::Result<T, PlaygroundError>;
