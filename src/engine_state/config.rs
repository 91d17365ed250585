//! # Streaming Configuration
//!
//! Plain numeric knobs for the streaming core. Everything here may change between
//! runs; the chunk edge length and halo width are compile-time constants in
//! [`crate::engine_state::voxels::chunk`] because buffer sizes depend on them.
//!
//! Configuration can be built in code (`StreamingConfig::default()` plus field
//! updates) or read from JSON, where any missing field keeps its default:
//!
//! ```
//! use voxel_streaming::StreamingConfig;
//!
//! let config = StreamingConfig::from_json_str(r#"{ "view_distance": 4, "seed": 7 }"#).unwrap();
//! assert_eq!(config.view_distance, 4);
//! assert_eq!(config.remesh_budget, 10);
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use super::error::StreamingError;

/// Radius of the loaded sphere, in chunks.
pub const DEFAULT_VIEW_DISTANCE: i32 = 10;
/// Maximum number of remesh jobs started by one pump.
pub const DEFAULT_REMESH_BUDGET: usize = 10;
/// Maximum number of remesh requests issued when a single chunk finishes loading.
pub const DEFAULT_KICK_LIMIT: usize = 7;
/// Worker threads dedicated to terrain generation.
pub const DEFAULT_GENERATION_WORKERS: usize = 4;
/// Worker threads dedicated to meshing.
pub const DEFAULT_MESHING_WORKERS: usize = 6;
/// Priority penalty for chunks that already show a mesh.
pub const DEFAULT_REMESH_PENALTY: f32 = 1.0e6;

/// Tunables for [`crate::ChunkStreamingManager`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamingConfig {
    /// World seed handed to the terrain sampler.
    pub seed: u32,
    /// Chunks whose squared chunk distance to the observer is at most
    /// `view_distance²` are kept loaded.
    pub view_distance: i32,
    /// Remesh jobs started per scheduling tick.
    pub remesh_budget: usize,
    /// Remesh requests issued around a freshly loaded chunk.
    pub kick_limit: usize,
    /// Size of the generation worker pool.
    pub generation_workers: usize,
    /// Size of the meshing worker pool.
    pub meshing_workers: usize,
    /// Added to the priority score of chunks that already have a mesh, so that
    /// first-time meshes always win over rebuilds.
    pub remesh_penalty: f32,
}

impl Default for StreamingConfig {
    fn default() -> Self {
        StreamingConfig {
            seed: 0,
            view_distance: DEFAULT_VIEW_DISTANCE,
            remesh_budget: DEFAULT_REMESH_BUDGET,
            kick_limit: DEFAULT_KICK_LIMIT,
            generation_workers: DEFAULT_GENERATION_WORKERS,
            meshing_workers: DEFAULT_MESHING_WORKERS,
            remesh_penalty: DEFAULT_REMESH_PENALTY,
        }
    }
}

impl StreamingConfig {
    /// Parses a JSON document and validates the result.
    pub fn from_json_str(json: &str) -> Result<Self, StreamingError> {
        let config: StreamingConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads and parses a JSON configuration file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, StreamingError> {
        let contents = std::fs::read_to_string(path).map_err(StreamingError::ConfigIo)?;
        Self::from_json_str(&contents)
    }

    /// Checks that every value is usable.
    pub fn validate(&self) -> Result<(), StreamingError> {
        if self.view_distance < 0 {
            return Err(StreamingError::InvalidConfig(format!(
                "view_distance must not be negative, got {}",
                self.view_distance
            )));
        }
        if self.remesh_budget == 0 {
            return Err(StreamingError::InvalidConfig(
                "remesh_budget must be at least 1".to_string(),
            ));
        }
        if self.kick_limit == 0 {
            return Err(StreamingError::InvalidConfig(
                "kick_limit must be at least 1".to_string(),
            ));
        }
        if self.generation_workers == 0 || self.meshing_workers == 0 {
            return Err(StreamingError::InvalidConfig(
                "worker pools need at least one worker".to_string(),
            ));
        }
        if !self.remesh_penalty.is_finite() || self.remesh_penalty < 0.0 {
            return Err(StreamingError::InvalidConfig(format!(
                "remesh_penalty must be a non-negative finite number, got {}",
                self.remesh_penalty
            )));
        }
        Ok(())
    }
}
