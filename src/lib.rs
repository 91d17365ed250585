#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]
#![warn(rustdoc::invalid_rust_codeblocks)]

//! # Voxel Streaming
//!
//! Streams an effectively infinite voxel world around a moving observer.
//!
//! The crate decides which 16x16x16 chunks must exist, generates their blocks
//! on one worker pool, meshes them on another, and keeps the resulting geometry
//! coherent while the observer moves and blocks are edited. Drawing is left to
//! a [`engine_state::rendering::ChunkRenderer`] supplied by the caller.
//!
//! ## Key Modules
//!
//! * `core` - Shared single-threaded handles
//! * `engine_state` - Configuration, worker pools, voxels, meshing and the
//!   streaming manager
//!
//! ## Usage
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use cgmath::Point3;
//! use voxel_streaming::{
//!     engine_state::{
//!         rendering::RecordingRenderer,
//!         voxels::{block::BlockUvTable, terrain::NoiseTerrain},
//!     },
//!     ChunkStreamingManager, StreamingConfig,
//! };
//!
//! let config = StreamingConfig::default();
//! let mut manager = ChunkStreamingManager::new(
//!     config.clone(),
//!     Arc::new(NoiseTerrain::new(config.seed)),
//!     BlockUvTable::for_known_blocks(),
//!     RecordingRenderer::new(),
//! )
//! .unwrap();
//!
//! // Once per frame:
//! manager.tick(Point3::new(0.0, 20.0, 0.0));
//! manager.set_block_at(Point3::new(0, 20, 0), 3);
//! ```

use std::{path::PathBuf, sync::Arc, thread, time::Duration};

use cgmath::Point3;
use log::{info, warn};

pub mod core;
pub mod engine_state;

pub use engine_state::{
    config::StreamingConfig,
    error::StreamingError,
    voxels::world::{ChunkStreamingManager, StreamingStats},
};

use engine_state::{
    rendering::RecordingRenderer,
    voxels::{
        block::{block_type::BlockType, BlockUvTable},
        terrain::NoiseTerrain,
    },
};

/// Name of the stopwatch logged around the demo run.
pub const DEMO_STOPWATCH: &str = "Streaming Demo";

/// Ticks the demo observer flies for.
const DEMO_TICKS: usize = 600;
/// Blocks the demo observer moves per tick.
const DEMO_SPEED: f32 = 0.5;
/// Target tick length of the demo.
const DEMO_TICK: Duration = Duration::from_millis(16);

/// Initialises `env_logger`, writing to stdout and filtered by `RUST_LOG`.
pub fn init_logger() {
    let mut log_builder = env_logger::Builder::new();
    log_builder
        .target(env_logger::Target::Stdout)
        .parse_env("RUST_LOG")
        .init();
}

/// Runs the headless streaming demo.
///
/// Loads the configuration from `config_path` if given, then flies an observer
/// across a noise-generated world, digging a shaft under its start position
/// along the way, and logs the final statistics as JSON.
pub fn run(config_path: Option<PathBuf>) -> Result<(), StreamingError> {
    let config = match config_path {
        Some(path) => {
            info!("Loading configuration from {}", path.display());
            StreamingConfig::from_json_file(path)?
        }
        None => StreamingConfig::default(),
    };

    let terrain = NoiseTerrain::new(config.seed);
    let start_height = terrain.max_height as f32 + 2.0;
    let mut manager = ChunkStreamingManager::new(
        config.clone(),
        Arc::new(terrain),
        BlockUvTable::for_known_blocks(),
        RecordingRenderer::new(),
    )?;

    let started = web_time::Instant::now();
    info!("{} started", DEMO_STOPWATCH);

    for tick in 0..DEMO_TICKS {
        let tick_started = web_time::Instant::now();
        let observer = Point3::new(tick as f32 * DEMO_SPEED, start_height, 0.0);
        manager.tick(observer);

        if tick == DEMO_TICKS / 2 {
            let dug = (0..8)
                .filter(|&depth| manager.set_block_at(Point3::new(0, depth, 0), BlockType::Air.id()))
                .count();
            info!("Dug {} blocks", dug);
        }

        if tick % 60 == 0 {
            info!(
                "tick {}: {} chunks, {} queued, {} meshing, {} attached",
                tick,
                manager.chunk_count(),
                manager.queued_len(),
                manager.in_flight_len(),
                manager.renderer().attached_len()
            );
        }

        if let Some(rest) = DEMO_TICK.checked_sub(tick_started.elapsed()) {
            thread::sleep(rest);
        }
    }

    info!(
        "{} finished after {:?}, {} vertices attached",
        DEMO_STOPWATCH,
        started.elapsed(),
        manager.renderer().vertex_count()
    );
    match serde_json::to_string_pretty(manager.stats()) {
        Ok(json) => info!("{}", json),
        Err(error) => warn!("Could not serialize statistics: {}", error),
    }

    manager.dispose_all();
    Ok(())
}
