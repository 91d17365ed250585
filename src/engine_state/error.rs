//! Error type shared by the streaming subsystem.
//!
//! Only genuine failures end up here. Results that arrive for a superseded
//! generation token, or edits aimed at unloaded chunks, are ordinary control flow
//! and never produce a `StreamingError`.

use thiserror::Error;

/// Errors produced by configuration, worker pools and voxel data validation.
#[derive(Debug, Error)]
pub enum StreamingError {
    /// A configuration value is out of its accepted range.
    #[error("invalid streaming configuration: {0}")]
    InvalidConfig(String),

    /// A configuration document could not be parsed.
    #[error("failed to parse streaming configuration: {0}")]
    ConfigParse(#[from] serde_json::Error),

    /// A configuration file could not be read.
    #[error("failed to read streaming configuration: {0}")]
    ConfigIo(std::io::Error),

    /// The operating system refused to start a worker thread.
    #[error("failed to spawn worker thread: {0}")]
    WorkerSpawn(std::io::Error),

    /// A job panicked on a worker thread. The worker itself keeps running.
    #[error("{job} panicked on a worker thread: {message}")]
    WorkerPanicked {
        /// Short description of the job that failed.
        job: String,
        /// The panic payload, if it was a string.
        message: String,
    },

    /// Raw voxel data did not have exactly one cell per block of a chunk.
    #[error("voxel buffer must hold {expected} cells, got {actual}")]
    VoxelBufferLength {
        /// Required number of cells.
        expected: usize,
        /// Number of cells supplied.
        actual: usize,
    },
}
