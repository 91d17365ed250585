//! # Task Messages
//!
//! This module defines the messages exchanged between the orchestrating thread
//! and the worker threads.
//!
//! ## Core Components
//! - `Task`: a unit of work sent to a worker
//! - `TaskResult`: the message a worker sends back when the work is done
//!
//! Both are closed enums, so every result is matched exhaustively on the
//! orchestrating thread. Tasks own their inputs and results own their outputs;
//! nothing is shared between a worker and the orchestrator except the immutable
//! `Arc`s a task carries (terrain sampler, UV table).
//!
//! ## Task Lifecycle
//! 1. A `Task` is created and scheduled via `TaskManager::publish_task()`
//! 2. `Task::process()` runs on a worker thread, guarded against panics
//! 3. The worker sends back a `TaskResult`
//! 4. The orchestrator drains results with `TaskManager::process_completed_tasks()`

use std::{
    any::Any,
    panic::{self, AssertUnwindSafe},
};

use cgmath::Point3;

use crate::engine_state::{
    error::StreamingError,
    rendering::{meshing::ChunkMeshes, tasks::chunk_mesh_generation_task::ChunkMeshGenerationTask},
    voxels::{chunk::VoxelBuffer, tasks::chunk_generation_task::ChunkGenerationTask},
};

/// A unit of work for a worker thread.
pub enum Task {
    /// Fill a chunk's voxel buffer from the terrain sampler.
    GenerateChunk(ChunkGenerationTask),
    /// Mesh a chunk from its halo snapshot.
    GenerateMesh(ChunkMeshGenerationTask),
}

/// What a worker sends back for a [`Task`].
#[derive(Debug)]
pub enum TaskResult {
    /// Voxels for `position`, or the reason generation failed.
    ChunkGenerated {
        /// The generated chunk.
        position: Point3<i32>,
        /// The load request the task was tagged with.
        request: u64,
        /// The voxel data, or the worker failure.
        result: Result<VoxelBuffer, StreamingError>,
    },
    /// Geometry for `position` built for `token`, or the reason meshing failed.
    MeshGenerated {
        /// The meshed chunk.
        position: Point3<i32>,
        /// The generation token the build was started with.
        token: u64,
        /// The geometry, or the worker failure.
        result: Result<ChunkMeshes, StreamingError>,
    },
}

impl Task {
    /// The chunk the task works on.
    pub fn position(&self) -> Point3<i32> {
        match self {
            Task::GenerateChunk(task) => task.position(),
            Task::GenerateMesh(task) => task.position(),
        }
    }

    /// Runs the task.
    ///
    /// A panic inside the work is caught and reported as
    /// [`StreamingError::WorkerPanicked`], so the worker thread survives and the
    /// orchestrator always receives exactly one result per task.
    pub fn process(self) -> TaskResult {
        match self {
            Task::GenerateChunk(task) => {
                let position = task.position();
                let request = task.request();
                let result = run_guarded("chunk generation", position, || task.process());
                TaskResult::ChunkGenerated {
                    position,
                    request,
                    result,
                }
            }
            Task::GenerateMesh(task) => {
                let position = task.position();
                let token = task.token();
                let result = run_guarded("mesh generation", position, || task.process());
                TaskResult::MeshGenerated {
                    position,
                    token,
                    result,
                }
            }
        }
    }
}

impl TaskResult {
    /// The chunk the result belongs to.
    pub fn position(&self) -> Point3<i32> {
        match self {
            TaskResult::ChunkGenerated { position, .. } => *position,
            TaskResult::MeshGenerated { position, .. } => *position,
        }
    }
}

fn run_guarded<T>(
    job: &str,
    position: Point3<i32>,
    work: impl FnOnce() -> T,
) -> Result<T, StreamingError> {
    panic::catch_unwind(AssertUnwindSafe(work)).map_err(|payload| {
        StreamingError::WorkerPanicked {
            job: format!("{job} of chunk {position:?}"),
            message: panic_message(payload.as_ref()),
        }
    })
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
