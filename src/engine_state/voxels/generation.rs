//! # Chunk Generation Service
//!
//! Owns the generation worker pool. Requests are fire-and-forget: the caller
//! publishes `(position, seed, request)` and later drains [`TaskResult::ChunkGenerated`]
//! messages. The service keeps no state beyond the pool and the shared sampler.

use std::sync::Arc;

use cgmath::Point3;
use log::debug;

use crate::engine_state::{
    error::StreamingError,
    task_management::{
        task::{Task, TaskResult},
        TaskManager,
    },
};

use super::{tasks::chunk_generation_task::ChunkGenerationTask, terrain::TerrainSampler};

/// Generates chunk voxels on a dedicated worker pool.
pub struct ChunkGenerationService {
    task_manager: TaskManager,
    sampler: Arc<dyn TerrainSampler>,
}

impl ChunkGenerationService {
    /// Starts `workers` generation threads sampling `sampler`.
    pub fn new(workers: usize, sampler: Arc<dyn TerrainSampler>) -> Result<Self, StreamingError> {
        Ok(ChunkGenerationService {
            task_manager: TaskManager::new("chunk-gen", workers)?,
            sampler,
        })
    }

    /// Requests the voxels of the chunk at `position`.
    ///
    /// `request` comes back unchanged in the result so the caller can tell
    /// answers to superseded requests apart. Returns `true` if a worker picked
    /// the request up immediately.
    pub fn generate(&mut self, position: Point3<i32>, seed: u32, request: u64) -> bool {
        debug!("Requesting generation of chunk {:?} (request {})", position, request);
        let task =
            ChunkGenerationTask::new(position, seed, self.sampler.clone()).with_request(request);
        self.task_manager.publish_task(Task::GenerateChunk(task))
    }

    /// Hands queued requests to idle workers.
    pub fn process_queued_tasks(&mut self) {
        self.task_manager.process_queued_tasks();
    }

    /// Every finished generation result since the last call.
    pub fn drain_completed(&mut self) -> Vec<TaskResult> {
        self.task_manager.process_completed_tasks()
    }

    /// Requests not yet drained.
    pub fn pending_count(&self) -> usize {
        self.task_manager.pending_count()
    }

    /// The sampler every request is generated with.
    pub fn sampler(&self) -> &Arc<dyn TerrainSampler> {
        &self.sampler
    }
}
