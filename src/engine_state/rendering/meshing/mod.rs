//! Mesh generation service.
//!
//! Meshing runs on its own worker pool, separate from terrain generation. The
//! service takes a halo snapshot per request and returns owned geometry through
//! [`TaskResult::MeshGenerated`] messages carrying the token the build was
//! started with.
//!
//! # Architecture
//! - `MeshingService`: owns the meshing worker pool and the shared UV table
//! - `mesh/`: the face-culling mesher and its buffer types

use std::sync::Arc;

use cgmath::Point3;

mod mesh;

pub use mesh::*;

use crate::engine_state::{
    error::StreamingError,
    task_management::{
        task::{Task, TaskResult},
        TaskManager,
    },
    voxels::{block::BlockUvTable, chunk::HaloBuffer},
};

use super::tasks::chunk_mesh_generation_task::ChunkMeshGenerationTask;

/// Builds chunk meshes on a dedicated worker pool.
pub struct MeshingService {
    task_manager: TaskManager,
    uvs: Arc<BlockUvTable>,
}

impl MeshingService {
    /// Starts `workers` meshing threads that share `uvs`.
    pub fn new(workers: usize, uvs: Arc<BlockUvTable>) -> Result<Self, StreamingError> {
        Ok(MeshingService {
            task_manager: TaskManager::new("chunk-mesh", workers)?,
            uvs,
        })
    }

    /// Submits a mesh build for the chunk at `position`.
    ///
    /// Returns `true` if a worker picked the build up immediately.
    pub fn submit(&mut self, position: Point3<i32>, token: u64, halo: HaloBuffer) -> bool {
        let task = ChunkMeshGenerationTask::new(position, token, halo, self.uvs.clone());
        self.task_manager.publish_task(Task::GenerateMesh(task))
    }

    /// Hands queued builds to idle workers.
    pub fn process_queued_tasks(&mut self) {
        self.task_manager.process_queued_tasks();
    }

    /// Every finished build since the last call.
    pub fn drain_completed(&mut self) -> Vec<TaskResult> {
        self.task_manager.process_completed_tasks()
    }

    /// Builds not yet drained.
    pub fn pending_count(&self) -> usize {
        self.task_manager.pending_count()
    }

    /// The atlas lookup used for every build.
    pub fn uvs(&self) -> &BlockUvTable {
        &self.uvs
    }
}
