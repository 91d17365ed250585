//! Task for generating mesh data for chunks in a background thread.
//!
//! The task carries a halo snapshot taken on the orchestrating thread, so the
//! worker never touches live chunk data. It returns owned buffers that are moved
//! back to the orchestrator.

use std::sync::Arc;

use cgmath::Point3;

use crate::engine_state::{
    rendering::meshing::{build_chunk_meshes, ChunkMeshes},
    voxels::{block::BlockUvTable, chunk::HaloBuffer},
};

/// A task that meshes one chunk from its halo snapshot.
pub struct ChunkMeshGenerationTask {
    /// The chunk being meshed
    position: Point3<i32>,
    /// The chunk's generation token when the build was started
    token: u64,
    /// Padded voxel snapshot of the chunk and its face neighbours
    halo: HaloBuffer,
    /// Shared atlas lookup
    uvs: Arc<BlockUvTable>,
}

impl ChunkMeshGenerationTask {
    /// Creates a new mesh generation task.
    ///
    /// # Arguments
    /// * `position` - The chunk coordinates of the chunk being meshed
    /// * `token` - The token the result must still match to be applied
    /// * `halo` - The padded voxel snapshot
    /// * `uvs` - The block to atlas rectangle lookup
    pub fn new(
        position: Point3<i32>,
        token: u64,
        halo: HaloBuffer,
        uvs: Arc<BlockUvTable>,
    ) -> Self {
        ChunkMeshGenerationTask {
            position,
            token,
            halo,
            uvs,
        }
    }

    /// The chunk this task meshes.
    pub fn position(&self) -> Point3<i32> {
        self.position
    }

    /// The generation token this build belongs to.
    pub fn token(&self) -> u64 {
        self.token
    }

    /// Runs the mesher.
    pub fn process(&self) -> ChunkMeshes {
        build_chunk_meshes(&self.halo, self.position, &self.uvs)
    }
}
