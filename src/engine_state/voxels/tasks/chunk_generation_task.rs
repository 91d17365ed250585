//! # Chunk Generation Task
//!
//! This module defines the `ChunkGenerationTask` which fills one chunk's voxel
//! buffer from a terrain sampler on a worker thread. The task owns everything
//! it reads, so the orchestrating thread keeps no borrow on it.

use std::sync::Arc;

use cgmath::Point3;

use crate::engine_state::voxels::{
    chunk::{chunk_origin, VoxelBuffer},
    terrain::TerrainSampler,
};

/// A task that generates the voxels of a single chunk.
#[derive(Clone)]
pub struct ChunkGenerationTask {
    /// The position of the chunk to generate (in chunk coordinates)
    position: Point3<i32>,
    /// World seed handed to the sampler
    seed: u32,
    /// Identifies the load request this task answers
    request: u64,
    /// The terrain function, shared by every generation worker
    sampler: Arc<dyn TerrainSampler>,
}

impl ChunkGenerationTask {
    /// Creates a new chunk generation task.
    ///
    /// # Arguments
    /// * `position` - The chunk coordinates of the chunk to generate
    /// * `seed` - The world seed
    /// * `sampler` - The terrain function to sample every cell with
    pub fn new(position: Point3<i32>, seed: u32, sampler: Arc<dyn TerrainSampler>) -> Self {
        ChunkGenerationTask {
            position,
            seed,
            request: 0,
            sampler,
        }
    }

    /// Tags the task with the id of the load request it answers. The id is
    /// echoed back in the result.
    pub fn with_request(mut self, request: u64) -> Self {
        self.request = request;
        self
    }

    /// The load request this task answers.
    pub fn request(&self) -> u64 {
        self.request
    }

    /// The chunk this task generates.
    pub fn position(&self) -> Point3<i32> {
        self.position
    }

    /// Samples every cell of the chunk.
    ///
    /// # Returns
    /// The chunk's voxels. Identical `(seed, position)` pairs always give
    /// identical buffers as long as the sampler is deterministic.
    pub fn process(&self) -> VoxelBuffer {
        let mut voxels = VoxelBuffer::empty();
        self.sampler
            .sample_chunk(self.seed, chunk_origin(self.position), &mut voxels);
        voxels
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine_state::voxels::{block::BlockId, terrain::NoiseTerrain};

    #[test]
    fn samples_world_coordinates() {
        let sampler: Arc<dyn TerrainSampler> = Arc::new(|_seed: u32, x: i32, y: i32, _z: i32| -> BlockId {
            if x == -16 && y == 17 {
                3
            } else {
                0
            }
        });
        let voxels = ChunkGenerationTask::new(Point3::new(-1, 1, 0), 0, sampler).process();

        assert_eq!(voxels.get(0, 1, 0), 3);
        assert_eq!(voxels.get(0, 1, 15), 3);
        assert_eq!(voxels.get(1, 1, 0), 0);
    }

    #[test]
    fn generation_is_deterministic() {
        let sampler: Arc<dyn TerrainSampler> = Arc::new(NoiseTerrain::new(11));
        let mut rng = fastrand::Rng::with_seed(99);

        for _ in 0..8 {
            let position = Point3::new(rng.i32(-20..20), rng.i32(-2..3), rng.i32(-20..20));
            let first = ChunkGenerationTask::new(position, 11, sampler.clone()).process();
            let second = ChunkGenerationTask::new(position, 11, sampler.clone()).process();
            assert_eq!(first, second);
        }
    }

    #[test]
    fn seed_reaches_the_sampler() {
        let sampler: Arc<dyn TerrainSampler> =
            Arc::new(|seed: u32, _x: i32, _y: i32, _z: i32| seed as BlockId);
        let voxels = ChunkGenerationTask::new(Point3::new(0, 0, 0), 4, sampler).process();
        assert!(voxels.as_slice().iter().all(|&id| id == 4));
    }
}
