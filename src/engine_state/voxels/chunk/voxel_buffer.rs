//! Flat per-chunk voxel storage.

use crate::engine_state::{
    error::StreamingError,
    voxels::block::{BlockId, AIR},
};

use super::{CHUNK_DIMENSION, CHUNK_PLANE_SIZE, CHUNK_SIZE};

/// The block ids of one chunk, stored flat as `x + y*S + z*S²`.
///
/// The length is fixed at [`CHUNK_SIZE`]. A buffer is owned by exactly one
/// chunk and only changes through the streaming manager's block-write API.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VoxelBuffer {
    blocks: Vec<BlockId>,
}

impl VoxelBuffer {
    /// A chunk full of air.
    pub fn empty() -> Self {
        VoxelBuffer {
            blocks: vec![AIR; CHUNK_SIZE as usize],
        }
    }

    /// Wraps raw data, checking it holds exactly one id per block.
    pub fn from_vec(blocks: Vec<BlockId>) -> Result<Self, StreamingError> {
        if blocks.len() != CHUNK_SIZE as usize {
            return Err(StreamingError::VoxelBufferLength {
                expected: CHUNK_SIZE as usize,
                actual: blocks.len(),
            });
        }
        Ok(VoxelBuffer { blocks })
    }

    /// Flat index of a local coordinate.
    ///
    /// # Panics
    /// Debug builds assert that every coordinate is below [`CHUNK_DIMENSION`].
    #[inline]
    pub fn index(x: usize, y: usize, z: usize) -> usize {
        debug_assert!(x < CHUNK_DIMENSION as usize);
        debug_assert!(y < CHUNK_DIMENSION as usize);
        debug_assert!(z < CHUNK_DIMENSION as usize);
        x + y * CHUNK_DIMENSION as usize + z * CHUNK_PLANE_SIZE as usize
    }

    /// The block at a local coordinate.
    #[inline]
    pub fn get(&self, x: usize, y: usize, z: usize) -> BlockId {
        self.blocks[Self::index(x, y, z)]
    }

    /// Overwrites the block at a local coordinate, returning the previous id.
    #[inline]
    pub fn set(&mut self, x: usize, y: usize, z: usize, id: BlockId) -> BlockId {
        std::mem::replace(&mut self.blocks[Self::index(x, y, z)], id)
    }

    /// Whether every cell is air.
    pub fn is_all_air(&self) -> bool {
        self.blocks.iter().all(|&id| id == AIR)
    }

    /// The raw cells.
    pub fn as_slice(&self) -> &[BlockId] {
        &self.blocks
    }
}

impl Default for VoxelBuffer {
    fn default() -> Self {
        Self::empty()
    }
}
