//! Halo ("wrapped") voxel buffers.
//!
//! A halo buffer is a chunk's voxels surrounded by a `HALO_WIDTH` shell of its
//! face neighbours' voxels, so the mesher can cull faces across chunk borders
//! without touching the chunk table. It is assembled on the orchestrating thread,
//! moved into a mesh job and dropped when the job finishes.

use cgmath::Vector3;

use crate::engine_state::voxels::block::{block_side::BlockSide, BlockId, AIR};

use super::{voxel_buffer::VoxelBuffer, CHUNK_DIMENSION, CHUNK_DIMENSION_WRAPPED, HALO_WIDTH};

/// A padded copy of one chunk plus the border cells of its six face neighbours.
///
/// Indexed as `x + y*D + z*D²` with `D = CHUNK_DIMENSION_WRAPPED`; padded
/// coordinate `HALO_WIDTH` is local coordinate 0.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HaloBuffer {
    blocks: Vec<BlockId>,
}

impl HaloBuffer {
    /// Builds the padded buffer for `center`.
    ///
    /// `neighbors` is ordered like [`BlockSide::all`]. Cells that belong to a
    /// missing neighbour, or that lie off more than one face (edges and corners of
    /// the shell), are air.
    pub fn assemble(center: &VoxelBuffer, neighbors: [Option<&VoxelBuffer>; 6]) -> Self {
        let dimension = CHUNK_DIMENSION_WRAPPED;
        let mut blocks = vec![AIR; dimension * dimension * dimension];

        for pz in 0..dimension {
            for py in 0..dimension {
                for px in 0..dimension {
                    let local = Vector3::new(
                        px as i32 - HALO_WIDTH,
                        py as i32 - HALO_WIDTH,
                        pz as i32 - HALO_WIDTH,
                    );
                    blocks[px + py * dimension + pz * dimension * dimension] =
                        Self::resolve(center, &neighbors, local);
                }
            }
        }

        HaloBuffer { blocks }
    }

    fn resolve(
        center: &VoxelBuffer,
        neighbors: &[Option<&VoxelBuffer>; 6],
        local: Vector3<i32>,
    ) -> BlockId {
        let step = local.map(|c| c.div_euclid(CHUNK_DIMENSION));
        let wrapped = local.map(|c| c.rem_euclid(CHUNK_DIMENSION) as usize);

        if step == Vector3::new(0, 0, 0) {
            return center.get(wrapped.x, wrapped.y, wrapped.z);
        }

        let Some(side) = BlockSide::from_offset(step) else {
            return AIR;
        };

        match neighbors[side as usize] {
            Some(neighbor) => neighbor.get(wrapped.x, wrapped.y, wrapped.z),
            None => AIR,
        }
    }

    /// Edge length of the padded cube.
    pub fn dimension(&self) -> usize {
        CHUNK_DIMENSION_WRAPPED
    }

    /// The block at a padded coordinate.
    #[inline]
    pub fn get(&self, x: usize, y: usize, z: usize) -> BlockId {
        let dimension = CHUNK_DIMENSION_WRAPPED;
        self.blocks[x + y * dimension + z * dimension * dimension]
    }

    /// The raw padded cells.
    pub fn as_slice(&self) -> &[BlockId] {
        &self.blocks
    }
}
