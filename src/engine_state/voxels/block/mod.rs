//! # Block Module
//!
//! This module provides the core block-related functionality: the raw id type
//! stored in voxel buffers, block type definitions, block faces, and the
//! texture-atlas lookup the mesher consumes.

use std::collections::HashMap;

use block_type::BlockType;
use serde::{Deserialize, Serialize};

pub mod block_side;
pub mod block_type;

/// The underlying integer type used to represent blocks in voxel buffers.
pub type BlockId = u8;

/// The id of empty space.
pub const AIR: BlockId = BlockType::Air as BlockId;

/// A rectangle in texture-atlas space, `[0, 1]` on both axes, with a top-left
/// origin (`v0` is the top edge).
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize, bytemuck::Pod, bytemuck::Zeroable)]
pub struct UvRect {
    /// Left edge.
    pub u0: f32,
    /// Top edge.
    pub v0: f32,
    /// Right edge.
    pub u1: f32,
    /// Bottom edge.
    pub v1: f32,
}

impl UvRect {
    /// The whole texture.
    pub const FULL: UvRect = UvRect {
        u0: 0.0,
        v0: 0.0,
        u1: 1.0,
        v1: 1.0,
    };

    /// Creates a rectangle from its edges.
    pub fn new(u0: f32, v0: f32, u1: f32, v1: f32) -> Self {
        UvRect { u0, v0, u1, v1 }
    }
}

/// Maps block ids to their rectangle in the texture atlas.
///
/// Built once, then shared read-only with every meshing worker. Ids without an
/// entry map to [`UvRect::FULL`].
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct BlockUvTable {
    rects: HashMap<BlockId, UvRect>,
}

impl BlockUvTable {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Lays `block_count` square tiles out on a square grid (`ceil(sqrt(n))`
    /// columns), row-major, and records a rectangle for every non-air id.
    ///
    /// # Examples
    /// ```
    /// use voxel_streaming::engine_state::voxels::block::{BlockUvTable, UvRect};
    ///
    /// let table = BlockUvTable::grid_atlas(4);
    /// assert_eq!(table.get(1), UvRect::new(0.5, 0.0, 1.0, 0.5));
    /// ```
    pub fn grid_atlas(block_count: usize) -> Self {
        let mut table = BlockUvTable::new();
        if block_count == 0 {
            return table;
        }

        let columns = (block_count as f64).sqrt().ceil() as usize;
        let tile = 1.0 / columns as f32;

        for index in 0..block_count {
            let Ok(id) = BlockId::try_from(index) else {
                break;
            };
            if id == AIR {
                continue;
            }
            let u0 = (index % columns) as f32 * tile;
            let v0 = (index / columns) as f32 * tile;
            table.insert(id, UvRect::new(u0, v0, u0 + tile, v0 + tile));
        }

        table
    }

    /// Atlas layout for every [`BlockType`] this build knows.
    pub fn for_known_blocks() -> Self {
        Self::grid_atlas(BlockType::COUNT)
    }

    /// Sets the rectangle for `id`, returning the previous one.
    pub fn insert(&mut self, id: BlockId, rect: UvRect) -> Option<UvRect> {
        self.rects.insert(id, rect)
    }

    /// The rectangle for `id`, or the full texture if none was registered.
    pub fn get(&self, id: BlockId) -> UvRect {
        self.rects.get(&id).copied().unwrap_or(UvRect::FULL)
    }

    /// Number of registered ids.
    pub fn len(&self) -> usize {
        self.rects.len()
    }

    /// Whether no ids are registered.
    pub fn is_empty(&self) -> bool {
        self.rects.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grid_atlas_skips_air() {
        let table = BlockUvTable::for_known_blocks();
        assert_eq!(table.len(), BlockType::COUNT - 1);
        assert_eq!(table.get(AIR), UvRect::FULL);
    }

    #[test]
    fn grid_atlas_uses_square_layout() {
        // 6 tiles -> 3 columns, water (5) sits in row 1, column 2.
        let table = BlockUvTable::for_known_blocks();
        let water = table.get(BlockType::Water.id());
        let third = 1.0 / 3.0;
        assert!((water.u0 - 2.0 * third).abs() < 1e-6);
        assert!((water.v0 - third).abs() < 1e-6);
        assert!((water.u1 - 1.0).abs() < 1e-6);
        assert!((water.v1 - 2.0 * third).abs() < 1e-6);
    }

    #[test]
    fn unknown_ids_get_full_texture() {
        let table = BlockUvTable::new();
        assert!(table.is_empty());
        assert_eq!(table.get(42), UvRect::FULL);
    }
}
