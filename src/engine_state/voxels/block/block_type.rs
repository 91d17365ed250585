//! # Block Type Module
//!
//! This module defines the different types of blocks in the voxel world.
//! It provides functionality for block type identification and the transparency
//! rules the mesher relies on.

use num_derive::FromPrimitive;
use num_traits::FromPrimitive;

use super::BlockId;

/// Enumerates all known block types in the voxel world.
///
/// The discriminants are the block ids stored in voxel buffers. The
/// `FromPrimitive` derive allows conversion back from raw ids.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, FromPrimitive)]
#[repr(u8)]
pub enum BlockType {
    /// Empty space. Never meshed.
    Air = 0,

    /// Grass-topped soil.
    Grass = 1,

    /// Plain soil.
    Dirt = 2,

    /// Bedrock-like stone.
    Stone = 3,

    /// Beach sand.
    Sand = 4,

    /// Water. Transparent, meshed into the transparent buffer.
    Water = 5,
}

impl BlockType {
    /// Number of known block types, air included.
    pub const COUNT: usize = 6;

    /// Converts a raw id to a `BlockType`, or `None` for ids this build does not know.
    pub fn from_id(id: BlockId) -> Option<Self> {
        FromPrimitive::from_u8(id)
    }

    /// The raw id stored in voxel buffers.
    pub fn id(self) -> BlockId {
        self as BlockId
    }

    /// Whether light (and the eye) passes through this block.
    pub fn is_transparent(self) -> bool {
        matches!(self, BlockType::Air | BlockType::Water)
    }

    /// Lower-case name, as used for texture file names.
    pub fn name(self) -> &'static str {
        match self {
            BlockType::Air => "air",
            BlockType::Grass => "grass",
            BlockType::Dirt => "dirt",
            BlockType::Stone => "stone",
            BlockType::Sand => "sand",
            BlockType::Water => "water",
        }
    }
}

/// Transparency of a raw block id. Unknown ids count as opaque.
pub fn is_transparent(id: BlockId) -> bool {
    BlockType::from_id(id).is_some_and(BlockType::is_transparent)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_round_trip_for_known_types() {
        for id in 0..BlockType::COUNT as BlockId {
            let block_type = BlockType::from_id(id).unwrap();
            assert_eq!(block_type.id(), id);
        }
        assert_eq!(BlockType::from_id(200), None);
    }

    #[test]
    fn only_air_and_water_are_transparent() {
        assert!(is_transparent(BlockType::Air.id()));
        assert!(is_transparent(BlockType::Water.id()));
        assert!(!is_transparent(BlockType::Stone.id()));
        assert!(!is_transparent(BlockType::Grass.id()));
        assert!(!is_transparent(250));
    }
}
