use crate::engine_state::voxels::block::{block_type::is_transparent, BlockId, AIR};

/// Decides whether the face between `block` and its `neighbor` is drawn.
///
/// A face is visible when the neighbour is air, or when the neighbour is a
/// transparent block of a *different* id. Two cells of the same transparent
/// medium (water next to water) share no face.
///
/// `block` is assumed to be non-air; the mesher skips air cells before asking.
#[inline]
pub fn is_face_visible(block: BlockId, neighbor: BlockId) -> bool {
    neighbor == AIR || (neighbor != block && is_transparent(neighbor))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine_state::voxels::block::block_type::BlockType;

    #[test]
    fn culling_rules() {
        let stone = BlockType::Stone.id();
        let dirt = BlockType::Dirt.id();
        let water = BlockType::Water.id();

        assert!(is_face_visible(stone, AIR));
        assert!(!is_face_visible(stone, dirt));
        assert!(!is_face_visible(stone, stone));
        assert!(is_face_visible(stone, water));
        assert!(!is_face_visible(water, water));
        assert!(is_face_visible(water, AIR));
        assert!(!is_face_visible(water, stone));
    }
}
