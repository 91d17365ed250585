//! # Block Side Module
//!
//! This module defines the six faces of a voxel block, the direction each one
//! faces and the corners of its unit quad.

use cgmath::{Point3, Vector3};

/// Represents the six possible faces of a voxel block.
///
/// The order is: [Right, Left, Top, Bottom, Front, Back], i.e. +X, -X, +Y, -Y,
/// +Z, -Z. Meshing and halo assembly both iterate sides in this order.
#[derive(PartialEq, Eq, Hash, Copy, Clone, Debug)]
pub enum BlockSide {
    /// The face pointing towards positive X.
    Right = 0,

    /// The face pointing towards negative X.
    Left = 1,

    /// The face pointing towards positive Y.
    Top = 2,

    /// The face pointing towards negative Y.
    Bottom = 3,

    /// The face pointing towards positive Z.
    Front = 4,

    /// The face pointing towards negative Z.
    Back = 5,
}

/// Quad corners per side on the unit cube, counter-clockwise when viewed from
/// outside. Indexed by `BlockSide as usize`.
const FACE_CORNERS: [[[f32; 3]; 4]; 6] = [
    [[1.0, 0.0, 0.0], [1.0, 1.0, 0.0], [1.0, 1.0, 1.0], [1.0, 0.0, 1.0]],
    [[0.0, 0.0, 1.0], [0.0, 1.0, 1.0], [0.0, 1.0, 0.0], [0.0, 0.0, 0.0]],
    [[0.0, 1.0, 1.0], [1.0, 1.0, 1.0], [1.0, 1.0, 0.0], [0.0, 1.0, 0.0]],
    [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [1.0, 0.0, 1.0], [0.0, 0.0, 1.0]],
    [[0.0, 0.0, 1.0], [1.0, 0.0, 1.0], [1.0, 1.0, 1.0], [0.0, 1.0, 1.0]],
    [[1.0, 0.0, 0.0], [0.0, 0.0, 0.0], [0.0, 1.0, 0.0], [1.0, 1.0, 0.0]],
];

impl BlockSide {
    /// Returns an array containing all six block faces in a consistent order.
    pub fn all() -> [BlockSide; 6] {
        [
            BlockSide::Right,
            BlockSide::Left,
            BlockSide::Top,
            BlockSide::Bottom,
            BlockSide::Front,
            BlockSide::Back,
        ]
    }

    /// Unit step from a cell (or chunk) to its neighbour across this face.
    pub fn offset(self) -> Vector3<i32> {
        match self {
            BlockSide::Right => Vector3::new(1, 0, 0),
            BlockSide::Left => Vector3::new(-1, 0, 0),
            BlockSide::Top => Vector3::new(0, 1, 0),
            BlockSide::Bottom => Vector3::new(0, -1, 0),
            BlockSide::Front => Vector3::new(0, 0, 1),
            BlockSide::Back => Vector3::new(0, 0, -1),
        }
    }

    /// Outward normal of the face.
    pub fn normal(self) -> [f32; 3] {
        let offset = self.offset();
        [offset.x as f32, offset.y as f32, offset.z as f32]
    }

    /// The four quad corners, relative to the block's minimum corner.
    pub fn corners(self) -> [[f32; 3]; 4] {
        FACE_CORNERS[self as usize]
    }

    /// The position reached by stepping once across this face.
    pub fn neighbor_of(self, position: Point3<i32>) -> Point3<i32> {
        position + self.offset()
    }

    /// The side for a single-axis step, e.g. `(0, -1, 0)` is `Bottom`.
    pub fn from_offset(offset: Vector3<i32>) -> Option<BlockSide> {
        BlockSide::all()
            .into_iter()
            .find(|side| side.offset() == offset)
    }
}
