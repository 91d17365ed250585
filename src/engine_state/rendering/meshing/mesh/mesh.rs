//! Mesh data structures and the face-culling mesher.
//!
//! This module turns a halo voxel buffer into two independent sets of GPU-ready
//! arrays: one for opaque blocks and one for transparent blocks.

use cgmath::Point3;

use crate::engine_state::voxels::{
    block::{block_side::BlockSide, block_type::is_transparent, BlockUvTable, UvRect, AIR},
    chunk::{chunk_origin, HaloBuffer, CHUNK_DIMENSION, HALO_WIDTH},
};

use super::face::is_face_visible;

/// Vertex and index arrays for one draw call.
///
/// Positions and normals hold three floats per vertex, UVs two. Every face adds
/// four vertices and six indices.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MeshBuffers {
    /// Vertex positions in world space.
    pub positions: Vec<f32>,
    /// Per-vertex face normals.
    pub normals: Vec<f32>,
    /// Per-vertex texture coordinates, bottom-left origin.
    pub uvs: Vec<f32>,
    /// Triangle list indices.
    pub indices: Vec<u32>,
}

impl MeshBuffers {
    /// Whether there is nothing to draw.
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Number of vertices.
    pub fn vertex_count(&self) -> usize {
        self.positions.len() / 3
    }

    /// Number of quads (faces).
    pub fn face_count(&self) -> usize {
        self.indices.len() / 6
    }

    /// Appends one unit quad for `side` of the block whose minimum corner is `base`.
    ///
    /// The atlas rectangle uses a top-left origin; V is flipped so the emitted
    /// coordinates have a bottom-left origin.
    pub fn push_face(&mut self, side: BlockSide, base: [f32; 3], rect: UvRect) {
        let first = self.vertex_count() as u32;
        let normal = side.normal();

        let (u0, u1) = (rect.u0, rect.u1);
        let (v0, v1) = (1.0 - rect.v1, 1.0 - rect.v0);
        let quad_uvs = [[u1, v1], [u1, v0], [u0, v0], [u0, v1]];

        for (corner, uv) in side.corners().iter().zip(quad_uvs) {
            self.positions.extend_from_slice(&[
                base[0] + corner[0],
                base[1] + corner[1],
                base[2] + corner[2],
            ]);
            self.normals.extend_from_slice(&normal);
            self.uvs.extend_from_slice(&uv);
        }

        self.indices
            .extend_from_slice(&[first, first + 1, first + 2, first, first + 2, first + 3]);
    }

    /// Positions as raw bytes, ready for a vertex buffer upload.
    pub fn position_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.positions)
    }

    /// Normals as raw bytes.
    pub fn normal_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.normals)
    }

    /// Texture coordinates as raw bytes.
    pub fn uv_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.uvs)
    }

    /// Indices as raw bytes, ready for an index buffer upload.
    pub fn index_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.indices)
    }
}

/// The two draw calls a chunk contributes: opaque and transparent geometry.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ChunkMeshes {
    /// Faces of opaque blocks.
    pub opaque: MeshBuffers,
    /// Faces of transparent blocks (water).
    pub transparent: MeshBuffers,
}

impl ChunkMeshes {
    /// Whether neither buffer has any faces.
    pub fn is_empty(&self) -> bool {
        self.opaque.is_empty() && self.transparent.is_empty()
    }
}

/// Meshes the inner region of a halo buffer.
///
/// Every non-air cell emits one quad per visible face (see [`is_face_visible`]),
/// placed at the chunk's world origin. Faces go to the opaque or transparent
/// buffer depending on the *emitting* block.
pub fn build_chunk_meshes(
    halo: &HaloBuffer,
    chunk_position: Point3<i32>,
    uvs: &BlockUvTable,
) -> ChunkMeshes {
    let mut meshes = ChunkMeshes::default();
    let origin = chunk_origin(chunk_position);
    let inner = HALO_WIDTH as usize..(HALO_WIDTH + CHUNK_DIMENSION) as usize;

    for z in inner.clone() {
        for y in inner.clone() {
            for x in inner.clone() {
                let block = halo.get(x, y, z);
                if block == AIR {
                    continue;
                }

                let target = if is_transparent(block) {
                    &mut meshes.transparent
                } else {
                    &mut meshes.opaque
                };
                let base = [
                    (origin.x + x as i32 - HALO_WIDTH) as f32,
                    (origin.y + y as i32 - HALO_WIDTH) as f32,
                    (origin.z + z as i32 - HALO_WIDTH) as f32,
                ];

                for side in BlockSide::all() {
                    let offset = side.offset();
                    let neighbor = halo.get(
                        (x as i32 + offset.x) as usize,
                        (y as i32 + offset.y) as usize,
                        (z as i32 + offset.z) as usize,
                    );
                    if is_face_visible(block, neighbor) {
                        target.push_face(side, base, uvs.get(block));
                    }
                }
            }
        }
    }

    meshes
}
