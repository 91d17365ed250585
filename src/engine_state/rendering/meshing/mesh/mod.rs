//! Mesh generation for voxel rendering.
//!
//! This module converts halo voxel buffers into GPU-friendly vertex and index
//! arrays with per-face culling.
//!
//! # Architecture
//! - [`MeshBuffers`]: one draw call's positions, normals, UVs and indices
//! - [`ChunkMeshes`]: the opaque and transparent buffers of one chunk
//! - [`is_face_visible`]: the culling rule between a block and its neighbour
//! - [`build_chunk_meshes`]: the mesher itself
//!
//! # Usage
//! ```
//! use cgmath::Point3;
//! use voxel_streaming::engine_state::{
//!     rendering::meshing::build_chunk_meshes,
//!     voxels::{block::BlockUvTable, chunk::{HaloBuffer, VoxelBuffer}},
//! };
//!
//! let mut voxels = VoxelBuffer::empty();
//! voxels.set(8, 8, 8, 3);
//! let halo = HaloBuffer::assemble(&voxels, [None; 6]);
//! let meshes = build_chunk_meshes(&halo, Point3::new(0, 0, 0), &BlockUvTable::for_known_blocks());
//! assert_eq!(meshes.opaque.indices.len(), 36);
//! ```

mod face;
#[allow(clippy::module_inception)]
mod mesh;

pub use face::is_face_visible;
pub use mesh::*;
