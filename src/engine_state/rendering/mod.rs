//! Rendering boundary of the streaming core.
//!
//! The core never draws anything. It produces mesh buffers and hands them to a
//! [`ChunkRenderer`], which owns whatever scene or GPU resources back them. The
//! contract is two calls: attach a chunk's geometry, and detach (dispose) it.
//!
//! This module also contains the meshing service and its worker task.

use std::collections::HashMap;

use cgmath::Point3;
use log::trace;

pub mod meshing;
pub mod tasks;

use meshing::ChunkMeshes;

/// Receives chunk geometry from the streaming manager.
///
/// Every `attach` for a position is followed by exactly one `detach` for the same
/// position before the next `attach`. Empty meshes are never attached.
pub trait ChunkRenderer {
    /// Adds a chunk's geometry to the scene at the chunk's transform.
    fn attach(&mut self, position: Point3<i32>, meshes: &ChunkMeshes);

    /// Removes a chunk's geometry and disposes of it. Ownership of the buffers
    /// passes to the renderer so it can release them immediately.
    fn detach(&mut self, position: Point3<i32>, meshes: ChunkMeshes);
}

/// A renderer that discards everything, for headless use.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullRenderer;

impl ChunkRenderer for NullRenderer {
    fn attach(&mut self, _position: Point3<i32>, _meshes: &ChunkMeshes) {}

    fn detach(&mut self, _position: Point3<i32>, _meshes: ChunkMeshes) {}
}

/// A renderer that keeps the currently attached geometry in memory and counts
/// every attach and detach per chunk.
#[derive(Debug, Default)]
pub struct RecordingRenderer {
    attached: HashMap<Point3<i32>, ChunkMeshes>,
    attaches: HashMap<Point3<i32>, usize>,
    detaches: HashMap<Point3<i32>, usize>,
}

impl RecordingRenderer {
    /// Creates an empty renderer.
    pub fn new() -> Self {
        Self::default()
    }

    /// The geometry currently attached for `position`.
    pub fn attached(&self, position: Point3<i32>) -> Option<&ChunkMeshes> {
        self.attached.get(&position)
    }

    /// Whether `position` currently has geometry in the scene.
    pub fn is_attached(&self, position: Point3<i32>) -> bool {
        self.attached.contains_key(&position)
    }

    /// Number of chunks with geometry in the scene.
    pub fn attached_len(&self) -> usize {
        self.attached.len()
    }

    /// Total number of attaches for `position` so far.
    pub fn attach_count(&self, position: Point3<i32>) -> usize {
        self.attaches.get(&position).copied().unwrap_or(0)
    }

    /// Total number of detaches for `position` so far.
    pub fn detach_count(&self, position: Point3<i32>) -> usize {
        self.detaches.get(&position).copied().unwrap_or(0)
    }

    /// Total number of attaches across all chunks.
    pub fn total_attaches(&self) -> usize {
        self.attaches.values().sum()
    }

    /// Total number of detaches across all chunks.
    pub fn total_detaches(&self) -> usize {
        self.detaches.values().sum()
    }

    /// Sum of vertices across all attached geometry.
    pub fn vertex_count(&self) -> usize {
        self.attached
            .values()
            .map(|m| m.opaque.vertex_count() + m.transparent.vertex_count())
            .sum()
    }
}

impl ChunkRenderer for RecordingRenderer {
    fn attach(&mut self, position: Point3<i32>, meshes: &ChunkMeshes) {
        trace!("Attaching chunk {:?}", position);
        *self.attaches.entry(position).or_default() += 1;
        self.attached.insert(position, meshes.clone());
    }

    fn detach(&mut self, position: Point3<i32>, _meshes: ChunkMeshes) {
        trace!("Detaching chunk {:?}", position);
        *self.detaches.entry(position).or_default() += 1;
        self.attached.remove(&position);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine_state::{
        rendering::meshing::MeshBuffers,
        voxels::block::{block_side::BlockSide, UvRect},
    };

    #[test]
    fn recording_renderer_tracks_scene() {
        let mut opaque = MeshBuffers::default();
        opaque.push_face(BlockSide::Left, [0.0; 3], UvRect::FULL);
        let meshes = ChunkMeshes {
            opaque,
            transparent: MeshBuffers::default(),
        };
        let position = Point3::new(1, 2, 3);
        let mut renderer = RecordingRenderer::new();

        renderer.attach(position, &meshes);
        assert_eq!(renderer.attached(position), Some(&meshes));
        assert_eq!(renderer.vertex_count(), 4);

        renderer.detach(position, meshes);
        assert!(!renderer.is_attached(position));
        assert_eq!(renderer.attach_count(position), 1);
        assert_eq!(renderer.detach_count(position), 1);
        assert_eq!(renderer.total_attaches(), 1);
        assert_eq!(renderer.total_detaches(), 1);
        assert_eq!(renderer.attached_len(), 0);
    }
}
