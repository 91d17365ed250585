//! # Chunk Module
//!
//! This module provides the `Chunk` struct and related functionality for managing
//! 16x16x16 blocks of voxel data, together with the coordinate helpers that map
//! world positions onto chunks.
//!
//! ## Generation Tokens
//!
//! Every chunk carries a monotonic token. Each remesh request bumps it, and a
//! finished mesh build is only applied when the token it was started with is
//! still the chunk's current one. Unloading bumps it too, so a build that was
//! running while the chunk went away can never be attached.

use cgmath::{Point3, Vector3};
use log::debug;

use crate::engine_state::rendering::{meshing::ChunkMeshes, ChunkRenderer};

pub mod halo;
pub mod voxel_buffer;

pub use halo::HaloBuffer;
pub use voxel_buffer::VoxelBuffer;

/// The dimension (width, height, depth) of a chunk in blocks.
pub const CHUNK_DIMENSION: i32 = 16;
/// The number of blocks in a single 2D plane of a chunk (CHUNK_DIMENSION²).
pub const CHUNK_PLANE_SIZE: i32 = CHUNK_DIMENSION * CHUNK_DIMENSION;
/// The total number of blocks in a chunk (CHUNK_DIMENSION³).
pub const CHUNK_SIZE: i32 = CHUNK_PLANE_SIZE * CHUNK_DIMENSION;
/// Width of the neighbour shell around a chunk when meshing.
pub const HALO_WIDTH: i32 = 1;
/// The dimension of a chunk including the halo shell on each side.
pub const CHUNK_DIMENSION_WRAPPED: usize = (CHUNK_DIMENSION + 2 * HALO_WIDTH) as usize;
/// The number of blocks in a wrapped 2D chunk plane.
pub const CHUNK_PLANE_SIZE_WRAPPED: usize = CHUNK_DIMENSION_WRAPPED * CHUNK_DIMENSION_WRAPPED;
/// The total number of blocks in a wrapped chunk.
pub const CHUNK_SIZE_WRAPPED: usize = CHUNK_PLANE_SIZE_WRAPPED * CHUNK_DIMENSION_WRAPPED;

/// Splits a world block position into its chunk position and local coordinate.
///
/// # Examples
/// ```
/// use cgmath::Point3;
/// use voxel_streaming::engine_state::voxels::chunk::split_world_position;
///
/// let (chunk, local) = split_world_position(Point3::new(-1, 16, 5));
/// assert_eq!(chunk, Point3::new(-1, 1, 0));
/// assert_eq!(local, Point3::new(15, 0, 5));
/// ```
pub fn split_world_position(world: Point3<i32>) -> (Point3<i32>, Point3<usize>) {
    let chunk = world.map(|c| c.div_euclid(CHUNK_DIMENSION));
    let local = world.map(|c| c.rem_euclid(CHUNK_DIMENSION) as usize);
    (chunk, local)
}

/// The chunk containing a continuous (observer) position.
pub fn chunk_position_of(position: Point3<f32>) -> Point3<i32> {
    position.map(|c| (c / CHUNK_DIMENSION as f32).floor() as i32)
}

/// World position of a chunk's minimum corner.
pub fn chunk_origin(position: Point3<i32>) -> Point3<i32> {
    position * CHUNK_DIMENSION
}

/// World position of a chunk's center.
pub fn chunk_center(position: Point3<i32>) -> Point3<f32> {
    let half = CHUNK_DIMENSION as f32 / 2.0;
    let origin = chunk_origin(position);
    Point3::new(
        origin.x as f32 + half,
        origin.y as f32 + half,
        origin.z as f32 + half,
    )
}

/// Squared distance between two chunk positions, in chunk units.
pub fn chunk_distance_squared(a: Point3<i32>, b: Point3<i32>) -> i32 {
    let d: Vector3<i32> = a - b;
    d.x * d.x + d.y * d.y + d.z * d.z
}

/// Represents a 16x16x16 collection of voxel blocks in the world.
///
/// A chunk owns its voxels, zero or one applied mesh and its generation token.
/// Chunks are only created by the streaming manager once voxel data has arrived.
pub struct Chunk {
    /// The position of this chunk in chunk coordinates (not block coordinates).
    pub position: Point3<i32>,

    voxels: VoxelBuffer,

    /// Geometry currently handed to the renderer. `Some` with empty buffers means
    /// the chunk was meshed and simply has nothing to draw.
    meshes: Option<ChunkMeshes>,

    token: u64,

    /// Set when a remesh could not be queued (neighbours missing, build already
    /// running) and must be retried later.
    needs_remesh: bool,
}

impl Chunk {
    /// Creates a chunk around freshly generated voxel data.
    pub fn new(position: Point3<i32>, voxels: VoxelBuffer) -> Self {
        Chunk {
            position,
            voxels,
            meshes: None,
            token: 0,
            needs_remesh: false,
        }
    }

    /// The chunk's voxels.
    pub fn voxels(&self) -> &VoxelBuffer {
        &self.voxels
    }

    pub(crate) fn voxels_mut(&mut self) -> &mut VoxelBuffer {
        &mut self.voxels
    }

    /// The token a newly started mesh build must carry to be applied.
    pub fn current_token(&self) -> u64 {
        self.token
    }

    /// Invalidates every earlier request and returns the new token.
    ///
    /// The chunk has no handle on its manager; callers go through
    /// `ChunkStreamingManager::request_remesh`, which also (re)queues the job.
    pub fn request_remesh(&mut self) -> u64 {
        self.token += 1;
        self.token
    }

    /// Whether geometry has been applied since the chunk was created.
    pub fn has_mesh(&self) -> bool {
        self.meshes.is_some()
    }

    /// The applied geometry, if any.
    pub fn meshes(&self) -> Option<&ChunkMeshes> {
        self.meshes.as_ref()
    }

    /// Whether a deferred remesh is pending.
    pub fn needs_remesh(&self) -> bool {
        self.needs_remesh
    }

    pub(crate) fn set_needs_remesh(&mut self, needs_remesh: bool) {
        self.needs_remesh = needs_remesh;
    }

    /// Replaces the attached geometry.
    ///
    /// The previous buffers are detached from the renderer before the new ones are
    /// attached. Empty buffers are kept as "meshed, nothing to draw" and are never
    /// handed to the renderer. Only the manager calls this, after checking that
    /// the chunk is still in its table and that the build's token is current.
    pub fn apply_mesh(&mut self, meshes: ChunkMeshes, renderer: &mut dyn ChunkRenderer) {
        self.release_meshes(renderer);
        if !meshes.is_empty() {
            renderer.attach(self.position, &meshes);
        }
        self.meshes = Some(meshes);
    }

    /// Invalidates in-flight builds and releases attached geometry.
    pub fn unload(&mut self, renderer: &mut dyn ChunkRenderer) {
        self.token += 1;
        self.needs_remesh = false;
        self.release_meshes(renderer);
    }

    fn release_meshes(&mut self, renderer: &mut dyn ChunkRenderer) {
        if let Some(old) = self.meshes.take() {
            if old.is_empty() {
                return;
            }
            debug!("Releasing geometry of chunk {:?}", self.position);
            renderer.detach(self.position, old);
        }
    }
}
