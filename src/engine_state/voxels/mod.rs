//! # Voxel Streaming Core
//!
//! This module contains the voxel data model and the machinery that streams it
//! around an observer.
//!
//! ## Architecture
//!
//! * **Block**: block ids, block faces and the texture-atlas lookup
//! * **Chunk**: 16x16x16 voxel buffers, halo snapshots and per-chunk mesh state
//! * **Terrain**: the deterministic samplers chunks are generated from
//! * **Generation**: the worker pool that fills voxel buffers
//! * **Remesh queue**: pending mesh builds, deduplicated per chunk
//! * **World**: the `ChunkStreamingManager` that ties everything together
//!
//! ## Data Flow
//!
//! 1. The manager decides which chunks must exist around the observer
//! 2. Missing chunks are requested from the generation pool
//! 3. Arriving voxels become chunks, which queue mesh builds for themselves and
//!    for neighbours they unblock
//! 4. A budgeted pump sends halo snapshots to the meshing pool
//! 5. Fresh results are applied and published to the renderer; stale ones are
//!    dropped

pub mod block;
pub mod chunk;
pub mod generation;
pub mod remesh_queue;
pub mod tasks;
pub mod terrain;
pub mod world;
