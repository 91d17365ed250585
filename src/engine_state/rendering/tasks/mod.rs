//! Background tasks for the rendering system.
//!
//! # Available Tasks
//! - `ChunkMeshGenerationTask`: Meshes one chunk from its halo snapshot

pub mod chunk_mesh_generation_task;
