//! # Voxel Task System
//!
//! Tasks related to voxel world generation, run on the generation worker pool.

pub mod chunk_generation_task;
