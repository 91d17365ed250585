//! # Engine State Module
//!
//! Everything the streaming core is made of.
//!
//! ## Key Components
//!
//! * `config` - Runtime tunables and their JSON loading
//! * `error` - The subsystem's error type
//! * `rendering` - The renderer boundary, the mesher and the meshing pool
//! * `task_management` - Worker pools and the messages they exchange
//! * `voxels` - Voxel data, terrain generation and the streaming manager

pub mod config;
pub mod error;
pub mod rendering;
pub mod task_management;
pub mod voxels;
