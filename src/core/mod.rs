//! # Core Module
//!
//! Shared ownership primitives used throughout the crate.
//!
//! ## Key Components
//! - `StResource`: Single-threaded reference-counted resource with interior mutability
//!   and identity comparison
//!
//! The streaming orchestrator runs on one thread, so chunk handles never need
//! atomic reference counting or locking. Worker threads only ever receive owned
//! snapshots (see `engine_state::task_management`).

pub mod st_resource;

pub use st_resource::StResource;
