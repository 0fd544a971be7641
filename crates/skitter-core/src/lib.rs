//! Skitter Core - Shared types for the Skitter movement core
//!
//! This crate provides the foundational types used throughout the workspace:
//! - Mathematical primitives (re-exported from glam)
//! - Entity identity for level objects
//! - Frame time and fixed-step accumulation

pub mod time;
pub mod types;

pub use glam::{Vec2, Vec3};
pub use time::{GameTime, TimeConfig};
pub use types::EntityId;
