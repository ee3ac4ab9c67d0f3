//! Core engine types and utilities for the pumpkin toss loop.
//!
//! This crate provides the foundational types used across all engine systems:
//! - Transform and visual components
//! - Frame time and capped fixed-step accounting
//! - The keyed timer scheduler that replaces ad-hoc delay entities

pub mod components;
pub mod time;
pub mod timer;
pub mod transform;

pub use components::*;
pub use time::*;
pub use timer::*;
pub use transform::*;

// Re-export commonly used types
pub use glam::{Quat, Vec3};
pub use hecs::{Entity, World};
