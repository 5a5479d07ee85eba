//! Core engine types shared by the combat director and its hosts.
//!
//! This crate provides:
//! - Frame clock and remaining-time countdowns
//! - Common component types for ECS

pub mod components;
pub mod time;

pub use components::*;
pub use time::*;

// Re-export commonly used types
pub use glam::{Quat, Vec3};
pub use hecs::{Entity, World};
