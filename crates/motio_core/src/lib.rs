//! Motio core math
//!
//! The closed set of value types the tween engine can emit deltas for:
//! 2/3/4-component vectors, RGBA colors, and quaternion rotations.
//! Everything here is plain `f32` math with no external dependencies.

pub mod color;
pub mod quat;
pub mod vector;

pub use color::Color;
pub use quat::Quat;
pub use vector::{Vec2, Vec3, Vec4};
