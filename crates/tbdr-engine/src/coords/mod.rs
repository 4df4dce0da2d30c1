//! Coordinate and transform types.
//!
//! Canonical spaces:
//! - framebuffer pixels, origin top-left, +X right, +Y down
//! - clip space produced by the projection matrices, +Y up
//!
//! The viewport matrix bridges the two.

mod matrix;
mod rect;
mod viewport;

pub use matrix::{Matrix, PERSPECTIVE_Z_NEAR, Perspective, Vec4};
pub use rect::Rect;
pub use viewport::Viewport;
