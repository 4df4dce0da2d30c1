//! Rendering backend for a tile-based deferred GPU.
//!
//! The crate owns everything between a game's draw calls and the tile
//! accelerator: the texture heap and its twiddled encoders, the three
//! command lists, render-state tracking and per-frame submission.
//!
//! [`render::Gfx`] is the entry point; it is generic over the hardware seam
//! [`device::TileAccelerator`].

pub mod cmdlist;
pub mod coords;
pub mod device;
pub mod logging;
pub mod paint;
pub mod render;
pub mod texture;
pub mod vram;
