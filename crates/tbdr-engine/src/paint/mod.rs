//! Color packing shared by the texture encoder and vertex formats.

pub mod color;

pub use color::{BitmapCol, PackedCol};
