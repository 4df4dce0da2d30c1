//! Render state, quad expansion and the graphics device context.
//!
//! Geometry is sorted into three command lists by blend/alpha-test state and
//! handed to the tile accelerator in priority order at the end of the frame.
//! One list can be designated "direct" and is streamed per draw instead.

mod buffers;
mod gfx;
mod state;
mod vertex;

pub use buffers::{BufferTable, IbHandle, VbHandle, VbUsage};
pub use gfx::{Gfx, MatrixType};
pub use state::{FogMode, FogTable, RenderState, StateTracker};
pub use vertex::{
    QuadTransform, SourceVertex, VertexColoured, VertexFormat, VertexTextured, expand_quads,
};
