//! Hardware seam and device-wide configuration.
//!
//! [`DeviceInit`] holds the hardware policy constants, [`TileAccelerator`] is
//! the interface the renderer drives, and [`RecordingDriver`] is an
//! in-memory implementation of it.

mod driver;
mod error;
mod init;
mod recording;

pub use driver::TileAccelerator;
pub use error::{FrameHint, TextureError, VramError};
pub use init::DeviceInit;
pub use recording::{
    DriverEvent, ListSubmission, PALETTE_RAM_ENTRIES, RecordingDriver, format_bits, header_bits,
};
