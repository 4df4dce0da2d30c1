use std::fmt;

/// High-level response returned when a frame starts.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum FrameHint {
    /// Render as usual.
    Continue,
    /// The hardware ran out of room for binned primitives last frame; the caller
    /// should shrink its working set (e.g. view distance) before drawing.
    ReduceWorkingSet,
}

/// Failure of the video-memory heap.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum VramError {
    /// No contiguous run of free pages was found, even after compaction.
    OutOfMemory { requested: usize, free: usize },
    /// The request is larger than the whole heap.
    TooLarge { requested: usize, capacity: usize },
}

impl fmt::Display for VramError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VramError::OutOfMemory { requested, free } => write!(
                f,
                "out of video memory: {requested} bytes requested, {free} bytes free"
            ),
            VramError::TooLarge { requested, capacity } => write!(
                f,
                "allocation of {requested} bytes exceeds video memory capacity of {capacity} bytes"
            ),
        }
    }
}

impl std::error::Error for VramError {}

/// Failure of a texture management call.
///
/// Creation never leaves partial state behind: on any error the slot table,
/// palette table and page table are exactly as they were.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum TextureError {
    /// Width or height outside the supported range, or footprint too large.
    InvalidSize { width: u32, height: u32 },
    /// The hardware only samples power-of-two textures.
    NotPowerOfTwo { width: u32, height: u32 },
    /// The bitmap's pixel slice is shorter than its dimensions claim.
    BitmapTooSmall,
    /// Every texture slot is in use.
    NoFreeSlot,
    /// The heap could not supply storage.
    OutOfVram(VramError),
    /// Paletted textures cannot be updated after creation.
    Immutable,
    /// The patch does not fit inside the texture.
    OutOfBounds,
    /// The handle does not name a live texture.
    UnknownHandle,
}

impl fmt::Display for TextureError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TextureError::InvalidSize { width, height } => {
                write!(f, "unsupported texture size {width}x{height}")
            }
            TextureError::NotPowerOfTwo { width, height } => {
                write!(f, "texture size {width}x{height} is not a power of two")
            }
            TextureError::BitmapTooSmall => {
                f.write_str("bitmap pixels do not cover its dimensions")
            }
            TextureError::NoFreeSlot => f.write_str("texture table is full"),
            TextureError::OutOfVram(e) => write!(f, "{e}"),
            TextureError::Immutable => f.write_str("paletted textures cannot be updated"),
            TextureError::OutOfBounds => f.write_str("update region lies outside the texture"),
            TextureError::UnknownHandle => f.write_str("texture handle is not live"),
        }
    }
}

impl std::error::Error for TextureError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TextureError::OutOfVram(e) => Some(e),
            _ => None,
        }
    }
}

impl From<VramError> for TextureError {
    fn from(e: VramError) -> Self {
        TextureError::OutOfVram(e)
    }
}
