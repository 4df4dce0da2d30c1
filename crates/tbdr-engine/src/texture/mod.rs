//! Texture storage: twiddled encoding, palette banks and the slot table.
//!
//! The texture unit only caches efficiently from twiddled (bit-interleaved)
//! layouts. Bitmaps with at most a handful of colors are stored as 4-bit
//! palette indices; everything else as ARGB4444.

mod bitmap;
pub mod encode;
mod palette;
mod store;
mod table;
mod twiddle;

pub use bitmap::Bitmap;
pub use palette::{PALETTE_BANK_ENTRIES, PALETTE_BANKS, Palette, PaletteTable};
pub use store::{TextureLimits, TextureStore};
pub use table::{TextureFlags, TextureFormat, TextureHandle, TextureObject, TextureTable};
pub use twiddle::Twiddle;
