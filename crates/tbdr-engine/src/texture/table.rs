use bitflags::bitflags;

use crate::vram::{Resident, VramBlock};

use super::encode::{direct16_size, paletted4_size};

bitflags! {
    /// Creation hints for a texture.
    #[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Hash)]
    pub struct TextureFlags: u8 {
        /// Contents change often; always stored as direct 16-bit so partial
        /// updates stay possible, and never claims a palette bank.
        const DYNAMIC  = 1 << 0;
        /// Sample with bilinear filtering instead of point sampling.
        const BILINEAR = 1 << 1;
    }
}

/// Storage format of a texture in video memory.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum TextureFormat {
    /// ARGB4444, one 16-bit texel per pixel.
    Direct16,
    /// 4-bit indices into the 16-entry palette bank `palette`.
    Paletted4 { palette: u8 },
}

/// Stable external name of a texture: its slot index.
///
/// Compaction moves texture data, never slots, so a handle stays valid until
/// the texture is deleted.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct TextureHandle(u16);

impl TextureHandle {
    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// One slot of the texture table. Free iff `data` is `None`.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct TextureObject {
    pub width: u32,
    pub height: u32,
    pub format: TextureFormat,
    pub flags: TextureFlags,
    pub data: Option<VramBlock>,
}

impl Default for TextureObject {
    fn default() -> Self {
        Self {
            width: 0,
            height: 0,
            format: TextureFormat::Direct16,
            flags: TextureFlags::empty(),
            data: None,
        }
    }
}

impl TextureObject {
    #[inline]
    pub fn is_live(&self) -> bool {
        self.data.is_some()
    }

    /// Video-memory footprint in bytes.
    #[inline]
    pub fn byte_size(&self) -> usize {
        byte_size(self.width, self.height, self.format)
    }
}

#[inline]
pub(crate) fn byte_size(width: u32, height: u32, format: TextureFormat) -> usize {
    match format {
        TextureFormat::Direct16 => direct16_size(width, height),
        TextureFormat::Paletted4 { .. } => paletted4_size(width, height),
    }
}

impl Resident for TextureObject {
    #[inline]
    fn resident_block(&mut self) -> Option<&mut VramBlock> {
        self.data.as_mut()
    }
}

/// Fixed-capacity table of texture slots.
#[derive(Debug, Clone)]
pub struct TextureTable {
    slots: Vec<TextureObject>,
}

impl TextureTable {
    pub fn new(capacity: usize) -> Self {
        debug_assert!(capacity <= u16::MAX as usize + 1);
        Self {
            slots: vec![TextureObject::default(); capacity],
        }
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// First free slot.
    pub fn find_free(&self) -> Option<TextureHandle> {
        self.slots
            .iter()
            .position(|t| !t.is_live())
            .map(|i| TextureHandle(i as u16))
    }

    /// The texture named by `handle`, if live.
    #[inline]
    pub fn get(&self, handle: TextureHandle) -> Option<&TextureObject> {
        self.slots.get(handle.index()).filter(|t| t.is_live())
    }

    #[inline]
    pub fn get_mut(&mut self, handle: TextureHandle) -> Option<&mut TextureObject> {
        self.slots.get_mut(handle.index()).filter(|t| t.is_live())
    }

    /// Stores `tex` in the slot named by `handle`.
    #[inline]
    pub fn put(&mut self, handle: TextureHandle, tex: TextureObject) {
        self.slots[handle.index()] = tex;
    }

    /// Frees the slot and returns what it held.
    pub fn take(&mut self, handle: TextureHandle) -> Option<TextureObject> {
        let slot = self.slots.get_mut(handle.index())?;
        if !slot.is_live() {
            return None;
        }
        Some(std::mem::take(slot))
    }

    /// Every slot, live or not, for compaction.
    #[inline]
    pub fn slots_mut(&mut self) -> &mut [TextureObject] {
        &mut self.slots
    }

    pub fn live_count(&self) -> usize {
        self.slots.iter().filter(|t| t.is_live()).count()
    }
}
