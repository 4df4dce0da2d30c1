use crate::cmdlist::ListType;

/// Creation parameters for a graphics device context.
///
/// Every value here is a policy constant of the target hardware. Keeping them
/// in one block lets tests build a context over a tiny synthetic arena.
#[derive(Debug, Clone)]
pub struct DeviceInit {
    /// Bytes of video memory the driver reports as available.
    pub vram_bytes: usize,

    /// Bytes left to the driver for its own use (vertex bins, palettes).
    pub vram_reserved: usize,

    /// Allocation granularity of the texture heap.
    ///
    /// The texture cache works best when no two textures share a page, so every
    /// texture starts on a page boundary. Must be a power of two.
    pub page_size: usize,

    /// Number of slots in the fixed texture table.
    pub max_textures: usize,

    /// Number of 16-entry hardware palette banks.
    pub palette_slots: usize,

    /// Distinct colors a texture may use before it is stored as direct 16-bit.
    pub max_palette_entries: usize,

    /// Smallest accepted width/height in pixels.
    pub min_texture_size: u32,

    /// Largest accepted width/height in pixels.
    pub max_texture_size: u32,

    /// Largest accepted `width * height`.
    pub max_texture_pixels: u32,

    /// Growth granularity of command lists, in records.
    pub list_batch: usize,

    /// Records reserved up front for the opaque, punch-through and translucent lists.
    pub initial_capacity: [usize; 3],

    /// List whose geometry is handed to the hardware on every draw call.
    ///
    /// `None` buffers all three lists until the end of the frame.
    pub direct_list: Option<ListType>,

    /// Framebuffer size in pixels; the default viewport and the
    /// "scissor covers the whole screen" test are derived from it.
    pub framebuffer: (u32, u32),
}

impl Default for DeviceInit {
    fn default() -> Self {
        Self {
            vram_bytes: 8 * 1024 * 1024 - 1024 * 1024,
            vram_reserved: 48 * 1024,
            page_size: 2048,
            max_textures: 768,
            palette_slots: 1024 / 16,
            max_palette_entries: 8,
            min_texture_size: 8,
            max_texture_size: 1024,
            max_texture_pixels: 512 * 512,
            list_batch: 256,
            initial_capacity: [1024 * 3, 512 * 3, 1024 * 3],
            direct_list: Some(ListType::Punchthrough),
            framebuffer: (640, 480),
        }
    }
}

impl DeviceInit {
    /// Bytes handed to the texture heap.
    #[inline]
    pub fn texture_heap_bytes(&self) -> usize {
        self.vram_bytes.saturating_sub(self.vram_reserved)
    }
}
