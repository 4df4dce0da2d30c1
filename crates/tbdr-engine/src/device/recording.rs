use crate::cmdlist::{ListType, PARA_POLY_HEADER, PARA_USER_CLIP, Record};
use crate::coords::Rect;
use crate::paint::BitmapCol;
use crate::render::{FogTable, RenderState};
use crate::texture::{TextureFlags, TextureFormat, TextureObject};

use super::TileAccelerator;

/// Entries of hardware palette RAM.
pub const PALETTE_RAM_ENTRIES: usize = 1024;

/// Header bits written by [`RecordingDriver::poly_header`], word 0.
pub mod header_bits {
    pub const CULLING: u32 = 1 << 0;
    pub const ALPHA_BLEND: u32 = 1 << 1;
    pub const ALPHA_TEST: u32 = 1 << 2;
    pub const DEPTH_TEST: u32 = 1 << 3;
    pub const DEPTH_WRITE: u32 = 1 << 4;
    pub const FOG: u32 = 1 << 5;
    pub const TEXTURED: u32 = 1 << 6;
    pub const SCISSOR: u32 = 1 << 7;
    pub const LIST_SHIFT: u32 = 24;
}

/// Header bits, word 3.
pub mod format_bits {
    pub const DIRECT16: u32 = 1;
    pub const PALETTED4: u32 = 2;
    pub const BILINEAR: u32 = 1 << 8;
    pub const PALETTE_SHIFT: u32 = 16;
}

/// One call made on the driver.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum DriverEvent {
    SceneBegin,
    ListBegin(ListType),
    Submit { records: usize },
    ListFinish,
    SceneFinish,
    WaitReady,
}

/// Everything streamed between one `list_begin` and its `list_finish`.
#[derive(Debug, Clone, PartialEq)]
pub struct ListSubmission {
    pub list: ListType,
    pub records: Vec<Record>,
}

/// In-memory tile accelerator.
///
/// Keeps a log of every call and a copy of every submitted record, plus the
/// register state (palette RAM, fog, background) a real chip would hold.
#[derive(Debug, Clone)]
pub struct RecordingDriver {
    events: Vec<DriverEvent>,
    submissions: Vec<ListSubmission>,
    open: Option<ListSubmission>,
    palette: Vec<u16>,
    fog_color: BitmapCol,
    fog_table: Option<FogTable>,
    background: BitmapCol,
    param_overflow: bool,
}

impl Default for RecordingDriver {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordingDriver {
    pub fn new() -> Self {
        Self {
            events: Vec::new(),
            submissions: Vec::new(),
            open: None,
            palette: vec![0; PALETTE_RAM_ENTRIES],
            fog_color: BitmapCol::default(),
            fog_table: None,
            background: BitmapCol::BLACK,
            param_overflow: false,
        }
    }

    #[inline]
    pub fn events(&self) -> &[DriverEvent] {
        &self.events
    }

    /// Completed list submissions, oldest first.
    #[inline]
    pub fn submissions(&self) -> &[ListSubmission] {
        &self.submissions
    }

    /// Order in which lists were opened.
    pub fn list_order(&self) -> Vec<ListType> {
        self.submissions.iter().map(|s| s.list).collect()
    }

    /// All records submitted for `list`, across submissions.
    pub fn records_for(&self, list: ListType) -> Vec<Record> {
        self.submissions
            .iter()
            .filter(|s| s.list == list)
            .flat_map(|s| s.records.iter().copied())
            .collect()
    }

    /// Forgets recorded calls; register state is kept.
    pub fn clear_log(&mut self) {
        self.events.clear();
        self.submissions.clear();
    }

    #[inline]
    pub fn palette_entry(&self, index: usize) -> u16 {
        self.palette.get(index).copied().unwrap_or(0)
    }

    #[inline]
    pub fn fog_color(&self) -> BitmapCol {
        self.fog_color
    }

    #[inline]
    pub fn fog_table(&self) -> Option<FogTable> {
        self.fog_table
    }

    #[inline]
    pub fn background_color(&self) -> BitmapCol {
        self.background
    }

    /// Simulates the hardware running out of parameter memory.
    pub fn raise_param_overflow(&mut self) {
        self.param_overflow = true;
    }
}

fn state_bits(state: &RenderState) -> u32 {
    use header_bits::*;

    [
        (state.culling, CULLING),
        (state.alpha_blend, ALPHA_BLEND),
        (state.alpha_test, ALPHA_TEST),
        (state.depth_test, DEPTH_TEST),
        (state.depth_write, DEPTH_WRITE),
        (state.fog, FOG),
        (state.textures, TEXTURED),
        (state.scissor_test, SCISSOR),
    ]
    .into_iter()
    .filter(|(on, _)| *on)
    .fold(0, |acc, (_, bit)| acc | bit)
}

impl TileAccelerator for RecordingDriver {
    fn scene_begin(&mut self) {
        self.events.push(DriverEvent::SceneBegin);
    }

    fn list_begin(&mut self, list: ListType) {
        debug_assert!(self.open.is_none(), "list_begin while a list is open");
        self.events.push(DriverEvent::ListBegin(list));
        self.open = Some(ListSubmission {
            list,
            records: Vec::new(),
        });
    }

    fn submit(&mut self, records: &[Record]) {
        self.events.push(DriverEvent::Submit {
            records: records.len(),
        });
        match self.open.as_mut() {
            Some(open) => open.records.extend_from_slice(records),
            None => log::warn!("{} records submitted outside a list", records.len()),
        }
    }

    fn list_finish(&mut self) {
        self.events.push(DriverEvent::ListFinish);
        if let Some(done) = self.open.take() {
            self.submissions.push(done);
        }
    }

    fn scene_finish(&mut self) {
        self.events.push(DriverEvent::SceneFinish);
    }

    fn wait_ready(&mut self) {
        self.events.push(DriverEvent::WaitReady);
    }

    fn poly_header(
        &self,
        list: ListType,
        state: &RenderState,
        texture: Option<&TextureObject>,
    ) -> Record {
        let mut words = [0u32; 8];
        words[0] = PARA_POLY_HEADER
            | ((list.index() as u32) << header_bits::LIST_SHIFT)
            | state_bits(state);

        if let Some(tex) = texture.filter(|_| state.textures) {
            words[1] = tex.data.map_or(0, |b| b.offset as u32);
            words[2] = tex.width | (tex.height << 16);
            words[3] = match tex.format {
                TextureFormat::Direct16 => format_bits::DIRECT16,
                TextureFormat::Paletted4 { palette } => {
                    format_bits::PALETTED4 | ((palette as u32) << format_bits::PALETTE_SHIFT)
                }
            };
            if tex.flags.contains(TextureFlags::BILINEAR) {
                words[3] |= format_bits::BILINEAR;
            }
        }
        Record::new(words)
    }

    fn clip_command(&self, rect: Rect) -> Record {
        // Clip registers count 32-pixel tiles, inclusive on both ends.
        let tile = |v: i32| (v.max(0) as u32) >> 5;
        let last = |v: i32| tile(v).saturating_sub(1);
        let mut words = [0u32; 8];
        words[0] = PARA_USER_CLIP;
        words[4] = tile(rect.x);
        words[5] = tile(rect.y);
        words[6] = last(rect.right());
        words[7] = last(rect.bottom());
        Record::new(words)
    }

    fn set_palette_entry(&mut self, index: usize, argb4444: u16) {
        match self.palette.get_mut(index) {
            Some(entry) => *entry = argb4444,
            None => log::warn!("palette entry {} out of range", index),
        }
    }

    fn set_fog_color(&mut self, color: BitmapCol) {
        self.fog_color = color;
    }

    fn set_fog_table(&mut self, table: FogTable) {
        self.fog_table = Some(table);
    }

    fn set_background_color(&mut self, color: BitmapCol) {
        self.background = color;
    }

    fn take_param_overflow(&mut self) -> bool {
        std::mem::take(&mut self.param_overflow)
    }
}
