use bytemuck::{Pod, Zeroable};

/// Width of every command list record, in bytes.
pub const RECORD_SIZE: usize = 32;

/// Alignment the DMA engine requires of a list's base address.
pub const DMA_ALIGN: usize = 32;

// Parameter control word, bits 31..29: parameter type.
pub const PARA_END_OF_LIST: u32 = 0;
pub const PARA_USER_CLIP: u32 = 1 << 29;
pub const PARA_POLY_HEADER: u32 = 4 << 29;
pub const PARA_VERTEX: u32 = 7 << 29;
/// Bit 28 of a vertex control word: last vertex of a strip.
pub const END_OF_STRIP: u32 = 1 << 28;

/// One fixed-size command list entry: a vertex or a control record.
///
/// The alignment of the type is what keeps list buffers DMA-aligned.
#[repr(C, align(32))]
#[derive(Debug, Copy, Clone, Default, PartialEq, Pod, Zeroable)]
pub struct Record {
    pub words: [u32; 8],
}

const _: () = assert!(std::mem::size_of::<Record>() == RECORD_SIZE);
const _: () = assert!(std::mem::align_of::<Record>() == DMA_ALIGN);

/// Parameter type encoded in a record's control word.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum ParamKind {
    EndOfList,
    UserClip,
    PolyHeader,
    Vertex,
    Other(u8),
}

impl Record {
    #[inline]
    pub const fn new(words: [u32; 8]) -> Self {
        Self { words }
    }

    #[inline]
    pub fn control(&self) -> u32 {
        self.words[0]
    }

    pub fn kind(&self) -> ParamKind {
        match self.control() & (7 << 29) {
            PARA_END_OF_LIST => ParamKind::EndOfList,
            PARA_USER_CLIP => ParamKind::UserClip,
            PARA_POLY_HEADER => ParamKind::PolyHeader,
            PARA_VERTEX => ParamKind::Vertex,
            other => ParamKind::Other((other >> 29) as u8),
        }
    }

    #[inline]
    pub fn is_vertex(&self) -> bool {
        self.kind() == ParamKind::Vertex
    }

    #[inline]
    pub fn ends_strip(&self) -> bool {
        self.is_vertex() && self.control() & END_OF_STRIP != 0
    }
}

/// Hardware vertex layout.
///
/// `z` holds `1 / w`; colors are packed `A8 R8 G8 B8`.
#[repr(C)]
#[derive(Debug, Copy, Clone, Default, PartialEq, Pod, Zeroable)]
pub struct HwVertex {
    pub flags: u32,
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub u: f32,
    pub v: f32,
    pub argb: u32,
    pub oargb: u32,
}

impl From<HwVertex> for Record {
    #[inline]
    fn from(v: HwVertex) -> Self {
        bytemuck::cast(v)
    }
}

impl From<Record> for HwVertex {
    #[inline]
    fn from(r: Record) -> Self {
        bytemuck::cast(r)
    }
}
