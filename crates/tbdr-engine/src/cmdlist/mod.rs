//! Command list buffers.
//!
//! Responsibilities:
//! - hold fixed-size, DMA-aligned records for one rasterization class
//! - grow in batches without losing written records
//! - decode the control word of a record for inspection

mod list;
mod record;

pub use list::{CommandList, ListType};
pub use record::{
    DMA_ALIGN, END_OF_STRIP, HwVertex, PARA_END_OF_LIST, PARA_POLY_HEADER, PARA_USER_CLIP,
    PARA_VERTEX, ParamKind, RECORD_SIZE, Record,
};
