use std::collections::TryReserveError;

use super::Record;

/// Hardware rasterization class of a command list.
///
/// Lists are rasterized in declaration order: opaque geometry is fully
/// resolved before punch-through, and translucent geometry comes last.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum ListType {
    Opaque,
    Punchthrough,
    Translucent,
}

impl ListType {
    /// Every list, in submission order.
    pub const ALL: [ListType; 3] =
        [ListType::Opaque, ListType::Punchthrough, ListType::Translucent];

    #[inline]
    pub const fn index(self) -> usize {
        match self {
            ListType::Opaque => 0,
            ListType::Punchthrough => 1,
            ListType::Translucent => 2,
        }
    }
}

/// Growable buffer of fixed-size records destined for one list.
///
/// Performance characteristics:
/// - capacity grows in multiples of `batch` records and never shrinks
/// - `clear()` keeps the allocation for the next frame
/// - the base address is always [`DMA_ALIGN`](super::DMA_ALIGN)-aligned
#[derive(Debug)]
pub struct CommandList {
    list_type: ListType,
    /// Backing storage; `data.len()` is the capacity, zero-filled past `length`.
    data: Vec<Record>,
    length: usize,
    batch: usize,
}

impl CommandList {
    pub fn new(list_type: ListType, batch: usize) -> Self {
        debug_assert!(batch > 0);
        Self {
            list_type,
            data: Vec::new(),
            length: 0,
            batch,
        }
    }

    #[inline]
    pub fn list_type(&self) -> ListType {
        self.list_type
    }

    /// Records written so far.
    #[inline]
    pub fn len(&self) -> usize {
        self.length
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    /// Records the buffer can hold without growing.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    #[inline]
    pub fn records(&self) -> &[Record] {
        &self.data[..self.length]
    }

    #[inline]
    pub fn as_ptr(&self) -> *const Record {
        self.data.as_ptr()
    }

    /// Ensures room for `record_count` records in total and returns the
    /// unwritten slots `[len, record_count)`.
    ///
    /// Growth rounds up to the next multiple of the batch size, copies the
    /// written records into a fresh buffer and drops the old one.
    pub fn try_reserve(&mut self, record_count: usize) -> Result<&mut [Record], TryReserveError> {
        if record_count > self.data.len() {
            // Rounding overflow surfaces as a capacity overflow below.
            let capacity =
                record_count.checked_next_multiple_of(self.batch).unwrap_or(usize::MAX);

            let mut grown = Vec::new();
            grown.try_reserve_exact(capacity)?;
            grown.extend_from_slice(&self.data[..self.length]);
            grown.resize(capacity, Record::default());

            log::trace!(
                "{:?} list grown from {} to {} records",
                self.list_type,
                self.data.len(),
                capacity
            );
            self.data = grown;
        }

        let end = record_count.max(self.length);
        Ok(&mut self.data[self.length..end])
    }

    /// Like [`try_reserve`](Self::try_reserve), but running out of host memory
    /// terminates the process: a list cannot be left half-written mid-frame.
    pub fn reserve(&mut self, record_count: usize) -> &mut [Record] {
        let list_type = self.list_type;
        match self.try_reserve(record_count) {
            Ok(slots) => slots,
            Err(err) => fatal_out_of_memory(list_type, record_count, err),
        }
    }

    /// Marks `count` more reserved slots as written.
    #[inline]
    pub fn commit(&mut self, count: usize) {
        debug_assert!(self.length + count <= self.data.len());
        self.length += count;
    }

    /// Appends one record.
    pub fn append(&mut self, record: Record) {
        let slots = self.reserve(self.length + 1);
        slots[0] = record;
        self.length += 1;
    }

    /// Drops written records past `len`. Capacity is retained.
    #[inline]
    pub fn truncate(&mut self, len: usize) {
        self.length = self.length.min(len);
    }

    /// Forgets the written records. Capacity is retained.
    #[inline]
    pub fn clear(&mut self) {
        self.length = 0;
    }
}

fn fatal_out_of_memory(list_type: ListType, record_count: usize, err: TryReserveError) -> ! {
    log::error!(
        "out of memory growing {:?} command list to {} records: {}",
        list_type,
        record_count,
        err
    );
    std::process::abort()
}
