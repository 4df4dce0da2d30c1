use crate::device::VramError;

/// A page-aligned region of the texture heap.
///
/// `offset` is relative to the first page of the heap and is always a multiple
/// of the page size. `size` is the number of live bytes; the block occupies
/// `size` rounded up to whole pages.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct VramBlock {
    pub offset: usize,
    pub size: usize,
}

/// Anything that may own a block of the heap and can be relocated by compaction.
pub trait Resident {
    /// Returns the owned block, or `None` when nothing is resident.
    fn resident_block(&mut self) -> Option<&mut VramBlock>;
}

impl Resident for VramBlock {
    #[inline]
    fn resident_block(&mut self) -> Option<&mut VramBlock> {
        Some(self)
    }
}

impl Resident for Option<VramBlock> {
    #[inline]
    fn resident_block(&mut self) -> Option<&mut VramBlock> {
        self.as_mut()
    }
}

/// Page-granular heap over a dedicated video-memory arena.
///
/// Pages are tracked individually in a byte map (0 = free, 1 = used), so
/// freeing needs no coalescing. Fragmentation is repaired on demand by
/// [`defragment`](Self::defragment), which slides live blocks toward page 0.
///
/// The heap never fails hard: every exhaustion path is a [`VramError`].
pub struct VramHeap {
    arena: Vec<u8>,
    /// Arena index of page 0.
    base: usize,
    page_size: usize,
    used: Vec<u8>,
}

impl VramHeap {
    /// Reserves an arena for `total_bytes` and splits it into whole pages.
    ///
    /// Page 0 starts at the first `page_size`-aligned address of the arena. The
    /// arena is over-reserved by up to one page so the alignment slack never
    /// costs a page.
    pub fn new(total_bytes: usize, page_size: usize) -> Self {
        debug_assert!(page_size.is_power_of_two());

        let pages = total_bytes / page_size;
        let arena = vec![0u8; pages * page_size + page_size - 1];
        let base = arena.as_ptr().align_offset(page_size).min(page_size - 1);

        log::debug!(
            "vram heap: {} pages of {} bytes ({} bytes of alignment slack)",
            pages,
            page_size,
            base
        );

        Self {
            arena,
            base,
            page_size,
            used: vec![0u8; pages],
        }
    }

    #[inline]
    pub fn page_size(&self) -> usize {
        self.page_size
    }

    #[inline]
    pub fn page_count(&self) -> usize {
        self.used.len()
    }

    /// Total bytes managed by the heap.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.used.len() * self.page_size
    }

    /// Page occupancy map, one byte per page.
    #[inline]
    pub fn page_map(&self) -> &[u8] {
        &self.used
    }

    /// Pages covered by an allocation of `size` bytes. Never zero.
    #[inline]
    pub fn pages_for(&self, size: usize) -> usize {
        size.div_ceil(self.page_size).max(1)
    }

    /// Address of page 0 in host memory, for alignment checks.
    #[inline]
    pub fn base_ptr(&self) -> *const u8 {
        self.arena[self.base..].as_ptr()
    }

    /// First-fit scan without compaction.
    pub fn try_alloc(&mut self, size: usize) -> Option<VramBlock> {
        let pages = self.pages_for(size);
        if pages > self.used.len() {
            return None;
        }

        let mut page = 0;
        while page + pages <= self.used.len() {
            // Jump past the last used page of the candidate run.
            match self.used[page..page + pages].iter().rposition(|&u| u != 0) {
                Some(hit) => page += hit + 1,
                None => {
                    self.used[page..page + pages].fill(1);
                    return Some(VramBlock {
                        offset: page * self.page_size,
                        size,
                    });
                }
            }
        }
        None
    }

    /// Allocates `size` bytes, compacting the heap when no free run is long enough.
    ///
    /// `residents` must cover every live block so compaction can relocate them.
    /// After compaction the first-fit scan is retried exactly once.
    pub fn alloc<T: Resident>(
        &mut self,
        size: usize,
        residents: &mut [T],
    ) -> Result<VramBlock, VramError> {
        if self.pages_for(size) > self.used.len() {
            return Err(VramError::TooLarge {
                requested: size,
                capacity: self.capacity(),
            });
        }

        if let Some(block) = self.try_alloc(size) {
            return Ok(block);
        }

        log::warn!("out of video memory ({} bytes requested), defragmenting", size);
        let mut passes = 0;
        while self.defragment(residents) {
            passes += 1;
        }
        log::debug!("defragmentation settled after {} passes", passes);

        self.try_alloc(size).ok_or(VramError::OutOfMemory {
            requested: size,
            free: self.total_free(),
        })
    }

    /// Releases the pages covered by `block`.
    pub fn free(&mut self, block: VramBlock) {
        let first = block.offset / self.page_size;
        let pages = self.pages_for(block.size);
        debug_assert!(
            self.used[first..first + pages].iter().all(|&u| u != 0),
            "freeing pages that are not allocated"
        );
        self.used[first..first + pages].fill(0);
    }

    /// One compaction pass over `residents`, in slice order.
    ///
    /// Each block slides down over the free pages directly below it. Pixel data
    /// is copied and the block's offset rewritten in the same step. Returns
    /// whether anything moved; a fully compacted heap returns `false`.
    pub fn defragment<T: Resident>(&mut self, residents: &mut [T]) -> bool {
        let mut moved_bytes = 0;

        for resident in residents.iter_mut() {
            if let Some(block) = resident.resident_block() {
                moved_bytes += self.slide_down(block);
            }
        }

        if moved_bytes > 0 {
            log::debug!("defragment pass moved {} bytes", moved_bytes);
        }
        moved_bytes > 0
    }

    fn slide_down(&mut self, block: &mut VramBlock) -> usize {
        let pages = self.pages_for(block.size);
        let first = block.offset / self.page_size;

        let mut page = first;
        while page > 0 && self.used[page - 1] == 0 {
            page -= 1;
        }
        if page == first {
            return 0;
        }

        self.used[first..first + pages].fill(0);
        self.used[page..page + pages].fill(1);

        let src = self.base + block.offset;
        let dst = self.base + page * self.page_size;
        self.arena.copy_within(src..src + block.size, dst);

        let moved = (first - page) * self.page_size;
        block.offset = page * self.page_size;
        moved
    }

    /// Free bytes, counted page by page.
    pub fn total_free(&self) -> usize {
        self.used.iter().filter(|&&u| u == 0).count() * self.page_size
    }

    /// Used bytes, counted page by page.
    pub fn total_used(&self) -> usize {
        self.used.iter().filter(|&&u| u != 0).count() * self.page_size
    }

    /// Live bytes of `block`.
    #[inline]
    pub fn bytes(&self, block: VramBlock) -> &[u8] {
        let start = self.base + block.offset;
        &self.arena[start..start + block.size]
    }

    #[inline]
    pub fn bytes_mut(&mut self, block: VramBlock) -> &mut [u8] {
        let start = self.base + block.offset;
        &mut self.arena[start..start + block.size]
    }
}

impl std::fmt::Debug for VramHeap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VramHeap")
            .field("page_size", &self.page_size)
            .field("pages", &self.used.len())
            .field("used_bytes", &self.total_used())
            .finish()
    }
}
