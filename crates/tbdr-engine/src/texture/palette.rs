use crate::device::PALETTE_RAM_ENTRIES;
use crate::paint::BitmapCol;

use super::Bitmap;

/// Entries per hardware palette bank.
pub const PALETTE_BANK_ENTRIES: usize = 16;

/// Banks that fit in palette RAM.
pub const PALETTE_BANKS: usize = PALETTE_RAM_ENTRIES / PALETTE_BANK_ENTRIES;

/// Deduplicated colors of one bitmap, in first-seen order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Palette {
    entries: [BitmapCol; PALETTE_BANK_ENTRIES],
    len: usize,
}

impl Palette {
    /// Collects the distinct colors of `bmp`.
    ///
    /// Returns `None` once more than `max_entries` colors are seen; the caller
    /// then stores the texture as direct 16-bit instead.
    pub fn build(bmp: &Bitmap<'_>, max_entries: usize) -> Option<Self> {
        let max_entries = max_entries.min(PALETTE_BANK_ENTRIES);
        let mut palette = Self {
            entries: [BitmapCol::default(); PALETTE_BANK_ENTRIES],
            len: 0,
        };

        for row in bmp.rows() {
            for &color in row {
                if palette.index_of(color).is_some() {
                    continue;
                }
                if palette.len >= max_entries {
                    return None;
                }
                palette.entries[palette.len] = color;
                palette.len += 1;
            }
        }

        (palette.len > 0).then_some(palette)
    }

    /// Linear scan; palettes hold a handful of entries.
    #[inline]
    pub fn index_of(&self, color: BitmapCol) -> Option<u8> {
        self.entries()
            .iter()
            .position(|&c| c == color)
            .map(|i| i as u8)
    }

    #[inline]
    pub fn entries(&self) -> &[BitmapCol] {
        &self.entries[..self.len]
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

/// Allocation state of the hardware palette banks.
///
/// The hardware addresses its palette RAM in banks of 16 entries; a 4-bit
/// texture names one bank. The table only tracks which banks are claimed;
/// programming entries is the driver's job.
#[derive(Debug, Clone)]
pub struct PaletteTable {
    used: Vec<bool>,
}

impl PaletteTable {
    pub fn new(slots: usize) -> Self {
        Self {
            used: vec![false; slots],
        }
    }

    /// First unclaimed bank, without claiming it.
    pub fn find_free(&self) -> Option<usize> {
        self.used.iter().position(|&u| !u)
    }

    pub fn claim(&mut self, slot: usize) {
        debug_assert!(!self.used[slot], "palette slot {slot} claimed twice");
        self.used[slot] = true;
        log::debug!("palette slot {} claimed", slot);
    }

    pub fn release(&mut self, slot: usize) {
        if let Some(u) = self.used.get_mut(slot) {
            *u = false;
            log::debug!("palette slot {} released", slot);
        }
    }

    #[inline]
    pub fn is_used(&self, slot: usize) -> bool {
        self.used.get(slot).copied().unwrap_or(false)
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.used.len()
    }

    #[inline]
    pub fn in_use(&self) -> usize {
        self.used.iter().filter(|&&u| u).count()
    }
}
