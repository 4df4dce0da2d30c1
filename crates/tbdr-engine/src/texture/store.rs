use crate::device::{DeviceInit, TextureError};
use crate::vram::{VramBlock, VramHeap};

use super::encode::{encode_direct16, encode_paletted4, update_direct16};
use super::Bitmap;
use super::palette::{PALETTE_BANK_ENTRIES, PALETTE_BANKS, Palette, PaletteTable};
use super::table::{
    TextureFlags, TextureFormat, TextureHandle, TextureObject, TextureTable, byte_size,
};

/// Size limits applied when a texture is created.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct TextureLimits {
    pub min_size: u32,
    pub max_size: u32,
    pub max_pixels: u32,
    pub max_palette_entries: usize,
}

impl TextureLimits {
    pub fn from_init(init: &DeviceInit) -> Self {
        Self {
            min_size: init.min_texture_size,
            max_size: init.max_texture_size,
            max_pixels: init.max_texture_pixels,
            max_palette_entries: init.max_palette_entries,
        }
    }

    fn check(&self, width: u32, height: u32) -> Result<(), TextureError> {
        let in_range = |v: u32| (self.min_size..=self.max_size).contains(&v);
        let pixels = width as u64 * height as u64;
        if !in_range(width) || !in_range(height) || pixels > self.max_pixels as u64 {
            return Err(TextureError::InvalidSize { width, height });
        }
        if !width.is_power_of_two() || !height.is_power_of_two() {
            return Err(TextureError::NotPowerOfTwo { width, height });
        }
        Ok(())
    }
}

/// Texture slots, their video memory and the palette banks, owned together.
///
/// Handles index the slot table; compaction rewrites a slot's block offset
/// but never moves a texture to another slot.
#[derive(Debug)]
pub struct TextureStore {
    table: TextureTable,
    heap: VramHeap,
    palettes: PaletteTable,
    limits: TextureLimits,
}

impl TextureStore {
    pub fn new(init: &DeviceInit) -> Self {
        let palette_slots = init.palette_slots.min(PALETTE_BANKS);
        if palette_slots < init.palette_slots {
            log::warn!(
                "palette RAM holds {} banks, ignoring {} requested",
                PALETTE_BANKS,
                init.palette_slots
            );
        }
        Self {
            table: TextureTable::new(init.max_textures),
            heap: VramHeap::new(init.texture_heap_bytes(), init.page_size),
            palettes: PaletteTable::new(palette_slots),
            limits: TextureLimits::from_init(init),
        }
    }

    #[inline]
    pub fn limits(&self) -> TextureLimits {
        self.limits
    }

    #[inline]
    pub fn heap(&self) -> &VramHeap {
        &self.heap
    }

    #[inline]
    pub fn palettes(&self) -> &PaletteTable {
        &self.palettes
    }

    #[inline]
    pub fn live_count(&self) -> usize {
        self.table.live_count()
    }

    /// Creates a texture from `bmp`.
    ///
    /// Bitmaps with few enough colors are stored as 4-bit paletted unless the
    /// texture is `DYNAMIC`. `program_palette` receives `(entry, argb4444)`
    /// for every palette RAM entry of the claimed bank. Nothing is changed
    /// when an error is returned.
    pub fn alloc(
        &mut self,
        bmp: &Bitmap<'_>,
        flags: TextureFlags,
        mut program_palette: impl FnMut(usize, u16),
    ) -> Result<TextureHandle, TextureError> {
        let (width, height) = (bmp.width, bmp.height);
        if let Err(e) = self.limits.check(width, height) {
            log::warn!("rejecting texture: {}", e);
            return Err(e);
        }
        if !bmp.is_complete() {
            return Err(TextureError::BitmapTooSmall);
        }

        let Some(handle) = self.table.find_free() else {
            log::warn!("texture table full ({} slots)", self.table.capacity());
            return Err(TextureError::NoFreeSlot);
        };

        let paletted = if flags.contains(TextureFlags::DYNAMIC) {
            None
        } else {
            self.palettes.find_free().and_then(|bank| {
                Palette::build(bmp, self.limits.max_palette_entries).map(|p| (bank, p))
            })
        };

        let format = match paletted {
            Some((bank, _)) => TextureFormat::Paletted4 { palette: bank as u8 },
            None => TextureFormat::Direct16,
        };
        let size = byte_size(width, height, format);

        let block = match self.heap.alloc(size, self.table.slots_mut()) {
            Ok(block) => block,
            Err(e) => {
                log::warn!("failed to allocate {}x{} texture: {}", width, height, e);
                return Err(e.into());
            }
        };

        let dst = self.heap.bytes_mut(block);
        match &paletted {
            Some((_, palette)) => encode_paletted4(bmp, palette, dst),
            None => encode_direct16(bmp, dst),
        }

        if let Some((bank, palette)) = &paletted {
            self.palettes.claim(*bank);
            for (i, color) in palette.entries().iter().enumerate() {
                program_palette(bank * PALETTE_BANK_ENTRIES + i, color.to_argb4444());
            }
        }

        self.table.put(
            handle,
            TextureObject {
                width,
                height,
                format,
                flags,
                data: Some(block),
            },
        );
        Ok(handle)
    }

    /// Overwrites part of a direct 16-bit texture.
    pub fn update(
        &mut self,
        handle: TextureHandle,
        origin_x: u32,
        origin_y: u32,
        patch: &Bitmap<'_>,
    ) -> Result<(), TextureError> {
        let tex = *self.table.get(handle).ok_or(TextureError::UnknownHandle)?;
        if let TextureFormat::Paletted4 { .. } = tex.format {
            log::warn!("cannot partially update paletted texture {}", handle.index());
            return Err(TextureError::Immutable);
        }
        let fits = |origin: u32, extent: u32, limit: u32| {
            origin.checked_add(extent).is_some_and(|end| end <= limit)
        };
        if !fits(origin_x, patch.width, tex.width) || !fits(origin_y, patch.height, tex.height) {
            return Err(TextureError::OutOfBounds);
        }
        if !patch.is_complete() {
            return Err(TextureError::BitmapTooSmall);
        }

        let Some(block) = tex.data else {
            return Err(TextureError::UnknownHandle);
        };
        let dst = self.heap.bytes_mut(block);
        update_direct16(tex.width, tex.height, origin_x, origin_y, patch, dst);
        Ok(())
    }

    /// Releases the texture's pages, its palette bank and its slot.
    pub fn delete(&mut self, handle: TextureHandle) -> Result<(), TextureError> {
        let tex = self.table.take(handle).ok_or(TextureError::UnknownHandle)?;
        if let Some(block) = tex.data {
            self.heap.free(block);
        }
        if let TextureFormat::Paletted4 { palette } = tex.format {
            self.palettes.release(palette as usize);
        }
        Ok(())
    }

    #[inline]
    pub fn texture(&self, handle: TextureHandle) -> Option<&TextureObject> {
        self.table.get(handle)
    }

    /// Encoded texels of a live texture, as they sit in video memory.
    pub fn texel_bytes(&self, handle: TextureHandle) -> Option<&[u8]> {
        let block: VramBlock = self.table.get(handle)?.data?;
        Some(self.heap.bytes(block))
    }

    /// Runs compaction passes until nothing moves.
    pub fn defragment(&mut self) {
        while self.heap.defragment(self.table.slots_mut()) {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::paint::BitmapCol;
    use crate::texture::encode::{decode_direct16, decode_paletted4};

    const PAGE: usize = 256;

    fn init(pages: usize) -> DeviceInit {
        DeviceInit {
            vram_bytes: pages * PAGE,
            vram_reserved: 0,
            page_size: PAGE,
            max_textures: 4,
            palette_slots: 2,
            ..DeviceInit::default()
        }
    }

    fn checker(w: u32, h: u32, colors: &[BitmapCol]) -> Vec<BitmapCol> {
        (0..w * h)
            .map(|i| colors[((i % w + i / w) as usize) % colors.len()])
            .collect()
    }

    fn gradient(w: u32, h: u32) -> Vec<BitmapCol> {
        (0..w * h)
            .map(|i| BitmapCol::new((i * 16) as u8, (i / w * 16) as u8, (i % w) as u8, 0xFF))
            .collect()
    }

    const FOUR: [BitmapCol; 4] = [
        BitmapCol::new(0xF0, 0, 0, 0xF0),
        BitmapCol::new(0, 0xF0, 0, 0xF0),
        BitmapCol::new(0, 0, 0xF0, 0xF0),
        BitmapCol::WHITE,
    ];

    // ── validation ──

    #[test]
    fn rejects_sizes_outside_limits() {
        let mut store = TextureStore::new(&init(64));
        let px = vec![BitmapCol::WHITE; 4 * 4];
        let err = store.alloc(&Bitmap::new(&px, 4, 4), TextureFlags::empty(), |_, _| {});
        assert_eq!(err, Err(TextureError::InvalidSize { width: 4, height: 4 }));
    }

    #[test]
    fn rejects_non_power_of_two() {
        let mut store = TextureStore::new(&init(64));
        let px = vec![BitmapCol::WHITE; 24 * 8];
        let err = store.alloc(&Bitmap::new(&px, 24, 8), TextureFlags::empty(), |_, _| {});
        assert_eq!(err, Err(TextureError::NotPowerOfTwo { width: 24, height: 8 }));
    }

    #[test]
    fn rejects_short_bitmap() {
        let mut store = TextureStore::new(&init(64));
        let px = vec![BitmapCol::WHITE; 8 * 7];
        let err = store.alloc(&Bitmap::new(&px, 8, 8), TextureFlags::empty(), |_, _| {});
        assert_eq!(err, Err(TextureError::BitmapTooSmall));
        assert_eq!(store.live_count(), 0);
    }

    // ── format selection ──

    #[test]
    fn few_colors_become_paletted() {
        let mut store = TextureStore::new(&init(64));
        let px = checker(16, 16, &FOUR);
        let mut programmed = Vec::new();
        let h = store
            .alloc(&Bitmap::new(&px, 16, 16), TextureFlags::empty(), |i, c| programmed.push((i, c)))
            .unwrap();

        let tex = *store.texture(h).unwrap();
        assert_eq!(tex.format, TextureFormat::Paletted4 { palette: 0 });
        assert_eq!(tex.data.unwrap().size, 16 * 16 / 2);
        assert!(store.palettes().is_used(0));
        assert_eq!(programmed.len(), 4);
        assert_eq!(programmed[3], (3, BitmapCol::WHITE.to_argb4444()));

        let decoded = decode_paletted4(store.texel_bytes(h).unwrap(), 16, 16, &FOUR);
        assert_eq!(decoded, px);
    }

    #[test]
    fn second_palette_uses_next_bank() {
        let mut store = TextureStore::new(&init(64));
        let px = checker(8, 8, &FOUR);
        store.alloc(&Bitmap::new(&px, 8, 8), TextureFlags::empty(), |_, _| {}).unwrap();

        let mut entries = Vec::new();
        let h = store
            .alloc(&Bitmap::new(&px, 8, 8), TextureFlags::empty(), |i, _| entries.push(i))
            .unwrap();
        assert_eq!(store.texture(h).unwrap().format, TextureFormat::Paletted4 { palette: 1 });
        assert_eq!(entries, vec![16, 17, 18, 19]);
    }

    #[test]
    fn out_of_palette_banks_falls_back_to_direct() {
        let mut store = TextureStore::new(&init(64));
        let px = checker(8, 8, &FOUR);
        let bmp = Bitmap::new(&px, 8, 8);
        store.alloc(&bmp, TextureFlags::empty(), |_, _| {}).unwrap();
        store.alloc(&bmp, TextureFlags::empty(), |_, _| {}).unwrap();
        let h = store.alloc(&bmp, TextureFlags::empty(), |_, _| {}).unwrap();
        assert_eq!(store.texture(h).unwrap().format, TextureFormat::Direct16);
    }

    #[test]
    fn palette_banks_are_capped_by_palette_ram() {
        let mut store = TextureStore::new(&DeviceInit {
            max_textures: PALETTE_BANKS + 2,
            palette_slots: 300,
            ..init(256)
        });
        assert_eq!(store.palettes().capacity(), PALETTE_BANKS);

        let px = vec![BitmapCol::WHITE; 8 * 8];
        let bmp = Bitmap::new(&px, 8, 8);
        let handles: Vec<_> = (0..PALETTE_BANKS + 1)
            .map(|_| store.alloc(&bmp, TextureFlags::empty(), |_, _| {}).unwrap())
            .collect();

        let last_bank = PALETTE_BANKS - 1;
        let last_paletted = handles[last_bank];
        assert_eq!(
            store.texture(last_paletted).unwrap().format,
            TextureFormat::Paletted4 { palette: last_bank as u8 }
        );
        assert_eq!(store.texture(handles[PALETTE_BANKS]).unwrap().format, TextureFormat::Direct16);

        store.delete(last_paletted).unwrap();
        assert!(!store.palettes().is_used(last_bank));
        assert!(store.palettes().is_used(0));
        assert_eq!(store.palettes().in_use(), PALETTE_BANKS - 1);
    }

    #[test]
    fn dynamic_textures_are_always_direct() {
        let mut store = TextureStore::new(&init(64));
        let px = checker(8, 8, &FOUR);
        let h = store
            .alloc(&Bitmap::new(&px, 8, 8), TextureFlags::DYNAMIC, |_, _| {
                panic!("palette programmed")
            })
            .unwrap();
        assert_eq!(store.texture(h).unwrap().format, TextureFormat::Direct16);
        assert_eq!(store.palettes().in_use(), 0);
    }

    #[test]
    fn many_colors_become_direct() {
        let mut store = TextureStore::new(&init(64));
        let px = gradient(16, 16);
        let h = store.alloc(&Bitmap::new(&px, 16, 16), TextureFlags::empty(), |_, _| {}).unwrap();
        let decoded = decode_direct16(store.texel_bytes(h).unwrap(), 16, 16);
        let expected: Vec<_> = px.iter().map(|c| c.truncated()).collect();
        assert_eq!(decoded, expected);
    }

    // ── failure leaves no state ──

    #[test]
    fn vram_failure_keeps_palette_and_slot_free() {
        let mut store = TextureStore::new(&init(1));
        let px = checker(32, 32, &FOUR);
        let err = store.alloc(&Bitmap::new(&px, 32, 32), TextureFlags::empty(), |_, _| {});
        assert!(matches!(err, Err(TextureError::OutOfVram(_))));
        assert_eq!(store.palettes().in_use(), 0);
        assert_eq!(store.live_count(), 0);
        assert_eq!(store.heap().total_used(), 0);
    }

    #[test]
    fn full_table_reports_no_free_slot() {
        let mut store = TextureStore::new(&init(64));
        let px = gradient(8, 8);
        let bmp = Bitmap::new(&px, 8, 8);
        for _ in 0..4 {
            store.alloc(&bmp, TextureFlags::empty(), |_, _| {}).unwrap();
        }
        assert_eq!(
            store.alloc(&bmp, TextureFlags::empty(), |_, _| {}),
            Err(TextureError::NoFreeSlot)
        );
    }

    // ── update / delete ──

    #[test]
    fn update_patches_direct_texture() {
        let mut store = TextureStore::new(&init(64));
        let px = vec![BitmapCol::BLACK; 16 * 16];
        let h = store.alloc(&Bitmap::new(&px, 16, 16), TextureFlags::DYNAMIC, |_, _| {}).unwrap();

        let patch = vec![BitmapCol::WHITE; 4 * 2];
        store.update(h, 8, 4, &Bitmap::new(&patch, 4, 2)).unwrap();

        let decoded = decode_direct16(store.texel_bytes(h).unwrap(), 16, 16);
        for y in 0..16 {
            for x in 0..16 {
                let inside = (8..12).contains(&x) && (4..6).contains(&y);
                let want = if inside { BitmapCol::WHITE } else { BitmapCol::BLACK };
                let want = want.truncated();
                assert_eq!(decoded[(y * 16 + x) as usize], want, "({x}, {y})");
            }
        }
    }

    #[test]
    fn update_rejects_paletted_and_out_of_bounds() {
        let mut store = TextureStore::new(&init(64));
        let pal = checker(8, 8, &FOUR);
        let p = store.alloc(&Bitmap::new(&pal, 8, 8), TextureFlags::empty(), |_, _| {}).unwrap();
        let patch = vec![BitmapCol::WHITE; 4];
        assert_eq!(store.update(p, 0, 0, &Bitmap::new(&patch, 2, 2)), Err(TextureError::Immutable));

        let d = store.alloc(&Bitmap::new(&pal, 8, 8), TextureFlags::DYNAMIC, |_, _| {}).unwrap();
        let small = Bitmap::new(&patch, 2, 2);
        assert_eq!(store.update(d, 7, 0, &small), Err(TextureError::OutOfBounds));
        assert_eq!(store.update(d, 0, u32::MAX, &small), Err(TextureError::OutOfBounds));
    }

    #[test]
    fn delete_releases_everything() {
        let mut store = TextureStore::new(&init(64));
        let px = checker(8, 8, &FOUR);
        let h = store.alloc(&Bitmap::new(&px, 8, 8), TextureFlags::empty(), |_, _| {}).unwrap();
        store.delete(h).unwrap();

        assert_eq!(store.live_count(), 0);
        assert_eq!(store.palettes().in_use(), 0);
        assert_eq!(store.heap().total_used(), 0);
        assert!(store.texture(h).is_none());
        assert_eq!(store.delete(h), Err(TextureError::UnknownHandle));
    }

    #[test]
    fn alloc_after_fragmentation_moves_live_texture() {
        // 16x16 direct16 spans two pages.
        let mut store = TextureStore::new(&init(6));
        let px = gradient(16, 16);
        let bmp = Bitmap::new(&px, 16, 16);
        let a = store.alloc(&bmp, TextureFlags::DYNAMIC, |_, _| {}).unwrap();
        let b = store.alloc(&bmp, TextureFlags::DYNAMIC, |_, _| {}).unwrap();
        let before = store.texel_bytes(b).unwrap().to_vec();
        store.delete(a).unwrap();

        let big = gradient(32, 16);
        let c = store.alloc(&Bitmap::new(&big, 32, 16), TextureFlags::DYNAMIC, |_, _| {}).unwrap();

        assert_eq!(store.texture(b).unwrap().data.unwrap().offset, 0);
        assert_eq!(store.texel_bytes(b).unwrap(), &before[..]);
        assert_eq!(store.texture(c).unwrap().data.unwrap().offset, 2 * PAGE);
    }
}
