use tbdr_engine::device::{DeviceInit, RecordingDriver, TextureError};
use tbdr_engine::paint::BitmapCol;
use tbdr_engine::render::Gfx;
use tbdr_engine::texture::encode::{decode_direct16, decode_paletted4};
use tbdr_engine::texture::{Bitmap, TextureFlags, TextureFormat, TextureHandle};

const PAGE: usize = 2048;

const COLORS: [BitmapCol; 4] = [
    BitmapCol::new(0xF0, 0x00, 0x00, 0xF0),
    BitmapCol::new(0x00, 0xF0, 0x00, 0xF0),
    BitmapCol::new(0x00, 0x00, 0xF0, 0xF0),
    BitmapCol::WHITE,
];

fn device(pages: usize) -> Gfx<RecordingDriver> {
    let init = DeviceInit {
        vram_bytes: pages * PAGE,
        vram_reserved: 0,
        page_size: PAGE,
        initial_capacity: [0; 3],
        ..DeviceInit::default()
    };
    Gfx::create(init, RecordingDriver::new())
}

fn four_colors(w: u32, h: u32) -> Vec<BitmapCol> {
    (0..w * h)
        .map(|i| COLORS[((i % w) / 3 + (i / w) / 5) as usize % COLORS.len()])
        .collect()
}

fn many_colors(w: u32, h: u32) -> Vec<BitmapCol> {
    (0..w * h)
        .map(|i| BitmapCol::new((i % w) as u8, (i / w) as u8, (i >> 8) as u8, 0xFF))
        .collect()
}

fn pages_of(g: &Gfx<RecordingDriver>, h: TextureHandle) -> std::ops::Range<usize> {
    let block = g.texture(h).unwrap().data.unwrap();
    let first = block.offset / PAGE;
    first..first + block.size.div_ceil(PAGE)
}

#[test]
fn fragmented_heap_is_compacted_to_fit_new_texture() {
    // --- ARRANGE ---
    // 20 pages: A (direct, 4 pages) then B (paletted, 4 pages).
    let mut g = device(20);

    let a_px = many_colors(64, 64);
    let a = g
        .alloc_texture(&Bitmap::new(&a_px, 64, 64), TextureFlags::empty(), false)
        .expect("A fits an empty heap");
    assert_eq!(g.texture(a).unwrap().format, TextureFormat::Direct16);
    assert_eq!(pages_of(&g, a), 0..4);

    let b_px = four_colors(128, 128);
    let b = g
        .alloc_texture(&Bitmap::new(&b_px, 128, 128), TextureFlags::empty(), false)
        .expect("B fits after A");
    assert!(matches!(g.texture(b).unwrap().format, TextureFormat::Paletted4 { .. }));
    assert_eq!(pages_of(&g, b), 4..8);

    // Freeing A leaves 16 free pages split 4 + 12.
    g.delete_texture(a).unwrap();
    assert_eq!(g.textures().heap().total_free(), 16 * PAGE);

    // --- ACT ---
    // C needs 16 contiguous pages: only possible once B slides down.
    let c_px = four_colors(256, 256);
    let c = g
        .alloc_texture(&Bitmap::new(&c_px, 256, 256), TextureFlags::empty(), false)
        .expect("C fits after compaction");

    // --- ASSERT ---
    let b_pages = pages_of(&g, b);
    let c_pages = pages_of(&g, c);
    assert_eq!(b_pages, 0..4, "B moved to the bottom of the heap");
    assert_eq!(c_pages, 4..20);
    assert!(b_pages.end <= c_pages.start || c_pages.end <= b_pages.start);

    // B's texels moved intact.
    let decoded = decode_paletted4(g.textures().texel_bytes(b).unwrap(), 128, 128, &COLORS);
    assert_eq!(decoded, b_px);
}

#[test]
fn exhausted_heap_reports_error_and_leaves_no_state() {
    let mut g = device(4);
    let px = many_colors(64, 64);
    g.alloc_texture(&Bitmap::new(&px, 64, 64), TextureFlags::empty(), false)
        .unwrap();

    let pal = four_colors(64, 64);
    let err = g
        .alloc_texture(&Bitmap::new(&pal, 64, 64), TextureFlags::empty(), false)
        .unwrap_err();
    assert!(matches!(err, TextureError::OutOfVram(_)));
    assert_eq!(g.textures().live_count(), 1);
    assert_eq!(g.textures().palettes().in_use(), 0);
}

#[test]
fn atlas_window_is_encoded_with_row_stride() {
    let mut g = device(8);
    let atlas = many_colors(32, 16);
    let window = Bitmap::new(&atlas[8..], 16, 16).with_row_stride(32);
    let h = g
        .alloc_texture(&window, TextureFlags::DYNAMIC, false)
        .unwrap();

    let decoded = decode_direct16(g.textures().texel_bytes(h).unwrap(), 16, 16);
    for y in 0..16usize {
        for x in 0..16usize {
            assert_eq!(decoded[y * 16 + x], atlas[y * 32 + 8 + x].truncated());
        }
    }
}

#[test]
fn dynamic_texture_accepts_partial_updates_between_frames() {
    let mut g = device(8);
    let px = vec![BitmapCol::BLACK; 32 * 32];
    let h = g
        .alloc_texture(
            &Bitmap::new(&px, 32, 32),
            TextureFlags::DYNAMIC | TextureFlags::BILINEAR,
            false,
        )
        .unwrap();

    g.begin_frame();
    g.end_frame();

    let patch = vec![BitmapCol::WHITE; 8 * 8];
    g.update_texture(h, 16, 8, &Bitmap::new(&patch, 8, 8)).unwrap();
    assert_eq!(
        g.update_texture(h, 30, 0, &Bitmap::new(&patch, 8, 8)),
        Err(TextureError::OutOfBounds)
    );
    assert!(g.texture(h).unwrap().flags.contains(TextureFlags::BILINEAR));
}
