//! Conversion of 32-bit bitmaps into the texture unit's twiddled formats.
//!
//! Destinations are raw little-endian byte slices straight out of the
//! video-memory heap.

use crate::paint::BitmapCol;

use super::{Bitmap, Palette, Twiddle};

#[inline]
fn put_u16(dst: &mut [u8], index: u32, value: u16) {
    let at = index as usize * 2;
    dst[at..at + 2].copy_from_slice(&value.to_le_bytes());
}

#[inline]
fn get_u16(src: &[u8], index: usize) -> u16 {
    u16::from_le_bytes([src[index * 2], src[index * 2 + 1]])
}

/// Bytes occupied by a `width` x `height` direct 16-bit texture.
#[inline]
pub const fn direct16_size(width: u32, height: u32) -> usize {
    width as usize * height as usize * 2
}

/// Bytes occupied by a `width` x `height` 4-bit paletted texture.
#[inline]
pub const fn paletted4_size(width: u32, height: u32) -> usize {
    width as usize * height as usize / 2
}

/// Writes `bmp` as twiddled ARGB4444 texels.
///
/// `dst` must hold at least [`direct16_size`] bytes.
pub fn encode_direct16(bmp: &Bitmap<'_>, dst: &mut [u8]) {
    let tw = Twiddle::factors(bmp.width, bmp.height);
    write_direct16(tw, 0, 0, bmp, dst);
}

/// Overwrites the `patch`-sized region at `(origin_x, origin_y)` of a direct
/// 16-bit texture with dimensions `tex_width` x `tex_height`.
///
/// The caller checks that the patch lies inside the texture.
pub fn update_direct16(
    tex_width: u32,
    tex_height: u32,
    origin_x: u32,
    origin_y: u32,
    patch: &Bitmap<'_>,
    dst: &mut [u8],
) {
    let tw = Twiddle::factors(tex_width, tex_height);
    let start_x = tw.seek_x(origin_x);
    let start_y = tw.seek_y(origin_y);
    write_direct16(tw, start_x, start_y, patch, dst);
}

fn write_direct16(tw: Twiddle, start_x: u32, start_y: u32, bmp: &Bitmap<'_>, dst: &mut [u8]) {
    let mut y = start_y;
    for row in bmp.rows() {
        let mut x = start_x;
        for &px in row {
            put_u16(dst, x | y, px.to_argb4444());
            x = tw.next_x(x);
        }
        y = tw.next_y(y);
    }
}

/// Writes `bmp` as twiddled 4-bit palette indices.
///
/// The bitmap is walked in 2x2 blocks; one 16-bit word holds the indices of
/// `(x, y)`, `(x, y + 1)`, `(x + 1, y)` and `(x + 1, y + 1)` from the low
/// nibble up, and the words themselves are twiddled at half resolution.
/// Colors missing from `palette` map to index 0.
pub fn encode_paletted4(bmp: &Bitmap<'_>, palette: &Palette, dst: &mut [u8]) {
    let half_w = bmp.width >> 1;
    let half_h = bmp.height >> 1;
    let tw = Twiddle::factors(half_w, half_h);
    let idx = |c: BitmapCol| palette.index_of(c).unwrap_or(0) as u16;

    let mut y = 0;
    for by in 0..half_h {
        let top = bmp.row(by * 2);
        let bottom = bmp.row(by * 2 + 1);
        let mut x = 0;

        for (t, b) in top.chunks_exact(2).zip(bottom.chunks_exact(2)) {
            let word = idx(t[0]) | (idx(b[0]) << 4) | (idx(t[1]) << 8) | (idx(b[1]) << 12);
            put_u16(dst, x | y, word);
            x = tw.next_x(x);
        }
        y = tw.next_y(y);
    }
}

/// Reads a direct 16-bit texture back into linear pixels.
pub fn decode_direct16(src: &[u8], width: u32, height: u32) -> Vec<BitmapCol> {
    let tw = Twiddle::factors(width, height);
    let mut out = Vec::with_capacity(width as usize * height as usize);

    let mut y = 0;
    for _ in 0..height {
        let mut x = 0;
        for _ in 0..width {
            out.push(BitmapCol::from_argb4444(get_u16(src, (x | y) as usize)));
            x = tw.next_x(x);
        }
        y = tw.next_y(y);
    }
    out
}

/// Reads a 4-bit paletted texture back into linear pixels.
///
/// Indices past the end of `palette` decode as transparent black.
pub fn decode_paletted4(
    src: &[u8],
    width: u32,
    height: u32,
    palette: &[BitmapCol],
) -> Vec<BitmapCol> {
    let half_w = width >> 1;
    let half_h = height >> 1;
    let tw = Twiddle::factors(half_w, half_h);
    let lookup = |i: u16| palette.get(i as usize).copied().unwrap_or_default();
    let mut out = vec![BitmapCol::default(); width as usize * height as usize];

    let mut y = 0;
    for by in 0..half_h as usize {
        let mut x = 0;
        for bx in 0..half_w as usize {
            let word = get_u16(src, (x | y) as usize);
            let top = by * 2 * width as usize + bx * 2;
            let bottom = top + width as usize;
            out[top] = lookup(word & 0xF);
            out[bottom] = lookup((word >> 4) & 0xF);
            out[top + 1] = lookup((word >> 8) & 0xF);
            out[bottom + 1] = lookup(word >> 12);
            x = tw.next_x(x);
        }
        y = tw.next_y(y);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gradient(w: u32, h: u32) -> Vec<BitmapCol> {
        (0..w * h)
            .map(|i| BitmapCol::new((i * 7) as u8, (i * 13) as u8, (i * 29) as u8, 255 - i as u8))
            .collect()
    }

    fn checker(w: u32, h: u32, colors: &[BitmapCol]) -> Vec<BitmapCol> {
        (0..h)
            .flat_map(|y| (0..w).map(move |x| (x / 3 + y * 5 + x * y) as usize))
            .map(|i| colors[i % colors.len()])
            .collect()
    }

    #[test]
    fn direct16_writes_truncated_texels_at_twiddled_slots() {
        let px = gradient(8, 4);
        let bmp = Bitmap::new(&px, 8, 4);
        let mut dst = vec![0u8; direct16_size(8, 4)];
        encode_direct16(&bmp, &mut dst);

        let tw = Twiddle::factors(8, 4);
        for y in 0..4 {
            for x in 0..8 {
                let want = px[(y * 8 + x) as usize].to_argb4444();
                assert_eq!(get_u16(&dst, tw.index(x, y)), want, "texel ({x}, {y})");
            }
        }
    }

    #[test]
    fn direct16_round_trip_is_truncation() {
        for (w, h) in [(8, 8), (16, 8), (8, 32), (64, 64)] {
            let px = gradient(w, h);
            let mut dst = vec![0u8; direct16_size(w, h)];
            encode_direct16(&Bitmap::new(&px, w, h), &mut dst);

            let back = decode_direct16(&dst, w, h);
            let want: Vec<_> = px.iter().map(|c| c.truncated()).collect();
            assert_eq!(back, want, "{w}x{h}");
        }
    }

    #[test]
    fn paletted4_round_trip_is_exact() {
        let colors = [
            BitmapCol::new(0x12, 0x34, 0x56, 0xFF),
            BitmapCol::new(0xFE, 0xDC, 0xBA, 0x80),
            BitmapCol::new(0x01, 0x02, 0x03, 0x00),
            BitmapCol::WHITE,
        ];
        for (w, h) in [(8, 8), (32, 8), (8, 16)] {
            let px = checker(w, h, &colors);
            let bmp = Bitmap::new(&px, w, h);
            let pal = Palette::build(&bmp, 8).unwrap();

            let mut dst = vec![0u8; paletted4_size(w, h)];
            encode_paletted4(&bmp, &pal, &mut dst);
            assert_eq!(decode_paletted4(&dst, w, h, pal.entries()), px, "{w}x{h}");
        }
    }

    #[test]
    fn paletted4_packs_a_2x2_block_into_one_word() {
        let a = BitmapCol::new(1, 0, 0, 255);
        let b = BitmapCol::new(2, 0, 0, 255);
        let c = BitmapCol::new(3, 0, 0, 255);
        let d = BitmapCol::new(4, 0, 0, 255);
        let px = [a, b, c, d];
        let bmp = Bitmap::new(&px, 2, 2);
        let pal = Palette::build(&bmp, 8).unwrap();

        let mut dst = vec![0u8; 2];
        encode_paletted4(&bmp, &pal, &mut dst);
        // (0,0)=a->0, (0,1)=c->2, (1,0)=b->1, (1,1)=d->3
        assert_eq!(get_u16(&dst, 0), 0x3120);
    }

    #[test]
    fn partial_update_touches_only_the_patch() {
        let (w, h) = (16, 16);
        let base = vec![BitmapCol::BLACK; (w * h) as usize];
        let mut dst = vec![0u8; direct16_size(w, h)];
        encode_direct16(&Bitmap::new(&base, w, h), &mut dst);

        let patch_px = gradient(4, 2);
        let patch = Bitmap::new(&patch_px, 4, 2);
        update_direct16(w, h, 5, 9, &patch, &mut dst);

        let back = decode_direct16(&dst, w, h);
        for y in 0..h {
            for x in 0..w {
                let got = back[(y * w + x) as usize];
                let inside = (5..9).contains(&x) && (9..11).contains(&y);
                let want = if inside {
                    patch_px[((y - 9) * 4 + (x - 5)) as usize].truncated()
                } else {
                    BitmapCol::BLACK.truncated()
                };
                assert_eq!(got, want, "texel ({x}, {y})");
            }
        }
    }
}
