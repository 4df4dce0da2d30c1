//! Twiddled (bit-interleaved) texel addressing.
//!
//! A twiddled index interleaves X and Y bits for the square part of the
//! texture and stores the excess dimension's bits linearly above them
//! (highest bits leftmost):
//!
//! ```text
//! w == h : xyxy xyxy
//! w >  h : xxxx xyxy
//! h >  w : yyyy xyxy
//! ```
//!
//! With `mask_x` holding every X bit position, the index of `x + 1` is
//! `(x_bits - mask_x) & mask_x`: subtracting the mask adds one at the lowest
//! X bit and lets the carry skip over the Y positions. The same holds for Y.
//! The final address is `x_bits | y_bits`.

/// Bit masks selecting the X and Y positions of a twiddled index.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct Twiddle {
    pub mask_x: u32,
    pub mask_y: u32,
}

impl Twiddle {
    /// Derives the masks for a power-of-two `width` x `height` texture.
    pub fn factors(width: u32, height: u32) -> Self {
        let (mut w, mut h) = (width, height);
        let mut mask_x = 0u32;
        let mut mask_y = 0u32;
        let mut shift = 0u32;

        while w > 1 || h > 1 {
            if w > 1 && h > 1 {
                mask_x |= 0b10 << shift;
                mask_y |= 0b01 << shift;
                shift += 2;
            } else if w > 1 {
                mask_x |= 1 << shift;
                shift += 1;
            } else {
                mask_y |= 1 << shift;
                shift += 1;
            }
            w >>= 1;
            h >>= 1;
        }

        Self { mask_x, mask_y }
    }

    /// X bits of the column after the one encoded in `x`.
    #[inline]
    pub const fn next_x(self, x: u32) -> u32 {
        x.wrapping_sub(self.mask_x) & self.mask_x
    }

    /// Y bits of the row after the one encoded in `y`.
    #[inline]
    pub const fn next_y(self, y: u32) -> u32 {
        y.wrapping_sub(self.mask_y) & self.mask_y
    }

    /// X bits of column `n`, found by stepping from column 0.
    pub fn seek_x(self, n: u32) -> u32 {
        (0..n).fold(0, |x, _| self.next_x(x))
    }

    /// Y bits of row `n`, found by stepping from row 0.
    pub fn seek_y(self, n: u32) -> u32 {
        (0..n).fold(0, |y, _| self.next_y(y))
    }

    /// Destination index of texel `(x, y)`.
    #[inline]
    pub fn index(self, x: u32, y: u32) -> usize {
        (self.seek_x(x) | self.seek_y(y)) as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SIZES: [u32; 8] = [1, 2, 4, 8, 16, 32, 64, 128];

    #[test]
    fn square_layout_is_morton_order() {
        let t = Twiddle::factors(2, 2);
        assert_eq!(t.index(0, 0), 0);
        assert_eq!(t.index(0, 1), 1);
        assert_eq!(t.index(1, 0), 2);
        assert_eq!(t.index(1, 1), 3);

        let t = Twiddle::factors(4, 4);
        assert_eq!(t, Twiddle { mask_x: 0b1010, mask_y: 0b0101 });
        assert_eq!(t.index(3, 1), 0b1011);
    }

    #[test]
    fn wide_texture_puts_excess_x_bits_on_top() {
        let t = Twiddle::factors(16, 4);
        assert_eq!(t.mask_x, 0b11_10_10);
        assert_eq!(t.mask_y, 0b00_01_01);

        let steps: Vec<u32> = (0..9).map(|n| t.seek_x(n)).collect();
        assert_eq!(
            steps,
            vec![
                0b000000, 0b000010, 0b001000, 0b001010, 0b010000, 0b010010, 0b011000, 0b011010,
                0b100000
            ]
        );
    }

    #[test]
    fn tall_texture_puts_excess_y_bits_on_top() {
        let t = Twiddle::factors(4, 8);
        assert_eq!(t.mask_x, 0b0_10_10);
        assert_eq!(t.mask_y, 0b1_01_01);
        assert_eq!(t.index(0, 4), 0b1_00_00);
    }

    #[test]
    fn masks_partition_the_address_bits() {
        for &w in &SIZES {
            for &h in &SIZES {
                let t = Twiddle::factors(w, h);
                assert_eq!(t.mask_x & t.mask_y, 0);
                assert_eq!((t.mask_x | t.mask_y) as u64 + 1, (w * h) as u64);
            }
        }
    }

    #[test]
    fn stepping_visits_every_slot_once_then_wraps() {
        for &w in &SIZES {
            for &h in &SIZES {
                let t = Twiddle::factors(w, h);
                let mut seen = vec![false; (w * h) as usize];

                let mut y = 0;
                for _ in 0..h {
                    let mut x = 0;
                    for _ in 0..w {
                        let idx = (x | y) as usize;
                        assert!(!seen[idx], "{w}x{h}: slot {idx} visited twice");
                        seen[idx] = true;
                        x = t.next_x(x);
                    }
                    assert_eq!(x, 0, "{w}x{h}: x did not wrap");
                    y = t.next_y(y);
                }
                assert_eq!(y, 0, "{w}x{h}: y did not wrap");
                assert!(seen.iter().all(|&s| s));
            }
        }
    }
}
