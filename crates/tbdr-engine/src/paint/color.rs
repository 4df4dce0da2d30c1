use bytemuck::{Pod, Zeroable};

/// 32-bit pixel as laid out in source bitmaps: bytes B, G, R, A in memory.
///
/// The same packing (`A8 R8 G8 B8` from the high bits down) is what the
/// hardware expects in vertex color words, so it doubles as [`PackedCol`].
#[repr(transparent)]
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash, Pod, Zeroable)]
pub struct BitmapCol(pub u32);

/// Packed vertex color.
pub type PackedCol = BitmapCol;

impl BitmapCol {
    pub const WHITE: Self = Self::new(255, 255, 255, 255);
    pub const BLACK: Self = Self::new(0, 0, 0, 255);

    #[inline]
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self(((a as u32) << 24) | ((r as u32) << 16) | ((g as u32) << 8) | b as u32)
    }

    #[inline]
    pub const fn r(self) -> u8 {
        (self.0 >> 16) as u8
    }

    #[inline]
    pub const fn g(self) -> u8 {
        (self.0 >> 8) as u8
    }

    #[inline]
    pub const fn b(self) -> u8 {
        self.0 as u8
    }

    #[inline]
    pub const fn a(self) -> u8 {
        (self.0 >> 24) as u8
    }

    /// Packs into the texture unit's 16-bit format, `B4 G4 R4 A4` from the low nibble up.
    ///
    /// Each channel keeps its top four bits; the rest is truncated, not rounded.
    #[inline]
    pub const fn to_argb4444(self) -> u16 {
        let b = (self.b() >> 4) as u16;
        let g = (self.g() >> 4) as u16;
        let r = (self.r() >> 4) as u16;
        let a = (self.a() >> 4) as u16;
        b | (g << 4) | (r << 8) | (a << 12)
    }

    /// Inverse of [`to_argb4444`](Self::to_argb4444); low nibbles come back as zero.
    #[inline]
    pub const fn from_argb4444(v: u16) -> Self {
        let b = ((v & 0xF) << 4) as u8;
        let g = (((v >> 4) & 0xF) << 4) as u8;
        let r = (((v >> 8) & 0xF) << 4) as u8;
        let a = (((v >> 12) & 0xF) << 4) as u8;
        Self::new(r, g, b, a)
    }

    /// The color as it survives a round trip through the 16-bit format.
    #[inline]
    pub const fn truncated(self) -> Self {
        Self(self.0 & 0xF0F0_F0F0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn channels_round_trip() {
        let c = BitmapCol::new(0x12, 0x34, 0x56, 0x78);
        assert_eq!((c.r(), c.g(), c.b(), c.a()), (0x12, 0x34, 0x56, 0x78));
        assert_eq!(c.0.to_le_bytes(), [0x56, 0x34, 0x12, 0x78]);
    }

    #[test]
    fn argb4444_truncates_each_channel() {
        let c = BitmapCol::new(0x1F, 0x2F, 0x3F, 0xFF);
        assert_eq!(c.to_argb4444(), 0xF123);
    }

    #[test]
    fn argb4444_inverse_matches_truncation() {
        let c = BitmapCol::new(0xAB, 0xCD, 0xEF, 0x99);
        assert_eq!(BitmapCol::from_argb4444(c.to_argb4444()), c.truncated());
    }
}
