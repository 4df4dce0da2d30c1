use crate::paint::BitmapCol;

/// Borrowed view of a 32-bit source bitmap.
///
/// `row_stride` is measured in pixels and may exceed `width` when the bitmap
/// is a window into a larger atlas.
#[derive(Debug, Copy, Clone)]
pub struct Bitmap<'a> {
    pub pixels: &'a [BitmapCol],
    pub width: u32,
    pub height: u32,
    pub row_stride: u32,
}

impl<'a> Bitmap<'a> {
    /// A tightly packed bitmap (`row_stride == width`).
    #[inline]
    pub fn new(pixels: &'a [BitmapCol], width: u32, height: u32) -> Self {
        Self {
            pixels,
            width,
            height,
            row_stride: width,
        }
    }

    #[inline]
    pub fn with_row_stride(mut self, row_stride: u32) -> Self {
        self.row_stride = row_stride;
        self
    }

    /// Whether `pixels` covers every addressed row.
    #[inline]
    pub fn is_complete(&self) -> bool {
        if self.width == 0 || self.height == 0 {
            return true;
        }
        let needed = (self.height as usize - 1) * self.row_stride as usize + self.width as usize;
        self.row_stride >= self.width && self.pixels.len() >= needed
    }

    /// Pixels of row `y`, exactly `width` long.
    #[inline]
    pub fn row(&self, y: u32) -> &'a [BitmapCol] {
        let start = y as usize * self.row_stride as usize;
        &self.pixels[start..start + self.width as usize]
    }

    #[inline]
    pub fn rows(&self) -> impl Iterator<Item = &'a [BitmapCol]> + '_ {
        (0..self.height).map(move |y| self.row(y))
    }
}
