use super::{Matrix, Rect};

/// Pixel rectangle that clip space is mapped onto.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct Viewport {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Viewport {
    #[inline]
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self { x, y, width, height }
    }

    #[inline]
    pub fn from_rect(r: Rect) -> Self {
        Self::new(r.x as f32, r.y as f32, r.w as f32, r.h as f32)
    }

    /// Clip-to-pixel transform for this rectangle.
    #[inline]
    pub fn matrix(self) -> Matrix {
        Matrix::viewport(self.x, self.y, self.width, self.height)
    }
}
