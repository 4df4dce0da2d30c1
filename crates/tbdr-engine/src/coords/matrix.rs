//! 4x4 matrices in row-vector convention.
//!
//! A point transforms as `p * M`; translation lives in `row4`, and
//! `a.mul(&b)` applies `a` first, then `b`.

use std::ops::Mul;

/// Near plane distance used by every perspective projection.
pub const PERSPECTIVE_Z_NEAR: f32 = 0.1;

#[repr(C)]
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct Vec4 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub w: f32,
}

impl Vec4 {
    #[inline]
    pub const fn new(x: f32, y: f32, z: f32, w: f32) -> Self {
        Self { x, y, z, w }
    }
}

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Matrix {
    pub row1: Vec4,
    pub row2: Vec4,
    pub row3: Vec4,
    pub row4: Vec4,
}

impl Default for Matrix {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Perspective projection plus the reciprocal of its near plane.
///
/// After projection a vertex on the near plane has `1 / w == near_clip_w`;
/// anything with a larger `1 / w` lies in front of the near plane.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Perspective {
    pub matrix: Matrix,
    pub near_clip_w: f32,
}

impl Matrix {
    pub const IDENTITY: Self = Self {
        row1: Vec4::new(1.0, 0.0, 0.0, 0.0),
        row2: Vec4::new(0.0, 1.0, 0.0, 0.0),
        row3: Vec4::new(0.0, 0.0, 1.0, 0.0),
        row4: Vec4::new(0.0, 0.0, 0.0, 1.0),
    };

    /// Transforms the point `(x, y, z, 1)`.
    #[inline]
    pub fn transform_point(&self, x: f32, y: f32, z: f32) -> Vec4 {
        let (a, b, c, d) = (self.row1, self.row2, self.row3, self.row4);
        Vec4 {
            x: x * a.x + y * b.x + z * c.x + d.x,
            y: x * a.y + y * b.y + z * c.y + d.y,
            z: x * a.z + y * b.z + z * c.z + d.z,
            w: x * a.w + y * b.w + z * c.w + d.w,
        }
    }

    #[inline]
    fn transform_vec(&self, v: Vec4) -> Vec4 {
        let (a, b, c, d) = (self.row1, self.row2, self.row3, self.row4);
        Vec4 {
            x: v.x * a.x + v.y * b.x + v.z * c.x + v.w * d.x,
            y: v.x * a.y + v.y * b.y + v.z * c.y + v.w * d.y,
            z: v.x * a.z + v.y * b.z + v.z * c.z + v.w * d.z,
            w: v.x * a.w + v.y * b.w + v.z * c.w + v.w * d.w,
        }
    }

    /// Off-center orthographic projection with left = 0, right = `width`,
    /// top = 0, bottom = `height` (right-handed).
    pub fn ortho(width: f32, height: f32, z_near: f32, z_far: f32) -> Self {
        let mut m = Self::IDENTITY;
        m.row1.x = 2.0 / width;
        m.row2.y = -2.0 / height;
        m.row3.z = 1.0 / (z_near - z_far);

        m.row4.x = -1.0;
        m.row4.y = 1.0;
        m.row4.z = z_near / (z_near - z_far);
        m
    }

    /// Right-handed perspective projection from a vertical field of view in radians.
    ///
    /// The near plane is fixed at [`PERSPECTIVE_Z_NEAR`]. A zero `fov` or
    /// `aspect` yields non-finite entries.
    pub fn perspective(fov: f32, aspect: f32, z_far: f32) -> Perspective {
        let z_near = PERSPECTIVE_Z_NEAR;
        let c = 1.0 / (0.5 * fov).tan();

        let mut m = Self::IDENTITY;
        m.row1.x = c / aspect;
        m.row2.y = c;
        m.row3.z = z_far / (z_near - z_far);
        m.row3.w = -1.0;
        m.row4.z = (z_near * z_far) / (z_near - z_far);
        m.row4.w = 0.0;

        Perspective {
            matrix: m,
            near_clip_w: 1.0 / z_near,
        }
    }

    /// Maps clip space onto the pixel rectangle `(x, y, w, h)`, flipping Y so
    /// that clip-space +1 lands on the top row.
    pub fn viewport(x: f32, y: f32, w: f32, h: f32) -> Self {
        let mut m = Self::IDENTITY;
        m.row1.x = w * 0.5;
        m.row2.y = h * -0.5;
        m.row4.x = x + w * 0.5;
        m.row4.y = y + h * 0.5;
        m
    }
}

impl Mul for Matrix {
    type Output = Matrix;

    fn mul(self, rhs: Matrix) -> Matrix {
        Matrix {
            row1: rhs.transform_vec(self.row1),
            row2: rhs.transform_vec(self.row2),
            row3: rhs.transform_vec(self.row3),
            row4: rhs.transform_vec(self.row4),
        }
    }
}
