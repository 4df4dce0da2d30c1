use bytemuck::{Pod, Zeroable};

use crate::cmdlist::{CommandList, END_OF_STRIP, HwVertex, PARA_VERTEX, Record};
use crate::coords::Matrix;
use crate::paint::PackedCol;

/// Position and packed color.
#[repr(C)]
#[derive(Debug, Copy, Clone, Default, PartialEq, Pod, Zeroable)]
pub struct VertexColoured {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub col: PackedCol,
}

/// Position, packed color and texture coordinates.
#[repr(C)]
#[derive(Debug, Copy, Clone, Default, PartialEq, Pod, Zeroable)]
pub struct VertexTextured {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub col: PackedCol,
    pub u: f32,
    pub v: f32,
}

const _: () = assert!(std::mem::size_of::<VertexColoured>() == 16);
const _: () = assert!(std::mem::size_of::<VertexTextured>() == 24);

/// Fixed vertex layouts accepted by the draw calls.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Hash)]
pub enum VertexFormat {
    #[default]
    Coloured,
    Textured,
}

impl VertexFormat {
    /// Bytes per vertex.
    #[inline]
    pub const fn stride(self) -> usize {
        match self {
            VertexFormat::Coloured => std::mem::size_of::<VertexColoured>(),
            VertexFormat::Textured => std::mem::size_of::<VertexTextured>(),
        }
    }
}

/// A client vertex that can be expanded into hardware vertices.
pub trait SourceVertex: Pod {
    const FORMAT: VertexFormat;

    fn position(&self) -> (f32, f32, f32);
    fn color(&self) -> PackedCol;

    fn uv(&self) -> (f32, f32) {
        (0.0, 0.0)
    }
}

impl SourceVertex for VertexColoured {
    const FORMAT: VertexFormat = VertexFormat::Coloured;

    #[inline]
    fn position(&self) -> (f32, f32, f32) {
        (self.x, self.y, self.z)
    }

    #[inline]
    fn color(&self) -> PackedCol {
        self.col
    }
}

impl SourceVertex for VertexTextured {
    const FORMAT: VertexFormat = VertexFormat::Textured;

    #[inline]
    fn position(&self) -> (f32, f32, f32) {
        (self.x, self.y, self.z)
    }

    #[inline]
    fn color(&self) -> PackedCol {
        self.col
    }

    #[inline]
    fn uv(&self) -> (f32, f32) {
        (self.u, self.v)
    }
}

/// Per-draw parameters of quad expansion.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct QuadTransform {
    /// Object to screen transform (view, projection, then viewport).
    pub matrix: Matrix,
    /// Largest accepted `1 / w`; see [`crate::coords::Perspective`].
    pub near_clip_w: f32,
    /// Added to every texture coordinate.
    pub uv_offset: (f32, f32),
}

impl Default for QuadTransform {
    fn default() -> Self {
        Self {
            matrix: Matrix::IDENTITY,
            near_clip_w: f32::INFINITY,
            uv_offset: (0.0, 0.0),
        }
    }
}

/// Strip order of a quad's corners: the hardware draws `0 1 3 2` as two
/// triangles sharing the 1-3 edge.
const STRIP_ORDER: [usize; 4] = [0, 1, 3, 2];

fn project<V: SourceVertex>(v: &V, t: &QuadTransform) -> Option<HwVertex> {
    let (x, y, z) = v.position();
    let p = t.matrix.transform_point(x, y, z);
    if p.w <= 0.0 {
        return None;
    }
    let inv_w = 1.0 / p.w;
    if inv_w > t.near_clip_w {
        return None;
    }

    let (u, v_) = v.uv();
    Some(HwVertex {
        flags: PARA_VERTEX,
        x: p.x * inv_w,
        y: p.y * inv_w,
        z: inv_w,
        u: u + t.uv_offset.0,
        v: v_ + t.uv_offset.1,
        argb: v.color().0,
        oargb: 0,
    })
}

/// Expands `vertices` (four per quad) into hardware strips at the end of `list`.
///
/// Quads with any corner behind the near plane are dropped whole. Returns the
/// number of quads written; trailing vertices that do not form a quad are
/// ignored.
pub fn expand_quads<V: SourceVertex>(
    vertices: &[V],
    t: &QuadTransform,
    list: &mut CommandList,
) -> usize {
    let quads = vertices.len() / 4;
    if quads == 0 {
        return 0;
    }

    let dst = list.reserve(list.len() + quads * 4);
    let mut written = 0;

    for quad in vertices.chunks_exact(4) {
        let mut corners = [HwVertex::default(); 4];
        let mut visible = true;
        for (slot, &i) in corners.iter_mut().zip(STRIP_ORDER.iter()) {
            match project(&quad[i], t) {
                Some(hw) => *slot = hw,
                None => {
                    visible = false;
                    break;
                }
            }
        }
        if !visible {
            continue;
        }
        corners[3].flags |= END_OF_STRIP;

        let out = &mut dst[written * 4..written * 4 + 4];
        for (rec, hw) in out.iter_mut().zip(corners) {
            *rec = Record::from(hw);
        }
        written += 1;
    }

    list.commit(written * 4);
    written
}
