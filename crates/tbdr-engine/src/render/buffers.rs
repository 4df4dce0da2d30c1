//! Host-memory vertex buffers.
//!
//! The tile accelerator reads geometry only through command lists, so a
//! "vertex buffer" is plain host memory the client fills and the draw calls
//! expand from. Index buffers exist only as handles: all geometry is drawn
//! as unindexed quads.

use super::vertex::{SourceVertex, VertexFormat};

/// How often the client expects to rewrite a buffer.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum VbUsage {
    /// Filled once after creation.
    Static,
    /// Refilled every frame; may grow on lock.
    Dynamic,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct VbHandle(u32);

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct IbHandle(u32);

#[derive(Debug)]
struct VertexBuffer {
    format: VertexFormat,
    usage: VbUsage,
    /// Word storage keeps every vertex layout 4-byte aligned.
    words: Vec<u32>,
    count: usize,
    locked: bool,
}

impl VertexBuffer {
    fn words_for(format: VertexFormat, count: usize) -> usize {
        format.stride() / 4 * count
    }
}

/// Slot table of vertex buffers plus the index-buffer handle counter.
#[derive(Debug, Default)]
pub struct BufferTable {
    vertex: Vec<Option<VertexBuffer>>,
    next_index: u32,
}

impl BufferTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create_vertex_buffer(
        &mut self,
        format: VertexFormat,
        usage: VbUsage,
        count: usize,
    ) -> VbHandle {
        let vb = VertexBuffer {
            format,
            usage,
            words: vec![0; VertexBuffer::words_for(format, count)],
            count,
            locked: false,
        };

        let index = match self.vertex.iter().position(Option::is_none) {
            Some(i) => {
                self.vertex[i] = Some(vb);
                i
            }
            None => {
                self.vertex.push(Some(vb));
                self.vertex.len() - 1
            }
        };
        VbHandle(index as u32)
    }

    /// Maps `count` vertices of the buffer for writing.
    ///
    /// Returns `None` when the handle is stale, `V` does not match the
    /// buffer's format, or a static buffer is asked for more vertices than it
    /// was created with. Dynamic buffers grow instead.
    pub fn lock<V: SourceVertex>(&mut self, handle: VbHandle, count: usize) -> Option<&mut [V]> {
        let vb = self.vertex.get_mut(handle.0 as usize)?.as_mut()?;
        if vb.format != V::FORMAT {
            log::warn!(
                "vertex buffer {} locked as {:?}, created as {:?}",
                handle.0,
                V::FORMAT,
                vb.format
            );
            return None;
        }
        if count > vb.count {
            match vb.usage {
                VbUsage::Static => return None,
                VbUsage::Dynamic => {
                    vb.words.resize(VertexBuffer::words_for(vb.format, count), 0);
                    vb.count = count;
                }
            }
        }

        vb.locked = true;
        let words = VertexBuffer::words_for(vb.format, count);
        Some(bytemuck::cast_slice_mut(&mut vb.words[..words]))
    }

    pub fn unlock(&mut self, handle: VbHandle) {
        if let Some(Some(vb)) = self.vertex.get_mut(handle.0 as usize) {
            vb.locked = false;
        }
    }

    pub fn delete_vertex_buffer(&mut self, handle: VbHandle) {
        if let Some(slot) = self.vertex.get_mut(handle.0 as usize) {
            *slot = None;
        }
    }

    pub fn vertex_format(&self, handle: VbHandle) -> Option<VertexFormat> {
        self.get(handle).map(|vb| vb.format)
    }

    /// Vertices `[start, start + count)` of an unlocked buffer.
    pub fn vertices<V: SourceVertex>(
        &self,
        handle: VbHandle,
        start: usize,
        count: usize,
    ) -> Option<&[V]> {
        let vb = self.get(handle)?;
        if vb.locked || vb.format != V::FORMAT || start.checked_add(count)? > vb.count {
            return None;
        }
        let all: &[V] = bytemuck::cast_slice(&vb.words);
        Some(&all[start..start + count])
    }

    fn get(&self, handle: VbHandle) -> Option<&VertexBuffer> {
        self.vertex.get(handle.0 as usize)?.as_ref()
    }

    /// Accepted for interface parity; the contents are never read.
    pub fn create_index_buffer(&mut self, _count: usize) -> IbHandle {
        self.next_index = self.next_index.wrapping_add(1);
        IbHandle(self.next_index)
    }

    pub fn delete_index_buffer(&mut self, _handle: IbHandle) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::paint::PackedCol;
    use crate::render::vertex::{VertexColoured, VertexTextured};

    fn v(x: f32) -> VertexColoured {
        VertexColoured { x, y: 0.0, z: 0.0, col: PackedCol::WHITE }
    }

    #[test]
    fn lock_write_unlock_read() {
        let mut t = BufferTable::new();
        let h = t.create_vertex_buffer(VertexFormat::Coloured, VbUsage::Static, 8);
        {
            let dst = t.lock::<VertexColoured>(h, 4).unwrap();
            for (i, d) in dst.iter_mut().enumerate() {
                *d = v(i as f32);
            }
        }
        assert!(t.vertices::<VertexColoured>(h, 0, 4).is_none(), "locked buffers are not drawable");
        t.unlock(h);

        let got = t.vertices::<VertexColoured>(h, 1, 2).unwrap();
        assert_eq!(got, &[v(1.0), v(2.0)]);
    }

    #[test]
    fn format_mismatch_is_rejected() {
        let mut t = BufferTable::new();
        let h = t.create_vertex_buffer(VertexFormat::Coloured, VbUsage::Static, 4);
        assert!(t.lock::<VertexTextured>(h, 4).is_none());
    }

    #[test]
    fn static_buffers_do_not_grow() {
        let mut t = BufferTable::new();
        let h = t.create_vertex_buffer(VertexFormat::Textured, VbUsage::Static, 4);
        assert!(t.lock::<VertexTextured>(h, 5).is_none());
    }

    #[test]
    fn dynamic_buffers_grow_on_lock() {
        let mut t = BufferTable::new();
        let h = t.create_vertex_buffer(VertexFormat::Textured, VbUsage::Dynamic, 4);
        assert_eq!(t.lock::<VertexTextured>(h, 12).unwrap().len(), 12);
        t.unlock(h);
        assert!(t.vertices::<VertexTextured>(h, 8, 4).is_some());
    }

    #[test]
    fn deleted_slots_are_reused() {
        let mut t = BufferTable::new();
        let a = t.create_vertex_buffer(VertexFormat::Coloured, VbUsage::Static, 4);
        let _b = t.create_vertex_buffer(VertexFormat::Coloured, VbUsage::Static, 4);
        t.delete_vertex_buffer(a);
        assert!(t.vertex_format(a).is_none());

        let c = t.create_vertex_buffer(VertexFormat::Textured, VbUsage::Static, 4);
        assert_eq!(c, a);
        assert_eq!(t.vertex_format(c), Some(VertexFormat::Textured));
    }

    #[test]
    fn out_of_range_reads_fail() {
        let mut t = BufferTable::new();
        let h = t.create_vertex_buffer(VertexFormat::Coloured, VbUsage::Static, 4);
        assert!(t.vertices::<VertexColoured>(h, 2, 4).is_none());
        assert!(t.vertices::<VertexColoured>(h, usize::MAX, 2).is_none());
    }
}
