use crate::cmdlist::{CommandList, ListType};
use crate::coords::{Matrix, Rect, Viewport};
use crate::device::{DeviceInit, FrameHint, TextureError, TileAccelerator};
use crate::paint::PackedCol;
use crate::texture::{Bitmap, TextureFlags, TextureHandle, TextureObject, TextureStore};

use super::buffers::{BufferTable, IbHandle, VbHandle, VbUsage};
use super::state::{FogMode, FogTable, RenderState, StateTracker};
use super::vertex::{
    QuadTransform, SourceVertex, VertexColoured, VertexFormat, VertexTextured, expand_quads,
};

/// Which matrix [`Gfx::load_matrix`] replaces.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum MatrixType {
    View,
    Projection,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
enum FramePhase {
    Idle,
    Active,
}

#[derive(Debug, Copy, Clone, PartialEq)]
struct FogParams {
    color: PackedCol,
    density: f32,
    end: f32,
    mode: Option<FogMode>,
}

impl Default for FogParams {
    fn default() -> Self {
        Self {
            color: PackedCol::default(),
            density: 1.0,
            end: 16.0,
            mode: None,
        }
    }
}

/// Graphics device context.
///
/// Owns the texture store, the three command lists and the render state, and
/// drives a [`TileAccelerator`]. Everything runs on the caller's thread; a
/// frame is `begin_frame`, any number of state changes and draws, then
/// `end_frame`.
///
/// Polygon headers capture a texture's video-memory address when they are
/// written. When an allocation compacts the heap and moves the bound texture,
/// the next draw writes a fresh header; headers already buffered for other
/// textures keep the old address until the next frame.
pub struct Gfx<D: TileAccelerator> {
    driver: D,
    init: DeviceInit,

    textures: TextureStore,
    buffers: BufferTable,
    lists: [CommandList; 3],

    state: StateTracker,
    phase: FramePhase,
    /// Sticky until the next `begin_frame`.
    param_overflow: bool,

    vertex_format: VertexFormat,
    bound_vb: Option<VbHandle>,

    view: Matrix,
    projection: Matrix,
    viewport: Viewport,
    near_clip_w: f32,
    uv_offset: Option<(f32, f32)>,

    depth_only: bool,
    fog: FogParams,
    clear_color: Option<PackedCol>,
    color_mask_logged: bool,
}

impl<D: TileAccelerator> Gfx<D> {
    pub fn create(init: DeviceInit, driver: D) -> Self {
        let lists = ListType::ALL.map(|lt| {
            let mut list = CommandList::new(lt, init.list_batch);
            list.reserve(init.initial_capacity[lt.index()]);
            list
        });
        let textures = TextureStore::new(&init);
        let (fb_w, fb_h) = init.framebuffer;

        log::info!(
            "graphics device created: {} texture pages of {} bytes ({} bytes), \
             list capacity OP {} / PT {} / TR {}, direct list {:?}",
            textures.heap().page_count(),
            init.page_size,
            textures.heap().capacity(),
            lists[0].capacity(),
            lists[1].capacity(),
            lists[2].capacity(),
            init.direct_list,
        );

        Self {
            driver,
            textures,
            buffers: BufferTable::new(),
            lists,
            state: StateTracker::new(RenderState::default()),
            phase: FramePhase::Idle,
            param_overflow: false,
            vertex_format: VertexFormat::Coloured,
            bound_vb: None,
            view: Matrix::IDENTITY,
            projection: Matrix::IDENTITY,
            viewport: Viewport::new(0.0, 0.0, fb_w as f32, fb_h as f32),
            near_clip_w: f32::INFINITY,
            uv_offset: None,
            depth_only: false,
            fog: FogParams::default(),
            clear_color: None,
            color_mask_logged: false,
            init,
        }
    }

    /// Tears the context down and hands the driver back.
    pub fn free(self) -> D {
        if self.phase == FramePhase::Active {
            log::warn!("graphics device freed inside a frame");
        }
        log::debug!(
            "graphics device freed with {} live textures",
            self.textures.live_count()
        );
        self.driver
    }

    // ── accessors ──

    #[inline]
    pub fn driver(&self) -> &D {
        &self.driver
    }

    #[inline]
    pub fn driver_mut(&mut self) -> &mut D {
        &mut self.driver
    }

    #[inline]
    pub fn init(&self) -> &DeviceInit {
        &self.init
    }

    #[inline]
    pub fn list(&self, list: ListType) -> &CommandList {
        &self.lists[list.index()]
    }

    #[inline]
    pub fn state(&self) -> &RenderState {
        self.state.current()
    }

    #[inline]
    pub fn textures(&self) -> &TextureStore {
        &self.textures
    }

    #[inline]
    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    #[inline]
    pub fn is_frame_active(&self) -> bool {
        self.phase == FramePhase::Active
    }

    // ── frame ──

    /// Opens a scene and, when configured, the direct list.
    ///
    /// Returns [`FrameHint::ReduceWorkingSet`] once after the hardware ran out
    /// of parameter memory.
    pub fn begin_frame(&mut self) -> FrameHint {
        if self.phase == FramePhase::Active {
            log::warn!("begin_frame called twice; ending the previous frame first");
            self.end_frame();
        }

        self.driver.scene_begin();
        if let Some(direct) = self.init.direct_list {
            self.driver.list_begin(direct);
        }
        self.phase = FramePhase::Active;

        let overflow = std::mem::take(&mut self.param_overflow) | self.driver.take_param_overflow();
        if overflow {
            log::debug!("parameter memory exhausted last frame, asking to reduce working set");
            FrameHint::ReduceWorkingSet
        } else {
            FrameHint::Continue
        }
    }

    /// Submits every buffered list in priority order and closes the scene.
    pub fn end_frame(&mut self) {
        if self.phase != FramePhase::Active {
            log::warn!("end_frame called without begin_frame");
            return;
        }

        let direct = self.init.direct_list;
        if let Some(direct) = direct {
            let list = &mut self.lists[direct.index()];
            if !list.is_empty() {
                self.driver.submit(list.records());
                list.clear();
            }
            self.driver.list_finish();
        }

        for lt in ListType::ALL {
            let list = &mut self.lists[lt.index()];
            if Some(lt) == direct || list.is_empty() {
                continue;
            }
            log::trace!("submitting {:?} list: {} records", lt, list.len());
            self.driver.list_begin(lt);
            self.driver.submit(list.records());
            self.driver.list_finish();
            list.clear();
        }

        self.driver.scene_finish();
        self.driver.wait_ready();
        self.phase = FramePhase::Idle;

        if self.driver.take_param_overflow() {
            self.param_overflow = true;
        }
    }

    // ── render state ──

    pub fn set_face_culling(&mut self, enabled: bool) {
        self.state.update(|s| s.culling = enabled);
    }

    pub fn set_depth_test(&mut self, enabled: bool) {
        self.state.update(|s| s.depth_test = enabled);
    }

    pub fn set_depth_write(&mut self, enabled: bool) {
        self.state.update(|s| s.depth_write = enabled);
    }

    pub fn set_alpha_test(&mut self, enabled: bool) {
        self.state.update(|s| s.alpha_test = enabled);
    }

    pub fn set_alpha_blend(&mut self, enabled: bool) {
        self.state.update(|s| s.alpha_blend = enabled);
    }

    /// Drops every draw call while enabled.
    pub fn set_depth_only_rendering(&mut self, depth_only: bool) {
        self.depth_only = depth_only;
    }

    /// Accepted for interface parity; the hardware has no color write mask.
    pub fn set_color_write_mask(&mut self, r: bool, g: bool, b: bool, a: bool) {
        if !self.color_mask_logged {
            self.color_mask_logged = true;
            log::debug!("color write mask ({r}, {g}, {b}, {a}) ignored: not supported");
        }
    }

    /// Sets the background plane color. Best effort: some targets ignore it.
    pub fn clear_color(&mut self, color: PackedCol) {
        if self.clear_color == Some(color) {
            return;
        }
        self.clear_color = Some(color);
        self.driver.set_background_color(color);
    }

    // ── fog ──

    pub fn set_fog(&mut self, enabled: bool) {
        self.state.update(|s| s.fog = enabled);
    }

    pub fn set_fog_color(&mut self, color: PackedCol) {
        if self.fog.color == color {
            return;
        }
        self.fog.color = color;
        self.driver.set_fog_color(color);
    }

    pub fn set_fog_density(&mut self, density: f32) {
        if self.fog.density == density {
            return;
        }
        self.fog.density = density;
        self.update_fog_table();
    }

    pub fn set_fog_end(&mut self, end: f32) {
        if self.fog.end == end {
            return;
        }
        self.fog.end = end;
        self.update_fog_table();
    }

    pub fn set_fog_mode(&mut self, mode: FogMode) {
        if self.fog.mode == Some(mode) {
            return;
        }
        self.fog.mode = Some(mode);
        self.update_fog_table();
    }

    fn update_fog_table(&mut self) {
        if let Some(mode) = self.fog.mode {
            self.driver
                .set_fog_table(FogTable::new(mode, self.fog.density, self.fog.end));
        }
    }

    // ── clipping / viewport ──

    /// Restricts rasterization to `rect`.
    ///
    /// A clip record is appended to all three lists at their current
    /// position, so geometry already buffered is unaffected.
    pub fn set_scissor(&mut self, rect: Rect) {
        let (fb_w, fb_h) = self.init.framebuffer;
        let enabled = !rect.covers(fb_w, fb_h);
        self.state.update(|s| s.scissor_test = enabled);
        self.state.mark_dirty();

        let clip = self.driver.clip_command(rect);
        for list in &mut self.lists {
            list.append(clip);
        }
    }

    pub fn set_viewport(&mut self, x: i32, y: i32, w: i32, h: i32) {
        self.viewport = Viewport::from_rect(Rect::new(x, y, w, h));
    }

    /// Resets the viewport to cover the new framebuffer.
    pub fn on_window_resize(&mut self, width: u32, height: u32) {
        self.init.framebuffer = (width, height);
        self.viewport = Viewport::new(0.0, 0.0, width as f32, height as f32);
    }

    // ── matrices ──

    pub fn load_matrix(&mut self, kind: MatrixType, matrix: &Matrix) {
        match kind {
            MatrixType::View => self.view = *matrix,
            MatrixType::Projection => self.projection = *matrix,
        }
    }

    /// Loads both matrices and returns their product `view * projection`.
    pub fn load_mvp(&mut self, view: &Matrix, projection: &Matrix) -> Matrix {
        self.load_matrix(MatrixType::View, view);
        self.load_matrix(MatrixType::Projection, projection);
        *view * *projection
    }

    pub fn calc_ortho_matrix(&self, width: f32, height: f32, z_near: f32, z_far: f32) -> Matrix {
        Matrix::ortho(width, height, z_near, z_far)
    }

    /// Builds a perspective projection and remembers its near-plane limit
    /// for culling.
    pub fn calc_perspective_matrix(&mut self, fov: f32, aspect: f32, z_far: f32) -> Matrix {
        let p = Matrix::perspective(fov, aspect, z_far);
        self.near_clip_w = p.near_clip_w;
        p.matrix
    }

    pub fn enable_texture_offset(&mut self, x: f32, y: f32) {
        self.uv_offset = Some((x, y));
    }

    pub fn disable_texture_offset(&mut self) {
        self.uv_offset = None;
    }

    fn quad_transform(&self) -> QuadTransform {
        QuadTransform {
            matrix: self.view * self.projection * self.viewport.matrix(),
            near_clip_w: self.near_clip_w,
            uv_offset: self.uv_offset.unwrap_or((0.0, 0.0)),
        }
    }

    // ── textures ──

    /// Creates a texture from `bmp` (whose `row_stride` may exceed its width).
    ///
    /// Mipmaps are not generated; `mipmaps` is accepted and ignored.
    pub fn alloc_texture(
        &mut self,
        bmp: &Bitmap<'_>,
        flags: TextureFlags,
        mipmaps: bool,
    ) -> Result<TextureHandle, TextureError> {
        if mipmaps {
            log::trace!("mipmaps requested for {}x{} texture, ignoring", bmp.width, bmp.height);
        }
        let bound_offset = |textures: &TextureStore, handle: Option<TextureHandle>| {
            handle.and_then(|h| textures.texture(h)?.data).map(|b| b.offset)
        };
        let bound = self.state.current().texture;
        let before = bound_offset(&self.textures, bound);

        let driver = &mut self.driver;
        let result = self
            .textures
            .alloc(bmp, flags, |entry, argb| driver.set_palette_entry(entry, argb));

        // Compaction may have moved the bound texture.
        if bound_offset(&self.textures, bound) != before {
            log::debug!("bound texture moved by compaction, re-emitting header");
            self.state.mark_dirty();
        }
        result
    }

    pub fn update_texture(
        &mut self,
        handle: TextureHandle,
        origin_x: u32,
        origin_y: u32,
        patch: &Bitmap<'_>,
    ) -> Result<(), TextureError> {
        self.textures.update(handle, origin_x, origin_y, patch)
    }

    /// Binds `handle` for subsequent textured draws; `None` unbinds.
    pub fn bind_texture(&mut self, handle: Option<TextureHandle>) {
        self.state.update(|s| s.texture = handle);
        self.state.mark_dirty();
    }

    /// Frees the texture; a bound texture is unbound first.
    pub fn delete_texture(&mut self, handle: TextureHandle) -> Result<(), TextureError> {
        if self.state.current().texture == Some(handle) {
            self.bind_texture(None);
        }
        self.textures.delete(handle)
    }

    #[inline]
    pub fn texture(&self, handle: TextureHandle) -> Option<&TextureObject> {
        self.textures.texture(handle)
    }

    // ── vertex / index buffers ──

    /// Selects the layout of subsequent draws.
    pub fn set_vertex_format(&mut self, format: VertexFormat) {
        self.vertex_format = format;
        let textured = format == VertexFormat::Textured;
        self.state.update(|s| s.textures = textured);
    }

    #[inline]
    pub fn vertex_format(&self) -> VertexFormat {
        self.vertex_format
    }

    pub fn create_vb(&mut self, format: VertexFormat, count: usize) -> VbHandle {
        self.buffers.create_vertex_buffer(format, VbUsage::Static, count)
    }

    pub fn create_dynamic_vb(&mut self, format: VertexFormat, max_vertices: usize) -> VbHandle {
        self.buffers.create_vertex_buffer(format, VbUsage::Dynamic, max_vertices)
    }

    pub fn lock_vb<V: SourceVertex>(&mut self, vb: VbHandle, count: usize) -> Option<&mut [V]> {
        self.buffers.lock(vb, count)
    }

    pub fn unlock_vb(&mut self, vb: VbHandle) {
        self.buffers.unlock(vb);
    }

    pub fn bind_vb(&mut self, vb: VbHandle) {
        self.bound_vb = Some(vb);
    }

    pub fn delete_vb(&mut self, vb: VbHandle) {
        if self.bound_vb == Some(vb) {
            self.bound_vb = None;
        }
        self.buffers.delete_vertex_buffer(vb);
    }

    pub fn create_ib(&mut self, count: usize) -> IbHandle {
        self.buffers.create_index_buffer(count)
    }

    pub fn bind_ib(&mut self, _ib: IbHandle) {}

    pub fn delete_ib(&mut self, ib: IbHandle) {
        self.buffers.delete_index_buffer(ib);
    }

    // ── drawing ──

    /// Draws `vertex_count / 4` quads from the bound vertex buffer, starting
    /// at `start_vertex`. Returns the number of quads written.
    pub fn draw_indexed_quads(&mut self, vertex_count: usize, start_vertex: usize) -> usize {
        match self.vertex_format {
            VertexFormat::Coloured => self.draw_bound::<VertexColoured>(vertex_count, start_vertex),
            VertexFormat::Textured => self.draw_bound::<VertexTextured>(vertex_count, start_vertex),
        }
    }

    /// Textured-layout variant of [`draw_indexed_quads`](Self::draw_indexed_quads).
    pub fn draw_indexed_quads_textured(
        &mut self,
        vertex_count: usize,
        start_vertex: usize,
    ) -> usize {
        self.draw_bound::<VertexTextured>(vertex_count, start_vertex)
    }

    fn draw_bound<V: SourceVertex>(&mut self, vertex_count: usize, start_vertex: usize) -> usize {
        let Some(vb) = self.bound_vb else {
            log::warn!("draw call without a bound vertex buffer");
            return 0;
        };
        let buffers = std::mem::take(&mut self.buffers);
        let written = match buffers.vertices::<V>(vb, start_vertex, vertex_count) {
            Some(vertices) => self.draw_quads(vertices),
            None => {
                log::warn!(
                    "vertex range {}..{} not drawable as {:?}",
                    start_vertex,
                    start_vertex.saturating_add(vertex_count),
                    V::FORMAT
                );
                0
            }
        };
        self.buffers = buffers;
        written
    }

    /// Draws quads straight from a client slice, four vertices per quad.
    ///
    /// Geometry goes to the list chosen by the current blend/alpha-test
    /// state, preceded by a header when the list is empty or the state
    /// changed. Draws to the direct list are submitted immediately.
    pub fn draw_quads<V: SourceVertex>(&mut self, vertices: &[V]) -> usize {
        if self.depth_only || vertices.len() < 4 {
            return 0;
        }
        if V::FORMAT != self.vertex_format {
            log::warn!("{:?} vertices drawn while {:?} is selected", V::FORMAT, self.vertex_format);
            return 0;
        }

        let transform = self.quad_transform();
        let list_type = self.state.current().target_list();
        let list = &mut self.lists[list_type.index()];

        let mark = list.len();
        let wrote_header = list.is_empty() || self.state.is_dirty();
        if wrote_header {
            let state = self.state.current();
            let texture = state.texture.and_then(|h| self.textures.texture(h));
            list.append(self.driver.poly_header(list_type, state, texture));
            self.state.mark_flushed();
        }

        let quads = expand_quads(vertices, &transform, list);
        if quads == 0 {
            // Every quad was culled: no header without geometry after it.
            list.truncate(mark);
            if wrote_header {
                self.state.mark_dirty();
            }
            return 0;
        }

        if self.phase == FramePhase::Active && self.init.direct_list == Some(list_type) {
            self.driver.submit(list.records());
            list.clear();
        }
        quads
    }

    // ── diagnostics ──

    /// Human-readable backend summary including video-memory usage.
    pub fn api_info(&self) -> String {
        const MB: f64 = 1024.0 * 1024.0;
        let heap = self.textures.heap();
        let limits = self.textures.limits();
        let used = heap.total_used() as f64 / MB;
        let free = heap.total_free() as f64 / MB;

        format!(
            "-- Using tile accelerator --\n\
             Texture memory: {used:.2} MB used, {free:.2} MB free\n\
             Textures: {} live, {} palette banks in use\n\
             Max texture size: ({}, {}), {} pixels\n",
            self.textures.live_count(),
            self.textures.palettes().in_use(),
            limits.max_size,
            limits.max_size,
            limits.max_pixels,
        )
    }
}

impl<D: TileAccelerator + std::fmt::Debug> std::fmt::Debug for Gfx<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Gfx")
            .field("driver", &self.driver)
            .field("phase", &self.phase)
            .field("state", self.state.current())
            .field("textures", &self.textures)
            .finish_non_exhaustive()
    }
}
