use crate::cmdlist::{ListType, Record};
use crate::coords::Rect;
use crate::paint::BitmapCol;
use crate::render::{FogTable, RenderState};
use crate::texture::TextureObject;

/// The tile accelerator as seen by the renderer.
///
/// Calls arrive in a fixed shape per frame:
///
/// ```text
/// scene_begin
///   (list_begin submit* list_finish)*   // in list priority order
/// scene_finish
/// wait_ready
/// ```
///
/// Encoding of header and clip records is the driver's business; the renderer
/// only decides *when* they go into a list.
pub trait TileAccelerator {
    fn scene_begin(&mut self);

    fn list_begin(&mut self, list: ListType);

    /// Streams records into the list opened by the last `list_begin`.
    ///
    /// Records are DMA aligned. The slice is only borrowed for the call.
    fn submit(&mut self, records: &[Record]);

    fn list_finish(&mut self);

    fn scene_finish(&mut self);

    /// Blocks until the hardware can accept the next scene.
    fn wait_ready(&mut self);

    /// Builds the polygon header describing `state` for geometry in `list`.
    fn poly_header(
        &self,
        list: ListType,
        state: &RenderState,
        texture: Option<&TextureObject>,
    ) -> Record;

    /// Builds a user clip record limiting rasterization to `rect`.
    fn clip_command(&self, rect: Rect) -> Record;

    /// Writes one ARGB4444 entry of palette RAM.
    fn set_palette_entry(&mut self, index: usize, argb4444: u16);

    fn set_fog_color(&mut self, color: BitmapCol);

    fn set_fog_table(&mut self, table: FogTable);

    fn set_background_color(&mut self, color: BitmapCol);

    /// Reports, and clears, the "ran out of parameter memory" condition.
    fn take_param_overflow(&mut self) -> bool {
        false
    }
}
