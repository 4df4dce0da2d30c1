use crate::cmdlist::ListType;
use crate::texture::TextureHandle;

/// Snapshot of every piece of GPU state a polygon header encodes.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct RenderState {
    pub culling: bool,
    pub alpha_blend: bool,
    pub alpha_test: bool,
    pub depth_test: bool,
    pub depth_write: bool,
    pub fog: bool,
    /// Set when the textured vertex format is selected.
    pub textures: bool,
    pub scissor_test: bool,
    pub texture: Option<TextureHandle>,
}

impl Default for RenderState {
    fn default() -> Self {
        Self {
            culling: false,
            alpha_blend: false,
            alpha_test: false,
            depth_test: false,
            depth_write: true,
            fog: false,
            textures: false,
            scissor_test: false,
            texture: None,
        }
    }
}

impl RenderState {
    /// List that geometry drawn with this state belongs to.
    ///
    /// Blending wins over alpha testing; everything else is opaque.
    #[inline]
    pub fn target_list(&self) -> ListType {
        if self.alpha_blend {
            ListType::Translucent
        } else if self.alpha_test {
            ListType::Punchthrough
        } else {
            ListType::Opaque
        }
    }
}

/// Current state plus a single "changed since the last header" flag.
///
/// Updates compare snapshots, so writing a value that is already set does not
/// dirty the state.
#[derive(Debug, Clone)]
pub struct StateTracker {
    current: RenderState,
    dirty: bool,
}

impl StateTracker {
    /// Starts dirty so the first geometry always gets a header.
    pub fn new(initial: RenderState) -> Self {
        Self {
            current: initial,
            dirty: true,
        }
    }

    #[inline]
    pub fn current(&self) -> &RenderState {
        &self.current
    }

    /// Applies `f` and reports whether the snapshot changed.
    pub fn update(&mut self, f: impl FnOnce(&mut RenderState)) -> bool {
        let before = self.current;
        f(&mut self.current);
        let changed = before != self.current;
        self.dirty |= changed;
        changed
    }

    #[inline]
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Forces a header before the next geometry even without a state change.
    #[inline]
    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    /// Called once a header describing `current()` has been written.
    #[inline]
    pub fn mark_flushed(&mut self) {
        self.dirty = false;
    }
}

/// Fog falloff function.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum FogMode {
    Linear,
    Exp,
    Exp2,
}

/// Fog table parameters handed to the driver.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum FogTable {
    Linear { start: f32, end: f32 },
    Exp { density: f32 },
    Exp2 { density: f32 },
}

impl FogTable {
    pub fn new(mode: FogMode, density: f32, end: f32) -> Self {
        match mode {
            FogMode::Linear => FogTable::Linear { start: 0.0, end },
            FogMode::Exp => FogTable::Exp { density },
            FogMode::Exp2 => FogTable::Exp2 { density },
        }
    }
}
