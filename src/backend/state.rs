//! Redundant state filtering.
//!
//! Remembers what was last sent to the backend and drops transitions that
//! would not change anything. Unknown state (after construction or `reset`)
//! is always sent.

use rustc_hash::FxHashMap;

use crate::backend::{
    Capability, CullMode, FixedFunction, FrontFace, PolygonMode, ShadeModel, TextureId,
};

#[derive(Debug, Default)]
pub struct StateTracker {
    capabilities: FxHashMap<Capability, bool>,
    cull_mode: Option<CullMode>,
    front_face: Option<FrontFace>,
    polygon_mode: Option<PolygonMode>,
    shade_model: Option<ShadeModel>,
    bound_texture: Option<TextureId>,
}

impl StateTracker {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Forgets everything, so the next transition of each state is issued.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn set_capability<B: FixedFunction>(&mut self, backend: &mut B, cap: Capability, on: bool) {
        if self.capabilities.get(&cap) == Some(&on) {
            return;
        }
        if on {
            backend.enable(cap);
        } else {
            backend.disable(cap);
        }
        self.capabilities.insert(cap, on);
    }

    #[inline]
    pub fn enable<B: FixedFunction>(&mut self, backend: &mut B, cap: Capability) {
        self.set_capability(backend, cap, true);
    }

    #[inline]
    pub fn disable<B: FixedFunction>(&mut self, backend: &mut B, cap: Capability) {
        self.set_capability(backend, cap, false);
    }

    pub fn cull_face<B: FixedFunction>(&mut self, backend: &mut B, mode: CullMode) {
        if self.cull_mode != Some(mode) {
            backend.cull_face(mode);
            self.cull_mode = Some(mode);
        }
    }

    pub fn front_face<B: FixedFunction>(&mut self, backend: &mut B, dir: FrontFace) {
        if self.front_face != Some(dir) {
            backend.front_face(dir);
            self.front_face = Some(dir);
        }
    }

    pub fn polygon_mode<B: FixedFunction>(&mut self, backend: &mut B, mode: PolygonMode) {
        if self.polygon_mode != Some(mode) {
            backend.polygon_mode(mode);
            self.polygon_mode = Some(mode);
        }
    }

    pub fn shade_model<B: FixedFunction>(&mut self, backend: &mut B, model: ShadeModel) {
        if self.shade_model != Some(model) {
            backend.shade_model(model);
            self.shade_model = Some(model);
        }
    }

    pub fn bind_texture<B: FixedFunction>(&mut self, backend: &mut B, id: TextureId) {
        if self.bound_texture != Some(id) {
            backend.bind_texture(id);
            self.bound_texture = Some(id);
        }
    }

    /// Called when a texture object is deleted behind the tracker's back.
    pub fn forget_texture(&mut self, id: TextureId) {
        if self.bound_texture == Some(id) {
            self.bound_texture = None;
        }
    }
}
