//! Per-object drawing.
//!
//! Every cacheable object moves through the same states each frame:
//!
//! ```text
//!   no list ──compile──▶ cached ──replay──▶ cached
//!      ▲                   │
//!      │ texturing         │ content changed while cached
//!      └── changed ◀───────┤
//!                          ▼
//!                       volatile (immediate forever)
//! ```
//!
//! Lists are shared between objects with the same geometry, material and
//! primitive, so a list freed for one object is recompiled by the next
//! object that still wants it.

pub mod emit;
pub mod mesh;
pub mod morph;
pub mod points;

use glam::Mat4;
use slotmap::SlotMap;

use crate::backend::{FixedFunction, StateTracker};
use crate::renderer::info::RenderStats;
use crate::renderer::material_state::MaterialContext;
use crate::renderer::object_state::ObjectStates;
use crate::renderer::resource_cache::{ListEntry, ListKey, ResourceCache};
use crate::resources::TextureKey;
use crate::resources::texture::Texture;
use crate::scene::NodeKey;

pub use mesh::draw_mesh;
pub use points::{PointsKind, draw_points};

/// Amount of geometry produced by one stream.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Emitted {
    pub faces: u32,
    pub vertices: u32,
}

/// What an object wants to replay or compile this frame.
#[derive(Debug, Clone, Copy)]
pub struct ListRequest {
    pub key: ListKey,
    pub geometry_version: u64,
    pub material_version: u64,
    /// Geometry or material carries pending update flags.
    pub changed: bool,
    pub textured: bool,
}

impl ListRequest {
    fn matches(&self, entry: &ListEntry) -> bool {
        entry.geometry_version == self.geometry_version
            && entry.material_version == self.material_version
            && entry.textured == self.textured
    }
}

/// Mutable renderer state threaded through the draw functions.
pub struct DrawContext<'a, B: FixedFunction> {
    pub backend: &'a mut B,
    pub state: &'a mut StateTracker,
    pub cache: &'a mut ResourceCache,
    pub objects: &'a mut ObjectStates,
    pub stats: &'a mut RenderStats,
    pub lighting: bool,
    pub force_wireframe: bool,
    pub frame: u64,
}

impl<B: FixedFunction> DrawContext<'_, B> {
    pub(crate) fn materials<'t>(
        &'t mut self,
        textures: &'t mut SlotMap<TextureKey, Texture>,
    ) -> MaterialContext<'t, B> {
        MaterialContext {
            backend: self.backend,
            state: self.state,
            cache: self.cache,
            textures,
            lighting: self.lighting,
            force_wireframe: self.force_wireframe,
            frame: self.frame,
        }
    }

    /// Runs `draw` with `world` multiplied onto the model-view matrix and
    /// restores the matrix afterwards.
    pub(crate) fn with_model_matrix(&mut self, world: &Mat4, draw: impl FnOnce(&mut Self)) {
        self.backend.push_matrix();
        self.backend.mult_matrix(world);
        draw(self);
        self.backend.pop_matrix();
    }

    /// Replays, adopts or compiles the list `request` describes.
    ///
    /// Returns `false` when the caller has to draw immediately: the object
    /// is volatile, just became volatile, or no list could be allocated.
    pub(crate) fn draw_cached(
        &mut self,
        node: NodeKey,
        request: ListRequest,
        emit: impl FnOnce(&mut B) -> Emitted,
    ) -> bool {
        let object = self.objects.entry(node);
        if object.volatile {
            return false;
        }
        let previous = object.list.take();

        if let Some((key, id)) = previous {
            let entry = self.live_list(&key).filter(|e| e.id == id);

            if key == request.key {
                let stale = request.changed
                    || entry.is_some_and(|e| {
                        e.geometry_version != request.geometry_version
                            || e.material_version != request.material_version
                    });
                if stale {
                    self.objects.entry(node).volatile = true;
                    if entry.is_some() {
                        self.cache.remove_list(self.backend, &key);
                    }
                    log::debug!("Content changed under a compiled list; drawing immediately");
                    return false;
                }
                if let Some(entry) = entry {
                    if entry.textured == request.textured {
                        self.objects.entry(node).list = Some((key, id));
                        self.replay(&entry);
                        return true;
                    }
                    self.cache.remove_list(self.backend, &key);
                }
            }
        }

        // Versions identify content, so a list another object compiled from
        // the current content can be adopted even while flags are pending.
        if let Some(entry) = self.live_list(&request.key) {
            if request.matches(&entry) {
                self.objects.entry(node).list = Some((request.key, entry.id));
                self.replay(&entry);
                return true;
            }
            self.cache.remove_list(self.backend, &request.key);
        }

        let Some(id) = self.cache.allocate_list(self.backend, request.key, self.frame) else {
            return false;
        };

        self.backend.new_list(id);
        let emitted = emit(self.backend);
        self.backend.end_list();

        let entry = ListEntry {
            id,
            geometry_version: request.geometry_version,
            material_version: request.material_version,
            textured: request.textured,
            faces: emitted.faces,
            vertices: emitted.vertices,
        };
        self.cache.insert_list(self.backend, request.key, entry);
        self.objects.entry(node).list = Some((request.key, id));
        self.replay(&entry);
        true
    }

    /// Cache entry of `key`, dropped when the backend no longer has its list.
    fn live_list(&mut self, key: &ListKey) -> Option<ListEntry> {
        let entry = self.cache.list(key).copied()?;
        if self.backend.is_list(entry.id) {
            return Some(entry);
        }
        log::debug!("Backend lost list {}; recompiling", entry.id.0);
        self.cache.remove_list(self.backend, key);
        None
    }

    fn replay(&mut self, entry: &ListEntry) {
        self.backend.call_list(entry.id);
        self.stats.record_call(entry.faces, entry.vertices);
    }

    /// Counts an immediate draw. Batches that emitted nothing are not calls.
    pub(crate) fn record(&mut self, emitted: Emitted) {
        if emitted.vertices == 0 {
            return;
        }
        self.stats.record_call(emitted.faces, emitted.vertices);
    }
}
