//! Backend resources owned by the renderer.
//!
//! Texture objects are keyed by texture; compiled lists by the
//! (geometry, material, primitive) triple they were built from, so objects
//! sharing a geometry and material share one list. Entries whose keys no
//! longer resolve in the scene are freed by [`ResourceCache::prune`].
//!
//! Allocation failures are reported once per resource and retried after
//! `retry_interval` frames instead of every frame.

use rustc_hash::FxHashMap;

use crate::backend::{
    FixedFunction, ListId, Primitive, StateTracker, TexParam, TextureFilter, TextureId,
    TextureWrap,
};
use crate::errors::{BackendError, RenderError, ResourceKind};
use crate::resources::texture::Texture;
use crate::resources::{GeometryKey, MaterialKey, TextureKey};
use crate::scene::Scene;

/// Identity of a compiled list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListKey {
    pub geometry: GeometryKey,
    pub material: MaterialKey,
    pub primitive: Primitive,
}

/// A compiled list and the content it was compiled from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListEntry {
    pub id: ListId,
    pub geometry_version: u64,
    pub material_version: u64,
    /// Whether texture coordinates were emitted.
    pub textured: bool,
    pub faces: u32,
    pub vertices: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Slot {
    Texture(TextureKey),
    List(ListKey),
}

#[derive(Debug)]
pub struct ResourceCache {
    textures: FxHashMap<TextureKey, TextureId>,
    lists: FxHashMap<ListKey, ListEntry>,
    /// Frame of the most recent failed allocation per resource.
    failures: FxHashMap<Slot, u64>,
    retry_interval: u64,
}

impl ResourceCache {
    #[must_use]
    pub fn new(retry_interval: u64) -> Self {
        Self {
            textures: FxHashMap::default(),
            lists: FxHashMap::default(),
            failures: FxHashMap::default(),
            retry_interval,
        }
    }

    pub fn set_retry_interval(&mut self, frames: u64) {
        self.retry_interval = frames;
    }

    #[inline]
    #[must_use]
    pub fn texture_count(&self) -> usize {
        self.textures.len()
    }

    #[inline]
    #[must_use]
    pub fn list_count(&self) -> usize {
        self.lists.len()
    }

    /// Resources currently waiting for an allocation retry.
    #[must_use]
    pub fn pending_failures(&self) -> usize {
        self.failures.len()
    }

    // ========================================================================
    // Textures
    // ========================================================================

    /// Returns the backend texture for `texture`, creating it on first use
    /// and re-uploading when `needs_update` is set. The flag is consumed.
    ///
    /// Returns `None` when the texture cannot be drawn: no pixels yet, a
    /// non-UV mapping, or a failed allocation.
    pub fn texture<B: FixedFunction>(
        &mut self,
        backend: &mut B,
        state: &mut StateTracker,
        key: TextureKey,
        texture: &mut Texture,
        frame: u64,
    ) -> Option<TextureId> {
        if !texture.is_uploadable() {
            return None;
        }

        if let Some(&id) = self.textures.get(&key) {
            if texture.needs_update {
                upload(backend, state, id, texture);
                texture.needs_update = false;
            }
            return Some(id);
        }

        let slot = Slot::Texture(key);
        if !self.may_attempt(slot, frame) {
            return None;
        }

        match backend.gen_texture() {
            Ok(id) => {
                self.failures.remove(&slot);

                state.bind_texture(backend, id);
                backend.tex_parameter(TexParam::MinFilter(TextureFilter::Nearest));
                backend.tex_parameter(TexParam::MagFilter(TextureFilter::Nearest));
                backend.tex_parameter(TexParam::WrapS(TextureWrap::Repeat));
                backend.tex_parameter(TexParam::WrapT(TextureWrap::Repeat));
                upload(backend, state, id, texture);
                texture.needs_update = false;

                log::debug!("Created texture {} for {}", id.0, texture.uuid);
                self.textures.insert(key, id);
                Some(id)
            }
            Err(err) => {
                self.record_failure(slot, ResourceKind::Texture, err, frame);
                None
            }
        }
    }

    /// Frees the backend texture of `key`, if any. Idempotent.
    pub fn invalidate_texture<B: FixedFunction>(
        &mut self,
        backend: &mut B,
        state: &mut StateTracker,
        key: TextureKey,
    ) {
        if let Some(id) = self.textures.remove(&key) {
            backend.delete_texture(id);
            state.forget_texture(id);
            log::debug!("Deleted texture {}", id.0);
        }
        self.failures.remove(&Slot::Texture(key));
    }

    // ========================================================================
    // Compiled lists
    // ========================================================================

    #[inline]
    #[must_use]
    pub fn list(&self, key: &ListKey) -> Option<&ListEntry> {
        self.lists.get(key)
    }

    /// Reserves a list name for `key`. Honors the retry interval after a
    /// failure; `None` means "draw immediately this time".
    pub fn allocate_list<B: FixedFunction>(
        &mut self,
        backend: &mut B,
        key: ListKey,
        frame: u64,
    ) -> Option<ListId> {
        let slot = Slot::List(key);
        if !self.may_attempt(slot, frame) {
            return None;
        }
        match backend.gen_list() {
            Ok(id) => {
                self.failures.remove(&slot);
                Some(id)
            }
            Err(err) => {
                self.record_failure(slot, ResourceKind::CompiledList, err, frame);
                None
            }
        }
    }

    /// Registers a freshly compiled list, freeing any list it replaces.
    pub fn insert_list<B: FixedFunction>(&mut self, backend: &mut B, key: ListKey, entry: ListEntry) {
        if let Some(old) = self.lists.insert(key, entry)
            && old.id != entry.id
        {
            backend.delete_list(old.id);
        }
        log::debug!("Compiled list {} ({} faces)", entry.id.0, entry.faces);
    }

    /// Removes and frees the list of `key`, if any.
    pub fn remove_list<B: FixedFunction>(&mut self, backend: &mut B, key: &ListKey) {
        if let Some(entry) = self.lists.remove(key) {
            backend.delete_list(entry.id);
            log::debug!("Deleted list {}", entry.id.0);
        }
    }

    /// Frees every list compiled from `geometry`. Idempotent.
    pub fn invalidate_geometry<B: FixedFunction>(&mut self, backend: &mut B, geometry: GeometryKey) {
        self.remove_lists_where(backend, |key| key.geometry == geometry);
    }

    /// Frees every list compiled with `material`. Idempotent.
    pub fn invalidate_material<B: FixedFunction>(&mut self, backend: &mut B, material: MaterialKey) {
        self.remove_lists_where(backend, |key| key.material == material);
    }

    // ========================================================================
    // Maintenance
    // ========================================================================

    /// Frees everything built from resources that were disposed from `scene`.
    pub fn prune<B: FixedFunction>(
        &mut self,
        backend: &mut B,
        state: &mut StateTracker,
        scene: &Scene,
    ) {
        self.remove_lists_where(backend, |key| {
            !scene.geometries.contains_key(key.geometry) || !scene.materials.contains_key(key.material)
        });

        self.textures.retain(|&key, &mut id| {
            let alive = scene.textures.contains_key(key);
            if !alive {
                backend.delete_texture(id);
                state.forget_texture(id);
                log::debug!("Deleted texture {} of disposed texture", id.0);
            }
            alive
        });

        self.failures.retain(|slot, _| match slot {
            Slot::Texture(key) => scene.textures.contains_key(*key),
            Slot::List(key) => {
                scene.geometries.contains_key(key.geometry) && scene.materials.contains_key(key.material)
            }
        });
    }

    /// Frees every backend resource.
    pub fn release_all<B: FixedFunction>(&mut self, backend: &mut B, state: &mut StateTracker) {
        for (_, entry) in self.lists.drain() {
            backend.delete_list(entry.id);
        }
        for (_, id) in self.textures.drain() {
            backend.delete_texture(id);
            state.forget_texture(id);
        }
        self.failures.clear();
    }

    fn remove_lists_where<B: FixedFunction>(
        &mut self,
        backend: &mut B,
        mut predicate: impl FnMut(&ListKey) -> bool,
    ) {
        self.lists.retain(|key, entry| {
            let remove = predicate(key);
            if remove {
                backend.delete_list(entry.id);
                log::debug!("Deleted list {}", entry.id.0);
            }
            !remove
        });
    }

    fn may_attempt(&self, slot: Slot, frame: u64) -> bool {
        self.failures
            .get(&slot)
            .is_none_or(|&failed| frame.saturating_sub(failed) >= self.retry_interval)
    }

    fn record_failure(&mut self, slot: Slot, kind: ResourceKind, source: BackendError, frame: u64) {
        let first = self.failures.insert(slot, frame).is_none();
        let error = RenderError::ResourceCreation { kind, source };
        if first {
            log::warn!("{error}; retrying in {} frames", self.retry_interval);
        } else {
            log::debug!("{error} (retry failed)");
        }
    }
}

fn upload<B: FixedFunction>(backend: &mut B, state: &mut StateTracker, id: TextureId, texture: &Texture) {
    let Some(image) = texture.image() else {
        return;
    };
    backend.pixel_store_flip_y(texture.flip_y);
    state.bind_texture(backend, id);
    backend.tex_image_2d(image.width, image.height, image.data());
}
