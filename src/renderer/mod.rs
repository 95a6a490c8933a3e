//! Fixed-function renderer.
//!
//! A frame runs synchronously in a fixed order:
//!
//! 1. validate the camera and optionally clear
//! 2. refresh world matrices, collect renderables against the view frustum
//! 3. depth-sort meshes
//! 4. load projection and view matrices, assign light units
//! 5. draw meshes, then lines and particle sets with lighting off
//! 6. clear consumed update flags, flush and present
//!
//! Compiled lists, textures and per-object state persist across frames and
//! are released when the scene resources they were built from disappear.

pub mod collect;
pub mod draw;
pub mod info;
pub mod lighting;
pub mod material_state;
pub mod object_state;
pub mod resource_cache;
pub mod settings;

use glam::{Mat4, Vec3, Vec4};

use crate::backend::{
    Capability, ClearFlags, CullMode, FixedFunction, FrontFace, MatrixMode, StateTracker,
};
use crate::errors::{RenderError, Result};
use crate::resources::{GeometryKey, MaterialKey, TextureKey};
use crate::scene::camera::Frustum;
use crate::scene::node::NodeKind;
use crate::scene::{NodeKey, Scene};

use self::collect::RenderLists;
use self::draw::{DrawContext, PointsKind, draw_mesh, draw_points};
use self::info::{MemoryStats, RenderInfo};
use self::lighting::apply_lights;
use self::object_state::{ObjectRenderState, ObjectStates};
use self::resource_cache::ResourceCache;

pub use self::settings::RendererSettings;

/// Face culling selected with [`Renderer::set_face_culling`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CullFace {
    None,
    #[default]
    Back,
    Front,
    FrontAndBack,
}

/// Winding of front-facing polygons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FrontFaceDirection {
    Cw,
    #[default]
    Ccw,
}

/// A resource whose backend objects should be dropped now instead of on
/// the next prune.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Invalidation {
    Geometry(GeometryKey),
    Material(MaterialKey),
    Texture(TextureKey),
    /// Per-object state: list reference and per-face batches.
    Object(NodeKey),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

/// Renders a [`Scene`] through a [`FixedFunction`] backend.
pub struct Renderer<B: FixedFunction> {
    backend: B,
    settings: RendererSettings,

    state: StateTracker,
    cache: ResourceCache,
    objects: ObjectStates,
    lists: RenderLists,

    info: RenderInfo,
    frame: u64,

    /// Light units reported by the context.
    context_lights: u8,
    width: u32,
    height: u32,
    viewport: Viewport,
    clear_color: Vec4,
}

impl<B: FixedFunction> Renderer<B> {
    /// Creates a renderer over `backend`.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::ContextCreation`] if the backend has no usable
    /// context. This is the only failure that aborts initialization.
    pub fn new(backend: B, settings: RendererSettings) -> Result<Self> {
        let context = backend.context_info().map_err(RenderError::ContextCreation)?;
        log::info!(
            "Renderer created: {}x{}, {} light units",
            context.width,
            context.height,
            context.max_lights
        );

        let mut renderer = Self {
            backend,
            cache: ResourceCache::new(settings.resource_retry_interval),
            settings,
            state: StateTracker::new(),
            objects: ObjectStates::new(),
            lists: RenderLists::new(),
            info: RenderInfo::default(),
            frame: 0,
            context_lights: context.max_lights,
            width: context.width,
            height: context.height,
            viewport: Viewport {
                x: 0,
                y: 0,
                width: context.width,
                height: context.height,
            },
            clear_color: Vec4::new(0.0, 0.0, 0.0, 1.0),
        };

        renderer.backend.clear_color(renderer.clear_color);
        renderer.state.enable(&mut renderer.backend, Capability::DepthTest);
        renderer.state.enable(&mut renderer.backend, Capability::CullFace);
        renderer.state.cull_face(&mut renderer.backend, CullMode::Back);
        renderer.state.front_face(&mut renderer.backend, FrontFace::Ccw);
        renderer.apply_viewport();

        Ok(renderer)
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    #[inline]
    pub fn backend(&self) -> &B {
        &self.backend
    }

    #[inline]
    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    #[inline]
    pub fn settings(&self) -> &RendererSettings {
        &self.settings
    }

    #[inline]
    pub fn settings_mut(&mut self) -> &mut RendererSettings {
        &mut self.settings
    }

    /// Statistics of the last frame.
    #[inline]
    pub fn info(&self) -> &RenderInfo {
        &self.info
    }

    #[inline]
    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    #[inline]
    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Render state remembered for `node`, if it was ever drawn.
    pub fn object_state(&self, node: NodeKey) -> Option<&ObjectRenderState> {
        self.objects.get(node)
    }

    /// Light units used per frame: the configured budget clamped to the
    /// context's unit count.
    pub fn light_units(&self) -> u8 {
        self.settings.max_lights.min(self.context_lights)
    }

    // ========================================================================
    // Configuration
    // ========================================================================

    pub fn set_viewport(&mut self, x: i32, y: i32, width: u32, height: u32) {
        self.viewport = Viewport {
            x,
            y,
            width,
            height,
        };
        self.apply_viewport();
    }

    /// Resizes the canvas to `width`×`height` logical units scaled by the
    /// device pixel ratio and resets the viewport to cover it.
    pub fn set_size(&mut self, width: u32, height: u32) {
        let ratio = self.settings.device_pixel_ratio;
        self.width = (width as f32 * ratio).round() as u32;
        self.height = (height as f32 * ratio).round() as u32;
        self.set_viewport(0, 0, self.width, self.height);
    }

    /// Sets the clear colour; `alpha` defaults to 1.
    pub fn set_clear_color(&mut self, color: Vec3, alpha: Option<f32>) {
        self.clear_color = color.extend(alpha.unwrap_or(1.0));
        self.backend.clear_color(self.clear_color);
    }

    #[inline]
    pub fn clear_color(&self) -> Vec4 {
        self.clear_color
    }

    /// Clears the selected buffers. `None` counts as `true`.
    pub fn clear(&mut self, color: Option<bool>, depth: Option<bool>, stencil: Option<bool>) {
        let flags = ClearFlags::from_buffers(
            color.unwrap_or(true),
            depth.unwrap_or(true),
            stencil.unwrap_or(true),
        );
        if !flags.is_empty() {
            self.backend.clear(flags);
        }
    }

    /// Sets the global culling state. Materials override the cull mode
    /// while they are applied.
    pub fn set_face_culling(&mut self, cull: CullFace, front: FrontFaceDirection) {
        let mode = match cull {
            CullFace::None => {
                self.state.disable(&mut self.backend, Capability::CullFace);
                None
            }
            CullFace::Back => Some(CullMode::Back),
            CullFace::Front => Some(CullMode::Front),
            CullFace::FrontAndBack => Some(CullMode::FrontAndBack),
        };
        if let Some(mode) = mode {
            self.state.enable(&mut self.backend, Capability::CullFace);
            self.state.cull_face(&mut self.backend, mode);
        }

        let winding = match front {
            FrontFaceDirection::Cw => FrontFace::Cw,
            FrontFaceDirection::Ccw => FrontFace::Ccw,
        };
        self.state.front_face(&mut self.backend, winding);
    }

    /// Drops backend objects built from a resource. Calling it for a
    /// resource with nothing cached does nothing.
    pub fn invalidate(&mut self, target: Invalidation) {
        match target {
            Invalidation::Geometry(key) => self.cache.invalidate_geometry(&mut self.backend, key),
            Invalidation::Material(key) => self.cache.invalidate_material(&mut self.backend, key),
            Invalidation::Texture(key) => {
                self.cache
                    .invalidate_texture(&mut self.backend, &mut self.state, key);
            }
            Invalidation::Object(node) => self.objects.invalidate(node),
        }
    }

    /// Frees every texture and compiled list the renderer owns.
    pub fn release_resources(&mut self) {
        self.cache.release_all(&mut self.backend, &mut self.state);
        self.objects = ObjectStates::new();
        self.info.memory = self.memory_stats();
    }

    // ========================================================================
    // Frame
    // ========================================================================

    /// Renders one frame of `scene` as seen from the camera node `camera`.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::NodeNotFound`] if `camera` is not in the
    /// scene and [`RenderError::InvalidCamera`] if it is not a camera. In
    /// both cases nothing is submitted and no renderer state changes.
    pub fn render(&mut self, scene: &mut Scene, camera: NodeKey) -> Result<RenderInfo> {
        let Some(camera_node) = scene.get_node(camera) else {
            log::error!("render: camera node not found");
            return Err(RenderError::NodeNotFound);
        };
        if !matches!(camera_node.kind, NodeKind::Camera(_)) {
            log::error!("render: node is not a camera");
            return Err(RenderError::InvalidCamera);
        }

        if self.settings.auto_clear {
            self.clear(None, None, None);
        }

        self.info = RenderInfo::default();
        self.frame += 1;
        self.cache.set_retry_interval(self.settings.resource_retry_interval);

        if scene.auto_update {
            scene.update_matrix_world();
        }

        let Some((view, projection)) = scene.get_node(camera).and_then(|node| {
            let view = Mat4::from(node.world_matrix().inverse());
            node.camera().map(|cam| (view, cam.projection_matrix()))
        }) else {
            return Err(RenderError::InvalidCamera);
        };
        let frustum = Frustum::from_matrix(projection * view);

        self.lists.collect(scene, &frustum);
        self.cache.prune(&mut self.backend, &mut self.state, scene);
        self.objects.prune(scene);

        if self.settings.sort_objects {
            self.lists.sort_meshes(&view);
        } else {
            self.lists.assign_depths(&view);
        }

        self.backend.matrix_mode(MatrixMode::Projection);
        self.backend.load_matrix(&projection);
        self.backend.matrix_mode(MatrixMode::ModelView);
        self.backend.load_matrix(&view);

        let budget = self.light_units();
        let lights = apply_lights(
            &mut self.backend,
            &mut self.state,
            scene,
            &self.lists.lights,
            budget,
            self.context_lights,
        );
        self.info.render.lights = lights.counted;

        let mut ctx = DrawContext {
            backend: &mut self.backend,
            state: &mut self.state,
            cache: &mut self.cache,
            objects: &mut self.objects,
            stats: &mut self.info.render,
            lighting: lights.lighting,
            force_wireframe: self.settings.force_wireframe,
            frame: self.frame,
        };

        for item in &self.lists.meshes {
            draw_mesh(&mut ctx, scene, item);
        }

        ctx.lighting = false;
        ctx.state.disable(ctx.backend, Capability::Lighting);

        for item in &self.lists.lines {
            draw_points(&mut ctx, scene, item, PointsKind::Lines);
        }
        for item in &self.lists.particles {
            draw_points(&mut ctx, scene, item, PointsKind::Particles);
        }
        if !self.lists.sprites.is_empty() {
            log::trace!("{} sprites collected, sprites are not drawn", self.lists.sprites.len());
        }

        commit_updates(scene, &self.lists);

        self.backend.flush();
        self.backend.swap_buffers();

        self.info.memory = self.memory_stats();
        log::trace!(
            "Frame {}: {} calls, {} faces, {} vertices, {} lights",
            self.frame,
            self.info.render.calls,
            self.info.render.faces,
            self.info.render.vertices,
            self.info.render.lights
        );

        Ok(self.info)
    }

    fn apply_viewport(&mut self) {
        let Viewport {
            x,
            y,
            width,
            height,
        } = self.viewport;
        self.backend.viewport(x, y, width, height);
    }

    fn memory_stats(&self) -> MemoryStats {
        MemoryStats {
            textures: self.cache.texture_count() as u32,
            lists: self.cache.list_count() as u32,
        }
    }
}

/// Clears the update flags of everything drawn this frame. Runs after all
/// objects were drawn so objects sharing a resource all see the flags.
fn commit_updates(scene: &mut Scene, lists: &RenderLists) {
    let drawn = lists
        .meshes
        .iter()
        .chain(&lists.lines)
        .chain(&lists.particles);

    for item in drawn {
        let Some(node) = scene.nodes.get(item.node) else {
            continue;
        };
        let (geometry, materials): (GeometryKey, &[MaterialKey]) = match &node.kind {
            NodeKind::Mesh(mesh) => (mesh.geometry, mesh.material.keys()),
            NodeKind::Line(line) => (line.geometry, std::slice::from_ref(&line.material)),
            NodeKind::ParticleSet(set) => (set.geometry, std::slice::from_ref(&set.material)),
            _ => continue,
        };

        if let Some(geometry) = scene.geometries.get_mut(geometry) {
            geometry.clear_update_flags();
        }
        for key in materials {
            if let Some(material) = scene.materials.get_mut(*key) {
                material.needs_update = false;
            }
        }
    }
}
