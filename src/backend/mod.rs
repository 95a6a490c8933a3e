//! Fixed-function backend interface.
//!
//! The renderer drives an OpenGL-1.x-style state machine: matrix stacks,
//! immediate `begin`/`end` vertex submission, compiled command lists, texture
//! objects and a bounded set of light units. Anything that implements
//! [`FixedFunction`] can be rendered to; [`RecordingBackend`] is a headless
//! implementation that records the command stream.

pub mod recording;
pub mod state;

pub use recording::{Command, RecordingBackend};
pub use state::StateTracker;

use bitflags::bitflags;
use glam::{Mat4, Vec2, Vec3, Vec4};

use crate::errors::BackendError;

/// Backend name of a compiled command list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListId(pub u32);

/// Backend name of a texture object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TextureId(pub u32);

/// Limits of the rendering context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContextInfo {
    /// Number of hardware light units.
    pub max_lights: u8,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MatrixMode {
    ModelView,
    Projection,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    Lighting,
    /// Light unit `i`.
    Light(u8),
    DepthTest,
    CullFace,
    Texture2D,
}

/// Which polygon faces culling discards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CullMode {
    Front,
    Back,
    FrontAndBack,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FrontFace {
    Cw,
    Ccw,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PolygonMode {
    Fill,
    Line,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShadeModel {
    Flat,
    Smooth,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Primitive {
    Points,
    Lines,
    LineStrip,
    Triangles,
}

bitflags! {
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct ClearFlags: u8 {
        const COLOR   = 1 << 0;
        const DEPTH   = 1 << 1;
        const STENCIL = 1 << 2;
    }
}

impl ClearFlags {
    #[must_use]
    pub fn from_buffers(color: bool, depth: bool, stencil: bool) -> Self {
        let mut flags = Self::empty();
        flags.set(Self::COLOR, color);
        flags.set(Self::DEPTH, depth);
        flags.set(Self::STENCIL, stencil);
        flags
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LightParam {
    /// `w = 0` marks a directional light.
    Position(Vec4),
    Ambient(Vec4),
    Diffuse(Vec4),
    Specular(Vec4),
    SpotDirection(Vec3),
    /// Degrees, `0..=90`, or 180 for "not a spot".
    SpotCutoff(f32),
    SpotExponent(f32),
    ConstantAttenuation(f32),
    LinearAttenuation(f32),
    QuadraticAttenuation(f32),
}

/// Material coefficients, applied to front and back faces.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MaterialParam {
    Ambient(Vec4),
    Diffuse(Vec4),
    Specular(Vec4),
    Emission(Vec4),
    Shininess(f32),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureFilter {
    Nearest,
    Linear,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureWrap {
    Repeat,
    ClampToEdge,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TexParam {
    MinFilter(TextureFilter),
    MagFilter(TextureFilter),
    WrapS(TextureWrap),
    WrapT(TextureWrap),
}

/// An OpenGL-1.x-style fixed-function state machine.
///
/// Between `new_list` and `end_list` the backend records the commands into
/// the list instead of executing them. List and texture allocation may fail;
/// everything else is infallible from the caller's point of view.
pub trait FixedFunction {
    /// Queries the context. Fails when no usable context exists.
    fn context_info(&self) -> Result<ContextInfo, BackendError>;

    // === Matrix stacks ===
    fn matrix_mode(&mut self, mode: MatrixMode);
    fn load_identity(&mut self);
    fn load_matrix(&mut self, matrix: &Mat4);
    fn mult_matrix(&mut self, matrix: &Mat4);
    fn push_matrix(&mut self);
    fn pop_matrix(&mut self);

    // === Framebuffer ===
    fn viewport(&mut self, x: i32, y: i32, width: u32, height: u32);
    fn clear_color(&mut self, color: Vec4);
    fn clear(&mut self, flags: ClearFlags);

    // === Raster state ===
    fn enable(&mut self, cap: Capability);
    fn disable(&mut self, cap: Capability);
    fn cull_face(&mut self, mode: CullMode);
    fn front_face(&mut self, dir: FrontFace);
    fn polygon_mode(&mut self, mode: PolygonMode);
    fn shade_model(&mut self, model: ShadeModel);

    // === Immediate mode ===
    fn begin(&mut self, primitive: Primitive);
    fn end(&mut self);
    fn color3(&mut self, color: Vec3);
    fn normal3(&mut self, normal: Vec3);
    fn tex_coord2(&mut self, uv: Vec2);
    fn vertex3(&mut self, position: Vec3);

    // === Compiled lists ===
    fn gen_list(&mut self) -> Result<ListId, BackendError>;
    fn new_list(&mut self, id: ListId);
    fn end_list(&mut self);
    fn call_list(&mut self, id: ListId);
    fn is_list(&self, id: ListId) -> bool;
    fn delete_list(&mut self, id: ListId);

    // === Textures ===
    fn gen_texture(&mut self) -> Result<TextureId, BackendError>;
    fn bind_texture(&mut self, id: TextureId);
    fn tex_parameter(&mut self, param: TexParam);
    fn pixel_store_flip_y(&mut self, flip: bool);
    /// Uploads tightly packed RGB8 pixels to the bound texture.
    fn tex_image_2d(&mut self, width: u32, height: u32, rgb: &[u8]);
    fn delete_texture(&mut self, id: TextureId);

    // === Lighting ===
    fn light(&mut self, unit: u8, param: LightParam);
    fn light_model_ambient(&mut self, color: Vec4);
    fn material(&mut self, param: MaterialParam);

    // === Presentation ===
    fn flush(&mut self);
    fn swap_buffers(&mut self);
}
