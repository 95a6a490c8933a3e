#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::too_many_arguments)]
#![allow(clippy::must_use_candidate)]

//! Scene-graph renderer for fixed-function (OpenGL 1.x style) backends.
//!
//! The host owns a [`Scene`] of nodes and resource pools; a [`Renderer`]
//! turns it into fixed-function calls on any [`FixedFunction`] backend,
//! caching static objects as compiled command lists.

pub mod backend;
pub mod errors;
pub mod renderer;
pub mod resources;
pub mod scene;

pub use backend::{FixedFunction, RecordingBackend};
pub use errors::{BackendError, RenderError, Result};
pub use renderer::info::{MemoryStats, RenderInfo, RenderStats};
pub use renderer::{CullFace, FrontFaceDirection, Invalidation, Renderer, RendererSettings};
pub use resources::{
    Face, Geometry, GeometryKey, Image, Material, MaterialKey, Mesh, MeshMaterial, Texture,
    TextureKey,
};
pub use scene::{Camera, Light, LightKind, Node, NodeKey, NodeKind, Scene};
