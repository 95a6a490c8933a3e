//! Content resources, independent of any backend:
//! - Geometry: face-indexed triangles, colours, UVs, morph targets
//! - Material: illumination model and render states
//! - Texture / Image: pixel payload and upload parameters
//! - Mesh, Line, `ParticleSet`, Sprite: node payloads referencing the above

pub mod geometry;
pub mod image;
pub mod material;
pub mod mesh;
pub mod primitives;
pub mod texture;
pub mod version_tracker;

pub use geometry::{BoundingSphere, Face, Geometry, GeometryUpdate, MorphNormals, MorphTarget};
pub use image::Image;
pub use material::{Material, MaterialKind, Shading, Side, VertexColors};
pub use mesh::{Line, LineTopology, Mesh, MeshMaterial, ParticleSet, Sprite};
pub use texture::{Mapping, Texture};

use slotmap::new_key_type;

new_key_type! {
    pub struct GeometryKey;
    pub struct MaterialKey;
    pub struct TextureKey;
}
