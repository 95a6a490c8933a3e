//! Scene graph.
//!
//! - Node: hierarchy, transform, visibility and payload
//! - Transform: TRS with cached local/world matrices
//! - Scene: node pool plus geometry/material/texture pools
//! - Camera, Light: node payloads

pub mod camera;
pub mod light;
pub mod node;
pub mod scene;
pub mod transform;
pub mod transform_system;

pub use camera::{Camera, Frustum, ProjectionType};
pub use light::{Light, LightKind};
pub use node::{Node, NodeKind};
pub use scene::Scene;
pub use transform::Transform;

use slotmap::new_key_type;

new_key_type! {
    pub struct NodeKey;
}
