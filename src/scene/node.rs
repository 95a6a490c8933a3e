use glam::Affine3A;

use crate::resources::mesh::{Line, Mesh, ParticleSet, Sprite};
use crate::scene::NodeKey;
use crate::scene::camera::Camera;
use crate::scene::light::Light;
use crate::scene::transform::Transform;

/// What a node contributes to a frame.
///
/// A node is exactly one of these; the collector matches on it exhaustively.
#[derive(Debug, Clone)]
pub enum NodeKind {
    /// Pure transform node; contributes only through its children.
    Group,
    Camera(Camera),
    Mesh(Mesh),
    Line(Line),
    ParticleSet(ParticleSet),
    Sprite(Sprite),
    Light(Light),
}

impl From<Camera> for NodeKind {
    fn from(camera: Camera) -> Self {
        Self::Camera(camera)
    }
}

impl From<Mesh> for NodeKind {
    fn from(mesh: Mesh) -> Self {
        Self::Mesh(mesh)
    }
}

impl From<Line> for NodeKind {
    fn from(line: Line) -> Self {
        Self::Line(line)
    }
}

impl From<ParticleSet> for NodeKind {
    fn from(particles: ParticleSet) -> Self {
        Self::ParticleSet(particles)
    }
}

impl From<Sprite> for NodeKind {
    fn from(sprite: Sprite) -> Self {
        Self::Sprite(sprite)
    }
}

impl From<Light> for NodeKind {
    fn from(light: Light) -> Self {
        Self::Light(light)
    }
}

/// A scene node: hierarchy links, transform, visibility and payload.
///
/// # Visibility
///
/// `visible = false` excludes only this node from drawing; its children are
/// still visited. `frustum_culled = false` draws the node even when its bounds
/// fall outside the view volume.
#[derive(Debug, Clone)]
pub struct Node {
    pub name: Option<String>,

    // === Hierarchy ===
    pub(crate) parent: Option<NodeKey>,
    pub(crate) children: Vec<NodeKey>,

    pub transform: Transform,

    // === Render flags ===
    pub visible: bool,
    pub frustum_culled: bool,
    /// Overrides the view-space depth used for sorting.
    pub render_depth: Option<f32>,

    pub kind: NodeKind,
}

impl Node {
    #[must_use]
    pub fn new(kind: impl Into<NodeKind>) -> Self {
        Self {
            name: None,
            parent: None,
            children: Vec::new(),
            transform: Transform::new(),
            visible: true,
            frustum_culled: true,
            render_depth: None,
            kind: kind.into(),
        }
    }

    #[must_use]
    pub fn group() -> Self {
        Self::new(NodeKind::Group)
    }

    #[must_use]
    pub fn with_name(mut self, name: &str) -> Self {
        self.name = Some(name.to_string());
        self
    }

    #[inline]
    #[must_use]
    pub fn parent(&self) -> Option<NodeKey> {
        self.parent
    }

    #[inline]
    #[must_use]
    pub fn children(&self) -> &[NodeKey] {
        &self.children
    }

    #[inline]
    #[must_use]
    pub fn world_matrix(&self) -> &Affine3A {
        &self.transform.world_matrix
    }

    #[inline]
    #[must_use]
    pub fn camera(&self) -> Option<&Camera> {
        match &self.kind {
            NodeKind::Camera(camera) => Some(camera),
            _ => None,
        }
    }

    #[inline]
    #[must_use]
    pub fn mesh(&self) -> Option<&Mesh> {
        match &self.kind {
            NodeKind::Mesh(mesh) => Some(mesh),
            _ => None,
        }
    }

    #[inline]
    pub fn mesh_mut(&mut self) -> Option<&mut Mesh> {
        match &mut self.kind {
            NodeKind::Mesh(mesh) => Some(mesh),
            _ => None,
        }
    }

    #[inline]
    #[must_use]
    pub fn light(&self) -> Option<&Light> {
        match &self.kind {
            NodeKind::Light(light) => Some(light),
            _ => None,
        }
    }
}

impl Default for Node {
    fn default() -> Self {
        Self::group()
    }
}
