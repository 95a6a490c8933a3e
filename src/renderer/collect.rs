//! Scene collection.
//!
//! Walks the node hierarchy once per frame and buckets the visible
//! renderables by kind. The bucket vectors live across frames and are
//! cleared and refilled, never reallocated.

use glam::{Mat4, Vec3};

use crate::resources::GeometryKey;
use crate::scene::camera::Frustum;
use crate::scene::node::{Node, NodeKind};
use crate::scene::{NodeKey, Scene};

/// One renderable collected for this frame.
#[derive(Debug, Clone, Copy)]
pub struct RenderItem {
    pub node: NodeKey,
    pub world: Mat4,
    /// Explicit sort depth from the node, if any.
    pub render_depth: Option<f32>,
    /// View-space depth used for sorting; filled by [`RenderLists::sort_meshes`].
    pub depth: f32,
}

impl RenderItem {
    fn new(key: NodeKey, node: &Node) -> Self {
        Self {
            node: key,
            world: node.transform.world_matrix_as_mat4(),
            render_depth: node.render_depth,
            depth: 0.0,
        }
    }
}

/// Per-frame buckets, each in depth-first traversal order.
#[derive(Debug, Default)]
pub struct RenderLists {
    pub meshes: Vec<RenderItem>,
    pub lines: Vec<RenderItem>,
    pub particles: Vec<RenderItem>,
    pub sprites: Vec<RenderItem>,
    pub lights: Vec<NodeKey>,

    stack: Vec<NodeKey>,
}

impl RenderLists {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.meshes.clear();
        self.lines.clear();
        self.particles.clear();
        self.sprites.clear();
        self.lights.clear();
        self.stack.clear();
    }

    /// Refills the buckets from `scene`.
    ///
    /// An invisible node contributes nothing itself but its children are
    /// still visited. Lights are collected without a bounds test; meshes,
    /// lines and particle sets must intersect `frustum` unless they opt out of
    /// culling.
    pub fn collect(&mut self, scene: &Scene, frustum: &Frustum) {
        self.clear();

        self.stack.extend(scene.root_nodes.iter().rev());

        while let Some(key) = self.stack.pop() {
            let Some(node) = scene.nodes.get(key) else {
                continue;
            };

            if node.visible {
                match &node.kind {
                    NodeKind::Light(_) => self.lights.push(key),
                    NodeKind::Mesh(mesh) => {
                        if is_in_frustum(scene, node, mesh.geometry, frustum) {
                            self.meshes.push(RenderItem::new(key, node));
                        }
                    }
                    NodeKind::Line(line) => {
                        if is_in_frustum(scene, node, line.geometry, frustum) {
                            self.lines.push(RenderItem::new(key, node));
                        }
                    }
                    NodeKind::ParticleSet(particles) => {
                        if is_in_frustum(scene, node, particles.geometry, frustum) {
                            self.particles.push(RenderItem::new(key, node));
                        }
                    }
                    NodeKind::Sprite(_) => self.sprites.push(RenderItem::new(key, node)),
                    NodeKind::Group | NodeKind::Camera(_) => {}
                }
            }

            self.stack.extend(node.children.iter().rev());
        }
    }

    /// Assigns each mesh its sort depth: the node's explicit `render_depth`
    /// or the view-space Z of its world origin (more negative is farther).
    pub fn assign_depths(&mut self, view: &Mat4) {
        for item in &mut self.meshes {
            item.depth = item
                .render_depth
                .unwrap_or_else(|| view.transform_point3(world_origin(&item.world)).z);
        }
    }

    /// Orders the meshes farthest first. The sort is stable, so equal depths
    /// keep traversal order.
    pub fn sort_meshes(&mut self, view: &Mat4) {
        self.assign_depths(view);
        self.meshes.sort_by(|a, b| a.depth.total_cmp(&b.depth));
    }
}

fn is_in_frustum(scene: &Scene, node: &Node, geometry: GeometryKey, frustum: &Frustum) -> bool {
    if !node.frustum_culled {
        return true;
    }
    let Some(geometry) = scene.geometry(geometry) else {
        return false;
    };
    let sphere = geometry
        .bounding_sphere()
        .transform(&node.transform.world_matrix_as_mat4());
    frustum.intersects_sphere(sphere.center, sphere.radius.max(0.0))
}

/// World-space origin of a world matrix.
#[inline]
#[must_use]
pub(crate) fn world_origin(world: &Mat4) -> Vec3 {
    world.w_axis.truncate()
}
