use slotmap::SlotMap;

use crate::resources::geometry::Geometry;
use crate::resources::material::Material;
use crate::resources::texture::Texture;
use crate::resources::{GeometryKey, MaterialKey, TextureKey};
use crate::scene::NodeKey;
use crate::scene::node::Node;
use crate::scene::transform_system;

/// Scene graph plus the resource pools its nodes reference.
///
/// Resources are shared by key: several meshes may point at the same
/// geometry or material. Disposing a resource removes it from its pool; the
/// renderer notices the dead key on the next frame and frees whatever it
/// created for it.
pub struct Scene {
    pub nodes: SlotMap<NodeKey, Node>,
    pub root_nodes: Vec<NodeKey>,

    // ==== Resource pools ====
    pub geometries: SlotMap<GeometryKey, Geometry>,
    pub materials: SlotMap<MaterialKey, Material>,
    pub textures: SlotMap<TextureKey, Texture>,

    /// When set, the renderer refreshes world matrices before each frame.
    pub auto_update: bool,
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}

impl Scene {
    #[must_use]
    pub fn new() -> Self {
        Self {
            nodes: SlotMap::with_key(),
            root_nodes: Vec::new(),
            geometries: SlotMap::with_key(),
            materials: SlotMap::with_key(),
            textures: SlotMap::with_key(),
            auto_update: true,
        }
    }

    // ========================================================================
    // Hierarchy
    // ========================================================================

    /// Adds a node at the root level.
    pub fn add_node(&mut self, node: Node) -> NodeKey {
        let key = self.nodes.insert(node);
        self.root_nodes.push(key);
        key
    }

    /// Adds a node as the last child of `parent`. Falls back to the root level
    /// when `parent` is not a live node.
    pub fn add_to_parent(&mut self, mut child: Node, parent: NodeKey) -> NodeKey {
        if !self.nodes.contains_key(parent) {
            log::warn!("add_to_parent: parent node not found, adding at root level");
            return self.add_node(child);
        }

        child.parent = Some(parent);
        let key = self.nodes.insert(child);
        self.nodes[parent].children.push(key);
        key
    }

    /// Re-parents `child` under `parent`.
    pub fn attach(&mut self, child: NodeKey, parent: NodeKey) {
        if child == parent {
            log::warn!("Cannot attach node to itself");
            return;
        }
        if !self.nodes.contains_key(child) || !self.nodes.contains_key(parent) {
            log::error!("attach: node not found");
            return;
        }
        if self.is_ancestor(child, parent) {
            log::warn!("attach: refusing to create a cycle");
            return;
        }

        self.detach_from_parent(child);

        self.nodes[parent].children.push(child);
        let node = &mut self.nodes[child];
        node.parent = Some(parent);
        node.transform.mark_dirty();
    }

    /// Removes a node and its whole subtree.
    pub fn remove_node(&mut self, key: NodeKey) {
        if !self.nodes.contains_key(key) {
            return;
        }
        self.detach_from_parent(key);

        let mut stack = vec![key];
        while let Some(current) = stack.pop() {
            if let Some(node) = self.nodes.remove(current) {
                stack.extend(node.children);
            }
        }
    }

    #[must_use]
    pub fn get_node(&self, key: NodeKey) -> Option<&Node> {
        self.nodes.get(key)
    }

    pub fn get_node_mut(&mut self, key: NodeKey) -> Option<&mut Node> {
        self.nodes.get_mut(key)
    }

    fn detach_from_parent(&mut self, key: NodeKey) {
        let parent = self.nodes.get(key).and_then(Node::parent);
        match parent {
            Some(p) => {
                if let Some(parent_node) = self.nodes.get_mut(p) {
                    parent_node.children.retain(|&c| c != key);
                }
            }
            None => self.root_nodes.retain(|&r| r != key),
        }
        if let Some(node) = self.nodes.get_mut(key) {
            node.parent = None;
        }
    }

    fn is_ancestor(&self, ancestor: NodeKey, node: NodeKey) -> bool {
        let mut current = Some(node);
        while let Some(key) = current {
            if key == ancestor {
                return true;
            }
            current = self.nodes.get(key).and_then(Node::parent);
        }
        false
    }

    /// Propagates local transforms into world matrices.
    pub fn update_matrix_world(&mut self) {
        transform_system::update_hierarchy_iterative(&mut self.nodes, &self.root_nodes);
    }

    // ========================================================================
    // Resources
    // ========================================================================

    pub fn add_geometry(&mut self, geometry: Geometry) -> GeometryKey {
        self.geometries.insert(geometry)
    }

    pub fn add_material(&mut self, material: Material) -> MaterialKey {
        self.materials.insert(material)
    }

    pub fn add_texture(&mut self, texture: Texture) -> TextureKey {
        self.textures.insert(texture)
    }

    #[must_use]
    pub fn geometry(&self, key: GeometryKey) -> Option<&Geometry> {
        self.geometries.get(key)
    }

    pub fn geometry_mut(&mut self, key: GeometryKey) -> Option<&mut Geometry> {
        self.geometries.get_mut(key)
    }

    #[must_use]
    pub fn material(&self, key: MaterialKey) -> Option<&Material> {
        self.materials.get(key)
    }

    pub fn material_mut(&mut self, key: MaterialKey) -> Option<&mut Material> {
        self.materials.get_mut(key)
    }

    #[must_use]
    pub fn texture(&self, key: TextureKey) -> Option<&Texture> {
        self.textures.get(key)
    }

    pub fn texture_mut(&mut self, key: TextureKey) -> Option<&mut Texture> {
        self.textures.get_mut(key)
    }

    /// Drops a geometry. Compiled lists built from it are freed on the next frame.
    pub fn dispose_geometry(&mut self, key: GeometryKey) -> Option<Geometry> {
        self.geometries.remove(key)
    }

    /// Drops a material. Compiled lists built with it are freed on the next frame.
    pub fn dispose_material(&mut self, key: MaterialKey) -> Option<Material> {
        self.materials.remove(key)
    }

    /// Drops a texture. The backend texture object is freed on the next frame.
    pub fn dispose_texture(&mut self, key: TextureKey) -> Option<Texture> {
        self.textures.remove(key)
    }
}
