//! Scene collection tests
//!
//! Tests for:
//! - Bucketing by node kind in depth-first order
//! - Visibility (node only, not subtree) and frustum culling opt-out
//! - Depth assignment and stable sorting

use glam::{Mat4, Vec3};
use retrogl::renderer::collect::RenderLists;
use retrogl::resources::mesh::{Line, LineTopology, ParticleSet, Sprite};
use retrogl::resources::primitives::plane;
use retrogl::scene::camera::{Camera, Frustum};
use retrogl::scene::light::Light;
use retrogl::scene::node::Node;
use retrogl::{Geometry, Material, Mesh, NodeKey, Scene};

// ============================================================================
// Helpers
// ============================================================================

/// Camera at z = 10 looking down -Z.
fn view_and_frustum() -> (Mat4, Frustum) {
    let camera = Camera::new_perspective(60.0, 1.0, 0.1, 100.0);
    let view = Mat4::from_translation(Vec3::new(0.0, 0.0, 10.0)).inverse();
    (view, Frustum::from_matrix(camera.projection_matrix() * view))
}

fn mesh_node(scene: &mut Scene, position: Vec3) -> Node {
    let geometry = scene.add_geometry(plane(1.0, 1.0));
    let material = scene.add_material(Material::new_basic(Vec3::ONE));
    let mut node = Node::new(Mesh::new(geometry, material));
    node.transform.position = position;
    node
}

fn collect(scene: &mut Scene) -> RenderLists {
    scene.update_matrix_world();
    let (_, frustum) = view_and_frustum();
    let mut lists = RenderLists::new();
    lists.collect(scene, &frustum);
    lists
}

fn nodes(items: &[retrogl::renderer::collect::RenderItem]) -> Vec<NodeKey> {
    items.iter().map(|item| item.node).collect()
}

// ============================================================================
// Bucketing
// ============================================================================

#[test]
fn renderables_are_bucketed_by_kind() {
    let mut scene = Scene::new();
    let points = scene.add_geometry(Geometry::from_points(vec![Vec3::ZERO, Vec3::X], Vec::new()));
    let material = scene.add_material(Material::new_basic(Vec3::ONE));

    let mesh = mesh_node(&mut scene, Vec3::ZERO);
    let mesh = scene.add_node(mesh);
    let line = scene.add_node(Node::new(Line::new(points, material, LineTopology::Strip)));
    let particles = scene.add_node(Node::new(ParticleSet::new(points, material)));
    let sprite = scene.add_node(Node::new(Sprite { material }));
    let light = scene.add_node(Node::new(Light::new_ambient(Vec3::ONE, 1.0)));
    scene.add_node(Node::group());

    let lists = collect(&mut scene);
    assert_eq!(nodes(&lists.meshes), vec![mesh]);
    assert_eq!(nodes(&lists.lines), vec![line]);
    assert_eq!(nodes(&lists.particles), vec![particles]);
    assert_eq!(nodes(&lists.sprites), vec![sprite]);
    assert_eq!(lists.lights, vec![light]);
}

#[test]
fn traversal_is_depth_first_in_child_order() {
    let mut scene = Scene::new();
    let a = mesh_node(&mut scene, Vec3::ZERO);
    let a = scene.add_node(a);
    let a1 = mesh_node(&mut scene, Vec3::ZERO);
    let a1 = scene.add_to_parent(a1, a);
    let a1x = mesh_node(&mut scene, Vec3::ZERO);
    let a1x = scene.add_to_parent(a1x, a1);
    let a2 = mesh_node(&mut scene, Vec3::ZERO);
    let a2 = scene.add_to_parent(a2, a);
    let b = mesh_node(&mut scene, Vec3::ZERO);
    let b = scene.add_node(b);

    let lists = collect(&mut scene);
    assert_eq!(nodes(&lists.meshes), vec![a, a1, a1x, a2, b]);
}

#[test]
fn lists_are_refilled_not_appended() {
    let mut scene = Scene::new();
    let node = mesh_node(&mut scene, Vec3::ZERO);
    scene.add_node(node);
    scene.update_matrix_world();

    let (_, frustum) = view_and_frustum();
    let mut lists = RenderLists::new();
    lists.collect(&scene, &frustum);
    lists.collect(&scene, &frustum);
    assert_eq!(lists.meshes.len(), 1);
}

// ============================================================================
// Visibility & culling
// ============================================================================

#[test]
fn invisible_node_does_not_hide_its_children() {
    let mut scene = Scene::new();
    let mut parent = mesh_node(&mut scene, Vec3::ZERO);
    parent.visible = false;
    let parent = scene.add_node(parent);
    let child = mesh_node(&mut scene, Vec3::X);
    let child = scene.add_to_parent(child, parent);

    let lists = collect(&mut scene);
    assert_eq!(nodes(&lists.meshes), vec![child]);
}

#[test]
fn objects_outside_the_frustum_are_culled_unless_opted_out() {
    let mut scene = Scene::new();
    let inside = mesh_node(&mut scene, Vec3::ZERO);
    let inside = scene.add_node(inside);
    let outside = mesh_node(&mut scene, Vec3::new(500.0, 0.0, 0.0));
    scene.add_node(outside);
    let mut forced = mesh_node(&mut scene, Vec3::new(500.0, 0.0, 0.0));
    forced.frustum_culled = false;
    let forced = scene.add_node(forced);

    let lists = collect(&mut scene);
    assert_eq!(nodes(&lists.meshes), vec![inside, forced]);
}

#[test]
fn bounds_follow_the_world_transform() {
    let mut scene = Scene::new();
    let mut parent = Node::group();
    parent.transform.position = Vec3::new(500.0, 0.0, 0.0);
    let parent = scene.add_node(parent);
    let child = mesh_node(&mut scene, Vec3::new(-500.0, 0.0, 0.0));
    let child = scene.add_to_parent(child, parent);

    let lists = collect(&mut scene);
    assert_eq!(nodes(&lists.meshes), vec![child]);
}

#[test]
fn mesh_with_disposed_geometry_is_skipped() {
    let mut scene = Scene::new();
    let node = mesh_node(&mut scene, Vec3::ZERO);
    let geometry = node.mesh().unwrap().geometry;
    scene.add_node(node);
    scene.dispose_geometry(geometry);

    let lists = collect(&mut scene);
    assert!(lists.meshes.is_empty());
}

// ============================================================================
// Depth
// ============================================================================

#[test]
fn sort_is_farthest_first_and_stable() {
    let mut scene = Scene::new();
    let mut keys = Vec::new();
    for z in [0.0, -4.0, 0.0, 2.0] {
        let node = mesh_node(&mut scene, Vec3::new(0.0, 0.0, z));
        keys.push(scene.add_node(node));
    }

    let mut lists = collect(&mut scene);
    let (view, _) = view_and_frustum();
    lists.sort_meshes(&view);

    assert_eq!(nodes(&lists.meshes), vec![keys[1], keys[0], keys[2], keys[3]]);
    let depths: Vec<f32> = lists.meshes.iter().map(|item| item.depth).collect();
    assert_eq!(depths, vec![-14.0, -10.0, -10.0, -8.0]);
}

#[test]
fn assign_depths_keeps_order() {
    let mut scene = Scene::new();
    let near = mesh_node(&mut scene, Vec3::new(0.0, 0.0, 2.0));
    let near = scene.add_node(near);
    let mut far = mesh_node(&mut scene, Vec3::new(0.0, 0.0, -4.0));
    far.render_depth = Some(7.0);
    let far = scene.add_node(far);

    let mut lists = collect(&mut scene);
    let (view, _) = view_and_frustum();
    lists.assign_depths(&view);

    assert_eq!(nodes(&lists.meshes), vec![near, far]);
    assert_eq!(lists.meshes[0].depth, -8.0);
    assert_eq!(lists.meshes[1].depth, 7.0);
}
