//! Compiled-list cache tests
//!
//! Tests for:
//! - List reuse across frames for unchanged content
//! - Volatile objects (content changed under a list) staying immediate
//! - List sharing between objects with the same geometry and material
//! - Explicit invalidation and disposal
//! - Allocation failures: reported once, retried after the interval

use glam::Vec3;
use retrogl::backend::{Command, FixedFunction, MatrixMode, RecordingBackend};
use retrogl::resources::primitives::plane;
use retrogl::scene::camera::Camera;
use retrogl::scene::node::Node;
use retrogl::{
    Invalidation, Material, Mesh, NodeKey, RenderError, Renderer, RendererSettings, Scene,
};

// ============================================================================
// Helpers
// ============================================================================

fn setup_with(settings: RendererSettings) -> (Renderer<RecordingBackend>, Scene, NodeKey) {
    let _ = env_logger::builder().is_test(true).try_init();

    let renderer = Renderer::new(RecordingBackend::new(800, 600), settings).unwrap();
    let mut scene = Scene::new();
    let mut camera = Node::new(Camera::new_perspective(60.0, 800.0 / 600.0, 0.1, 100.0));
    camera.transform.position = Vec3::new(0.0, 0.0, 10.0);
    let camera = scene.add_node(camera);
    (renderer, scene, camera)
}

fn setup() -> (Renderer<RecordingBackend>, Scene, NodeKey) {
    setup_with(RendererSettings::default())
}

fn add_plane(scene: &mut Scene) -> NodeKey {
    let geometry = scene.add_geometry(plane(2.0, 2.0));
    let material = scene.add_material(Material::new_basic(Vec3::new(1.0, 0.0, 0.0)));
    scene.add_node(Node::new(Mesh::new(geometry, material)))
}

fn count(commands: &[Command], pred: impl Fn(&Command) -> bool) -> usize {
    commands.iter().filter(|c| pred(c)).count()
}

fn frame(renderer: &mut Renderer<RecordingBackend>, scene: &mut Scene, camera: NodeKey) -> Vec<Command> {
    renderer.render(scene, camera).unwrap();
    renderer.backend_mut().take_commands()
}

// ============================================================================
// Reuse
// ============================================================================

#[test]
fn unchanged_object_replays_same_list() {
    let (mut renderer, mut scene, camera) = setup();
    let mesh = add_plane(&mut scene);

    let first = frame(&mut renderer, &mut scene, camera);
    let (_, id) = renderer.object_state(mesh).unwrap().list.unwrap();
    assert_eq!(count(&first, |c| matches!(c, Command::NewList(_))), 1);
    assert_eq!(renderer.info().render.calls, 1);
    assert_eq!(renderer.info().render.faces, 2);

    let second = frame(&mut renderer, &mut scene, camera);
    let (_, again) = renderer.object_state(mesh).unwrap().list.unwrap();
    assert_eq!(id, again);
    assert_eq!(count(&second, |c| matches!(c, Command::NewList(_))), 0);
    assert_eq!(count(&second, |c| *c == Command::CallList(id)), 1);
    assert_eq!(count(&second, |c| matches!(c, Command::Begin(_))), 0);

    let info = renderer.info();
    assert_eq!(info.render.calls, 1);
    assert_eq!(info.render.faces, 2);
    assert_eq!(info.render.vertices, 6);
    assert_eq!(info.memory.lists, 1);
}

#[test]
fn compiled_list_holds_the_triangle_stream() {
    let (mut renderer, mut scene, camera) = setup();
    let mesh = add_plane(&mut scene);

    frame(&mut renderer, &mut scene, camera);
    let (_, id) = renderer.object_state(mesh).unwrap().list.unwrap();
    let body = renderer.backend().list_commands(id).unwrap();

    assert_eq!(body.first(), Some(&Command::Begin(retrogl::backend::Primitive::Triangles)));
    assert_eq!(body.last(), Some(&Command::End));
    assert_eq!(count(body, |c| matches!(c, Command::Vertex(_))), 6);
    assert_eq!(count(body, |c| matches!(c, Command::PushMatrix)), 0);
}

// ============================================================================
// Volatile objects
// ============================================================================

#[test]
fn list_lost_by_the_backend_is_recompiled() {
    let (mut renderer, mut scene, camera) = setup();
    let mesh = add_plane(&mut scene);

    frame(&mut renderer, &mut scene, camera);
    let (_, id) = renderer.object_state(mesh).unwrap().list.unwrap();
    renderer.backend_mut().delete_list(id);
    assert!(!renderer.backend().is_list(id));

    let commands = frame(&mut renderer, &mut scene, camera);
    let state = renderer.object_state(mesh).unwrap();
    let (_, rebuilt) = state.list.unwrap();
    assert!(!state.volatile);
    assert_ne!(rebuilt, id);
    assert!(renderer.backend().is_list(rebuilt));
    assert_eq!(count(&commands, |c| *c == Command::CallList(id)), 0);
    assert_eq!(count(&commands, |c| *c == Command::CallList(rebuilt)), 1);
    assert_eq!(renderer.info().render.calls, 1);
    assert_eq!(renderer.info().memory.lists, 1);
}

#[test]
fn mutated_geometry_turns_object_volatile_for_good() {
    let (mut renderer, mut scene, camera) = setup();
    let mesh = add_plane(&mut scene);
    let geometry = scene.get_node(mesh).unwrap().mesh().unwrap().geometry;

    frame(&mut renderer, &mut scene, camera);
    assert_eq!(renderer.backend().live_lists(), 1);

    scene.geometry_mut(geometry).unwrap().vertices_mut()[0].x -= 0.5;
    let changed = frame(&mut renderer, &mut scene, camera);

    let state = renderer.object_state(mesh).unwrap();
    assert!(state.volatile);
    assert!(state.list.is_none());
    assert_eq!(renderer.backend().live_lists(), 0);
    assert_eq!(count(&changed, |c| matches!(c, Command::CallList(_))), 0);
    assert_eq!(count(&changed, |c| matches!(c, Command::Begin(_))), 1);
    assert_eq!(renderer.info().render.faces, 2);

    // Content is stable again, but the object stays immediate.
    for _ in 0..3 {
        let later = frame(&mut renderer, &mut scene, camera);
        assert!(renderer.object_state(mesh).unwrap().volatile);
        assert_eq!(count(&later, |c| matches!(c, Command::NewList(_))), 0);
        assert_eq!(count(&later, |c| matches!(c, Command::Begin(_))), 1);
    }
}

#[test]
fn material_update_turns_object_volatile() {
    let (mut renderer, mut scene, camera) = setup();
    let mesh = add_plane(&mut scene);
    let material = scene
        .get_node(mesh)
        .unwrap()
        .mesh()
        .unwrap()
        .material
        .single()
        .unwrap();

    frame(&mut renderer, &mut scene, camera);
    scene.material_mut(material).unwrap().mark_needs_update();
    frame(&mut renderer, &mut scene, camera);

    assert!(renderer.object_state(mesh).unwrap().volatile);
    assert!(!scene.material(material).unwrap().needs_update);
}

#[test]
fn update_flags_are_cleared_after_the_frame() {
    let (mut renderer, mut scene, camera) = setup();
    let mesh = add_plane(&mut scene);
    let geometry = scene.get_node(mesh).unwrap().mesh().unwrap().geometry;

    scene.geometry_mut(geometry).unwrap().colors_mut().push(Vec3::ONE);
    assert!(scene.geometry(geometry).unwrap().needs_update());

    frame(&mut renderer, &mut scene, camera);
    assert!(!scene.geometry(geometry).unwrap().needs_update());
    // First sight of the object: compiled, not volatile.
    assert!(!renderer.object_state(mesh).unwrap().volatile);
}

// ============================================================================
// Sharing
// ============================================================================

#[test]
fn objects_with_same_geometry_and_material_share_one_list() {
    let (mut renderer, mut scene, camera) = setup();
    let geometry = scene.add_geometry(plane(1.0, 1.0));
    let material = scene.add_material(Material::new_basic(Vec3::ONE));

    let mut left = Node::new(Mesh::new(geometry, material));
    left.transform.position = Vec3::new(-2.0, 0.0, 0.0);
    let mut right = Node::new(Mesh::new(geometry, material));
    right.transform.position = Vec3::new(2.0, 0.0, 0.0);
    let left = scene.add_node(left);
    let right = scene.add_node(right);

    let commands = frame(&mut renderer, &mut scene, camera);

    let (_, a) = renderer.object_state(left).unwrap().list.unwrap();
    let (_, b) = renderer.object_state(right).unwrap().list.unwrap();
    assert_eq!(a, b);
    assert_eq!(renderer.backend().live_lists(), 1);
    assert_eq!(count(&commands, |c| matches!(c, Command::NewList(_))), 1);
    assert_eq!(count(&commands, |c| *c == Command::CallList(a)), 2);
    assert_eq!(renderer.info().render.calls, 2);
    assert_eq!(renderer.info().render.faces, 4);
}

// ============================================================================
// Invalidation & disposal
// ============================================================================

#[test]
fn invalidate_is_idempotent() {
    let (mut renderer, mut scene, camera) = setup();
    let mesh = add_plane(&mut scene);
    let geometry = scene.get_node(mesh).unwrap().mesh().unwrap().geometry;
    let unused = scene.add_geometry(plane(1.0, 1.0));

    frame(&mut renderer, &mut scene, camera);

    renderer.invalidate(Invalidation::Geometry(unused));
    assert_eq!(renderer.backend().live_lists(), 1);

    renderer.invalidate(Invalidation::Geometry(geometry));
    assert_eq!(renderer.backend().live_lists(), 0);
    let before = renderer.backend().commands().len();
    renderer.invalidate(Invalidation::Geometry(geometry));
    assert_eq!(renderer.backend().commands().len(), before);

    // The object recompiles instead of turning volatile.
    let commands = frame(&mut renderer, &mut scene, camera);
    assert_eq!(count(&commands, |c| matches!(c, Command::NewList(_))), 1);
    assert!(!renderer.object_state(mesh).unwrap().volatile);
}

#[test]
fn disposed_resources_free_their_backend_objects() {
    let (mut renderer, mut scene, camera) = setup();
    let mesh = add_plane(&mut scene);
    let geometry = scene.get_node(mesh).unwrap().mesh().unwrap().geometry;

    frame(&mut renderer, &mut scene, camera);
    assert_eq!(renderer.info().memory.lists, 1);

    scene.dispose_geometry(geometry);
    let commands = frame(&mut renderer, &mut scene, camera);

    assert_eq!(renderer.info().memory.lists, 0);
    assert_eq!(renderer.backend().live_lists(), 0);
    assert_eq!(count(&commands, |c| matches!(c, Command::DeleteList(_))), 1);
    assert_eq!(renderer.info().render.calls, 0);
}

#[test]
fn removed_nodes_lose_their_render_state() {
    let (mut renderer, mut scene, camera) = setup();
    let mesh = add_plane(&mut scene);

    frame(&mut renderer, &mut scene, camera);
    assert!(renderer.object_state(mesh).is_some());

    scene.remove_node(mesh);
    frame(&mut renderer, &mut scene, camera);
    assert!(renderer.object_state(mesh).is_none());
}

#[test]
fn release_resources_frees_everything() {
    let (mut renderer, mut scene, camera) = setup();
    add_plane(&mut scene);
    frame(&mut renderer, &mut scene, camera);

    renderer.release_resources();
    assert_eq!(renderer.backend().live_lists(), 0);
    assert_eq!(renderer.info().memory.lists, 0);
}

// ============================================================================
// Allocation failures
// ============================================================================

#[test]
fn failed_list_allocation_draws_immediately_and_retries_later() {
    let settings = RendererSettings {
        resource_retry_interval: 3,
        ..Default::default()
    };
    let (mut renderer, mut scene, camera) = setup_with(settings);
    let mesh = add_plane(&mut scene);
    renderer.backend_mut().fail_list_allocations(1);

    // Frame 1 fails, frames 2 and 3 wait out the interval.
    for _ in 0..3 {
        let commands = frame(&mut renderer, &mut scene, camera);
        assert_eq!(count(&commands, |c| matches!(c, Command::NewList(_))), 0);
        assert_eq!(count(&commands, |c| matches!(c, Command::Begin(_))), 1);
        assert_eq!(renderer.info().render.faces, 2);
    }

    let commands = frame(&mut renderer, &mut scene, camera);
    assert_eq!(count(&commands, |c| matches!(c, Command::NewList(_))), 1);
    let state = renderer.object_state(mesh).unwrap();
    assert!(state.list.is_some());
    assert!(!state.volatile);
}

#[test]
fn resource_error_describes_the_resource() {
    let error = RenderError::ResourceCreation {
        kind: retrogl::errors::ResourceKind::CompiledList,
        source: retrogl::BackendError::ListAllocationFailed,
    };
    let message = error.to_string();
    assert!(message.contains("compiled list"));
}

#[test]
fn matrix_stacks_are_balanced_after_each_frame() {
    let (mut renderer, mut scene, camera) = setup();
    add_plane(&mut scene);
    let empty = scene.add_geometry(retrogl::Geometry::new());
    let material = scene.add_material(Material::new_basic(Vec3::ONE));
    scene.add_node(Node::new(Mesh::new(empty, material)));

    for _ in 0..3 {
        frame(&mut renderer, &mut scene, camera);
        let backend = renderer.backend();
        assert_eq!(backend.matrix_depth(MatrixMode::ModelView), 0);
        assert_eq!(backend.matrix_depth(MatrixMode::Projection), 0);
        assert_eq!(backend.stack_underflows(), 0);
        assert!(!backend.is_compiling());
    }
}
