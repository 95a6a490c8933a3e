//! Light unit assignment tests
//!
//! Tests for:
//! - Ambient accumulation and unit budget
//! - Per-kind light parameters (directional, point, spot)
//! - Units released when lights disappear

use glam::{Vec3, Vec4};
use retrogl::backend::{Capability, Command, LightParam, RecordingBackend};
use retrogl::scene::camera::Camera;
use retrogl::scene::light::Light;
use retrogl::scene::node::Node;
use retrogl::{NodeKey, Renderer, RendererSettings, Scene};
use std::f32::consts::FRAC_PI_6;

// ============================================================================
// Helpers
// ============================================================================

const EPSILON: f32 = 1e-5;

fn approx_eq(a: f32, b: f32) -> bool {
    (a - b).abs() < EPSILON
}

fn vec4_approx(a: Vec4, b: Vec4) -> bool {
    (a - b).abs().max_element() < EPSILON
}

fn setup(backend: RecordingBackend) -> (Renderer<RecordingBackend>, Scene, NodeKey) {
    let _ = env_logger::builder().is_test(true).try_init();

    let renderer = Renderer::new(backend, RendererSettings::default()).unwrap();
    let mut scene = Scene::new();
    let mut camera = Node::new(Camera::new_perspective(60.0, 1.0, 0.1, 100.0));
    camera.transform.position = Vec3::new(0.0, 0.0, 10.0);
    let camera = scene.add_node(camera);
    (renderer, scene, camera)
}

fn add_light(scene: &mut Scene, light: Light, position: Vec3) -> NodeKey {
    let mut node = Node::new(light);
    node.transform.position = position;
    scene.add_node(node)
}

fn light_params(commands: &[Command], unit: u8) -> Vec<LightParam> {
    commands
        .iter()
        .filter_map(|c| match c {
            Command::Light { unit: u, param } if *u == unit => Some(*param),
            _ => None,
        })
        .collect()
}

// ============================================================================
// Budget
// ============================================================================

#[test]
fn ambient_directional_point_use_two_units() {
    let (mut renderer, mut scene, camera) = setup(RecordingBackend::new(64, 64));
    add_light(&mut scene, Light::new_ambient(Vec3::splat(0.5), 0.5), Vec3::ZERO);
    add_light(&mut scene, Light::new_directional(Vec3::ONE, 1.0), Vec3::Y);
    add_light(&mut scene, Light::new_point(Vec3::ONE, 2.0, 0.0), Vec3::X);

    let info = renderer.render(&mut scene, camera).unwrap();
    let backend = renderer.backend();

    assert_eq!(info.render.lights, 3);
    assert!(backend.is_enabled(Capability::Lighting));
    assert!(backend.is_enabled(Capability::Light(0)));
    assert!(backend.is_enabled(Capability::Light(1)));
    for unit in 2..8 {
        assert!(!backend.is_enabled(Capability::Light(unit)));
    }
    assert!(
        backend
            .commands()
            .contains(&Command::LightModelAmbient(Vec4::new(0.25, 0.25, 0.25, 1.0)))
    );
}

#[test]
fn lights_beyond_the_budget_are_ignored() {
    let (mut renderer, mut scene, camera) = setup(RecordingBackend::new(64, 64).with_max_lights(2));
    for i in 0..4 {
        add_light(&mut scene, Light::new_point(Vec3::ONE, 1.0, 0.0), Vec3::X * i as f32);
    }

    let info = renderer.render(&mut scene, camera).unwrap();
    assert_eq!(info.render.lights, 2);
    assert_eq!(renderer.light_units(), 2);

    let commands = renderer.backend().commands();
    // Only the first two lights in collection order were configured.
    assert!(light_params(commands, 0).contains(&LightParam::Position(Vec4::new(0.0, 0.0, 0.0, 1.0))));
    assert!(light_params(commands, 1).contains(&LightParam::Position(Vec4::new(1.0, 0.0, 0.0, 1.0))));
    assert!(light_params(commands, 2).is_empty());
}

#[test]
fn settings_budget_is_clamped_by_context() {
    let (mut renderer, mut scene, camera) = setup(RecordingBackend::new(64, 64));
    renderer.settings_mut().max_lights = 1;
    add_light(&mut scene, Light::new_point(Vec3::ONE, 1.0, 0.0), Vec3::ZERO);
    add_light(&mut scene, Light::new_point(Vec3::ONE, 1.0, 0.0), Vec3::X);

    renderer.render(&mut scene, camera).unwrap();
    assert!(renderer.backend().is_enabled(Capability::Light(0)));
    assert!(!renderer.backend().is_enabled(Capability::Light(1)));
}

#[test]
fn shrinking_the_budget_disables_units_lit_earlier() {
    let (mut renderer, mut scene, camera) = setup(RecordingBackend::new(64, 64));
    for i in 0..3 {
        add_light(&mut scene, Light::new_point(Vec3::ONE, 1.0, 0.0), Vec3::X * i as f32);
    }

    renderer.render(&mut scene, camera).unwrap();
    assert!(renderer.backend().is_enabled(Capability::Light(2)));

    renderer.settings_mut().max_lights = 1;
    let info = renderer.render(&mut scene, camera).unwrap();
    let backend = renderer.backend();

    assert_eq!(info.render.lights, 1);
    assert!(backend.is_enabled(Capability::Light(0)));
    assert!(!backend.is_enabled(Capability::Light(1)));
    assert!(!backend.is_enabled(Capability::Light(2)));
}

#[test]
fn removed_lights_release_their_units() {
    let (mut renderer, mut scene, camera) = setup(RecordingBackend::new(64, 64));
    let a = add_light(&mut scene, Light::new_point(Vec3::ONE, 1.0, 0.0), Vec3::ZERO);
    let b = add_light(&mut scene, Light::new_point(Vec3::ONE, 1.0, 0.0), Vec3::X);

    renderer.render(&mut scene, camera).unwrap();
    assert!(renderer.backend().is_enabled(Capability::Light(1)));

    scene.remove_node(b);
    renderer.render(&mut scene, camera).unwrap();
    assert!(renderer.backend().is_enabled(Capability::Light(0)));
    assert!(!renderer.backend().is_enabled(Capability::Light(1)));

    scene.remove_node(a);
    let info = renderer.render(&mut scene, camera).unwrap();
    assert_eq!(info.render.lights, 0);
    assert!(!renderer.backend().is_enabled(Capability::Lighting));
    assert!(!renderer.backend().is_enabled(Capability::Light(0)));
}

#[test]
fn invisible_lights_are_not_collected() {
    let (mut renderer, mut scene, camera) = setup(RecordingBackend::new(64, 64));
    let light = add_light(&mut scene, Light::new_point(Vec3::ONE, 1.0, 0.0), Vec3::ZERO);
    scene.get_node_mut(light).unwrap().visible = false;

    let info = renderer.render(&mut scene, camera).unwrap();
    assert_eq!(info.render.lights, 0);
    assert!(!renderer.backend().is_enabled(Capability::Lighting));
}

#[test]
fn far_away_lights_are_still_collected() {
    let (mut renderer, mut scene, camera) = setup(RecordingBackend::new(64, 64));
    add_light(&mut scene, Light::new_point(Vec3::ONE, 1.0, 0.0), Vec3::splat(1.0e4));

    let info = renderer.render(&mut scene, camera).unwrap();
    assert_eq!(info.render.lights, 1);
}

// ============================================================================
// Per-kind parameters
// ============================================================================

#[test]
fn directional_light_is_encoded_at_infinity() {
    let (mut renderer, mut scene, camera) = setup(RecordingBackend::new(64, 64));
    add_light(&mut scene, Light::new_directional(Vec3::ONE, 0.5), Vec3::new(0.0, 10.0, 0.0));

    renderer.render(&mut scene, camera).unwrap();
    let params = light_params(renderer.backend().commands(), 0);

    let position = params.iter().find_map(|p| match p {
        LightParam::Position(v) => Some(*v),
        _ => None,
    });
    assert!(vec4_approx(position.unwrap(), Vec4::new(0.0, 1.0, 0.0, 0.0)));
    assert!(params.contains(&LightParam::Diffuse(Vec4::new(0.5, 0.5, 0.5, 1.0))));
    assert!(params.contains(&LightParam::SpotCutoff(180.0)));
}

#[test]
fn point_light_has_no_distance_attenuation() {
    let (mut renderer, mut scene, camera) = setup(RecordingBackend::new(64, 64));
    add_light(&mut scene, Light::new_point(Vec3::X, 3.0, 50.0), Vec3::new(1.0, 2.0, 3.0));

    renderer.render(&mut scene, camera).unwrap();
    let params = light_params(renderer.backend().commands(), 0);

    assert!(params.contains(&LightParam::Position(Vec4::new(1.0, 2.0, 3.0, 1.0))));
    assert!(params.contains(&LightParam::Specular(Vec4::new(3.0, 0.0, 0.0, 1.0))));
    assert!(params.contains(&LightParam::ConstantAttenuation(1.0)));
    assert!(params.contains(&LightParam::LinearAttenuation(0.0)));
    assert!(params.contains(&LightParam::QuadraticAttenuation(0.0)));
}

#[test]
fn spot_light_points_at_its_target() {
    let (mut renderer, mut scene, camera) = setup(RecordingBackend::new(64, 64));
    let spot = Light::new_spot(Vec3::ONE, 1.0, FRAC_PI_6, 10.0).with_target(Vec3::ZERO);
    add_light(&mut scene, spot, Vec3::new(0.0, 5.0, 0.0));

    renderer.render(&mut scene, camera).unwrap();
    let params = light_params(renderer.backend().commands(), 0);

    let mut saw_direction = false;
    let mut saw_cutoff = false;
    for param in &params {
        match param {
            LightParam::SpotDirection(d) => {
                saw_direction = true;
                assert!(approx_eq(d.y, -1.0));
            }
            LightParam::SpotCutoff(c) => {
                saw_cutoff = true;
                assert!(approx_eq(*c, 30.0));
            }
            _ => {}
        }
    }
    assert!(saw_direction && saw_cutoff);
    assert!(params.contains(&LightParam::SpotExponent(10.0)));
}

#[test]
fn wide_spot_cutoff_is_clamped() {
    let (mut renderer, mut scene, camera) = setup(RecordingBackend::new(64, 64));
    add_light(&mut scene, Light::new_spot(Vec3::ONE, 1.0, 3.0, 1.0), Vec3::Y);

    renderer.render(&mut scene, camera).unwrap();
    let params = light_params(renderer.backend().commands(), 0);
    assert!(params.contains(&LightParam::SpotCutoff(90.0)));
}
