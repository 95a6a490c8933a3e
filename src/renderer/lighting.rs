//! Light unit assignment.
//!
//! Must run while the model-view matrix holds the view matrix: light
//! positions and directions are given in world space and the backend
//! transforms them by the current model-view matrix.

use glam::{Vec3, Vec4};

use crate::backend::{Capability, FixedFunction, LightParam, StateTracker};
use crate::scene::light::{Light, LightKind};
use crate::scene::{NodeKey, Scene};

/// Cutoff that turns a light unit back into an omnidirectional source.
const NO_SPOT_CUTOFF: f32 = 180.0;

/// Outcome of [`apply_lights`].
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LightSetup {
    /// Whether fixed-function lighting is on for this frame.
    pub lighting: bool,
    /// Light units switched on.
    pub activated: u8,
    /// Ambient plus activated lights.
    pub counted: u32,
    pub ambient: Vec3,
}

/// Assigns light units to the collected lights.
///
/// Ambient lights are summed into the global ambient term and never take a
/// unit. Other lights take units `0..budget` in collection order; the rest
/// are ignored. Every unit in `activated..available` is disabled, so nothing
/// carries over from the previous frame even when the budget shrinks.
pub fn apply_lights<B: FixedFunction>(
    backend: &mut B,
    state: &mut StateTracker,
    scene: &Scene,
    lights: &[NodeKey],
    budget: u8,
    available: u8,
) -> LightSetup {
    let budget = budget.min(available);
    let mut setup = LightSetup::default();
    let mut ambient_count = 0_u32;

    for &key in lights {
        let Some(node) = scene.get_node(key) else {
            continue;
        };
        let Some(light) = node.light() else {
            continue;
        };

        if light.is_ambient() {
            setup.ambient += light.scaled_color();
            ambient_count += 1;
            continue;
        }

        if setup.activated >= budget {
            log::trace!("Light unit budget ({budget}) exhausted, light ignored");
            continue;
        }

        let unit = setup.activated;
        configure_unit(backend, unit, light, node.transform.world_position());
        state.enable(backend, Capability::Light(unit));
        setup.activated += 1;
    }

    for unit in setup.activated..available {
        state.disable(backend, Capability::Light(unit));
    }

    setup.counted = ambient_count + u32::from(setup.activated);
    setup.lighting = !lights.is_empty();

    if setup.lighting {
        backend.light_model_ambient(setup.ambient.extend(1.0));
        state.enable(backend, Capability::Lighting);
    } else {
        state.disable(backend, Capability::Lighting);
    }

    setup
}

fn configure_unit<B: FixedFunction>(backend: &mut B, unit: u8, light: &Light, position: Vec3) {
    let color = light.scaled_color().extend(1.0);

    backend.light(unit, LightParam::Ambient(Vec4::new(0.0, 0.0, 0.0, 1.0)));
    backend.light(unit, LightParam::Diffuse(color));
    backend.light(unit, LightParam::Specular(color));

    match &light.kind {
        LightKind::Directional { target } => {
            let direction = (position - *target).normalize_or_zero();
            backend.light(unit, LightParam::Position(direction.extend(0.0)));
            backend.light(unit, LightParam::SpotCutoff(NO_SPOT_CUTOFF));
        }
        LightKind::Point { .. } => {
            backend.light(unit, LightParam::Position(position.extend(1.0)));
            backend.light(unit, LightParam::SpotCutoff(NO_SPOT_CUTOFF));
            disable_attenuation(backend, unit);
        }
        LightKind::Spot {
            target,
            angle,
            exponent,
            ..
        } => {
            let direction = (*target - position).normalize_or_zero();
            backend.light(unit, LightParam::Position(position.extend(1.0)));
            backend.light(unit, LightParam::SpotDirection(direction));
            backend.light(
                unit,
                LightParam::SpotCutoff(angle.to_degrees().clamp(0.0, 90.0)),
            );
            backend.light(unit, LightParam::SpotExponent(*exponent));
            disable_attenuation(backend, unit);
        }
        LightKind::Ambient => {}
    }
}

// Scene light falloff does not map onto the fixed-function attenuation
// formula, so distance attenuation is switched off.
fn disable_attenuation<B: FixedFunction>(backend: &mut B, unit: u8) {
    backend.light(unit, LightParam::ConstantAttenuation(1.0));
    backend.light(unit, LightParam::LinearAttenuation(0.0));
    backend.light(unit, LightParam::QuadraticAttenuation(0.0));
}
