use glam::Vec3;
use uuid::Uuid;

/// Light variants understood by the fixed-function lighting model.
///
/// Positions come from the owning node's world matrix; targets are world-space
/// points.
#[derive(Debug, Clone, PartialEq)]
pub enum LightKind {
    /// Adds a constant term to every lit surface. Consumes no light unit.
    Ambient,
    /// Infinitely distant source shining from the node position towards `target`.
    Directional { target: Vec3 },
    /// `distance` is kept for authored content; attenuation is not applied.
    Point { distance: f32 },
    Spot {
        target: Vec3,
        /// Half-angle of the cone, radians.
        angle: f32,
        exponent: f32,
        distance: f32,
    },
}

#[derive(Debug, Clone)]
pub struct Light {
    pub uuid: Uuid,
    pub color: Vec3,
    pub intensity: f32,
    pub kind: LightKind,
}

impl Light {
    #[must_use]
    pub fn new(kind: LightKind, color: Vec3, intensity: f32) -> Self {
        Self {
            uuid: Uuid::new_v4(),
            color,
            intensity,
            kind,
        }
    }

    #[must_use]
    pub fn new_ambient(color: Vec3, intensity: f32) -> Self {
        Self::new(LightKind::Ambient, color, intensity)
    }

    #[must_use]
    pub fn new_directional(color: Vec3, intensity: f32) -> Self {
        Self::new(LightKind::Directional { target: Vec3::ZERO }, color, intensity)
    }

    #[must_use]
    pub fn new_point(color: Vec3, intensity: f32, distance: f32) -> Self {
        Self::new(LightKind::Point { distance }, color, intensity)
    }

    #[must_use]
    pub fn new_spot(color: Vec3, intensity: f32, angle: f32, exponent: f32) -> Self {
        Self::new(
            LightKind::Spot {
                target: Vec3::ZERO,
                angle,
                exponent,
                distance: 0.0,
            },
            color,
            intensity,
        )
    }

    #[must_use]
    pub fn with_target(mut self, new_target: Vec3) -> Self {
        match &mut self.kind {
            LightKind::Directional { target } | LightKind::Spot { target, .. } => {
                *target = new_target;
            }
            LightKind::Ambient | LightKind::Point { .. } => {}
        }
        self
    }

    #[inline]
    #[must_use]
    pub fn is_ambient(&self) -> bool {
        matches!(self.kind, LightKind::Ambient)
    }

    /// Colour premultiplied by intensity.
    #[inline]
    #[must_use]
    pub fn scaled_color(&self) -> Vec3 {
        self.color * self.intensity
    }
}
