use glam::Vec3;
use uuid::Uuid;

use crate::resources::TextureKey;
use crate::resources::version_tracker::ChangeTracker;

/// Which faces of a mesh are rasterized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Side {
    #[default]
    Front,
    Back,
    Double,
}

/// Source of per-vertex colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VertexColors {
    #[default]
    None,
    /// One colour per face (`Face::color`).
    PerFace,
    /// One colour per face corner (`Face::vertex_colors`), or per vertex for
    /// lines and particle sets.
    PerVertex,
}

/// Interpolation of lighting across a face.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Shading {
    Flat,
    #[default]
    Smooth,
    /// Leaves the backend's shade model untouched.
    None,
}

// ============================================================================
// Material variants
// ============================================================================

/// Illumination model of a material.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MaterialKind {
    /// Unlit: shows its base colour regardless of lights.
    Basic,
    /// Diffuse only.
    Lambert { ambient: Vec3, emissive: Vec3 },
    /// Diffuse plus specular highlight.
    Phong {
        ambient: Vec3,
        emissive: Vec3,
        specular: Vec3,
        shininess: f32,
    },
}

impl MaterialKind {
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Basic => "basic",
            Self::Lambert { .. } => "lambert",
            Self::Phong { .. } => "phong",
        }
    }
}

// ============================================================================
// Material wrapper
// ============================================================================

#[derive(Debug, Clone)]
pub struct Material {
    pub uuid: Uuid,
    pub name: Option<String>,

    pub kind: MaterialKind,

    /// Base (diffuse) colour.
    pub color: Vec3,
    pub map: Option<TextureKey>,

    // Render states
    pub side: Side,
    pub wireframe: bool,
    pub depth_test: bool,
    pub vertex_colors: VertexColors,
    pub shading: Shading,

    // Morphing
    pub morph_targets: bool,
    pub morph_normals: bool,

    /// Set by the owner after editing fields that affect drawing; cleared by
    /// the renderer once consumed.
    pub needs_update: bool,

    tracker: ChangeTracker,
}

impl Material {
    #[must_use]
    pub fn new(kind: MaterialKind, color: Vec3) -> Self {
        Self {
            uuid: Uuid::new_v4(),
            name: None,
            kind,
            color,
            map: None,
            side: Side::Front,
            wireframe: false,
            depth_test: true,
            vertex_colors: VertexColors::None,
            shading: Shading::Smooth,
            morph_targets: false,
            morph_normals: false,
            needs_update: false,
            tracker: ChangeTracker::new(),
        }
    }

    #[must_use]
    pub fn new_basic(color: Vec3) -> Self {
        Self::new(MaterialKind::Basic, color)
    }

    #[must_use]
    pub fn new_lambert(color: Vec3) -> Self {
        Self::new(
            MaterialKind::Lambert {
                ambient: Vec3::ONE,
                emissive: Vec3::ZERO,
            },
            color,
        )
    }

    #[must_use]
    pub fn new_phong(color: Vec3) -> Self {
        Self::new(
            MaterialKind::Phong {
                ambient: Vec3::ONE,
                emissive: Vec3::ZERO,
                specular: Vec3::splat(0.067),
                shininess: 30.0,
            },
            color,
        )
    }

    // === Chained configuration ===

    #[must_use]
    pub fn with_map(mut self, map: TextureKey) -> Self {
        self.map = Some(map);
        self
    }

    #[must_use]
    pub fn with_side(mut self, side: Side) -> Self {
        self.side = side;
        self
    }

    #[must_use]
    pub fn with_shading(mut self, shading: Shading) -> Self {
        self.shading = shading;
        self
    }

    #[must_use]
    pub fn with_vertex_colors(mut self, vertex_colors: VertexColors) -> Self {
        self.vertex_colors = vertex_colors;
        self
    }

    #[must_use]
    pub fn with_wireframe(mut self, wireframe: bool) -> Self {
        self.wireframe = wireframe;
        self
    }

    #[must_use]
    pub fn with_morphing(mut self, targets: bool, normals: bool) -> Self {
        self.morph_targets = targets;
        self.morph_normals = normals;
        self
    }

    // === Change tracking ===

    #[inline]
    #[must_use]
    pub fn version(&self) -> u64 {
        self.tracker.version()
    }

    /// Signals that drawing-relevant state changed.
    pub fn mark_needs_update(&mut self) {
        self.needs_update = true;
        self.tracker.changed();
    }

    /// Whether this material can never be baked into a compiled list.
    #[inline]
    #[must_use]
    pub fn uses_morphing(&self) -> bool {
        self.morph_targets || self.morph_normals
    }
}
