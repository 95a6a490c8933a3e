use crate::resources::{GeometryKey, MaterialKey};

/// Material binding of a mesh: one material for the whole mesh, or a set
/// addressed by `Face::material_index`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MeshMaterial {
    Single(MaterialKey),
    PerFace(Vec<MaterialKey>),
}

impl MeshMaterial {
    #[inline]
    #[must_use]
    pub fn single(&self) -> Option<MaterialKey> {
        match self {
            Self::Single(key) => Some(*key),
            Self::PerFace(_) => None,
        }
    }

    /// Every material referenced, in index order.
    #[must_use]
    pub fn keys(&self) -> &[MaterialKey] {
        match self {
            Self::Single(key) => std::slice::from_ref(key),
            Self::PerFace(keys) => keys,
        }
    }
}

impl From<MaterialKey> for MeshMaterial {
    fn from(key: MaterialKey) -> Self {
        Self::Single(key)
    }
}

impl From<Vec<MaterialKey>> for MeshMaterial {
    fn from(keys: Vec<MaterialKey>) -> Self {
        Self::PerFace(keys)
    }
}

/// Triangle mesh instance.
#[derive(Debug, Clone)]
pub struct Mesh {
    pub geometry: GeometryKey,
    pub material: MeshMaterial,

    /// Live morph weights, one per morph target of the geometry.
    pub morph_target_influences: Vec<f32>,
}

impl Mesh {
    #[must_use]
    pub fn new(geometry: GeometryKey, material: impl Into<MeshMaterial>) -> Self {
        Self {
            geometry,
            material: material.into(),
            morph_target_influences: Vec::new(),
        }
    }
}

/// Primitive assembly of a line object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LineTopology {
    /// Consecutive vertices are connected.
    #[default]
    Strip,
    /// Each vertex pair forms an independent segment.
    Segments,
}

#[derive(Debug, Clone)]
pub struct Line {
    pub geometry: GeometryKey,
    pub material: MaterialKey,
    pub topology: LineTopology,
}

impl Line {
    #[must_use]
    pub fn new(geometry: GeometryKey, material: MaterialKey, topology: LineTopology) -> Self {
        Self {
            geometry,
            material,
            topology,
        }
    }
}

/// Unconnected points drawn with the backend's point primitive.
#[derive(Debug, Clone)]
pub struct ParticleSet {
    pub geometry: GeometryKey,
    pub material: MaterialKey,
}

impl ParticleSet {
    #[must_use]
    pub fn new(geometry: GeometryKey, material: MaterialKey) -> Self {
        Self { geometry, material }
    }
}

/// Screen-aligned billboard. Collected but not drawn by the fixed-function path.
#[derive(Debug, Clone)]
pub struct Sprite {
    pub material: MaterialKey,
}
