//! Morph target blending.

use glam::Vec3;
use smallvec::SmallVec;

use crate::resources::geometry::Geometry;

/// Normalized weights of the morph targets active this frame.
#[derive(Debug, Clone, PartialEq)]
pub struct MorphBlend {
    influences: SmallVec<[(usize, f32); 8]>,
}

impl MorphBlend {
    /// Keeps the targets with a positive weight and scales their weights to
    /// sum to one. Weights addressing missing targets are ignored. Returns
    /// `None` when no target is active.
    #[must_use]
    pub fn from_influences(weights: &[f32], target_count: usize) -> Option<Self> {
        let mut influences: SmallVec<[(usize, f32); 8]> = weights
            .iter()
            .copied()
            .enumerate()
            .take(target_count)
            .filter(|&(_, w)| w > 0.0)
            .collect();

        let total: f32 = influences.iter().map(|&(_, w)| w).sum();
        if influences.is_empty() || !total.is_finite() || total <= 0.0 {
            return None;
        }
        for (_, w) in &mut influences {
            *w /= total;
        }
        Some(Self { influences })
    }

    #[must_use]
    pub fn influences(&self) -> &[(usize, f32)] {
        &self.influences
    }

    /// Weighted position of `vertex` across the active targets. Targets
    /// lacking the vertex are skipped.
    #[must_use]
    pub fn position(&self, geometry: &Geometry, vertex: usize) -> Option<Vec3> {
        let targets = geometry.morph_targets();
        self.blend(|target| targets.get(target)?.vertices.get(vertex).copied())
    }

    /// Blended, renormalized face normal.
    #[must_use]
    pub fn face_normal(&self, geometry: &Geometry, face: usize) -> Option<Vec3> {
        let normals = geometry.morph_normals();
        self.blend(|target| normals.get(target)?.face_normals.get(face).copied())
            .map(Vec3::normalize_or_zero)
    }

    /// Blended, renormalized normal of one face corner.
    #[must_use]
    pub fn vertex_normal(&self, geometry: &Geometry, face: usize, corner: usize) -> Option<Vec3> {
        let normals = geometry.morph_normals();
        self.blend(|target| {
            normals
                .get(target)?
                .vertex_normals
                .get(face)
                .and_then(|corners| corners.get(corner))
                .copied()
        })
        .map(Vec3::normalize_or_zero)
    }

    fn blend(&self, mut sample: impl FnMut(usize) -> Option<Vec3>) -> Option<Vec3> {
        let mut found = false;
        let mut sum = Vec3::ZERO;
        for &(target, weight) in &self.influences {
            if let Some(value) = sample(target) {
                sum += value * weight;
                found = true;
            }
        }
        found.then_some(sum)
    }
}
