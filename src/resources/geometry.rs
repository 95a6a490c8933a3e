use std::cell::Cell;

use bitflags::bitflags;
use glam::{Mat4, Vec2, Vec3};
use smallvec::SmallVec;
use uuid::Uuid;

use crate::resources::version_tracker::{ChangeTracker, MutGuard};

bitflags! {
    /// Content edits pending since the renderer last consumed this geometry.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
    pub struct GeometryUpdate: u8 {
        const VERTICES = 1 << 0;
        const COLORS   = 1 << 1;
        const NORMALS  = 1 << 2;
        const UVS      = 1 << 3;
    }
}

/// A triangle referencing three vertices of its geometry.
#[derive(Debug, Clone, PartialEq)]
pub struct Face {
    pub a: u32,
    pub b: u32,
    pub c: u32,

    pub normal: Vec3,
    /// Either empty or one normal per corner.
    pub vertex_normals: SmallVec<[Vec3; 3]>,

    pub color: Vec3,
    /// Either empty or one colour per corner.
    pub vertex_colors: SmallVec<[Vec3; 3]>,

    /// Index into the owning mesh's material set.
    pub material_index: usize,
}

impl Face {
    #[must_use]
    pub fn new(a: u32, b: u32, c: u32) -> Self {
        Self {
            a,
            b,
            c,
            normal: Vec3::ZERO,
            vertex_normals: SmallVec::new(),
            color: Vec3::ONE,
            vertex_colors: SmallVec::new(),
            material_index: 0,
        }
    }

    #[must_use]
    pub fn with_material_index(mut self, index: usize) -> Self {
        self.material_index = index;
        self
    }

    #[must_use]
    pub fn with_normal(mut self, normal: Vec3) -> Self {
        self.normal = normal;
        self
    }

    #[must_use]
    pub fn with_vertex_normals(mut self, normals: [Vec3; 3]) -> Self {
        self.vertex_normals = SmallVec::from_buf(normals);
        self
    }

    #[must_use]
    pub fn with_color(mut self, color: Vec3) -> Self {
        self.color = color;
        self
    }

    #[must_use]
    pub fn with_vertex_colors(mut self, colors: [Vec3; 3]) -> Self {
        self.vertex_colors = SmallVec::from_buf(colors);
        self
    }

    #[inline]
    #[must_use]
    pub fn indices(&self) -> [usize; 3] {
        [self.a as usize, self.b as usize, self.c as usize]
    }
}

/// An alternate set of vertex positions blended by influence weight.
#[derive(Debug, Clone, Default)]
pub struct MorphTarget {
    pub name: String,
    pub vertices: Vec<Vec3>,
}

/// Normals derived from one morph target's positions.
#[derive(Debug, Clone, Default)]
pub struct MorphNormals {
    pub face_normals: Vec<Vec3>,
    pub vertex_normals: Vec<[Vec3; 3]>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct BoundingSphere {
    pub center: Vec3,
    pub radius: f32,
}

impl BoundingSphere {
    /// Sphere enclosing this one after `matrix` is applied.
    ///
    /// Non-uniform scale is handled conservatively by using the largest
    /// axis scale.
    #[must_use]
    pub fn transform(&self, matrix: &Mat4) -> Self {
        let center = matrix.transform_point3(self.center);
        let scale = matrix
            .x_axis
            .truncate()
            .length_squared()
            .max(matrix.y_axis.truncate().length_squared())
            .max(matrix.z_axis.truncate().length_squared())
            .sqrt();
        Self {
            center,
            radius: self.radius * scale,
        }
    }
}

/// Face-indexed triangle geometry in the classic scene-graph layout.
///
/// Content edits go through the `*_mut` accessors, which raise the matching
/// [`GeometryUpdate`] flag and bump the content version. The renderer reads
/// the flags once per frame and clears them after drawing.
#[derive(Debug)]
pub struct Geometry {
    pub uuid: Uuid,
    pub name: Option<String>,

    vertices: Vec<Vec3>,
    faces: Vec<Face>,
    /// Per-vertex colours, used by line and particle geometries.
    colors: Vec<Vec3>,
    /// UV sets; each set holds one `[uv; 3]` per face. Only the first set is drawn.
    uv_sets: Vec<Vec<[Vec2; 3]>>,

    morph_targets: Vec<MorphTarget>,
    morph_normals: Vec<MorphNormals>,

    update: GeometryUpdate,
    tracker: ChangeTracker,

    bounding_sphere: Cell<Option<BoundingSphere>>,
}

impl Default for Geometry {
    fn default() -> Self {
        Self::new()
    }
}

impl Geometry {
    #[must_use]
    pub fn new() -> Self {
        Self {
            uuid: Uuid::new_v4(),
            name: None,
            vertices: Vec::new(),
            faces: Vec::new(),
            colors: Vec::new(),
            uv_sets: Vec::new(),
            morph_targets: Vec::new(),
            morph_normals: Vec::new(),
            update: GeometryUpdate::empty(),
            tracker: ChangeTracker::new(),
            bounding_sphere: Cell::new(None),
        }
    }

    #[must_use]
    pub fn from_parts(vertices: Vec<Vec3>, faces: Vec<Face>) -> Self {
        Self {
            vertices,
            faces,
            ..Self::new()
        }
    }

    /// Point/line geometry: positions with optional per-vertex colours.
    #[must_use]
    pub fn from_points(vertices: Vec<Vec3>, colors: Vec<Vec3>) -> Self {
        Self {
            vertices,
            colors,
            ..Self::new()
        }
    }

    // ========================================================================
    // Read access
    // ========================================================================

    #[inline]
    #[must_use]
    pub fn vertices(&self) -> &[Vec3] {
        &self.vertices
    }

    #[inline]
    #[must_use]
    pub fn faces(&self) -> &[Face] {
        &self.faces
    }

    #[inline]
    #[must_use]
    pub fn colors(&self) -> &[Vec3] {
        &self.colors
    }

    #[inline]
    #[must_use]
    pub fn uv_sets(&self) -> &[Vec<[Vec2; 3]>] {
        &self.uv_sets
    }

    /// The UV set the fixed-function path can draw, if it covers every face.
    #[must_use]
    pub fn drawable_uvs(&self) -> Option<&[[Vec2; 3]]> {
        let first = self.uv_sets.first()?;
        (!first.is_empty() && first.len() == self.faces.len()).then_some(first.as_slice())
    }

    #[inline]
    #[must_use]
    pub fn morph_targets(&self) -> &[MorphTarget] {
        &self.morph_targets
    }

    #[inline]
    #[must_use]
    pub fn morph_normals(&self) -> &[MorphNormals] {
        &self.morph_normals
    }

    #[inline]
    #[must_use]
    pub fn version(&self) -> u64 {
        self.tracker.version()
    }

    #[inline]
    #[must_use]
    pub fn update_flags(&self) -> GeometryUpdate {
        self.update
    }

    #[inline]
    #[must_use]
    pub fn needs_update(&self) -> bool {
        !self.update.is_empty()
    }

    // ========================================================================
    // Write access (tracked)
    // ========================================================================

    pub fn vertices_mut(&mut self) -> MutGuard<'_, Vec<Vec3>> {
        self.update |= GeometryUpdate::VERTICES;
        self.bounding_sphere.set(None);
        MutGuard::new(&mut self.vertices, &mut self.tracker)
    }

    /// Faces carry indices, normals and colours, so every flag is raised.
    pub fn faces_mut(&mut self) -> MutGuard<'_, Vec<Face>> {
        self.update |= GeometryUpdate::all();
        MutGuard::new(&mut self.faces, &mut self.tracker)
    }

    pub fn colors_mut(&mut self) -> MutGuard<'_, Vec<Vec3>> {
        self.update |= GeometryUpdate::COLORS;
        MutGuard::new(&mut self.colors, &mut self.tracker)
    }

    pub fn uv_sets_mut(&mut self) -> MutGuard<'_, Vec<Vec<[Vec2; 3]>>> {
        self.update |= GeometryUpdate::UVS;
        MutGuard::new(&mut self.uv_sets, &mut self.tracker)
    }

    /// Editing morph targets discards previously derived morph normals.
    pub fn morph_targets_mut(&mut self) -> MutGuard<'_, Vec<MorphTarget>> {
        self.update |= GeometryUpdate::VERTICES;
        self.morph_normals.clear();
        MutGuard::new(&mut self.morph_targets, &mut self.tracker)
    }

    /// Flags content as changed without touching it (e.g. after editing
    /// shared buffers out of band).
    pub fn mark_updated(&mut self, flags: GeometryUpdate) {
        if flags.is_empty() {
            return;
        }
        self.update |= flags;
        if flags.contains(GeometryUpdate::VERTICES) {
            self.bounding_sphere.set(None);
        }
        self.tracker.changed();
    }

    /// Consumes pending update flags. Called by the renderer after drawing.
    pub fn clear_update_flags(&mut self) {
        self.update = GeometryUpdate::empty();
    }

    // ========================================================================
    // Derived data
    // ========================================================================

    /// Recomputes per-face normals from the current positions.
    pub fn compute_face_normals(&mut self) {
        let vertices = &self.vertices;
        for face in &mut self.faces {
            if let Some(n) = triangle_normal(vertices, face) {
                face.normal = n;
            }
        }
    }

    /// Recomputes smooth per-corner normals by averaging the area-weighted
    /// normals of every face sharing a vertex.
    pub fn compute_vertex_normals(&mut self) {
        let accumulated = accumulate_vertex_normals(&self.vertices, &self.faces);
        for face in &mut self.faces {
            let [a, b, c] = face.indices();
            let fallback = face.normal;
            let pick = |i: usize| accumulated.get(i).copied().unwrap_or(fallback);
            face.vertex_normals = SmallVec::from_buf([pick(a), pick(b), pick(c)]);
        }
    }

    /// Derives face and per-corner normals for every morph target.
    pub fn compute_morph_normals(&mut self) {
        self.morph_normals = self
            .morph_targets
            .iter()
            .map(|target| {
                let face_normals = self
                    .faces
                    .iter()
                    .map(|face| triangle_normal(&target.vertices, face).unwrap_or(face.normal))
                    .collect();
                let smooth = accumulate_vertex_normals(&target.vertices, &self.faces);
                let vertex_normals = self
                    .faces
                    .iter()
                    .map(|face| {
                        face.indices()
                            .map(|i| smooth.get(i).copied().unwrap_or(face.normal))
                    })
                    .collect();
                MorphNormals {
                    face_normals,
                    vertex_normals,
                }
            })
            .collect();
    }

    /// Bounding sphere of the vertex positions, computed lazily and cached
    /// until the vertices change.
    pub fn bounding_sphere(&self) -> BoundingSphere {
        if let Some(sphere) = self.bounding_sphere.get() {
            return sphere;
        }

        let sphere = if self.vertices.is_empty() {
            BoundingSphere::default()
        } else {
            let (min, max) = self.vertices.iter().fold(
                (Vec3::splat(f32::INFINITY), Vec3::splat(f32::NEG_INFINITY)),
                |(min, max), v| (min.min(*v), max.max(*v)),
            );
            let center = (min + max) * 0.5;
            let radius = self
                .vertices
                .iter()
                .map(|v| v.distance_squared(center))
                .fold(0.0_f32, f32::max)
                .sqrt();
            BoundingSphere { center, radius }
        };

        self.bounding_sphere.set(Some(sphere));
        sphere
    }
}

fn triangle_normal(vertices: &[Vec3], face: &Face) -> Option<Vec3> {
    let [a, b, c] = face.indices();
    let (va, vb, vc) = (vertices.get(a)?, vertices.get(b)?, vertices.get(c)?);
    let n = (*vc - *vb).cross(*va - *vb);
    Some(n.normalize_or_zero())
}

fn accumulate_vertex_normals(vertices: &[Vec3], faces: &[Face]) -> Vec<Vec3> {
    let mut normals = vec![Vec3::ZERO; vertices.len()];
    for face in faces {
        let [a, b, c] = face.indices();
        let (Some(va), Some(vb), Some(vc)) = (vertices.get(a), vertices.get(b), vertices.get(c))
        else {
            continue;
        };
        // Unnormalized cross product: larger faces weigh more.
        let n = (*vc - *vb).cross(*va - *vb);
        normals[a] += n;
        normals[b] += n;
        normals[c] += n;
    }
    for n in &mut normals {
        *n = n.normalize_or_zero();
    }
    normals
}
