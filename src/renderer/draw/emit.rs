//! Triangle stream emission.
//!
//! The same code path feeds compiled lists and immediate submission, so a
//! replayed list is indistinguishable from drawing the faces directly.
//!
//! Attribute selection per face:
//!
//! | Condition                                  | Colour / UV            |
//! |--------------------------------------------|------------------------|
//! | texture bound and first UV set covers faces | UV per corner         |
//! | per-face vertex colours                    | face colour once       |
//! | per-vertex colours, face has 3 of them     | colour per corner      |
//! | otherwise                                  | none (material colour) |
//!
//! Normals are always emitted: per corner for smooth shading when the face
//! has three vertex normals, else the face normal once before the triangle.

use glam::Vec3;

use crate::backend::{FixedFunction, Primitive};
use crate::renderer::draw::Emitted;
use crate::renderer::draw::morph::MorphBlend;
use crate::resources::geometry::Geometry;
use crate::resources::material::{Material, Shading, VertexColors};

/// Attribute layout of a triangle stream, fixed for the whole stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EmitMode {
    pub textured: bool,
    pub vertex_colors: VertexColors,
    pub smooth: bool,
}

impl EmitMode {
    /// `textured` says whether the material's texture is bound; UVs are used
    /// only if the geometry also has a drawable UV set.
    #[must_use]
    pub fn new(material: &Material, geometry: &Geometry, textured: bool) -> Self {
        Self {
            textured: textured && geometry.drawable_uvs().is_some(),
            vertex_colors: material.vertex_colors,
            smooth: material.shading == Shading::Smooth,
        }
    }
}

/// Morph state applied to a stream.
#[derive(Debug, Clone, Copy)]
pub struct Morph<'a> {
    pub blend: &'a MorphBlend,
    /// Blend normals as well as positions.
    pub normals: bool,
}

/// Emits `faces` of `geometry` as one `Triangles` batch. Faces with
/// out-of-range indices are skipped and not counted.
pub fn emit_triangles<B: FixedFunction>(
    backend: &mut B,
    geometry: &Geometry,
    faces: impl IntoIterator<Item = usize>,
    mode: EmitMode,
    morph: Option<Morph<'_>>,
) -> Emitted {
    let vertices = geometry.vertices();
    let uvs = if mode.textured {
        geometry.drawable_uvs()
    } else {
        None
    };

    let mut drawn = 0_u32;
    backend.begin(Primitive::Triangles);

    for index in faces {
        let Some(face) = geometry.faces().get(index) else {
            continue;
        };

        let position = |v: usize| match morph {
            Some(m) => m.blend.position(geometry, v).or_else(|| vertices.get(v).copied()),
            None => vertices.get(v).copied(),
        };
        let [a, b, c] = face.indices();
        let (Some(pa), Some(pb), Some(pc)) = (position(a), position(b), position(c)) else {
            continue;
        };
        let positions = [pa, pb, pc];

        let face_uvs = uvs.and_then(|sets| sets.get(index));
        let per_vertex_normals = mode.smooth && face.vertex_normals.len() >= 3;
        let per_vertex_colors = face_uvs.is_none()
            && mode.vertex_colors == VertexColors::PerVertex
            && face.vertex_colors.len() >= 3;
        let morph_normals = morph.filter(|m| m.normals);

        if face_uvs.is_none() && mode.vertex_colors == VertexColors::PerFace {
            backend.color3(face.color);
        }

        if !per_vertex_normals {
            let normal = morph_normals
                .and_then(|m| m.blend.face_normal(geometry, index))
                .unwrap_or(face.normal);
            backend.normal3(normal);
        }

        for (corner, position) in positions.iter().enumerate() {
            if per_vertex_normals {
                let normal: Vec3 = morph_normals
                    .and_then(|m| m.blend.vertex_normal(geometry, index, corner))
                    .unwrap_or(face.vertex_normals[corner]);
                backend.normal3(normal);
            }
            if let Some(uv) = face_uvs {
                backend.tex_coord2(uv[corner]);
            } else if per_vertex_colors {
                backend.color3(face.vertex_colors[corner]);
            }
            backend.vertex3(*position);
        }

        drawn += 1;
    }

    backend.end();
    Emitted {
        faces: drawn,
        vertices: drawn * 3,
    }
}
