//! Line and particle drawing.
//!
//! Both are unlit and untextured. Colour comes from the geometry's
//! per-vertex colours when the material asks for them and they cover every
//! vertex, otherwise from the material colour once per stream.

use crate::backend::{FixedFunction, Primitive};
use crate::renderer::collect::RenderItem;
use crate::renderer::draw::{DrawContext, Emitted, ListRequest};
use crate::renderer::resource_cache::ListKey;
use crate::resources::geometry::Geometry;
use crate::resources::material::{Material, VertexColors};
use crate::resources::mesh::LineTopology;
use crate::scene::Scene;
use crate::scene::node::NodeKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointsKind {
    Lines,
    Particles,
}

/// Draws one collected line or particle set under its world matrix.
pub fn draw_points<B: FixedFunction>(
    ctx: &mut DrawContext<'_, B>,
    scene: &mut Scene,
    item: &RenderItem,
    kind: PointsKind,
) {
    let Some(node) = scene.nodes.get(item.node) else {
        return;
    };
    let (geometry_key, material_key, primitive) = match (&node.kind, kind) {
        (NodeKind::Line(line), PointsKind::Lines) => {
            let primitive = match line.topology {
                LineTopology::Strip => Primitive::LineStrip,
                LineTopology::Segments => Primitive::Lines,
            };
            (line.geometry, line.material, primitive)
        }
        (NodeKind::ParticleSet(set), PointsKind::Particles) => {
            (set.geometry, set.material, Primitive::Points)
        }
        _ => return,
    };

    let (Some(geometry), Some(material)) = (
        scene.geometries.get(geometry_key),
        scene.materials.get(material_key),
    ) else {
        return;
    };
    if geometry.vertices().is_empty() {
        return;
    }

    ctx.materials(&mut scene.textures).apply_unlit(material);

    let request = ListRequest {
        key: ListKey {
            geometry: geometry_key,
            material: material_key,
            primitive,
        },
        geometry_version: geometry.version(),
        material_version: material.version(),
        changed: geometry.needs_update() || material.needs_update,
        textured: false,
    };

    ctx.with_model_matrix(&item.world, |ctx| {
        let emit = |backend: &mut B| emit_vertices(backend, geometry, material, primitive);
        if !ctx.draw_cached(item.node, request, emit) {
            let emitted = emit(ctx.backend);
            ctx.record(emitted);
        }
    });
}

fn emit_vertices<B: FixedFunction>(
    backend: &mut B,
    geometry: &Geometry,
    material: &Material,
    primitive: Primitive,
) -> Emitted {
    let vertices = geometry.vertices();
    let colors = geometry.colors();
    let per_vertex =
        material.vertex_colors != VertexColors::None && colors.len() == vertices.len();

    backend.begin(primitive);
    if !per_vertex {
        backend.color3(material.color);
    }
    for (index, vertex) in vertices.iter().enumerate() {
        if per_vertex {
            backend.color3(colors[index]);
        }
        backend.vertex3(*vertex);
    }
    backend.end();

    Emitted {
        faces: 0,
        vertices: vertices.len() as u32,
    }
}
