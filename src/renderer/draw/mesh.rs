//! Triangle mesh drawing.

use slotmap::SlotMap;

use crate::backend::{FixedFunction, Primitive};
use crate::renderer::collect::RenderItem;
use crate::renderer::draw::emit::{EmitMode, Morph, emit_triangles};
use crate::renderer::draw::morph::MorphBlend;
use crate::renderer::draw::{DrawContext, ListRequest};
use crate::renderer::object_state::batch_faces_by_material;
use crate::renderer::resource_cache::ListKey;
use crate::resources::geometry::Geometry;
use crate::resources::material::{Material, Shading};
use crate::resources::mesh::{Mesh, MeshMaterial};
use crate::resources::texture::Texture;
use crate::resources::{GeometryKey, MaterialKey, TextureKey};
use crate::scene::Scene;

/// Draws one collected mesh under its world matrix.
///
/// Single-material meshes go through the compiled-list cache unless their
/// material morphs. Per-face material meshes are drawn immediately, one
/// batch per material.
pub fn draw_mesh<B: FixedFunction>(ctx: &mut DrawContext<'_, B>, scene: &mut Scene, item: &RenderItem) {
    let Scene {
        nodes,
        geometries,
        materials,
        textures,
        ..
    } = scene;

    let Some(mesh) = nodes.get(item.node).and_then(|node| node.mesh()) else {
        return;
    };
    let Some(geometry) = geometries.get_mut(mesh.geometry) else {
        log::trace!("Mesh references a disposed geometry");
        return;
    };
    if geometry.faces().is_empty() {
        return;
    }

    ctx.objects.entry(item.node).depth = item.depth;

    match &mesh.material {
        MeshMaterial::Single(key) => {
            let Some(material) = materials.get(*key) else {
                return;
            };
            prepare_normals(geometry, std::iter::once(material));
            draw_single(ctx, item, mesh, geometry, *key, material, textures);
        }
        MeshMaterial::PerFace(keys) => {
            prepare_normals(geometry, keys.iter().filter_map(|k| materials.get(*k)));
            draw_per_face(ctx, item, mesh, geometry, keys, materials, textures);
        }
    }
}

/// Derives the normals a material set needs but the geometry lacks.
fn prepare_normals<'m>(geometry: &mut Geometry, materials: impl Iterator<Item = &'m Material>) {
    let mut smooth = false;
    let mut morph_normals = false;
    for material in materials {
        smooth |= material.shading == Shading::Smooth;
        morph_normals |= material.morph_targets && material.morph_normals;
    }

    if smooth && geometry.faces().iter().any(|f| f.vertex_normals.len() < 3) {
        log::debug!("Computing missing vertex normals");
        geometry.compute_vertex_normals();
    }
    if morph_normals
        && !geometry.morph_targets().is_empty()
        && geometry.morph_normals().len() != geometry.morph_targets().len()
    {
        geometry.compute_morph_normals();
    }
}

fn morph_blend(mesh: &Mesh, geometry: &Geometry) -> Option<MorphBlend> {
    MorphBlend::from_influences(&mesh.morph_target_influences, geometry.morph_targets().len())
}

fn draw_single<B: FixedFunction>(
    ctx: &mut DrawContext<'_, B>,
    item: &RenderItem,
    mesh: &Mesh,
    geometry: &Geometry,
    material_key: MaterialKey,
    material: &Material,
    textures: &mut SlotMap<TextureKey, Texture>,
) {
    let textured = ctx.materials(textures).apply(material);
    let mode = EmitMode::new(material, geometry, textured);
    let blend = material
        .morph_targets
        .then(|| morph_blend(mesh, geometry))
        .flatten();

    ctx.with_model_matrix(&item.world, |ctx| {
        if !material.uses_morphing() {
            let request = triangle_request(mesh.geometry, geometry, material_key, material, mode);
            let faces = geometry.faces().len();
            let cached = ctx.draw_cached(item.node, request, |backend| {
                emit_triangles(backend, geometry, 0..faces, mode, None)
            });
            if cached {
                return;
            }
        }

        let morph = blend.as_ref().map(|blend| Morph {
            blend,
            normals: material.morph_normals,
        });
        let emitted = emit_triangles(ctx.backend, geometry, 0..geometry.faces().len(), mode, morph);
        ctx.record(emitted);
    });
}

fn triangle_request(
    geometry_key: GeometryKey,
    geometry: &Geometry,
    material_key: MaterialKey,
    material: &Material,
    mode: EmitMode,
) -> ListRequest {
    ListRequest {
        key: ListKey {
            geometry: geometry_key,
            material: material_key,
            primitive: Primitive::Triangles,
        },
        geometry_version: geometry.version(),
        material_version: material.version(),
        changed: geometry.needs_update() || material.needs_update,
        textured: mode.textured,
    }
}

fn draw_per_face<B: FixedFunction>(
    ctx: &mut DrawContext<'_, B>,
    item: &RenderItem,
    mesh: &Mesh,
    geometry: &Geometry,
    keys: &[MaterialKey],
    materials: &SlotMap<MaterialKey, Material>,
    textures: &mut SlotMap<TextureKey, Texture>,
) {
    let batches = ctx
        .objects
        .entry(item.node)
        .batches
        .take()
        .unwrap_or_else(|| batch_faces_by_material(geometry.faces(), keys.len()));

    if !batches.is_empty() {
        let blend = morph_blend(mesh, geometry);

        ctx.with_model_matrix(&item.world, |ctx| {
            for batch in &batches {
                let Some(material) = keys.get(batch.material_index).and_then(|k| materials.get(*k))
                else {
                    continue;
                };

                let textured = ctx.materials(textures).apply(material);
                let mode = EmitMode::new(material, geometry, textured);
                let morph = blend
                    .as_ref()
                    .filter(|_| material.morph_targets)
                    .map(|blend| Morph {
                        blend,
                        normals: material.morph_normals,
                    });

                let faces = batch.faces.iter().map(|&f| f as usize);
                let emitted = emit_triangles(ctx.backend, geometry, faces, mode, morph);
                ctx.record(emitted);
            }
        });
    }

    ctx.objects.entry(item.node).batches = Some(batches);
}
