//! Small procedural geometries.

use glam::{Vec2, Vec3};

use crate::resources::geometry::{Face, Geometry};

/// An XY-plane quad centred on the origin, facing +Z, split into two faces
/// with normals and one UV set.
#[must_use]
pub fn plane(width: f32, height: f32) -> Geometry {
    let (hw, hh) = (width * 0.5, height * 0.5);
    let vertices = vec![
        Vec3::new(-hw, -hh, 0.0),
        Vec3::new(hw, -hh, 0.0),
        Vec3::new(hw, hh, 0.0),
        Vec3::new(-hw, hh, 0.0),
    ];
    let faces = vec![
        Face::new(0, 1, 2)
            .with_normal(Vec3::Z)
            .with_vertex_normals([Vec3::Z; 3]),
        Face::new(0, 2, 3)
            .with_normal(Vec3::Z)
            .with_vertex_normals([Vec3::Z; 3]),
    ];

    let mut geometry = Geometry::from_parts(vertices, faces);
    geometry.uv_sets_mut().push(vec![
        [Vec2::new(0.0, 0.0), Vec2::new(1.0, 0.0), Vec2::new(1.0, 1.0)],
        [Vec2::new(0.0, 0.0), Vec2::new(1.0, 1.0), Vec2::new(0.0, 1.0)],
    ]);
    geometry.clear_update_flags();
    geometry
}

/// An axis-aligned box centred on the origin: 8 shared vertices, 12 faces
/// (two per side, `material_index` = side index 0..6), flat and smooth normals.
#[must_use]
pub fn cuboid(width: f32, height: f32, depth: f32) -> Geometry {
    let h = Vec3::new(width, height, depth) * 0.5;
    let vertices = vec![
        Vec3::new(-h.x, -h.y, -h.z),
        Vec3::new(h.x, -h.y, -h.z),
        Vec3::new(h.x, h.y, -h.z),
        Vec3::new(-h.x, h.y, -h.z),
        Vec3::new(-h.x, -h.y, h.z),
        Vec3::new(h.x, -h.y, h.z),
        Vec3::new(h.x, h.y, h.z),
        Vec3::new(-h.x, h.y, h.z),
    ];

    // Quads wound counter-clockwise seen from outside.
    let quads: [[u32; 4]; 6] = [
        [1, 2, 6, 5], // +X
        [0, 4, 7, 3], // -X
        [3, 7, 6, 2], // +Y
        [0, 1, 5, 4], // -Y
        [4, 5, 6, 7], // +Z
        [0, 3, 2, 1], // -Z
    ];

    let faces = quads
        .iter()
        .enumerate()
        .flat_map(|(side, q)| {
            [
                Face::new(q[0], q[1], q[2]).with_material_index(side),
                Face::new(q[0], q[2], q[3]).with_material_index(side),
            ]
        })
        .collect();

    let mut geometry = Geometry::from_parts(vertices, faces);
    geometry.compute_face_normals();
    geometry.compute_vertex_normals();
    geometry
}
