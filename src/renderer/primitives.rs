// renderer/primitives.rs
use std::f32::consts::PI;

use glam::{Mat4, Vec3, Vec4};

use super::vertex::{v, Vertex, COMPLEMENT_COLOR, CURRENT_COLOR};
use crate::asset::MeshData;
use crate::math::Aabb;

/// Unit sphere colored by the drawing instance, with `longitude` segments
/// around and `latitude` rings from pole to pole.
pub fn sphere_mesh(longitude: u32, latitude: u32) -> MeshData {
    let longitude = longitude.max(3);
    let latitude = latitude.max(2);
    let color = Vec4::from_array(CURRENT_COLOR);

    let mut vertices = Vec::with_capacity(((longitude + 1) * (latitude + 1)) as usize);
    let mut indices = Vec::with_capacity((longitude * latitude * 6) as usize);

    for ring in 0..=latitude {
        let phi = PI * ring as f32 / latitude as f32;
        let y = phi.cos();
        let ring_radius = phi.sin();

        for segment in 0..=longitude {
            let theta = 2.0 * PI * segment as f32 / longitude as f32;
            let pos = Vec3::new(ring_radius * theta.cos(), y, ring_radius * theta.sin());
            // unit sphere: position is the normal
            vertices.push(v(pos, pos, color));
        }
    }

    for ring in 0..latitude {
        for segment in 0..longitude {
            let current = ring * (longitude + 1) + segment;
            let next = current + longitude + 1;

            indices.extend_from_slice(&[current, current + 1, next]);
            indices.extend_from_slice(&[current + 1, next + 1, next]);
        }
    }

    MeshData::new(vertices, indices, Vec::new())
}

/// Unit cube centred on the origin, faces in the instance color and the
/// twelve edges in its complement.
pub fn box_mesh() -> MeshData {
    let face = Vec4::from_array(CURRENT_COLOR);
    let edge = Vec4::from_array(COMPLEMENT_COLOR);

    // (normal, u axis, v axis) with u x v = normal
    let faces = [
        (Vec3::X, Vec3::Y, Vec3::Z),
        (Vec3::NEG_X, Vec3::Z, Vec3::Y),
        (Vec3::Y, Vec3::Z, Vec3::X),
        (Vec3::NEG_Y, Vec3::X, Vec3::Z),
        (Vec3::Z, Vec3::X, Vec3::Y),
        (Vec3::NEG_Z, Vec3::Y, Vec3::X),
    ];

    let mut vertices: Vec<Vertex> = Vec::with_capacity(24 + 8);
    let mut triangles = Vec::with_capacity(36);
    for (normal, u, w) in faces {
        let base = vertices.len() as u32;
        let c = normal * 0.5;
        for (su, sv) in [(-0.5, -0.5), (0.5, -0.5), (0.5, 0.5), (-0.5, 0.5)] {
            vertices.push(v(c + u * su + w * sv, normal, face));
        }
        triangles.extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
    }

    let corner_base = vertices.len() as u32;
    let unit = Aabb::new(Vec3::splat(-0.5), Vec3::splat(0.5));
    for corner in unit.corners() {
        vertices.push(v(corner, Vec3::ZERO, edge));
    }
    // corners() orders x fastest, then y, then z
    let mut lines = Vec::with_capacity(24);
    for (a, b) in [
        (0, 1), (2, 3), (4, 5), (6, 7),
        (0, 2), (1, 3), (4, 6), (5, 7),
        (0, 4), (1, 5), (2, 6), (3, 7),
    ] {
        lines.extend_from_slice(&[corner_base + a, corner_base + b]);
    }

    MeshData::new(vertices, triangles, lines)
}

/// Transform that stretches [`box_mesh`] over `bounds`.
pub fn box_fit(bounds: &Aabb) -> Mat4 {
    Mat4::from_translation(bounds.center()) * Mat4::from_scale(bounds.size())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signed_volume(mesh: &MeshData) -> f32 {
        mesh.triangle_indices
            .chunks(3)
            .map(|tri| {
                let a = mesh.vertices[tri[0] as usize].position();
                let b = mesh.vertices[tri[1] as usize].position();
                let c = mesh.vertices[tri[2] as usize].position();
                a.dot(b.cross(c)) / 6.0
            })
            .sum()
    }

    #[test]
    fn sphere_faces_point_outwards() {
        let sphere = sphere_mesh(16, 8);
        assert_eq!(sphere.triangle_count(), 16 * 8 * 2);
        assert!(signed_volume(&sphere) > 0.0);
        let bounds = sphere.bounds.unwrap();
        assert!(bounds.max.abs_diff_eq(Vec3::ONE, 1e-5));
    }

    #[test]
    fn box_is_closed_and_outward() {
        let cube = box_mesh();
        assert_eq!(cube.triangle_count(), 12);
        assert_eq!(cube.line_indices.len(), 24);
        assert!((signed_volume(&cube) - 1.0).abs() < 1e-5);
    }

    #[test]
    fn box_fit_maps_unit_cube_onto_bounds() {
        let bounds = Aabb::new(Vec3::new(1.0, 2.0, 3.0), Vec3::new(3.0, 6.0, 4.0));
        let m = box_fit(&bounds);
        assert!(m
            .transform_point3(Vec3::splat(-0.5))
            .abs_diff_eq(bounds.min, 1e-6));
        assert!(m
            .transform_point3(Vec3::splat(0.5))
            .abs_diff_eq(bounds.max, 1e-6));
    }
}
