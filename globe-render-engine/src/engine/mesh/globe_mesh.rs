use bevy::asset::RenderAssetUsages;
use bevy::prelude::*;
use bevy::render::mesh::{Indices, PrimitiveTopology};
use std::f32::consts::{PI, TAU};

/// UV sphere with poles on ±Y. U runs around the Y axis starting at -X,
/// V runs from the north pole (0) to the south pole (1), so equirectangular
/// Earth maps line up without rotating the mesh.
pub fn globe_mesh(radius: f32, width_segments: u32, height_segments: u32) -> Mesh {
    let width_segments = width_segments.max(3);
    let height_segments = height_segments.max(2);

    let vertex_count = ((width_segments + 1) * (height_segments + 1)) as usize;
    let mut positions: Vec<[f32; 3]> = Vec::with_capacity(vertex_count);
    let mut normals: Vec<[f32; 3]> = Vec::with_capacity(vertex_count);
    let mut uvs: Vec<[f32; 2]> = Vec::with_capacity(vertex_count);

    for iy in 0..=height_segments {
        let v = iy as f32 / height_segments as f32;
        for ix in 0..=width_segments {
            let u = ix as f32 / width_segments as f32;
            let normal = surface_direction(u, v);
            positions.push((normal * radius).to_array());
            normals.push(normal.to_array());
            uvs.push([u, v]);
        }
    }

    let row = width_segments + 1;
    let mut indices: Vec<u32> = Vec::with_capacity((width_segments * height_segments * 6) as usize);
    for iy in 0..height_segments {
        for ix in 0..width_segments {
            let a = iy * row + ix + 1;
            let b = iy * row + ix;
            let c = (iy + 1) * row + ix;
            let d = (iy + 1) * row + ix + 1;

            // Pole rows collapse to a point; skip the zero-area triangle there.
            if iy != 0 {
                indices.extend_from_slice(&[a, b, d]);
            }
            if iy != height_segments - 1 {
                indices.extend_from_slice(&[b, c, d]);
            }
        }
    }

    Mesh::new(PrimitiveTopology::TriangleList, RenderAssetUsages::default())
        .with_inserted_attribute(Mesh::ATTRIBUTE_POSITION, positions)
        .with_inserted_attribute(Mesh::ATTRIBUTE_NORMAL, normals)
        .with_inserted_attribute(Mesh::ATTRIBUTE_UV_0, uvs)
        .with_inserted_indices(Indices::U32(indices))
}

/// Unit direction for texture coordinates on the globe.
pub fn surface_direction(u: f32, v: f32) -> Vec3 {
    let phi = u * TAU;
    let theta = v * PI;
    Vec3::new(
        -phi.cos() * theta.sin(),
        theta.cos(),
        phi.sin() * theta.sin(),
    )
}

/// Latitude/longitude (degrees) to a point in the globe's local frame,
/// consistent with the texture mapping of [`globe_mesh`].
pub fn geo_to_local(latitude: f32, longitude: f32, radius: f32) -> Vec3 {
    let u = (longitude + 180.0) / 360.0;
    let v = (90.0 - latitude) / 180.0;
    surface_direction(u, v) * radius
}

#[cfg(test)]
mod tests {
    use super::*;
    use bevy::render::mesh::VertexAttributeValues;

    fn positions(mesh: &Mesh) -> Vec<[f32; 3]> {
        match mesh.attribute(Mesh::ATTRIBUTE_POSITION) {
            Some(VertexAttributeValues::Float32x3(values)) => values.clone(),
            _ => panic!("globe mesh without positions"),
        }
    }

    #[test]
    fn vertex_and_index_counts() {
        let mesh = globe_mesh(1.0, 8, 4);
        assert_eq!(mesh.count_vertices(), 9 * 5);

        // Two triangles per quad, minus one per quad in each pole row.
        let expected_triangles = 8 * 4 * 2 - 8 * 2;
        assert_eq!(mesh.indices().map(|i| i.len()), Some(expected_triangles * 3));
    }

    #[test]
    fn poles_lie_on_y_axis() {
        let mesh = globe_mesh(28.0, 16, 8);
        let positions = positions(&mesh);
        let north = Vec3::from(positions[0]);
        let south = Vec3::from(positions[positions.len() - 1]);
        assert!((north - Vec3::new(0.0, 28.0, 0.0)).length() < 1e-4);
        assert!((south - Vec3::new(0.0, -28.0, 0.0)).length() < 1e-4);
    }

    #[test]
    fn every_vertex_sits_on_the_radius() {
        let mesh = globe_mesh(5.0, 12, 6);
        for p in positions(&mesh) {
            assert!((Vec3::from(p).length() - 5.0).abs() < 1e-4);
        }
    }

    #[test]
    fn triangles_face_outward() {
        let mesh = globe_mesh(1.0, 12, 6);
        let positions = positions(&mesh);
        let Some(Indices::U32(indices)) = mesh.indices() else {
            panic!("expected u32 indices");
        };
        for tri in indices.chunks(3) {
            let a = Vec3::from(positions[tri[0] as usize]);
            let b = Vec3::from(positions[tri[1] as usize]);
            let c = Vec3::from(positions[tri[2] as usize]);
            let normal = (b - a).cross(c - a);
            let centroid = (a + b + c) / 3.0;
            assert!(normal.dot(centroid) > 0.0);
        }
    }

    #[test]
    fn geo_coordinates_match_texture_mapping() {
        let north = geo_to_local(90.0, 0.0, 10.0);
        assert!((north - Vec3::new(0.0, 10.0, 0.0)).length() < 1e-4);

        // Prime meridian on the equator sits at the middle of the texture (u = 0.5).
        let origin = geo_to_local(0.0, 0.0, 10.0);
        assert!((origin - surface_direction(0.5, 0.5) * 10.0).length() < 1e-4);
        assert!((origin - Vec3::new(10.0, 0.0, 0.0)).length() < 1e-4);

        let lifted = geo_to_local(35.0, 139.0, 11.0);
        assert!((lifted.length() - 11.0).abs() < 1e-4);
    }
}
