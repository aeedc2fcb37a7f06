use crate::engine::assets::image_sampling::{Channel, is_readable, sample_channel_bilinear};
use bevy::prelude::*;
use bevy::render::mesh::VertexAttributeValues;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DisplacementError {
    #[error("mesh is missing the {0} attribute")]
    MissingAttribute(&'static str),
    #[error("displacement map format {0:?} cannot be read on the CPU")]
    UnreadableImage(bevy::render::render_resource::TextureFormat),
}

/// Push every vertex out along its normal by `scale * red(uv)`. Normals are kept
/// as they are, matching how a vertex-shader displacement map behaves.
/// Returns the number of vertices moved.
pub fn displace_along_normals(
    mesh: &mut Mesh,
    displacement_map: &Image,
    scale: f32,
) -> Result<usize, DisplacementError> {
    if !is_readable(displacement_map) {
        return Err(DisplacementError::UnreadableImage(
            displacement_map.texture_descriptor.format,
        ));
    }

    let Some(VertexAttributeValues::Float32x2(uvs)) = mesh.attribute(Mesh::ATTRIBUTE_UV_0) else {
        return Err(DisplacementError::MissingAttribute("uv"));
    };
    let Some(VertexAttributeValues::Float32x3(normals)) = mesh.attribute(Mesh::ATTRIBUTE_NORMAL)
    else {
        return Err(DisplacementError::MissingAttribute("normal"));
    };

    let offsets: Vec<Vec3> = uvs
        .iter()
        .zip(normals.iter())
        .map(|(uv, normal)| {
            let height =
                sample_channel_bilinear(displacement_map, uv[0], uv[1], Channel::Red).unwrap_or(0.0);
            Vec3::from(*normal) * height * scale
        })
        .collect();

    let Some(VertexAttributeValues::Float32x3(positions)) =
        mesh.attribute_mut(Mesh::ATTRIBUTE_POSITION)
    else {
        return Err(DisplacementError::MissingAttribute("position"));
    };

    for (position, offset) in positions.iter_mut().zip(&offsets) {
        *position = (Vec3::from(*position) + *offset).to_array();
    }

    Ok(offsets.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::assets::image_sampling::test_images::{image, solid_rgba};
    use crate::engine::mesh::globe_mesh::globe_mesh;
    use bevy::render::render_resource::TextureFormat;

    fn positions(mesh: &Mesh) -> Vec<Vec3> {
        match mesh.attribute(Mesh::ATTRIBUTE_POSITION) {
            Some(VertexAttributeValues::Float32x3(values)) => {
                values.iter().copied().map(Vec3::from).collect()
            }
            _ => panic!("mesh without positions"),
        }
    }

    #[test]
    fn uniform_map_grows_radius_by_scale_times_red() {
        let mut mesh = globe_mesh(10.0, 16, 8);
        // Red 51 = 0.2
        let map = solid_rgba(4, 4, [51, 0, 0, 255]);
        let moved = displace_along_normals(&mut mesh, &map, 2.0).unwrap();
        assert_eq!(moved, 17 * 9);

        for p in positions(&mesh) {
            assert!((p.length() - 10.4).abs() < 1e-4);
        }
    }

    #[test]
    fn black_map_leaves_mesh_alone() {
        let mut mesh = globe_mesh(3.0, 8, 4);
        let before = positions(&mesh);
        let map = image(2, 2, TextureFormat::R8Unorm, vec![0; 4]);
        displace_along_normals(&mut mesh, &map, 5.0).unwrap();
        assert_eq!(positions(&mesh), before);
    }

    #[test]
    fn normals_are_untouched() {
        let mut mesh = globe_mesh(3.0, 8, 4);
        let before = mesh.attribute(Mesh::ATTRIBUTE_NORMAL).cloned();
        let map = solid_rgba(2, 2, [255, 255, 255, 255]);
        displace_along_normals(&mut mesh, &map, 1.0).unwrap();
        assert_eq!(
            mesh.attribute(Mesh::ATTRIBUTE_NORMAL).map(|a| a.get_bytes().to_vec()),
            before.map(|a| a.get_bytes().to_vec())
        );
    }

    #[test]
    fn unreadable_map_is_rejected() {
        let mut mesh = globe_mesh(3.0, 8, 4);
        let map = image(1, 1, TextureFormat::R32Float, vec![0; 4]);
        assert_eq!(
            displace_along_normals(&mut mesh, &map, 1.0),
            Err(DisplacementError::UnreadableImage(TextureFormat::R32Float))
        );
    }
}
