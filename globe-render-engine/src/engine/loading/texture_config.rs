use crate::engine::assets::globe_assets::GlobeTextures;
use crate::engine::assets::image_sampling::{
    Channel, bytes_per_texel, channel_at, is_readable, sample_channel_bilinear,
};
use crate::engine::loading::progress::LoadingProgress;
use bevy::asset::RenderAssetUsages;
use bevy::image::{ImageAddressMode, ImageFilterMode, ImageSampler, ImageSamplerDescriptor};
use bevy::prelude::*;
use bevy::render::render_resource::{Extent3d, TextureDimension, TextureFormat};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TextureConfigError {
    #[error("{role} map has format {format:?}, expected 8-bit RGBA")]
    UnsupportedFormat {
        role: &'static str,
        format: TextureFormat,
    },
    #[error("{0} map has no CPU-side pixel data")]
    MissingData(&'static str),
}

/// Globe maps wrap around the seam and clamp at the poles.
pub fn globe_sampler() -> ImageSampler {
    ImageSampler::Descriptor(ImageSamplerDescriptor {
        address_mode_u: ImageAddressMode::Repeat,
        address_mode_v: ImageAddressMode::ClampToEdge,
        mag_filter: ImageFilterMode::Linear,
        min_filter: ImageFilterMode::Linear,
        mipmap_filter: ImageFilterMode::Linear,
        ..default()
    })
}

/// Copy of `diffuse` whose alpha comes from the green channel of `alpha_map`,
/// sampled at the same texture coordinates (the maps need not share a size).
pub fn bake_alpha_map(diffuse: &Image, alpha_map: &Image) -> Result<Image, TextureConfigError> {
    let format = diffuse.texture_descriptor.format;
    if bytes_per_texel(format) != Some(4) {
        return Err(TextureConfigError::UnsupportedFormat {
            role: "diffuse",
            format,
        });
    }
    if !is_readable(alpha_map) {
        return Err(TextureConfigError::UnsupportedFormat {
            role: "alpha",
            format: alpha_map.texture_descriptor.format,
        });
    }
    let Some(source) = diffuse.data.as_ref() else {
        return Err(TextureConfigError::MissingData("diffuse"));
    };

    let width = diffuse.width();
    let height = diffuse.height();
    let mut data = source.clone();
    for y in 0..height {
        let v = (y as f32 + 0.5) / height as f32;
        for x in 0..width {
            let u = (x as f32 + 0.5) / width as f32;
            let alpha = sample_channel_bilinear(alpha_map, u, v, Channel::Green).unwrap_or(1.0);
            let index = ((y * width + x) * 4 + 3) as usize;
            if let Some(byte) = data.get_mut(index) {
                *byte = (alpha.clamp(0.0, 1.0) * 255.0).round() as u8;
            }
        }
    }

    let mut baked = rgba8_image(width, height, data, format);
    baked.sampler = diffuse.sampler.clone();
    Ok(baked)
}

/// Linear RGBA8 image laid out the way `StandardMaterial` reads a
/// metallic-roughness map: roughness in G, full metallic in B.
pub fn pack_metallic_roughness(roughness_map: &Image) -> Result<Image, TextureConfigError> {
    if !is_readable(roughness_map) {
        return Err(TextureConfigError::UnsupportedFormat {
            role: "roughness",
            format: roughness_map.texture_descriptor.format,
        });
    }

    let width = roughness_map.width();
    let height = roughness_map.height();
    let mut data = Vec::with_capacity((width * height * 4) as usize);
    for y in 0..height {
        for x in 0..width {
            let roughness = channel_at(roughness_map, x, y, Channel::Green).unwrap_or(1.0);
            data.extend_from_slice(&[0, (roughness * 255.0).round() as u8, 255, 255]);
        }
    }

    Ok(rgba8_image(width, height, data, TextureFormat::Rgba8Unorm))
}

fn rgba8_image(width: u32, height: u32, data: Vec<u8>, format: TextureFormat) -> Image {
    Image::new(
        Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        },
        TextureDimension::D2,
        data,
        format,
        RenderAssetUsages::RENDER_WORLD | RenderAssetUsages::MAIN_WORLD,
    )
}

// Configure globe samplers and build the derived maps once every texture has settled
pub fn configure_loaded_textures(
    mut loading_progress: ResMut<LoadingProgress>,
    mut textures: ResMut<GlobeTextures>,
    mut images: ResMut<Assets<Image>>,
) {
    if loading_progress.textures_configured || !loading_progress.textures_settled {
        return;
    }

    for handle in [
        &textures.diffuse,
        &textures.roughness,
        &textures.displacement,
        &textures.alpha,
    ]
    .into_iter()
    .flatten()
    {
        if let Some(image) = images.get_mut(handle) {
            image.sampler = globe_sampler();
        }
    }

    if let (Some(diffuse), Some(alpha)) = (&textures.diffuse, &textures.alpha) {
        let baked = match (images.get(diffuse), images.get(alpha)) {
            (Some(diffuse), Some(alpha)) => Some(bake_alpha_map(diffuse, alpha)),
            _ => None,
        };
        match baked {
            Some(Ok(image)) => {
                textures.diffuse_with_alpha = Some(images.add(image));
                info!("✓ Alpha map baked into diffuse");
            }
            Some(Err(err)) => warn!("Alpha map not applied: {}", err),
            None => {}
        }
    }

    if let Some(roughness) = &textures.roughness {
        match images.get(roughness).map(pack_metallic_roughness) {
            Some(Ok(image)) => {
                textures.metallic_roughness = Some(images.add(image));
                info!("✓ Roughness map packed");
            }
            Some(Err(err)) => warn!("Roughness map not applied: {}", err),
            None => {}
        }
    }

    loading_progress.textures_configured = true;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::assets::image_sampling::test_images::{image, solid_rgba};

    #[test]
    fn alpha_comes_from_green_channel() {
        let diffuse = solid_rgba(4, 2, [10, 20, 30, 255]);
        let alpha = solid_rgba(2, 2, [0, 102, 255, 255]);
        let baked = bake_alpha_map(&diffuse, &alpha).unwrap();

        let data = baked.data.unwrap();
        for texel in data.chunks(4) {
            assert_eq!(texel, &[10, 20, 30, 102]);
        }
        assert_eq!(baked.texture_descriptor.format, TextureFormat::Rgba8UnormSrgb);
    }

    #[test]
    fn greyscale_alpha_map_is_accepted() {
        let diffuse = solid_rgba(2, 2, [255, 255, 255, 255]);
        let alpha = image(1, 1, TextureFormat::R8Unorm, vec![0]);
        let baked = bake_alpha_map(&diffuse, &alpha).unwrap();
        assert!(baked.data.unwrap().chunks(4).all(|texel| texel[3] == 0));
    }

    #[test]
    fn float_diffuse_is_rejected() {
        let diffuse = image(1, 1, TextureFormat::R32Float, vec![0; 4]);
        let alpha = solid_rgba(1, 1, [0, 0, 0, 0]);
        assert!(matches!(
            bake_alpha_map(&diffuse, &alpha),
            Err(TextureConfigError::UnsupportedFormat { role: "diffuse", .. })
        ));
    }

    #[test]
    fn roughness_packs_into_green_with_full_metallic() {
        let roughness = image(2, 1, TextureFormat::Rgba8UnormSrgb, vec![9, 40, 9, 255, 9, 200, 9, 255]);
        let packed = pack_metallic_roughness(&roughness).unwrap();

        assert_eq!(packed.texture_descriptor.format, TextureFormat::Rgba8Unorm);
        assert_eq!(packed.data.unwrap(), vec![0, 40, 255, 255, 0, 200, 255, 255]);
    }

    #[test]
    fn globe_maps_wrap_horizontally() {
        let ImageSampler::Descriptor(descriptor) = globe_sampler() else {
            panic!("expected an explicit sampler");
        };
        assert_eq!(descriptor.address_mode_u, ImageAddressMode::Repeat);
        assert_eq!(descriptor.address_mode_v, ImageAddressMode::ClampToEdge);
    }
}
