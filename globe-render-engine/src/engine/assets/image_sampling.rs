//! Raw texel access for the 8-bit images the scene uses as data maps
//! (displacement, alpha, roughness). Values are the stored bytes scaled to 0..1,
//! with no colour-space conversion.

use bevy::prelude::*;
use bevy::render::render_resource::TextureFormat;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    Red,
    Green,
    Blue,
    Alpha,
}

impl Channel {
    fn rgba_offset(self) -> usize {
        match self {
            Channel::Red => 0,
            Channel::Green => 1,
            Channel::Blue => 2,
            Channel::Alpha => 3,
        }
    }
}

/// Bytes per texel for the formats we can read, `None` for anything else.
pub fn bytes_per_texel(format: TextureFormat) -> Option<usize> {
    match format {
        TextureFormat::R8Unorm => Some(1),
        TextureFormat::Rg8Unorm => Some(2),
        TextureFormat::Rgba8Unorm | TextureFormat::Rgba8UnormSrgb => Some(4),
        _ => None,
    }
}

pub fn is_readable(image: &Image) -> bool {
    bytes_per_texel(image.texture_descriptor.format).is_some() && image.data.is_some()
}

/// Read one channel of one texel. Greyscale formats answer every colour channel
/// with their luminance, and report opaque alpha unless they store one.
pub fn channel_at(image: &Image, x: u32, y: u32, channel: Channel) -> Option<f32> {
    let format = image.texture_descriptor.format;
    let stride = bytes_per_texel(format)?;
    let data = image.data.as_ref()?;

    if x >= image.width() || y >= image.height() {
        return None;
    }

    let texel = (y as usize * image.width() as usize + x as usize) * stride;
    let offset = match (format, channel) {
        (TextureFormat::R8Unorm, Channel::Alpha) => return Some(1.0),
        (TextureFormat::R8Unorm, _) => 0,
        (TextureFormat::Rg8Unorm, Channel::Alpha) => 1,
        (TextureFormat::Rg8Unorm, _) => 0,
        _ => channel.rgba_offset(),
    };

    data.get(texel + offset).map(|byte| *byte as f32 / 255.0)
}

/// Sample a channel at normalised UV with bilinear interpolation.
/// U wraps around (sphere seam), V clamps at the poles.
pub fn sample_channel_bilinear(image: &Image, u: f32, v: f32, channel: Channel) -> Option<f32> {
    let width = image.width();
    let height = image.height();
    if width == 0 || height == 0 {
        return None;
    }

    // Continuous pixel space, texel centres at integer coordinates
    let pixel_x_f = u.rem_euclid(1.0) * width as f32 - 0.5;
    let pixel_y_f = (v.clamp(0.0, 1.0) * height as f32 - 0.5).clamp(0.0, (height - 1) as f32);

    let x0_f = pixel_x_f.floor();
    let y0 = pixel_y_f.floor() as u32;
    let wx = pixel_x_f - x0_f;
    let wy = pixel_y_f - y0 as f32;

    let x0 = (x0_f as i64).rem_euclid(width as i64) as u32;
    let x1 = (x0 + 1) % width;
    let y1 = (y0 + 1).min(height - 1);

    let h00 = channel_at(image, x0, y0, channel)?;
    let h10 = channel_at(image, x1, y0, channel)?;
    let h01 = channel_at(image, x0, y1, channel)?;
    let h11 = channel_at(image, x1, y1, channel)?;

    let top = h00 * (1.0 - wx) + h10 * wx;
    let bottom = h01 * (1.0 - wx) + h11 * wx;
    Some(top * (1.0 - wy) + bottom * wy)
}
