//! Scene files describe light strength on a unitless 0..1 scale.
//! These factors turn that into the photometric units bevy expects.

/// Ambient intensity 1.0 maps to this many cd/m^2.
pub const AMBIENT_BRIGHTNESS_SCALE: f32 = 500.0;

/// Point light intensity 1.0 maps to this many lumens.
pub const POINT_LIGHT_LUMENS_SCALE: f32 = 4_000_000.0;

/// Directional light intensity 1.0 maps to this many lux.
pub const DIRECTIONAL_LUX_SCALE: f32 = 10_000.0;

/// Point lights sit roughly 90 units from the globe centre, well past bevy's default range.
pub const POINT_LIGHT_RANGE: f32 = 500.0;

/// Shadow map resolution for point and directional lights.
pub const SHADOW_MAP_SIZE: usize = 2048;
