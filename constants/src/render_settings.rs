use bevy::color::Color;

/// Clear colour used when the background texture is missing or failed to load.
pub const FALLBACK_CLEAR_COLOR: Color = Color::srgb(0.0, 0.0, 0.0);

/// Radius of the inward-facing background dome. Must stay inside the camera far plane.
pub const SKY_DOME_RADIUS: f32 = 900.0;

/// Tessellation of the background dome.
pub const SKY_DOME_SEGMENTS: u32 = 64;

/// Polar angle is kept this far from the poles so the orbit basis never degenerates.
pub const ORBIT_POLAR_EPSILON: f32 = 1.0e-3;

/// Wheel zoom factor per scroll line, as in the classic orbit controls.
pub const ORBIT_ZOOM_STEP: f32 = 0.95;

/// Zoom and pan scale from at least this distance, so an orbit parked on its
/// target can still be moved away from it.
pub const ORBIT_ZOOM_FLOOR: f32 = 0.01;

/// Pixel-precision wheels deliver this many pixels per "line".
pub const ORBIT_PIXELS_PER_LINE: f32 = 20.0;

/// How often (seconds) the panel refreshes its FPS readout.
pub const FPS_REFRESH_INTERVAL: f32 = 0.5;
