//! Shared compile-time settings for the globe viewer.

/// Asset paths, scene names and the canvas selector.
pub mod path;

/// Unit scales that map scene-file light intensities onto physical units.
pub mod lighting;

/// Camera, shadow and post-processing defaults.
pub mod render_settings;
