//! Scene description and texture bookkeeping.
//!
//! Handles the JSON scene manifest, the path-to-handle texture catalog,
//! and CPU access to the 8-bit data maps.

/// Per-role texture handles and the deduplicating texture catalog.
pub mod globe_assets;

/// Texel reads and bilinear sampling of 8-bit images.
pub mod image_sampling;

/// Scene manifest loaded from `*.scene.json`, with defaults and validation.
pub mod scene_manifest;
