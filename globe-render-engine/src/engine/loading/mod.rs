//! Asset loading and scene initialisation.
//!
//! Manages the multi-stage pipeline from manifest parsing through texture
//! configuration to scene construction, with progress tracking.

/// Scene selection, manifest loading and live resource seeding.
///
/// Requests every declared texture once the manifest has been validated.
pub mod manifest_loader;

/// Loading progress tracking resource for state transitions.
pub mod progress;

/// Spawns the globe, markers, lights and background after textures are configured.
pub mod scene_builder;

/// Sampler setup and derived maps: baked alpha and packed metallic-roughness.
pub mod texture_config;

/// Per-texture load state monitoring. Failed textures are logged and skipped.
pub mod texture_loader;
