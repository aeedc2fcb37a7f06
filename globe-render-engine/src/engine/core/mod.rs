//! Core application setup and state management.
//!
//! Handles application lifecycle, window configuration, state transitions,
//! and plugin initialisation for both native and WASM targets.

/// Application setup and plugin configuration for the Bevy engine.
///
/// Creates the main app with the post-processing node, manifest asset loader,
/// debug panel and the state-gated system sets.
pub mod app_setup;

/// Application state machine and loading progress transitions.
///
/// Manages states from manifest and texture loading through scene construction to runtime.
pub mod app_state;

/// Platform-specific window configuration for native and WASM builds.
///
/// Configures canvas integration for web targets and vsync settings.
pub mod window_config;
