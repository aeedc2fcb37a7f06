//! Per-frame runtime systems.
//!
//! Globe spin driven by the live scene parameters, and FPS sampling for the panel.

/// FPS sampling from the frame-time diagnostics.
pub mod fps_tracking;

/// Scene parameters and the per-frame globe spin.
pub mod rotation;
