//! Post-processing for the main camera.
//!
//! Keeps the ordered pass chain in sync with the camera's effect components
//! and provides the custom scalable ambient occlusion render node.

/// Ordered pass chain, built-in pass parameters and the camera sync system.
pub mod post_processing;

/// Scalable ambient occlusion (SAO) full-screen pass.
///
/// Reads the depth prepass, reconstructs view-space normals and darkens the HDR target.
pub mod sao_post_processing;
