//! Scene entities built from the manifest.
//!
//! Spawns the globe, its waypoint markers, the scene lights and the
//! background dome once loading has settled.

/// Background sky dome and its fallback clear colour.
pub mod background;

/// Globe mesh, material and spin component.
pub mod globe;

/// Ambient, point and directional lights with unit conversion.
pub mod lighting;

/// Waypoint marker spheres parented to the globe.
pub mod waypoints;
