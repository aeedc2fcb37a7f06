//! CPU-side mesh generation for the globe and its markers.
//!
//! The sphere is tessellated with the texture layout equirectangular Earth
//! maps expect; terrain relief is baked in from the displacement map.

/// UV sphere tessellation and latitude/longitude placement.
pub mod globe_mesh;

/// Vertex displacement along normals from a height map.
pub mod displacement;
