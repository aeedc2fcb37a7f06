//! Orbit camera around the globe.
//!
//! Holds the spherical orbit state as a resource and turns pointer drags and
//! wheel input into a camera transform each frame.

/// Orbit state, input handling and the main camera marker.
pub mod orbit_camera;
