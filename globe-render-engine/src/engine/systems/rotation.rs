use crate::engine::scene::globe::GlobeSpin;
use bevy::prelude::*;
use std::f32::consts::TAU;

/// Live scene parameters the panel edits.
#[derive(Resource, Debug, Clone, Copy, PartialEq)]
pub struct SceneParameters {
    /// Radians removed from the globe's Y rotation each frame.
    pub rotation_speed: f32,
}

impl Default for SceneParameters {
    fn default() -> Self {
        Self {
            rotation_speed: 0.001,
        }
    }
}

/// Advance one frame of spin. The step is per frame, not per second.
/// The result always lies in `[0, TAU)`.
pub fn advance_spin(angle: f32, speed: f32) -> f32 {
    let wrapped = (angle - speed).rem_euclid(TAU);
    // rem_euclid rounds tiny negative inputs up to exactly TAU
    if wrapped >= TAU { 0.0 } else { wrapped }
}

pub fn spin_globes(
    parameters: Res<SceneParameters>,
    mut globes: Query<(&mut GlobeSpin, &mut Transform)>,
) {
    if parameters.rotation_speed == 0.0 {
        return;
    }
    for (mut spin, mut transform) in &mut globes {
        spin.angle = advance_spin(spin.angle, parameters.rotation_speed);
        transform.rotation = Quat::from_rotation_y(spin.angle);
    }
}
