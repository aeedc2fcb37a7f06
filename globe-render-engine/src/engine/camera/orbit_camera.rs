use crate::engine::assets::scene_manifest::CameraSettings;
use crate::ui::parameter_panel::PanelFocus;
use bevy::input::mouse::{MouseMotion, MouseScrollUnit, MouseWheel};
use bevy::{prelude::*, window::PrimaryWindow};
use constants::render_settings::{
    ORBIT_PIXELS_PER_LINE, ORBIT_POLAR_EPSILON, ORBIT_ZOOM_FLOOR, ORBIT_ZOOM_STEP,
};
use std::f32::consts::{FRAC_PI_2, PI, TAU};

/// Marks the single scene camera that orbit input and post-processing act on.
#[derive(Component, Debug, Default)]
pub struct MainCamera;

/// Spherical orbit around `target`. Azimuth is measured around +Y from +Z,
/// polar from +Y, so azimuth 0 and polar π/2 look down -Z from the +Z axis.
#[derive(Resource, Debug, Clone, PartialEq)]
pub struct OrbitCamera {
    pub target: Vec3,
    pub distance: f32,
    pub azimuth: f32,
    pub polar: f32,
    pub min_distance: f32,
    pub max_distance: f32,
    pub rotate_speed: f32,
    pub zoom_speed: f32,
    pub pan_speed: f32,
}

impl Default for OrbitCamera {
    fn default() -> Self {
        Self::from_settings(&CameraSettings::default())
    }
}

impl OrbitCamera {
    pub fn from_settings(settings: &CameraSettings) -> Self {
        let mut orbit = Self {
            target: Vec3::ZERO,
            distance: settings.distance,
            azimuth: 0.0,
            polar: FRAC_PI_2,
            min_distance: settings.min_distance,
            max_distance: settings.max_distance,
            rotate_speed: 1.0,
            zoom_speed: 1.0,
            pan_speed: 1.0,
        };
        orbit.set_distance(settings.distance);
        orbit
    }

    /// Drag by a pixel delta. A full viewport-height drag turns the camera once around.
    pub fn rotate(&mut self, dx: f32, dy: f32, viewport_height: f32) {
        if viewport_height <= 0.0 {
            return;
        }
        let scale = TAU * self.rotate_speed / viewport_height;
        self.azimuth = (self.azimuth - dx * scale).rem_euclid(TAU);
        self.polar = (self.polar - dy * scale).clamp(ORBIT_POLAR_EPSILON, PI - ORBIT_POLAR_EPSILON);
    }

    /// Positive scroll (wheel away from the user) moves towards the target.
    pub fn zoom(&mut self, scroll_lines: f32) {
        let factor = ORBIT_ZOOM_STEP.powf(scroll_lines * self.zoom_speed);
        self.set_distance(self.distance.max(ORBIT_ZOOM_FLOOR) * factor);
    }

    /// Drag the target in the view plane so the point under the cursor follows it.
    pub fn pan(&mut self, dx: f32, dy: f32, viewport_height: f32, fov: f32) {
        if viewport_height <= 0.0 {
            return;
        }
        let transform = self.transform();
        let world_per_pixel =
            2.0 * self.distance.max(ORBIT_ZOOM_FLOOR) * (fov * 0.5).tan() / viewport_height;
        let offset = (transform.right() * -dx + transform.up() * dy) * world_per_pixel * self.pan_speed;
        self.target += offset;
    }

    pub fn set_distance(&mut self, distance: f32) {
        self.distance = distance.clamp(self.min_distance, self.max_distance);
    }

    /// Unit vector from the target towards the camera.
    fn offset_direction(&self) -> Vec3 {
        let (sin_polar, cos_polar) = self.polar.sin_cos();
        let (sin_azimuth, cos_azimuth) = self.azimuth.sin_cos();
        Vec3::new(sin_polar * sin_azimuth, cos_polar, sin_polar * cos_azimuth)
    }

    pub fn translation(&self) -> Vec3 {
        self.target + self.offset_direction() * self.distance
    }

    // Orientation comes from the angles, so it stays defined at distance zero
    pub fn transform(&self) -> Transform {
        Transform::from_translation(self.translation()).looking_to(-self.offset_direction(), Vec3::Y)
    }
}

/// Left drag rotates, right drag pans, wheel zooms. Pointer input that egui
/// claims for the panel never reaches the orbit.
pub fn orbit_camera_controller(
    mut orbit: ResMut<OrbitCamera>,
    mut cameras: Query<(&mut Transform, &Projection), With<MainCamera>>,
    mouse_button: Res<ButtonInput<MouseButton>>,
    mut mouse_motion: EventReader<MouseMotion>,
    mut scroll_events: EventReader<MouseWheel>,
    windows: Query<&Window, With<PrimaryWindow>>,
    panel_focus: Res<PanelFocus>,
) {
    let mouse_delta: Vec2 = mouse_motion.read().map(|motion| motion.delta).sum();
    let scroll: f32 = scroll_events
        .read()
        .map(|event| match event.unit {
            MouseScrollUnit::Line => event.y,
            MouseScrollUnit::Pixel => event.y / ORBIT_PIXELS_PER_LINE,
        })
        .sum();

    let Ok((mut transform, projection)) = cameras.single_mut() else {
        return;
    };

    if !panel_focus.wants_pointer {
        let viewport_height = windows.single().map(|w| w.height()).unwrap_or(0.0);

        if mouse_delta != Vec2::ZERO {
            if mouse_button.pressed(MouseButton::Left) {
                orbit.rotate(mouse_delta.x, mouse_delta.y, viewport_height);
            } else if mouse_button.pressed(MouseButton::Right) {
                let fov = match projection {
                    Projection::Perspective(perspective) => perspective.fov,
                    _ => FRAC_PI_2,
                };
                orbit.pan(mouse_delta.x, mouse_delta.y, viewport_height, fov);
            }
        }

        if scroll.abs() > f32::EPSILON {
            orbit.zoom(scroll);
        }
    }

    if orbit.is_changed() {
        *transform = orbit.transform();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distance_maps_straight_onto_z_at_rest() {
        let mut orbit = OrbitCamera::default();
        for v in [0.0, 12.5, 28.0, 73.3, 100.0] {
            orbit.set_distance(v);
            assert_eq!(orbit.translation().z, v);
            assert!(orbit.translation().x.abs() < 1e-5);
        }
    }

    #[test]
    fn polar_angle_never_reaches_the_poles() {
        let mut orbit = OrbitCamera::default();
        orbit.rotate(0.0, 100_000.0, 600.0);
        assert!(orbit.polar >= ORBIT_POLAR_EPSILON);
        orbit.rotate(0.0, -100_000.0, 600.0);
        assert!(orbit.polar <= PI - ORBIT_POLAR_EPSILON);
        assert!(orbit.transform().translation.is_finite());
    }

    #[test]
    fn zoom_in_moves_closer_and_respects_limits() {
        let mut orbit = OrbitCamera::default();
        let before = orbit.distance;
        orbit.zoom(1.0);
        assert!(orbit.distance < before);

        orbit.zoom(-1.0);
        assert!((orbit.distance - before).abs() < 1e-3);

        orbit.max_distance = 120.0;
        orbit.zoom(-500.0);
        assert_eq!(orbit.distance, 120.0);
    }

    #[test]
    fn zoom_out_escapes_a_zero_distance() {
        let mut orbit = OrbitCamera::default();
        orbit.min_distance = 0.0;
        orbit.set_distance(0.0);
        assert_eq!(orbit.distance, 0.0);

        orbit.zoom(-1.0);
        assert!(orbit.distance > 0.0);
        let first = orbit.distance;
        orbit.zoom(-10.0);
        assert!(orbit.distance > first);
    }

    #[test]
    fn camera_on_its_target_keeps_a_valid_orientation() {
        let mut orbit = OrbitCamera::default();
        orbit.min_distance = 0.0;
        orbit.set_distance(0.0);
        orbit.rotate(90.0, 30.0, 600.0);

        let transform = orbit.transform();
        assert!(transform.translation.is_finite());
        assert!(transform.rotation.is_finite());
        assert!(transform.rotation.is_normalized());

        let mut away = orbit.clone();
        away.set_distance(10.0);
        let reference = away.transform();
        assert!(transform.forward().dot(*reference.forward()) > 0.999);
    }

    #[test]
    fn panning_right_moves_target_left() {
        let mut orbit = OrbitCamera::default();
        orbit.pan(50.0, 0.0, 600.0, 75.0_f32.to_radians());
        assert!(orbit.target.x < 0.0);
        assert!(orbit.target.y.abs() < 1e-4);
        // The camera stays at the same offset from the target.
        assert!(((orbit.translation() - orbit.target).length() - orbit.distance).abs() < 1e-3);
    }

    #[test]
    fn camera_looks_at_target() {
        let mut orbit = OrbitCamera::default();
        orbit.rotate(120.0, -40.0, 600.0);
        let transform = orbit.transform();
        let towards_target = (orbit.target - transform.translation).normalize();
        assert!(transform.forward().dot(towards_target) > 0.999);
    }
}
