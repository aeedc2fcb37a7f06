use crate::engine::assets::scene_manifest::SceneManifest;
use crate::engine::camera::orbit_camera::OrbitCamera;
use crate::engine::core::app_state::AppState;
use crate::engine::render::post_processing::{
    BloomParameters, PassKind, PostProcessChain, SsaoParameters, SsaoQuality,
};
use crate::engine::render::sao_post_processing::{SaoOutput, SaoParameters};
use crate::engine::scene::lighting::SceneLight;
use crate::engine::systems::fps_tracking::FpsReadout;
use crate::engine::systems::rotation::SceneParameters;
use bevy::prelude::*;
use bevy_egui::{EguiContextPass, EguiContexts, egui};
use constants::lighting::{AMBIENT_BRIGHTNESS_SCALE, DIRECTIONAL_LUX_SCALE, POINT_LIGHT_LUMENS_SCALE};

/// Upper end of the light sliders, in scene-file units.
const MAX_LIGHT_INTENSITY: f32 = 2.0;

pub struct ParameterPanelPlugin;

impl Plugin for ParameterPanelPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<PanelFocus>().add_systems(
            EguiContextPass,
            parameter_panel_system.run_if(in_state(AppState::Running)),
        );
    }
}

/// Whether egui is using the pointer this frame. The orbit controller ignores
/// drags and wheel input while this is set.
#[derive(Resource, Default, Debug)]
pub struct PanelFocus {
    pub wants_pointer: bool,
}

/// The distance slider drives the orbit radius; at rest the camera sits at z = value.
pub fn apply_camera_distance(orbit: &mut OrbitCamera, value: f32) {
    orbit.set_distance(value);
}

pub fn apply_rotation_speed(parameters: &mut SceneParameters, value: f32, range: [f32; 2]) {
    parameters.rotation_speed = value.clamp(range[0], range[1]);
}

/// Optional passes in chain order, with their current flag.
pub fn optional_passes(chain: &PostProcessChain) -> Vec<(PassKind, bool)> {
    chain
        .slots()
        .iter()
        .filter(|slot| slot.kind != PassKind::Render)
        .map(|slot| (slot.kind, slot.enabled))
        .collect()
}

pub fn scene_units(physical: f32, scale: f32) -> f32 {
    physical / scale
}

pub fn physical_units(scene: f32, scale: f32) -> f32 {
    scene * scale
}

/// Slider over a physical light value, shown in scene-file units.
fn light_slider(ui: &mut egui::Ui, label: &str, physical: f32, scale: f32) -> Option<f32> {
    let mut value = scene_units(physical, scale);
    ui.add(egui::Slider::new(&mut value, 0.0..=MAX_LIGHT_INTENSITY).text(label))
        .changed()
        .then(|| physical_units(value, scale))
}

pub fn parameter_panel_system(
    mut contexts: EguiContexts,
    mut focus: ResMut<PanelFocus>,
    manifest: Res<SceneManifest>,
    fps: Res<FpsReadout>,
    mut orbit: ResMut<OrbitCamera>,
    mut parameters: ResMut<SceneParameters>,
    mut chain: ResMut<PostProcessChain>,
    mut sao: ResMut<SaoParameters>,
    mut ssao: ResMut<SsaoParameters>,
    mut bloom: ResMut<BloomParameters>,
    mut ambient: ResMut<AmbientLight>,
    mut point_lights: Query<(&SceneLight, &mut PointLight)>,
    mut directional_lights: Query<(&SceneLight, &mut DirectionalLight)>,
) {
    let Some(ctx) = contexts.try_ctx_mut() else {
        return;
    };
    let panel = &manifest.panel;

    egui::Window::new("Parameters")
        .default_pos(egui::pos2(12.0, 12.0))
        .resizable(false)
        .show(ctx, |ui| {
            let [min_distance, max_distance] = panel.distance_range;
            let mut distance = orbit.distance;
            let slider = egui::Slider::new(&mut distance, min_distance..=max_distance)
                .clamping(egui::SliderClamping::Never)
                .text("Camera distance");
            if ui.add(slider).changed() {
                apply_camera_distance(&mut orbit, distance);
            }

            let [min_speed, max_speed] = panel.rotation_speed_range;
            let mut speed = parameters.rotation_speed;
            let slider = egui::Slider::new(&mut speed, min_speed..=max_speed).text("Rotation speed");
            if ui.add(slider).changed() {
                apply_rotation_speed(&mut parameters, speed, panel.rotation_speed_range);
            }

            egui::CollapsingHeader::new("Post Processing").show(ui, |ui| {
                for (kind, enabled) in optional_passes(&chain) {
                    let mut checked = enabled;
                    if ui.checkbox(&mut checked, kind.label()).changed() {
                        chain.set_enabled(kind, checked);
                    }
                }

                if chain.is_enabled(PassKind::Ssao) {
                    let mut edited = *ssao;
                    egui::ComboBox::from_label("SSAO quality")
                        .selected_text(edited.quality.label())
                        .show_ui(ui, |ui| {
                            for quality in SsaoQuality::ALL {
                                ui.selectable_value(&mut edited.quality, quality, quality.label());
                            }
                        });
                    ui.add(
                        egui::Slider::new(&mut edited.object_thickness, 0.01..=4.0)
                            .text("Object thickness"),
                    );
                    if edited != *ssao {
                        *ssao = edited;
                    }
                }

                if chain.is_enabled(PassKind::Bloom) {
                    let mut edited = *bloom;
                    ui.add(egui::Slider::new(&mut edited.intensity, 0.0..=1.0).text("Bloom intensity"));
                    ui.add(egui::Slider::new(&mut edited.threshold, 0.0..=4.0).text("Bloom threshold"));
                    if edited != *bloom {
                        *bloom = edited;
                    }
                }
            });

            if panel.ambient_occlusion_folder {
                egui::CollapsingHeader::new("Ambient Occlusion").show(ui, |ui| {
                    let mut edited = *sao;
                    sao_controls(ui, &mut edited);
                    if edited != *sao {
                        *sao = edited;
                    }
                });
            }

            egui::CollapsingHeader::new("Lights").show(ui, |ui| {
                if let Some(value) = light_slider(ui, "Ambient", ambient.brightness, AMBIENT_BRIGHTNESS_SCALE) {
                    ambient.brightness = value;
                }
                for (scene_light, mut light) in &mut point_lights {
                    if let Some(value) =
                        light_slider(ui, &scene_light.label, light.intensity, POINT_LIGHT_LUMENS_SCALE)
                    {
                        light.intensity = value;
                    }
                }
                for (scene_light, mut light) in &mut directional_lights {
                    if let Some(value) =
                        light_slider(ui, &scene_light.label, light.illuminance, DIRECTIONAL_LUX_SCALE)
                    {
                        light.illuminance = value;
                    }
                }
            });

            ui.separator();
            ui.label(fps.label());
        });

    focus.wants_pointer = ctx.wants_pointer_input() || ctx.is_pointer_over_area();
}

fn sao_controls(ui: &mut egui::Ui, params: &mut SaoParameters) {
    egui::ComboBox::from_label("Output")
        .selected_text(params.output.label())
        .show_ui(ui, |ui| {
            for output in SaoOutput::ALL {
                ui.selectable_value(&mut params.output, output, output.label());
            }
        });

    egui::Grid::new("sao_parameters").num_columns(2).show(ui, |ui| {
        let rows: [(&str, &mut f32, f64); 8] = [
            ("Bias", &mut params.bias, 0.01),
            ("Intensity", &mut params.intensity, 0.001),
            ("Scale", &mut params.scale, 0.1),
            ("Kernel radius", &mut params.kernel_radius, 1.0),
            ("Min resolution", &mut params.min_resolution, 0.0001),
            ("Blur radius", &mut params.blur_radius, 0.1),
            ("Blur std dev", &mut params.blur_std_dev, 0.1),
            ("Blur depth cutoff", &mut params.blur_depth_cutoff, 0.0001),
        ];
        for (label, value, speed) in rows {
            ui.label(label);
            ui.add(egui::DragValue::new(value).speed(speed));
            ui.end_row();
        }
    });

    ui.checkbox(&mut params.blur, "Blur");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::render::post_processing::PassSlot;

    #[test]
    fn distance_slider_places_camera_on_z() {
        let mut orbit = OrbitCamera::default();
        apply_camera_distance(&mut orbit, 42.0);
        assert_eq!(orbit.translation().z, 42.0);
    }

    #[test]
    fn rotation_speed_stays_in_panel_range() {
        let mut parameters = SceneParameters::default();
        apply_rotation_speed(&mut parameters, 0.25, [0.0, 1.0]);
        assert_eq!(parameters.rotation_speed, 0.25);
        apply_rotation_speed(&mut parameters, 3.0, [0.0, 1.0]);
        assert_eq!(parameters.rotation_speed, 1.0);
    }

    #[test]
    fn render_pass_has_no_checkbox() {
        let chain = PostProcessChain::from_slots(&[
            PassSlot::new(PassKind::Render, true),
            PassSlot::new(PassKind::Sao, false),
            PassSlot::new(PassKind::Bloom, true),
        ]);
        assert_eq!(
            optional_passes(&chain),
            vec![(PassKind::Sao, false), (PassKind::Bloom, true)]
        );
    }

    #[test]
    fn light_units_round_trip_through_slider() {
        let physical = physical_units(0.6, AMBIENT_BRIGHTNESS_SCALE);
        assert!((physical - 300.0).abs() < 1e-3);
        assert!((scene_units(physical, AMBIENT_BRIGHTNESS_SCALE) - 0.6).abs() < 1e-6);
    }
}
