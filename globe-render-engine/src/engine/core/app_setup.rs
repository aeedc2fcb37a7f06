use bevy::asset::AssetMetaCheck;
use bevy::diagnostic::FrameTimeDiagnosticsPlugin;
use bevy::log::{Level, LogPlugin};
use bevy::pbr::ShadowFilteringMethod;
use bevy::prelude::*;
use bevy::render::view::Msaa;
use bevy_common_assets::json::JsonAssetPlugin;
use bevy_egui::EguiPlugin;
use crate::engine::assets::globe_assets::{GlobeTextures, TextureCatalog};
use crate::engine::assets::scene_manifest::{CameraSettings, SceneManifest};
use crate::engine::camera::orbit_camera::{MainCamera, OrbitCamera, orbit_camera_controller};
use crate::engine::core::window_config::create_window_config;
use crate::engine::loading::manifest_loader::{ManifestLoader, load_manifest_system, start_loading};
use crate::engine::loading::progress::LoadingProgress;
use crate::engine::loading::scene_builder::{build_scene_when_ready, perspective_from_settings};
use crate::engine::loading::texture_config::configure_loaded_textures;
use crate::engine::loading::texture_loader::check_texture_loading;
use crate::engine::render::post_processing::{
    Antialiasing, BloomParameters, PostProcessChain, SsaoParameters, sync_post_processing,
};
use crate::engine::render::sao_post_processing::{SaoParameters, SaoPostProcessPlugin};
use crate::engine::scene::background::follow_camera;
use crate::engine::scene::globe::sync_globe_alpha_mode;
use crate::engine::systems::fps_tracking::{FpsReadout, fps_readout_system};
use crate::engine::systems::rotation::{SceneParameters, spin_globes};
// Transitions
use crate::engine::core::app_state::{AppState, transition_to_assets_loaded, transition_to_running};
// Debug GUI
use crate::ui::parameter_panel::ParameterPanelPlugin;

pub fn create_app() -> App {
    let mut app = App::new();

    app.add_plugins(create_default_plugins())
        .init_state::<AppState>()
        .add_plugins(FrameTimeDiagnosticsPlugin::default())
        // Registers SceneManifest as a loadable asset type from *.scene.json files.
        .add_plugins(JsonAssetPlugin::<SceneManifest>::new(&["scene.json"]))
        .add_plugins(EguiPlugin {
            enable_multipass_for_primary_context: true,
        })
        .add_plugins(SaoPostProcessPlugin)
        .add_plugins(ParameterPanelPlugin);

    // Initialise resources early; the manifest loader replaces them with scene values
    app.init_resource::<LoadingProgress>()
        .init_resource::<ManifestLoader>()
        .init_resource::<TextureCatalog>()
        .init_resource::<GlobeTextures>()
        .init_resource::<SceneManifest>()
        .init_resource::<SceneParameters>()
        .init_resource::<OrbitCamera>()
        .init_resource::<PostProcessChain>()
        .init_resource::<SaoParameters>()
        .init_resource::<SsaoParameters>()
        .init_resource::<BloomParameters>()
        .init_resource::<Antialiasing>()
        .init_resource::<FpsReadout>();

    // Each phase runs only in its own state
    app.add_systems(Startup, (setup, start_loading).chain())
        .add_systems(
            Update,
            (
                load_manifest_system,
                check_texture_loading,
                configure_loaded_textures,
                transition_to_assets_loaded,
            )
                .chain()
                .run_if(in_state(AppState::Loading)),
        )
        .add_systems(
            Update,
            (build_scene_when_ready, transition_to_running)
                .chain()
                .run_if(in_state(AppState::AssetsLoaded)),
        )
        .add_systems(
            Update,
            (
                spin_globes,
                orbit_camera_controller,
                follow_camera,
                sync_post_processing,
                sync_globe_alpha_mode,
                fps_readout_system,
            )
                .chain()
                .run_if(in_state(AppState::Running)),
        );

    app
}

fn spawn_main_camera(commands: &mut Commands) {
    let settings = CameraSettings::default();
    commands.spawn((
        Name::new("Main camera"),
        MainCamera,
        Camera3d::default(),
        Camera {
            hdr: true,
            ..default()
        },
        perspective_from_settings(&settings),
        OrbitCamera::from_settings(&settings).transform(),
        ShadowFilteringMethod::Gaussian,
        Msaa::Sample4,
    ));
}

// The camera exists from the first frame; the scene builder later aims it from the manifest
fn setup(mut commands: Commands) {
    spawn_main_camera(&mut commands);
}

fn create_default_plugins() -> impl PluginGroup {
    let window_config = WindowPlugin {
        primary_window: Some(create_window_config()),
        ..default()
    };

    let asset_config = AssetPlugin {
        meta_check: AssetMetaCheck::Never,
        ..default()
    };

    let log_config = LogPlugin {
        level: Level::INFO,
        filter: "wgpu=error,naga=warn,globe_render_engine=info".to_string(),
        ..default()
    };

    DefaultPlugins
        .set(window_config)
        .set(asset_config)
        .set(log_config)
}
