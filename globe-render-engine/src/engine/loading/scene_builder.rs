use crate::engine::assets::globe_assets::GlobeTextures;
use crate::engine::assets::scene_manifest::{CameraSettings, SceneManifest};
use crate::engine::camera::orbit_camera::{MainCamera, OrbitCamera};
use crate::engine::loading::progress::LoadingProgress;
use crate::engine::render::post_processing::PostProcessChain;
use crate::engine::scene::background::spawn_background;
use crate::engine::scene::globe::{build_globe_mesh, globe_material, spawn_globe};
use crate::engine::scene::lighting::spawn_lights;
use crate::engine::scene::waypoints::spawn_waypoints;
use bevy::prelude::*;

pub fn perspective_from_settings(settings: &CameraSettings) -> Projection {
    Projection::Perspective(PerspectiveProjection {
        fov: settings.fov_degrees.to_radians(),
        near: settings.near,
        far: settings.far,
        ..default()
    })
}

/// Build the globe, markers, lights and background once, then aim the camera.
pub fn build_scene_when_ready(
    mut commands: Commands,
    mut loading_progress: ResMut<LoadingProgress>,
    manifest: Res<SceneManifest>,
    textures: Res<GlobeTextures>,
    orbit: Res<OrbitCamera>,
    chain: Res<PostProcessChain>,
    images: Res<Assets<Image>>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    mut cameras: Query<(&mut Projection, &mut Transform), With<MainCamera>>,
) {
    if loading_progress.scene_built || !loading_progress.textures_configured {
        return;
    }

    let globe_settings = &manifest.globe;
    let mesh = meshes.add(build_globe_mesh(globe_settings, &textures, &images));
    let material = materials.add(globe_material(
        globe_settings,
        &textures,
        chain.occlusion_enabled(),
    ));
    let globe = spawn_globe(&mut commands, mesh, material, globe_settings);

    spawn_waypoints(
        &mut commands,
        globe,
        globe_settings.radius,
        &manifest.waypoints,
        &mut meshes,
        &mut materials,
        textures.marker.clone(),
    );

    spawn_lights(&mut commands, &manifest.lights);
    spawn_background(
        &mut commands,
        &mut meshes,
        &mut materials,
        textures.background.clone(),
    );

    for (mut projection, mut transform) in &mut cameras {
        *projection = perspective_from_settings(&manifest.camera);
        *transform = orbit.transform();
    }

    info!("✓ Scene '{}' built", manifest.name);
    loading_progress.scene_built = true;
}
