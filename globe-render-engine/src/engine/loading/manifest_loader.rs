use bevy::asset::LoadState;
use bevy::pbr::{DirectionalLightShadowMap, PointLightShadowMap};
use bevy::prelude::*;
use constants::lighting::SHADOW_MAP_SIZE;
use constants::path::{DEFAULT_SCENE, KNOWN_SCENES, scene_manifest_path};

use crate::engine::assets::globe_assets::{GlobeTextures, TextureCatalog};
use crate::engine::assets::scene_manifest::SceneManifest;
use crate::engine::camera::orbit_camera::OrbitCamera;
use crate::engine::loading::progress::{LoadingProgress, TextureState};
use crate::engine::render::post_processing::{Antialiasing, PostProcessChain};
use crate::engine::systems::rotation::SceneParameters;

#[derive(Resource, Default)]
pub struct ManifestLoader {
    pub path: String,
    handle: Option<Handle<SceneManifest>>,
}

/// Value of the `scene` key in a URL query string such as `?scene=waypoints&x=1`.
pub fn scene_query_value(query: &str) -> Option<&str> {
    query
        .trim_start_matches('?')
        .split('&')
        .filter_map(|pair| pair.split_once('='))
        .find(|(key, _)| *key == "scene")
        .map(|(_, value)| value)
}

/// Map a requested scene name onto a shipped manifest, falling back to the default.
pub fn resolve_scene(requested: Option<&str>) -> &'static str {
    match requested {
        None => DEFAULT_SCENE,
        Some(name) => match KNOWN_SCENES.iter().find(|known| **known == name) {
            Some(known) => *known,
            None => {
                warn!(
                    "Unknown scene '{}', expected one of {:?}; using '{}'",
                    name, KNOWN_SCENES, DEFAULT_SCENE
                );
                DEFAULT_SCENE
            }
        },
    }
}

#[cfg(target_arch = "wasm32")]
fn requested_scene() -> Option<String> {
    let search = web_sys::window()?.location().search().ok()?;
    scene_query_value(&search).map(str::to_string)
}

#[cfg(not(target_arch = "wasm32"))]
fn requested_scene() -> Option<String> {
    None
}

pub fn select_manifest_path() -> String {
    let requested = requested_scene();
    scene_manifest_path(resolve_scene(requested.as_deref()))
}

// Start the loading process
pub fn start_loading(mut manifest_loader: ResMut<ManifestLoader>, asset_server: Res<AssetServer>) {
    let path = select_manifest_path();
    info!("Loading scene manifest {}", path);
    manifest_loader.handle = Some(asset_server.load(path.clone()));
    manifest_loader.path = path;
}

/// Wait for the manifest, fall back to the built-in earth scene if it is missing
/// or invalid, then publish the live resources and request every texture.
pub fn load_manifest_system(
    mut commands: Commands,
    mut loading_progress: ResMut<LoadingProgress>,
    mut catalog: ResMut<TextureCatalog>,
    manifest_loader: Res<ManifestLoader>,
    manifests: Res<Assets<SceneManifest>>,
    asset_server: Res<AssetServer>,
) {
    if loading_progress.manifest_loaded {
        return;
    }
    let Some(handle) = manifest_loader.handle.as_ref() else {
        return;
    };

    let manifest = if let Some(manifest) = manifests.get(handle) {
        match manifest.validate() {
            Ok(()) => {
                info!("✓ Scene manifest '{}' loaded", manifest.name);
                manifest.clone()
            }
            Err(err) => {
                error!(
                    "Scene manifest {} is invalid ({}); using built-in defaults",
                    manifest_loader.path, err
                );
                SceneManifest::default()
            }
        }
    } else if let Some(LoadState::Failed(err)) = asset_server.get_load_state(handle) {
        error!(
            "Failed to load scene manifest {} ({}); using built-in defaults",
            manifest_loader.path, err
        );
        SceneManifest::default()
    } else {
        return;
    };

    insert_scene_resources(&mut commands, &manifest);

    let textures = GlobeTextures::request_all(&manifest, &mut catalog, |path| {
        asset_server.load(path.to_string())
    });
    loading_progress.texture_states = catalog
        .entries()
        .map(|(path, _)| (path.to_string(), TextureState::Pending))
        .collect();
    info!("Requested {} textures", catalog.len());

    commands.insert_resource(textures);
    commands.insert_resource(manifest);
    loading_progress.manifest_loaded = true;
}

/// Live resources seeded from the manifest. The panel edits these afterwards.
pub fn insert_scene_resources(commands: &mut Commands, manifest: &SceneManifest) {
    let post = &manifest.post_processing;
    commands.insert_resource(SceneParameters {
        rotation_speed: manifest.rotation_speed,
    });
    commands.insert_resource(OrbitCamera::from_settings(&manifest.camera));
    commands.insert_resource(PostProcessChain::from_manifest(post));
    commands.insert_resource(post.sao);
    commands.insert_resource(post.ssao);
    commands.insert_resource(post.bloom);
    commands.insert_resource(Antialiasing(post.antialias));
    commands.insert_resource(PointLightShadowMap {
        size: SHADOW_MAP_SIZE,
    });
    commands.insert_resource(DirectionalLightShadowMap {
        size: SHADOW_MAP_SIZE,
    });
}
