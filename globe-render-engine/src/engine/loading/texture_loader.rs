use crate::engine::assets::globe_assets::{GlobeTextures, TextureCatalog};
use crate::engine::loading::progress::{LoadingProgress, TextureState};
use bevy::asset::LoadState;
use bevy::prelude::*;

pub fn texture_state(load_state: Option<LoadState>) -> TextureState {
    match load_state {
        Some(LoadState::Loaded) => TextureState::Loaded,
        Some(LoadState::Failed(_)) => TextureState::Failed,
        _ => TextureState::Pending,
    }
}

// Track every requested texture until each one has either loaded or failed
pub fn check_texture_loading(
    mut loading_progress: ResMut<LoadingProgress>,
    mut textures: ResMut<GlobeTextures>,
    catalog: Res<TextureCatalog>,
    asset_server: Res<AssetServer>,
) {
    if loading_progress.textures_settled || !loading_progress.manifest_loaded {
        return;
    }

    let mut states = Vec::with_capacity(catalog.len());
    for (path, handle) in catalog.entries() {
        let load_state = asset_server.get_load_state(handle);
        let state = texture_state(load_state.clone());

        let was_failed = loading_progress
            .texture_states
            .iter()
            .any(|(known, previous)| known == path && *previous == TextureState::Failed);
        if state == TextureState::Failed && !was_failed {
            if let Some(LoadState::Failed(err)) = load_state {
                warn!("Texture {} failed to load, skipping it: {}", path, err);
            }
            textures.drop_failed(handle);
        }

        states.push((path.to_string(), state));
    }

    let settled = states.iter().all(|(_, state)| state.is_settled());
    loading_progress.texture_states = states;

    if settled {
        let failed = loading_progress.failed_textures().count();
        info!(
            "✓ Textures settled: {} loaded, {} skipped",
            catalog.len() - failed,
            failed
        );
        loading_progress.textures_settled = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bevy::asset::AssetMetaCheck;
    use std::time::Duration;

    const MISSING: &str = "textures/does-not-exist.png";

    #[test]
    fn failed_texture_is_dropped_and_loading_settles() {
        let mut app = App::new();
        app.add_plugins((
            MinimalPlugins,
            AssetPlugin {
                meta_check: AssetMetaCheck::Never,
                ..default()
            },
        ))
        .init_asset::<Image>()
        .insert_resource(LoadingProgress {
            manifest_loaded: true,
            ..default()
        })
        .add_systems(Update, check_texture_loading);

        let missing: Handle<Image> = app.world().resource::<AssetServer>().load(MISSING);
        let mut catalog = TextureCatalog::default();
        catalog.request(MISSING, |_| missing.clone());
        let kept = app
            .world_mut()
            .resource_mut::<Assets<Image>>()
            .add(Image::default());
        app.insert_resource(catalog).insert_resource(GlobeTextures {
            diffuse: Some(missing.clone()),
            alpha: Some(missing.clone()),
            roughness: Some(kept.clone()),
            ..default()
        });

        for _ in 0..500 {
            app.update();
            if app.world().resource::<LoadingProgress>().textures_settled {
                break;
            }
            std::thread::sleep(Duration::from_millis(2));
        }

        let progress = app.world().resource::<LoadingProgress>();
        assert!(progress.textures_settled);
        assert_eq!(progress.failed_textures().collect::<Vec<_>>(), vec![MISSING]);

        let textures = app.world().resource::<GlobeTextures>();
        assert!(textures.diffuse.is_none());
        assert!(textures.alpha.is_none());
        assert_eq!(textures.roughness, Some(kept));
    }

    #[test]
    fn only_final_states_settle() {
        assert_eq!(texture_state(Some(LoadState::Loaded)), TextureState::Loaded);
        assert_eq!(texture_state(Some(LoadState::Loading)), TextureState::Pending);
        assert_eq!(texture_state(Some(LoadState::NotLoaded)), TextureState::Pending);
        assert_eq!(texture_state(None), TextureState::Pending);
        assert!(!TextureState::Pending.is_settled());
        assert!(TextureState::Failed.is_settled());
    }
}
