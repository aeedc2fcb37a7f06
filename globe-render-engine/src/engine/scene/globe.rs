use crate::engine::assets::globe_assets::GlobeTextures;
use crate::engine::assets::scene_manifest::{GlobeSettings, SceneManifest};
use crate::engine::mesh::displacement::displace_along_normals;
use crate::engine::mesh::globe_mesh::globe_mesh;
use crate::engine::render::post_processing::PostProcessChain;
use bevy::pbr::{NotShadowCaster, NotShadowReceiver};
use bevy::prelude::*;

#[derive(Component, Debug)]
pub struct Globe;

/// Accumulated rotation about the globe's Y axis, in radians within [0, 2π).
#[derive(Component, Debug, Default, Clone, Copy, PartialEq)]
pub struct GlobeSpin {
    pub angle: f32,
}

/// Sphere mesh with the displacement map baked into its vertices when available.
pub fn build_globe_mesh(
    settings: &GlobeSettings,
    textures: &GlobeTextures,
    images: &Assets<Image>,
) -> Mesh {
    let mut mesh = globe_mesh(
        settings.radius,
        settings.width_segments,
        settings.height_segments,
    );

    let displacement_map = textures
        .displacement
        .as_ref()
        .and_then(|handle| images.get(handle));
    if let Some(map) = displacement_map {
        match displace_along_normals(&mut mesh, map, settings.displacement_scale) {
            Ok(count) => debug!("Displaced {} globe vertices", count),
            Err(err) => warn!("Displacement map not applied: {}", err),
        }
    }
    mesh
}

/// Alpha below this is cut away while the globe has to write the depth prepass.
pub const OCCLUSION_ALPHA_CUTOFF: f32 = 0.5;

/// Blended materials are left out of the prepass, so while an ambient occlusion
/// pass reads depth a transparent globe switches to an alpha cutout.
pub fn globe_alpha_mode(settings: &GlobeSettings, occlusion_active: bool) -> AlphaMode {
    match (settings.transparent, occlusion_active) {
        (false, _) => AlphaMode::Opaque,
        (true, false) => AlphaMode::Blend,
        (true, true) => AlphaMode::Mask(OCCLUSION_ALPHA_CUTOFF),
    }
}

pub fn globe_material(
    settings: &GlobeSettings,
    textures: &GlobeTextures,
    occlusion_active: bool,
) -> StandardMaterial {
    let base_color_texture = textures
        .diffuse_with_alpha
        .clone()
        .or_else(|| textures.diffuse.clone());

    let alpha_mode = globe_alpha_mode(settings, occlusion_active);

    StandardMaterial {
        base_color: Color::WHITE.with_alpha(settings.opacity),
        base_color_texture,
        metallic: settings.metalness,
        perceptual_roughness: settings.roughness,
        metallic_roughness_texture: textures.metallic_roughness.clone(),
        alpha_mode,
        ..default()
    }
}

/// Re-pick the globe's alpha mode whenever the post-processing chain changes.
pub fn sync_globe_alpha_mode(
    chain: Res<PostProcessChain>,
    manifest: Res<SceneManifest>,
    globes: Query<&MeshMaterial3d<StandardMaterial>, With<Globe>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    if !chain.is_changed() {
        return;
    }
    let alpha_mode = globe_alpha_mode(&manifest.globe, chain.occlusion_enabled());
    for material in &globes {
        let Some(material) = materials.get_mut(&material.0) else {
            continue;
        };
        if material.alpha_mode != alpha_mode {
            debug!("Globe alpha mode -> {:?}", alpha_mode);
            material.alpha_mode = alpha_mode;
        }
    }
}

pub fn spawn_globe(
    commands: &mut Commands,
    mesh: Handle<Mesh>,
    material: Handle<StandardMaterial>,
    settings: &GlobeSettings,
) -> Entity {
    let mut globe = commands.spawn((
        Name::new("Globe"),
        Globe,
        GlobeSpin::default(),
        Mesh3d(mesh),
        MeshMaterial3d(material),
        Transform::IDENTITY,
    ));
    if !settings.cast_shadows {
        globe.insert(NotShadowCaster);
    }
    if !settings.receive_shadows {
        globe.insert(NotShadowReceiver);
    }
    globe.id()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn material_follows_globe_settings() {
        let settings = GlobeSettings::default();
        let material = globe_material(&settings, &GlobeTextures::default(), false);

        assert_eq!(material.metallic, 0.4);
        assert_eq!(material.perceptual_roughness, 1.0);
        assert!(matches!(material.alpha_mode, AlphaMode::Blend));
        assert!(material.base_color_texture.is_none());
    }

    #[test]
    fn baked_diffuse_is_preferred() {
        let mut images = Assets::<Image>::default();
        let textures = GlobeTextures {
            diffuse: Some(images.add(Image::default())),
            diffuse_with_alpha: Some(images.add(Image::default())),
            ..default()
        };
        let material = globe_material(&GlobeSettings::default(), &textures, false);
        assert_eq!(material.base_color_texture, textures.diffuse_with_alpha);
    }

    #[test]
    fn shipped_earth_globe_writes_prepass_under_occlusion() {
        let earth: SceneManifest =
            serde_json::from_str(include_str!("../../../assets/scenes/earth.scene.json"))
                .unwrap_or_else(|err| panic!("earth scene does not parse: {err}"));
        assert!(earth.globe.transparent);

        let material = globe_material(&earth.globe, &GlobeTextures::default(), true);
        assert_eq!(material.alpha_mode, AlphaMode::Mask(OCCLUSION_ALPHA_CUTOFF));

        let opaque = GlobeSettings {
            transparent: false,
            ..default()
        };
        assert_eq!(globe_alpha_mode(&opaque, true), AlphaMode::Opaque);
        assert_eq!(globe_alpha_mode(&opaque, false), AlphaMode::Opaque);
    }

    #[test]
    fn occlusion_toggle_switches_globe_alpha_mode() {
        use crate::engine::render::post_processing::{PassKind, PassSlot};

        let mut app = App::new();
        app.insert_resource(PostProcessChain::from_slots(&[
            PassSlot::new(PassKind::Render, true),
            PassSlot::new(PassKind::Sao, false),
            PassSlot::new(PassKind::Ssao, false),
        ]))
        .init_resource::<SceneManifest>()
        .init_resource::<Assets<StandardMaterial>>()
        .add_systems(Update, sync_globe_alpha_mode);

        let settings = SceneManifest::default().globe;
        let handle = app
            .world_mut()
            .resource_mut::<Assets<StandardMaterial>>()
            .add(globe_material(&settings, &GlobeTextures::default(), false));
        app.world_mut()
            .spawn((Globe, MeshMaterial3d(handle.clone())));

        let alpha_mode = |app: &App| {
            app.world()
                .resource::<Assets<StandardMaterial>>()
                .get(&handle)
                .map(|material| material.alpha_mode)
        };

        app.update();
        assert_eq!(alpha_mode(&app), Some(AlphaMode::Blend));

        app.world_mut()
            .resource_mut::<PostProcessChain>()
            .set_enabled(PassKind::Ssao, true);
        app.update();
        assert_eq!(alpha_mode(&app), Some(AlphaMode::Mask(OCCLUSION_ALPHA_CUTOFF)));

        app.world_mut()
            .resource_mut::<PostProcessChain>()
            .set_enabled(PassKind::Ssao, false);
        app.update();
        assert_eq!(alpha_mode(&app), Some(AlphaMode::Blend));
    }

    #[test]
    fn shadow_flags_become_marker_components() {
        let mut world = World::new();
        let settings = GlobeSettings {
            cast_shadows: false,
            ..default()
        };
        let globe = spawn_globe(
            &mut world.commands(),
            Handle::default(),
            Handle::default(),
            &settings,
        );
        world.flush();

        let entity = world.entity(globe);
        assert!(entity.contains::<NotShadowCaster>());
        assert!(!entity.contains::<NotShadowReceiver>());
        assert_eq!(entity.get::<GlobeSpin>(), Some(&GlobeSpin::default()));
    }

    #[test]
    fn mesh_without_displacement_keeps_radius() {
        let settings = GlobeSettings {
            width_segments: 8,
            height_segments: 4,
            ..default()
        };
        let mesh = build_globe_mesh(&settings, &GlobeTextures::default(), &Assets::default());
        assert_eq!(mesh.count_vertices(), 9 * 5);
    }
}
