use crate::engine::camera::orbit_camera::MainCamera;
use crate::engine::mesh::globe_mesh::globe_mesh;
use bevy::pbr::{NotShadowCaster, NotShadowReceiver};
use bevy::prelude::*;
use bevy::render::view::NoFrustumCulling;
use constants::render_settings::{FALLBACK_CLEAR_COLOR, SKY_DOME_RADIUS, SKY_DOME_SEGMENTS};

/// Inward-facing sphere carrying the background image. Follows the camera so
/// the image never shows parallax.
#[derive(Component, Debug)]
pub struct SkyDome;

pub fn sky_dome_material(texture: Handle<Image>) -> StandardMaterial {
    StandardMaterial {
        base_color_texture: Some(texture),
        unlit: true,
        cull_mode: None,
        fog_enabled: false,
        ..default()
    }
}

/// Spawns the dome when a background image is available, otherwise clears to a flat colour.
pub fn spawn_background(
    commands: &mut Commands,
    meshes: &mut Assets<Mesh>,
    materials: &mut Assets<StandardMaterial>,
    texture: Option<Handle<Image>>,
) -> Option<Entity> {
    let Some(texture) = texture else {
        info!("No background image, clearing to flat colour");
        commands.insert_resource(ClearColor(FALLBACK_CLEAR_COLOR));
        return None;
    };

    let mesh = meshes.add(globe_mesh(
        SKY_DOME_RADIUS,
        SKY_DOME_SEGMENTS,
        SKY_DOME_SEGMENTS / 2,
    ));
    let material = materials.add(sky_dome_material(texture));

    let dome = commands
        .spawn((
            Name::new("Sky dome"),
            SkyDome,
            Mesh3d(mesh),
            MeshMaterial3d(material),
            Transform::IDENTITY,
            NotShadowCaster,
            NotShadowReceiver,
            NoFrustumCulling,
        ))
        .id();
    Some(dome)
}

pub fn follow_camera(
    cameras: Query<&Transform, (With<MainCamera>, Without<SkyDome>)>,
    mut domes: Query<&mut Transform, With<SkyDome>>,
) {
    let Ok(camera) = cameras.single() else {
        return;
    };
    for mut dome in &mut domes {
        if dome.translation != camera.translation {
            dome.translation = camera.translation;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_image_falls_back_to_clear_colour() {
        let mut world = World::new();
        let mut meshes = Assets::<Mesh>::default();
        let mut materials = Assets::<StandardMaterial>::default();

        let dome = spawn_background(&mut world.commands(), &mut meshes, &mut materials, None);
        world.flush();

        assert!(dome.is_none());
        assert_eq!(world.resource::<ClearColor>().0, FALLBACK_CLEAR_COLOR);
        assert_eq!(meshes.len(), 0);
    }

    #[test]
    fn dome_is_double_sided_and_unlit() {
        let material = sky_dome_material(Handle::default());
        assert!(material.unlit);
        assert!(material.cull_mode.is_none());
    }

    #[test]
    fn dome_tracks_the_camera() {
        let mut app = App::new();
        app.add_systems(Update, follow_camera);
        app.world_mut()
            .spawn((MainCamera, Transform::from_xyz(0.0, 5.0, 80.0)));
        let dome = app.world_mut().spawn((SkyDome, Transform::IDENTITY)).id();
        app.update();

        assert_eq!(
            app.world().get::<Transform>(dome).map(|t| t.translation),
            Some(Vec3::new(0.0, 5.0, 80.0))
        );
    }
}
