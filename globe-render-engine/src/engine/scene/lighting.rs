use crate::engine::assets::scene_manifest::{
    AmbientLightSettings, DirectionalLightSettings, HexColor, LightSettings, PointLightSettings,
};
use bevy::prelude::*;
use constants::lighting::{
    AMBIENT_BRIGHTNESS_SCALE, DIRECTIONAL_LUX_SCALE, POINT_LIGHT_LUMENS_SCALE, POINT_LIGHT_RANGE,
};

/// Light spawned from the scene file. `label` is what the panel shows.
#[derive(Component, Debug, Clone)]
pub struct SceneLight {
    pub label: String,
}

fn color_or_white(color: &HexColor) -> Color {
    color.to_color().unwrap_or_else(|err| {
        warn!("{}; using white", err);
        Color::WHITE
    })
}

pub fn ambient_light(settings: &AmbientLightSettings) -> AmbientLight {
    AmbientLight {
        color: color_or_white(&settings.color),
        brightness: settings.intensity * AMBIENT_BRIGHTNESS_SCALE,
        ..default()
    }
}

pub fn point_light(settings: &PointLightSettings) -> (PointLight, Transform) {
    (
        PointLight {
            color: color_or_white(&settings.color),
            intensity: settings.intensity * POINT_LIGHT_LUMENS_SCALE,
            range: POINT_LIGHT_RANGE,
            shadows_enabled: settings.cast_shadows,
            ..default()
        },
        Transform::from_translation(Vec3::from(settings.position)),
    )
}

/// Shines from `position` towards the origin.
pub fn directional_light(settings: &DirectionalLightSettings) -> (DirectionalLight, Transform) {
    (
        DirectionalLight {
            color: color_or_white(&settings.color),
            illuminance: settings.intensity * DIRECTIONAL_LUX_SCALE,
            shadows_enabled: settings.cast_shadows,
            ..default()
        },
        Transform::from_translation(Vec3::from(settings.position)).looking_at(Vec3::ZERO, Vec3::Y),
    )
}

/// Ambient light becomes a resource; point and directional lights become entities.
pub fn spawn_lights(commands: &mut Commands, lights: &LightSettings) -> Vec<Entity> {
    commands.insert_resource(ambient_light(&lights.ambient));

    let mut spawned: Vec<Entity> = lights
        .points
        .iter()
        .enumerate()
        .map(|(index, settings)| {
            let label = format!("Point light {}", index + 1);
            commands
                .spawn((
                    Name::new(label.clone()),
                    SceneLight { label },
                    point_light(settings),
                ))
                .id()
        })
        .collect();

    if let Some(settings) = lights.directional.as_ref().filter(|d| d.enabled) {
        let label = "Directional light".to_string();
        spawned.push(
            commands
                .spawn((
                    Name::new(label.clone()),
                    SceneLight { label },
                    directional_light(settings),
                ))
                .id(),
        );
    }

    info!("Spawned {} scene lights", spawned.len());
    spawned
}
