use crate::engine::assets::scene_manifest::{Waypoint, WaypointSettings};
use crate::engine::mesh::globe_mesh::{geo_to_local, globe_mesh};
use bevy::prelude::*;

#[derive(Component, Debug, Clone)]
pub struct WaypointMarker {
    pub name: String,
}

/// Unlit sphere textured with the globe's diffuse map.
pub fn marker_material(texture: Option<Handle<Image>>) -> StandardMaterial {
    StandardMaterial {
        base_color_texture: texture,
        unlit: true,
        ..default()
    }
}

/// Position of a marker in the globe's local frame: on the surface, lifted by its altitude.
pub fn marker_position(waypoint: &Waypoint, globe_radius: f32) -> Vec3 {
    geo_to_local(
        waypoint.latitude,
        waypoint.longitude,
        globe_radius + waypoint.altitude,
    )
}

/// Markers are children of the globe so they turn with it.
pub fn spawn_waypoints(
    commands: &mut Commands,
    globe: Entity,
    globe_radius: f32,
    settings: &WaypointSettings,
    meshes: &mut Assets<Mesh>,
    materials: &mut Assets<StandardMaterial>,
    texture: Option<Handle<Image>>,
) -> Vec<Entity> {
    if settings.markers.is_empty() {
        return Vec::new();
    }

    let mesh = meshes.add(globe_mesh(
        settings.marker_radius,
        settings.segments,
        settings.segments,
    ));
    let material = materials.add(marker_material(texture));

    let mut markers = Vec::with_capacity(settings.markers.len());
    commands.entity(globe).with_children(|parent| {
        for waypoint in &settings.markers {
            let marker = parent.spawn((
                Name::new(format!("Waypoint {}", waypoint.name)),
                WaypointMarker {
                    name: waypoint.name.clone(),
                },
                Mesh3d(mesh.clone()),
                MeshMaterial3d(material.clone()),
                Transform::from_translation(marker_position(waypoint, globe_radius)),
            ));
            markers.push(marker.id());
        }
    });

    info!("Spawned {} waypoint markers", markers.len());
    markers
}
