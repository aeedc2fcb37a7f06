use crate::engine::render::post_processing::{BloomParameters, PassKind, PassSlot, SsaoParameters};
use crate::engine::render::sao_post_processing::SaoParameters;
use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Reasons a scene manifest is rejected before the scene is built.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ManifestError {
    #[error("invalid colour '{value}': {reason}")]
    InvalidColor { value: String, reason: String },

    #[error("globe radius must be positive, got {0}")]
    NonPositiveRadius(f32),

    #[error("sphere needs at least 3x2 segments, got {width}x{height}")]
    TooFewSegments { width: u32, height: u32 },

    #[error("camera clip planes must satisfy 0 < near < far, got near={near} far={far}")]
    InvalidClipPlanes { near: f32, far: f32 },

    #[error("camera field of view must lie in (0, 180) degrees, got {0}")]
    InvalidFov(f32),

    #[error("{field} range is inverted: [{min}, {max}]")]
    InvertedRange {
        field: &'static str,
        min: f32,
        max: f32,
    },

    #[error("{field} must lie in [0, 1], got {value}")]
    OutOfUnitRange { field: &'static str, value: f32 },

    #[error("post-processing chain must start with the render pass")]
    MissingRenderPass,

    #[error("post-processing pass '{0:?}' declared more than once")]
    DuplicatePass(PassKind),

    #[error("bloom must be declared after every ambient occlusion pass")]
    BloomBeforeOcclusion,

    #[error("waypoint '{name}' has latitude {latitude} outside [-90, 90]")]
    InvalidLatitude { name: String, latitude: f32 },
}

/// `"#rrggbb"` colour as written in the scene file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HexColor(pub String);

impl HexColor {
    pub fn white() -> Self {
        Self("#ffffff".to_string())
    }

    pub fn to_color(&self) -> Result<Color, ManifestError> {
        Srgba::hex(&self.0)
            .map(Color::from)
            .map_err(|err| ManifestError::InvalidColor {
                value: self.0.clone(),
                reason: err.to_string(),
            })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GlobeSettings {
    pub radius: f32,
    pub width_segments: u32,
    pub height_segments: u32,
    pub metalness: f32,
    pub roughness: f32,
    pub displacement_scale: f32,
    pub opacity: f32,
    pub transparent: bool,
    pub cast_shadows: bool,
    pub receive_shadows: bool,
}

impl Default for GlobeSettings {
    fn default() -> Self {
        Self {
            radius: 28.0,
            width_segments: 256,
            height_segments: 256,
            metalness: 0.4,
            roughness: 1.0,
            displacement_scale: 2.0,
            opacity: 1.0,
            transparent: true,
            cast_shadows: true,
            receive_shadows: true,
        }
    }
}

/// Image paths relative to the asset root. A missing entry means the map is not used.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TextureSet {
    pub diffuse: Option<String>,
    pub roughness: Option<String>,
    pub displacement: Option<String>,
    pub alpha: Option<String>,
    pub background: Option<String>,
}

impl Default for TextureSet {
    fn default() -> Self {
        Self {
            diffuse: Some("textures/EarthDiffuse_3.png".to_string()),
            roughness: Some("textures/EarthRoughness.png".to_string()),
            displacement: Some("textures/EarthDisplacement.png".to_string()),
            alpha: Some("textures/EarthTransparency.png".to_string()),
            background: Some("textures/BackGround.png".to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraSettings {
    pub fov_degrees: f32,
    pub near: f32,
    pub far: f32,
    pub distance: f32,
    pub min_distance: f32,
    pub max_distance: f32,
}

impl Default for CameraSettings {
    fn default() -> Self {
        Self {
            fov_degrees: 75.0,
            near: 0.1,
            far: 1000.0,
            distance: 100.0,
            min_distance: 0.0,
            max_distance: 1000.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AmbientLightSettings {
    pub color: HexColor,
    pub intensity: f32,
}

impl Default for AmbientLightSettings {
    fn default() -> Self {
        Self {
            color: HexColor::white(),
            intensity: 0.6,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointLightSettings {
    #[serde(default = "HexColor::white")]
    pub color: HexColor,
    pub intensity: f32,
    pub position: [f32; 3],
    #[serde(default)]
    pub cast_shadows: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DirectionalLightSettings {
    #[serde(default = "HexColor::white")]
    pub color: HexColor,
    pub intensity: f32,
    pub position: [f32; 3],
    #[serde(default)]
    pub cast_shadows: bool,
    #[serde(default)]
    pub enabled: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LightSettings {
    pub ambient: AmbientLightSettings,
    pub points: Vec<PointLightSettings>,
    pub directional: Option<DirectionalLightSettings>,
}

impl Default for LightSettings {
    fn default() -> Self {
        Self {
            ambient: AmbientLightSettings::default(),
            points: vec![
                PointLightSettings {
                    color: HexColor::white(),
                    intensity: 0.2,
                    position: [64.0, 64.0, 0.0],
                    cast_shadows: true,
                },
                PointLightSettings {
                    color: HexColor::white(),
                    intensity: 0.5,
                    position: [-64.0, -64.0, 0.0],
                    cast_shadows: false,
                },
            ],
            directional: Some(DirectionalLightSettings {
                color: HexColor::white(),
                intensity: 0.8,
                position: [125.0, 125.0, 0.0],
                cast_shadows: true,
                enabled: false,
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PostProcessingSettings {
    pub antialias: bool,
    pub passes: Vec<PassSlot>,
    pub sao: SaoParameters,
    pub ssao: SsaoParameters,
    pub bloom: BloomParameters,
}

impl Default for PostProcessingSettings {
    fn default() -> Self {
        Self {
            antialias: true,
            passes: vec![
                PassSlot::new(PassKind::Render, true),
                PassSlot::new(PassKind::Sao, false),
                PassSlot::new(PassKind::Ssao, false),
                PassSlot::new(PassKind::Bloom, false),
            ],
            sao: SaoParameters::default(),
            ssao: SsaoParameters::default(),
            bloom: BloomParameters::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PanelSettings {
    pub distance_range: [f32; 2],
    pub rotation_speed_range: [f32; 2],
    pub ambient_occlusion_folder: bool,
}

impl Default for PanelSettings {
    fn default() -> Self {
        Self {
            distance_range: [0.0, 100.0],
            rotation_speed_range: [0.0, 1.0],
            ambient_occlusion_folder: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Waypoint {
    pub name: String,
    pub latitude: f32,
    pub longitude: f32,
    #[serde(default)]
    pub altitude: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WaypointSettings {
    pub marker_radius: f32,
    pub segments: u32,
    pub markers: Vec<Waypoint>,
}

impl Default for WaypointSettings {
    fn default() -> Self {
        Self {
            marker_radius: 1.5,
            segments: 32,
            markers: Vec::new(),
        }
    }
}

/// Complete scene description as a Bevy asset. Mirrors the JSON structure exactly;
/// every section falls back to the earth scene when omitted.
#[derive(Asset, TypePath, Resource, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneManifest {
    pub name: String,
    /// Radians subtracted from the globe's Y rotation every frame.
    pub rotation_speed: f32,
    pub globe: GlobeSettings,
    pub textures: TextureSet,
    pub camera: CameraSettings,
    pub lights: LightSettings,
    pub post_processing: PostProcessingSettings,
    pub panel: PanelSettings,
    pub waypoints: WaypointSettings,
}

impl Default for SceneManifest {
    fn default() -> Self {
        Self {
            name: "earth".to_string(),
            rotation_speed: 0.001,
            globe: GlobeSettings::default(),
            textures: TextureSet::default(),
            camera: CameraSettings::default(),
            lights: LightSettings::default(),
            post_processing: PostProcessingSettings::default(),
            panel: PanelSettings::default(),
            waypoints: WaypointSettings::default(),
        }
    }
}

impl SceneManifest {
    /// Reject values the scene builder cannot turn into a sensible scene.
    pub fn validate(&self) -> Result<(), ManifestError> {
        let globe = &self.globe;
        if globe.radius <= 0.0 {
            return Err(ManifestError::NonPositiveRadius(globe.radius));
        }
        check_segments(globe.width_segments, globe.height_segments)?;
        check_unit("globe.metalness", globe.metalness)?;
        check_unit("globe.roughness", globe.roughness)?;
        check_unit("globe.opacity", globe.opacity)?;

        let camera = &self.camera;
        if !(camera.near > 0.0 && camera.near < camera.far) {
            return Err(ManifestError::InvalidClipPlanes {
                near: camera.near,
                far: camera.far,
            });
        }
        if !(camera.fov_degrees > 0.0 && camera.fov_degrees < 180.0) {
            return Err(ManifestError::InvalidFov(camera.fov_degrees));
        }
        check_range("camera distance", [camera.min_distance, camera.max_distance])?;
        check_range("panel.distance_range", self.panel.distance_range)?;
        check_range("panel.rotation_speed_range", self.panel.rotation_speed_range)?;

        self.lights.ambient.color.to_color()?;
        for light in &self.lights.points {
            light.color.to_color()?;
        }
        if let Some(directional) = &self.lights.directional {
            directional.color.to_color()?;
        }

        check_pass_order(&self.post_processing.passes)?;

        if !self.waypoints.markers.is_empty() {
            if self.waypoints.marker_radius <= 0.0 {
                return Err(ManifestError::NonPositiveRadius(self.waypoints.marker_radius));
            }
            check_segments(self.waypoints.segments, self.waypoints.segments)?;
        }
        for waypoint in &self.waypoints.markers {
            if !(-90.0..=90.0).contains(&waypoint.latitude) {
                return Err(ManifestError::InvalidLatitude {
                    name: waypoint.name.clone(),
                    latitude: waypoint.latitude,
                });
            }
        }

        Ok(())
    }

    /// Every texture path the scene references, in declaration order.
    /// Markers reuse the globe's diffuse map, so paths may repeat.
    pub fn declared_texture_paths(&self) -> Vec<&str> {
        let textures = &self.textures;
        let mut paths: Vec<&str> = [
            &textures.diffuse,
            &textures.roughness,
            &textures.displacement,
            &textures.alpha,
            &textures.background,
        ]
        .into_iter()
        .filter_map(|path| path.as_deref())
        .collect();

        if !self.waypoints.markers.is_empty() {
            if let Some(diffuse) = textures.diffuse.as_deref() {
                paths.push(diffuse);
            }
        }
        paths
    }
}

fn check_segments(width: u32, height: u32) -> Result<(), ManifestError> {
    if width < 3 || height < 2 {
        return Err(ManifestError::TooFewSegments { width, height });
    }
    Ok(())
}

fn check_unit(field: &'static str, value: f32) -> Result<(), ManifestError> {
    if !(0.0..=1.0).contains(&value) {
        return Err(ManifestError::OutOfUnitRange { field, value });
    }
    Ok(())
}

fn check_range(field: &'static str, [min, max]: [f32; 2]) -> Result<(), ManifestError> {
    if min > max {
        return Err(ManifestError::InvertedRange { field, min, max });
    }
    Ok(())
}

/// Bloom is composited after occlusion in the render graph, so declaration order must agree.
fn check_pass_order(passes: &[PassSlot]) -> Result<(), ManifestError> {
    match passes.first() {
        Some(slot) if slot.kind == PassKind::Render => {}
        _ => return Err(ManifestError::MissingRenderPass),
    }

    for (index, slot) in passes.iter().enumerate() {
        if passes[..index].iter().any(|earlier| earlier.kind == slot.kind) {
            return Err(ManifestError::DuplicatePass(slot.kind));
        }
    }

    let bloom_index = passes.iter().position(|slot| slot.kind == PassKind::Bloom);
    let last_occlusion = passes
        .iter()
        .rposition(|slot| slot.kind.is_ambient_occlusion());
    if let (Some(bloom), Some(occlusion)) = (bloom_index, last_occlusion) {
        if bloom < occlusion {
            return Err(ManifestError::BloomBeforeOcclusion);
        }
    }
    Ok(())
}
