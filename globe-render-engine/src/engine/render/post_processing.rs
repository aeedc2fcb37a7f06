use crate::engine::assets::scene_manifest::PostProcessingSettings;
use crate::engine::camera::orbit_camera::MainCamera;
use crate::engine::render::sao_post_processing::{SaoParameters, SaoSettings};
use bevy::core_pipeline::bloom::{Bloom, BloomPrefilter};
use bevy::core_pipeline::prepass::{DepthPrepass, NormalPrepass};
use bevy::pbr::{ScreenSpaceAmbientOcclusion, ScreenSpaceAmbientOcclusionQualityLevel};
use bevy::prelude::*;
use bevy::render::view::Msaa;
use serde::{Deserialize, Serialize};

/// Full-screen stages of the frame, in the order the scene file declares them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PassKind {
    /// Base scene render. Always first, never disabled.
    Render,
    /// Scalable ambient occlusion from the depth prepass.
    Sao,
    /// Bevy's built-in screen-space ambient occlusion.
    Ssao,
    Bloom,
}

impl PassKind {
    pub fn label(self) -> &'static str {
        match self {
            PassKind::Render => "Render",
            PassKind::Sao => "Scalable AO",
            PassKind::Ssao => "Screen-space AO",
            PassKind::Bloom => "Bloom",
        }
    }

    pub fn is_ambient_occlusion(self) -> bool {
        matches!(self, PassKind::Sao | PassKind::Ssao)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PassSlot {
    pub kind: PassKind,
    #[serde(default = "enabled_by_default")]
    pub enabled: bool,
}

fn enabled_by_default() -> bool {
    true
}

impl PassSlot {
    pub fn new(kind: PassKind, enabled: bool) -> Self {
        Self { kind, enabled }
    }
}

/// Ordered post-processing chain. Toggling a pass flips its flag in place,
/// so the remaining passes keep their relative order.
#[derive(Resource, Debug, Clone, PartialEq)]
pub struct PostProcessChain {
    slots: Vec<PassSlot>,
}

impl Default for PostProcessChain {
    fn default() -> Self {
        Self::from_slots(&[PassSlot::new(PassKind::Render, true)])
    }
}

impl PostProcessChain {
    pub fn from_slots(slots: &[PassSlot]) -> Self {
        Self {
            slots: slots.to_vec(),
        }
    }

    /// Chain as declared in the scene file, which validation already checked for order.
    pub fn from_manifest(settings: &PostProcessingSettings) -> Self {
        Self::from_slots(&settings.passes)
    }

    pub fn slots(&self) -> &[PassSlot] {
        &self.slots
    }

    /// Returns false when the pass is not part of the chain or is the base render.
    pub fn set_enabled(&mut self, kind: PassKind, enabled: bool) -> bool {
        if kind == PassKind::Render {
            return false;
        }
        match self.slots.iter_mut().find(|slot| slot.kind == kind) {
            Some(slot) => {
                slot.enabled = enabled;
                true
            }
            None => false,
        }
    }

    pub fn is_enabled(&self, kind: PassKind) -> bool {
        self.slots
            .iter()
            .any(|slot| slot.kind == kind && slot.enabled)
    }

    pub fn enabled_passes(&self) -> Vec<PassKind> {
        self.slots
            .iter()
            .filter(|slot| slot.enabled)
            .map(|slot| slot.kind)
            .collect()
    }

    pub fn occlusion_enabled(&self) -> bool {
        self.is_enabled(PassKind::Sao) || self.is_enabled(PassKind::Ssao)
    }

    /// Depth-reading passes need a single-sampled depth prepass.
    pub fn needs_single_sample(&self) -> bool {
        self.occlusion_enabled()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SsaoQuality {
    Low,
    Medium,
    High,
    Ultra,
}

impl SsaoQuality {
    pub const ALL: [SsaoQuality; 4] = [
        SsaoQuality::Low,
        SsaoQuality::Medium,
        SsaoQuality::High,
        SsaoQuality::Ultra,
    ];

    pub fn label(self) -> &'static str {
        match self {
            SsaoQuality::Low => "Low",
            SsaoQuality::Medium => "Medium",
            SsaoQuality::High => "High",
            SsaoQuality::Ultra => "Ultra",
        }
    }

    fn level(self) -> ScreenSpaceAmbientOcclusionQualityLevel {
        match self {
            SsaoQuality::Low => ScreenSpaceAmbientOcclusionQualityLevel::Low,
            SsaoQuality::Medium => ScreenSpaceAmbientOcclusionQualityLevel::Medium,
            SsaoQuality::High => ScreenSpaceAmbientOcclusionQualityLevel::High,
            SsaoQuality::Ultra => ScreenSpaceAmbientOcclusionQualityLevel::Ultra,
        }
    }
}

#[derive(Resource, Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SsaoParameters {
    pub quality: SsaoQuality,
    pub object_thickness: f32,
}

impl Default for SsaoParameters {
    fn default() -> Self {
        Self {
            quality: SsaoQuality::High,
            object_thickness: 0.25,
        }
    }
}

impl SsaoParameters {
    pub fn to_component(self) -> ScreenSpaceAmbientOcclusion {
        ScreenSpaceAmbientOcclusion {
            quality_level: self.quality.level(),
            constant_object_thickness: self.object_thickness,
        }
    }
}

#[derive(Resource, Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BloomParameters {
    pub intensity: f32,
    pub threshold: f32,
}

impl Default for BloomParameters {
    fn default() -> Self {
        Self {
            intensity: 0.1,
            threshold: 0.0,
        }
    }
}

impl BloomParameters {
    pub fn to_component(self) -> Bloom {
        Bloom {
            intensity: self.intensity,
            prefilter: BloomPrefilter {
                threshold: self.threshold,
                threshold_softness: 0.0,
            },
            ..Bloom::NATURAL
        }
    }
}

/// Whether MSAA was requested by the scene file. Depth-reading passes override it.
#[derive(Resource, Debug, Clone, Copy)]
pub struct Antialiasing(pub bool);

impl Default for Antialiasing {
    fn default() -> Self {
        Self(true)
    }
}

/// Mirror the chain and live parameters onto the camera's post-processing components.
pub fn sync_post_processing(
    mut commands: Commands,
    chain: Res<PostProcessChain>,
    sao: Res<SaoParameters>,
    ssao: Res<SsaoParameters>,
    bloom: Res<BloomParameters>,
    antialiasing: Res<Antialiasing>,
    cameras: Query<(Entity, Ref<Projection>), With<MainCamera>>,
) {
    let resources_changed = chain.is_changed()
        || sao.is_changed()
        || ssao.is_changed()
        || bloom.is_changed()
        || antialiasing.is_changed();

    for (entity, projection) in &cameras {
        if !resources_changed && !projection.is_changed() {
            continue;
        }

        let mut camera = commands.entity(entity);

        let msaa = if antialiasing.0 && !chain.needs_single_sample() {
            Msaa::Sample4
        } else {
            Msaa::Off
        };
        camera.insert(msaa);

        if chain.is_enabled(PassKind::Sao) {
            camera.insert((SaoSettings::new(&sao, &projection), DepthPrepass));
        } else {
            camera.remove::<SaoSettings>();
        }

        if chain.is_enabled(PassKind::Ssao) {
            camera.insert(ssao.to_component());
        } else {
            camera.remove::<ScreenSpaceAmbientOcclusion>();
        }

        if chain.is_enabled(PassKind::Bloom) {
            camera.insert(bloom.to_component());
        } else {
            camera.remove::<Bloom>();
        }

        if !chain.occlusion_enabled() {
            camera.remove::<(DepthPrepass, NormalPrepass)>();
        }

        debug!("Post-processing chain: {:?}", chain.enabled_passes());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_chain() -> PostProcessChain {
        PostProcessChain::from_slots(&[
            PassSlot::new(PassKind::Render, true),
            PassSlot::new(PassKind::Sao, true),
            PassSlot::new(PassKind::Ssao, true),
            PassSlot::new(PassKind::Bloom, true),
        ])
    }

    #[test]
    fn disabling_a_pass_keeps_remaining_order() {
        let mut chain = full_chain();
        assert!(chain.set_enabled(PassKind::Sao, false));
        assert_eq!(
            chain.enabled_passes(),
            vec![PassKind::Render, PassKind::Ssao, PassKind::Bloom]
        );

        assert!(chain.set_enabled(PassKind::Ssao, false));
        assert_eq!(chain.enabled_passes(), vec![PassKind::Render, PassKind::Bloom]);

        assert!(chain.set_enabled(PassKind::Sao, true));
        assert_eq!(
            chain.enabled_passes(),
            vec![PassKind::Render, PassKind::Sao, PassKind::Bloom]
        );
    }

    #[test]
    fn render_pass_cannot_be_disabled() {
        let mut chain = full_chain();
        assert!(!chain.set_enabled(PassKind::Render, false));
        assert_eq!(chain.enabled_passes()[0], PassKind::Render);
    }

    #[test]
    fn unknown_pass_is_not_added() {
        let mut chain = PostProcessChain::default();
        assert!(!chain.set_enabled(PassKind::Bloom, true));
        assert_eq!(chain.enabled_passes(), vec![PassKind::Render]);
    }

    #[test]
    fn occlusion_requires_single_sample() {
        let mut chain = full_chain();
        assert!(chain.needs_single_sample());
        chain.set_enabled(PassKind::Sao, false);
        chain.set_enabled(PassKind::Ssao, false);
        assert!(!chain.needs_single_sample());
    }

    #[test]
    fn bloom_parameters_map_onto_component() {
        let bloom = BloomParameters {
            intensity: 0.3,
            threshold: 0.8,
        }
        .to_component();
        assert_eq!(bloom.intensity, 0.3);
        assert_eq!(bloom.prefilter.threshold, 0.8);
    }

    #[test]
    fn sync_attaches_only_enabled_passes() {
        let mut app = App::new();
        app.insert_resource(PostProcessChain::from_slots(&[
            PassSlot::new(PassKind::Render, true),
            PassSlot::new(PassKind::Sao, false),
            PassSlot::new(PassKind::Bloom, true),
        ]))
        .init_resource::<SaoParameters>()
        .init_resource::<SsaoParameters>()
        .init_resource::<BloomParameters>()
        .init_resource::<Antialiasing>()
        .add_systems(Update, sync_post_processing);

        let camera = app
            .world_mut()
            .spawn((MainCamera, Projection::default()))
            .id();
        app.update();

        let entity = app.world().entity(camera);
        assert!(entity.contains::<Bloom>());
        assert!(!entity.contains::<SaoSettings>());
        assert_eq!(entity.get::<Msaa>(), Some(&Msaa::Sample4));

        app.world_mut()
            .resource_mut::<PostProcessChain>()
            .set_enabled(PassKind::Sao, true);
        app.update();

        let entity = app.world().entity(camera);
        assert!(entity.contains::<SaoSettings>());
        assert!(entity.contains::<Bloom>());
        assert_eq!(entity.get::<Msaa>(), Some(&Msaa::Off));
    }

    #[test]
    fn prepass_is_dropped_with_the_last_occlusion_pass() {
        let mut app = App::new();
        app.insert_resource(full_chain())
            .init_resource::<SaoParameters>()
            .init_resource::<SsaoParameters>()
            .init_resource::<BloomParameters>()
            .init_resource::<Antialiasing>()
            .add_systems(Update, sync_post_processing);

        let camera = app
            .world_mut()
            .spawn((MainCamera, Projection::default()))
            .id();
        app.update();
        assert!(app.world().entity(camera).contains::<DepthPrepass>());

        app.world_mut()
            .resource_mut::<PostProcessChain>()
            .set_enabled(PassKind::Sao, false);
        app.update();
        // SSAO still reads depth
        assert!(app.world().entity(camera).contains::<DepthPrepass>());

        app.world_mut()
            .resource_mut::<PostProcessChain>()
            .set_enabled(PassKind::Ssao, false);
        app.update();

        let entity = app.world().entity(camera);
        assert!(!entity.contains::<DepthPrepass>());
        assert!(!entity.contains::<NormalPrepass>());
        assert!(!entity.contains::<ScreenSpaceAmbientOcclusion>());
        assert_eq!(entity.get::<Msaa>(), Some(&Msaa::Sample4));
    }
}
