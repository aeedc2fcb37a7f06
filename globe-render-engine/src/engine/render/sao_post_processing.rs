use bevy::{
    core_pipeline::{
        core_3d::graph::{Core3d, Node3d},
        fullscreen_vertex_shader::fullscreen_shader_vertex_state,
        prepass::ViewPrepassTextures,
    },
    ecs::query::QueryItem,
    prelude::*,
    render::{
        Render, RenderApp, RenderSet,
        camera::ExtractedCamera,
        extract_component::{
            ComponentUniforms, DynamicUniformIndex, ExtractComponent, ExtractComponentPlugin,
            UniformComponentPlugin,
        },
        render_graph::{
            NodeRunError, RenderGraphApp, RenderGraphContext, RenderLabel, ViewNode, ViewNodeRunner,
        },
        render_resource::{
            binding_types::{sampler, texture_2d, texture_depth_2d, uniform_buffer},
            *,
        },
        renderer::{RenderContext, RenderDevice},
        texture::{CachedTexture, TextureCache},
        view::ViewTarget,
    },
};
use constants::path::SAO_SHADER_PATH;
use serde::{Deserialize, Serialize};

/// Adds the scalable ambient occlusion pass between the main pass and bloom.
pub struct SaoPostProcessPlugin;

impl Plugin for SaoPostProcessPlugin {
    fn build(&self, app: &mut App) {
        app.add_plugins((
            ExtractComponentPlugin::<SaoSettings>::default(),
            UniformComponentPlugin::<SaoSettings>::default(),
        ));

        let Some(render_app) = app.get_sub_app_mut(RenderApp) else {
            return;
        };

        render_app
            .add_systems(
                Render,
                prepare_sao_textures.in_set(RenderSet::PrepareResources),
            )
            .add_render_graph_node::<ViewNodeRunner<SaoPostProcessNode>>(
                Core3d,
                SaoPostProcessLabel,
            )
            .add_render_graph_edges(
                Core3d,
                (Node3d::EndMainPass, SaoPostProcessLabel, Node3d::Bloom),
            );
    }

    fn finish(&self, app: &mut App) {
        let Some(render_app) = app.get_sub_app_mut(RenderApp) else {
            return;
        };

        render_app.init_resource::<SaoPostProcessPipeline>();
    }
}

#[derive(Debug, Hash, PartialEq, Eq, Clone, RenderLabel)]
struct SaoPostProcessLabel;

/// Furthest blur tap, in pixels, along each axis.
pub const MAX_BLUR_RADIUS: usize = 15;

const BLUR_WEIGHT_VECTORS: usize = (MAX_BLUR_RADIUS + 1) / 4;

/// Unblurred occlusion, one channel per pixel. Negative where nothing was shaded.
pub const OCCLUSION_TEXTURE_FORMAT: TextureFormat = TextureFormat::R16Float;

/// What the pass writes back into the view target.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SaoOutput {
    /// Scene colour darkened by occlusion.
    #[default]
    Default,
    /// Occlusion term only, as greyscale.
    Sao,
    /// Reconstructed view-space normals.
    Normal,
}

impl SaoOutput {
    pub const ALL: [SaoOutput; 3] = [SaoOutput::Default, SaoOutput::Sao, SaoOutput::Normal];

    pub fn label(self) -> &'static str {
        match self {
            SaoOutput::Default => "Default",
            SaoOutput::Sao => "SAO only",
            SaoOutput::Normal => "Normal",
        }
    }

    fn shader_index(self) -> u32 {
        match self {
            SaoOutput::Default => 0,
            SaoOutput::Sao => 1,
            SaoOutput::Normal => 2,
        }
    }
}

/// Live tuning values for the occlusion pass. The panel edits this resource;
/// the camera's [`SaoSettings`] is rebuilt from it whenever it changes.
#[derive(Resource, Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SaoParameters {
    pub output: SaoOutput,
    pub bias: f32,
    pub intensity: f32,
    pub scale: f32,
    pub kernel_radius: f32,
    pub min_resolution: f32,
    pub blur: bool,
    pub blur_radius: f32,
    pub blur_std_dev: f32,
    pub blur_depth_cutoff: f32,
}

impl Default for SaoParameters {
    fn default() -> Self {
        Self {
            output: SaoOutput::Default,
            bias: 0.5,
            intensity: 0.18,
            scale: 1.0,
            kernel_radius: 100.0,
            min_resolution: 0.0,
            blur: true,
            blur_radius: 8.0,
            blur_std_dev: 4.0,
            blur_depth_cutoff: 0.01,
        }
    }
}

/// GPU-side uniform. Mirrors `SaoSettings` in `sao_postprocess.wgsl`.
#[derive(Component, Default, Clone, Copy, Debug, PartialEq, ExtractComponent, ShaderType)]
pub struct SaoSettings {
    pub output: u32,
    pub bias: f32,
    pub intensity: f32,
    pub scale: f32,
    pub kernel_radius: f32,
    pub min_resolution: f32,
    pub blur: u32,
    pub blur_radius: f32,
    pub blur_std_dev: f32,
    pub blur_depth_cutoff: f32,
    pub camera_near: f32,
    pub camera_far: f32,
    pub tan_half_fov: f32,
    pub aspect_ratio: f32,
    /// Gaussian weight per tap distance, four distances per vector.
    pub blur_weights: [Vec4; BLUR_WEIGHT_VECTORS],
}

impl SaoSettings {
    pub fn new(params: &SaoParameters, projection: &Projection) -> Self {
        let (camera_near, camera_far, tan_half_fov, aspect_ratio) = match projection {
            Projection::Perspective(perspective) => (
                perspective.near,
                perspective.far,
                (perspective.fov * 0.5).tan(),
                perspective.aspect_ratio,
            ),
            // Orthographic views are not used by the viewer; keep the pass numerically sane.
            _ => (0.1, 1000.0, 1.0, 1.0),
        };

        let blur_std_dev = params.blur_std_dev.max(1.0e-3);
        Self {
            output: params.output.shader_index(),
            bias: params.bias,
            intensity: params.intensity,
            scale: params.scale,
            kernel_radius: params.kernel_radius,
            min_resolution: params.min_resolution,
            blur: u32::from(params.blur),
            blur_radius: params.blur_radius.clamp(0.0, MAX_BLUR_RADIUS as f32),
            blur_std_dev,
            blur_depth_cutoff: params.blur_depth_cutoff,
            camera_near,
            camera_far,
            tan_half_fov,
            aspect_ratio,
            blur_weights: blur_weights(params.blur_radius, blur_std_dev),
        }
    }
}

/// `exp(-d² / 2σ²)` for every tap distance `d` up to `radius`; zero past it.
pub fn blur_weights(radius: f32, std_dev: f32) -> [Vec4; BLUR_WEIGHT_VECTORS] {
    let radius = radius.clamp(0.0, MAX_BLUR_RADIUS as f32) as usize;
    let variance = 2.0 * std_dev * std_dev;
    let weight = |distance: usize| {
        if distance > radius {
            0.0
        } else {
            (-((distance * distance) as f32) / variance).exp()
        }
    };
    std::array::from_fn(|i| {
        let first = i * 4;
        Vec4::new(weight(first), weight(first + 1), weight(first + 2), weight(first + 3))
    })
}

/// Per-view target of the occlusion pass, read back by the blur and composite pass.
#[derive(Component)]
pub struct SaoTextures {
    pub occlusion: CachedTexture,
}

pub fn occlusion_texture_descriptor(size: UVec2) -> TextureDescriptor<'static> {
    TextureDescriptor {
        label: Some("sao_occlusion_texture"),
        size: Extent3d {
            width: size.x.max(1),
            height: size.y.max(1),
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: TextureDimension::D2,
        format: OCCLUSION_TEXTURE_FORMAT,
        usage: TextureUsages::RENDER_ATTACHMENT | TextureUsages::TEXTURE_BINDING,
        view_formats: &[],
    }
}

fn prepare_sao_textures(
    mut commands: Commands,
    mut texture_cache: ResMut<TextureCache>,
    render_device: Res<RenderDevice>,
    views: Query<(Entity, &ExtractedCamera), With<SaoSettings>>,
) {
    for (entity, camera) in &views {
        let Some(size) = camera.physical_viewport_size else {
            continue;
        };
        let occlusion = texture_cache.get(&render_device, occlusion_texture_descriptor(size));
        commands.entity(entity).insert(SaoTextures { occlusion });
    }
}

#[derive(Default)]
struct SaoPostProcessNode;

impl ViewNode for SaoPostProcessNode {
    type ViewQuery = (
        &'static ViewTarget,
        &'static ViewPrepassTextures,
        &'static SaoTextures,
        &'static DynamicUniformIndex<SaoSettings>,
    );

    // Two passes: raw occlusion into its own texture, then blur it and darken the scene.
    fn run(
        &self,
        _graph: &mut RenderGraphContext,
        render_context: &mut RenderContext,
        (view_target, prepass_textures, sao_textures, settings_index): QueryItem<Self::ViewQuery>,
        world: &World,
    ) -> Result<(), NodeRunError> {
        let sao_pipeline = world.resource::<SaoPostProcessPipeline>();
        let pipeline_cache = world.resource::<PipelineCache>();

        let (Some(occlusion_pipeline), Some(composite_pipeline)) = (
            pipeline_cache.get_render_pipeline(sao_pipeline.occlusion_pipeline_id),
            pipeline_cache.get_render_pipeline(sao_pipeline.composite_pipeline_id),
        ) else {
            return Ok(());
        };

        // The depth prepass texture appears one frame after DepthPrepass is inserted.
        let Some(depth_view) = prepass_textures.depth_view() else {
            return Ok(());
        };

        let settings_uniforms = world.resource::<ComponentUniforms<SaoSettings>>();
        let Some(settings_binding) = settings_uniforms.uniforms().binding() else {
            return Ok(());
        };

        let occlusion_view = &sao_textures.occlusion.default_view;

        let occlusion_bind_group = render_context.render_device().create_bind_group(
            "sao_occlusion_bind_group",
            &sao_pipeline.occlusion_layout,
            &BindGroupEntries::with_indices(((2, depth_view), (3, settings_binding.clone()))),
        );

        {
            let mut occlusion_pass =
                render_context.begin_tracked_render_pass(RenderPassDescriptor {
                    label: Some("sao_occlusion_pass"),
                    color_attachments: &[Some(RenderPassColorAttachment {
                        view: occlusion_view,
                        resolve_target: None,
                        ops: Operations::default(),
                    })],
                    depth_stencil_attachment: None,
                    timestamp_writes: None,
                    occlusion_query_set: None,
                });
            occlusion_pass.set_render_pipeline(occlusion_pipeline);
            occlusion_pass.set_bind_group(0, &occlusion_bind_group, &[settings_index.index()]);
            occlusion_pass.draw(0..3, 0..1);
        }

        let post_process = view_target.post_process_write();

        let composite_bind_group = render_context.render_device().create_bind_group(
            "sao_composite_bind_group",
            &sao_pipeline.composite_layout,
            &BindGroupEntries::sequential((
                post_process.source,
                &sao_pipeline.sampler,
                depth_view,
                settings_binding.clone(),
                occlusion_view,
            )),
        );

        let mut composite_pass = render_context.begin_tracked_render_pass(RenderPassDescriptor {
            label: Some("sao_composite_pass"),
            color_attachments: &[Some(RenderPassColorAttachment {
                view: post_process.destination,
                resolve_target: None,
                ops: Operations::default(),
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
        });

        composite_pass.set_render_pipeline(composite_pipeline);
        composite_pass.set_bind_group(0, &composite_bind_group, &[settings_index.index()]);
        composite_pass.draw(0..3, 0..1);

        Ok(())
    }
}

#[derive(Resource)]
struct SaoPostProcessPipeline {
    occlusion_layout: BindGroupLayout,
    composite_layout: BindGroupLayout,
    sampler: Sampler,
    occlusion_pipeline_id: CachedRenderPipelineId,
    composite_pipeline_id: CachedRenderPipelineId,
}

fn fullscreen_pipeline(
    label: &'static str,
    layout: &BindGroupLayout,
    shader: Handle<Shader>,
    entry_point: &'static str,
    format: TextureFormat,
) -> RenderPipelineDescriptor {
    RenderPipelineDescriptor {
        label: Some(label.into()),
        layout: vec![layout.clone()],
        vertex: fullscreen_shader_vertex_state(),
        fragment: Some(FragmentState {
            shader,
            shader_defs: vec![],
            entry_point: entry_point.into(),
            targets: vec![Some(ColorTargetState {
                format,
                blend: None,
                write_mask: ColorWrites::ALL,
            })],
        }),
        primitive: PrimitiveState::default(),
        depth_stencil: None,
        multisample: MultisampleState::default(),
        push_constant_ranges: vec![],
        zero_initialize_workgroup_memory: false,
    }
}

impl FromWorld for SaoPostProcessPipeline {
    fn from_world(world: &mut World) -> Self {
        let render_device = world.resource::<RenderDevice>();

        // Binding numbers are shared with the composite layout; both entry points live in one shader.
        let occlusion_layout = render_device.create_bind_group_layout(
            "sao_occlusion_bind_group_layout",
            &BindGroupLayoutEntries::with_indices(
                ShaderStages::FRAGMENT,
                (
                    (2, texture_depth_2d()),
                    (3, uniform_buffer::<SaoSettings>(true)),
                ),
            ),
        );

        let composite_layout = render_device.create_bind_group_layout(
            "sao_composite_bind_group_layout",
            &BindGroupLayoutEntries::sequential(
                ShaderStages::FRAGMENT,
                (
                    texture_2d(TextureSampleType::Float { filterable: true }),
                    sampler(SamplerBindingType::Filtering),
                    texture_depth_2d(),
                    uniform_buffer::<SaoSettings>(true),
                    texture_2d(TextureSampleType::Float { filterable: false }),
                ),
            ),
        );

        let sampler = render_device.create_sampler(&SamplerDescriptor {
            mag_filter: FilterMode::Linear,
            min_filter: FilterMode::Linear,
            ..default()
        });

        let shader: Handle<Shader> = world.load_asset(SAO_SHADER_PATH);

        let mut pipeline_cache = world.resource_mut::<PipelineCache>();
        let occlusion_pipeline_id = pipeline_cache.queue_render_pipeline(fullscreen_pipeline(
            "sao_occlusion_pipeline",
            &occlusion_layout,
            shader.clone(),
            "occlusion",
            OCCLUSION_TEXTURE_FORMAT,
        ));
        // Runs before tonemapping, so the target is always the HDR view format.
        let composite_pipeline_id = pipeline_cache.queue_render_pipeline(fullscreen_pipeline(
            "sao_composite_pipeline",
            &composite_layout,
            shader,
            "composite",
            ViewTarget::TEXTURE_FORMAT_HDR,
        ));

        Self {
            occlusion_layout,
            composite_layout,
            sampler,
            occlusion_pipeline_id,
            composite_pipeline_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn settings_carry_projection_planes() {
        let projection = Projection::Perspective(PerspectiveProjection {
            fov: 75.0_f32.to_radians(),
            near: 0.1,
            far: 1000.0,
            aspect_ratio: 2.0,
        });
        let settings = SaoSettings::new(&SaoParameters::default(), &projection);

        assert_eq!(settings.camera_near, 0.1);
        assert_eq!(settings.camera_far, 1000.0);
        assert_eq!(settings.aspect_ratio, 2.0);
        assert!((settings.tan_half_fov - (37.5_f32.to_radians()).tan()).abs() < 1e-6);
        assert_eq!(settings.blur, 1);
        assert_eq!(settings.output, 0);
    }

    #[test]
    fn output_mode_and_blur_flag_encode_as_integers() {
        let params = SaoParameters {
            output: SaoOutput::Normal,
            blur: false,
            ..default()
        };
        let settings = SaoSettings::new(&params, &Projection::default());
        assert_eq!(settings.output, 2);
        assert_eq!(settings.blur, 0);
    }

    #[test]
    fn zero_std_dev_is_clamped() {
        let params = SaoParameters {
            blur_std_dev: 0.0,
            ..default()
        };
        let settings = SaoSettings::new(&params, &Projection::default());
        assert!(settings.blur_std_dev > 0.0);
        assert!(settings.blur_weights[0].x == 1.0);
    }

    fn flatten(weights: [Vec4; BLUR_WEIGHT_VECTORS]) -> Vec<f32> {
        weights.iter().flat_map(|v| v.to_array()).collect()
    }

    #[test]
    fn blur_weights_fall_off_with_tap_distance() {
        let weights = flatten(blur_weights(8.0, 4.0));
        assert_eq!(weights.len(), MAX_BLUR_RADIUS + 1);
        assert_eq!(weights[0], 1.0);
        for distance in 1..=8 {
            assert!(weights[distance] < weights[distance - 1]);
            let expected = (-((distance * distance) as f32) / 32.0).exp();
            assert!((weights[distance] - expected).abs() < 1e-6);
        }
        assert!(weights[9..].iter().all(|&w| w == 0.0));
    }

    #[test]
    fn blur_radius_is_capped_at_the_weight_table() {
        let weights = flatten(blur_weights(1000.0, 4.0));
        assert!(weights.iter().all(|&w| w > 0.0));

        let params = SaoParameters {
            blur_radius: 1000.0,
            ..default()
        };
        let settings = SaoSettings::new(&params, &Projection::default());
        assert_eq!(settings.blur_radius, MAX_BLUR_RADIUS as f32);
    }

    #[test]
    fn occlusion_target_matches_the_viewport() {
        let descriptor = occlusion_texture_descriptor(UVec2::new(1280, 720));
        assert_eq!(descriptor.size.width, 1280);
        assert_eq!(descriptor.size.height, 720);
        assert_eq!(descriptor.format, OCCLUSION_TEXTURE_FORMAT);
        assert!(descriptor.usage.contains(TextureUsages::RENDER_ATTACHMENT));
        assert!(descriptor.usage.contains(TextureUsages::TEXTURE_BINDING));

        let empty = occlusion_texture_descriptor(UVec2::ZERO);
        assert_eq!((empty.size.width, empty.size.height), (1, 1));
    }
}
