use crate::camera::OrbitCamera;
use crate::shaders;
use bytemuck::{Pod, Zeroable};
use glam::Mat3;
use morphogen_field::VolumeField;
use morphogen_gpu::{DrawCall, Geometry, GpuContext, GpuError, PassOptions};

/// How a ray's first threshold crossing is colored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ShadingMode {
    /// Indicator value replicated across the color channels.
    Density,
    /// Estimated surface normal, lit in view space.
    #[default]
    Normal,
}

/// Per-frame display controls.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RaycastSettings {
    /// Isosurface threshold on the v channel.
    pub threshold: f32,
    /// March step count over the ray's traversal of the cube.
    pub steps: f32,
    pub shading: ShadingMode,
}

impl Default for RaycastSettings {
    fn default() -> Self {
        Self {
            threshold: 0.25,
            steps: 200.0,
            shading: ShadingMode::Normal,
        }
    }
}

#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
struct DisplayUniforms {
    view_proj: [[f32; 4]; 4],
    // mat3x3 uniform layout: three 16-byte columns.
    normal_mat: [[f32; 4]; 3],
    camera_obj: [f32; 3],
    depth: f32,
    threshold: f32,
    steps: f32,
    shade_mode: u32,
    _pad: f32,
}

fn pack_mat3(m: Mat3) -> [[f32; 4]; 3] {
    let c = m.to_cols_array_2d();
    [
        [c[0][0], c[0][1], c[0][2], 0.0],
        [c[1][0], c[1][1], c[1][2], 0.0],
        [c[2][0], c[2][1], c[2][2], 0.0],
    ]
}

/// Draws the volumetric field by marching camera rays through a unit cube.
pub struct VolumeRaycaster {
    cube: Geometry,
    pipeline: wgpu::RenderPipeline,
    layout: wgpu::BindGroupLayout,
    sampler: wgpu::Sampler,
    uniform_buf: wgpu::Buffer,
}

impl VolumeRaycaster {
    /// Build the display pipeline for the given output format. Fails when
    /// the device cannot linearly filter the field texture.
    pub fn new(gpu: &GpuContext, output_format: wgpu::TextureFormat) -> Result<Self, GpuError> {
        if !gpu.supports_filterable_field() {
            return Err(GpuError::MissingCapability(
                "float32-filterable texture sampling",
            ));
        }
        let device = &gpu.device;
        let cube = Geometry::unit_cube(device);

        let layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("raycast"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: wgpu::BufferSize::new(
                            std::mem::size_of::<DisplayUniforms>() as u64,
                        ),
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2Array,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });
        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("raycast"),
            bind_group_layouts: &[&layout],
            push_constant_ranges: &[],
        });

        let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("raycast_shader"),
            source: wgpu::ShaderSource::Wgsl(shaders::RAYCAST_SHADER.into()),
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("raycast_pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &module,
                entry_point: Some("vs_main"),
                compilation_options: Default::default(),
                buffers: &[Geometry::cube_layout()],
            },
            fragment: Some(wgpu::FragmentState {
                module: &module,
                entry_point: Some("fs_main"),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format: output_format,
                    blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                cull_mode: Some(wgpu::Face::Back),
                ..Default::default()
            },
            depth_stencil: None,
            multisample: Default::default(),
            multiview: None,
            cache: None,
        });

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("field_sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        let uniform_buf = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("raycast_uniforms"),
            size: std::mem::size_of::<DisplayUniforms>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        Ok(Self {
            cube,
            pipeline,
            layout,
            sampler,
            uniform_buf,
        })
    }

    /// Record the display pass into `encoder`, clearing the target to
    /// black first. Rays that miss the volume or never cross the
    /// threshold leave the background.
    pub fn render(
        &self,
        gpu: &GpuContext,
        encoder: &mut wgpu::CommandEncoder,
        target: &wgpu::TextureView,
        field: &VolumeField,
        camera: &OrbitCamera,
        settings: &RaycastSettings,
    ) {
        let uniforms = DisplayUniforms {
            view_proj: camera.view_projection().to_cols_array_2d(),
            normal_mat: pack_mat3(camera.normal_matrix()),
            camera_obj: camera.position().to_array(),
            depth: field.extent().depth as f32,
            threshold: settings.threshold,
            steps: settings.steps.max(1.0),
            shade_mode: match settings.shading {
                ShadingMode::Density => 0,
                ShadingMode::Normal => 1,
            },
            _pad: 0.0,
        };
        gpu.queue
            .write_buffer(&self.uniform_buf, 0, bytemuck::bytes_of(&uniforms));

        let bind_group = gpu.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("raycast"),
            layout: &self.layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: self.uniform_buf.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(field.sampled_view()),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::Sampler(&self.sampler),
                },
            ],
        });

        DrawCall::set(&self.cube, &self.pipeline, &bind_group).render(
            encoder,
            &PassOptions {
                label: Some("raycast_pass"),
                targets: &[target],
                clear_color: Some(wgpu::Color::BLACK),
                dynamic_offsets: &[],
            },
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn settings_default_match_display() {
        let s = RaycastSettings::default();
        assert!((s.threshold - 0.25).abs() < 1e-6);
        assert_eq!(s.steps, 200.0);
        assert_eq!(s.shading, ShadingMode::Normal);
    }

    #[test]
    fn uniform_block_is_16_byte_aligned() {
        assert_eq!(std::mem::size_of::<DisplayUniforms>() % 16, 0);
    }

    #[test]
    fn mat3_packs_into_padded_columns() {
        let m = Mat3::IDENTITY;
        let packed = pack_mat3(m);
        assert_eq!(packed[0], [1.0, 0.0, 0.0, 0.0]);
        assert_eq!(packed[1], [0.0, 1.0, 0.0, 0.0]);
        assert_eq!(packed[2], [0.0, 0.0, 1.0, 0.0]);
    }
}
