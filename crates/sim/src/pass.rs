//! Shared machinery for tiled full-depth write passes.
//!
//! Both the stepper and the source injector are "read the current buffer,
//! write every layer of the alternate buffer" operations; they differ only
//! in shader and uniform block. This module owns the pieces common to
//! both: pipelines per tile width, the per-tile `start_z` uniform served
//! through dynamic offsets, and one bind group per ping-pong orientation.

use morphogen_field::{FIELD_FORMAT, VolumeStore};
use morphogen_gpu::{DrawCall, Geometry, GpuContext, PassOptions};

/// Size of the per-tile uniform block (start_z plus padding).
const TILE_UNIFORM_SIZE: u64 = 16;

/// Pipelines for the tile widths a store needs: one for full tiles and,
/// when the depth is not a multiple of the cap, one for the short tail.
struct TiledPipelines {
    primary: (u32, wgpu::RenderPipeline),
    tail: Option<(u32, wgpu::RenderPipeline)>,
}

impl TiledPipelines {
    fn for_layers(&self, layers: u32) -> &wgpu::RenderPipeline {
        if self.primary.0 == layers {
            return &self.primary.1;
        }
        match &self.tail {
            Some((count, pipeline)) if *count == layers => pipeline,
            _ => panic!("no pipeline compiled for a {layers}-layer tile"),
        }
    }
}

/// One full-depth write pass: pipelines, uniforms, ping-pong bind groups.
pub(crate) struct TiledPass {
    pipelines: TiledPipelines,
    params_buf: wgpu::Buffer,
    _tile_buf: wgpu::Buffer,
    tile_stride: u32,
    bind_groups: [wgpu::BindGroup; 2],
}

impl TiledPass {
    /// Build the pass against a store's tile map and ping-pong fields.
    /// `shader_for(n)` must yield the WGSL writing exactly n targets.
    pub fn new(
        gpu: &GpuContext,
        store: &VolumeStore,
        label: &'static str,
        params_size: u64,
        shader_for: &dyn Fn(u32) -> String,
    ) -> Self {
        let device = &gpu.device;
        let map = *store.tile_map();

        let layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some(label),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: wgpu::BufferSize::new(params_size),
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: true,
                        min_binding_size: wgpu::BufferSize::new(TILE_UNIFORM_SIZE),
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: false },
                        view_dimension: wgpu::TextureViewDimension::D2Array,
                        multisampled: false,
                    },
                    count: None,
                },
            ],
        });
        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some(label),
            bind_group_layouts: &[&layout],
            push_constant_ranges: &[],
        });

        let first = map.span(0).layers;
        let last = map.span(map.tiles() - 1).layers;
        let primary = (
            first,
            build_pipeline(device, &pipeline_layout, &shader_for(first), first, label),
        );
        let tail = (last != first).then(|| {
            (
                last,
                build_pipeline(device, &pipeline_layout, &shader_for(last), last, label),
            )
        });

        let params_buf = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(&format!("{label}_params")),
            size: params_size,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        // One aligned slot per tile, selected by dynamic offset at draw.
        let tile_stride = device
            .limits()
            .min_uniform_buffer_offset_alignment
            .max(TILE_UNIFORM_SIZE as u32);
        let mut tile_data = vec![0u8; (tile_stride * map.tiles()) as usize];
        for (t, span) in map.spans().enumerate() {
            let offset = t * tile_stride as usize;
            tile_data[offset..offset + 4].copy_from_slice(&span.start_z.to_le_bytes());
        }
        let tile_buf = wgpu::util::DeviceExt::create_buffer_init(
            device,
            &wgpu::util::BufferInitDescriptor {
                label: Some(&format!("{label}_tiles")),
                contents: &tile_data,
                usage: wgpu::BufferUsages::UNIFORM,
            },
        );

        let bind_groups = std::array::from_fn(|orientation| {
            let read_index = if store.is_double() { 1 - orientation } else { 0 };
            device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some(label),
                layout: &layout,
                entries: &[
                    wgpu::BindGroupEntry {
                        binding: 0,
                        resource: params_buf.as_entire_binding(),
                    },
                    wgpu::BindGroupEntry {
                        binding: 1,
                        resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                            buffer: &tile_buf,
                            offset: 0,
                            size: wgpu::BufferSize::new(TILE_UNIFORM_SIZE),
                        }),
                    },
                    wgpu::BindGroupEntry {
                        binding: 2,
                        resource: wgpu::BindingResource::TextureView(
                            store.field(read_index).sampled_view(),
                        ),
                    },
                ],
            })
        });

        Self {
            pipelines: TiledPipelines { primary, tail },
            params_buf,
            _tile_buf: tile_buf,
            tile_stride,
            bind_groups,
        }
    }

    pub fn write_params(&self, queue: &wgpu::Queue, bytes: &[u8]) {
        queue.write_buffer(&self.params_buf, 0, bytes);
    }

    /// Execute one full-depth write: all tiles into the store's write
    /// buffer, then flip.
    pub fn run(
        &self,
        gpu: &GpuContext,
        store: &mut VolumeStore,
        plane: &Geometry,
        label: &'static str,
    ) {
        let pass = store.begin_write();
        let map = *pass.tile_map();
        let mut encoder = gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor { label: Some(label) });
        for (t, span) in map.spans().enumerate() {
            let targets: Vec<&wgpu::TextureView> = (span.start_z..span.start_z + span.layers)
                .map(|z| pass.write().layer_view(z))
                .collect();
            DrawCall::set(
                plane,
                self.pipelines.for_layers(span.layers),
                &self.bind_groups[pass.write_index()],
            )
            .render(
                &mut encoder,
                &PassOptions {
                    label: Some(label),
                    targets: &targets,
                    clear_color: None,
                    dynamic_offsets: &[t as u32 * self.tile_stride],
                },
            );
        }
        gpu.queue.submit(std::iter::once(encoder.finish()));
        pass.commit();
    }
}

fn build_pipeline(
    device: &wgpu::Device,
    layout: &wgpu::PipelineLayout,
    source: &str,
    targets: u32,
    label: &'static str,
) -> wgpu::RenderPipeline {
    let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some(label),
        source: wgpu::ShaderSource::Wgsl(source.into()),
    });
    let target_states: Vec<Option<wgpu::ColorTargetState>> = (0..targets)
        .map(|_| {
            Some(wgpu::ColorTargetState {
                format: FIELD_FORMAT,
                blend: None,
                write_mask: wgpu::ColorWrites::ALL,
            })
        })
        .collect();
    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(label),
        layout: Some(layout),
        vertex: wgpu::VertexState {
            module: &module,
            entry_point: Some("vs_main"),
            compilation_options: Default::default(),
            buffers: &[Geometry::plane_layout()],
        },
        fragment: Some(wgpu::FragmentState {
            module: &module,
            entry_point: Some("fs_main"),
            compilation_options: Default::default(),
            targets: &target_states,
        }),
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            ..Default::default()
        },
        depth_stencil: None,
        multisample: Default::default(),
        multiview: None,
        cache: None,
    })
}
