use morphogen_common::GridExtent;

/// Texel format of the field: x = u, y = v, z/w reserved.
pub const FIELD_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba32Float;

const TEXEL_BYTES: u32 = 16;

/// Errors from field allocation and readback.
#[derive(Debug, thiserror::Error)]
pub enum FieldError {
    #[error("requested {axis} extent {requested} exceeds device limit {limit}")]
    ExtentExceedsLimit {
        axis: &'static str,
        requested: u32,
        limit: u32,
    },
    #[error("field readback failed: {0}")]
    Readback(String),
}

/// One allocation of the volumetric field.
///
/// Backed by a 2D-array texture (color attachments must be 2D, so depth
/// slices are array layers). Holds one render-target view per layer for
/// tiled writes and one array view for sampling.
pub struct VolumeField {
    texture: wgpu::Texture,
    layer_views: Vec<wgpu::TextureView>,
    sampled_view: wgpu::TextureView,
    extent: GridExtent,
}

impl VolumeField {
    /// Allocate a field, validating extents against device limits.
    /// Oversized requests are reported, never truncated.
    pub fn allocate(
        device: &wgpu::Device,
        extent: GridExtent,
        label: &str,
    ) -> Result<Self, FieldError> {
        let limits = device.limits();
        let checks = [
            ("width", extent.width, limits.max_texture_dimension_2d),
            ("height", extent.height, limits.max_texture_dimension_2d),
            ("depth", extent.depth, limits.max_texture_array_layers),
        ];
        for (axis, requested, limit) in checks {
            if requested == 0 || requested > limit {
                return Err(FieldError::ExtentExceedsLimit {
                    axis,
                    requested,
                    limit,
                });
            }
        }

        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size: wgpu::Extent3d {
                width: extent.width,
                height: extent.height,
                depth_or_array_layers: extent.depth,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: FIELD_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT
                | wgpu::TextureUsages::TEXTURE_BINDING
                | wgpu::TextureUsages::COPY_SRC,
            view_formats: &[],
        });

        let layer_views = (0..extent.depth)
            .map(|z| {
                texture.create_view(&wgpu::TextureViewDescriptor {
                    label: Some(&format!("{label}_layer_{z}")),
                    dimension: Some(wgpu::TextureViewDimension::D2),
                    base_array_layer: z,
                    array_layer_count: Some(1),
                    ..Default::default()
                })
            })
            .collect();

        let sampled_view = texture.create_view(&wgpu::TextureViewDescriptor {
            label: Some(&format!("{label}_sampled")),
            dimension: Some(wgpu::TextureViewDimension::D2Array),
            ..Default::default()
        });

        tracing::debug!(
            "allocated field '{label}' {}x{}x{}",
            extent.width,
            extent.height,
            extent.depth
        );

        Ok(Self {
            texture,
            layer_views,
            sampled_view,
            extent,
        })
    }

    pub fn extent(&self) -> GridExtent {
        self.extent
    }

    /// Render-target view of one depth layer.
    pub fn layer_view(&self, z: u32) -> &wgpu::TextureView {
        &self.layer_views[z as usize]
    }

    /// Array view for sampling the whole volume.
    pub fn sampled_view(&self) -> &wgpu::TextureView {
        &self.sampled_view
    }

    /// Read one depth layer back to the CPU as rgba texels, row-major.
    /// Test and debugging aid; stalls the queue.
    pub fn read_layer(
        &self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        z: u32,
    ) -> Result<Vec<[f32; 4]>, FieldError> {
        let width = self.extent.width;
        let height = self.extent.height;
        let row_bytes = width as u64 * TEXEL_BYTES as u64;
        let padded_row = row_bytes.div_ceil(wgpu::COPY_BYTES_PER_ROW_ALIGNMENT as u64)
            * wgpu::COPY_BYTES_PER_ROW_ALIGNMENT as u64;

        let buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("field_readback"),
            size: padded_row * height as u64,
            usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
            mapped_at_creation: false,
        });

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("field_readback_encoder"),
        });
        encoder.copy_texture_to_buffer(
            wgpu::TexelCopyTextureInfo {
                texture: &self.texture,
                mip_level: 0,
                origin: wgpu::Origin3d { x: 0, y: 0, z },
                aspect: wgpu::TextureAspect::All,
            },
            wgpu::TexelCopyBufferInfo {
                buffer: &buffer,
                layout: wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(padded_row as u32),
                    rows_per_image: Some(height),
                },
            },
            wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
        );
        queue.submit(std::iter::once(encoder.finish()));

        let slice = buffer.slice(..);
        let (tx, rx) = std::sync::mpsc::channel();
        slice.map_async(wgpu::MapMode::Read, move |result| {
            let _ = tx.send(result);
        });
        let _ = device.poll(wgpu::Maintain::Wait);
        rx.recv()
            .map_err(|_| FieldError::Readback("map callback dropped".into()))?
            .map_err(|e| FieldError::Readback(e.to_string()))?;

        let mapped = slice.get_mapped_range();
        let mut texels = Vec::with_capacity((width * height) as usize);
        for row in 0..height as usize {
            let offset = row * padded_row as usize;
            let row_data: &[f32] =
                bytemuck::cast_slice(&mapped[offset..offset + row_bytes as usize]);
            for texel in row_data.chunks_exact(4) {
                texels.push([texel[0], texel[1], texel[2], texel[3]]);
            }
        }
        drop(mapped);
        buffer.unmap();
        Ok(texels)
    }
}
