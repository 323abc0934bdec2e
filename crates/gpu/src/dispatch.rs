use crate::geometry::Geometry;

/// Target and clear configuration for a dispatched draw.
pub struct PassOptions<'a> {
    pub label: Option<&'static str>,
    /// Color targets bound for the pass, in attachment order.
    pub targets: &'a [&'a wgpu::TextureView],
    /// Clear all targets to this color before drawing; `None` loads.
    pub clear_color: Option<wgpu::Color>,
    /// Dynamic offsets for the staged bind group, e.g. the per-tile slot.
    pub dynamic_offsets: &'a [u32],
}

impl Default for PassOptions<'_> {
    fn default() -> Self {
        Self {
            label: None,
            targets: &[],
            clear_color: None,
            dynamic_offsets: &[],
        }
    }
}

/// A staged draw: geometry + compiled pipeline + its bound resources.
///
/// Every pass in the system (simulation step, source injection, display
/// raycast) stages one of these and executes it with [`DrawCall::render`].
/// Which uniforms a pipeline accepts is fixed by its bind-group layout at
/// construction, so a mismatch fails at pipeline build, not at draw time.
/// Blend state is likewise a pipeline-construction choice.
pub struct DrawCall<'a> {
    geometry: &'a Geometry,
    pipeline: &'a wgpu::RenderPipeline,
    bind_group: &'a wgpu::BindGroup,
}

impl<'a> DrawCall<'a> {
    /// Stage a draw.
    pub fn set(
        geometry: &'a Geometry,
        pipeline: &'a wgpu::RenderPipeline,
        bind_group: &'a wgpu::BindGroup,
    ) -> Self {
        Self {
            geometry,
            pipeline,
            bind_group,
        }
    }

    /// Record the staged draw as one render pass over the given targets.
    pub fn render(&self, encoder: &mut wgpu::CommandEncoder, options: &PassOptions<'_>) {
        debug_assert!(
            !options.targets.is_empty(),
            "draw dispatched with no color targets"
        );
        let attachments: Vec<Option<wgpu::RenderPassColorAttachment<'_>>> = options
            .targets
            .iter()
            .map(|view| {
                Some(wgpu::RenderPassColorAttachment {
                    view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: match options.clear_color {
                            Some(color) => wgpu::LoadOp::Clear(color),
                            None => wgpu::LoadOp::Load,
                        },
                        store: wgpu::StoreOp::Store,
                    },
                })
            })
            .collect();

        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: options.label,
            color_attachments: &attachments,
            depth_stencil_attachment: None,
            ..Default::default()
        });
        pass.set_pipeline(self.pipeline);
        pass.set_bind_group(0, self.bind_group, options.dynamic_offsets);
        pass.set_vertex_buffer(0, self.geometry.vertex_buffer().slice(..));
        pass.set_index_buffer(
            self.geometry.index_buffer().slice(..),
            wgpu::IndexFormat::Uint16,
        );
        pass.draw_indexed(0..self.geometry.index_count(), 0, 0..1);
    }
}

/// Clear a set of color targets without drawing (load-op clear only).
pub fn clear_targets(
    encoder: &mut wgpu::CommandEncoder,
    targets: &[&wgpu::TextureView],
    color: wgpu::Color,
) {
    let attachments: Vec<Option<wgpu::RenderPassColorAttachment<'_>>> = targets
        .iter()
        .map(|view| {
            Some(wgpu::RenderPassColorAttachment {
                view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(color),
                    store: wgpu::StoreOp::Store,
                },
            })
        })
        .collect();
    encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
        label: Some("clear_pass"),
        color_attachments: &attachments,
        depth_stencil_attachment: None,
        ..Default::default()
    });
}
