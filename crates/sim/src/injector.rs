use crate::params::SimParams;
use crate::pass::TiledPass;
use crate::shaders;
use crate::simulation::CLEAR_COLOR;
use bytemuck::{Pod, Zeroable};
use glam::Vec3;
use morphogen_field::VolumeStore;
use morphogen_gpu::{Geometry, GpuContext};
use rand::{Rng, SeedableRng, rngs::StdRng};

#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
struct SourceUniforms {
    center: [f32; 3],
    source_size: f32,
    size: [u32; 3],
    _pad: u32,
}

/// Seeds and perturbs the field with localized Gaussian sources.
///
/// Each injection subtracts `0.5·exp(-|p-c|²/size)` from u (floored at 0)
/// and adds it to v (capped at 1) across the whole volume, as one tiled
/// write pass. Random centers come from a seeded generator so a run is
/// reproducible under the same seed.
pub struct SourceInjector {
    plane: Geometry,
    pass: TiledPass,
    rng: StdRng,
}

impl SourceInjector {
    pub fn new(gpu: &GpuContext, store: &VolumeStore, seed: u64) -> Self {
        let plane = Geometry::fullscreen_plane(&gpu.device);
        let pass = TiledPass::new(
            gpu,
            store,
            "source",
            std::mem::size_of::<SourceUniforms>() as u64,
            &shaders::source_shader,
        );
        Self {
            plane,
            pass,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Add `count` sources, each at `center` when given, otherwise at a
    /// uniformly random point in the unit cube.
    pub fn inject(
        &mut self,
        gpu: &GpuContext,
        store: &mut VolumeStore,
        count: u32,
        source_size: f32,
        center: Option<Vec3>,
    ) {
        let extent = store.extent();
        for _ in 0..count {
            let c = center
                .map(|v| v.to_array())
                .unwrap_or_else(|| self.rng.random::<[f32; 3]>());
            let uniforms = SourceUniforms {
                center: c,
                source_size,
                size: [extent.width, extent.height, extent.depth],
                _pad: 0,
            };
            self.pass
                .write_params(&gpu.queue, bytemuck::bytes_of(&uniforms));
            self.pass.run(gpu, store, &self.plane, "source_pass");
        }
        tracing::debug!("injected {count} source(s)");
    }

    /// Clear the field to the all-u rest state and reseed it.
    pub fn reset(&mut self, gpu: &GpuContext, store: &mut VolumeStore, params: &SimParams) {
        store.clear(&gpu.device, &gpu.queue, CLEAR_COLOR);
        self.inject(
            gpu,
            store,
            params.shared.sources,
            params.shared.source_size,
            None,
        );
    }
}
