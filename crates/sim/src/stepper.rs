use crate::params::{ModelParams, SimParams};
use crate::pass::TiledPass;
use crate::shaders;
use bytemuck::{Pod, Zeroable};
use morphogen_common::{BoundaryMode, GridExtent, ModelKind};
use morphogen_field::VolumeStore;
use morphogen_gpu::{Geometry, GpuContext};

#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
struct SimUniforms {
    wind_dir: [f32; 3],
    wind: f32,
    gravity_pos: [f32; 3],
    gravity: f32,
    rates: [f32; 4],
    extra: [f32; 4],
    size: [u32; 3],
    boundary: u32,
    pause: u32,
    _pad: [u32; 3],
}

impl SimUniforms {
    fn pack(params: &SimParams, extent: GridExtent) -> Self {
        let (rates, extra) = match params.model {
            ModelParams::GrayScott(m) => ([m.du, m.dv, m.feed, m.kill], [0.0; 4]),
            ModelParams::FitzHughNagumo(m) => {
                ([m.du, m.dv, m.a, m.b], [m.epsilon, 0.0, 0.0, 0.0])
            }
            ModelParams::Schnakenberg(m) => ([m.du, m.dv, m.a, m.b], [0.0; 4]),
        };
        let shared = &params.shared;
        Self {
            wind_dir: shared.wind_dir.to_array(),
            wind: shared.wind,
            gravity_pos: shared.gravity_pos.to_array(),
            gravity: shared.gravity,
            rates,
            extra,
            size: [extent.width, extent.height, extent.depth],
            boundary: match shared.boundary {
                BoundaryMode::Wrap => 0,
                BoundaryMode::Clamp => 1,
            },
            pause: shared.paused as u32,
            _pad: [0; 3],
        }
    }
}

/// Advances the field by reaction-diffusion sub-steps for one model kind.
///
/// Built against a specific store (pipelines depend on its tile widths,
/// bind groups on its ping-pong fields); switching models or resolutions
/// constructs a fresh stepper.
pub struct Stepper {
    kind: ModelKind,
    plane: Geometry,
    pass: TiledPass,
}

impl Stepper {
    pub fn new(gpu: &GpuContext, store: &VolumeStore, kind: ModelKind) -> Self {
        let plane = Geometry::fullscreen_plane(&gpu.device);
        let pass = TiledPass::new(
            gpu,
            store,
            "simulate",
            std::mem::size_of::<SimUniforms>() as u64,
            &|targets| shaders::simulation_shader(kind, targets),
        );
        Self { kind, plane, pass }
    }

    pub fn kind(&self) -> ModelKind {
        self.kind
    }

    /// Run `speed` sub-steps, each a full read/write/flip pass. A paused
    /// step still runs (as an identity copy) so the buffer contract holds.
    pub fn step(&self, gpu: &GpuContext, store: &mut VolumeStore, params: &SimParams) {
        debug_assert_eq!(
            params.kind(),
            self.kind,
            "stepper driven with another model's parameters"
        );
        let uniforms = SimUniforms::pack(params, store.extent());
        self.pass
            .write_params(&gpu.queue, bytemuck::bytes_of(&uniforms));
        for _ in 0..params.shared.speed.max(1) {
            self.pass.run(gpu, store, &self.plane, "simulate_pass");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::GrayScottParams;

    #[test]
    fn uniforms_pack_model_constants() {
        let params = SimParams {
            model: ModelParams::GrayScott(GrayScottParams {
                du: 0.1,
                dv: 0.2,
                feed: 0.3,
                kill: 0.4,
            }),
            shared: Default::default(),
        };
        let u = SimUniforms::pack(&params, GridExtent::cube(16));
        assert_eq!(u.rates, [0.1, 0.2, 0.3, 0.4]);
        assert_eq!(u.size, [16, 16, 16]);
        assert_eq!(u.boundary, 1);
        assert_eq!(u.pause, 0);
    }

    #[test]
    fn uniforms_pack_epsilon_in_extra() {
        let params = SimParams::for_kind(ModelKind::FitzHughNagumo);
        let u = SimUniforms::pack(&params, GridExtent::cube(8));
        assert!((u.extra[0] - 0.107).abs() < 1e-6);
    }

    #[test]
    fn uniform_block_is_16_byte_aligned() {
        assert_eq!(std::mem::size_of::<SimUniforms>() % 16, 0);
    }
}
