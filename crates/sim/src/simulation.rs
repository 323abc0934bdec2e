use crate::injector::SourceInjector;
use crate::params::SimParams;
use crate::stepper::Stepper;
use glam::Vec3;
use morphogen_common::{GridExtent, ModelKind};
use morphogen_field::{FieldError, VolumeField, VolumeStore};
use morphogen_gpu::GpuContext;

/// Rest state of the medium: all u, no v.
pub const CLEAR_COLOR: wgpu::Color = wgpu::Color {
    r: 1.0,
    g: 0.0,
    b: 0.0,
    a: 0.0,
};

/// One live simulation: the double-buffered store, the stepper and
/// injector built against it, and the active parameter set.
///
/// Switching models constructs a fresh `Simulation` at the same
/// resolution; nothing migrates across the switch.
pub struct Simulation {
    store: VolumeStore,
    stepper: Stepper,
    injector: SourceInjector,
    pub params: SimParams,
}

impl Simulation {
    /// Allocate and seed a simulation. Fails if the extents exceed the
    /// device's texture limits.
    pub fn new(
        gpu: &GpuContext,
        extent: GridExtent,
        kind: ModelKind,
        seed: u64,
    ) -> Result<Self, FieldError> {
        let mut store = VolumeStore::double(
            &gpu.device,
            &gpu.queue,
            extent,
            gpu.max_targets(),
            Some(CLEAR_COLOR),
        )?;
        let stepper = Stepper::new(gpu, &store, kind);
        let mut injector = SourceInjector::new(gpu, &store, seed);
        let params = SimParams::for_kind(kind);
        injector.reset(gpu, &mut store, &params);
        tracing::info!(
            "simulation ready: {} at {}^3, {} tile(s) per pass",
            kind.name(),
            extent.depth,
            store.tile_map().tiles(),
        );
        Ok(Self {
            store,
            stepper,
            injector,
            params,
        })
    }

    pub fn kind(&self) -> ModelKind {
        self.stepper.kind()
    }

    pub fn extent(&self) -> GridExtent {
        self.store.extent()
    }

    /// Advance by the configured number of sub-steps.
    pub fn step(&mut self, gpu: &GpuContext) {
        self.stepper.step(gpu, &mut self.store, &self.params);
    }

    /// Clear and reseed the field, keeping the current parameters.
    pub fn reset(&mut self, gpu: &GpuContext) {
        self.injector.reset(gpu, &mut self.store, &self.params);
    }

    /// Drop one more source at a random position (manual trigger).
    pub fn add_source(&mut self, gpu: &GpuContext) {
        self.injector
            .inject(gpu, &mut self.store, 1, self.params.shared.source_size, None);
    }

    /// Drop a source at an explicit position in the unit cube.
    pub fn inject_at(&mut self, gpu: &GpuContext, center: Vec3, source_size: f32) {
        self.injector
            .inject(gpu, &mut self.store, 1, source_size, Some(center));
    }

    /// The readable field for display and readback.
    pub fn field(&self) -> &VolumeField {
        self.store.current()
    }

    pub fn set_gravity_force(&mut self, active: bool) {
        self.params.set_gravity_force(active);
    }
}
