use glam::Vec3;
use morphogen_common::{BoundaryMode, ModelKind};

/// Gray-Scott: feed/kill kinetics with quadratic autocatalysis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GrayScottParams {
    pub du: f32,
    pub dv: f32,
    pub feed: f32,
    pub kill: f32,
}

impl Default for GrayScottParams {
    fn default() -> Self {
        Self {
            du: 0.15,
            dv: 0.08,
            feed: 0.03,
            kill: 0.06,
        }
    }
}

/// FitzHugh-Nagumo: excitable-medium kinetics, u fast, v slow recovery.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FitzHughNagumoParams {
    pub du: f32,
    pub dv: f32,
    pub epsilon: f32,
    pub a: f32,
    pub b: f32,
}

impl Default for FitzHughNagumoParams {
    fn default() -> Self {
        Self {
            du: 0.34,
            dv: 0.171,
            epsilon: 0.107,
            a: 0.95,
            b: 1.0,
        }
    }
}

/// Schnakenberg: quadratic autocatalytic coupling with constant feeds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SchnakenbergParams {
    pub du: f32,
    pub dv: f32,
    pub a: f32,
    pub b: f32,
}

impl Default for SchnakenbergParams {
    fn default() -> Self {
        Self {
            du: 0.176,
            dv: 0.08,
            a: 0.0625,
            b: 0.06,
        }
    }
}

/// Model-specific reaction parameters, dispatched by kind.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ModelParams {
    GrayScott(GrayScottParams),
    FitzHughNagumo(FitzHughNagumoParams),
    Schnakenberg(SchnakenbergParams),
}

impl ModelParams {
    pub fn for_kind(kind: ModelKind) -> Self {
        match kind {
            ModelKind::GrayScott => Self::GrayScott(Default::default()),
            ModelKind::FitzHughNagumo => Self::FitzHughNagumo(Default::default()),
            ModelKind::Schnakenberg => Self::Schnakenberg(Default::default()),
        }
    }

    pub fn kind(&self) -> ModelKind {
        match self {
            Self::GrayScott(_) => ModelKind::GrayScott,
            Self::FitzHughNagumo(_) => ModelKind::FitzHughNagumo,
            Self::Schnakenberg(_) => ModelKind::Schnakenberg,
        }
    }
}

/// The parameter block every model carries.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SharedParams {
    /// Wind direction (normalized before use) and its force factor.
    pub wind_dir: Vec3,
    pub wind: f32,
    /// Fixed point concentrations drift toward while the gravity force is
    /// active, the active force, and the factor applied while triggered.
    pub gravity_pos: Vec3,
    pub gravity: f32,
    pub gravity_factor: f32,
    pub boundary: BoundaryMode,
    /// Sub-steps per invocation.
    pub speed: u32,
    pub paused: bool,
    /// Seeding: number of random sources and their Gaussian falloff size.
    pub sources: u32,
    pub source_size: f32,
}

impl Default for SharedParams {
    fn default() -> Self {
        Self {
            wind_dir: Vec3::new(0.7, 0.3, -0.5),
            wind: 0.0,
            gravity_pos: Vec3::new(0.0, -1.0, 0.0),
            gravity: 0.0,
            gravity_factor: 0.0001,
            boundary: BoundaryMode::Clamp,
            speed: 1,
            paused: false,
            sources: 5,
            source_size: 0.001,
        }
    }
}

/// Everything a simulation step reads. Replaced wholesale when the active
/// model changes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimParams {
    pub model: ModelParams,
    pub shared: SharedParams,
}

impl SimParams {
    pub fn for_kind(kind: ModelKind) -> Self {
        let shared = SharedParams {
            // The excitable medium starts from a single seed by default.
            sources: match kind {
                ModelKind::FitzHughNagumo => 1,
                _ => 5,
            },
            ..Default::default()
        };
        Self {
            model: ModelParams::for_kind(kind),
            shared,
        }
    }

    pub fn kind(&self) -> ModelKind {
        self.model.kind()
    }

    /// Engage or release the gravity bias (held-key trigger).
    pub fn set_gravity_force(&mut self, active: bool) {
        self.shared.gravity = if active {
            self.shared.gravity_factor
        } else {
            0.0
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn params_follow_kind() {
        for kind in ModelKind::ALL {
            assert_eq!(SimParams::for_kind(kind).kind(), kind);
        }
    }

    #[test]
    fn fhn_seeds_one_source() {
        assert_eq!(SimParams::for_kind(ModelKind::FitzHughNagumo).shared.sources, 1);
        assert_eq!(SimParams::for_kind(ModelKind::GrayScott).shared.sources, 5);
    }

    #[test]
    fn gravity_trigger_scales_by_factor() {
        let mut p = SimParams::for_kind(ModelKind::GrayScott);
        assert_eq!(p.shared.gravity, 0.0);
        p.set_gravity_force(true);
        assert_eq!(p.shared.gravity, p.shared.gravity_factor);
        p.set_gravity_force(false);
        assert_eq!(p.shared.gravity, 0.0);
    }
}
