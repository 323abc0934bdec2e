/// Per-frame input record, owned by the host and passed into camera/model
/// updates. Replaces ad-hoc mutable flags scattered across event handlers.
///
/// Rotation deltas accumulate from pointer drags and decay exponentially
/// each frame, giving the damped-orbit feel; zoom accumulates
/// multiplicatively and resets to 1 once applied.
#[derive(Debug, Clone, Copy)]
pub struct InputState {
    /// Pending azimuth delta in radians.
    pub dtheta: f32,
    /// Pending polar delta in radians.
    pub dphi: f32,
    /// Pending multiplicative zoom factor (1.0 = none).
    pub zoom: f32,
    /// Per-frame decay applied to the rotation deltas.
    pub decay: f32,
    /// Whether the gravity trigger key is held.
    pub gravity_held: bool,
    pub dragging: bool,
}

impl Default for InputState {
    fn default() -> Self {
        Self {
            dtheta: 0.0,
            dphi: 0.0,
            zoom: 1.0,
            decay: 0.8,
            gravity_held: false,
            dragging: false,
        }
    }
}

impl InputState {
    /// Fold a pointer drag (pixel deltas over the window size) into the
    /// pending rotation.
    pub fn apply_drag(&mut self, dx: f32, dy: f32, width: f32, height: f32) {
        self.dtheta = -std::f32::consts::PI * dx / width.max(1.0);
        self.dphi = -std::f32::consts::PI * dy / height.max(1.0);
    }

    /// Take the pending zoom factor, resetting it to neutral.
    pub fn take_zoom(&mut self) -> f32 {
        std::mem::replace(&mut self.zoom, 1.0)
    }

    /// Decay the rotation deltas after they have been applied for a frame.
    pub fn decay_rotation(&mut self) {
        self.dtheta *= self.decay;
        self.dphi *= self.decay;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decay_shrinks_rotation() {
        let mut input = InputState {
            dtheta: 1.0,
            dphi: -1.0,
            ..Default::default()
        };
        input.decay_rotation();
        assert!(input.dtheta.abs() < 1.0);
        assert!(input.dphi.abs() < 1.0);
        for _ in 0..100 {
            input.decay_rotation();
        }
        assert!(input.dtheta.abs() < 1e-6);
    }

    #[test]
    fn drag_maps_to_radians() {
        let mut input = InputState::default();
        input.apply_drag(100.0, 0.0, 200.0, 200.0);
        assert!((input.dtheta + std::f32::consts::PI / 2.0).abs() < 1e-6);
        assert_eq!(input.dphi, 0.0);
    }

    #[test]
    fn take_zoom_resets() {
        let mut input = InputState {
            zoom: 1.03,
            ..Default::default()
        };
        assert!((input.take_zoom() - 1.03).abs() < 1e-6);
        assert_eq!(input.zoom, 1.0);
    }
}
