//! Display side of the simulator: the orbit camera and the raycast pass
//! that turns the volumetric field into a shaded image.
//!
//! # Invariants
//! - Rendering never mutates the field; it samples the readable buffer.
//! - The camera applies exactly the deltas it is given; drag decay is the
//!   host's concern.

mod camera;
mod raycast;
mod shaders;

pub use camera::OrbitCamera;
pub use raycast::{RaycastSettings, ShadingMode, VolumeRaycaster};
