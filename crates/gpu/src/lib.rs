//! GPU plumbing shared by every pass: context acquisition with capability
//! checks, static geometry, and the draw dispatcher.
//!
//! # Invariants
//! - All capability decisions (target cap, filterable sampling) happen once
//!   at context creation; passes only consume the derived values.
//! - Every draw in the system goes through [`DrawCall`]; there is no other
//!   place a render pass is recorded, apart from attachment-clear passes.

mod context;
mod dispatch;
mod geometry;

pub use context::{GpuContext, GpuError, color_target_cap};
pub use dispatch::{DrawCall, PassOptions, clear_targets};
pub use geometry::{CubeVertex, Geometry, PlaneVertex};
