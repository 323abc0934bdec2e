//! Shared vocabulary types for the morphogen simulator.
//!
//! # Invariants
//! - Grid extents are fixed at allocation time; depth never changes after.
//! - Input state is plain data: the host writes it from window events and
//!   applies it once per frame. No component reads input globally.

pub mod input;
pub mod types;

pub use input::InputState;
pub use types::{BoundaryMode, GridExtent, ModelKind};
