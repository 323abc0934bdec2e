//! Reaction-diffusion simulation passes.
//!
//! Three chemical models (Gray-Scott, FitzHugh-Nagumo, Schnakenberg) share
//! one numerical scaffold: a 7-point Laplacian over the volumetric field,
//! a model-specific local reaction term, optional wind/gravity drift, and
//! a hard clamp of both concentrations to [0,1]. Each sub-step reads the
//! current buffer and writes the alternate one through the tiled
//! write-pass machinery of `morphogen-field`.
//!
//! # Invariants
//! - After every sub-step, u and v are within [0,1] in every cell.
//! - A paused step is an identity copy: the flip still happens, the values
//!   do not change.
//! - Model parameters are a tagged variant; switching models replaces the
//!   whole parameter set (and the field) rather than migrating values.

mod injector;
mod params;
mod pass;
mod shaders;
mod simulation;
mod stepper;

pub use injector::SourceInjector;
pub use params::{
    FitzHughNagumoParams, GrayScottParams, ModelParams, SchnakenbergParams, SharedParams,
    SimParams,
};
pub use shaders::{simulation_shader, source_shader};
pub use simulation::{CLEAR_COLOR, Simulation};
pub use stepper::Stepper;
