//! GPU-resident volumetric field storage.
//!
//! The S×S×S field of two coupled concentrations lives in an rgba32float
//! 2D-array texture, one layer per depth slice (x = u, y = v, z/w
//! reserved). Writes are tiled: a pass may bind at most K layer targets at
//! once, so a full-depth write is `ceil(S/K)` passes, each told its
//! starting layer through a per-tile uniform.
//!
//! # Invariants
//! - A pass never reads and writes the same physical field: the
//!   double-buffered store hands out a read field and a write field, and
//!   flips its `current` index only when the write scope commits.
//! - Concentration channels are clamped to [0,1] by every writer; storage
//!   makes no attempt to enforce this after the fact.

mod store;
mod tile;
mod volume;

pub use store::{VolumeStore, WritePass};
pub use tile::{LayerTileMap, TileSpan};
pub use volume::{FIELD_FORMAT, FieldError, VolumeField};
