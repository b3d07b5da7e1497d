// SPDX-License-Identifier: AGPL-3.0-only

//! Tile multiply-accumulate driver for Intel AMX.
//!
//! Executes one `TDPBSSD` (signed int8 × signed int8 dot products, summed
//! into a 32-bit accumulator tile) on the AMX tile unit, and provides the
//! scalar reference it is verified against.
//!
//! # Backend hierarchy
//!
//! ```text
//! HardwareBackend  — TDPBSSD on the tile unit (needs AMX-INT8 + tile permission)
//! ReferenceBackend — scalar triple loop (runs everywhere, parity oracle)
//! ```
//!
//! # Quick start
//!
//! ```no_run
//! use tmul_driver::prelude::*;
//!
//! # fn main() -> tmul_driver::Result<()> {
//! let backend = select_backend(BackendSelection::from_env()?)?;
//! let shape = presets::FULL_TILE;
//!
//! let a = vec![2i8; shape.a_len()];
//! let b = vec![2i8; shape.b_len()];
//! let mut c = vec![0u32; shape.c_len()];
//! backend.multiply_accumulate(&mut c, &a, &b, &presets::FULL_TILE_CONFIG)?;
//! assert!(c.iter().all(|&v| v == 256));
//! # Ok(())
//! # }
//! ```
//!
//! # Threading
//!
//! Tile data permission is granted per thread, and a [`HardwareBackend`]
//! carries the [`TilePermit`] of the thread that created it. Neither is
//! `Send`; worker threads select their own backend.

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::doc_markdown)]

mod backend;
pub mod backends;
pub mod buffer;
mod capabilities;
mod error;
#[cfg(target_arch = "x86_64")]
mod isa;
pub mod pack;
pub mod setup;
pub mod verify;

pub use backend::{
    check_buffers, select_backend, BackendSelection, BackendType, TileMultiplyAccumulate,
    BACKEND_ENV,
};
pub use backends::{HardwareBackend, ReferenceBackend};
pub use capabilities::{Capabilities, TmulLimits};
pub use error::{Result, TmulError};
pub use setup::{request_tile_permission, TilePermit};
pub use verify::{check_parity, compare, Mismatch, ParityReport};

/// Commonly used types.
pub mod prelude {
    pub use crate::{
        select_backend, BackendSelection, BackendType, Capabilities, HardwareBackend,
        ParityReport, ReferenceBackend, Result, TileMultiplyAccumulate, TilePermit, TmulError,
    };
    pub use tmul_tile::{presets, GemmShape, TileConfig, TileSlot};
}
