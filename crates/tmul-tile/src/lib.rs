// SPDX-License-Identifier: AGPL-3.0-only

//! Silicon model for the x86 tile matrix-multiply unit (AMX TMUL).
//!
//! This crate has **no hardware access** — it is a pure model of the tile
//! unit: palette limits, the tile configuration descriptor, the GEMM shape a
//! configuration implies, and the 64-byte block `LDTILECFG` consumes.
//!
//! Everything here follows the Intel SDM description of palette 1; the
//! driver crate cross-checks it against CPUID at runtime.
//!
//! # Crate organisation
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`palette`] | Palette ids and palette-1 limits (16 rows × 64 bytes, 8 tiles) |
//! | [`config`] | `TileConfig`, slot roles, `GemmShape`, geometry validation, presets |
//! | [`layout`] | `TileConfigBlock` — the ABI-exact `LDTILECFG` memory image |
//! | [`error`] | `TileError` |

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod error;
pub mod layout;
pub mod palette;

pub use config::{presets, GemmShape, TileConfig, TileSlot};
pub use error::{Result, TileError};
pub use layout::TileConfigBlock;
pub use palette::Palette;
