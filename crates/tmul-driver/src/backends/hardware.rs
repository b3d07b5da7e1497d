// SPDX-License-Identifier: AGPL-3.0-only

//! AMX hardware backend
//!
//! Runs `TDPBSSD` on the tile unit. Each call is self-contained:
//!
//! ```text
//! LDTILECFG   config block (64 B, palette 1)
//! TILELOADD   tmm0 ← A        stride K
//! TILELOADD   tmm1 ← B'       stride 4N   (B' = grouped B, see crate::pack)
//! TILELOADD   tmm2 ← C        stride 4N
//! TDPBSSD     tmm2 += tmm0 · tmm1
//! TILESTORED  C ← tmm2        stride 4N
//! TILERELEASE
//! ```
//!
//! Tile registers are never assumed to survive between calls, so the
//! configuration passed in is always the one executed.

use tmul_tile::TileConfig;
use tracing::{debug, trace};

use crate::backend::{check_buffers, BackendType, TileMultiplyAccumulate};
use crate::capabilities::Capabilities;
use crate::error::{Result, TmulError};
use crate::setup::{request_tile_permission, TilePermit};

/// AMX tile unit backend.
///
/// Holds the [`TilePermit`] of the thread that built it, which also keeps the
/// backend on that thread.
#[derive(Debug)]
pub struct HardwareBackend {
    caps: Capabilities,
    _permit: TilePermit,
}

impl HardwareBackend {
    /// Build a backend from an existing permit.
    ///
    /// # Errors
    ///
    /// Returns [`TmulError::BackendUnavailable`] if the CPU lacks AMX-INT8 or
    /// reports no tile palette.
    pub fn new(permit: TilePermit) -> Result<Self> {
        let caps = Capabilities::detect();
        if !caps.supports_tdpbssd() {
            return Err(TmulError::backend_unavailable(
                BackendType::Hardware,
                "CPU does not support TDPBSSD (AMX-TILE + AMX-INT8 + OS tile state)",
            ));
        }
        if caps.palette.is_none() {
            return Err(TmulError::backend_unavailable(
                BackendType::Hardware,
                "CPUID leaf 0x1D reports no palette 1",
            ));
        }
        debug!(
            mask = permit.granted_mask(),
            palette = ?caps.palette,
            "Hardware backend ready"
        );
        Ok(Self {
            caps,
            _permit: permit,
        })
    }

    /// Request tile permission for this thread and build a backend.
    ///
    /// # Errors
    ///
    /// Returns error if permission is refused or the CPU lacks `TDPBSSD`.
    pub fn init() -> Result<Self> {
        Self::new(request_tile_permission()?)
    }
}

impl TileMultiplyAccumulate for HardwareBackend {
    fn multiply_accumulate(
        &self,
        dst: &mut [u32],
        a: &[i8],
        b: &[i8],
        config: &TileConfig,
    ) -> Result<()> {
        self.caps.check_config(config)?;
        check_buffers(dst, a, b, config)?;
        trace!(shape = %config.shape(), "hardware multiply-accumulate");
        execute(dst, a, b, config)
    }

    fn capabilities(&self) -> &Capabilities {
        &self.caps
    }

    fn backend_type(&self) -> BackendType {
        BackendType::Hardware
    }
}

#[cfg(target_arch = "x86_64")]
fn execute(dst: &mut [u32], a: &[i8], b: &[i8], config: &TileConfig) -> Result<()> {
    use tmul_tile::TileConfigBlock;

    use crate::isa::{self, TileSession};
    use crate::pack::pack_b;

    let shape = config.shape();
    let packed = pack_b(b, shape.k, shape.n);
    let block = TileConfigBlock::from(config);
    let a_stride = shape.k;
    let c_stride = shape.n * 4;

    // SAFETY: a HardwareBackend only exists with a TilePermit for this
    // thread, and TileConfig can only hold configurations the palette
    // accepts (checked again against CPUID above). Each buffer covers
    // rows × stride bytes of its tile (check_buffers), and tmm2 is stored
    // back into the buffer it was loaded from.
    unsafe {
        let _session = TileSession::begin(&block);
        isa::load_a(a.as_ptr().cast(), a_stride);
        isa::load_b(packed.as_ptr().cast(), c_stride);
        isa::load_c(dst.as_ptr().cast(), c_stride);
        isa::dpbssd();
        isa::store_c(dst.as_mut_ptr().cast(), c_stride);
    }
    Ok(())
}

#[cfg(not(target_arch = "x86_64"))]
fn execute(_dst: &mut [u32], _a: &[i8], _b: &[i8], _config: &TileConfig) -> Result<()> {
    Err(TmulError::UnsupportedPlatform {
        platform: "tile instructions require x86_64",
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::reference;
    use tmul_tile::{presets, GemmShape};

    fn hardware() -> Option<HardwareBackend> {
        match HardwareBackend::init() {
            Ok(hw) => Some(hw),
            Err(e) => {
                println!("Skipping hardware test: {e}");
                None
            }
        }
    }

    #[test]
    fn full_tile_of_twos_gives_256() {
        let Some(hw) = hardware() else { return };
        let shape = presets::FULL_TILE;
        let mut c = vec![0u32; shape.c_len()];
        hw.multiply_accumulate(
            &mut c,
            &vec![2; shape.a_len()],
            &vec![2; shape.b_len()],
            &presets::FULL_TILE_CONFIG,
        )
        .unwrap();
        assert!(c.iter().all(|&v| v == 256));
    }

    #[test]
    fn matches_reference_on_non_uniform_rectangle() {
        let Some(hw) = hardware() else { return };
        let shape = GemmShape::new(5, 3, 12);
        let config = TileConfig::for_shape(shape).unwrap();
        #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
        let a: Vec<i8> = (0..shape.a_len()).map(|i| (i * 37 % 256) as u8 as i8).collect();
        #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
        let b: Vec<i8> = (0..shape.b_len()).map(|i| (i * 91 % 256) as u8 as i8).collect();

        let mut expected = vec![7u32; shape.c_len()];
        reference::multiply_accumulate(&mut expected, &a, &b, shape);
        let mut actual = vec![7u32; shape.c_len()];
        hw.multiply_accumulate(&mut actual, &a, &b, &config).unwrap();
        assert_eq!(actual, expected);
    }
}
