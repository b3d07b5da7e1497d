//! Tile unit capability discovery
//!
//! Everything the driver relies on is read from CPUID / XCR0 at runtime;
//! the palette-1 model in `tmul-tile` is only the expectation it is checked
//! against.
//!
//! ```text
//! CPUID.(7,0):EDX   bit 22 AMX-BF16   bit 24 AMX-TILE   bit 25 AMX-INT8
//! CPUID.(1,0):ECX   bit 27 OSXSAVE
//! XCR0              bit 17 XTILECFG   bit 18 XTILEDATA
//! CPUID.(1D,1)      EAX total/tile bytes, EBX row bytes/names, ECX rows
//! CPUID.(1E,0)      EBX tmul_maxk[7:0], tmul_maxn[23:8]
//! ```

use tmul_tile::{Palette, TileConfig, TileSlot};
use tracing::debug;

use crate::error::{Result, TmulError};

/// Tile unit capabilities discovered at runtime
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    /// CPU reports AMX-TILE (tile registers, load/store, config)
    pub amx_tile: bool,

    /// CPU reports AMX-INT8 (`TDPBSSD` and friends)
    pub amx_int8: bool,

    /// CPU reports AMX-BF16
    pub amx_bf16: bool,

    /// OS has enabled XTILECFG and XTILEDATA in XCR0
    pub os_tile_state: bool,

    /// Palette 1 geometry as reported by CPUID leaf 0x1D
    pub palette: Option<Palette>,

    /// TMUL limits as reported by CPUID leaf 0x1E
    pub tmul: Option<TmulLimits>,
}

/// Limits of the tile multiply unit itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TmulLimits {
    /// Maximum rows of source B (`K / 4`)
    pub max_k: u8,
    /// Maximum bytes per row of source B / destination
    pub max_n: u16,
}

impl Capabilities {
    /// Probe the current CPU.
    pub fn detect() -> Self {
        #[cfg(target_arch = "x86_64")]
        let caps = detect_x86_64();
        #[cfg(not(target_arch = "x86_64"))]
        let caps = Self::none();

        debug!(
            "Tile capabilities: tile={} int8={} bf16={} os_state={} palette={:?} tmul={:?}",
            caps.amx_tile, caps.amx_int8, caps.amx_bf16, caps.os_tile_state, caps.palette, caps.tmul
        );
        caps
    }

    /// No tile hardware at all.
    pub const fn none() -> Self {
        Self {
            amx_tile: false,
            amx_int8: false,
            amx_bf16: false,
            os_tile_state: false,
            palette: None,
            tmul: None,
        }
    }

    /// Capabilities the scalar reference emulates: palette 1, no hardware.
    pub const fn reference() -> Self {
        Self {
            palette: Some(Palette::PALETTE_1),
            ..Self::none()
        }
    }

    /// Whether `TDPBSSD` can run once permission is granted.
    pub const fn supports_tdpbssd(&self) -> bool {
        self.amx_tile && self.amx_int8 && self.os_tile_state
    }

    /// Check a configuration against the discovered palette.
    ///
    /// # Errors
    ///
    /// Returns [`TmulError::UnsupportedCpu`] if no palette was discovered or a
    /// participating tile does not fit it.
    pub fn check_config(&self, cfg: &TileConfig) -> Result<()> {
        let palette = self
            .palette
            .ok_or_else(|| TmulError::unsupported_cpu("no tile palette reported"))?;
        for role in TileSlot::ALL {
            let (rows, row_bytes) = cfg.slot(role);
            if !palette.fits(rows, row_bytes) {
                return Err(TmulError::unsupported_cpu(format!(
                    "{} tile {rows}x{row_bytes}B exceeds palette {}x{}B",
                    role.role(),
                    palette.max_rows,
                    palette.bytes_per_row
                )));
            }
        }
        if let Some(limits) = self.tmul {
            let (b_rows, b_row_bytes) = cfg.slot(TileSlot::SourceB);
            if b_rows > limits.max_k || b_row_bytes > limits.max_n {
                return Err(TmulError::unsupported_cpu(format!(
                    "source B {b_rows}x{b_row_bytes}B exceeds TMUL limits {}x{}B",
                    limits.max_k, limits.max_n
                )));
            }
        }
        Ok(())
    }
}

#[cfg(target_arch = "x86_64")]
const XCR0_XTILE_MASK: u64 = (1 << 17) | (1 << 18);

#[cfg(target_arch = "x86_64")]
#[allow(clippy::cast_possible_truncation)] // CPUID fields are extracted by mask
#[allow(unused_unsafe)] // CPUID intrinsics are safe on newer toolchains
fn detect_x86_64() -> Capabilities {
    use std::arch::x86_64::{__cpuid_count, __get_cpuid_max};

    // SAFETY: CPUID is part of the x86_64 baseline.
    let (max_leaf, _) = unsafe { __get_cpuid_max(0) };
    if max_leaf < 7 {
        return Capabilities::none();
    }

    // SAFETY: leaves 1 and 7 are within max_leaf.
    let (leaf1, leaf7) = unsafe { (__cpuid_count(1, 0), __cpuid_count(7, 0)) };
    let amx_bf16 = leaf7.edx & (1 << 22) != 0;
    let amx_tile = leaf7.edx & (1 << 24) != 0;
    let amx_int8 = leaf7.edx & (1 << 25) != 0;

    let osxsave = leaf1.ecx & (1 << 27) != 0;
    // SAFETY: XGETBV is available when CPUID reports OSXSAVE.
    let os_tile_state = osxsave && unsafe { read_xcr0() } & XCR0_XTILE_MASK == XCR0_XTILE_MASK;

    let palette = if amx_tile && max_leaf >= 0x1D {
        // SAFETY: leaf 0x1D is within max_leaf.
        let max_palette = unsafe { __cpuid_count(0x1D, 0) }.eax;
        (max_palette >= 1).then(|| {
            // SAFETY: subleaf 1 exists when max_palette >= 1.
            let p = unsafe { __cpuid_count(0x1D, 1) };
            Palette {
                id: tmul_tile::palette::PALETTE_1,
                total_tile_bytes: p.eax as u16,
                bytes_per_tile: (p.eax >> 16) as u16,
                bytes_per_row: p.ebx as u16,
                max_names: (p.ebx >> 16) as u16,
                max_rows: p.ecx as u16,
            }
        })
    } else {
        None
    };

    let tmul = if amx_tile && max_leaf >= 0x1E {
        // SAFETY: leaf 0x1E is within max_leaf.
        let t = unsafe { __cpuid_count(0x1E, 0) };
        Some(TmulLimits {
            max_k: t.ebx as u8,
            max_n: (t.ebx >> 8) as u16,
        })
    } else {
        None
    };

    Capabilities {
        amx_tile,
        amx_int8,
        amx_bf16,
        os_tile_state,
        palette,
        tmul,
    }
}

#[cfg(target_arch = "x86_64")]
#[target_feature(enable = "xsave")]
unsafe fn read_xcr0() -> u64 {
    std::arch::x86_64::_xgetbv(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tmul_tile::presets;

    #[test]
    fn reference_accepts_full_tile() {
        let caps = Capabilities::reference();
        assert!(!caps.supports_tdpbssd());
        assert!(caps.check_config(&presets::FULL_TILE_CONFIG).is_ok());
    }

    #[test]
    fn no_palette_rejects_everything() {
        let caps = Capabilities::none();
        assert!(caps.check_config(&presets::FULL_TILE_CONFIG).is_err());
    }

    #[test]
    fn smaller_palette_rejects_full_tile() {
        let caps = Capabilities {
            palette: Some(Palette {
                max_rows: 8,
                ..Palette::PALETTE_1
            }),
            ..Capabilities::reference()
        };
        let err = caps.check_config(&presets::FULL_TILE_CONFIG).unwrap_err();
        assert!(matches!(err, TmulError::UnsupportedCpu { .. }));
    }

    #[test]
    fn tmul_limits_checked() {
        let caps = Capabilities {
            tmul: Some(TmulLimits { max_k: 8, max_n: 64 }),
            ..Capabilities::reference()
        };
        assert!(caps.check_config(&presets::FULL_TILE_CONFIG).is_err());
    }

    #[test]
    fn detect_is_consistent() {
        let caps = Capabilities::detect();
        println!("Detected: {caps:?}");
        if caps.supports_tdpbssd() {
            assert!(caps.amx_tile && caps.amx_int8);
        }
        // Detection is a pure CPUID read
        assert_eq!(caps, Capabilities::detect());
    }
}
