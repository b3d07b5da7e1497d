//! Tile palettes and their limits.
//!
//! A palette selects the tile-shape profile the unit runs with. Palette 0 is
//! the init state (tiles disabled, tile data zeroed); palette 1 is the only
//! compute palette defined so far.
//!
//! ## Palette 1 (Intel SDM Vol. 1, ch. 18)
//!
//! ```text
//! total tile bytes   8192   (8 names × 1 KiB)
//! bytes per tile     1024
//! bytes per row        64
//! tile names            8   (tmm0..tmm7)
//! max rows             16
//! ```

/// Palette id of the compute palette modelled by this crate.
pub const PALETTE_1: u8 = 1;

/// Number of tile slots addressable by a configuration.
pub const TILE_SLOTS: usize = 8;

/// Maximum rows per tile in palette 1.
pub const MAX_ROWS: u8 = 16;

/// Maximum bytes per tile row in palette 1.
pub const MAX_ROW_BYTES: u16 = 64;

/// Width of one accumulator element in bytes (`u32`).
pub const ACC_ELEMENT_BYTES: u16 = 4;

/// Number of source bytes one accumulator lane consumes per step.
///
/// `TDPBSSD` multiplies four adjacent byte pairs per 32-bit lane, so the
/// source-A row width and the source-B row count are tied by this factor.
pub const GROUP: usize = 4;

/// Geometry of one palette.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    /// Palette id as written into the configuration block.
    pub id: u8,
    /// Total tile storage across all names.
    pub total_tile_bytes: u16,
    /// Storage per tile.
    pub bytes_per_tile: u16,
    /// Maximum bytes per row.
    pub bytes_per_row: u16,
    /// Number of tile names (registers).
    pub max_names: u16,
    /// Maximum rows per tile.
    pub max_rows: u16,
}

impl Palette {
    /// Palette 1 as documented.
    pub const PALETTE_1: Self = Self {
        id: PALETTE_1,
        total_tile_bytes: 8192,
        bytes_per_tile: 1024,
        bytes_per_row: MAX_ROW_BYTES,
        max_names: TILE_SLOTS as u16,
        max_rows: MAX_ROWS as u16,
    };

    /// Whether a tile of `rows × row_bytes` fits this palette.
    #[must_use]
    pub const fn fits(&self, rows: u8, row_bytes: u16) -> bool {
        (rows as u16) <= self.max_rows && row_bytes <= self.bytes_per_row
    }

    /// Largest `u32` accumulator column count a tile can hold.
    #[must_use]
    pub const fn max_acc_cols(&self) -> u16 {
        self.bytes_per_row / ACC_ELEMENT_BYTES
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn palette_1_geometry() {
        let p = Palette::PALETTE_1;
        assert_eq!(p.max_names * p.bytes_per_tile, p.total_tile_bytes);
        assert_eq!(p.max_rows * p.bytes_per_row, p.bytes_per_tile);
        assert_eq!(p.max_acc_cols(), 16);
    }

    #[test]
    fn fits_respects_both_limits() {
        let p = Palette::PALETTE_1;
        assert!(p.fits(16, 64));
        assert!(!p.fits(17, 64));
        assert!(!p.fits(16, 65));
    }
}
