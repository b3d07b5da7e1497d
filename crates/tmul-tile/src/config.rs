//! Tile configuration descriptor and the GEMM shape it implies.
//!
//! A [`TileConfig`] declares, per slot, how many rows a tile has and how
//! many bytes each row holds. The element type is *not* stored: it follows
//! from the role the slot plays in `TDPBSSD`.
//!
//! ```text
//! slot 0  source A     M rows × K bytes          (i8, row-major)
//! slot 1  source B     K/4 rows × 4N bytes       (i8, 4-byte groups)
//! slot 2  destination  M rows × 4N bytes         (u32 accumulators)
//!
//! C[i][j] += Σ_k A[i][k] · B[k][j]     i < M, j < N, k < K
//! ```
//!
//! The three tiles must agree: A.rows = C.rows, B.row_bytes = C.row_bytes,
//! A.row_bytes / 4 = B.rows. A configuration that breaks any of these is
//! rejected when it is built, so one never reaches `LDTILECFG`.

use std::fmt;

use crate::error::{Result, TileError};
use crate::palette::{
    Palette, ACC_ELEMENT_BYTES, GROUP, MAX_ROWS, MAX_ROW_BYTES, PALETTE_1, TILE_SLOTS,
};

/// Operand role of a tile slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TileSlot {
    /// First source operand (signed bytes).
    SourceA,
    /// Second source operand (signed bytes, 4-byte groups).
    SourceB,
    /// Accumulator (`u32`).
    Destination,
}

impl TileSlot {
    /// All roles, in slot order.
    pub const ALL: [Self; 3] = [Self::SourceA, Self::SourceB, Self::Destination];

    /// Slot index (tile register number) for this role.
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::SourceA => 0,
            Self::SourceB => 1,
            Self::Destination => 2,
        }
    }

    /// Short name used in diagnostics.
    #[must_use]
    pub const fn role(self) -> &'static str {
        match self {
            Self::SourceA => "source A",
            Self::SourceB => "source B",
            Self::Destination => "destination",
        }
    }
}

/// Dimensions of one tile multiply-accumulate, in elements.
///
/// `m × k` source A, `k × n` source B, `m × n` destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GemmShape {
    /// Destination rows.
    pub m: usize,
    /// Destination columns.
    pub n: usize,
    /// Inner (reduction) dimension.
    pub k: usize,
}

impl GemmShape {
    /// Create a shape from explicit dimensions.
    #[must_use]
    pub const fn new(m: usize, n: usize, k: usize) -> Self {
        Self { m, n, k }
    }

    /// Shape used by harnesses that only carry `rows` and `row_bytes`.
    ///
    /// Infers the destination column count from the row count (`n = rows`).
    /// That only holds for square output tiles; prefer [`GemmShape::new`].
    #[must_use]
    pub const fn square(rows: usize, row_bytes: usize) -> Self {
        Self { m: rows, n: rows, k: row_bytes }
    }

    /// Elements in source A.
    #[must_use]
    pub const fn a_len(&self) -> usize {
        self.m * self.k
    }

    /// Elements in source B.
    #[must_use]
    pub const fn b_len(&self) -> usize {
        self.k * self.n
    }

    /// Elements in the destination.
    #[must_use]
    pub const fn c_len(&self) -> usize {
        self.m * self.n
    }

    /// Multiply-accumulate operations per call.
    #[must_use]
    pub const fn macs(&self) -> usize {
        self.m * self.n * self.k
    }

    /// Check the shape fits one palette-1 tile triple.
    ///
    /// # Errors
    ///
    /// Returns [`TileError::ShapeOutOfRange`] naming the first violated limit.
    pub fn check_tile_limits(&self) -> Result<()> {
        let out_of_range = |reason| TileError::ShapeOutOfRange {
            m: self.m,
            n: self.n,
            k: self.k,
            reason,
        };
        if self.m == 0 || self.n == 0 || self.k == 0 {
            return Err(out_of_range("dimensions must be non-zero"));
        }
        if self.m > usize::from(MAX_ROWS) {
            return Err(out_of_range("m exceeds 16 rows"));
        }
        if self.k > usize::from(MAX_ROW_BYTES) {
            return Err(out_of_range("k exceeds 64 bytes per row"));
        }
        if self.k % GROUP != 0 {
            return Err(out_of_range("k must be a multiple of 4"));
        }
        if self.n > usize::from(Palette::PALETTE_1.max_acc_cols()) {
            return Err(out_of_range("n exceeds 16 accumulator columns"));
        }
        Ok(())
    }
}

impl fmt::Display for GemmShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}x{}", self.m, self.n, self.k)
    }
}

/// Tile configuration descriptor.
///
/// Immutable once built; construct with [`TileConfig::new`] or
/// [`TileConfig::for_shape`], both of which validate the geometry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TileConfig {
    palette_id: u8,
    start_row: u8,
    tile_row_bytes: [u16; TILE_SLOTS],
    tile_rows: [u8; TILE_SLOTS],
}

impl TileConfig {
    /// Build a configuration from raw per-slot geometry.
    ///
    /// # Errors
    ///
    /// Returns a [`TileError`] if the palette is unsupported, `start_row` is
    /// non-zero, a slot exceeds palette limits or is half-configured, or the
    /// three participating slots do not form a valid multiply.
    pub fn new(
        palette_id: u8,
        start_row: u8,
        tile_row_bytes: [u16; TILE_SLOTS],
        tile_rows: [u8; TILE_SLOTS],
    ) -> Result<Self> {
        let cfg = Self {
            palette_id,
            start_row,
            tile_row_bytes,
            tile_rows,
        };
        cfg.validate()?;
        Ok(cfg)
    }

    /// Build the configuration that computes `shape` in slots 0–2.
    ///
    /// # Errors
    ///
    /// Returns [`TileError::ShapeOutOfRange`] if the shape does not fit one
    /// tile triple.
    #[allow(clippy::cast_possible_truncation)] // bounded by check_tile_limits
    pub fn for_shape(shape: GemmShape) -> Result<Self> {
        shape.check_tile_limits()?;
        let mut row_bytes = [0u16; TILE_SLOTS];
        let mut rows = [0u8; TILE_SLOTS];

        let acc_row_bytes = (shape.n as u16) * ACC_ELEMENT_BYTES;
        row_bytes[TileSlot::SourceA.index()] = shape.k as u16;
        rows[TileSlot::SourceA.index()] = shape.m as u8;
        row_bytes[TileSlot::SourceB.index()] = acc_row_bytes;
        rows[TileSlot::SourceB.index()] = (shape.k / GROUP) as u8;
        row_bytes[TileSlot::Destination.index()] = acc_row_bytes;
        rows[TileSlot::Destination.index()] = shape.m as u8;

        Self::new(PALETTE_1, 0, row_bytes, rows)
    }

    /// Active palette.
    #[must_use]
    pub const fn palette_id(&self) -> u8 {
        self.palette_id
    }

    /// Restart row (always 0 for configurations built here).
    #[must_use]
    pub const fn start_row(&self) -> u8 {
        self.start_row
    }

    /// Row widths in bytes for all slots.
    #[must_use]
    pub const fn tile_row_bytes(&self) -> &[u16; TILE_SLOTS] {
        &self.tile_row_bytes
    }

    /// Row counts for all slots.
    #[must_use]
    pub const fn tile_rows(&self) -> &[u8; TILE_SLOTS] {
        &self.tile_rows
    }

    /// `(rows, row_bytes)` of the slot playing `role`.
    #[must_use]
    pub const fn slot(&self, role: TileSlot) -> (u8, u16) {
        let i = role.index();
        (self.tile_rows[i], self.tile_row_bytes[i])
    }

    /// The multiply this configuration performs.
    #[must_use]
    pub fn shape(&self) -> GemmShape {
        let (a_rows, a_row_bytes) = self.slot(TileSlot::SourceA);
        let (_, c_row_bytes) = self.slot(TileSlot::Destination);
        GemmShape {
            m: usize::from(a_rows),
            n: usize::from(c_row_bytes / ACC_ELEMENT_BYTES),
            k: usize::from(a_row_bytes),
        }
    }

    fn validate(&self) -> Result<()> {
        if self.palette_id != PALETTE_1 {
            return Err(TileError::UnsupportedPalette { id: self.palette_id });
        }
        if self.start_row != 0 {
            return Err(TileError::NonZeroStartRow { start_row: self.start_row });
        }

        for slot in 0..TILE_SLOTS {
            let rows = self.tile_rows[slot];
            let row_bytes = self.tile_row_bytes[slot];
            if rows > MAX_ROWS {
                return Err(TileError::TooManyRows { slot, rows, max: MAX_ROWS });
            }
            if row_bytes > MAX_ROW_BYTES {
                return Err(TileError::RowTooWide { slot, row_bytes, max: MAX_ROW_BYTES });
            }
            if (rows == 0) != (row_bytes == 0) {
                return Err(TileError::HalfConfiguredSlot { slot, rows, row_bytes });
            }
        }

        for role in TileSlot::ALL {
            let (rows, row_bytes) = self.slot(role);
            if rows == 0 {
                return Err(TileError::EmptySlot { slot: role.index(), role: role.role() });
            }
            if row_bytes % 4 != 0 {
                return Err(TileError::MisalignedRow { slot: role.index(), row_bytes });
            }
        }

        let (a_rows, a_row_bytes) = self.slot(TileSlot::SourceA);
        let (b_rows, b_row_bytes) = self.slot(TileSlot::SourceB);
        let (c_rows, c_row_bytes) = self.slot(TileSlot::Destination);

        if a_rows != c_rows {
            return Err(TileError::RowMismatch { a_rows, c_rows });
        }
        if b_row_bytes != c_row_bytes {
            return Err(TileError::ColumnMismatch { b_row_bytes, c_row_bytes });
        }
        #[allow(clippy::cast_possible_truncation)]
        let groups = a_row_bytes / GROUP as u16;
        if groups != u16::from(b_rows) {
            return Err(TileError::InnerDimensionMismatch {
                a_cols: a_row_bytes,
                groups,
                b_rows,
            });
        }
        Ok(())
    }
}

impl fmt::Display for TileConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "palette {}  start_row {}  shape {}", self.palette_id, self.start_row, self.shape())?;
        for slot in 0..TILE_SLOTS {
            if self.tile_rows[slot] == 0 {
                continue;
            }
            let role = TileSlot::ALL
                .iter()
                .find(|r| r.index() == slot)
                .map_or("unused", |r| r.role());
            writeln!(
                f,
                "  tmm{slot}  {:>2} rows × {:>2} bytes  ({role})",
                self.tile_rows[slot], self.tile_row_bytes[slot]
            )?;
        }
        Ok(())
    }
}

/// Known-good configurations.
pub mod presets {
    use super::{GemmShape, TileConfig};
    use crate::palette::PALETTE_1;

    /// Full palette-1 tiles: 16×64 sources, 16×16 accumulators, K = 64.
    pub const FULL_TILE: GemmShape = GemmShape { m: 16, n: 16, k: 64 };

    /// Configuration for [`FULL_TILE`]: every participating slot 16 rows × 64 bytes.
    pub const FULL_TILE_CONFIG: TileConfig = TileConfig {
        palette_id: PALETTE_1,
        start_row: 0,
        tile_row_bytes: [64, 64, 64, 0, 0, 0, 0, 0],
        tile_rows: [16, 16, 16, 0, 0, 0, 0, 0],
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(row_bytes: [u16; 3], rows: [u8; 3]) -> Result<TileConfig> {
        let mut rb = [0u16; TILE_SLOTS];
        let mut r = [0u8; TILE_SLOTS];
        rb[..3].copy_from_slice(&row_bytes);
        r[..3].copy_from_slice(&rows);
        TileConfig::new(PALETTE_1, 0, rb, r)
    }

    #[test]
    fn full_tile_preset_matches_for_shape() {
        let built = TileConfig::for_shape(presets::FULL_TILE).unwrap();
        assert_eq!(built, presets::FULL_TILE_CONFIG);
        assert_eq!(built.shape(), presets::FULL_TILE);
    }

    #[test]
    fn shape_round_trips_through_config() {
        for shape in [
            GemmShape::new(1, 1, 4),
            GemmShape::new(3, 5, 12),
            GemmShape::new(16, 7, 64),
            GemmShape::new(9, 16, 32),
        ] {
            let cfg = TileConfig::for_shape(shape).unwrap();
            assert_eq!(cfg.shape(), shape, "shape {shape}");
        }
    }

    #[test]
    fn inner_dimension_mismatch_rejected() {
        // A: 16×64 → 16 groups, B declares 8 rows.
        let err = raw([64, 64, 64], [16, 8, 16]).unwrap_err();
        assert_eq!(
            err,
            TileError::InnerDimensionMismatch { a_cols: 64, groups: 16, b_rows: 8 }
        );
    }

    #[test]
    fn row_and_column_mismatch_rejected() {
        assert!(matches!(
            raw([64, 64, 64], [16, 16, 8]),
            Err(TileError::RowMismatch { a_rows: 16, c_rows: 8 })
        ));
        assert!(matches!(
            raw([64, 32, 64], [16, 16, 16]),
            Err(TileError::ColumnMismatch { b_row_bytes: 32, c_row_bytes: 64 })
        ));
    }

    #[test]
    fn palette_limits_enforced() {
        assert!(matches!(
            raw([64, 64, 64], [17, 16, 17]),
            Err(TileError::TooManyRows { slot: 0, rows: 17, .. })
        ));
        assert!(matches!(
            raw([128, 64, 64], [16, 16, 16]),
            Err(TileError::RowTooWide { slot: 0, row_bytes: 128, .. })
        ));
    }

    #[test]
    fn empty_and_half_configured_slots_rejected() {
        assert!(matches!(
            raw([64, 0, 64], [16, 0, 16]),
            Err(TileError::EmptySlot { slot: 1, .. })
        ));
        assert!(matches!(
            raw([64, 64, 64], [16, 0, 16]),
            Err(TileError::HalfConfiguredSlot { slot: 1, .. })
        ));
    }

    #[test]
    fn palette_and_start_row_checked() {
        let rb = *presets::FULL_TILE_CONFIG.tile_row_bytes();
        let r = *presets::FULL_TILE_CONFIG.tile_rows();
        assert_eq!(
            TileConfig::new(0, 0, rb, r),
            Err(TileError::UnsupportedPalette { id: 0 })
        );
        assert_eq!(
            TileConfig::new(PALETTE_1, 3, rb, r),
            Err(TileError::NonZeroStartRow { start_row: 3 })
        );
    }

    #[test]
    fn misaligned_source_row_rejected() {
        assert!(matches!(
            raw([62, 64, 64], [16, 16, 16]),
            Err(TileError::MisalignedRow { slot: 0, row_bytes: 62 })
        ));
    }

    #[test]
    fn shape_limits() {
        assert!(GemmShape::new(16, 16, 64).check_tile_limits().is_ok());
        assert!(GemmShape::new(17, 16, 64).check_tile_limits().is_err());
        assert!(GemmShape::new(16, 17, 64).check_tile_limits().is_err());
        assert!(GemmShape::new(16, 16, 66).check_tile_limits().is_err());
        assert!(GemmShape::new(16, 16, 6).check_tile_limits().is_err());
        assert!(GemmShape::new(0, 16, 64).check_tile_limits().is_err());
    }

    #[test]
    fn square_infers_columns_from_rows() {
        let s = GemmShape::square(16, 64);
        assert_eq!(s, presets::FULL_TILE);
        assert_eq!((s.a_len(), s.b_len(), s.c_len()), (1024, 1024, 256));
    }

    #[test]
    fn unused_slots_may_be_configured() {
        let mut rb = *presets::FULL_TILE_CONFIG.tile_row_bytes();
        let mut r = *presets::FULL_TILE_CONFIG.tile_rows();
        rb[3] = 64;
        r[3] = 16;
        let cfg = TileConfig::new(PALETTE_1, 0, rb, r).unwrap();
        assert_eq!(cfg.shape(), presets::FULL_TILE);
    }
}
