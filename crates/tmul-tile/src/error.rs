//! Error types for tile configuration

use thiserror::Error;

/// Result type alias for tile model operations
pub type Result<T> = std::result::Result<T, TileError>;

/// Ways a tile configuration can be malformed.
///
/// Every variant corresponds to a configuration the hardware would reject
/// with `#GP` on `LDTILECFG`, or one that would load but compute a
/// shape-mismatched product.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TileError {
    /// Palette id other than the compute palette
    #[error("Unsupported palette {id} (only palette 1 is modelled)")]
    UnsupportedPalette {
        /// Requested palette id
        id: u8,
    },

    /// Non-zero restart row in a fresh configuration
    #[error("start_row must be 0 for a fresh configuration, got {start_row}")]
    NonZeroStartRow {
        /// Requested restart row
        start_row: u8,
    },

    /// Row count above the palette limit
    #[error("Tile {slot}: {rows} rows exceeds palette limit of {max}")]
    TooManyRows {
        /// Slot index
        slot: usize,
        /// Requested rows
        rows: u8,
        /// Palette limit
        max: u8,
    },

    /// Row width above the palette limit
    #[error("Tile {slot}: {row_bytes} bytes per row exceeds palette limit of {max}")]
    RowTooWide {
        /// Slot index
        slot: usize,
        /// Requested row width
        row_bytes: u16,
        /// Palette limit
        max: u16,
    },

    /// Exactly one of rows / row bytes is zero
    #[error("Tile {slot}: rows={rows} and row_bytes={row_bytes} must both be zero or both non-zero")]
    HalfConfiguredSlot {
        /// Slot index
        slot: usize,
        /// Configured rows
        rows: u8,
        /// Configured row width
        row_bytes: u16,
    },

    /// A slot taking part in the multiply is not configured
    #[error("Tile {slot} ({role}) is not configured")]
    EmptySlot {
        /// Slot index
        slot: usize,
        /// Operand role of the slot
        role: &'static str,
    },

    /// Row width not a multiple of the 4-byte group
    #[error("Tile {slot}: row width {row_bytes} is not a multiple of 4 bytes")]
    MisalignedRow {
        /// Slot index
        slot: usize,
        /// Configured row width
        row_bytes: u16,
    },

    /// Source A and destination disagree on M
    #[error("Row mismatch: source A has {a_rows} rows, destination has {c_rows}")]
    RowMismatch {
        /// Rows of source A
        a_rows: u8,
        /// Rows of the destination
        c_rows: u8,
    },

    /// Source B and destination disagree on N
    #[error("Column mismatch: source B rows are {b_row_bytes} bytes, destination rows are {c_row_bytes} bytes")]
    ColumnMismatch {
        /// Row width of source B
        b_row_bytes: u16,
        /// Row width of the destination
        c_row_bytes: u16,
    },

    /// Source A columns do not match source B rows
    #[error("Inner dimension mismatch: source A has {a_cols} columns ({groups} groups of 4), source B has {b_rows} rows")]
    InnerDimensionMismatch {
        /// Columns (bytes) of source A
        a_cols: u16,
        /// `a_cols / 4`
        groups: u16,
        /// Rows of source B
        b_rows: u8,
    },

    /// Shape cannot be expressed as a single tile triple
    #[error("Shape {m}x{n}x{k} does not fit one tile triple: {reason}")]
    ShapeOutOfRange {
        /// Destination rows
        m: usize,
        /// Destination columns
        n: usize,
        /// Inner dimension
        k: usize,
        /// Which limit was hit
        reason: &'static str,
    },

    /// Reserved bytes of an encoded block are not zero
    #[error("Reserved byte {offset} of the configuration block is {value:#04x}, expected 0")]
    ReservedByteSet {
        /// Byte offset in the 64-byte block
        offset: usize,
        /// Value found
        value: u8,
    },
}
