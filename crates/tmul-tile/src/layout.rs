//! `LDTILECFG` memory image.
//!
//! The instruction reads a 64-byte, 64-byte-aligned block. Only this module
//! knows about the reserved padding; everything else works with
//! [`TileConfig`].
//!
//! ## Layout (Intel SDM Vol. 2, LDTILECFG)
//!
//! | Bytes | Field | Notes |
//! |-------|-------|-------|
//! | 0 | `palette_id` | 0 = init state |
//! | 1 | `start_row` | restart row after an interrupted load/store |
//! | 2–15 | reserved | must be 0 |
//! | 16–31 | `colsb[0..8]` | `u16` LE, bytes per row |
//! | 32–47 | reserved | must be 0 |
//! | 48–55 | `rows[0..8]` | `u8` |
//! | 56–63 | reserved | must be 0 |

use crate::config::TileConfig;
use crate::error::{Result, TileError};
use crate::palette::TILE_SLOTS;

/// Size of the configuration block in bytes.
pub const BLOCK_SIZE: usize = 64;

const PALETTE_OFFSET: usize = 0;
const START_ROW_OFFSET: usize = 1;
const COLSB_OFFSET: usize = 16;
const ROWS_OFFSET: usize = 48;

/// Encoded configuration, ready for `LDTILECFG`.
#[repr(C, align(64))]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TileConfigBlock {
    data: [u8; BLOCK_SIZE],
}

impl TileConfigBlock {
    /// All-zero block (palette 0: releases the tile state when loaded).
    #[must_use]
    pub const fn zeroed() -> Self {
        Self { data: [0u8; BLOCK_SIZE] }
    }

    /// Raw bytes.
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; BLOCK_SIZE] {
        &self.data
    }

    /// Pointer handed to `LDTILECFG`.
    #[must_use]
    pub const fn as_ptr(&self) -> *const u8 {
        self.data.as_ptr()
    }

    /// Decode a block back into a validated configuration.
    ///
    /// # Errors
    ///
    /// Returns [`TileError::ReservedByteSet`] if any padding byte is non-zero,
    /// or any validation error from [`TileConfig::new`].
    pub fn decode(bytes: &[u8; BLOCK_SIZE]) -> Result<TileConfig> {
        let reserved = (2..COLSB_OFFSET)
            .chain(COLSB_OFFSET + 2 * TILE_SLOTS..ROWS_OFFSET)
            .chain(ROWS_OFFSET + TILE_SLOTS..BLOCK_SIZE);
        for offset in reserved {
            if bytes[offset] != 0 {
                return Err(TileError::ReservedByteSet { offset, value: bytes[offset] });
            }
        }

        let mut row_bytes = [0u16; TILE_SLOTS];
        let mut rows = [0u8; TILE_SLOTS];
        for slot in 0..TILE_SLOTS {
            let at = COLSB_OFFSET + 2 * slot;
            row_bytes[slot] = u16::from_le_bytes([bytes[at], bytes[at + 1]]);
            rows[slot] = bytes[ROWS_OFFSET + slot];
        }
        TileConfig::new(bytes[PALETTE_OFFSET], bytes[START_ROW_OFFSET], row_bytes, rows)
    }

    fn set_tile(&mut self, slot: usize, rows: u8, row_bytes: u16) {
        let cb = row_bytes.to_le_bytes();
        self.data[COLSB_OFFSET + 2 * slot] = cb[0];
        self.data[COLSB_OFFSET + 2 * slot + 1] = cb[1];
        self.data[ROWS_OFFSET + slot] = rows;
    }
}

impl From<&TileConfig> for TileConfigBlock {
    fn from(cfg: &TileConfig) -> Self {
        let mut block = Self::zeroed();
        block.data[PALETTE_OFFSET] = cfg.palette_id();
        block.data[START_ROW_OFFSET] = cfg.start_row();
        for slot in 0..TILE_SLOTS {
            block.set_tile(slot, cfg.tile_rows()[slot], cfg.tile_row_bytes()[slot]);
        }
        block
    }
}
