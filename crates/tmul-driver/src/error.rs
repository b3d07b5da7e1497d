//! Error types for tile driver operations

use thiserror::Error;
use tmul_tile::TileError;

use crate::backend::BackendType;

/// Result type alias for driver operations
pub type Result<T> = std::result::Result<T, TmulError>;

/// Errors that can occur during tile driver operations
///
/// Invoking the hardware without permission is not represented here: a
/// hardware backend cannot be built without a [`crate::TilePermit`].
#[derive(Debug, Error)]
pub enum TmulError {
    /// Tile configuration rejected by the model
    #[error("Invalid tile configuration: {source}")]
    Tile {
        /// Underlying validation error
        #[from]
        source: TileError,
    },

    /// Buffer shorter than the tile it backs
    #[error("Buffer {operand} too small: {len} elements, need {required}")]
    BufferTooSmall {
        /// Which operand
        operand: &'static str,
        /// Actual length
        len: usize,
        /// Required length
        required: usize,
    },

    /// CPU lacks the tile instructions
    #[error("Unsupported CPU: {reason}")]
    UnsupportedCpu {
        /// What is missing
        reason: String,
    },

    /// Kernel refused tile data permission
    #[error("Tile data permission denied: {reason}")]
    PermissionDenied {
        /// Reason for failure
        reason: String,
    },

    /// Platform has no way to request tile permission
    #[error("Tile hardware not supported on this platform ({platform})")]
    UnsupportedPlatform {
        /// Target description
        platform: &'static str,
    },

    /// Requested backend cannot be constructed
    #[error("{backend} backend unavailable: {reason}")]
    BackendUnavailable {
        /// Backend that was requested
        backend: BackendType,
        /// Reason for failure
        reason: String,
    },

    /// Unparseable backend selection string
    #[error("Unknown backend selection '{value}' (expected auto, hardware or reference)")]
    InvalidSelection {
        /// Value that failed to parse
        value: String,
    },
}

impl TmulError {
    /// Create a buffer too small error
    pub fn buffer_too_small(operand: &'static str, len: usize, required: usize) -> Self {
        Self::BufferTooSmall { operand, len, required }
    }

    /// Create an unsupported CPU error
    pub fn unsupported_cpu(reason: impl Into<String>) -> Self {
        Self::UnsupportedCpu {
            reason: reason.into(),
        }
    }

    /// Create a permission denied error
    pub fn permission_denied(reason: impl Into<String>) -> Self {
        Self::PermissionDenied {
            reason: reason.into(),
        }
    }

    /// Create a backend unavailable error
    pub fn backend_unavailable(backend: BackendType, reason: impl Into<String>) -> Self {
        Self::BackendUnavailable {
            backend,
            reason: reason.into(),
        }
    }

    /// Ensure `len >= required`, naming the operand otherwise
    ///
    /// # Errors
    ///
    /// Returns [`TmulError::BufferTooSmall`] when the buffer is short.
    pub fn check_len(operand: &'static str, len: usize, required: usize) -> Result<()> {
        if len < required {
            return Err(Self::buffer_too_small(operand, len, required));
        }
        Ok(())
    }

    /// Ensure a `rows × cols` extent fits in `len`, returning the extent
    ///
    /// An extent that overflows `usize` is reported as `usize::MAX`.
    ///
    /// # Errors
    ///
    /// Returns [`TmulError::BufferTooSmall`] when the buffer is short.
    pub fn check_extent(
        operand: &'static str,
        len: usize,
        rows: usize,
        cols: usize,
    ) -> Result<usize> {
        let required = rows.checked_mul(cols).unwrap_or(usize::MAX);
        Self::check_len(operand, len, required)?;
        Ok(required)
    }
}
