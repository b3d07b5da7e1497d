//! Flat row-major buffers backing tiles

use std::fmt::Display;

use crate::error::{Result, TmulError};

/// Set the first `rows × cols` elements of `buf` to `value`.
///
/// # Errors
///
/// Returns [`TmulError::BufferTooSmall`] if `rows × cols` exceeds `buf.len()`.
pub fn fill<T: Copy>(buf: &mut [T], rows: usize, cols: usize, value: T) -> Result<()> {
    let extent = TmulError::check_extent("fill target", buf.len(), rows, cols)?;
    buf[..extent].fill(value);
    Ok(())
}

/// Zero the first `rows × cols` accumulators.
///
/// # Errors
///
/// Returns [`TmulError::BufferTooSmall`] if `rows × cols` exceeds `buf.len()`.
pub fn zero(buf: &mut [u32], rows: usize, cols: usize) -> Result<()> {
    fill(buf, rows, cols, 0)
}

/// Render `rows × cols` elements as a whitespace-separated grid.
///
/// Columns are right-aligned to the widest value so tiles stay readable in
/// logs. An empty extent renders as an empty string.
///
/// # Errors
///
/// Returns [`TmulError::BufferTooSmall`] if `rows × cols` exceeds `buf.len()`.
pub fn format_grid<T: Display>(buf: &[T], rows: usize, cols: usize) -> Result<String> {
    let extent = TmulError::check_extent("grid source", buf.len(), rows, cols)?;
    if extent == 0 {
        return Ok(String::new());
    }

    let cells: Vec<String> = buf[..extent].iter().map(ToString::to_string).collect();
    let width = cells.iter().map(String::len).max().unwrap_or(0);

    let mut out = String::with_capacity(extent * (width + 1));
    for row in cells.chunks(cols) {
        let padded: Vec<String> = row.iter().map(|cell| format!("{cell:>width$}")).collect();
        out.push_str(&padded.join(" "));
        out.push('\n');
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fill_touches_only_extent() {
        let mut buf = [9i8; 10];
        fill(&mut buf, 2, 4, 2).unwrap();
        assert_eq!(buf, [2, 2, 2, 2, 2, 2, 2, 2, 9, 9]);
    }

    #[test]
    fn fill_rejects_oversized_extent() {
        let mut buf = [0u32; 4];
        let err = fill(&mut buf, 2, 3, 1).unwrap_err();
        assert!(matches!(err, TmulError::BufferTooSmall { len: 4, required: 6, .. }));
    }

    #[test]
    fn overflowing_extent_is_an_error() {
        let mut buf = [0u32; 4];
        let err = fill(&mut buf, 1 << (usize::BITS - 1), 2, 7).unwrap_err();
        assert!(matches!(err, TmulError::BufferTooSmall { len: 4, required: usize::MAX, .. }));
        assert_eq!(buf, [0; 4]);
        assert!(format_grid(&buf, usize::MAX, 2).is_err());
    }

    #[test]
    fn grid_is_right_aligned() {
        let buf = [1u32, 256, 3, 4];
        assert_eq!(format_grid(&buf, 2, 2).unwrap(), "  1 256\n  3   4\n");
    }

    #[test]
    fn grid_handles_negative_bytes() {
        let buf = [-2i8, 2, 0, -128];
        assert_eq!(format_grid(&buf, 1, 4).unwrap(), "  -2    2    0 -128\n");
    }

    #[test]
    fn grid_rejects_short_buffer() {
        assert!(format_grid(&[0u32; 3], 2, 2).is_err());
    }
}
