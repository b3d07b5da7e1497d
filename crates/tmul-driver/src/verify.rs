//! Parity checking between two backends
//!
//! The reference backend is the oracle; any other backend is a candidate
//! whose destination tile must match it element for element.

use std::fmt;

use tmul_tile::TileConfig;

use crate::backend::TileMultiplyAccumulate;
use crate::error::{Result, TmulError};

/// Mismatches kept in a report; the count covers all of them.
pub const MAX_REPORTED_MISMATCHES: usize = 8;

/// One differing destination element
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Mismatch {
    /// Row index
    pub row: usize,
    /// Column index
    pub col: usize,
    /// Oracle value
    pub expected: u32,
    /// Candidate value
    pub actual: u32,
}

/// Element-wise comparison of two destination tiles
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParityReport {
    /// Rows compared
    pub rows: usize,
    /// Columns compared
    pub cols: usize,
    /// Total number of differing elements
    pub mismatch_count: usize,
    /// First differing elements in row-major order
    pub mismatches: Vec<Mismatch>,
}

impl ParityReport {
    /// True when every compared element matched
    pub const fn is_exact(&self) -> bool {
        self.mismatch_count == 0
    }
}

impl fmt::Display for ParityReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_exact() {
            return write!(f, "{}x{} tile: exact match", self.rows, self.cols);
        }
        write!(
            f,
            "{}x{} tile: {} of {} elements differ",
            self.rows,
            self.cols,
            self.mismatch_count,
            self.rows * self.cols
        )?;
        for m in &self.mismatches {
            write!(f, "\n  [{},{}] expected {} got {}", m.row, m.col, m.expected, m.actual)?;
        }
        Ok(())
    }
}

/// Compare the first `rows × cols` elements of two destination buffers.
///
/// # Errors
///
/// Returns [`TmulError::BufferTooSmall`] if either buffer is short.
pub fn compare(expected: &[u32], actual: &[u32], rows: usize, cols: usize) -> Result<ParityReport> {
    let len = TmulError::check_extent("expected", expected.len(), rows, cols)?;
    TmulError::check_len("actual", actual.len(), len)?;

    let mut report = ParityReport {
        rows,
        cols,
        mismatch_count: 0,
        mismatches: Vec::new(),
    };
    for (p, (&e, &a)) in expected[..len].iter().zip(&actual[..len]).enumerate() {
        if e != a {
            report.mismatch_count += 1;
            if report.mismatches.len() < MAX_REPORTED_MISMATCHES {
                report.mismatches.push(Mismatch {
                    row: p / cols,
                    col: p % cols,
                    expected: e,
                    actual: a,
                });
            }
        }
    }
    Ok(report)
}

/// Run both backends from zeroed destinations and compare the results.
///
/// # Errors
///
/// Returns error if either backend rejects the operands.
pub fn check_parity(
    oracle: &dyn TileMultiplyAccumulate,
    candidate: &dyn TileMultiplyAccumulate,
    a: &[i8],
    b: &[i8],
    config: &TileConfig,
) -> Result<ParityReport> {
    let shape = config.shape();
    let mut expected = vec![0u32; shape.c_len()];
    let mut actual = vec![0u32; shape.c_len()];

    oracle.multiply_accumulate(&mut expected, a, b, config)?;
    candidate.multiply_accumulate(&mut actual, a, b, config)?;

    let report = compare(&expected, &actual, shape.m, shape.n)?;
    tracing::debug!(
        oracle = %oracle.backend_type(),
        candidate = %candidate.backend_type(),
        %shape,
        mismatches = report.mismatch_count,
        "parity check"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::ReferenceBackend;
    use tmul_tile::GemmShape;

    #[test]
    fn identical_buffers_are_exact() {
        let report = compare(&[1, 2, 3, 4], &[1, 2, 3, 4], 2, 2).unwrap();
        assert!(report.is_exact());
        assert_eq!(report.to_string(), "2x2 tile: exact match");
    }

    #[test]
    fn mismatches_carry_coordinates() {
        let report = compare(&[1, 2, 3, 4, 5, 6], &[1, 2, 3, 9, 5, 6], 2, 3).unwrap();
        assert_eq!(report.mismatch_count, 1);
        assert_eq!(
            report.mismatches,
            vec![Mismatch { row: 1, col: 0, expected: 4, actual: 9 }]
        );
    }

    #[test]
    fn report_keeps_first_mismatches_only() {
        let expected = vec![0u32; 64];
        let actual = vec![1u32; 64];
        let report = compare(&expected, &actual, 8, 8).unwrap();
        assert_eq!(report.mismatch_count, 64);
        assert_eq!(report.mismatches.len(), MAX_REPORTED_MISMATCHES);
        assert!(report.to_string().starts_with("8x8 tile: 64 of 64 elements differ"));
    }

    #[test]
    fn overflowing_extent_is_rejected() {
        let err = compare(&[0; 4], &[0; 4], usize::MAX, 2).unwrap_err();
        assert!(matches!(err, TmulError::BufferTooSmall { operand: "expected", .. }));
    }

    #[test]
    fn reference_agrees_with_itself() {
        let shape = GemmShape::new(4, 4, 8);
        let config = TileConfig::for_shape(shape).unwrap();
        let a = vec![-3i8; shape.a_len()];
        let b = vec![5i8; shape.b_len()];
        let r = ReferenceBackend::new();
        assert!(check_parity(&r, &r, &a, &b, &config).unwrap().is_exact());
    }
}
