//! Source-B repacking for `TDPBSSD`.
//!
//! The instruction reads B as `K/4` rows of `N` four-byte groups: group `j`
//! of row `r` holds `B[4r..4r+4][j]`. Callers hand B over row-major
//! (`K × N`, the layout the reference uses), so the hardware path interleaves
//! it first.
//!
//! ```text
//! row-major B (K×N)             grouped B (K/4 × 4N)
//! b00 b01 .. b0n                b00 b10 b20 b30 | b01 b11 b21 b31 | ..
//! b10 b11 .. b1n        →       b40 b50 b60 b70 | b41 b51 b61 b71 | ..
//! ...
//! ```

use tmul_tile::palette::GROUP;

/// Interleave row-major `K × N` bytes into `K/4` rows of `4N` bytes.
///
/// # Panics
///
/// Panics if `k` is not a multiple of 4 or `b` is shorter than `k * n`.
#[must_use]
pub fn pack_b(b: &[i8], k: usize, n: usize) -> Vec<i8> {
    assert_eq!(k % GROUP, 0, "k={k} must be a multiple of {GROUP}");
    assert!(b.len() >= k * n, "B has {} elements, need {}", b.len(), k * n);

    let mut packed = vec![0i8; k * n];
    for (p, &value) in b[..k * n].iter().enumerate() {
        let (row, col) = (p / n, p % n);
        packed[(row / GROUP) * n * GROUP + col * GROUP + row % GROUP] = value;
    }
    packed
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn groups_four_rows_per_column() {
        // K=4, N=2: column 0 = [0,2,4,6], column 1 = [1,3,5,7]
        let b: Vec<i8> = (0..8).collect();
        assert_eq!(pack_b(&b, 4, 2), vec![0, 2, 4, 6, 1, 3, 5, 7]);
    }

    #[test]
    fn second_group_row_follows_first() {
        // K=8, N=1: two packed rows of one group each
        let b: Vec<i8> = (0..8).collect();
        assert_eq!(pack_b(&b, 8, 1), b);
    }

    #[test]
    fn full_tile_places_every_element_once() {
        #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
        let b: Vec<i8> = (0..64 * 16).map(|i| (i % 251) as i8).collect();
        let packed = pack_b(&b, 64, 16);
        for row in 0..64 {
            for col in 0..16 {
                assert_eq!(packed[(row / 4) * 64 + col * 4 + row % 4], b[row * 16 + col]);
            }
        }
    }

    #[test]
    #[should_panic(expected = "multiple of 4")]
    fn rejects_ragged_k() {
        let _ = pack_b(&[0; 6], 6, 1);
    }
}
