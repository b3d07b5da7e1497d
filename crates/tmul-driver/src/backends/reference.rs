// SPDX-License-Identifier: AGPL-3.0-only

//! Scalar reference backend
//!
//! Implements [`TileMultiplyAccumulate`] with a plain triple loop over the
//! row-major operands. It is the oracle the hardware backend is checked
//! against, and the fallback when no tile unit is present.
//!
//! ## Arithmetic model
//!
//! ```text
//! acc   = Σ_k i64(a[i][k]) · i64(b[k][j])      exact, |acc| ≤ 64·2^14
//! c[i][j] = c[i][j] +wrap (acc as u32)           modulo 2^32
//! ```
//!
//! The accumulator is reinterpreted as two's-complement bits, so a negative
//! dot product lowers the destination exactly as the signed hardware
//! accumulator would.

use tmul_tile::{GemmShape, TileConfig};
use tracing::trace;

use crate::backend::{check_buffers, BackendType, TileMultiplyAccumulate};
use crate::capabilities::Capabilities;
use crate::error::Result;

/// `dst[i][j] += Σ_k a[i][k] · b[k][j]` for row-major `M × K`, `K × N`, `M × N`.
///
/// Elements of `dst` beyond `M × N` are left untouched.
///
/// # Panics
///
/// Panics if any buffer is shorter than its operand in `shape`.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)] // modulo 2^32 by definition
pub fn multiply_accumulate(dst: &mut [u32], a: &[i8], b: &[i8], shape: GemmShape) {
    let GemmShape { m, n, k } = shape;
    assert!(a.len() >= shape.a_len(), "A has {} elements, need {}", a.len(), shape.a_len());
    assert!(b.len() >= shape.b_len(), "B has {} elements, need {}", b.len(), shape.b_len());
    assert!(
        dst.len() >= shape.c_len(),
        "C has {} elements, need {}",
        dst.len(),
        shape.c_len()
    );

    for i in 0..m {
        let a_row = &a[i * k..(i + 1) * k];
        for j in 0..n {
            let acc: i64 = a_row
                .iter()
                .enumerate()
                .map(|(p, &av)| i64::from(av) * i64::from(b[p * n + j]))
                .sum();
            let c = &mut dst[i * n + j];
            *c = c.wrapping_add(acc as u32);
        }
    }
}

/// Scalar reference backend.
#[derive(Debug, Clone)]
pub struct ReferenceBackend {
    caps: Capabilities,
}

impl ReferenceBackend {
    /// Create a reference backend with palette-1 limits.
    pub const fn new() -> Self {
        Self {
            caps: Capabilities::reference(),
        }
    }
}

impl Default for ReferenceBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl TileMultiplyAccumulate for ReferenceBackend {
    fn multiply_accumulate(
        &self,
        dst: &mut [u32],
        a: &[i8],
        b: &[i8],
        config: &TileConfig,
    ) -> Result<()> {
        self.caps.check_config(config)?;
        check_buffers(dst, a, b, config)?;
        let shape = config.shape();
        trace!(%shape, "reference multiply-accumulate");
        multiply_accumulate(dst, a, b, shape);
        Ok(())
    }

    fn capabilities(&self) -> &Capabilities {
        &self.caps
    }

    fn backend_type(&self) -> BackendType {
        BackendType::Reference
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TmulError;
    use tmul_tile::presets;

    #[test]
    fn full_tile_of_twos_gives_256() {
        let shape = presets::FULL_TILE;
        let a = vec![2i8; shape.a_len()];
        let b = vec![2i8; shape.b_len()];
        let mut c = vec![0u32; shape.c_len()];
        multiply_accumulate(&mut c, &a, &b, shape);
        assert!(c.iter().all(|&v| v == 256));
    }

    #[test]
    fn second_call_accumulates() {
        let shape = GemmShape::new(2, 3, 4);
        let a = vec![1i8; shape.a_len()];
        let b = vec![3i8; shape.b_len()];
        let mut c = vec![5u32; shape.c_len()];
        multiply_accumulate(&mut c, &a, &b, shape);
        multiply_accumulate(&mut c, &a, &b, shape);
        assert_eq!(c, vec![5 + 2 * 12; 6]);
    }

    #[test]
    fn negative_products_wrap_below_zero() {
        let shape = GemmShape::new(1, 1, 4);
        let mut c = [0u32];
        multiply_accumulate(&mut c, &[-1, -1, -1, -1], &[1, 1, 1, 1], shape);
        assert_eq!(c[0], 0u32.wrapping_sub(4));
    }

    #[test]
    fn extreme_bytes_are_exact() {
        let shape = GemmShape::new(1, 1, 64);
        let mut c = [0u32];
        multiply_accumulate(&mut c, &[-128; 64], &[-128; 64], shape);
        assert_eq!(c[0], 64 * 16384);
    }

    #[test]
    fn destination_wraps_modulo_2_32() {
        let shape = GemmShape::new(1, 1, 4);
        let mut c = [u32::MAX - 1];
        multiply_accumulate(&mut c, &[1; 4], &[1; 4], shape);
        assert_eq!(c[0], 2);
    }

    #[test]
    fn trailing_destination_untouched() {
        let shape = GemmShape::new(1, 2, 4);
        let mut c = [0u32, 0, 77];
        multiply_accumulate(&mut c, &[1; 4], &[1; 8], shape);
        assert_eq!(c, [4, 4, 77]);
    }

    #[test]
    fn backend_rejects_short_destination() {
        let backend = ReferenceBackend::new();
        let shape = presets::FULL_TILE;
        let mut c = vec![0u32; shape.c_len() - 1];
        let err = backend
            .multiply_accumulate(
                &mut c,
                &vec![0; shape.a_len()],
                &vec![0; shape.b_len()],
                &presets::FULL_TILE_CONFIG,
            )
            .unwrap_err();
        assert!(matches!(err, TmulError::BufferTooSmall { operand: "destination", .. }));
    }
}
