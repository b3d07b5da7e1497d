//! Reference multiply-accumulate semantics
//!
//! Runs everywhere; these are the properties any backend is held to.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tmul_driver::backends::reference::multiply_accumulate;
use tmul_driver::buffer;
use tmul_tile::{presets, GemmShape, TileConfig, TileError};

fn naive(a: &[i8], b: &[i8], shape: GemmShape) -> Vec<u32> {
    let mut c = vec![0u32; shape.c_len()];
    for i in 0..shape.m {
        for j in 0..shape.n {
            let mut acc = 0i32;
            for p in 0..shape.k {
                acc += i32::from(a[i * shape.k + p]) * i32::from(b[p * shape.n + j]);
            }
            c[i * shape.n + j] = acc as u32;
        }
    }
    c
}

fn random(len: usize, rng: &mut StdRng) -> Vec<i8> {
    (0..len).map(|_| rng.gen()).collect()
}

#[test]
fn full_tile_all_twos_is_256_everywhere() {
    let shape = presets::FULL_TILE;
    let mut a = vec![0i8; shape.a_len()];
    let mut b = vec![0i8; shape.b_len()];
    buffer::fill(&mut a, 16, 64, 2).unwrap();
    buffer::fill(&mut b, 64, 16, 2).unwrap();
    let mut c = vec![0u32; shape.c_len()];
    buffer::zero(&mut c, 16, 16).unwrap();

    multiply_accumulate(&mut c, &a, &b, shape);

    assert_eq!(c.len(), 256);
    assert!(c.iter().all(|&v| v == 256));
    let grid = buffer::format_grid(&c, 16, 16).unwrap();
    assert_eq!(grid.lines().count(), 16);
    assert!(grid.lines().all(|l| l.split_whitespace().all(|v| v == "256")));
}

#[test]
fn second_call_is_f_of_f_of_zero() {
    let mut rng = StdRng::seed_from_u64(7);
    let shape = presets::FULL_TILE;
    let a = random(shape.a_len(), &mut rng);
    let b = random(shape.b_len(), &mut rng);

    let mut once = vec![0u32; shape.c_len()];
    multiply_accumulate(&mut once, &a, &b, shape);
    let mut twice = once.clone();
    multiply_accumulate(&mut twice, &a, &b, shape);

    for (o, t) in once.iter().zip(&twice) {
        assert_eq!(*t, o.wrapping_mul(2));
    }
}

#[test]
fn identical_inputs_give_identical_outputs() {
    let mut rng = StdRng::seed_from_u64(11);
    let shape = GemmShape::new(9, 13, 44);
    let a = random(shape.a_len(), &mut rng);
    let b = random(shape.b_len(), &mut rng);
    let mut first = vec![3u32; shape.c_len()];
    let mut second = vec![3u32; shape.c_len()];
    multiply_accumulate(&mut first, &a, &b, shape);
    multiply_accumulate(&mut second, &a, &b, shape);
    assert_eq!(first, second);
}

#[test]
fn accumulation_wraps_past_u32_max() {
    let shape = presets::FULL_TILE;
    let mut c = vec![u32::MAX - 10; shape.c_len()];
    multiply_accumulate(&mut c, &vec![2; shape.a_len()], &vec![2; shape.b_len()], shape);
    assert!(c.iter().all(|&v| v == 245));
}

#[test]
fn non_square_shapes_match_naive_product() {
    let mut rng = StdRng::seed_from_u64(23);
    for _ in 0..50 {
        let shape = GemmShape::new(
            rng.gen_range(1..=16),
            rng.gen_range(1..=16),
            4 * rng.gen_range(1..=16),
        );
        let a = random(shape.a_len(), &mut rng);
        let b = random(shape.b_len(), &mut rng);
        let mut c = vec![0u32; shape.c_len()];
        multiply_accumulate(&mut c, &a, &b, shape);
        assert_eq!(c, naive(&a, &b, shape), "shape {shape}");
    }
}

#[test]
fn square_shape_infers_columns_from_rows() {
    let shape = GemmShape::square(16, 64);
    assert_eq!(shape, presets::FULL_TILE);
}

#[test]
fn inner_dimension_mismatch_is_rejected() {
    // A.colsb / 4 = 16 groups, B only 12 rows
    let err = TileConfig::new(
        1,
        0,
        [64, 64, 64, 0, 0, 0, 0, 0],
        [16, 12, 16, 0, 0, 0, 0, 0],
    )
    .unwrap_err();
    assert_eq!(
        err,
        TileError::InnerDimensionMismatch {
            a_cols: 64,
            groups: 16,
            b_rows: 12,
        }
    );
}

#[test]
fn out_of_range_shape_never_builds_a_config() {
    assert!(TileConfig::for_shape(GemmShape::new(17, 16, 64)).is_err());
    assert!(TileConfig::for_shape(GemmShape::new(16, 17, 64)).is_err());
    assert!(TileConfig::for_shape(GemmShape::new(16, 16, 68)).is_err());
    assert!(TileConfig::for_shape(GemmShape::new(16, 16, 6)).is_err());
}
