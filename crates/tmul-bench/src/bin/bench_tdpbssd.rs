//! Tile multiply-accumulate latency benchmark — reference vs hardware.
//!
//! Times one full 16×16×64 `TDPBSSD` call (16,384 MACs) per iteration. The
//! destination is re-zeroed outside the timed region so every sample runs
//! from the same state.
//!
//! Usage:
//!   cargo run --release --bin bench_tdpbssd
//!   cargo run --release --bin bench_tdpbssd -- --iterations 100000

use anyhow::Result;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::time::Instant;
use tracing_subscriber::EnvFilter;

use tmul_driver::buffer;
use tmul_driver::prelude::*;

const DEFAULT_ITERATIONS: usize = 10_000;
const WARMUP: usize = 100;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("warn".parse()?))
        .init();

    let args: Vec<String> = std::env::args().collect();
    let iterations = parse_arg(&args, "--iterations", DEFAULT_ITERATIONS).max(1);

    let shape = presets::FULL_TILE;
    let config = presets::FULL_TILE_CONFIG;

    println!("TDPBSSD latency benchmark");
    println!("=========================");
    println!("Shape          : {shape}  ({} MACs per call)", shape.macs());
    println!("Iterations     : {iterations}");
    println!();

    let mut rng = StdRng::seed_from_u64(1);
    let a: Vec<i8> = (0..shape.a_len()).map(|_| rng.gen()).collect();
    let b: Vec<i8> = (0..shape.b_len()).map(|_| rng.gen()).collect();

    let reference = ReferenceBackend::new();
    let ref_stats = measure(&reference, &a, &b, &config, iterations)?;
    ref_stats.print(BackendType::Reference, shape);

    match select_backend(BackendSelection::Hardware) {
        Ok(hw) => {
            let hw_stats = measure(hw.as_ref(), &a, &b, &config, iterations)?;
            hw_stats.print(BackendType::Hardware, shape);
            println!("Speedup (mean) : {:.1}×", ref_stats.mean / hw_stats.mean);
        }
        Err(e) => println!("Hardware backend unavailable: {e}"),
    }

    Ok(())
}

struct Stats {
    mean: f64,
    min: f64,
    p50: f64,
    p99: f64,
}

impl Stats {
    fn print(&self, backend: BackendType, shape: GemmShape) {
        let gops = shape.macs() as f64 * 2.0 / self.mean / 1e3;
        println!("{backend}");
        println!("  mean : {:.3} µs  ({gops:.2} GOP/s)", self.mean);
        println!("  min  : {:.3} µs", self.min);
        println!("  p50  : {:.3} µs", self.p50);
        println!("  p99  : {:.3} µs", self.p99);
        println!();
    }
}

fn measure(
    backend: &dyn TileMultiplyAccumulate,
    a: &[i8],
    b: &[i8],
    config: &TileConfig,
    iterations: usize,
) -> Result<Stats> {
    let shape = config.shape();
    let mut c = vec![0u32; shape.c_len()];

    for _ in 0..WARMUP {
        backend.multiply_accumulate(&mut c, a, b, config)?;
    }

    let mut latencies_us = Vec::with_capacity(iterations);
    for _ in 0..iterations {
        buffer::zero(&mut c, shape.m, shape.n)?;
        let t0 = Instant::now();
        backend.multiply_accumulate(&mut c, a, b, config)?;
        latencies_us.push(t0.elapsed().as_secs_f64() * 1e6);
    }

    latencies_us.sort_by(f64::total_cmp);
    Ok(Stats {
        mean: latencies_us.iter().sum::<f64>() / iterations as f64,
        min: latencies_us[0],
        p50: latencies_us[iterations / 2],
        p99: latencies_us[(iterations as f64 * 0.99) as usize],
    })
}

fn parse_arg(args: &[String], flag: &str, default: usize) -> usize {
    args.windows(2)
        .find(|w| w[0] == flag)
        .and_then(|w| w[1].parse().ok())
        .unwrap_or(default)
}
