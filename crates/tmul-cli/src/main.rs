//! `tmul` — command-line interface for the AMX tile multiply-accumulate driver.
//!
//! ```text
//! USAGE:
//!   tmul caps                         Tile unit capabilities from CPUID / XCR0
//!   tmul enable                       Request tile data permission, print status
//!   tmul show [-m M] [-n N] [-k K]    Tile configuration and its 64-byte block
//!   tmul verify [--backend B] [...]   Compare a backend against the reference
//! ```

use anyhow::{bail, Result};
use clap::{Args, Parser, Subcommand};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing_subscriber::EnvFilter;

use tmul_driver::buffer;
use tmul_driver::prelude::*;
use tmul_driver::{check_parity, request_tile_permission, setup};
use tmul_tile::TileConfigBlock;

#[derive(Parser)]
#[command(name = "tmul", about = "AMX tile multiply-accumulate CLI", version)]
struct Cli {
    #[command(subcommand)]
    command: Cmd,
}

#[derive(Subcommand)]
enum Cmd {
    /// Print tile unit capabilities discovered from CPUID and XCR0.
    Caps,
    /// Request tile data permission for this process and report the result.
    Enable,
    /// Print a tile configuration and its encoded LDTILECFG block.
    Show(ShapeArgs),
    /// Run one multiply-accumulate on a backend and compare it with the reference.
    Verify {
        /// Backend to verify: auto, hardware or reference (default: $TMUL_BACKEND or auto).
        #[arg(long)]
        backend: Option<BackendSelection>,
        /// Use random operands instead of the all-2 pattern.
        #[arg(long)]
        random: bool,
        /// Seed for --random.
        #[arg(long, default_value_t = 42)]
        seed: u64,
        /// Print the destination tile.
        #[arg(long)]
        print: bool,
        #[command(flatten)]
        shape: ShapeArgs,
    },
}

#[derive(Args)]
struct ShapeArgs {
    /// Rows of A and C.
    #[arg(short, long, default_value_t = 16)]
    m: usize,
    /// Columns of B and C.
    #[arg(short, long, default_value_t = 16)]
    n: usize,
    /// Inner dimension (multiple of 4).
    #[arg(short, long, default_value_t = 64)]
    k: usize,
}

impl ShapeArgs {
    fn config(&self) -> Result<TileConfig> {
        Ok(TileConfig::for_shape(GemmShape::new(self.m, self.n, self.k))?)
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Cmd::Caps => cmd_caps(),
        Cmd::Enable => cmd_enable()?,
        Cmd::Show(shape) => cmd_show(&shape)?,
        Cmd::Verify {
            backend,
            random,
            seed,
            print,
            shape,
        } => cmd_verify(backend, random.then_some(seed), print, &shape)?,
    }

    Ok(())
}

fn yes_no(v: bool) -> &'static str {
    if v { "yes" } else { "no" }
}

fn cmd_caps() {
    let c = Capabilities::detect();

    println!("AMX-TILE     : {}", yes_no(c.amx_tile));
    println!("AMX-INT8     : {}", yes_no(c.amx_int8));
    println!("AMX-BF16     : {}", yes_no(c.amx_bf16));
    println!("OS tile state: {}", yes_no(c.os_tile_state));

    match c.palette {
        Some(p) => {
            println!(
                "Palette {}    : {} names, {} rows × {} B, {} B/tile, {} B total",
                p.id, p.max_names, p.max_rows, p.bytes_per_row, p.bytes_per_tile, p.total_tile_bytes
            );
        }
        None => println!("Palette      : not reported"),
    }
    match c.tmul {
        Some(t) => println!("TMUL limits  : K ≤ {} rows, N ≤ {} B", t.max_k, t.max_n),
        None => println!("TMUL limits  : not reported"),
    }
    println!("TDPBSSD      : {}", yes_no(c.supports_tdpbssd()));
}

fn cmd_enable() -> Result<()> {
    if let Ok(mask) = setup::permitted_features() {
        println!("Permitted mask (before): {mask:#x}");
    }

    let permit = request_tile_permission()?;
    println!("TILE DATA USE SET - OK");
    println!("Permitted mask (after) : {:#x}", permit.granted_mask());
    let mask = setup::permitted_features()?;
    println!(
        "XTILECFG permitted     : {}",
        yes_no(mask & (1 << setup::XFEATURE_XTILECFG) != 0)
    );
    println!("XTILEDATA permitted    : {}", yes_no(setup::tile_data_permitted()?));
    Ok(())
}

fn cmd_show(shape: &ShapeArgs) -> Result<()> {
    let config = shape.config()?;
    let block = TileConfigBlock::from(&config);

    println!("{config}");
    println!("Shape: {}", config.shape());
    println!();
    println!("LDTILECFG block:");
    for (i, line) in block.as_bytes().chunks(16).enumerate() {
        let hex: Vec<String> = line.iter().map(|b| format!("{b:02x}")).collect();
        println!("  {:02x}: {}", i * 16, hex.join(" "));
    }

    let decoded = TileConfigBlock::decode(block.as_bytes())?;
    if decoded != config {
        bail!("encoded block decodes to a different configuration: {decoded}");
    }
    Ok(())
}

fn cmd_verify(
    selection: Option<BackendSelection>,
    seed: Option<u64>,
    print: bool,
    shape: &ShapeArgs,
) -> Result<()> {
    let selection = match selection {
        Some(s) => s,
        None => BackendSelection::from_env()?,
    };
    let config = shape.config()?;
    let gemm = config.shape();
    tracing::debug!(%selection, shape = %gemm, ?seed, "verify");

    let (a, b) = match seed {
        Some(seed) => {
            let mut rng = StdRng::seed_from_u64(seed);
            let a: Vec<i8> = (0..gemm.a_len()).map(|_| rng.gen()).collect();
            let b: Vec<i8> = (0..gemm.b_len()).map(|_| rng.gen()).collect();
            (a, b)
        }
        None => (vec![2i8; gemm.a_len()], vec![2i8; gemm.b_len()]),
    };

    let oracle = ReferenceBackend::new();
    let candidate = select_backend(selection)?;
    println!("Backend: {}", candidate.backend_type());
    println!("Shape  : {gemm}");
    if candidate.backend_type() == BackendType::Reference {
        println!("(no tile hardware selected: checking the reference against itself)");
    }

    let report = check_parity(&oracle, candidate.as_ref(), &a, &b, &config)?;

    if print {
        let mut c = vec![0u32; gemm.c_len()];
        candidate.multiply_accumulate(&mut c, &a, &b, &config)?;
        print!("{}", buffer::format_grid(&c, gemm.m, gemm.n)?);
    }

    println!("{report}");
    if !report.is_exact() {
        bail!("{} mismatching elements", report.mismatch_count);
    }
    Ok(())
}
