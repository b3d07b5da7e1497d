//! Backend abstraction for tile multiply-accumulate
//!
//! Provides one interface over the AMX hardware path and the scalar
//! reference so tests, benchmarks and the CLI never name a concrete backend.

use std::fmt::{self, Debug};
use std::str::FromStr;

use tmul_tile::TileConfig;

use crate::capabilities::Capabilities;
use crate::error::{Result, TmulError};

/// Environment variable consulted by [`BackendSelection::from_env`].
pub const BACKEND_ENV: &str = "TMUL_BACKEND";

/// Tile multiply-accumulate: `dst[i][j] += Σ_k a[i][k] · b[k][j]`
///
/// Shapes come from the [`TileConfig`] (`M = A.rows`, `K = A.row_bytes`,
/// `N = C.row_bytes / 4`). Buffers are row-major: `a` is `M × K`, `b` is
/// `K × N`, `dst` is `M × N`. The destination is accumulated into, never
/// overwritten, and wraps modulo 2^32.
///
/// Not `Send`: the hardware backend is bound to the thread that was granted
/// tile permission.
pub trait TileMultiplyAccumulate: Debug {
    /// Accumulate `a × b` into `dst`.
    ///
    /// The configuration is re-read on every call.
    ///
    /// # Errors
    ///
    /// Returns error if a buffer is shorter than its tile or the
    /// configuration exceeds what the backend supports.
    fn multiply_accumulate(&self, dst: &mut [u32], a: &[i8], b: &[i8], config: &TileConfig)
        -> Result<()>;

    /// Capabilities the backend runs with
    fn capabilities(&self) -> &Capabilities;

    /// Backend type for logging and reports
    fn backend_type(&self) -> BackendType;
}

/// Check the three buffers cover the tiles `config` describes.
///
/// # Errors
///
/// Returns [`TmulError::BufferTooSmall`] naming the first short operand.
pub fn check_buffers(dst: &[u32], a: &[i8], b: &[i8], config: &TileConfig) -> Result<()> {
    let shape = config.shape();
    TmulError::check_len("source A", a.len(), shape.a_len())?;
    TmulError::check_len("source B", b.len(), shape.b_len())?;
    TmulError::check_len("destination", dst.len(), shape.c_len())
}

/// Backend type identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendType {
    /// AMX tile unit (`TDPBSSD`)
    Hardware,

    /// Scalar reference, no special hardware
    Reference,
}

impl fmt::Display for BackendType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Hardware => write!(f, "Hardware (AMX-INT8)"),
            Self::Reference => write!(f, "Reference (scalar)"),
        }
    }
}

/// Backend selection strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BackendSelection {
    /// Hardware when available, reference otherwise
    #[default]
    Auto,

    /// Force the AMX backend
    Hardware,

    /// Force the scalar reference
    Reference,
}

impl BackendSelection {
    /// Read the selection from `TMUL_BACKEND`, defaulting to `Auto`.
    ///
    /// # Errors
    ///
    /// Returns [`TmulError::InvalidSelection`] if the variable is set to an
    /// unknown value.
    pub fn from_env() -> Result<Self> {
        match std::env::var(BACKEND_ENV) {
            Ok(value) => value.parse(),
            Err(_) => Ok(Self::Auto),
        }
    }
}

impl FromStr for BackendSelection {
    type Err = TmulError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "auto" | "" => Ok(Self::Auto),
            "hardware" | "hw" | "amx" => Ok(Self::Hardware),
            "reference" | "ref" | "sw" | "software" => Ok(Self::Reference),
            other => Err(TmulError::InvalidSelection {
                value: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for BackendSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Auto => write!(f, "auto"),
            Self::Hardware => write!(f, "hardware"),
            Self::Reference => write!(f, "reference"),
        }
    }
}

/// Select a backend based on availability and requirements
///
/// `Hardware` and `Auto` request tile permission for the calling thread; the
/// returned backend must stay on that thread.
///
/// # Errors
///
/// Returns error if `Hardware` was forced and the tile unit is unavailable.
pub fn select_backend(selection: BackendSelection) -> Result<Box<dyn TileMultiplyAccumulate>> {
    use crate::backends::hardware::HardwareBackend;
    use crate::backends::reference::ReferenceBackend;

    match selection {
        BackendSelection::Auto => match HardwareBackend::init() {
            Ok(backend) => {
                tracing::info!("Using {} backend", backend.backend_type());
                Ok(Box::new(backend))
            }
            Err(e) => {
                tracing::info!("Tile hardware unavailable ({e}), using reference backend");
                Ok(Box::new(ReferenceBackend::new()))
            }
        },

        BackendSelection::Hardware => {
            HardwareBackend::init().map(|b| Box::new(b) as Box<dyn TileMultiplyAccumulate>)
        }

        BackendSelection::Reference => Ok(Box::new(ReferenceBackend::new())),
    }
}
