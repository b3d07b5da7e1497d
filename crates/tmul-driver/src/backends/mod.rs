//! Tile multiply-accumulate backends
//!
//! Two backends available:
//! - **Hardware**: `TDPBSSD` on the AMX tile unit (requires a [`crate::TilePermit`])
//! - **Reference**: scalar triple loop, runs everywhere, the oracle for parity checks

pub mod hardware;
pub mod reference;

pub use hardware::HardwareBackend;
pub use reference::ReferenceBackend;
