//! Tile data permission
//!
//! Linux keeps the 8 KiB tile data state out of every thread's signal frame
//! until the process asks for it with
//! `arch_prctl(ARCH_REQ_XCOMP_PERM, XFEATURE_XTILEDATA)`. Executing a tile
//! instruction before that raises `SIGILL`.
//!
//! [`request_tile_permission`] performs the request once per thread and
//! returns a [`TilePermit`]. The permit is the only way to build a
//! [`crate::backends::HardwareBackend`], and it cannot leave the thread that
//! obtained it.

use std::cell::Cell;
use std::marker::PhantomData;

use tracing::{debug, info, warn};

use crate::capabilities::Capabilities;
use crate::error::{Result, TmulError};

/// Bit of XTILEDATA in the xcomp permission mask.
pub const XFEATURE_XTILEDATA: u32 = 18;

/// Bit of XTILECFG in the xcomp permission mask.
pub const XFEATURE_XTILECFG: u32 = 17;

thread_local! {
    static GRANTED_MASK: Cell<Option<u64>> = const { Cell::new(None) };
}

/// Proof that tile data use was granted to the current thread.
///
/// `!Send` and `!Sync`: a worker thread must request its own permit.
#[derive(Debug, Clone)]
pub struct TilePermit {
    granted_mask: u64,
    _thread_bound: PhantomData<*const ()>,
}

impl TilePermit {
    /// Feature mask reported by the kernel when the permit was issued.
    pub const fn granted_mask(&self) -> u64 {
        self.granted_mask
    }
}

/// Request tile data permission for the calling thread.
///
/// Repeated calls on a thread that already holds permission return a new
/// permit without another syscall.
///
/// # Errors
///
/// Returns an error if the CPU lacks AMX-TILE, the platform is not Linux on
/// x86_64, or the kernel refuses the request.
pub fn request_tile_permission() -> Result<TilePermit> {
    if let Some(mask) = GRANTED_MASK.with(Cell::get) {
        debug!("Tile data permission already held (mask {mask:#x})");
        return Ok(permit(mask));
    }

    let caps = Capabilities::detect();
    if !caps.amx_tile {
        return Err(TmulError::unsupported_cpu("CPUID does not report AMX-TILE"));
    }
    if !caps.os_tile_state {
        return Err(TmulError::unsupported_cpu(
            "XCR0 does not enable XTILECFG/XTILEDATA (kernel too old?)",
        ));
    }

    match sys::request_xtiledata() {
        Ok(()) => {
            let mask = sys::permitted_features()?;
            info!(
                tid = rustix::thread::gettid().as_raw_nonzero().get(),
                "TILE DATA USE SET - OK (permitted mask {mask:#x})"
            );
            GRANTED_MASK.with(|g| g.set(Some(mask)));
            Ok(permit(mask))
        }
        Err(e) => {
            warn!("Failed to request XFEATURE_XTILEDATA: {e}");
            Err(e)
        }
    }
}

/// Whether the kernel currently permits tile data for this process.
///
/// # Errors
///
/// Returns an error if the permission mask cannot be queried.
pub fn tile_data_permitted() -> Result<bool> {
    Ok(sys::permitted_features()? & (1 << XFEATURE_XTILEDATA) != 0)
}

/// Permitted xcomp feature mask (`ARCH_GET_XCOMP_PERM`).
///
/// # Errors
///
/// Returns an error if the query fails or the platform has no such call.
pub fn permitted_features() -> Result<u64> {
    sys::permitted_features()
}

const fn permit(granted_mask: u64) -> TilePermit {
    TilePermit {
        granted_mask,
        _thread_bound: PhantomData,
    }
}

#[cfg(all(target_os = "linux", target_arch = "x86_64"))]
mod sys {
    use super::XFEATURE_XTILEDATA;
    use crate::error::{Result, TmulError};

    const ARCH_GET_XCOMP_PERM: libc::c_ulong = 0x1022;
    const ARCH_REQ_XCOMP_PERM: libc::c_ulong = 0x1023;

    pub(super) fn request_xtiledata() -> Result<()> {
        // SAFETY: arch_prctl(ARCH_REQ_XCOMP_PERM) takes a feature number by
        // value and touches no user memory. Redundant requests succeed.
        let ret = unsafe {
            libc::syscall(
                libc::SYS_arch_prctl,
                ARCH_REQ_XCOMP_PERM,
                libc::c_ulong::from(XFEATURE_XTILEDATA),
            )
        };
        if ret != 0 {
            return Err(TmulError::permission_denied(format!(
                "arch_prctl(ARCH_REQ_XCOMP_PERM): {}",
                std::io::Error::last_os_error()
            )));
        }
        Ok(())
    }

    pub(super) fn permitted_features() -> Result<u64> {
        let mut mask: u64 = 0;
        // SAFETY: ARCH_GET_XCOMP_PERM writes one u64 through the pointer,
        // which refers to a live local.
        let ret = unsafe { libc::syscall(libc::SYS_arch_prctl, ARCH_GET_XCOMP_PERM, &raw mut mask) };
        if ret != 0 {
            return Err(TmulError::permission_denied(format!(
                "arch_prctl(ARCH_GET_XCOMP_PERM): {}",
                std::io::Error::last_os_error()
            )));
        }
        Ok(mask)
    }
}

#[cfg(not(all(target_os = "linux", target_arch = "x86_64")))]
mod sys {
    use crate::error::{Result, TmulError};

    const PLATFORM: &str = "tile permission requires Linux on x86_64";

    pub(super) fn request_xtiledata() -> Result<()> {
        Err(TmulError::UnsupportedPlatform { platform: PLATFORM })
    }

    pub(super) fn permitted_features() -> Result<u64> {
        Err(TmulError::UnsupportedPlatform { platform: PLATFORM })
    }
}
