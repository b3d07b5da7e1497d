//! Raw tile instruction encodings
//!
//! The AMX intrinsics are not stable, and the assembler only accepts the
//! mnemonics inside `amx-*` target-feature functions. The handful of
//! instructions the driver needs are therefore emitted as VEX bytes with
//! fixed register operands.
//!
//! Tile register assignment follows the slot roles of `tmul_tile::TileSlot`:
//!
//! ```text
//! tmm0  source A        tileloadd  tmm0, [rax + rcx*1]   c4 e2 7b 4b 04 08
//! tmm1  source B        tileloadd  tmm1, [rax + rcx*1]   c4 e2 7b 4b 0c 08
//! tmm2  destination     tileloadd  tmm2, [rax + rcx*1]   c4 e2 7b 4b 14 08
//!                       tilestored [rax + rcx*1], tmm2   c4 e2 7a 4b 14 08
//!                       tdpbssd    tmm2, tmm0, tmm1      c4 e2 73 5e d0
//!                       ldtilecfg  [rax]                 c4 e2 78 49 00
//!                       tilerelease                      c4 e2 78 49 c0
//! ```
//!
//! # Safety
//!
//! Every function here requires tile data permission on the calling thread
//! and, apart from [`load_config`] and [`release`], a loaded configuration.

#![allow(clippy::inline_always)]

use std::arch::asm;

use tmul_tile::TileConfigBlock;

/// `LDTILECFG [rax]`
#[inline(always)]
pub(crate) unsafe fn load_config(block: &TileConfigBlock) {
    asm!(
        ".byte 0xc4, 0xe2, 0x78, 0x49, 0x00",
        in("rax") block.as_ptr(),
        options(nostack, preserves_flags, readonly),
    );
}

/// `TILELOADD tmm0, [base + stride]`
#[inline(always)]
pub(crate) unsafe fn load_a(base: *const u8, stride: usize) {
    asm!(
        ".byte 0xc4, 0xe2, 0x7b, 0x4b, 0x04, 0x08",
        in("rax") base,
        in("rcx") stride,
        options(nostack, preserves_flags, readonly),
    );
}

/// `TILELOADD tmm1, [base + stride]`
#[inline(always)]
pub(crate) unsafe fn load_b(base: *const u8, stride: usize) {
    asm!(
        ".byte 0xc4, 0xe2, 0x7b, 0x4b, 0x0c, 0x08",
        in("rax") base,
        in("rcx") stride,
        options(nostack, preserves_flags, readonly),
    );
}

/// `TILELOADD tmm2, [base + stride]`
#[inline(always)]
pub(crate) unsafe fn load_c(base: *const u8, stride: usize) {
    asm!(
        ".byte 0xc4, 0xe2, 0x7b, 0x4b, 0x14, 0x08",
        in("rax") base,
        in("rcx") stride,
        options(nostack, preserves_flags, readonly),
    );
}

/// `TDPBSSD tmm2, tmm0, tmm1`
#[inline(always)]
pub(crate) unsafe fn dpbssd() {
    asm!(
        ".byte 0xc4, 0xe2, 0x73, 0x5e, 0xd0",
        options(nostack, preserves_flags),
    );
}

/// `TILESTORED [base + stride], tmm2`
#[inline(always)]
pub(crate) unsafe fn store_c(base: *mut u8, stride: usize) {
    asm!(
        ".byte 0xc4, 0xe2, 0x7a, 0x4b, 0x14, 0x08",
        in("rax") base,
        in("rcx") stride,
        options(nostack, preserves_flags),
    );
}

/// `TILERELEASE`
#[inline(always)]
pub(crate) unsafe fn release() {
    asm!(".byte 0xc4, 0xe2, 0x78, 0x49, 0xc0", options(nostack, preserves_flags));
}

/// Releases the tile state when dropped, including on unwind.
pub(crate) struct TileSession(());

impl TileSession {
    /// Load `block` and return a guard that issues `TILERELEASE`.
    ///
    /// # Safety
    ///
    /// Tile data permission must be held by the calling thread and `block`
    /// must encode a configuration the CPU accepts.
    pub(crate) unsafe fn begin(block: &TileConfigBlock) -> Self {
        load_config(block);
        Self(())
    }
}

impl Drop for TileSession {
    fn drop(&mut self) {
        // SAFETY: a session only exists after a successful LDTILECFG.
        unsafe { release() }
    }
}
