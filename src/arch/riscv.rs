//! Real riscv64 CSR access, written against the stable `core::arch::asm!`
//! macro rather than the deprecated `llvm_asm!` form older ports of this
//! style of kernel used.

use core::arch::asm;

use crate::proc::Context;

/// Supervisor Interrupt Enable bit in `sstatus`.
const SSTATUS_SIE: u64 = 1 << 1;

#[inline]
unsafe fn r_sstatus() -> u64 {
    let mut x: u64;
    unsafe { asm!("csrr {}, sstatus", out(reg) x) };
    x
}

#[inline]
unsafe fn w_sstatus(x: u64) {
    unsafe { asm!("csrw sstatus, {}", in(reg) x) };
}

/// Are device interrupts enabled on this hart?
#[inline]
pub unsafe fn intr_get() -> bool {
    unsafe { r_sstatus() & SSTATUS_SIE != 0 }
}

/// Enable device interrupts on this hart.
#[inline]
pub unsafe fn intr_on() {
    unsafe { w_sstatus(r_sstatus() | SSTATUS_SIE) };
}

/// Disable device interrupts on this hart.
#[inline]
pub unsafe fn intr_off() {
    unsafe { w_sstatus(r_sstatus() & !SSTATUS_SIE) };
}

/// This hart's id, read out of `tp`.
#[inline]
pub unsafe fn hart_id() -> usize {
    let x: usize;
    unsafe { asm!("mv {}, tp", out(reg) x) };
    x
}

extern "C" {
    /// `swtch.S`: saves callee-saved registers into `*from`, resumes `*to`.
    fn swtch_asm(from: *mut Context, to: *mut Context);
}

/// Context switch primitive: the one operation that cannot be expressed in
/// portable Rust without inline assembly. Treated as atomic, taking two
/// context pointers — saves the caller's callee-saved registers into
/// `*from` and resumes whatever was last saved into `*to`.
#[inline]
pub unsafe fn swtch(from: *mut Context, to: *mut Context) {
    unsafe { swtch_asm(from, to) };
}
