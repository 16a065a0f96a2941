//! Software stand-in for [`super::riscv`], used for any non-riscv64 target
//! and for `cargo test` on the host. Keeps an interrupt-enabled flag per
//! simulated hart instead of touching real CSRs, and never actually swaps
//! stacks (there is nothing to swap on the host test harness — the policy
//! selectors and table transitions this crate's tests exercise never reach
//! a real dispatch).

use core::cell::Cell;
use core::sync::atomic::{AtomicUsize, Ordering};

use crate::param::NCPU;
use crate::proc::Context;

struct SoftIntrFlag(Cell<bool>);
// SAFETY: each slot is only ever touched by the (simulated) hart it
// represents, same partitioning a real per-hart CSR would give it.
unsafe impl Sync for SoftIntrFlag {}

static INTR_ENABLED: [SoftIntrFlag; NCPU] = array_macro::array![_ => SoftIntrFlag(Cell::new(true)); NCPU];

/// Which simulated hart the calling thread is pretending to be. Tests that
/// care about per-CPU interrupt nesting can override this; everything else
/// runs as hart 0.
static CURRENT_HART: AtomicUsize = AtomicUsize::new(0);

/// Overrides [`hart_id`] for the calling (test) thread. Test-only.
#[cfg(test)]
pub fn set_test_hart_id(id: usize) {
    CURRENT_HART.store(id, Ordering::Relaxed);
}

pub unsafe fn hart_id() -> usize {
    CURRENT_HART.load(Ordering::Relaxed)
}

pub unsafe fn intr_get() -> bool {
    INTR_ENABLED[unsafe { hart_id() }].0.get()
}

pub unsafe fn intr_on() {
    INTR_ENABLED[unsafe { hart_id() }].0.set(true);
}

pub unsafe fn intr_off() {
    INTR_ENABLED[unsafe { hart_id() }].0.set(false);
}

/// No-op: there is no real kernel stack to switch to under test/host
/// builds. Callers only rely on this for its interrupt-enable side effects
/// via [`crate::proc::table::ProcTable::sched`], never for actually
/// resuming another thread.
pub unsafe fn swtch(_from: *mut Context, _to: *mut Context) {}
