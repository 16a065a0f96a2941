//! Per-CPU state: which process (if any) is RUNNING here, the scheduler's
//! own saved context, and the `push_off`/`pop_off` interrupt-disable
//! nesting counter.

use core::cell::Cell;

use crate::arch;
use crate::param::NCPU;
use crate::proc::Context;

/// Per-CPU scheduling state.
///
/// # Safety
///
/// Each `Cpu` is only ever touched by the hart it represents (identified by
/// [`arch::hart_id`]); there is no cross-hart synchronization on these
/// fields.
pub struct Cpu {
    /// Index into the process table of the process RUNNING on this CPU, if
    /// any.
    current_proc: Cell<Option<usize>>,
    /// This CPU's scheduler context; `swtch`'s second argument when a
    /// dispatched process calls back into `sched`.
    pub(crate) scheduler_context: Cell<Context>,
    /// Depth of `push_off` nesting.
    noff: Cell<i32>,
    /// Were interrupts enabled before the first `push_off`?
    interrupt_enabled: Cell<bool>,
}

// SAFETY: see the struct-level note; access is partitioned by hart id.
unsafe impl Sync for Cpu {}

impl Cpu {
    const fn new() -> Self {
        Self {
            current_proc: Cell::new(None),
            scheduler_context: Cell::new(Context::zeroed()),
            noff: Cell::new(0),
            interrupt_enabled: Cell::new(false),
        }
    }
}

static CPUS: [Cpu; NCPU] = array_macro::array![_ => Cpu::new(); NCPU];

/// This hart's id. Must be called with interrupts disabled, or the result
/// may be stale the instant it's read (a tick could migrate this kernel
/// thread to another hart).
pub unsafe fn cpuid() -> usize {
    unsafe { arch::hart_id() }
}

/// Returns this CPU's state. Safe to call with interrupts enabled, at the
/// cost that the returned reference may describe a different hart than the
/// one that later reads it.
pub fn mycpu() -> &'static Cpu {
    // SAFETY: cpuid() is a plain register/cell read, not dereferencing
    // anything hart-specific.
    &CPUS[unsafe { cpuid() } % NCPU]
}

impl Cpu {
    pub fn current_proc(&self) -> Option<usize> {
        self.current_proc.get()
    }

    pub fn set_current_proc(&self, idx: Option<usize>) {
        self.current_proc.set(idx);
    }
}

/// `push_off`/`pop_off` are like `intr_off`/`intr_on` except matched: it
/// takes two `pop_off`s to undo two `push_off`s, and if interrupts were
/// already off, `push_off`+`pop_off` leaves them off.
pub fn push_off() {
    // SAFETY: intr_get/intr_off only read/write this hart's own interrupt
    // state.
    let was_enabled = unsafe { arch::intr_get() };
    unsafe { arch::intr_off() };
    let cpu = mycpu();
    if cpu.noff.get() == 0 {
        cpu.interrupt_enabled.set(was_enabled);
    }
    cpu.noff.set(cpu.noff.get() + 1);
}

pub fn pop_off() {
    let cpu = mycpu();
    assert!(
        !unsafe { arch::intr_get() },
        "pop_off: interrupts enabled before pop_off"
    );
    let noff = cpu.noff.get() - 1;
    assert!(noff >= 0, "pop_off: unbalanced push_off/pop_off");
    cpu.noff.set(noff);
    if noff == 0 && cpu.interrupt_enabled.get() {
        unsafe { arch::intr_on() };
    }
}
