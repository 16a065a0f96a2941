//! Process lifecycle types: the per-slot record (`ProcSlot`), its lifecycle
//! state (`Procstate`), scheduling attributes (`Mlfq`), and the two
//! kernel-thread primitives the architecture boundary hands us (`Context`,
//! `TrapFrame`).

pub mod policy;
pub mod scheduler;
pub mod table;

use arrayvec::ArrayString;

use crate::decimal::Priority;
use crate::fs::{FileTable, NullFile};
use crate::param::MAXPROCNAME;
use crate::vm::NullAddressSpace;

pub use scheduler::DispatchOutcome;
pub use table::{ProcTable, WaitOutcome};

/// Size of the per-process kernel stack. Real allocation (`kalloc`) is out
/// of scope (see `vm`); each slot carries its stack inline instead, since
/// the table is fixed-size anyway.
pub const KSTACK_SIZE: usize = 4096;

/// Placeholder instruction pointer a freshly allocated context "resumes
/// into". The real fork-return/trap-return trampoline lives in
/// architecture boot code this crate doesn't implement; this sentinel
/// documents the contract without pretending to satisfy it.
pub const FORKRET_SENTINEL: u64 = u64::MAX;

/// Lifecycle state of a process slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Procstate {
    Unused,
    Embryo,
    Sleeping,
    Runnable,
    Running,
    Zombie,
}

impl Procstate {
    /// Uppercase tag used by the process listing.
    pub fn tag(self) -> &'static str {
        match self {
            Procstate::Unused => "UNUSED",
            Procstate::Embryo => "EMBRYO",
            Procstate::Sleeping => "SLEEPING",
            Procstate::Runnable => "RUNNABLE",
            Procstate::Running => "RUNNING",
            Procstate::Zombie => "ZOMBIE",
        }
    }
}

/// Saved kernel-thread callee-saved registers, the payload `swtch` moves
/// between two `Context`s. Opaque to everything except the architecture
/// veneer (`arch::swtch`); this crate never reads individual fields.
#[derive(Debug, Clone, Copy)]
#[repr(C)]
pub struct Context {
    pub ra: u64,
    pub sp: u64,
    pub s0: u64,
    pub s1: u64,
    pub s2: u64,
    pub s3: u64,
    pub s4: u64,
    pub s5: u64,
    pub s6: u64,
    pub s7: u64,
    pub s8: u64,
    pub s9: u64,
    pub s10: u64,
    pub s11: u64,
}

impl Context {
    pub const fn zeroed() -> Self {
        Self {
            ra: 0,
            sp: 0,
            s0: 0,
            s1: 0,
            s2: 0,
            s3: 0,
            s4: 0,
            s5: 0,
            s6: 0,
            s7: 0,
            s8: 0,
            s9: 0,
            s10: 0,
            s11: 0,
        }
    }
}

/// Saved user-mode register snapshot at the top of the kernel stack.
/// `regs[10]` is `a0`, the RISC-V return-value register: `fork` zeroes it
/// in the child so the child observes return value 0.
#[derive(Debug, Clone, Copy)]
#[repr(C)]
pub struct TrapFrame {
    pub regs: [u64; 32],
    pub epc: u64,
}

impl TrapFrame {
    pub const fn zeroed() -> Self {
        Self {
            regs: [0; 32],
            epc: 0,
        }
    }
}

/// Register index of the RISC-V return-value register `a0`.
pub const RETURN_REG: usize = 10;

/// Linear congruential step: `state = state * 1664525 + 1013904223`,
/// unsigned 32-bit wraparound. Shared by `policy::select_lottery`'s
/// ticket draw and `policy::select_srpf`'s reservoir tie-break; the
/// generator state itself lives in `ProcTableInner::rng_state`, protected
/// by the table lock rather than raced on unsynchronized.
pub(crate) fn next_rand(state: &mut u32) -> u32 {
    *state = state.wrapping_mul(1664525).wrapping_add(1013904223);
    *state
}

/// Opaque sleep/wakeup rendezvous key ("channel"). Never dereferenced,
/// only compared for equality between a sleeper and a waker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitChannel(usize);

impl WaitChannel {
    /// The channel a process sleeps on while waiting for any of its
    /// children, and that `exit` wakes on behalf of the parent.
    pub const fn of_parent_slot(idx: usize) -> Self {
        WaitChannel(idx + 1)
    }

    /// The channel the tick interrupt wakes every tick, used by `sleep(n)`.
    pub const fn ticks() -> Self {
        WaitChannel(usize::MAX)
    }
}

/// Wall-clock reading, `h:m:s`, the shape both a process's recorded
/// arrival time and the process listing render it in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WallClock {
    pub h: u32,
    pub m: u32,
    pub s: u32,
}

impl WallClock {
    pub const fn to_seconds(self) -> u64 {
        self.h as u64 * 3600 + self.m as u64 * 60 + self.s as u64
    }
}

/// Real-time clock read, out of scope for this subsystem and represented
/// as a narrow contract, the same way `vm`/`fs` stand in for their
/// respective out-of-scope collaborators.
pub trait Clock: Sync {
    fn now(&self) -> WallClock;
}

/// A clock that never advances. Used where no real time source is wired
/// up; HRRN against this clock always sees zero waiting time.
pub struct NullClock;

impl Clock for NullClock {
    fn now(&self) -> WallClock {
        WallClock::default()
    }
}

/// A clock tests can set to an arbitrary reading, to exercise HRRN's
/// `waiting = now - arrival` computation deterministically.
#[cfg(test)]
pub struct TestClock(core::cell::Cell<WallClock>);

#[cfg(test)]
impl TestClock {
    pub const fn new() -> Self {
        Self(core::cell::Cell::new(WallClock { h: 0, m: 0, s: 0 }))
    }

    pub fn set(&self, reading: WallClock) {
        self.0.set(reading);
    }
}

#[cfg(test)]
unsafe impl Sync for TestClock {}

#[cfg(test)]
impl Clock for TestClock {
    fn now(&self) -> WallClock {
        self.0.get()
    }
}

/// MLFQ-specific scheduling attributes of a process slot.
#[derive(Debug, Clone, Copy)]
pub struct Mlfq {
    pub queue_number: u8,
    pub arrival_time: WallClock,
    pub executed_cycle_number: u32,
    pub lottery_ticket: u32,
    pub remained_priority: Priority,
}

impl Mlfq {
    /// Initial values stamped by `allocate`: queue 1, ticket 10, priority
    /// 1.000, one cycle already credited.
    pub const fn new(arrival_time: WallClock) -> Self {
        Self {
            queue_number: 1,
            arrival_time,
            executed_cycle_number: 1,
            lottery_ticket: 10,
            remained_priority: Priority::from_millis(1000),
        }
    }
}

/// One element of the fixed-size process table.
pub struct ProcSlot {
    pub(crate) pid: u32,
    pub(crate) name: ArrayString<MAXPROCNAME>,
    pub(crate) parent: Option<usize>,
    pub(crate) state: Procstate,
    pub(crate) kstack: [u8; KSTACK_SIZE],
    pub(crate) context: Context,
    pub(crate) tf: TrapFrame,
    pub(crate) address_space: Option<NullAddressSpace>,
    pub(crate) chan: Option<WaitChannel>,
    pub(crate) killed: bool,
    pub(crate) files: FileTable<NullFile, NullFile>,
    pub(crate) mlfq: Mlfq,
}

impl ProcSlot {
    pub(crate) fn unused() -> Self {
        Self {
            pid: 0,
            name: ArrayString::new(),
            parent: None,
            state: Procstate::Unused,
            kstack: [0; KSTACK_SIZE],
            context: Context::zeroed(),
            tf: TrapFrame::zeroed(),
            address_space: None,
            chan: None,
            killed: false,
            files: FileTable::empty(),
            mlfq: Mlfq::new(WallClock { h: 0, m: 0, s: 0 }),
        }
    }

    pub fn pid(&self) -> u32 {
        self.pid
    }

    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    pub fn state(&self) -> Procstate {
        self.state
    }

    pub fn parent(&self) -> Option<usize> {
        self.parent
    }

    pub fn killed(&self) -> bool {
        self.killed
    }

    pub fn mlfq(&self) -> &Mlfq {
        &self.mlfq
    }
}
