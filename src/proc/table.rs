//! The process table: one `Spinlock<ProcTableInner>` guarding a fixed
//! array of `NPROC` slots, plus every lifecycle operation that mutates it.
//!
//! A single table-wide spinlock is used deliberately, rather than a
//! per-process lock: every MLFQ selector needs to scan the whole table to
//! pick a winner, so a finer-grained locking scheme would have to
//! take every process's lock anyway on each dispatch.

use arrayvec::ArrayString;
use scopeguard::ScopeGuard;

use crate::decimal::Priority;
use crate::error::SchedError;
use crate::fs::FileTable;
use crate::lock::Spinlock;
use crate::param::NPROC;
use crate::vm::AddressSpace;

use super::{Clock, Mlfq, ProcSlot, Procstate, WaitChannel, RETURN_REG};

pub(crate) struct ProcTableInner {
    pub(crate) slots: [ProcSlot; NPROC],
    next_pid: u32,
    pub(crate) rng_state: u32,
    initial_proc: Option<usize>,
}

impl ProcTableInner {
    fn new() -> Self {
        Self {
            slots: array_macro::array![_ => ProcSlot::unused(); NPROC],
            next_pid: 1,
            rng_state: 1,
            initial_proc: None,
        }
    }
}

/// The outcome of a successful `wait`: either a reaped child or "no zombie
/// child yet, caller is now SLEEPING" — see the module-level note on how
/// blocking is modeled without a real scheduler driving retries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitOutcome {
    Reaped(u32),
    Blocked,
}

/// The shared process table, one per kernel.
///
/// `wait`/`sleep` cannot truly block inside a single function call here —
/// this crate models the table/lifecycle layer, not a running scheduler
/// thread. Blocking operations perform one scan, transition to SLEEPING if
/// nothing is ready, and return [`WaitOutcome::Blocked`]; the caller (the
/// real per-CPU scheduler loop, or a test driving a scripted trace) is
/// expected to call again after observing the corresponding wakeup, which
/// resumes the scan exactly where it left off.
pub struct ProcTable {
    inner: Spinlock<ProcTableInner>,
    clock: &'static dyn Clock,
}

impl ProcTable {
    /// Builds a process table. Not a `const fn`: a fixed-capacity string
    /// per slot makes const-evaluating the whole `NPROC`-element array
    /// impractical, so production code constructs one at boot time instead
    /// (behind a `spin::Once`/`lazy_static`-style cell, which is this
    /// crate's consumer's responsibility, not this module's).
    pub fn new(clock: &'static dyn Clock) -> Self {
        Self {
            inner: Spinlock::new("proc_table", ProcTableInner::new()),
            clock,
        }
    }

    fn allocate_locked(inner: &mut ProcTableInner, clock: &dyn Clock, name: &str) -> Result<usize, SchedError> {
        let idx = inner
            .slots
            .iter()
            .position(|s| s.state == Procstate::Unused)
            .ok_or(SchedError::Exhausted)?;
        let pid = inner.next_pid;
        inner.next_pid += 1;
        let arrival = clock.now();

        let slot = &mut inner.slots[idx];
        slot.pid = pid;
        slot.state = Procstate::Embryo;
        slot.name = ArrayString::new();
        let _ = slot.name.try_push_str(name);
        slot.parent = None;
        slot.killed = false;
        slot.chan = None;
        slot.context = super::Context::zeroed();
        slot.context.ra = super::FORKRET_SENTINEL;
        slot.tf = super::TrapFrame::zeroed();
        slot.mlfq = Mlfq::new(arrival);
        slot.files = FileTable::empty();
        slot.address_space = None;
        Ok(idx)
    }

    /// `allocate()`: UNUSED -> EMBRYO in a fresh slot, pid and arrival
    /// time stamped, MLFQ fields at their initial values.
    pub fn allocate(&self, name: &str) -> Result<usize, SchedError> {
        let mut inner = self.inner.lock();
        Self::allocate_locked(&mut inner, self.clock, name)
    }

    /// Brings up the very first process: allocates a slot, gives it a
    /// fresh address space, and publishes it RUNNABLE with no parent. Its
    /// index becomes the reparenting target for every future orphan.
    pub fn user_proc_init(&self, name: &str) -> Result<usize, SchedError> {
        let mut inner = self.inner.lock();
        let idx = Self::allocate_locked(&mut inner, self.clock, name)?;
        inner.slots[idx].address_space = Some(super::NullAddressSpace::new());
        inner.slots[idx].state = Procstate::Runnable;
        inner.initial_proc = Some(idx);
        Ok(idx)
    }

    /// `fork()`: duplicates `parent_idx`'s address space, trap frame,
    /// open files and name into a freshly allocated slot, zeroes the
    /// child's return-value register, and publishes it RUNNABLE. Rolls the
    /// new slot back to UNUSED if address-space duplication fails, via a
    /// `scopeguard` disarmed only on the success path.
    pub fn fork(&self, parent_idx: usize) -> Result<usize, SchedError> {
        let mut lock = self.inner.lock();
        let child_idx = Self::allocate_locked(&mut lock, self.clock, "")?;

        let mut lock = scopeguard::guard(lock, move |mut lock| {
            lock.slots[child_idx] = ProcSlot::unused();
        });

        let child_as = match lock.slots[parent_idx].address_space.as_ref() {
            Some(parent_as) => Some(parent_as.clone_for_fork()?),
            None => None,
        };
        let parent_name = lock.slots[parent_idx].name;
        let parent_tf = lock.slots[parent_idx].tf;
        let parent_files = lock.slots[parent_idx].files.clone_for_fork();

        let child = &mut lock.slots[child_idx];
        child.address_space = child_as;
        child.name = parent_name;
        child.tf = parent_tf;
        child.tf.regs[RETURN_REG] = 0;
        child.files = parent_files;
        child.parent = Some(parent_idx);
        child.state = Procstate::Runnable;

        ScopeGuard::into_inner(lock);
        Ok(child_idx)
    }

    /// `growproc(n)`: resizes `idx`'s address space by `n` bytes (positive
    /// grows, negative shrinks), lazily creating one if absent.
    pub fn growproc(&self, idx: usize, delta: i64) -> Result<usize, SchedError> {
        let mut inner = self.inner.lock();
        let slot = &mut inner.slots[idx];
        let as_ = slot
            .address_space
            .get_or_insert_with(super::NullAddressSpace::new);
        as_.resize(delta)
    }

    /// `exit()` of the process at `idx`: closes its files, wakes its
    /// parent, reparents its children to the init process (waking init if
    /// a reparented child is already ZOMBIE), and publishes ZOMBIE.
    /// Exiting the init process itself is a fatal invariant violation, not
    /// a recoverable error.
    pub fn exit_current(&self, idx: usize) {
        let mut inner = self.inner.lock();
        assert!(
            inner.initial_proc != Some(idx),
            "exit: init process exiting"
        );

        inner.slots[idx].files.close_all();

        if let Some(parent) = inner.slots[idx].parent {
            Self::wakeup_locked(&mut inner, WaitChannel::of_parent_slot(parent));
        }

        let initial = inner.initial_proc;
        for i in 0..inner.slots.len() {
            if inner.slots[i].state != Procstate::Unused && inner.slots[i].parent == Some(idx) {
                inner.slots[i].parent = initial;
                if inner.slots[i].state == Procstate::Zombie {
                    if let Some(init_idx) = initial {
                        Self::wakeup_locked(&mut inner, WaitChannel::of_parent_slot(init_idx));
                    }
                }
            }
        }

        inner.slots[idx].state = Procstate::Zombie;
    }

    /// `wait()`. See [`ProcTable`]'s blocking note.
    pub fn wait(&self, idx: usize) -> Result<WaitOutcome, SchedError> {
        let mut inner = self.inner.lock();

        if inner.slots[idx].killed {
            return Err(SchedError::Killed);
        }

        let has_children = inner
            .slots
            .iter()
            .any(|s| s.state != Procstate::Unused && s.parent == Some(idx));
        if !has_children {
            return Err(SchedError::NoChildren);
        }

        let zombie = inner
            .slots
            .iter()
            .position(|s| s.state == Procstate::Zombie && s.parent == Some(idx));

        if let Some(child_idx) = zombie {
            let pid = inner.slots[child_idx].pid;
            inner.slots[child_idx] = ProcSlot::unused();
            return Ok(WaitOutcome::Reaped(pid));
        }

        inner.slots[idx].state = Procstate::Sleeping;
        inner.slots[idx].chan = Some(WaitChannel::of_parent_slot(idx));
        Ok(WaitOutcome::Blocked)
    }

    /// `sleep(chan)`, the single-lock fast path: the table lock doubles as
    /// the predicate lock, so there is no separate release/reacquire dance
    /// to model.
    pub fn sleep(&self, idx: usize, chan: WaitChannel) {
        let mut inner = self.inner.lock();
        inner.slots[idx].state = Procstate::Sleeping;
        inner.slots[idx].chan = Some(chan);
    }

    fn wakeup_locked(inner: &mut ProcTableInner, chan: WaitChannel) {
        for slot in inner.slots.iter_mut() {
            if slot.state == Procstate::Sleeping && slot.chan == Some(chan) {
                slot.state = Procstate::Runnable;
                slot.chan = None;
            }
        }
    }

    /// `wakeup(chan)`: every SLEEPING slot on `chan` becomes RUNNABLE.
    /// Spurious wakeups are fine; `wait`/`sleep` callers always recheck
    /// their predicate.
    pub fn wakeup(&self, chan: WaitChannel) {
        let mut inner = self.inner.lock();
        Self::wakeup_locked(&mut inner, chan);
    }

    /// `kill(pid)`: sets the `killed` flag and, if the target is
    /// SLEEPING, promotes it to RUNNABLE so it observes the flag on its
    /// next trip through `sched`.
    pub fn kill(&self, pid: u32) -> Result<(), SchedError> {
        let mut inner = self.inner.lock();
        let slot = Self::find_by_pid_mut(&mut inner, pid)?;
        slot.killed = true;
        if slot.state == Procstate::Sleeping {
            slot.state = Procstate::Runnable;
            slot.chan = None;
        }
        Ok(())
    }

    /// `yield()`: RUNNING -> RUNNABLE, no other effect.
    pub fn yield_now(&self, idx: usize) {
        let mut inner = self.inner.lock();
        inner.slots[idx].state = Procstate::Runnable;
    }

    fn find_by_pid_mut(inner: &mut ProcTableInner, pid: u32) -> Result<&mut ProcSlot, SchedError> {
        inner
            .slots
            .iter_mut()
            .find(|s| s.state != Procstate::Unused && s.pid == pid)
            .ok_or(SchedError::NotFound)
    }

    /// `changeQueue(pid, q)`. `q` outside `{1,2,3}` is rejected rather
    /// than silently accepted; see DESIGN.md for that decision.
    pub fn change_queue(&self, pid: u32, q: u8) -> Result<(), SchedError> {
        if !(1..=crate::param::NQUEUE).contains(&q) {
            return Err(SchedError::Precondition);
        }
        let mut inner = self.inner.lock();
        let slot = Self::find_by_pid_mut(&mut inner, pid)?;
        slot.mlfq.queue_number = q;
        Ok(())
    }

    /// `setLotteryTicket(pid, n)`: only while `pid` is in queue 1.
    pub fn set_lottery_ticket(&self, pid: u32, n: u32) -> Result<(), SchedError> {
        let mut inner = self.inner.lock();
        let slot = Self::find_by_pid_mut(&mut inner, pid)?;
        if slot.mlfq.queue_number != 1 {
            return Err(SchedError::Precondition);
        }
        slot.mlfq.lottery_ticket = n;
        Ok(())
    }

    /// `setSRPFPriority(pid, s)`: only while `pid` is in queue 3. `s` is
    /// parsed permissively; see [`Priority::parse_permissive`].
    pub fn set_srpf_priority(&self, pid: u32, s: &str) -> Result<(), SchedError> {
        let mut inner = self.inner.lock();
        let slot = Self::find_by_pid_mut(&mut inner, pid)?;
        if slot.mlfq.queue_number != 3 {
            return Err(SchedError::Precondition);
        }
        slot.mlfq.remained_priority = Priority::parse_permissive(s);
        Ok(())
    }

    pub(crate) fn with_inner<R>(&self, f: impl FnOnce(&ProcTableInner) -> R) -> R {
        f(&self.inner.lock())
    }

    pub(crate) fn with_inner_mut<R>(&self, f: impl FnOnce(&mut ProcTableInner) -> R) -> R {
        f(&mut self.inner.lock())
    }

    pub fn clock(&self) -> &'static dyn Clock {
        self.clock
    }

    /// `printInfo`: renders the process listing to the console.
    pub fn dump(&self) {
        let inner = self.inner.lock();
        crate::listing::print_info(inner.slots.iter(), self.clock);
    }
}
