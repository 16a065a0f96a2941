//! The system-call surface exposed to user space. The trap/syscall
//! dispatch shim that fetches arguments out of a trap frame and routes to
//! these functions is trivial glue and out of scope; each function here
//! already takes its arguments decoded, plus the calling process's slot
//! index the dispatch shim would have resolved via
//! `cpu::mycpu().current_proc()`.

use crate::error::SchedError;
use crate::proc::{ProcTable, WaitChannel, WaitOutcome};

fn pid_of(table: &ProcTable, idx: usize) -> u32 {
    table.with_inner(|inner| inner.slots[idx].pid())
}

/// `fork`: returns the child's pid to the caller (the child itself
/// observes 0 via its own trap frame, set up by `ProcTable::fork`).
pub fn sys_fork(table: &ProcTable, self_idx: usize) -> Result<u32, SchedError> {
    let child_idx = table.fork(self_idx)?;
    Ok(pid_of(table, child_idx))
}

/// `exit`: never returns to its caller in a real kernel (control passes
/// to `sched`); here it performs the in-scope state transition and
/// returns so the (out-of-scope) dispatch loop can invoke `sched` itself.
pub fn sys_exit(table: &ProcTable, self_idx: usize) {
    table.exit_current(self_idx);
}

/// `wait`: reaps a zombie child if one is ready, otherwise blocks.
pub fn sys_wait(table: &ProcTable, self_idx: usize) -> Result<WaitOutcome, SchedError> {
    table.wait(self_idx)
}

/// `kill pid`: returns `Ok(())` on success, a `Result` standing in for the
/// usual 0/-1 syscall return convention.
pub fn sys_kill(table: &ProcTable, pid: u32) -> Result<(), SchedError> {
    table.kill(pid)
}

/// `getpid`: the caller's own pid.
pub fn sys_getpid(table: &ProcTable, self_idx: usize) -> u32 {
    pid_of(table, self_idx)
}

/// `sbrk n`: grows (or shrinks) the caller's address space by `n` bytes;
/// returns the size it had *before* the change, matching `sbrk(2)`'s
/// "returns old break" contract.
pub fn sys_sbrk(table: &ProcTable, self_idx: usize, n: i64) -> Result<usize, SchedError> {
    let new_size = table.growproc(self_idx, n)?;
    Ok((new_size as i64 - n).max(0) as usize)
}

/// `sleep n`: suspends the caller on the shared tick channel. The timer
/// handler that actually wakes it once per tick is out of scope; this
/// only performs the state transition.
pub fn sys_sleep(table: &ProcTable, self_idx: usize) {
    table.sleep(self_idx, WaitChannel::ticks());
}

/// `uptime`: ticks since boot. The real tick counter is out of scope;
/// this reports the wall clock's seconds-since-whatever-epoch the
/// `Clock` implementation tracks as a stand-in.
pub fn sys_uptime(table: &ProcTable) -> u64 {
    table.clock().now().to_seconds()
}

/// `setTicket n`: sets the caller's own lottery ticket count (only
/// meaningful while the caller is in queue 1, like `setLotteryTicket`).
pub fn sys_set_ticket(table: &ProcTable, self_idx: usize, n: u32) -> Result<(), SchedError> {
    let pid = pid_of(table, self_idx);
    table.set_lottery_ticket(pid, n)
}

/// `changeQueue pid q`.
pub fn sys_change_queue(table: &ProcTable, pid: u32, q: u8) -> Result<(), SchedError> {
    table.change_queue(pid, q)
}

/// `setLotteryTicket pid n`.
pub fn sys_set_lottery_ticket(table: &ProcTable, pid: u32, n: u32) -> Result<(), SchedError> {
    table.set_lottery_ticket(pid, n)
}

/// `setSRPFPriority pid s`.
pub fn sys_set_srpf_priority(table: &ProcTable, pid: u32, s: &str) -> Result<(), SchedError> {
    table.set_srpf_priority(pid, s)
}

/// `printInfo`.
pub fn sys_print_info(table: &ProcTable) {
    table.dump();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::proc::{NullClock, Procstate};

    static CLOCK: NullClock = NullClock;

    #[test]
    fn fork_wait_via_syscall_surface() {
        let t = ProcTable::new(&CLOCK);
        let parent = t.user_proc_init("init").unwrap();
        let child_pid = sys_fork(&t, parent).unwrap();

        assert_eq!(sys_wait(&t, parent), Ok(WaitOutcome::Blocked));

        let child_idx = t.with_inner(|i| {
            i.slots
                .iter()
                .position(|s| s.pid() == child_pid)
                .unwrap()
        });
        sys_exit(&t, child_idx);

        assert_eq!(sys_wait(&t, parent), Ok(WaitOutcome::Reaped(child_pid)));
    }

    #[test]
    fn getpid_matches_allocated_pid() {
        let t = ProcTable::new(&CLOCK);
        let idx = t.allocate("p").unwrap();
        let pid = t.with_inner(|i| i.slots[idx].pid());
        assert_eq!(sys_getpid(&t, idx), pid);
    }

    #[test]
    fn kill_a_sleeper() {
        let t = ProcTable::new(&CLOCK);
        let a = t.allocate("a").unwrap();
        sys_sleep(&t, a);
        assert_eq!(t.with_inner(|i| i.slots[a].state()), Procstate::Sleeping);

        let pid = t.with_inner(|i| i.slots[a].pid());
        sys_kill(&t, pid).unwrap();
        assert_eq!(t.with_inner(|i| i.slots[a].state()), Procstate::Runnable);
        assert!(t.with_inner(|i| i.slots[a].killed()));
    }
}
