//! The per-CPU scheduler loop's in-scope slice: the policy cascade and
//! dispatch accounting. The context switch itself and the address-space
//! swap around it are `arch`/`vm` responsibilities this crate only calls
//! through a contract; the boot-time infinite loop that repeatedly calls
//! [`ProcTable::schedule_once`] and then `arch::swtch`s into the chosen
//! process lives outside this crate.

use super::policy;
use super::table::{ProcTable, ProcTableInner};
use super::Procstate;

/// Which selector produced a dispatch, and its slot/pid/queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatchOutcome {
    pub idx: usize,
    pub pid: u32,
    pub queue: u8,
    pub via_srpf: bool,
}

enum Selection {
    Lottery(usize),
    Hrrn(usize),
    Srpf(usize),
    RoundRobin(usize),
}

fn select(inner: &mut ProcTableInner, clock: &dyn super::Clock) -> Option<Selection> {
    if let Some(idx) = policy::select_lottery(inner) {
        return Some(Selection::Lottery(idx));
    }
    if let Some(idx) = policy::select_hrrn(inner, clock) {
        return Some(Selection::Hrrn(idx));
    }
    if let Some(idx) = policy::select_srpf(inner) {
        return Some(Selection::Srpf(idx));
    }
    if let Some(idx) = policy::select_round_robin(inner) {
        return Some(Selection::RoundRobin(idx));
    }
    None
}

impl ProcTable {
    /// Runs one iteration of the policy cascade and dispatch accounting:
    /// picks a RUNNABLE slot (lottery, then HRRN, then SRPF, then the
    /// round-robin fallback), credits it a cycle, applies the SRPF decay
    /// if it was dispatched via SRPF, and marks it RUNNING. Returns
    /// `None` if no slot is RUNNABLE.
    ///
    /// The caller (the real per-CPU boot loop) is responsible for setting
    /// the CPU's current-process pointer, swapping the address-space
    /// mapping, calling `arch::swtch` into the chosen process, and
    /// clearing the current-process pointer on return — all out of this
    /// crate's scope.
    pub fn schedule_once(&self) -> Option<DispatchOutcome> {
        self.with_inner_mut(|inner| {
            let selection = select(inner, self.clock())?;
            let (idx, via_srpf) = match selection {
                Selection::Lottery(i) => (i, false),
                Selection::Hrrn(i) => (i, false),
                Selection::Srpf(i) => (i, true),
                Selection::RoundRobin(i) => (i, false),
            };

            let slot = &mut inner.slots[idx];
            slot.mlfq.executed_cycle_number += 1;
            if via_srpf {
                slot.mlfq.remained_priority = slot.mlfq.remained_priority.decay();
            }
            let pid = slot.pid;
            let queue = slot.mlfq.queue_number;
            slot.state = Procstate::Running;

            Some(DispatchOutcome {
                idx,
                pid,
                queue,
                via_srpf,
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::super::table::ProcTable;
    use super::super::{NullClock, Procstate};
    use crate::decimal::Priority;

    static CLOCK: NullClock = NullClock;

    #[test]
    fn dispatch_increments_executed_cycle_number() {
        let t = ProcTable::new(&CLOCK);
        let idx = t.allocate("p").unwrap();
        t.with_inner_mut(|i| i.slots[idx].state = Procstate::Runnable);
        let pid = t.with_inner(|i| i.slots[idx].pid);
        t.set_lottery_ticket(pid, 1).unwrap();

        assert_eq!(t.with_inner(|i| i.slots[idx].mlfq.executed_cycle_number), 1);
        let outcome = t.schedule_once().unwrap();
        assert_eq!(outcome.idx, idx);
        assert_eq!(outcome.pid, pid);
        assert_eq!(outcome.queue, 1);
        assert!(!outcome.via_srpf);
        assert_eq!(t.with_inner(|i| i.slots[idx].mlfq.executed_cycle_number), 2);
        assert_eq!(t.with_inner(|i| i.slots[idx].state), Procstate::Running);
    }

    #[test]
    fn srpf_dispatch_decays_remaining_priority() {
        let t = ProcTable::new(&CLOCK);
        let idx = t.allocate("p").unwrap();
        let pid = t.with_inner(|i| i.slots[idx].pid);
        t.change_queue(pid, 3).unwrap();
        t.set_srpf_priority(pid, "1.0").unwrap();
        t.with_inner_mut(|i| {
            i.slots[idx].state = Procstate::Runnable;
            i.slots[idx].mlfq.remained_priority = Priority::from_millis(1000);
        });

        for n in 1..=5 {
            t.with_inner_mut(|i| i.slots[idx].state = Procstate::Runnable);
            let outcome = t.schedule_once().unwrap();
            assert!(outcome.via_srpf);
            let expected = Priority::from_millis((1000 - 100 * n).max(0));
            assert_eq!(
                t.with_inner(|i| i.slots[idx].mlfq.remained_priority),
                expected
            );
        }
    }

    #[test]
    fn starvation_by_design_queue_one_blocks_queue_three() {
        let t = ProcTable::new(&CLOCK);
        let q3 = t.allocate("low").unwrap();
        let pid3 = t.with_inner(|i| i.slots[q3].pid);
        t.change_queue(pid3, 3).unwrap();
        t.set_srpf_priority(pid3, "0").unwrap();
        t.with_inner_mut(|i| i.slots[q3].state = Procstate::Runnable);

        let q1 = t.allocate("high").unwrap();
        let pid1 = t.with_inner(|i| i.slots[q1].pid);
        t.set_lottery_ticket(pid1, 1).unwrap();
        t.with_inner_mut(|i| i.slots[q1].state = Procstate::Runnable);

        for _ in 0..200 {
            let outcome = t.schedule_once().unwrap();
            assert_eq!(outcome.idx, q1);
            t.with_inner_mut(|i| i.slots[q1].state = Procstate::Runnable);
        }
    }

    #[test]
    fn no_runnable_slots_yields_none() {
        let t = ProcTable::new(&CLOCK);
        t.allocate("idle").unwrap();
        assert!(t.schedule_once().is_none());
    }

    #[test]
    fn mutual_exclusion_of_running_per_dispatch() {
        let t = ProcTable::new(&CLOCK);
        let a = t.allocate("a").unwrap();
        let b = t.allocate("b").unwrap();
        let pid_a = t.with_inner(|i| i.slots[a].pid);
        let pid_b = t.with_inner(|i| i.slots[b].pid);
        t.set_lottery_ticket(pid_a, 1).unwrap();
        t.set_lottery_ticket(pid_b, 1).unwrap();
        t.with_inner_mut(|i| {
            i.slots[a].state = Procstate::Runnable;
            i.slots[b].state = Procstate::Runnable;
        });

        let outcome = t.schedule_once().unwrap();
        let running_count = t.with_inner(|i| {
            i.slots
                .iter()
                .filter(|s| s.state == Procstate::Running)
                .count()
        });
        assert_eq!(running_count, 1);
        let other = if outcome.idx == a { b } else { a };
        assert_eq!(t.with_inner(|i| i.slots[other].state), Procstate::Runnable);
    }
}
