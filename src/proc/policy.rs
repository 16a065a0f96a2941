//! The three queue-specific selection functions plus the round-robin
//! fallback. Every function assumes the table lock is already held by the
//! caller — they take `&ProcTableInner`/`&mut ProcTableInner` directly
//! rather than locking themselves.

use super::table::ProcTableInner;
use super::{next_rand, Clock, Procstate};

/// Queue 1 — lottery. Draws a ticket-weighted winner among RUNNABLE
/// queue-1 slots; `None` if none are runnable or all tickets are zero.
pub(super) fn select_lottery(inner: &mut ProcTableInner) -> Option<usize> {
    let total: u64 = inner
        .slots
        .iter()
        .filter(|s| s.state == Procstate::Runnable && s.mlfq.queue_number == 1)
        .map(|s| s.mlfq.lottery_ticket as u64)
        .sum();
    if total == 0 {
        return None;
    }

    let draw = next_rand(&mut inner.rng_state) as u64 % total;
    let mut r = draw;
    for (idx, slot) in inner.slots.iter().enumerate() {
        if slot.state != Procstate::Runnable || slot.mlfq.queue_number != 1 {
            continue;
        }
        let ticket = slot.mlfq.lottery_ticket as u64;
        if r <= ticket {
            return Some(idx);
        }
        r -= ticket;
    }
    None
}

/// Queue 2 — HRRN. Returns the RUNNABLE queue-2 slot with the greatest
/// `waiting / executedCycleNumber` ratio; ties go to the first-seen slot.
/// The ratio is kept in thousandths rather than floating point, for the
/// same float-free-kernel-surface reason as [`crate::decimal::Priority`].
pub(super) fn select_hrrn(inner: &ProcTableInner, clock: &dyn Clock) -> Option<usize> {
    let now = clock.now().to_seconds();
    let mut best: Option<(usize, u64)> = None;

    for (idx, slot) in inner.slots.iter().enumerate() {
        if slot.state != Procstate::Runnable || slot.mlfq.queue_number != 2 {
            continue;
        }
        let arrival = slot.mlfq.arrival_time.to_seconds();
        let waiting = now.saturating_sub(arrival);
        let cycles = slot.mlfq.executed_cycle_number.max(1) as u64;
        let hrrn_milli = waiting.saturating_mul(1000) / cycles;

        match best {
            Some((_, best_milli)) if best_milli >= hrrn_milli => {}
            _ => best = Some((idx, hrrn_milli)),
        }
    }

    best.map(|(idx, _)| idx)
}

/// Queue 3 — SRPF. Returns the RUNNABLE queue-3 slot with the smallest
/// `remainedPriority`; ties are broken with single-pass reservoir
/// sampling (each of the `k` tied slots wins with probability `1/k`),
/// collapsing the two-pass walk-then-redraw the original source used.
pub(super) fn select_srpf(inner: &mut ProcTableInner) -> Option<usize> {
    use crate::decimal::Priority;

    let mut min_priority = Priority::from_millis(i32::MAX);
    let mut winner: Option<usize> = None;
    let mut seen_at_min: u32 = 0;

    for idx in 0..inner.slots.len() {
        let (state, queue, priority) = {
            let slot = &inner.slots[idx];
            (slot.state, slot.mlfq.queue_number, slot.mlfq.remained_priority)
        };
        if state != Procstate::Runnable || queue != 3 {
            continue;
        }

        if priority < min_priority {
            min_priority = priority;
            winner = Some(idx);
            seen_at_min = 1;
        } else if priority == min_priority {
            seen_at_min += 1;
            if next_rand(&mut inner.rng_state) % seen_at_min == 0 {
                winner = Some(idx);
            }
        }
    }

    winner
}

/// Safety-net fallback: the first RUNNABLE slot in table order, regardless
/// of queue. This is unreachable in practice —
/// `select_lottery`/`select_hrrn`/`select_srpf` jointly cover every
/// RUNNABLE slot, since every slot's `queueNumber` is always `1..=3` — but
/// is kept as a documented safety net rather than asserted unreachable.
pub(super) fn select_round_robin(inner: &ProcTableInner) -> Option<usize> {
    inner.slots.iter().position(|s| s.state == Procstate::Runnable)
}

#[cfg(test)]
mod tests {
    use super::super::table::ProcTable;
    use super::super::{NullClock, Procstate, TestClock, WallClock};
    use crate::decimal::Priority;
    use crate::param::NPROC;

    static CLOCK: NullClock = NullClock;

    fn runnable_in_queue(t: &ProcTable, q: u8, tickets: &[u32]) -> Vec<usize> {
        let mut idxs = Vec::new();
        for &ticket in tickets {
            let idx = t.allocate("p").unwrap();
            let pid = t.with_inner(|i| i.slots[idx].pid);
            t.change_queue(pid, q).unwrap();
            if q == 1 {
                t.set_lottery_ticket(pid, ticket).unwrap();
            }
            t.with_inner_mut(|i| i.slots[idx].state = Procstate::Runnable);
            idxs.push(idx);
        }
        idxs
    }

    #[test]
    fn lottery_respects_ticket_weighting() {
        let t = ProcTable::new(&CLOCK);
        let idxs = runnable_in_queue(&t, 1, &[1, 2, 7]);
        let mut counts = [0u32; 3];
        for _ in 0..10_000 {
            let winner = t.with_inner_mut(|i| super::select_lottery(i)).unwrap();
            counts[idxs.iter().position(|&x| x == winner).unwrap()] += 1;
        }
        // Expected roughly {1000, 2000, 7000}; generous tolerance since
        // this is a single LCG stream, not a true RNG.
        assert!((500..1500).contains(&counts[0]), "{:?}", counts);
        assert!((1400..2700).contains(&counts[1]), "{:?}", counts);
        assert!((6000..8000).contains(&counts[2]), "{:?}", counts);
    }

    #[test]
    fn lottery_empty_when_no_tickets() {
        let t = ProcTable::new(&CLOCK);
        runnable_in_queue(&t, 1, &[0, 0]);
        assert_eq!(t.with_inner_mut(|i| super::select_lottery(i)), None);
    }

    #[test]
    fn hrrn_picks_maximal_ratio() {
        let t = ProcTable::new(&CLOCK);
        let clock = TestClock::new();
        clock.set(WallClock { h: 0, m: 1, s: 40 }); // now = 100s

        let idx = t.allocate("p").unwrap();
        let pid = t.with_inner(|i| i.slots[idx].pid);
        t.change_queue(pid, 2).unwrap();
        t.with_inner_mut(|i| {
            i.slots[idx].state = Procstate::Runnable;
            i.slots[idx].mlfq.arrival_time = WallClock { h: 0, m: 0, s: 0 };
            i.slots[idx].mlfq.executed_cycle_number = 5;
        });

        let winner = t.with_inner(|i| super::select_hrrn(i, &clock)).unwrap();
        assert_eq!(winner, idx);
        // waiting=100, cycles=5 -> HRRN = 20.0
        let hrrn_milli = t.with_inner(|i| {
            let now = clock.now().to_seconds();
            let arrival = i.slots[idx].mlfq.arrival_time.to_seconds();
            (now - arrival) * 1000 / i.slots[idx].mlfq.executed_cycle_number as u64
        });
        assert_eq!(hrrn_milli, 20_000);
    }

    #[test]
    fn srpf_picks_minimum_and_splits_ties() {
        let t = ProcTable::new(&CLOCK);
        let idxs = runnable_in_queue(&t, 3, &[0, 0]);
        for &idx in &idxs {
            t.with_inner_mut(|i| i.slots[idx].mlfq.remained_priority = Priority::from_millis(300));
        }

        let mut counts = [0u32; 2];
        for _ in 0..10_000 {
            let winner = t.with_inner_mut(|i| super::select_srpf(i)).unwrap();
            counts[idxs.iter().position(|&x| x == winner).unwrap()] += 1;
        }
        assert!((4000..6000).contains(&counts[0]), "{:?}", counts);
        assert!((4000..6000).contains(&counts[1]), "{:?}", counts);
    }

    #[test]
    fn srpf_unique_minimum_always_wins() {
        let t = ProcTable::new(&CLOCK);
        let idxs = runnable_in_queue(&t, 3, &[0, 0]);
        t.with_inner_mut(|i| {
            i.slots[idxs[0]].mlfq.remained_priority = Priority::from_millis(100);
            i.slots[idxs[1]].mlfq.remained_priority = Priority::from_millis(900);
        });
        for _ in 0..100 {
            assert_eq!(t.with_inner_mut(|i| super::select_srpf(i)), Some(idxs[0]));
        }
    }

    #[test]
    fn round_robin_fallback_is_reachable_as_safety_net() {
        let t = ProcTable::new(&CLOCK);
        let idx = t.allocate("p").unwrap();
        t.with_inner_mut(|i| i.slots[idx].state = Procstate::Runnable);
        // queueNumber defaults to 1 but with ticket 10; zero the ticket so
        // lottery sees no candidates, leaving only the fallback.
        let pid = t.with_inner(|i| i.slots[idx].pid);
        t.set_lottery_ticket(pid, 0).unwrap();
        assert_eq!(t.with_inner_mut(|i| super::select_lottery(i)), None);
        assert_eq!(t.with_inner(|i| super::select_hrrn(i, &CLOCK)), None);
        assert_eq!(t.with_inner_mut(|i| super::select_srpf(i)), None);
        assert_eq!(t.with_inner(|i| super::select_round_robin(i)), Some(idx));
    }

    #[test]
    fn policy_priority_queue_one_dominates() {
        let t = ProcTable::new(&CLOCK);
        let q1 = runnable_in_queue(&t, 1, &[1]);
        let _q3 = runnable_in_queue(&t, 3, &[0]);
        let winner = t.with_inner_mut(|i| super::select_lottery(i));
        assert_eq!(winner, Some(q1[0]));
    }

    #[test]
    fn policy_priority_queue_two_dominates_queue_three() {
        let t = ProcTable::new(&CLOCK);
        let q3 = runnable_in_queue(&t, 3, &[0]);
        let q2 = runnable_in_queue(&t, 2, &[0]);
        // No queue-1 contenders: lottery finds nothing, HRRN must win over SRPF.
        assert_eq!(t.with_inner_mut(|i| super::select_lottery(i)), None);
        let winner = t.with_inner(|i| super::select_hrrn(i, &CLOCK));
        assert_eq!(winner, Some(q2[0]));
        let _ = q3;
    }

    #[test]
    fn hrrn_maximality_over_multiple_candidates() {
        let t = ProcTable::new(&CLOCK);
        let clock = TestClock::new();
        clock.set(WallClock { h: 0, m: 1, s: 40 }); // now = 100s

        let idxs = runnable_in_queue(&t, 2, &[0, 0, 0]);
        // waiting=100 for all; vary cycles so ratios differ: 10, 5, 20 -> HRRN 10, 20, 5.
        t.with_inner_mut(|i| {
            i.slots[idxs[0]].mlfq.executed_cycle_number = 10;
            i.slots[idxs[1]].mlfq.executed_cycle_number = 5;
            i.slots[idxs[2]].mlfq.executed_cycle_number = 20;
        });

        let winner = t.with_inner(|i| super::select_hrrn(i, &clock)).unwrap();
        assert_eq!(winner, idxs[1]);

        // No RUNNABLE queue-2 slot may have a strictly greater ratio than the winner.
        let winner_ratio = t.with_inner(|i| {
            let now = clock.now().to_seconds();
            let s = &i.slots[winner];
            let waiting = now - s.mlfq.arrival_time.to_seconds();
            waiting * 1000 / s.mlfq.executed_cycle_number.max(1) as u64
        });
        for &idx in &idxs {
            let ratio = t.with_inner(|i| {
                let now = clock.now().to_seconds();
                let s = &i.slots[idx];
                let waiting = now - s.mlfq.arrival_time.to_seconds();
                waiting * 1000 / s.mlfq.executed_cycle_number.max(1) as u64
            });
            assert!(ratio <= winner_ratio, "{} > {}", ratio, winner_ratio);
        }
    }

    #[test]
    fn table_never_overruns_nproc() {
        // sanity: the table's fixed size matches param::NPROC, which the
        // reservoir-sampling loop above relies on iterating exactly once.
        let t = ProcTable::new(&CLOCK);
        assert_eq!(t.with_inner(|i| i.slots.len()), NPROC);
    }
}
