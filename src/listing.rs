//! The process-listing formatter backing the `printInfo` system call.

use arrayvec::ArrayString;

use crate::proc::{Clock, ProcSlot, Procstate};

/// Prints the header line and one row per non-UNUSED, non-EMBRYO slot.
pub fn print_info<'a>(slots: impl Iterator<Item = &'a ProcSlot>, clock: &dyn Clock) {
    crate::println!(
        "{:<10}{:<5}{:<10}{:<10}{:<8}{:<10}{:<7}{:<9}{}",
        "name", "pid", "state", "priority", "ticket", "queue", "cycles", "hrrn", "arrival"
    );

    let now = clock.now().to_seconds();
    for slot in slots {
        if matches!(slot.state(), Procstate::Unused | Procstate::Embryo) {
            continue;
        }
        crate::println!("{}", format_row(slot, now));
    }
}

fn format_row(slot: &ProcSlot, now_seconds: u64) -> ArrayString<96> {
    let mlfq = slot.mlfq();
    let arrival_seconds = mlfq.arrival_time.to_seconds();
    let waiting = now_seconds.saturating_sub(arrival_seconds);
    let cycles = mlfq.executed_cycle_number.max(1) as u64;
    let hrrn_milli = waiting.saturating_mul(1000) / cycles;

    let mut row = ArrayString::new();
    use core::fmt::Write;
    let _ = write!(
        row,
        "{:<10}{:<5}{:<10}{:<10}{:<8}{:<10}{:<7}{:<9}{}:{}:{}",
        slot.name(),
        slot.pid(),
        slot.state().tag(),
        mlfq.remained_priority.to_fixed_str_digits(1).as_str(),
        mlfq.lottery_ticket,
        mlfq.queue_number,
        mlfq.executed_cycle_number,
        format_args!("{}.{:03}", hrrn_milli / 1000, hrrn_milli % 1000),
        mlfq.arrival_time.h,
        mlfq.arrival_time.m,
        mlfq.arrival_time.s,
    );
    row
}
