//! Error taxonomy for the scheduling core.
//!
//! Fatal conditions (a `sched()` precondition violated, `init` exiting) are
//! not represented here: they `panic!` directly, the usual `assert!`-then-
//! `swtch` idiom for invariant violations a scheduler can't recover from.
//! Everything recoverable comes back to the caller as one of these, with
//! no side effects.

use core::fmt;

/// Recoverable scheduling/lifecycle errors.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum SchedError {
    /// No free process slot (`allocate`/`fork`).
    Exhausted,
    /// No slot matches the given pid (`kill`/`change_queue`/`set_*`).
    NotFound,
    /// The queue predicate failed (e.g. `set_lottery_ticket` on a non-queue-1
    /// process, or a `change_queue` target outside `1..=3`).
    Precondition,
    /// `wait` was called with no children.
    NoChildren,
    /// The caller observed its own `killed` flag while waiting/sleeping.
    Killed,
}

impl fmt::Display for SchedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            SchedError::Exhausted => "process table exhausted",
            SchedError::NotFound => "no such pid",
            SchedError::Precondition => "queue precondition failed",
            SchedError::NoChildren => "no children to wait for",
            SchedError::Killed => "process was killed",
        };
        f.write_str(msg)
    }
}
