//! Kernel-wide tuning constants, fixed at build time.
//!
//! A `no_std` kernel has no runtime configuration layer; these are the
//! compile-time knobs instead.

/// Maximum number of processes live in the table at once.
pub const NPROC: usize = 64;

/// Maximum number of CPUs running scheduler loops over the shared table.
pub const NCPU: usize = 8;

/// Open files per process.
pub const NOFILE: usize = 16;

/// Maximum length of a process name, including the nul terminator.
pub const MAXPROCNAME: usize = 16;

/// Number of MLFQ queues; queue numbers are `1..=NQUEUE`.
pub const NQUEUE: u8 = 3;

static_assertions::const_assert!(NPROC > 0);
static_assertions::const_assert!(NCPU > 0);
static_assertions::const_assert!(NQUEUE == 3);
