//! Contract boundary for the two primitives this subsystem treats as
//! externally supplied: interrupt enable/disable and the raw context
//! switch.
//!
//! On a real riscv64 target these are CSR twiddles and an assembly
//! trampoline (`swtch.S`). Under any other target (including `cargo test`
//! on the host) a software stand-in is swapped in instead, so the
//! process-table state machine and policy selectors are reachable and
//! property-testable without real hardware.

cfg_if::cfg_if! {
    if #[cfg(all(target_arch = "riscv64", not(test)))] {
        mod riscv;
        pub use riscv::*;
    } else {
        mod soft;
        pub use soft::*;
    }
}
