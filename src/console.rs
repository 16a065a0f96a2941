//! Formatted console output: `print!`/`println!`, routed through a locked
//! writer so concurrent CPUs don't interleave output.
//!
//! Production builds plug in a real UART; that driver is out of this
//! subsystem's scope, so this only carries the locking/formatting plumbing
//! the scheduler's `dump`/`print_info`/panic path needs, against a
//! pluggable [`Sink`].

use core::fmt;

use crate::lock::Spinlock;

/// Where formatted console bytes ultimately go. Production kernels plug in
/// a UART driver; tests and `cfg(not(any(target_os = "none")))` builds use
/// [`NullSink`] or a host-backed sink.
pub trait Sink: Send {
    fn write_byte(&mut self, b: u8);
}

/// Discards everything written to it. Used when no real console is wired up.
pub struct NullSink;

impl Sink for NullSink {
    fn write_byte(&mut self, _b: u8) {}
}

#[cfg(test)]
pub struct StdSink;

#[cfg(test)]
impl Sink for StdSink {
    fn write_byte(&mut self, b: u8) {
        extern crate std;
        std::print!("{}", b as char);
    }
}

#[cfg(not(test))]
static CONSOLE: Spinlock<NullSink> = Spinlock::new("console", NullSink);

#[cfg(test)]
static CONSOLE: Spinlock<StdSink> = Spinlock::new("console", StdSink);

struct Writer;

impl fmt::Write for Writer {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        let mut guard = CONSOLE.lock();
        for b in s.bytes() {
            guard.write_byte(b);
        }
        Ok(())
    }
}

#[doc(hidden)]
pub fn _print(args: fmt::Arguments<'_>) {
    use core::fmt::Write;
    let _ = Writer.write_fmt(args);
}

/// Prints to the kernel console, without a trailing newline.
#[macro_export]
macro_rules! print {
    ($($arg:tt)*) => ($crate::console::_print(format_args!($($arg)*)));
}

/// Prints to the kernel console, with a trailing newline.
#[macro_export]
macro_rules! println {
    () => ($crate::print!("\n"));
    ($($arg:tt)*) => ($crate::print!("{}\n", format_args!($($arg)*)));
}
