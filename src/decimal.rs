//! Fixed-point decimal arithmetic standing in for floating-point priority
//! values, avoiding both an FPU context a kernel may not save/restore and
//! the nondeterminism of comparing floats across dispatches.
//!
//! `Priority` carries three decimal digits of precision (thousandths) in
//! an `i32`, with formatting/parsing helpers playing the role classic
//! teaching kernels give `floatToStr`/`strToFloat`/`intToStr`.

use core::fmt;

use arrayvec::ArrayString;

/// A non-negative priority value with three decimal digits of precision,
/// stored as thousandths in an `i32`. A queue-3 process's remaining
/// priority is set from a `setSRPFPriority` syscall argument and
/// decremented by `0.1` on every SRPF dispatch, never going below zero;
/// `Priority` represents that without a float.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct Priority(i32);

/// `remained_priority -= 0.1` per SRPF dispatch, in thousandths.
pub const SRPF_DECAY_MILLIS: i32 = 100;

impl Priority {
    pub const ZERO: Priority = Priority(0);

    /// Constructs a priority from a value already expressed in
    /// thousandths. Negative inputs clamp to zero: remaining priority
    /// never goes negative.
    pub const fn from_millis(millis: i32) -> Self {
        if millis < 0 {
            Priority(0)
        } else {
            Priority(millis)
        }
    }

    pub const fn as_millis(self) -> i32 {
        self.0
    }

    /// Applies the SRPF per-dispatch decay, saturating at zero.
    #[must_use]
    pub fn decay(self) -> Self {
        Priority(self.0.saturating_sub(SRPF_DECAY_MILLIS).max(0))
    }

    /// Parses a decimal string like `"3.5"` or `"12"` into a `Priority`: an
    /// optional integer part, an optional `.` followed by digits (only the
    /// first three are kept). Returns `None` on malformed input rather than
    /// a silent best-effort parse, since every caller in this crate is a
    /// validated syscall argument rather than raw user keyboard input.
    pub fn parse(s: &str) -> Option<Priority> {
        let s = s.trim();
        if s.is_empty() {
            return None;
        }
        let mut parts = s.splitn(2, '.');
        let whole = parts.next().unwrap();
        let frac = parts.next();

        let whole_val: i32 = if whole.is_empty() { 0 } else { whole.parse().ok()? };
        if whole_val < 0 {
            return None;
        }

        let frac_millis = match frac {
            None => 0,
            Some(f) => {
                if !f.bytes().all(|b| b.is_ascii_digit()) {
                    return None;
                }
                let mut digits = [b'0'; 3];
                for (i, slot) in digits.iter_mut().enumerate() {
                    if let Some(b) = f.as_bytes().get(i) {
                        *slot = *b;
                    }
                }
                core::str::from_utf8(&digits).ok()?.parse::<i32>().ok()?
            }
        };

        Some(Priority(whole_val.checked_mul(1000)?.checked_add(frac_millis)?))
    }

    /// Permissive parse for the `setSRPFPriority` syscall argument: an
    /// optional leading `-`, then the *entire* remaining string is walked
    /// one byte at a time — digits accumulate into the whole part until a
    /// `.` is seen and into the (three-digit) fractional part after, while
    /// any other byte is a no-op that does not stop the scan. This mirrors
    /// `strToFloat` treating stray characters as transparent rather than
    /// terminating the parse, so `"3.5abc9"` still picks up the trailing
    /// `9` and yields `3.590`. Negative values clamp to zero, matching
    /// `Priority`'s non-negative contract. Unlike [`Priority::parse`],
    /// this never fails.
    pub fn parse_permissive(s: &str) -> Priority {
        let mut chars = s.trim().chars().peekable();
        let negative = matches!(chars.peek(), Some('-'));
        if negative {
            chars.next();
        }

        let mut whole: i32 = 0;
        let mut frac_millis: i32 = 0;
        let mut frac_place: i32 = 100;
        let mut seen_dot = false;

        for c in chars {
            if let Some(d) = c.to_digit(10) {
                if seen_dot {
                    if frac_place > 0 {
                        frac_millis += d as i32 * frac_place;
                        frac_place /= 10;
                    }
                    // Beyond three fractional digits, further digits are
                    // no-ops: the fixed-point representation only keeps
                    // thousandths.
                } else {
                    whole = whole.saturating_mul(10).saturating_add(d as i32);
                }
            } else if c == '.' && !seen_dot {
                seen_dot = true;
            }
            // Any other byte (including a second '.') is a no-op; the
            // scan continues rather than stopping.
        }

        if negative {
            return Priority::ZERO;
        }
        Priority::from_millis(whole.saturating_mul(1000).saturating_add(frac_millis))
    }

    /// Renders back to a decimal string with exactly three fractional
    /// digits, heap-free via `ArrayString` rather than an allocating
    /// formatter.
    pub fn to_fixed_str(self) -> ArrayString<16> {
        self.to_fixed_str_digits(3)
    }

    /// Renders with `digits` fractional digits (1 to 3), truncating rather
    /// than rounding away the dropped thousandths. The process listing's
    /// `remainedPriority` column wants one digit; everywhere else wants the
    /// full three, the same split `floatToStr(priority, digits, buf)` draws
    /// between callers in the original implementation.
    pub fn to_fixed_str_digits(self, digits: u8) -> ArrayString<16> {
        let digits = digits.clamp(1, 3);
        let mut buf = ArrayString::new();
        let whole = self.0 / 1000;
        let scale = 10_i32.pow((3 - digits) as u32);
        let frac = (self.0 % 1000) / scale;
        // `core::fmt::Write` on `ArrayString` never fails for a buffer this
        // size; a priority's magnitude is bounded well under 13 digits.
        let _ = fmt::Write::write_fmt(
            &mut buf,
            format_args!("{whole}.{frac:0width$}", width = digits as usize),
        );
        buf
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_fixed_str())
    }
}
