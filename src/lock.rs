//! Mutual-exclusion spinlock with a `push_off`/`pop_off` interrupt
//! discipline: the lock must be acquired with interrupts disabled on the
//! calling CPU, and releasing it restores whatever interrupt-enable state
//! was in effect before the first nested acquire.
//!
//! The actual mutual exclusion is `spin::Mutex`'s: [`RawSpinlock`] holds a
//! zero-sized `spin::Mutex<()>` as its locking engine rather than
//! hand-rolling the atomic compare-exchange loop, and leans on
//! `spin::Mutex::force_unlock` to release a guard that was deliberately
//! leaked across the `push_off`/`pop_off` boundary instead of dropped
//! normally.

use core::cell::UnsafeCell;
use core::ops::{Deref, DerefMut};

use crate::cpu::{pop_off, push_off};

/// A bare spinlock with no payload, for guarding an external resource
/// without wrapping it in a `Spinlock<T>`.
pub struct RawSpinlock {
    name: &'static str,
    inner: spin::Mutex<()>,
}

impl RawSpinlock {
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            inner: spin::Mutex::new(()),
        }
    }

    pub fn acquire(&self) {
        push_off();
        // Leaked deliberately: `release` undoes this with `force_unlock`,
        // not by letting this guard drop.
        core::mem::forget(self.inner.lock());
    }

    /// # Safety
    ///
    /// Must be paired with a prior [`RawSpinlock::acquire`] on this lock by
    /// the same CPU.
    pub unsafe fn release(&self) {
        unsafe { self.inner.force_unlock() };
        pop_off();
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

/// A spinlock protecting a `T`, in the style of `std::sync::Mutex` but
/// backed by [`RawSpinlock`]'s `push_off`/`pop_off` interrupt discipline
/// rather than OS blocking.
pub struct Spinlock<T> {
    raw: RawSpinlock,
    data: UnsafeCell<T>,
}

// SAFETY: access to `data` is serialized by `raw`.
unsafe impl<T: Send> Sync for Spinlock<T> {}

impl<T> Spinlock<T> {
    pub const fn new(name: &'static str, data: T) -> Self {
        Self {
            raw: RawSpinlock::new(name),
            data: UnsafeCell::new(data),
        }
    }

    pub fn lock(&self) -> SpinlockGuard<'_, T> {
        self.raw.acquire();
        SpinlockGuard { lock: self }
    }

    /// # Safety
    ///
    /// The caller must already hold this lock (or otherwise guarantee
    /// exclusive access), e.g. after a [`SpinlockGuard`] was
    /// `mem::forget`-ten across a context switch whose far side expects
    /// lock ownership to have transferred along with control.
    pub unsafe fn get_mut_unchecked(&self) -> &mut T {
        unsafe { &mut *self.data.get() }
    }

    pub fn name(&self) -> &'static str {
        self.raw.name()
    }

    /// # Safety
    ///
    /// Must be paired with a matching `lock()` whose guard was leaked
    /// (e.g. via `mem::forget`) rather than dropped normally.
    pub unsafe fn force_unlock(&self) {
        unsafe { self.raw.release() };
    }
}

pub struct SpinlockGuard<'a, T> {
    lock: &'a Spinlock<T>,
}

impl<T> Deref for SpinlockGuard<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        unsafe { &*self.lock.data.get() }
    }
}

impl<T> DerefMut for SpinlockGuard<'_, T> {
    fn deref_mut(&mut self) -> &mut T {
        unsafe { &mut *self.lock.data.get() }
    }
}

impl<T> Drop for SpinlockGuard<'_, T> {
    fn drop(&mut self) {
        // SAFETY: this guard is proof the lock is held by us.
        unsafe { self.lock.raw.release() };
    }
}
