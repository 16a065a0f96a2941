//! Virtual memory is an external collaborator here, referenced only by
//! contract. This module is the narrow contract the scheduling core
//! actually calls through: growing/shrinking the user image, duplicating it
//! on `fork`, and copying a child's exit status back into the parent's
//! address space during `wait`.

use crate::error::SchedError;

/// A process's user address space. Production code backs this with real
/// page tables (setup, copy, and grow operations over page-table entries);
/// this crate only needs the contract below.
pub trait AddressSpace: Sized {
    /// A fresh, empty address space (used right after `allocate`, before
    /// the caller has anything to run).
    fn new() -> Self;

    /// Current size in bytes of the user image.
    fn size(&self) -> usize;

    /// Grows (`delta > 0`) or shrinks (`delta < 0`) the user image by
    /// `delta` bytes. Returns the new size, or an error if the underlying
    /// allocator is exhausted.
    fn resize(&mut self, delta: i64) -> Result<usize, SchedError>;

    /// Duplicates this address space for a forked child.
    fn clone_for_fork(&self) -> Result<Self, SchedError>;

    /// Copies `status` into the user memory at `addr`, as `wait(2)`'s
    /// optional status-out-parameter does. `addr == 0` means "no status
    /// pointer was given" and is always a no-op success.
    fn copy_out_status(&mut self, addr: usize, status: i32) -> Result<(), SchedError>;
}

/// A minimal in-memory stand-in used by tests and by hosts with no real MMU.
#[derive(Debug, Default)]
pub struct NullAddressSpace {
    size: usize,
}

impl AddressSpace for NullAddressSpace {
    fn new() -> Self {
        Self { size: 0 }
    }

    fn size(&self) -> usize {
        self.size
    }

    fn resize(&mut self, delta: i64) -> Result<usize, SchedError> {
        let new_size = self.size as i64 + delta;
        if new_size < 0 {
            return Err(SchedError::Exhausted);
        }
        self.size = new_size as usize;
        Ok(self.size)
    }

    fn clone_for_fork(&self) -> Result<Self, SchedError> {
        Ok(Self { size: self.size })
    }

    fn copy_out_status(&mut self, _addr: usize, _status: i32) -> Result<(), SchedError> {
        Ok(())
    }
}
