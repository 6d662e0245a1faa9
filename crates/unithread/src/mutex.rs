//! Mutual exclusion with explicit, unpaired operations.
//!
//! [`Mutex`] exposes lock/unlock as separate calls in the classic style:
//! a guardless surface whose lifecycle rules are pinned down by the
//! transition contract in `unithread-core`. The owner word makes unlock by
//! a non-owner a defined `NotPermitted` failure instead of undefined
//! behavior, and proves to the backend that the caller holds the lock.
//!
//! Plain semantics only: relocking from the holding thread deadlocks, and
//! acquisition order among waiters is unspecified. On the emulated backend,
//! `timed_lock` precision is bounded by the polling interval.

use std::sync::atomic::{AtomicU64, Ordering};

use unithread_core::mutex::PRIO_CEILING_INERT;
use unithread_core::time::Timespec;
use unithread_core::{Error, Result};

use crate::platform::{Backend, HostBackend};
use crate::thread;

/// Mutual-exclusion object on capability set `B`.
///
/// Created by [`Mutex::new`] (the init step) and destroyed on drop; a mutex
/// must not be dropped while any thread holds it.
pub struct Mutex<B: Backend> {
    raw: B::RawMutex,
    /// Raw id of the holding thread; 0 when unheld.
    owner: AtomicU64,
}

/// Mutex on the host capability set.
pub type HostMutex = Mutex<HostBackend>;

impl<B: Backend> Mutex<B> {
    /// Initialize a new mutex.
    pub fn new() -> Result<Self> {
        Ok(Self {
            raw: B::new_raw_mutex()?,
            owner: AtomicU64::new(0),
        })
    }

    /// Block until the mutex is acquired.
    pub fn lock(&self) -> Result<()> {
        B::lock(&self.raw)?;
        self.owner
            .store(thread::current().as_u64(), Ordering::Release);
        Ok(())
    }

    /// Non-blocking attempt; returns whether the mutex was acquired.
    pub fn try_lock(&self) -> bool {
        if B::try_lock(&self.raw) {
            self.owner
                .store(thread::current().as_u64(), Ordering::Release);
            true
        } else {
            false
        }
    }

    /// Acquire the mutex no later than `deadline`.
    ///
    /// `TimedOut` is the normal outcome when the deadline lapses first, and
    /// is reported immediately when the deadline already passed.
    pub fn timed_lock(&self, deadline: Timespec) -> Result<()> {
        B::timed_lock(&self.raw, deadline)?;
        self.owner
            .store(thread::current().as_u64(), Ordering::Release);
        Ok(())
    }

    /// Release the mutex. Fails with `NotPermitted` when the calling thread
    /// is not the holder.
    pub fn unlock(&self) -> Result<()> {
        let me = thread::current().as_u64();
        if self
            .owner
            .compare_exchange(me, 0, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(Error::NotPermitted);
        }
        // SAFETY: the owner word proved the calling thread holds the lock.
        unsafe { B::unlock(&self.raw) };
        Ok(())
    }

    /// Priority ceiling of this mutex. No ceiling protocol is implemented;
    /// the inert value is reported unconditionally.
    #[must_use]
    pub fn priority_ceiling(&self) -> i32 {
        PRIO_CEILING_INERT
    }

    /// Accept a ceiling change and report the previous (inert) value. The
    /// request has no effect rather than having failed.
    pub fn set_priority_ceiling(&self, _ceiling: i32) -> i32 {
        PRIO_CEILING_INERT
    }

    /// Robust-mutex consistency acknowledgment; inert success.
    pub fn mark_consistent(&self) -> Result<()> {
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
