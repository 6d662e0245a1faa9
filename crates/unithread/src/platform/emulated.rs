//! Deficient-platform backend.
//!
//! The host primitive offers only non-time-boxed mutual exclusion with a
//! non-blocking attempt, and no way to interrupt a blocked thread. The
//! bounded wait is synthesized by polling `try_lock` at a fixed interval;
//! timeout precision is therefore bounded by [`POLL_INTERVAL`], not exact.
//! Cancellation is cooperative only: a request becomes visible solely when
//! the target reaches a test point.

use std::thread;
use std::time::{Duration, Instant};

use log::trace;
use parking_lot::RawMutex as RawLock;
use parking_lot::lock_api::RawMutex as _;

use unithread_core::time::{self, Timespec};
use unithread_core::{Error, Result};

use super::Backend;
use crate::clock;
use crate::thread::ThreadContext;

/// Fixed retry interval for the polled timed lock. A waiter is never held
/// past its deadline by more than this interval.
pub const POLL_INTERVAL: Duration = Duration::from_millis(1);

/// Backend for hosts without bounded waits or cancellation delivery.
pub struct EmulatedBackend;

impl Backend for EmulatedBackend {
    type RawMutex = RawLock;
    const ASYNC_CANCEL: bool = false;

    fn new_raw_mutex() -> Result<RawLock> {
        Ok(RawLock::INIT)
    }

    fn lock(raw: &RawLock) -> Result<()> {
        raw.lock();
        Ok(())
    }

    fn try_lock(raw: &RawLock) -> bool {
        raw.try_lock()
    }

    unsafe fn unlock(raw: &RawLock) {
        // SAFETY: forwarded contract; the caller holds the lock.
        unsafe { raw.unlock() }
    }

    /// Polled bounded acquisition built from the non-blocking attempt.
    ///
    /// Acquisition order among concurrent waiters is unspecified: whichever
    /// waiter's next attempt lands first wins.
    fn timed_lock(raw: &RawLock, deadline: Timespec) -> Result<()> {
        if !deadline.is_valid() {
            return Err(Error::InvalidArgument);
        }
        let budget = time::remaining_millis(deadline, clock::realtime());
        if budget <= 0 {
            // Deadline already passed: report timeout without polling.
            return Err(Error::TimedOut);
        }
        let budget = Duration::from_millis(budget as u64);
        let start = Instant::now();
        loop {
            if raw.try_lock() {
                return Ok(());
            }
            if start.elapsed() >= budget {
                break;
            }
            thread::sleep(POLL_INTERVAL);
        }
        // The budget can lapse between the last sleep and the elapsed check;
        // one final attempt closes that race.
        if raw.try_lock() {
            return Ok(());
        }
        trace!("timed lock expired after {budget:?} budget");
        Err(Error::TimedOut)
    }

    fn register_current(_ctx: &ThreadContext) {}

    fn set_cancel_mask(_enabled: bool) {}

    fn notify_cancel(_target: &ThreadContext) {
        // No delivery mechanism exists: the pending flag latched by the
        // requester is all a cooperative target will ever observe.
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trylock_reflects_contention() {
        let raw = EmulatedBackend::new_raw_mutex().expect("raw mutex");
        assert!(EmulatedBackend::try_lock(&raw));
        assert!(!EmulatedBackend::try_lock(&raw));
        // SAFETY: acquired above.
        unsafe { EmulatedBackend::unlock(&raw) };
        assert!(EmulatedBackend::try_lock(&raw));
        // SAFETY: acquired above.
        unsafe { EmulatedBackend::unlock(&raw) };
    }

    #[test]
    fn expired_deadline_fails_without_polling() {
        let raw = EmulatedBackend::new_raw_mutex().expect("raw mutex");
        let deadline = clock::realtime().offset_millis(-50);
        let start = Instant::now();
        let result = EmulatedBackend::timed_lock(&raw, deadline);
        assert_eq!(result, Err(Error::TimedOut));
        // Must return well within one polling interval.
        assert!(start.elapsed() < Duration::from_millis(50));
    }

    #[test]
    fn free_mutex_acquires_within_budget() {
        let raw = EmulatedBackend::new_raw_mutex().expect("raw mutex");
        let deadline = clock::realtime().offset_millis(500);
        assert_eq!(EmulatedBackend::timed_lock(&raw, deadline), Ok(()));
        // SAFETY: acquired above.
        unsafe { EmulatedBackend::unlock(&raw) };
    }

    #[test]
    fn malformed_deadline_is_invalid_argument() {
        let raw = EmulatedBackend::new_raw_mutex().expect("raw mutex");
        let deadline = Timespec::new(1, 2_000_000_000);
        assert_eq!(
            EmulatedBackend::timed_lock(&raw, deadline),
            Err(Error::InvalidArgument)
        );
    }
}
