//! Exactly-once initialization.
//!
//! [`OnceGuard`] drives a zero-argument initializer to completion exactly
//! once across any number of racing first-callers. Behavior is identical on
//! both capability sets; no platform facility is involved.

use std::mem;
use std::sync::atomic::{AtomicU8, Ordering};

use unithread_core::once::OncePhase;

/// One-time initialization guard.
///
/// Exactly one of any set of racing first-callers runs the initializer while
/// the rest block until it completes; every later call returns immediately.
/// Recursive use (the initializer calling back into the same guard)
/// deadlocks and is undefined per the contract.
pub struct OnceGuard {
    phase: AtomicU8,
    /// Private to the guard; never handed out for unrelated exclusion.
    gate: parking_lot::Mutex<()>,
}

impl OnceGuard {
    /// A guard in the not-started phase.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            phase: AtomicU8::new(OncePhase::NotStarted.as_raw()),
            gate: parking_lot::Mutex::new(()),
        }
    }

    /// Current lifecycle phase.
    #[must_use]
    pub fn phase(&self) -> OncePhase {
        OncePhase::from_raw(self.phase.load(Ordering::Acquire))
    }

    /// Whether the initializer has run to completion.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.phase() == OncePhase::Complete
    }

    /// Run `init` unless a previous call already completed it.
    ///
    /// Callers racing an in-progress initializer block until it finishes,
    /// then return without running `init`. If the initializer unwinds, the
    /// guard rolls back to not-started and a later caller may retry; the
    /// body has then executed zero complete times.
    pub fn call_once<F: FnOnce()>(&self, init: F) {
        if self.is_complete() {
            return;
        }
        let _gate = self.gate.lock();
        if self.is_complete() {
            return;
        }
        self.phase
            .store(OncePhase::InProgress.as_raw(), Ordering::Release);
        let reset = PhaseReset(self);
        init();
        // Initializer returned normally: disarm the rollback.
        mem::forget(reset);
        self.phase
            .store(OncePhase::Complete.as_raw(), Ordering::Release);
    }
}

impl Default for OnceGuard {
    fn default() -> Self {
        Self::new()
    }
}

/// Rolls the phase back if the initializer unwinds.
struct PhaseReset<'a>(&'a OnceGuard);

impl Drop for PhaseReset<'_> {
    fn drop(&mut self) {
        self.0
            .phase
            .store(OncePhase::NotStarted.as_raw(), Ordering::Release);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::panic::{AssertUnwindSafe, catch_unwind};
    use std::sync::Arc;
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn runs_initializer_once() {
        let guard = OnceGuard::new();
        let mut runs = 0;
        guard.call_once(|| runs += 1);
        guard.call_once(|| runs += 1);
        assert_eq!(runs, 1);
        assert!(guard.is_complete());
    }

    #[test]
    fn phase_starts_not_started() {
        let guard = OnceGuard::new();
        assert_eq!(guard.phase(), OncePhase::NotStarted);
        assert!(!guard.is_complete());
    }

    #[test]
    fn racing_callers_observe_one_run() {
        let guard = Arc::new(OnceGuard::new());
        let runs = Arc::new(AtomicUsize::new(0));

        let mut workers = Vec::new();
        for _ in 0..8 {
            let guard = Arc::clone(&guard);
            let runs = Arc::clone(&runs);
            workers.push(std::thread::spawn(move || {
                guard.call_once(|| {
                    // Widen the race window so losers actually wait.
                    std::thread::sleep(std::time::Duration::from_millis(10));
                    runs.fetch_add(1, Ordering::SeqCst);
                });
                // Every caller returns with the guard complete.
                assert!(guard.is_complete());
            }));
        }
        for worker in workers {
            worker.join().expect("once caller panicked");
        }
        assert_eq!(runs.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn unwinding_initializer_allows_retry() {
        let guard = OnceGuard::new();
        let attempt = catch_unwind(AssertUnwindSafe(|| {
            guard.call_once(|| panic!("initializer failed"));
        }));
        assert!(attempt.is_err());
        assert_eq!(guard.phase(), OncePhase::NotStarted);

        let mut runs = 0;
        guard.call_once(|| runs += 1);
        assert_eq!(runs, 1);
        assert!(guard.is_complete());
    }
}
