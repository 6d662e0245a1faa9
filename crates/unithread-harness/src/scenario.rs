//! Conformance scenarios.
//!
//! Each scenario drives one observable property of the threading façade
//! through the public surface and reports pass/fail with a detail string.
//! Scenarios that depend on the synthesized bounded wait pin the emulated
//! backend explicitly; the rest run on the host capability set.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::thread as os_thread;
use std::time::{Duration, Instant};

use log::debug;

use unithread::platform::EmulatedBackend;
use unithread::{
    CancelState, CancelType, Error, ExitStatus, HostMutex, Mutex, OnceGuard, ThreadAttributes,
    cancel, get_realtime, set_cancel_state, set_cancel_type, spawn, test_cancellation_point,
};

/// Outcome of a single scenario body.
pub type ScenarioResult = Result<(), String>;

/// One named conformance check.
pub struct Scenario {
    /// Stable identifier used for selection on the command line.
    pub name: &'static str,
    /// One-line description of the property under test.
    pub summary: &'static str,
    run: fn() -> ScenarioResult,
}

impl Scenario {
    /// Execute the scenario body.
    pub fn run(&self) -> ScenarioResult {
        debug!("running scenario {}", self.name);
        (self.run)()
    }
}

/// The full scenario suite, in execution order.
#[must_use]
pub fn all() -> Vec<Scenario> {
    vec![
        Scenario {
            name: "once_exactly_once",
            summary: "concurrent first-callers run the initializer exactly once",
            run: once_exactly_once,
        },
        Scenario {
            name: "lock_excludes_trylock",
            summary: "a held mutex rejects trylock until unlocked",
            run: lock_excludes_trylock,
        },
        Scenario {
            name: "expired_deadline_times_out",
            summary: "a past deadline reports timeout without blocking",
            run: expired_deadline_times_out,
        },
        Scenario {
            name: "timed_lock_acquires_in_budget",
            summary: "a bounded wait succeeds when the holder releases in time",
            run: timed_lock_acquires_in_budget,
        },
        Scenario {
            name: "cancel_state_round_trip",
            summary: "state and type setters report the previous value",
            run: cancel_state_round_trip,
        },
        Scenario {
            name: "counter_under_mutex",
            summary: "four workers serialize a shared counter",
            run: counter_under_mutex,
        },
        Scenario {
            name: "cancel_at_test_point",
            summary: "a pending request terminates the worker at its test point",
            run: cancel_at_test_point,
        },
        Scenario {
            name: "cooperative_gap_is_disclosed",
            summary: "a worker that reaches no test point completes despite a request",
            run: cooperative_gap_is_disclosed,
        },
        Scenario {
            name: "inert_surfaces_accept",
            summary: "ceiling and consistency requests answer inert success",
            run: inert_surfaces_accept,
        },
        Scenario {
            name: "contract_matches_live_mutex",
            summary: "the transition contract agrees with the working mutex",
            run: contract_matches_live_mutex,
        },
    ]
}

fn check(cond: bool, detail: &str) -> ScenarioResult {
    if cond {
        Ok(())
    } else {
        Err(detail.to_owned())
    }
}

// ---------------------------------------------------------------------------
// Scenario bodies
// ---------------------------------------------------------------------------

fn once_exactly_once() -> ScenarioResult {
    const CALLERS: usize = 8;

    let guard = Arc::new(OnceGuard::new());
    let runs = Arc::new(AtomicUsize::new(0));

    let mut handles = Vec::new();
    for _ in 0..CALLERS {
        let guard = Arc::clone(&guard);
        let runs = Arc::clone(&runs);
        let handle = spawn(ThreadAttributes::default(), move || {
            guard.call_once(|| {
                os_thread::sleep(Duration::from_millis(10));
                runs.fetch_add(1, Ordering::SeqCst);
            });
            usize::from(guard.is_complete())
        })
        .map_err(|err| format!("spawn failed: {err}"))?;
        handles.push(handle);
    }

    for handle in handles {
        match handle.join() {
            Ok(ExitStatus::Completed(1)) => {}
            other => return Err(format!("caller ended as {other:?}")),
        }
    }
    check(
        runs.load(Ordering::SeqCst) == 1,
        "initializer ran more than once",
    )
}

fn lock_excludes_trylock() -> ScenarioResult {
    let mutex: Arc<HostMutex> = Arc::new(Mutex::new().map_err(|err| err.to_string())?);
    mutex.lock().map_err(|err| err.to_string())?;

    let probe = Arc::clone(&mutex);
    let handle = spawn(ThreadAttributes::default(), move || {
        usize::from(probe.try_lock())
    })
    .map_err(|err| format!("spawn failed: {err}"))?;
    let contended = handle.join().map_err(|err| err.to_string())?;
    if contended != ExitStatus::Completed(0) {
        return Err("trylock succeeded against a held mutex".to_owned());
    }

    mutex.unlock().map_err(|err| err.to_string())?;

    let probe = Arc::clone(&mutex);
    let handle = spawn(ThreadAttributes::default(), move || {
        let acquired = probe.try_lock();
        if acquired {
            let _ = probe.unlock();
        }
        usize::from(acquired)
    })
    .map_err(|err| format!("spawn failed: {err}"))?;
    let released = handle.join().map_err(|err| err.to_string())?;
    check(
        released == ExitStatus::Completed(1),
        "trylock failed after unlock",
    )
}

fn expired_deadline_times_out() -> ScenarioResult {
    let mutex: Mutex<EmulatedBackend> = Mutex::new().map_err(|err| err.to_string())?;
    let deadline = get_realtime().offset_millis(-100);

    let start = Instant::now();
    let outcome = mutex.timed_lock(deadline);
    let elapsed = start.elapsed();

    check(
        outcome == Err(Error::TimedOut) && elapsed < Duration::from_millis(50),
        &format!("outcome {outcome:?} after {elapsed:?}"),
    )
}

fn timed_lock_acquires_in_budget() -> ScenarioResult {
    let mutex: Arc<Mutex<EmulatedBackend>> = Arc::new(Mutex::new().map_err(|err| err.to_string())?);
    let held = Arc::new(AtomicBool::new(false));

    let holder = {
        let mutex = Arc::clone(&mutex);
        let held = Arc::clone(&held);
        spawn(ThreadAttributes::default(), move || {
            if mutex.lock().is_err() {
                return 1;
            }
            held.store(true, Ordering::Release);
            os_thread::sleep(Duration::from_millis(20));
            usize::from(mutex.unlock().is_err())
        })
        .map_err(|err| format!("spawn failed: {err}"))?
    };

    while !held.load(Ordering::Acquire) {
        os_thread::sleep(Duration::from_millis(1));
    }

    let deadline = get_realtime().offset_millis(2_000);
    let outcome = mutex.timed_lock(deadline);
    if outcome.is_ok() {
        mutex.unlock().map_err(|err| err.to_string())?;
    }

    let holder_end = holder.join().map_err(|err| err.to_string())?;
    if holder_end != ExitStatus::Completed(0) {
        return Err(format!("holder ended as {holder_end:?}"));
    }
    check(outcome.is_ok(), &format!("bounded wait ended as {outcome:?}"))
}

fn cancel_state_round_trip() -> ScenarioResult {
    let handle = spawn(ThreadAttributes::default(), || {
        let prev = set_cancel_state(CancelState::Disabled);
        if prev != CancelState::Enabled {
            return 1;
        }
        let prev = set_cancel_state(prev);
        if prev != CancelState::Disabled {
            return 2;
        }

        let prev = set_cancel_type(CancelType::Asynchronous);
        if prev != CancelType::Deferred {
            return 3;
        }
        let prev = set_cancel_type(prev);
        if prev != CancelType::Asynchronous {
            return 4;
        }
        0
    })
    .map_err(|err| format!("spawn failed: {err}"))?;

    let outcome = handle.join().map_err(|err| err.to_string())?;
    check(
        outcome == ExitStatus::Completed(0),
        &format!("round trip failed at step {outcome:?}"),
    )
}

fn counter_under_mutex() -> ScenarioResult {
    const WORKERS: usize = 4;

    let mutex: Arc<HostMutex> = Arc::new(Mutex::new().map_err(|err| err.to_string())?);
    let counter = Arc::new(AtomicUsize::new(0));

    let mut handles = Vec::new();
    for _ in 0..WORKERS {
        let mutex = Arc::clone(&mutex);
        let counter = Arc::clone(&counter);
        let handle = spawn(ThreadAttributes::default(), move || {
            if mutex.lock().is_err() {
                return 1;
            }
            let seen = counter.load(Ordering::Relaxed);
            counter.store(seen + 1, Ordering::Relaxed);
            usize::from(mutex.unlock().is_err())
        })
        .map_err(|err| format!("spawn failed: {err}"))?;
        handles.push(handle);
    }

    for handle in handles {
        match handle.join() {
            Ok(ExitStatus::Completed(0)) => {}
            other => return Err(format!("worker ended as {other:?}")),
        }
    }
    let total = counter.load(Ordering::SeqCst);
    check(total == WORKERS, &format!("counter is {total}"))
}

fn cancel_at_test_point() -> ScenarioResult {
    let proceed = Arc::new(AtomicBool::new(false));
    let body_ran = Arc::new(AtomicUsize::new(0));

    let handle = {
        let proceed = Arc::clone(&proceed);
        let body_ran = Arc::clone(&body_ran);
        spawn(ThreadAttributes::default(), move || {
            while !proceed.load(Ordering::Acquire) {
                os_thread::sleep(Duration::from_millis(1));
            }
            test_cancellation_point();
            body_ran.fetch_add(1, Ordering::SeqCst);
            0
        })
        .map_err(|err| format!("spawn failed: {err}"))?
    };

    cancel(&handle).map_err(|err| err.to_string())?;
    proceed.store(true, Ordering::Release);

    let outcome = handle.join().map_err(|err| err.to_string())?;
    if outcome != ExitStatus::Cancelled {
        return Err(format!("worker ended as {outcome:?}"));
    }
    check(
        body_ran.load(Ordering::SeqCst) == 0,
        "body ran past the test point",
    )
}

fn cooperative_gap_is_disclosed() -> ScenarioResult {
    let started = Arc::new(AtomicBool::new(false));

    let handle = {
        let started = Arc::clone(&started);
        spawn(ThreadAttributes::default(), move || {
            started.store(true, Ordering::Release);
            os_thread::sleep(Duration::from_millis(20));
            7
        })
        .map_err(|err| format!("spawn failed: {err}"))?
    };

    while !started.load(Ordering::Acquire) {
        os_thread::sleep(Duration::from_millis(1));
    }
    cancel(&handle).map_err(|err| err.to_string())?;

    let outcome = handle.join().map_err(|err| err.to_string())?;
    check(
        outcome == ExitStatus::Completed(7),
        &format!("worker without a test point ended as {outcome:?}"),
    )
}

fn inert_surfaces_accept() -> ScenarioResult {
    let mutex: HostMutex = Mutex::new().map_err(|err| err.to_string())?;

    let prev = mutex.set_priority_ceiling(42);
    let now = mutex.priority_ceiling();
    if prev != now {
        return Err(format!("ceiling drifted from {prev} to {now}"));
    }
    check(
        mutex.mark_consistent().is_ok(),
        "consistency acknowledgment failed",
    )
}

fn contract_matches_live_mutex() -> ScenarioResult {
    use unithread_core::mutex::{LockOp, LockState, lock_transition};
    use unithread_core::status::{EBUSY, ETIMEDOUT};

    let mutex: Arc<Mutex<EmulatedBackend>> = Arc::new(Mutex::new().map_err(|err| err.to_string())?);
    mutex.lock().map_err(|err| err.to_string())?;

    // From a second thread the mutex is held-by-other: trylock must report
    // busy, and an expired bounded wait must time out, exactly as the
    // transition contract predicts.
    let probe = Arc::clone(&mutex);
    let handle = spawn(ThreadAttributes::default(), move || {
        let mut mismatches = 0;

        let contract = lock_transition(LockState::HeldByOther, LockOp::TryLock);
        let live_busy = !probe.try_lock();
        if live_busy != (contract.errno == EBUSY) {
            mismatches += 1;
        }

        let contract = lock_transition(
            LockState::HeldByOther,
            LockOp::TimedLock {
                deadline_expired: true,
            },
        );
        let live = probe.timed_lock(get_realtime().offset_millis(-10));
        if (live == Err(Error::TimedOut)) != (contract.errno == ETIMEDOUT) {
            mismatches += 1;
        }
        if contract.blocks {
            mismatches += 1;
        }

        mismatches
    })
    .map_err(|err| format!("spawn failed: {err}"))?;

    let outcome = handle.join().map_err(|err| err.to_string())?;
    mutex.unlock().map_err(|err| err.to_string())?;

    check(
        outcome == ExitStatus::Completed(0),
        &format!("contract disagreement: {outcome:?}"),
    )
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
