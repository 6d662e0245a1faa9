//! Deadline-bounded acquisition, exercised on the emulated backend where the
//! bounded wait is synthesized by polling, plus pass-through spot checks on
//! the host backend.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread as os_thread;
use std::time::{Duration, Instant};

use unithread::platform::EmulatedBackend;
use unithread::{Error, HostMutex, Mutex, get_realtime};

type PolledMutex = Mutex<EmulatedBackend>;

#[test]
fn past_deadline_times_out_without_blocking() {
    let m: PolledMutex = Mutex::new().expect("mutex");
    let deadline = get_realtime().offset_millis(-200);

    let start = Instant::now();
    assert_eq!(m.timed_lock(deadline), Err(Error::TimedOut));
    // The contract allows at most one polling interval of slack; leave CI
    // headroom well below any real poll loop.
    assert!(start.elapsed() < Duration::from_millis(50));
}

#[test]
fn past_deadline_times_out_even_when_free() {
    // The mutex is unheld, but an expired deadline must still fail without
    // an acquisition attempt being polled.
    let m: PolledMutex = Mutex::new().expect("mutex");
    let deadline = get_realtime().offset_millis(-1);
    assert_eq!(m.timed_lock(deadline), Err(Error::TimedOut));
    // Still free afterwards.
    assert!(m.try_lock());
    m.unlock().expect("unlock");
}

#[test]
fn acquires_when_holder_releases_within_budget() {
    let m: Arc<PolledMutex> = Arc::new(Mutex::new().expect("mutex"));
    let held = Arc::new(AtomicBool::new(false));

    let holder = {
        let m = Arc::clone(&m);
        let held = Arc::clone(&held);
        os_thread::spawn(move || {
            m.lock().expect("holder lock");
            held.store(true, Ordering::Release);
            os_thread::sleep(Duration::from_millis(30));
            m.unlock().expect("holder unlock");
        })
    };

    while !held.load(Ordering::Acquire) {
        os_thread::sleep(Duration::from_millis(1));
    }

    // Deadline far beyond the holder's release point.
    let deadline = get_realtime().offset_millis(2_000);
    assert_eq!(m.timed_lock(deadline), Ok(()));
    m.unlock().expect("unlock");

    holder.join().expect("holder join");
}

#[test]
fn times_out_when_holder_never_releases_in_budget() {
    let m: Arc<PolledMutex> = Arc::new(Mutex::new().expect("mutex"));
    let held = Arc::new(AtomicBool::new(false));
    let release = Arc::new(AtomicBool::new(false));

    let holder = {
        let m = Arc::clone(&m);
        let held = Arc::clone(&held);
        let release = Arc::clone(&release);
        os_thread::spawn(move || {
            m.lock().expect("holder lock");
            held.store(true, Ordering::Release);
            while !release.load(Ordering::Acquire) {
                os_thread::sleep(Duration::from_millis(1));
            }
            m.unlock().expect("holder unlock");
        })
    };

    while !held.load(Ordering::Acquire) {
        os_thread::sleep(Duration::from_millis(1));
    }

    let deadline = get_realtime().offset_millis(40);
    let start = Instant::now();
    assert_eq!(m.timed_lock(deadline), Err(Error::TimedOut));
    let waited = start.elapsed();
    // Never held past the deadline by more than one polling interval, with
    // generous scheduler headroom for CI.
    assert!(waited >= Duration::from_millis(30), "waited {waited:?}");
    assert!(waited < Duration::from_millis(500), "waited {waited:?}");

    release.store(true, Ordering::Release);
    holder.join().expect("holder join");
}

#[test]
fn host_backend_honors_the_same_contract() {
    let m: HostMutex = Mutex::new().expect("mutex");

    let live = get_realtime().offset_millis(200);
    assert_eq!(m.timed_lock(live), Ok(()));
    m.unlock().expect("unlock");

    let expired = get_realtime().offset_millis(-200);
    let start = Instant::now();
    m.lock().expect("lock");
    assert_eq!(m.timed_lock(expired), Err(Error::TimedOut));
    assert!(start.elapsed() < Duration::from_millis(100));
    m.unlock().expect("unlock");
}

#[test]
fn malformed_deadline_is_rejected() {
    let m: PolledMutex = Mutex::new().expect("mutex");
    let bad = unithread::Timespec::new(1, 1_000_000_000);
    assert_eq!(m.timed_lock(bad), Err(Error::InvalidArgument));
}
