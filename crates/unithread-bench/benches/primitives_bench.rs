//! Primitive overhead benchmarks.
//!
//! Measures the uncontended fast paths: lock/unlock on each backend, the
//! completed once-guard, the polled timed lock on a free mutex, and the pure
//! deadline conversion.

use criterion::{Criterion, criterion_group, criterion_main};

use unithread::platform::EmulatedBackend;
use unithread::{HostMutex, Mutex, OnceGuard, get_realtime};
use unithread_core::time::{Timespec, remaining_millis};

fn bench_host_lock_unlock(c: &mut Criterion) {
    let mutex: HostMutex = Mutex::new().expect("mutex");
    c.bench_function("host_lock_unlock", |b| {
        b.iter(|| {
            mutex.lock().expect("lock");
            mutex.unlock().expect("unlock");
        });
    });
}

fn bench_emulated_lock_unlock(c: &mut Criterion) {
    let mutex: Mutex<EmulatedBackend> = Mutex::new().expect("mutex");
    c.bench_function("emulated_lock_unlock", |b| {
        b.iter(|| {
            mutex.lock().expect("lock");
            mutex.unlock().expect("unlock");
        });
    });
}

fn bench_emulated_trylock(c: &mut Criterion) {
    let mutex: Mutex<EmulatedBackend> = Mutex::new().expect("mutex");
    c.bench_function("emulated_trylock", |b| {
        b.iter(|| {
            criterion::black_box(mutex.try_lock());
            mutex.unlock().expect("unlock");
        });
    });
}

fn bench_timed_lock_free(c: &mut Criterion) {
    let mutex: Mutex<EmulatedBackend> = Mutex::new().expect("mutex");
    c.bench_function("emulated_timed_lock_free", |b| {
        b.iter(|| {
            let deadline = get_realtime().offset_millis(100);
            mutex.timed_lock(deadline).expect("timed lock");
            mutex.unlock().expect("unlock");
        });
    });
}

fn bench_once_completed_fast_path(c: &mut Criterion) {
    let guard = OnceGuard::new();
    guard.call_once(|| {});
    c.bench_function("once_completed_fast_path", |b| {
        b.iter(|| {
            guard.call_once(|| unreachable!("guard already complete"));
            criterion::black_box(guard.is_complete());
        });
    });
}

fn bench_deadline_conversion(c: &mut Criterion) {
    let now = Timespec::new(1_700_000_000, 250_000_000);
    let deadline = Timespec::new(1_700_000_001, 100_000_000);
    c.bench_function("deadline_conversion", |b| {
        b.iter(|| criterion::black_box(remaining_millis(deadline, now)));
    });
}

criterion_group!(
    benches,
    bench_host_lock_unlock,
    bench_emulated_lock_unlock,
    bench_emulated_trylock,
    bench_timed_lock_free,
    bench_once_completed_fast_path,
    bench_deadline_conversion
);
criterion_main!(benches);
