//! Realtime clock sampling.
//!
//! Callers construct absolute deadlines for `timed_lock` from this sample.

use unithread_core::time::Timespec;

/// Sample the realtime clock.
#[cfg(unix)]
#[must_use]
pub fn realtime() -> Timespec {
    let mut ts = libc::timespec {
        tv_sec: 0,
        tv_nsec: 0,
    };
    // SAFETY: `ts` is a valid out-pointer and CLOCK_REALTIME is always
    // available on unix hosts.
    let rc = unsafe { libc::clock_gettime(libc::CLOCK_REALTIME, &mut ts) };
    debug_assert_eq!(rc, 0);
    Timespec::new(ts.tv_sec as i64, ts.tv_nsec as i64)
}

/// Sample the realtime clock.
#[cfg(not(unix))]
#[must_use]
pub fn realtime() -> Timespec {
    use std::time::{SystemTime, UNIX_EPOCH};

    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default();
    Timespec::new(now.as_secs() as i64, i64::from(now.subsec_nanos()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sample_is_normalized() {
        let now = realtime();
        assert!(now.is_valid());
        assert!(now.tv_sec > 0);
    }

    #[test]
    fn samples_are_monotonic_enough() {
        use unithread_core::time::remaining_millis;

        let a = realtime();
        std::thread::sleep(std::time::Duration::from_millis(5));
        let b = realtime();
        // b is later than a, so a's budget relative to b is non-positive.
        assert!(remaining_millis(a, b) <= 0);
        assert!(remaining_millis(b, a) >= 0);
    }
}
