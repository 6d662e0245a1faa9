//! Deadline arithmetic.
//!
//! Converts an absolute deadline plus a sampled "now" into a relative wait
//! budget for the polled timed lock. Pure computation; the runtime crate owns
//! clock sampling.

/// Nanoseconds per second.
pub const NANOS_PER_SEC: i64 = 1_000_000_000;
/// Nanoseconds per millisecond.
pub const NANOS_PER_MILLI: i64 = 1_000_000;
/// Milliseconds per second.
pub const MILLIS_PER_SEC: i64 = 1_000;

/// Clock identifiers accepted when sampling a timestamp.
pub const CLOCK_REALTIME: i32 = 0;
pub const CLOCK_MONOTONIC: i32 = 1;

/// Returns `true` if `clock_id` is a known valid clock.
#[inline]
#[must_use]
pub fn valid_clock_id(clock_id: i32) -> bool {
    matches!(clock_id, CLOCK_REALTIME | CLOCK_MONOTONIC)
}

/// An absolute point in time: whole seconds plus a sub-second remainder.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Timespec {
    /// Seconds since the epoch.
    pub tv_sec: i64,
    /// Nanoseconds (0 to 999_999_999 when normalized).
    pub tv_nsec: i64,
}

impl Timespec {
    /// Construct a timespec without normalizing.
    #[must_use]
    pub const fn new(tv_sec: i64, tv_nsec: i64) -> Self {
        Self { tv_sec, tv_nsec }
    }

    /// Returns `true` when the sub-second remainder is in range.
    #[must_use]
    pub const fn is_valid(&self) -> bool {
        self.tv_nsec >= 0 && self.tv_nsec < NANOS_PER_SEC
    }

    /// The timespec `millis` milliseconds after `self`, normalized.
    #[must_use]
    pub fn offset_millis(&self, millis: i64) -> Self {
        let mut sec = self.tv_sec.saturating_add(millis.div_euclid(MILLIS_PER_SEC));
        let mut nsec = self.tv_nsec + millis.rem_euclid(MILLIS_PER_SEC) * NANOS_PER_MILLI;
        if nsec >= NANOS_PER_SEC {
            nsec -= NANOS_PER_SEC;
            sec = sec.saturating_add(1);
        }
        Self {
            tv_sec: sec,
            tv_nsec: nsec,
        }
    }
}

/// Signed millisecond budget remaining until `deadline`, given `now`.
///
/// When the sub-second remainder of `now` exceeds that of the deadline, one
/// second is borrowed from the seconds difference and a full second of
/// nanoseconds is added back before dividing. A non-positive result means the
/// deadline has already passed; callers must report timeout without polling.
#[must_use]
pub fn remaining_millis(deadline: Timespec, now: Timespec) -> i64 {
    let mut sec_diff = deadline.tv_sec.saturating_sub(now.tv_sec);
    let mut nsec_diff = deadline.tv_nsec - now.tv_nsec;
    if nsec_diff < 0 {
        nsec_diff += NANOS_PER_SEC;
        sec_diff = sec_diff.saturating_sub(1);
    }
    sec_diff
        .saturating_mul(MILLIS_PER_SEC)
        .saturating_add(nsec_diff / NANOS_PER_MILLI)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
