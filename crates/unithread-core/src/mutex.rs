//! Mutex transition contract.
//!
//! The runtime mutex implements plain (non-recursive) mutual exclusion with
//! an explicit init/destroy lifecycle and a deadline-bounded acquisition.
//! This module pins those semantics down as a deterministic state machine so
//! the runtime and its tests agree on every `(state, operation)` pair.

use crate::status::{EBUSY, EINVAL, EPERM, ETIMEDOUT};

/// Inert priority ceiling reported when the platform has no ceiling protocol.
pub const PRIO_CEILING_INERT: i32 = 0;

// ---------------------------------------------------------------------------
// Contract state machine
// ---------------------------------------------------------------------------

/// Abstract lifecycle state of a mutex as observed by one thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockState {
    /// Memory has not been initialized as a mutex.
    Uninitialized,
    /// Initialized and currently unlocked.
    Unlocked,
    /// Locked by the calling thread.
    HeldBySelf,
    /// Locked by a different thread.
    HeldByOther,
    /// Destroyed; must be reinitialized before reuse.
    Destroyed,
}

/// Operations covered by the contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockOp {
    Init,
    Lock,
    TryLock,
    /// Bounded acquisition. `deadline_expired` is true when the absolute
    /// deadline already passed at the time of the call.
    TimedLock { deadline_expired: bool },
    Unlock,
    Destroy,
}

/// Deterministic outcome of applying an operation in a given state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LockOutcome {
    /// Next abstract state.
    pub next: LockState,
    /// errno-style result (0 on success).
    pub errno: i32,
    /// Whether the operation may block awaiting another thread.
    pub blocks: bool,
}

const fn outcome(next: LockState, errno: i32, blocks: bool) -> LockOutcome {
    LockOutcome {
        next,
        errno,
        blocks,
    }
}

/// Transition table for the plain mutex.
///
/// Notable rows: relocking from the holding thread blocks forever (plain
/// semantics, no deadlock detection); unlock by a non-owner is `EPERM`;
/// destroy while locked is `EBUSY`; a timed lock whose deadline already
/// passed reports `ETIMEDOUT` without blocking, even if the mutex is free.
#[must_use]
pub const fn lock_transition(state: LockState, op: LockOp) -> LockOutcome {
    match state {
        LockState::Uninitialized | LockState::Destroyed => match op {
            LockOp::Init => outcome(LockState::Unlocked, 0, false),
            _ => outcome(state, EINVAL, false),
        },
        LockState::Unlocked => match op {
            LockOp::Init => outcome(LockState::Unlocked, EBUSY, false),
            LockOp::Lock | LockOp::TryLock => outcome(LockState::HeldBySelf, 0, false),
            LockOp::TimedLock { deadline_expired } => {
                if deadline_expired {
                    outcome(LockState::Unlocked, ETIMEDOUT, false)
                } else {
                    outcome(LockState::HeldBySelf, 0, false)
                }
            }
            LockOp::Unlock => outcome(LockState::Unlocked, EPERM, false),
            LockOp::Destroy => outcome(LockState::Destroyed, 0, false),
        },
        LockState::HeldByOther => match op {
            LockOp::Init => outcome(LockState::HeldByOther, EBUSY, false),
            LockOp::Lock => outcome(LockState::HeldByOther, 0, true),
            LockOp::TryLock => outcome(LockState::HeldByOther, EBUSY, false),
            LockOp::TimedLock { deadline_expired } => {
                if deadline_expired {
                    outcome(LockState::HeldByOther, ETIMEDOUT, false)
                } else {
                    // Bounded block: acquires if released in time, else times out.
                    outcome(LockState::HeldByOther, ETIMEDOUT, true)
                }
            }
            LockOp::Unlock => outcome(LockState::HeldByOther, EPERM, false),
            LockOp::Destroy => outcome(LockState::HeldByOther, EBUSY, false),
        },
        LockState::HeldBySelf => match op {
            LockOp::Init => outcome(LockState::HeldBySelf, EBUSY, false),
            // Plain semantics: self-relock blocks with no owner to wake it.
            LockOp::Lock => outcome(LockState::HeldBySelf, 0, true),
            LockOp::TryLock => outcome(LockState::HeldBySelf, EBUSY, false),
            LockOp::TimedLock { deadline_expired } => {
                if deadline_expired {
                    outcome(LockState::HeldBySelf, ETIMEDOUT, false)
                } else {
                    outcome(LockState::HeldBySelf, ETIMEDOUT, true)
                }
            }
            LockOp::Unlock => outcome(LockState::Unlocked, 0, false),
            LockOp::Destroy => outcome(LockState::HeldBySelf, EBUSY, false),
        },
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
