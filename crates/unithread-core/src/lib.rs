//! # unithread-core
//!
//! Pure contract logic for the unithread portability layer: the closed
//! status set, deadline arithmetic, the mutex transition contract, the
//! per-thread cancellation state machine, and the once-guard phase
//! vocabulary. No platform access and no `unsafe` code; the runtime crate
//! builds the working primitives on top of these.

#![deny(unsafe_code)]

pub mod cancel;
pub mod mutex;
pub mod once;
pub mod status;
pub mod time;

pub use cancel::{CancelCell, CancelState, CancelType};
pub use mutex::{LockOp, LockOutcome, LockState, PRIO_CEILING_INERT, lock_transition};
pub use once::OncePhase;
pub use status::{Error, Result};
pub use time::{Timespec, remaining_millis};
