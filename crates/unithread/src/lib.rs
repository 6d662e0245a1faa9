//! # unithread
//!
//! Uniform threading primitives that behave the same over two capability
//! sets: a native-capable host (kernel bounded waits, signal-assisted
//! cancellation delivery) and an emulated one built from nothing more than
//! non-time-boxed mutual exclusion with a non-blocking attempt.
//!
//! The façade covers thread create/join/detach/self/exit, mutexes with
//! lock/trylock/timedlock, exactly-once initialization, and cooperative
//! cancellation. The backend is selected once at build time
//! ([`platform::HostBackend`]); call sites never branch on platform
//! identity.
//!
//! ## Documented limitations
//!
//! - On the emulated backend, `timed_lock` polls a non-blocking attempt at
//!   a fixed interval; timeout precision is bounded by that interval, not
//!   exact.
//! - On the emulated backend, cancellation is strictly cooperative. A
//!   request never interrupts a blocked thread; it takes effect only when
//!   the target reaches [`test_cancellation_point`]. Use
//!   [`cancel::async_cancel_capable`] to ask what the host provides.

#![deny(unsafe_code)]

pub mod cancel;
#[allow(unsafe_code)]
pub mod clock;
#[allow(unsafe_code)]
pub mod mutex;
pub mod once;
#[allow(unsafe_code)]
pub mod platform;
pub mod thread;

pub use unithread_core::cancel::{CancelState, CancelType};
pub use unithread_core::once::OncePhase;
pub use unithread_core::status::{Error, Result};
pub use unithread_core::time::Timespec;

pub use cancel::{cancel, set_cancel_state, set_cancel_type, test_cancellation_point};
pub use clock::realtime as get_realtime;
pub use mutex::{HostMutex, Mutex};
pub use once::OnceGuard;
pub use platform::{Backend, EmulatedBackend, HostBackend};
pub use thread::{
    ExitStatus, ThreadAttributes, ThreadHandle, ThreadId, current, exit, spawn,
};
