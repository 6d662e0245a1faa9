//! Capability-set selection.
//!
//! Each platform backend bundles the primitives the rest of the crate needs:
//! a raw mutual-exclusion object, a bounded-wait acquisition (native or
//! emulated), and the cancellation delivery hooks. The host backend is
//! chosen once here; call sites use [`HostBackend`] and never branch on
//! platform identity.

use unithread_core::Result;
use unithread_core::time::Timespec;

use crate::thread::ThreadContext;

#[allow(unsafe_code)]
pub mod emulated;
#[cfg(target_os = "linux")]
#[allow(unsafe_code)]
pub mod native;

pub use emulated::EmulatedBackend;
#[cfg(target_os = "linux")]
pub use native::NativeBackend;

/// Capability set for the build host.
#[cfg(target_os = "linux")]
pub type HostBackend = native::NativeBackend;
/// Capability set for the build host.
#[cfg(not(target_os = "linux"))]
pub type HostBackend = emulated::EmulatedBackend;

/// Primitive operations supplied by a platform.
///
/// The emulated variant synthesizes the bounded wait from non-blocking
/// attempts and has no cancellation delivery; the native variant passes both
/// straight through to the host.
pub trait Backend: 'static {
    /// Raw mutual-exclusion object.
    type RawMutex: Send + Sync;

    /// Whether a cancellation request can interrupt the target thread while
    /// it is blocked. When false, cancellation is strictly cooperative and
    /// takes effect only at test points reached by the target itself.
    const ASYNC_CANCEL: bool;

    /// Create a raw mutex ready for locking.
    fn new_raw_mutex() -> Result<Self::RawMutex>;

    /// Block until the mutex is acquired.
    fn lock(raw: &Self::RawMutex) -> Result<()>;

    /// Non-blocking acquisition attempt.
    fn try_lock(raw: &Self::RawMutex) -> bool;

    /// Release the mutex.
    ///
    /// # Safety
    ///
    /// The calling thread must currently hold the lock.
    unsafe fn unlock(raw: &Self::RawMutex);

    /// Acquire the mutex no later than `deadline`, or report `TimedOut`.
    ///
    /// An already-expired deadline reports `TimedOut` without waiting.
    fn timed_lock(raw: &Self::RawMutex, deadline: Timespec) -> Result<()>;

    /// Record platform identity for the calling thread so cancellation can
    /// later be delivered to it.
    fn register_current(ctx: &ThreadContext);

    /// Open or close the calling thread's cancellation delivery window.
    /// Pending external requests manifest only while the window is open.
    fn set_cancel_mask(enabled: bool);

    /// Deliver a cancellation request to `target`. The requester has already
    /// latched the pending flag; this hook only provides the out-of-band
    /// nudge where the platform has one.
    fn notify_cancel(target: &ThreadContext);
}
