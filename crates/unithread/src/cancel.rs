//! Cooperative cancellation.
//!
//! A request latches a pending flag in the target's context. On a host with
//! signal delivery the target is additionally nudged so blocking calls
//! return early; on the emulated capability set the flag is all there is.
//! Either way, termination happens only when the target itself reaches
//! [`test_cancellation_point`] with cancellation enabled. Callers must not
//! rely on preemptive interruption on the emulated set; that gap is part of
//! the platform contract, not a defect.

use log::debug;

use unithread_core::Result;
use unithread_core::cancel::{CancelState, CancelType};

use crate::platform::{Backend, HostBackend};
use crate::thread::{ThreadExit, ThreadHandle, current_context};

/// Whether the host can interrupt a blocked thread on request. When false,
/// cancellation only takes effect at test points.
#[must_use]
pub fn async_cancel_capable() -> bool {
    HostBackend::ASYNC_CANCEL
}

/// Request cancellation of the thread behind `handle`.
///
/// Always accepted: the pending flag is latched immediately, and delivery is
/// attempted if the host supports it and the thread is still running. The
/// handle's ownership guarantees it names a live-or-joinable thread.
pub fn cancel(handle: &ThreadHandle) -> Result<()> {
    let ctx = handle.context();
    debug!("cancellation requested for thread {:?}", ctx.id());
    ctx.cancel.request();
    if ctx.is_alive() {
        HostBackend::notify_cancel(ctx);
    }
    Ok(())
}

/// Replace the calling thread's cancellability, returning the previous
/// value. Enabling opens the host's delivery window for this thread;
/// disabling closes it, so a pending external request manifests only while
/// cancellation is enabled.
pub fn set_cancel_state(new: CancelState) -> CancelState {
    let prev = current_context().cancel.set_state(new);
    HostBackend::set_cancel_mask(new == CancelState::Enabled);
    prev
}

/// Replace the calling thread's cancellation type, returning the previous
/// value. Asynchronous type is recorded, but termination still happens at
/// test points; the type only widens how eagerly a blocked call is
/// interrupted on a delivery-capable host.
pub fn set_cancel_type(new: CancelType) -> CancelType {
    current_context().cancel.set_type(new)
}

/// Designated cancellation test point.
///
/// If the calling thread has cancellation enabled and a request pending, the
/// thread terminates here exactly as if it had called `exit`; the joiner
/// observes [`crate::thread::ExitStatus::Cancelled`]. Otherwise a no-op.
pub fn test_cancellation_point() {
    if current_context().cancel.should_interrupt() {
        std::panic::panic_any(ThreadExit::Cancelled);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::thread::{ExitStatus, ThreadAttributes, spawn};

    #[test]
    fn state_round_trip_reports_previous() {
        let handle = spawn(ThreadAttributes::default(), || {
            let prev = set_cancel_state(CancelState::Disabled);
            assert_eq!(prev, CancelState::Enabled);
            let prev = set_cancel_state(prev);
            assert_eq!(prev, CancelState::Disabled);
            0
        })
        .expect("spawn");
        assert_eq!(handle.join(), Ok(ExitStatus::Completed(0)));
    }

    #[test]
    fn type_round_trip_reports_previous() {
        let handle = spawn(ThreadAttributes::default(), || {
            let prev = set_cancel_type(CancelType::Asynchronous);
            assert_eq!(prev, CancelType::Deferred);
            let prev = set_cancel_type(prev);
            assert_eq!(prev, CancelType::Asynchronous);
            0
        })
        .expect("spawn");
        assert_eq!(handle.join(), Ok(ExitStatus::Completed(0)));
    }

    #[test]
    fn test_point_is_noop_without_request() {
        let handle = spawn(ThreadAttributes::default(), || {
            test_cancellation_point();
            5
        })
        .expect("spawn");
        assert_eq!(handle.join(), Ok(ExitStatus::Completed(5)));
    }

    #[test]
    fn capability_flag_matches_backend() {
        assert_eq!(async_cancel_capable(), HostBackend::ASYNC_CANCEL);
    }
}
