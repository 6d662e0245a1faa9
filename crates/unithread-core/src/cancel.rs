//! Per-thread cancellation state machine.
//!
//! Tracks the `{enabled, disabled} x {deferred, asynchronous}` state plus a
//! pending-request flag. The cell is platform-free: the runtime decides how a
//! request is delivered (signal on a capable platform, flag-only elsewhere)
//! and when a test point consults [`CancelCell::should_interrupt`].
//!
//! Other threads touch a cell only through [`CancelCell::request`] and the
//! read-side accessors; state and type are owned by the thread itself.

use core::sync::atomic::{AtomicBool, AtomicU8, Ordering};

/// Whether cancellation requests may take effect on this thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelState {
    Enabled,
    Disabled,
}

impl CancelState {
    const fn as_raw(self) -> u8 {
        match self {
            CancelState::Enabled => 0,
            CancelState::Disabled => 1,
        }
    }

    const fn from_raw(raw: u8) -> Self {
        if raw == 0 {
            CancelState::Enabled
        } else {
            CancelState::Disabled
        }
    }
}

/// When an accepted cancellation request takes effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelType {
    /// Only at an explicit test point inside the target thread.
    Deferred,
    /// At any point, including while blocked. Honored only on a platform
    /// with a delivery mechanism that can interrupt blocking calls.
    Asynchronous,
}

impl CancelType {
    const fn as_raw(self) -> u8 {
        match self {
            CancelType::Deferred => 0,
            CancelType::Asynchronous => 1,
        }
    }

    const fn from_raw(raw: u8) -> Self {
        if raw == 0 {
            CancelType::Deferred
        } else {
            CancelType::Asynchronous
        }
    }
}

/// Cancellation state for one thread.
///
/// Starts enabled and deferred. The pending flag latches: once a request has
/// been made it stays visible until the thread acts on it.
#[derive(Debug)]
pub struct CancelCell {
    state: AtomicU8,
    cancel_type: AtomicU8,
    pending: AtomicBool,
}

impl CancelCell {
    /// A fresh cell in the initial enabled + deferred state.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            state: AtomicU8::new(0),
            cancel_type: AtomicU8::new(0),
            pending: AtomicBool::new(false),
        }
    }

    /// Replace the enable/disable state, returning the previous value.
    pub fn set_state(&self, new: CancelState) -> CancelState {
        CancelState::from_raw(self.state.swap(new.as_raw(), Ordering::AcqRel))
    }

    /// Current enable/disable state.
    #[must_use]
    pub fn state(&self) -> CancelState {
        CancelState::from_raw(self.state.load(Ordering::Acquire))
    }

    /// Replace the cancellation type, returning the previous value.
    pub fn set_type(&self, new: CancelType) -> CancelType {
        CancelType::from_raw(self.cancel_type.swap(new.as_raw(), Ordering::AcqRel))
    }

    /// Current cancellation type.
    #[must_use]
    pub fn cancel_type(&self) -> CancelType {
        CancelType::from_raw(self.cancel_type.load(Ordering::Acquire))
    }

    /// Record an out-of-band cancellation request for this thread.
    pub fn request(&self) {
        self.pending.store(true, Ordering::Release);
    }

    /// Whether a request has been recorded and not yet acted on.
    #[must_use]
    pub fn pending(&self) -> bool {
        self.pending.load(Ordering::Acquire)
    }

    /// Whether a test point reached now must terminate the thread.
    #[must_use]
    pub fn should_interrupt(&self) -> bool {
        self.state() == CancelState::Enabled && self.pending()
    }
}

impl Default for CancelCell {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn initial_state_is_enabled_deferred() {
        let cell = CancelCell::new();
        assert_eq!(cell.state(), CancelState::Enabled);
        assert_eq!(cell.cancel_type(), CancelType::Deferred);
        assert!(!cell.pending());
        assert!(!cell.should_interrupt());
    }

    #[test]
    fn set_state_returns_previous() {
        let cell = CancelCell::new();
        assert_eq!(cell.set_state(CancelState::Disabled), CancelState::Enabled);
        assert_eq!(cell.set_state(CancelState::Enabled), CancelState::Disabled);
    }

    #[test]
    fn set_type_returns_previous() {
        let cell = CancelCell::new();
        assert_eq!(cell.set_type(CancelType::Asynchronous), CancelType::Deferred);
        assert_eq!(cell.set_type(CancelType::Deferred), CancelType::Asynchronous);
    }

    #[test]
    fn state_and_type_are_independent() {
        let cell = CancelCell::new();
        cell.set_state(CancelState::Disabled);
        assert_eq!(cell.cancel_type(), CancelType::Deferred);
        cell.set_type(CancelType::Asynchronous);
        assert_eq!(cell.state(), CancelState::Disabled);
    }

    #[test]
    fn round_trip_restores_original() {
        let cell = CancelCell::new();
        let prev = cell.set_state(CancelState::Disabled);
        let restored = cell.set_state(prev);
        assert_eq!(restored, CancelState::Disabled);
        assert_eq!(cell.state(), CancelState::Enabled);
    }

    #[test]
    fn pending_request_latches() {
        let cell = CancelCell::new();
        cell.request();
        assert!(cell.pending());
        cell.request();
        assert!(cell.pending());
    }

    #[test]
    fn interrupt_requires_enabled_and_pending() {
        let cell = CancelCell::new();
        assert!(!cell.should_interrupt());

        cell.request();
        assert!(cell.should_interrupt());

        cell.set_state(CancelState::Disabled);
        assert!(!cell.should_interrupt());

        // Re-enabling makes the still-pending request visible again.
        cell.set_state(CancelState::Enabled);
        assert!(cell.should_interrupt());
    }
}
