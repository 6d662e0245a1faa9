//! Status codes shared by every operation in the portability layer.
//!
//! The public surface reports failures from a small closed set. The contract
//! state machines in this crate speak errno-style integers; the runtime crate
//! speaks [`Error`]. The two are kept in bidirectional correspondence here so
//! neither layer invents codes the other cannot express.

use thiserror::Error;

// ---------------------------------------------------------------------------
// errno-style constants
// ---------------------------------------------------------------------------

/// Operation not permitted (unlock by a non-owner, join after detach).
pub const EPERM: i32 = 1;
/// Resource temporarily unavailable (thread creation failed).
pub const EAGAIN: i32 = 11;
/// Device or resource busy (trylock on a held mutex, destroy while locked).
pub const EBUSY: i32 = 16;
/// Invalid argument.
pub const EINVAL: i32 = 22;
/// Connection timed out (timed lock deadline elapsed).
pub const ETIMEDOUT: i32 = 110;

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

/// Closed failure set for the portability layer.
///
/// `TimedOut` is an expected outcome of a bounded wait, not a fault; callers
/// of `timed_lock` must treat it as a normal branch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Error {
    /// A handle or argument was malformed or out of range.
    #[error("invalid argument")]
    InvalidArgument,
    /// The host had no resources left to create a thread or mutex.
    #[error("resource exhausted")]
    ResourceExhausted,
    /// A bounded wait reached its deadline without acquiring the resource.
    #[error("timed out")]
    TimedOut,
    /// The caller does not own the resource it tried to release.
    #[error("operation not permitted")]
    NotPermitted,
    /// Unclassified failure reported by the underlying primitive.
    #[error("operation failed")]
    Failed,
}

/// Result alias used across the workspace.
pub type Result<T> = core::result::Result<T, Error>;

impl Error {
    /// The errno-style integer for this error.
    #[must_use]
    pub const fn errno(self) -> i32 {
        match self {
            Error::InvalidArgument => EINVAL,
            Error::ResourceExhausted => EAGAIN,
            Error::TimedOut => ETIMEDOUT,
            Error::NotPermitted => EPERM,
            Error::Failed => EBUSY,
        }
    }

    /// Map an errno-style integer back into the closed set.
    ///
    /// Returns `None` for `0` (success is not an error) and folds unknown
    /// codes into `Failed` rather than widening the set.
    #[must_use]
    pub const fn from_errno(code: i32) -> Option<Error> {
        match code {
            0 => None,
            EINVAL => Some(Error::InvalidArgument),
            EAGAIN => Some(Error::ResourceExhausted),
            ETIMEDOUT => Some(Error::TimedOut),
            EPERM => Some(Error::NotPermitted),
            _ => Some(Error::Failed),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
