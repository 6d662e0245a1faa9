//! Native-capable backend.
//!
//! The host supplies pthread mutexes with a kernel-resolved bounded wait, so
//! `timed_lock` is a direct pass-through. Cancellation delivery rides on a
//! dedicated signal: an empty handler is armed once, enabling cancellation
//! unblocks the signal in the calling thread's mask, and a request delivers
//! it to the target so blocking calls return early. Termination still
//! happens at the target's next test point.

use std::cell::UnsafeCell;
use std::mem;
use std::ptr;

use log::{debug, trace};

use unithread_core::status::{EAGAIN, EINVAL};
use unithread_core::time::Timespec;
use unithread_core::{Error, Result};

use super::Backend;
use crate::once::OnceGuard;
use crate::thread::ThreadContext;

/// Signal used to interrupt a blocking call on a cancellation request.
const CANCEL_SIGNAL: libc::c_int = libc::SIGUSR1;

static CANCEL_HANDLER: OnceGuard = OnceGuard::new();

// ---------------------------------------------------------------------------
// Raw mutex
// ---------------------------------------------------------------------------

/// Heap-pinned pthread mutex. The box keeps the address stable for the
/// lifetime of the object even when the owning wrapper moves.
pub struct NativeRawMutex {
    inner: Box<UnsafeCell<libc::pthread_mutex_t>>,
}

// SAFETY: pthread mutexes are made for cross-thread use; the cell is only
// ever handed to pthread calls.
unsafe impl Send for NativeRawMutex {}
// SAFETY: see above.
unsafe impl Sync for NativeRawMutex {}

impl NativeRawMutex {
    fn as_ptr(&self) -> *mut libc::pthread_mutex_t {
        self.inner.get()
    }
}

impl Drop for NativeRawMutex {
    fn drop(&mut self) {
        // SAFETY: initialized in new_raw_mutex. A mutex must not be dropped
        // while any thread holds it; that lifecycle rule is the caller's.
        unsafe {
            libc::pthread_mutex_destroy(self.as_ptr());
        }
    }
}

fn init_error(rc: i32) -> Error {
    const ENOMEM: i32 = 12;
    match rc {
        EAGAIN | ENOMEM => Error::ResourceExhausted,
        EINVAL => Error::InvalidArgument,
        _ => Error::Failed,
    }
}

// ---------------------------------------------------------------------------
// Cancellation signal plumbing
// ---------------------------------------------------------------------------

extern "C" fn cancel_signal_handler(_sig: libc::c_int) {
    // Nothing to do here: delivery alone interrupts a blocking call, and the
    // pending flag is consulted at the target's next test point.
}

fn install_cancel_handler() {
    CANCEL_HANDLER.call_once(|| {
        // SAFETY: installs a no-op handler for CANCEL_SIGNAL. sa_flags
        // deliberately omits SA_RESTART so interrupted calls return early.
        unsafe {
            let mut sa: libc::sigaction = mem::zeroed();
            let handler: extern "C" fn(libc::c_int) = cancel_signal_handler;
            sa.sa_sigaction = handler as usize;
            sa.sa_flags = 0;
            libc::sigemptyset(&mut sa.sa_mask);
            libc::sigaction(CANCEL_SIGNAL, &sa, ptr::null_mut());
        }
    });
}

fn cancel_signal_set() -> libc::sigset_t {
    // SAFETY: sigemptyset/sigaddset only write into the local set.
    unsafe {
        let mut set: libc::sigset_t = mem::zeroed();
        libc::sigemptyset(&mut set);
        libc::sigaddset(&mut set, CANCEL_SIGNAL);
        set
    }
}

// ---------------------------------------------------------------------------
// Backend
// ---------------------------------------------------------------------------

/// Backend for hosts with kernel bounded waits and signal delivery.
pub struct NativeBackend;

impl Backend for NativeBackend {
    type RawMutex = NativeRawMutex;
    const ASYNC_CANCEL: bool = true;

    fn new_raw_mutex() -> Result<NativeRawMutex> {
        let raw = NativeRawMutex {
            inner: Box::new(UnsafeCell::new(libc::PTHREAD_MUTEX_INITIALIZER)),
        };
        // SAFETY: as_ptr points at heap storage that outlives this call.
        let rc = unsafe { libc::pthread_mutex_init(raw.as_ptr(), ptr::null()) };
        if rc == 0 { Ok(raw) } else { Err(init_error(rc)) }
    }

    fn lock(raw: &NativeRawMutex) -> Result<()> {
        // SAFETY: raw points at an initialized mutex.
        let rc = unsafe { libc::pthread_mutex_lock(raw.as_ptr()) };
        match Error::from_errno(rc) {
            None => Ok(()),
            Some(err) => Err(err),
        }
    }

    fn try_lock(raw: &NativeRawMutex) -> bool {
        // SAFETY: raw points at an initialized mutex.
        unsafe { libc::pthread_mutex_trylock(raw.as_ptr()) == 0 }
    }

    unsafe fn unlock(raw: &NativeRawMutex) {
        // SAFETY: raw is initialized and the caller holds the lock.
        unsafe {
            libc::pthread_mutex_unlock(raw.as_ptr());
        }
    }

    /// Kernel-resolved bounded wait; the platform adds no logic of its own.
    fn timed_lock(raw: &NativeRawMutex, deadline: Timespec) -> Result<()> {
        if !deadline.is_valid() {
            return Err(Error::InvalidArgument);
        }
        let ts = libc::timespec {
            tv_sec: deadline.tv_sec as libc::time_t,
            tv_nsec: deadline.tv_nsec as libc::c_long,
        };
        // SAFETY: both pointers are valid for the duration of the call.
        let rc = unsafe { libc::pthread_mutex_timedlock(raw.as_ptr(), &ts) };
        match Error::from_errno(rc) {
            None => Ok(()),
            Some(err) => Err(err),
        }
    }

    fn register_current(ctx: &ThreadContext) {
        // SAFETY: pthread_self has no preconditions.
        let handle = unsafe { libc::pthread_self() } as u64;
        ctx.set_native_handle(handle);
    }

    fn set_cancel_mask(enabled: bool) {
        install_cancel_handler();
        let set = cancel_signal_set();
        let how = if enabled {
            libc::SIG_UNBLOCK
        } else {
            libc::SIG_BLOCK
        };
        // SAFETY: the set is initialized; the previous mask is not needed.
        unsafe {
            libc::pthread_sigmask(how, &set, ptr::null_mut());
        }
        trace!(
            "cancel delivery {} for calling thread",
            if enabled { "unblocked" } else { "blocked" }
        );
    }

    fn notify_cancel(target: &ThreadContext) {
        install_cancel_handler();
        let handle = target.native_handle();
        if handle == 0 {
            // Foreign or not yet registered thread: flag-only delivery.
            return;
        }
        // The target may exit between the caller's liveness check and this
        // delivery; ESRCH is benign because the pthread handle is not
        // reclaimed until the thread is joined.
        // SAFETY: handle was recorded by register_current on a live thread.
        let rc = unsafe { libc::pthread_kill(handle as libc::pthread_t, CANCEL_SIGNAL) };
        if rc != 0 {
            debug!("cancel delivery to {:?} returned {rc}", target.id());
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
