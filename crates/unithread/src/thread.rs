//! Thread lifecycle: spawn, join, detach, identity, exit.
//!
//! Every runtime thread owns an explicit [`ThreadContext`], created at
//! thread start and torn down at exit. The context carries the thread's
//! cancellation cell and (on a delivery-capable host) its platform identity;
//! other threads touch it only through the narrow request/query operations.
//!
//! A [`ThreadHandle`] is consumed by `join` or `detach`, so exactly one of
//! the two can ever be performed, and never twice.

use std::cell::OnceCell;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::thread;

use log::{debug, trace};

use unithread_core::cancel::CancelCell;
use unithread_core::{Error, Result};

use crate::once::OnceGuard;
use crate::platform::{Backend, HostBackend};

static NEXT_THREAD_ID: AtomicU64 = AtomicU64::new(1);
static EXIT_HOOK: OnceGuard = OnceGuard::new();

thread_local! {
    static CURRENT: OnceCell<Arc<ThreadContext>> = const { OnceCell::new() };
}

// ---------------------------------------------------------------------------
// Identity
// ---------------------------------------------------------------------------

/// Identifier for a thread known to the runtime.
///
/// Ids are unique for the lifetime of the process; equality comparison is
/// the portable way to ask whether two identifiers name the same thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ThreadId(u64);

impl ThreadId {
    /// Raw value, usable as an owner word.
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

/// How a runtime thread ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitStatus {
    /// The entry function returned, or the thread called [`exit`];
    /// the value is propagated to the joiner on every platform.
    Completed(usize),
    /// The thread terminated at a cancellation test point.
    Cancelled,
}

/// Unwind payload for controlled thread termination.
pub(crate) enum ThreadExit {
    Exited(usize),
    Cancelled,
}

// ---------------------------------------------------------------------------
// Per-thread context
// ---------------------------------------------------------------------------

/// Runtime-owned state for one thread.
pub struct ThreadContext {
    id: ThreadId,
    alive: AtomicBool,
    pub(crate) cancel: CancelCell,
    #[cfg(target_os = "linux")]
    native_handle: AtomicU64,
}

impl ThreadContext {
    fn fresh() -> Arc<Self> {
        Arc::new(Self {
            id: ThreadId(NEXT_THREAD_ID.fetch_add(1, Ordering::Relaxed)),
            alive: AtomicBool::new(true),
            cancel: CancelCell::new(),
            #[cfg(target_os = "linux")]
            native_handle: AtomicU64::new(0),
        })
    }

    /// This thread's identifier.
    #[must_use]
    pub fn id(&self) -> ThreadId {
        self.id
    }

    pub(crate) fn is_alive(&self) -> bool {
        self.alive.load(Ordering::Acquire)
    }

    fn mark_exited(&self) {
        self.alive.store(false, Ordering::Release);
    }

    #[cfg(target_os = "linux")]
    pub(crate) fn set_native_handle(&self, handle: u64) {
        self.native_handle.store(handle, Ordering::Release);
    }

    #[cfg(target_os = "linux")]
    pub(crate) fn native_handle(&self) -> u64 {
        self.native_handle.load(Ordering::Acquire)
    }
}

/// Context of the calling thread. Threads not spawned by the runtime (the
/// main thread included) get one lazily on first use.
pub(crate) fn current_context() -> Arc<ThreadContext> {
    CURRENT.with(|cell| Arc::clone(cell.get_or_init(ThreadContext::fresh)))
}

fn bind_current(ctx: &Arc<ThreadContext>) {
    CURRENT.with(|cell| {
        let _ = cell.set(Arc::clone(ctx));
    });
}

/// Identifier of the calling thread.
#[must_use]
pub fn current() -> ThreadId {
    current_context().id()
}

// ---------------------------------------------------------------------------
// Spawn
// ---------------------------------------------------------------------------

/// Creation-time attributes. `Default` means platform defaults throughout.
#[derive(Debug, Clone, Default)]
pub struct ThreadAttributes {
    /// Stack size in bytes for the new thread.
    pub stack_size: Option<usize>,
    /// Name reported in logs and panic messages.
    pub name: Option<String>,
}

/// Owning handle for a spawned thread.
///
/// `join` and `detach` consume the handle, so each thread is joined or
/// detached exactly once.
pub struct ThreadHandle {
    ctx: Arc<ThreadContext>,
    join: thread::JoinHandle<ExitStatus>,
}

impl ThreadHandle {
    /// Identifier of the thread behind this handle.
    #[must_use]
    pub fn id(&self) -> ThreadId {
        self.ctx.id()
    }

    pub(crate) fn context(&self) -> &Arc<ThreadContext> {
        &self.ctx
    }

    /// Wait for the thread to finish and collect how it ended.
    ///
    /// A worker that panicked outside the controlled exit paths reports
    /// `Failed`.
    pub fn join(self) -> Result<ExitStatus> {
        match self.join.join() {
            Ok(status) => Ok(status),
            Err(_) => Err(Error::Failed),
        }
    }

    /// Let the thread run to completion on its own; its resources are
    /// reclaimed when it exits.
    pub fn detach(self) {
        trace!("detached thread {:?}", self.ctx.id());
        drop(self.join);
    }
}

/// Spawn a new thread running `entry`.
///
/// The returned value of `entry` is propagated to whoever joins the handle.
/// Creation failure surfaces as `ResourceExhausted`; nothing is retried.
pub fn spawn<F>(attrs: ThreadAttributes, entry: F) -> Result<ThreadHandle>
where
    F: FnOnce() -> usize + Send + 'static,
{
    install_exit_hook();

    let mut builder = thread::Builder::new();
    if let Some(size) = attrs.stack_size {
        builder = builder.stack_size(size);
    }
    if let Some(name) = attrs.name {
        builder = builder.name(name);
    }

    let ctx = ThreadContext::fresh();
    let worker_ctx = Arc::clone(&ctx);
    let join = builder
        .spawn(move || run_thread(&worker_ctx, entry))
        .map_err(|err| {
            debug!("thread spawn failed: {err}");
            Error::ResourceExhausted
        })?;
    trace!("spawned thread {:?}", ctx.id());
    Ok(ThreadHandle { ctx, join })
}

fn run_thread<F>(ctx: &Arc<ThreadContext>, entry: F) -> ExitStatus
where
    F: FnOnce() -> usize,
{
    bind_current(ctx);
    HostBackend::register_current(ctx);

    let result = panic::catch_unwind(AssertUnwindSafe(entry));
    ctx.mark_exited();

    match result {
        Ok(retval) => ExitStatus::Completed(retval),
        Err(payload) => match payload.downcast::<ThreadExit>() {
            Ok(exit) => match *exit {
                ThreadExit::Exited(retval) => ExitStatus::Completed(retval),
                ThreadExit::Cancelled => {
                    trace!("thread {:?} cancelled at test point", ctx.id());
                    ExitStatus::Cancelled
                }
            },
            // A genuine panic: let it reach the joiner as a join failure.
            Err(payload) => panic::resume_unwind(payload),
        },
    }
}

/// Terminate the calling thread, propagating `retval` to the joiner.
///
/// Must be called from a thread created by [`spawn`]; on any other thread
/// the unwind has no trampoline to absorb it.
pub fn exit(retval: usize) -> ! {
    panic::panic_any(ThreadExit::Exited(retval))
}

/// Controlled exits unwind with a private payload; keep them out of the
/// default panic output.
fn install_exit_hook() {
    EXIT_HOOK.call_once(|| {
        let previous = panic::take_hook();
        panic::set_hook(Box::new(move |info| {
            if info.payload().downcast_ref::<ThreadExit>().is_none() {
                previous(info);
            }
        }));
    });
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
