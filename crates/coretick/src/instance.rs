//! Instance record and lifecycle API.
//!
//! A [`TickInstance`] owns everything the periodic execution needs: the
//! configuration snapshot, the task closure, the shared atomic block the
//! worker and controller coordinate through, and the worker thread handle.
//!
//! Lifecycle: created (dormant) → running → finished (loop exited, thread
//! still joinable) → joined → destroyed. The transitions live in a single
//! atomic state word; the stop request is a separate monotonic flag because
//! it is a request from the controller, not a lifecycle fact owned by the
//! worker.

use crate::clock::MonoTime;
use crate::config::TickConfig;
use crate::error::{CoreError, CoreResult};
use crate::worker;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::{Arc, OnceLock, mpsc};
use std::thread::{self, JoinHandle};

/// Task callback: invoked once per tick. A non-zero return value terminates
/// the loop and becomes the instance's exit result.
pub type TaskFn = Box<dyn FnMut() -> i64 + Send + 'static>;

/// Lifecycle states, stored as a single atomic word.
pub(crate) mod lifecycle {
    pub const DORMANT: u8 = 0;
    pub const RUNNING: u8 = 1;
    pub const FINISHED: u8 = 2;
    pub const JOINED: u8 = 3;
}

/// State shared between the worker thread and the controlling context.
///
/// Accessed exclusively through atomics; the hot loop never takes a lock.
pub(crate) struct Shared {
    state: AtomicU8,
    stop: AtomicBool,
    start: OnceLock<MonoTime>,
}

impl Shared {
    pub(crate) fn new() -> Self {
        Self {
            state: AtomicU8::new(lifecycle::DORMANT),
            stop: AtomicBool::new(false),
            start: OnceLock::new(),
        }
    }

    /// Request a cooperative stop. Monotonic: never reset once set.
    ///
    /// Release ordering pairs with the acquire load at the top of each loop
    /// iteration, so the worker observes the request no later than the start
    /// of its next iteration.
    pub(crate) fn request_stop(&self) {
        self.stop.store(true, Ordering::Release);
    }

    pub(crate) fn stop_requested(&self) -> bool {
        self.stop.load(Ordering::Acquire)
    }

    /// Worker-only: mark the loop as exited. Release ordering guarantees an
    /// acquire observer of `FINISHED` sees every loop-internal write.
    pub(crate) fn mark_finished(&self) {
        self.state.store(lifecycle::FINISHED, Ordering::Release);
    }

    pub(crate) fn state(&self) -> u8 {
        self.state.load(Ordering::Acquire)
    }

    /// Worker-only: record the loop's start timestamp, exactly once.
    pub(crate) fn set_start(&self, start: MonoTime) {
        let _ = self.start.set(start);
    }

    pub(crate) fn start_time(&self) -> Option<MonoTime> {
        self.start.get().copied()
    }
}

/// A periodic execution instance: one task, one dedicated worker thread.
///
/// See the crate docs for the full lifecycle contract. The instance is the
/// exclusive owner of the worker thread; dropping it before `join` detaches
/// the thread (with a warning) because Rust destructors cannot fail.
pub struct TickInstance {
    config: TickConfig,
    shared: Arc<Shared>,
    task: Option<TaskFn>,
    handle: Option<JoinHandle<i64>>,
}

impl TickInstance {
    /// Create a dormant instance from a task and configuration.
    ///
    /// The configuration is validated and copied; later changes to the
    /// caller's value have no effect. The worker thread is not spawned yet.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidConfig`] if the configuration is invalid.
    pub fn new<F>(task: F, config: TickConfig) -> CoreResult<Self>
    where
        F: FnMut() -> i64 + Send + 'static,
    {
        config.validate()?;
        Ok(Self {
            config,
            shared: Arc::new(Shared::new()),
            task: Some(Box::new(task)),
            handle: None,
        })
    }

    /// Spawn the worker thread and start periodic execution.
    ///
    /// The worker applies the configured scheduling class, priority, and
    /// affinity to itself and confirms the outcome before this call returns,
    /// so a refusal (e.g. missing privilege for `SCHED_FIFO`) surfaces here
    /// synchronously. After a failed `run` the instance is terminal: the dead
    /// thread has already been reaped and `destroy` is allowed.
    ///
    /// # Errors
    ///
    /// - [`CoreError::AlreadyStarted`] on a second call.
    /// - [`CoreError::Start`] if spawning or real-time setup fails under
    ///   strict scheduling.
    pub fn run(&mut self) -> CoreResult<()> {
        self.shared
            .state
            .compare_exchange(
                lifecycle::DORMANT,
                lifecycle::RUNNING,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .map_err(|_| CoreError::AlreadyStarted)?;

        // CAS succeeded, so this thread is the only one that can reach the
        // take(); the task is always present here.
        let Some(task) = self.task.take() else {
            return Err(CoreError::AlreadyStarted);
        };

        let (ready_tx, ready_rx) = mpsc::channel::<Result<(), String>>();
        let config = self.config.clone();
        let shared = Arc::clone(&self.shared);

        let spawned = thread::Builder::new()
            .name("coretick-worker".into())
            .spawn(move || worker::run_loop(config, shared, task, ready_tx));

        let handle = match spawned {
            Ok(handle) => handle,
            Err(err) => {
                self.shared.state.store(lifecycle::JOINED, Ordering::Release);
                return Err(CoreError::Start(err.to_string()));
            }
        };

        match ready_rx.recv() {
            Ok(Ok(())) => {
                tracing::debug!("periodic worker confirmed real-time setup");
                self.handle = Some(handle);
                Ok(())
            }
            Ok(Err(reason)) => {
                let _ = handle.join();
                self.shared.state.store(lifecycle::JOINED, Ordering::Release);
                Err(CoreError::Start(reason))
            }
            Err(_) => {
                let _ = handle.join();
                self.shared.state.store(lifecycle::JOINED, Ordering::Release);
                Err(CoreError::Start(
                    "worker exited before confirming real-time setup".into(),
                ))
            }
        }
    }

    /// Request a cooperative stop.
    ///
    /// Always succeeds, is idempotent, and does not wait for the worker to
    /// observe it; the worker performs at most one more task invocation.
    pub fn stop(&self) {
        self.shared.request_stop();
    }

    /// Whether the worker loop has exited. Never blocks.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.shared.state() >= lifecycle::FINISHED
    }

    /// Block until the worker thread exits and return its exit result.
    ///
    /// The result is the last non-zero task return value, or 0 if the loop
    /// exited because of a stop request or a `stop_after` bound.
    ///
    /// # Errors
    ///
    /// - [`CoreError::NotStarted`] if `run` was never called.
    /// - [`CoreError::AlreadyJoined`] on a second call.
    /// - [`CoreError::WorkerPanicked`] if the worker died by panic or forced
    ///   cancellation; the thread is still reaped and the instance becomes
    ///   joined.
    pub fn join(&mut self) -> CoreResult<i64> {
        let Some(handle) = self.handle.take() else {
            return Err(if self.shared.state() == lifecycle::DORMANT {
                CoreError::NotStarted
            } else {
                CoreError::AlreadyJoined
            });
        };

        let outcome = handle.join();
        self.shared.state.store(lifecycle::JOINED, Ordering::Release);
        match outcome {
            Ok(result) => {
                tracing::debug!(result, "periodic worker joined");
                Ok(result)
            }
            Err(_) => Err(CoreError::WorkerPanicked),
        }
    }

    /// Forcibly cancel the worker thread without cooperative shutdown.
    ///
    /// Last-resort escape hatch: the task body is interrupted at an arbitrary
    /// cancellation point, with no cleanup guarantees for resources it holds.
    /// `join` must still be called afterwards to reap the thread; it will
    /// report [`CoreError::WorkerPanicked`].
    ///
    /// # Safety
    ///
    /// The cancelled thread unwinds through arbitrary frames. The caller must
    /// ensure the task holds no resources whose destructors are unsound to
    /// skip and must not rely on the worker's state afterwards.
    ///
    /// # Errors
    ///
    /// - [`CoreError::NotStarted`] / [`CoreError::AlreadyJoined`] if there is
    ///   no live thread handle.
    /// - [`CoreError::Terminate`] if cancellation fails.
    #[cfg(target_os = "linux")]
    pub unsafe fn terminate(&self) -> CoreResult<()> {
        use std::os::unix::thread::JoinHandleExt;

        let Some(handle) = self.handle.as_ref() else {
            return Err(if self.shared.state() == lifecycle::DORMANT {
                CoreError::NotStarted
            } else {
                CoreError::AlreadyJoined
            });
        };
        tracing::warn!("forcibly terminating periodic worker");
        // SAFETY: the handle is live (not yet joined), so the pthread id is
        // valid; the caller upholds the cancellation contract above.
        unsafe { crate::platform::cancel(handle.as_pthread_t()) }.map_err(CoreError::Terminate)
    }

    /// Forced termination is unavailable off Linux.
    ///
    /// # Safety
    ///
    /// No-op beyond returning the error; kept `unsafe` for signature parity
    /// with the Linux implementation.
    ///
    /// # Errors
    ///
    /// Always returns [`CoreError::TerminateUnsupported`].
    #[cfg(not(target_os = "linux"))]
    pub unsafe fn terminate(&self) -> CoreResult<()> {
        Err(CoreError::TerminateUnsupported)
    }

    /// Release the instance.
    ///
    /// Refused unless the worker has been joined: a still-running or unjoined
    /// thread may still reference the shared state, so the instance is handed
    /// back untouched inside the error.
    ///
    /// # Errors
    ///
    /// Returns `(self, CoreError::Busy)` if the worker has not been joined.
    pub fn destroy(self) -> Result<(), (Self, CoreError)> {
        if self.shared.state() == lifecycle::JOINED {
            Ok(())
        } else {
            Err((self, CoreError::Busy))
        }
    }

    /// The monotonic timestamp at which the worker loop started, if it has.
    #[must_use]
    pub fn started_at(&self) -> Option<MonoTime> {
        self.shared.start_time()
    }

    /// The configuration snapshot this instance runs with.
    #[must_use]
    pub fn config(&self) -> &TickConfig {
        &self.config
    }
}

impl Drop for TickInstance {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            // Destructors cannot fail, so the unjoined-thread guard degrades
            // to a stop request plus detach.
            self.shared.request_stop();
            tracing::warn!("periodic instance dropped before join; detaching worker thread");
            drop(handle);
        }
    }
}

impl std::fmt::Debug for TickInstance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TickInstance")
            .field("config", &self.config)
            .field("state", &self.shared.state())
            .field("stop_requested", &self.shared.stop_requested())
            .finish()
    }
}
