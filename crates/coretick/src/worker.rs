//! The hard-real-time loop run by the dedicated worker thread.
//!
//! Fixed-phase scheduling: the absolute deadline advances by exactly one
//! period *before* each task invocation, so overshoot is measured against the
//! deadline of the iteration just completed and drift never accumulates.
//! After an overrun the loop re-enters immediately without a catch-up sleep;
//! whether it keeps going is the overrun policy's decision.

use crate::clock::MonoTime;
use crate::config::TickConfig;
use crate::instance::{Shared, TaskFn};
use std::sync::Arc;
use std::sync::mpsc::Sender;

/// Worker thread entry point.
///
/// Applies real-time setup to the current thread and reports the outcome over
/// `ready` before entering the loop. The return value is the thread's exit
/// result: the last non-zero task return, or 0 for a stop-request or
/// `stop_after` exit.
pub(crate) fn run_loop(
    config: TickConfig,
    shared: Arc<Shared>,
    mut task: TaskFn,
    ready: Sender<Result<(), String>>,
) -> i64 {
    match crate::platform::apply_rt_to_current_thread(&config) {
        Ok(()) => {
            let _ = ready.send(Ok(()));
        }
        Err(reason) if config.strict_scheduling => {
            let _ = ready.send(Err(reason));
            shared.mark_finished();
            return 0;
        }
        Err(reason) => {
            tracing::warn!(%reason, "real-time setup refused; running without it");
            let _ = ready.send(Ok(()));
        }
    }

    let mut start = MonoTime::now();
    if let Some(boundary) = config.align_to {
        let aligned = start.align_up(boundary.as_nanos() as u64);
        crate::platform::sleep_until(aligned);
        start = aligned;
    }
    shared.set_start(start);
    tracing::debug!(
        period_us = config.period.as_micros() as u64,
        "periodic worker started"
    );

    let period_ns = config.period.as_nanos() as u64;
    let stop_after_ns = config.stop_after.map(|limit| limit.as_nanos() as i64);
    let mut deadline = start;
    let mut result: i64 = 0;

    while !shared.stop_requested() {
        if let Some(limit) = stop_after_ns {
            if MonoTime::now().nanos_since(start) >= limit {
                break;
            }
        }

        // Advance before invoking the task: the phase stays anchored to the
        // start timestamp regardless of how long the task runs.
        deadline = deadline.add_nanos(period_ns);

        let ret = task();
        if ret != 0 {
            result = ret;
            break;
        }

        let now = MonoTime::now();
        if now.nanos_since(deadline) > 0 {
            config.overrun.handle(&shared, now, deadline, start);
            continue;
        }

        crate::platform::sleep_until(deadline);
    }

    shared.mark_finished();
    tracing::debug!(result, "periodic worker exited");
    result
}
