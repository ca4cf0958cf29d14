//! Deadline-overrun policies.
//!
//! The policy is a pure strategy fixed at instance creation. Dispatch is a
//! `match` on the tagged variant; nothing is inspected at runtime beyond the
//! variant itself, and the only state a policy may touch is the stop-request
//! flag (Stop variant only).

use crate::clock::MonoTime;
use crate::instance::Shared;

/// What the worker does when a tick finishes past its deadline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OverrunPolicy {
    /// Emit a diagnostic, then request a cooperative stop.
    #[default]
    Stop,
    /// Emit a diagnostic describing the overshoot; keep running.
    Notify,
    /// No observable effect; keep running.
    Ignore,
}

impl OverrunPolicy {
    /// Apply the policy to one detected overrun.
    ///
    /// `now` is when the task actually finished, `deadline` is when it should
    /// have, `start` is the loop's start timestamp (diagnostics only).
    pub(crate) fn handle(self, shared: &Shared, now: MonoTime, deadline: MonoTime, start: MonoTime) {
        match self {
            Self::Ignore => {}
            Self::Notify => notify(now, deadline, start),
            Self::Stop => {
                notify(now, deadline, start);
                tracing::warn!("stopping periodic worker after deadline overrun");
                shared.request_stop();
            }
        }
    }
}

fn notify(now: MonoTime, deadline: MonoTime, start: MonoTime) {
    tracing::warn!(
        elapsed_s = now.seconds_since(start),
        overshoot_ns = now.nanos_since(deadline),
        "task overran its period deadline"
    );
}
