//! Portable degraded platform layer for non-Linux targets.
//!
//! Timestamps are anchored to a process-local epoch and sleeps are relative
//! `std::thread::sleep` calls, so absolute-wait precision and real-time
//! scheduling are not available here. The engine still runs; the timing
//! guarantees do not hold.

use crate::clock::MonoTime;
use crate::config::TickConfig;
use std::sync::OnceLock;
use std::time::{Duration, Instant};

static EPOCH: OnceLock<Instant> = OnceLock::new();

fn epoch() -> Instant {
    *EPOCH.get_or_init(Instant::now)
}

pub(crate) fn now() -> MonoTime {
    let elapsed = epoch().elapsed();
    MonoTime::from_parts(elapsed.as_secs() as i64, i64::from(elapsed.subsec_nanos()))
}

pub(crate) fn sleep_until(deadline: MonoTime) {
    let remaining = deadline.nanos_since(now());
    if remaining > 0 {
        std::thread::sleep(Duration::from_nanos(remaining as u64));
    }
}

/// Real-time setup is a no-op here; strict configurations are refused so the
/// caller learns the guarantees are unavailable.
pub(crate) fn apply_rt_to_current_thread(config: &TickConfig) -> Result<(), String> {
    if config.strict_scheduling {
        return Err("real-time scheduling is not supported on this platform".into());
    }
    Ok(())
}
