//! Linux platform layer: monotonic clock, absolute sleep, real-time thread
//! setup, and forced cancellation.

use crate::clock::MonoTime;
use crate::config::{SchedClass, TickConfig};
use libc::{
    CLOCK_MONOTONIC, CPU_SET, CPU_ZERO, EINTR, SCHED_FIFO, SCHED_RR, TIMER_ABSTIME, clock_gettime,
    clock_nanosleep, cpu_set_t, pthread_self, pthread_setaffinity_np, pthread_setschedparam,
    sched_param, timespec,
};
use std::io;
use std::mem;

fn os_error(code: i32) -> String {
    io::Error::from_raw_os_error(code).to_string()
}

/// Read `CLOCK_MONOTONIC`.
pub(crate) fn now() -> MonoTime {
    let mut ts = timespec {
        tv_sec: 0,
        tv_nsec: 0,
    };
    // SAFETY: ts is a valid out-pointer; CLOCK_MONOTONIC is always readable.
    unsafe {
        clock_gettime(CLOCK_MONOTONIC, &mut ts);
    }
    MonoTime::from_parts(ts.tv_sec, ts.tv_nsec)
}

/// Sleep until an absolute monotonic deadline, resuming across signal
/// interruptions. Returns immediately if the deadline has passed.
pub(crate) fn sleep_until(deadline: MonoTime) {
    let ts = timespec {
        tv_sec: deadline.secs(),
        tv_nsec: deadline.subsec_nanos(),
    };
    loop {
        // SAFETY: ts is valid for the call; the remain pointer is unused with
        // TIMER_ABSTIME.
        let rc = unsafe { clock_nanosleep(CLOCK_MONOTONIC, TIMER_ABSTIME, &ts, std::ptr::null_mut()) };
        if rc != EINTR {
            break;
        }
    }
}

/// Apply the configured scheduling class, priority, and affinity to the
/// calling thread.
pub(crate) fn apply_rt_to_current_thread(config: &TickConfig) -> Result<(), String> {
    let policy = match config.class {
        SchedClass::Fifo => SCHED_FIFO,
        SchedClass::RoundRobin => SCHED_RR,
    };
    let param = sched_param {
        sched_priority: config.priority,
    };
    // SAFETY: pthread_self() names the calling thread; param lives across the
    // call.
    let rc = unsafe { pthread_setschedparam(pthread_self(), policy, &param) };
    if rc != 0 {
        return Err(format!("pthread_setschedparam: {}", os_error(rc)));
    }

    if let Some(cpus) = config.affinity {
        // SAFETY: cpu_set_t is a plain bit set; all-zero is a valid value for
        // CPU_ZERO/CPU_SET to work on.
        let mut set: cpu_set_t = unsafe { mem::zeroed() };
        // SAFETY: set is a valid cpu_set_t initialized above.
        unsafe {
            CPU_ZERO(&mut set);
        }
        for cpu in cpus.iter() {
            // SAFETY: CpuSet indices are below 64, well inside cpu_set_t.
            unsafe {
                CPU_SET(cpu, &mut set);
            }
        }
        // SAFETY: set is initialized and valid for the size passed.
        let rc =
            unsafe { pthread_setaffinity_np(pthread_self(), mem::size_of::<cpu_set_t>(), &set) };
        if rc != 0 {
            return Err(format!("pthread_setaffinity_np: {}", os_error(rc)));
        }
    }
    Ok(())
}

/// Cancel a worker thread.
///
/// # Safety
///
/// `thread` must name a live, joinable thread. Cancellation unwinds the
/// target at an arbitrary cancellation point with no cleanup guarantees.
pub(crate) unsafe fn cancel(thread: libc::pthread_t) -> Result<(), String> {
    // SAFETY: upheld by the caller.
    let rc = unsafe { libc::pthread_cancel(thread) };
    if rc == 0 {
        Ok(())
    } else {
        Err(format!("pthread_cancel: {}", os_error(rc)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn now_reads_a_plausible_clock() {
        let t = now();
        assert!(t.secs() >= 0);
        assert!((0..1_000_000_000).contains(&t.subsec_nanos()));
    }

    #[test]
    fn sleep_until_past_deadline_returns_immediately() {
        let past = now();
        let before = MonoTime::now();
        sleep_until(past);
        let waited = MonoTime::now().nanos_since(before);
        assert!(waited < 50_000_000, "waited {waited}ns on an expired deadline");
    }

    #[test]
    fn sleep_until_waits_for_future_deadline() {
        let deadline = now().add_nanos(Duration::from_millis(5).as_nanos() as u64);
        sleep_until(deadline);
        assert!(MonoTime::now().nanos_since(deadline) >= 0);
    }
}
