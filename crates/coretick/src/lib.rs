//! Fixed-period task execution pinned to an isolated CPU core.
//!
//! This crate runs a user-supplied task at a fixed period on a dedicated
//! worker thread under a real-time scheduling class (`SCHED_FIFO` or
//! `SCHED_RR`), with absolute-time wake scheduling and explicit handling of
//! deadline overruns. It targets environments such as isolated cores on a
//! low-jitter kernel, where predictable timing matters more than throughput.
//!
//! It provides:
//!
//! - **[`TickConfig`]**: period, real-time priority, scheduling class, CPU
//!   affinity, overrun policy, and optional run bounds
//! - **[`TickInstance`]**: the lifecycle handle (create / run / stop / join /
//!   terminate / destroy)
//! - **[`OverrunPolicy`]**: what to do when a tick misses its deadline
//! - **[`MonoTime`]**: monotonic timestamps and the deadline arithmetic the
//!   hot loop is built on
//!
//! # RT-Safety Guarantees
//!
//! - **No heap allocations** in the hot loop after the worker starts
//! - **No locks** between the worker and controlling threads; coordination is
//!   a single atomic lifecycle state plus a monotonic stop-request flag
//! - **Absolute-time waits** (`clock_nanosleep` with `TIMER_ABSTIME` on
//!   Linux), so the tick phase never drifts
//!
//! # Example
//!
//! ```no_run
//! use coretick::{OverrunPolicy, TickConfig, TickInstance};
//! use std::time::Duration;
//!
//! let config = TickConfig::builder()
//!     .period(Duration::from_micros(1_000))
//!     .overrun(OverrunPolicy::Notify)
//!     .build()?;
//!
//! let mut instance = TickInstance::new(|| 0, config)?;
//! instance.run()?;
//! std::thread::sleep(Duration::from_secs(10));
//! instance.stop();
//! let result = instance.join()?;
//! instance.destroy().map_err(|(_, e)| e)?;
//! # Ok::<(), coretick::CoreError>(())
//! ```

#![deny(unsafe_op_in_unsafe_fn)]
#![deny(unused_must_use)]

pub mod clock;
pub mod config;
pub mod error;
pub mod instance;
pub mod policy;

mod worker;

#[cfg(target_os = "linux")]
mod linux;
#[cfg(target_os = "linux")]
pub(crate) use linux as platform;

#[cfg(not(target_os = "linux"))]
mod fallback;
#[cfg(not(target_os = "linux"))]
pub(crate) use fallback as platform;

pub mod prelude;

pub use clock::MonoTime;
pub use config::{CpuSet, SchedClass, TickConfig, TickConfigBuilder};
pub use error::{CoreError, CoreResult};
pub use instance::TickInstance;
pub use policy::OverrunPolicy;

/// Default period in microseconds (1 kHz).
pub const DEFAULT_PERIOD_US: u64 = 1_000;

/// Default real-time priority for the worker thread.
pub const DEFAULT_RT_PRIORITY: i32 = 80;
