//! Instance configuration.
//!
//! A [`TickConfig`] is a plain value copied into the instance at creation;
//! mutating the caller's copy after `TickInstance::new` has no effect on a
//! running worker.

use crate::error::{CoreError, CoreResult};
use crate::policy::OverrunPolicy;
use std::time::Duration;

/// Real-time scheduling class for the worker thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SchedClass {
    /// First-in-first-out: the thread runs until it blocks or yields.
    #[default]
    Fifo,
    /// Round-robin among threads of equal priority.
    RoundRobin,
}

/// An opaque CPU affinity set, built by the caller.
///
/// Each bit selects one core (bit 0 = core 0). The engine reads the set at
/// worker startup and never mutates it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CpuSet {
    mask: u64,
}

impl CpuSet {
    /// Empty set.
    #[must_use]
    pub const fn new() -> Self {
        Self { mask: 0 }
    }

    /// Set containing a single core.
    #[must_use]
    pub const fn single(cpu: usize) -> Self {
        Self::new().with_cpu(cpu)
    }

    /// Add a core to the set. Indices at or above 64 are ignored.
    #[must_use]
    pub const fn with_cpu(mut self, cpu: usize) -> Self {
        if cpu < 64 {
            self.mask |= 1 << cpu;
        }
        self
    }

    /// Whether the set selects the given core.
    #[must_use]
    pub const fn contains(&self, cpu: usize) -> bool {
        cpu < 64 && self.mask & (1 << cpu) != 0
    }

    /// Whether the set selects no cores at all.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.mask == 0
    }

    /// Raw bit mask.
    #[must_use]
    pub const fn bits(&self) -> u64 {
        self.mask
    }

    /// Iterate over the selected core indices in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        let mask = self.mask;
        (0..64).filter(move |cpu| mask & (1 << cpu) != 0)
    }
}

/// Configuration for a periodic instance.
///
/// Defaults mirror the intended deployment shape: 1 ms period, priority 80,
/// `SCHED_FIFO`, stop on overrun, no affinity restriction, run indefinitely.
#[derive(Debug, Clone)]
pub struct TickConfig {
    /// Interval between successive task invocations. Must be non-zero.
    pub period: Duration,
    /// Real-time priority for the worker thread (1..=99 on Linux).
    pub priority: i32,
    /// What to do when a tick misses its deadline.
    pub overrun: OverrunPolicy,
    /// Scheduling class for the worker thread.
    pub class: SchedClass,
    /// Optional CPU affinity for the worker thread.
    pub affinity: Option<CpuSet>,
    /// Stop the loop once this much time has elapsed since the start
    /// timestamp. Absent means run until stopped.
    pub stop_after: Option<Duration>,
    /// Align the first tick to the next multiple of this boundary on the
    /// monotonic clock. Absent means start immediately.
    pub align_to: Option<Duration>,
    /// When true (the default), refusal of the requested scheduling class,
    /// priority, or affinity fails `run`. When false the refusal is logged
    /// and the loop runs without real-time guarantees.
    pub strict_scheduling: bool,
}

impl Default for TickConfig {
    fn default() -> Self {
        Self {
            period: Duration::from_micros(crate::DEFAULT_PERIOD_US),
            priority: crate::DEFAULT_RT_PRIORITY,
            overrun: OverrunPolicy::Stop,
            class: SchedClass::Fifo,
            affinity: None,
            stop_after: None,
            align_to: None,
            strict_scheduling: true,
        }
    }
}

impl TickConfig {
    /// Create a configuration builder.
    #[must_use]
    pub fn builder() -> TickConfigBuilder {
        TickConfigBuilder::default()
    }

    /// Configuration usable without real-time privileges.
    ///
    /// Scheduling refusals are demoted to warnings and overruns are ignored,
    /// so the loop behaves deterministically under test runners and CI load.
    #[must_use]
    pub fn testing(period: Duration) -> Self {
        Self {
            period,
            overrun: OverrunPolicy::Ignore,
            strict_scheduling: false,
            ..Self::default()
        }
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidConfig`] if any field is out of range.
    pub fn validate(&self) -> CoreResult<()> {
        if self.period.is_zero() {
            return Err(CoreError::invalid_config("period must be non-zero"));
        }
        if !(1..=99).contains(&self.priority) {
            return Err(CoreError::invalid_config(
                "priority must be in 1..=99 for real-time scheduling classes",
            ));
        }
        if self.affinity.is_some_and(|cpus| cpus.is_empty()) {
            return Err(CoreError::invalid_config(
                "affinity set must select at least one core",
            ));
        }
        if self.align_to.is_some_and(|b| b.is_zero()) {
            return Err(CoreError::invalid_config(
                "start alignment boundary must be non-zero",
            ));
        }
        Ok(())
    }
}

/// Builder for [`TickConfig`].
#[derive(Debug, Default)]
pub struct TickConfigBuilder {
    config: TickConfig,
}

impl TickConfigBuilder {
    /// Set the tick period.
    #[must_use]
    pub fn period(mut self, period: Duration) -> Self {
        self.config.period = period;
        self
    }

    /// Set the real-time priority.
    #[must_use]
    pub fn priority(mut self, priority: i32) -> Self {
        self.config.priority = priority;
        self
    }

    /// Set the overrun policy.
    #[must_use]
    pub fn overrun(mut self, policy: OverrunPolicy) -> Self {
        self.config.overrun = policy;
        self
    }

    /// Set the scheduling class.
    #[must_use]
    pub fn class(mut self, class: SchedClass) -> Self {
        self.config.class = class;
        self
    }

    /// Restrict the worker to the given CPU set.
    #[must_use]
    pub fn affinity(mut self, cpus: CpuSet) -> Self {
        self.config.affinity = Some(cpus);
        self
    }

    /// Stop the loop after the given duration.
    #[must_use]
    pub fn stop_after(mut self, limit: Duration) -> Self {
        self.config.stop_after = Some(limit);
        self
    }

    /// Align the first tick to the given boundary.
    #[must_use]
    pub fn align_to(mut self, boundary: Duration) -> Self {
        self.config.align_to = Some(boundary);
        self
    }

    /// Control whether scheduling refusals fail `run`.
    #[must_use]
    pub fn strict_scheduling(mut self, strict: bool) -> Self {
        self.config.strict_scheduling = strict;
        self
    }

    /// Build the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidConfig`] if the configuration is invalid.
    pub fn build(self) -> CoreResult<TickConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}
