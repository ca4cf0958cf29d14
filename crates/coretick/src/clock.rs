//! Monotonic timestamps and deadline arithmetic.
//!
//! The worker loop schedules against absolute monotonic timestamps, not
//! relative sleeps, so the tick phase is fixed at the start timestamp and
//! drift never accumulates. All arithmetic here is integer seconds/nanoseconds
//! with explicit carry and borrow, mirroring the `timespec` representation the
//! platform layer sleeps on.

pub(crate) const NANOS_PER_SEC: i64 = 1_000_000_000;

/// A monotonic timestamp with nanosecond resolution.
///
/// Values come from `CLOCK_MONOTONIC` on Linux and are immune to wall-clock
/// adjustments. The invariant `0 <= subsec_nanos < 1_000_000_000` holds for
/// every constructed value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct MonoTime {
    sec: i64,
    nsec: i64,
}

impl MonoTime {
    /// Read the monotonic clock.
    #[must_use]
    pub fn now() -> Self {
        crate::platform::now()
    }

    /// Build a timestamp from seconds and nanoseconds, normalizing the
    /// nanosecond field into `0..1_000_000_000`.
    #[must_use]
    pub fn from_parts(sec: i64, nsec: i64) -> Self {
        Self {
            sec: sec + nsec.div_euclid(NANOS_PER_SEC),
            nsec: nsec.rem_euclid(NANOS_PER_SEC),
        }
    }

    /// Whole seconds component.
    #[must_use]
    pub fn secs(&self) -> i64 {
        self.sec
    }

    /// Sub-second nanoseconds component, always in `0..1_000_000_000`.
    #[must_use]
    pub fn subsec_nanos(&self) -> i64 {
        self.nsec
    }

    /// Signed nanosecond difference `self - earlier`, with sub-second borrow.
    ///
    /// Positive when `self` is later than `earlier`. Used both for "are we
    /// late" deadline tests and for overshoot diagnostics.
    #[must_use]
    pub fn nanos_since(&self, earlier: MonoTime) -> i64 {
        let mut diff_sec = self.sec - earlier.sec;
        let mut diff_nsec = self.nsec - earlier.nsec;
        if diff_nsec < 0 {
            diff_sec -= 1;
            diff_nsec += NANOS_PER_SEC;
        }
        diff_sec * NANOS_PER_SEC + diff_nsec
    }

    /// Fractional seconds from `start` to `self`, with microsecond
    /// resolution. Diagnostics only; never used for scheduling decisions.
    #[must_use]
    pub fn seconds_since(&self, start: MonoTime) -> f64 {
        let total_us = self.nanos_since(start) / 1_000;
        total_us as f64 / 1_000_000.0
    }

    /// Advance by `nanos`, carrying overflow into the seconds field.
    #[must_use]
    pub fn add_nanos(&self, nanos: u64) -> Self {
        Self::from_parts(self.sec, self.nsec + nanos as i64)
    }

    /// Round up to the next multiple of `boundary_ns` on the monotonic
    /// timeline. A timestamp already on the boundary is returned unchanged.
    #[must_use]
    pub fn align_up(&self, boundary_ns: u64) -> Self {
        let boundary = boundary_ns as i64;
        if boundary <= 0 {
            return *self;
        }
        let total = self.sec * NANOS_PER_SEC + self.nsec;
        let rem = total.rem_euclid(boundary);
        if rem == 0 {
            *self
        } else {
            Self::from_parts(0, total + boundary - rem)
        }
    }
}
