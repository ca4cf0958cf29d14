//! Convenience re-exports for the common API surface.
//!
//! ```
//! use coretick::prelude::*;
//! ```

pub use crate::clock::MonoTime;
pub use crate::config::{CpuSet, SchedClass, TickConfig, TickConfigBuilder};
pub use crate::error::{CoreError, CoreResult};
pub use crate::instance::TickInstance;
pub use crate::policy::OverrunPolicy;
