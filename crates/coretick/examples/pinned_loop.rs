//! Run a 1 kHz loop pinned to one core.
//!
//! Usage: `pinned_loop <cpu>` — requires privilege for SCHED_FIFO (e.g.
//! CAP_SYS_NICE), ideally on an isolated core.

use coretick::prelude::*;
use std::time::Duration;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt().with_target(false).init();

    let cpu: usize = std::env::args()
        .nth(1)
        .ok_or("usage: pinned_loop <cpu>")?
        .parse()?;

    let config = TickConfig::builder()
        .period(Duration::from_micros(1_000))
        .priority(80)
        .overrun(OverrunPolicy::Notify)
        .affinity(CpuSet::single(cpu))
        .build()?;

    let mut instance = TickInstance::new(
        || {
            // Time-critical logic goes here. Return 0 to continue, non-zero
            // to exit the loop with that value.
            0
        },
        config,
    )?;

    instance.run()?;
    std::thread::sleep(Duration::from_secs(10));

    instance.stop();
    let result = instance.join()?;
    tracing::info!(result, "worker exited");
    instance.destroy().map_err(|(_, err)| err)?;
    Ok(())
}
