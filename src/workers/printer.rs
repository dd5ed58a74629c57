use std::io::Write;

use crate::state::SharedState;
use crate::usage::{self, CoreUsage};

/// Write one usage block: a line per core in ascending core order, then a
/// blank separator line.
pub fn write_block(out: &mut impl Write, usages: &[CoreUsage]) -> std::io::Result<()> {
    for usage in usages {
        writeln!(out, "{}: {:.2}%", usage.name, usage.percent)?;
    }
    writeln!(out)?;
    out.flush()
}

/// The console consumer: block on the readiness signal, recompute usage from
/// the latest table, print one block per cycle. Exits when `wait_for_update`
/// observes shutdown.
pub fn run(state: &SharedState, out: &mut impl Write) -> std::io::Result<()> {
    while let Some(table) = state.wait_for_update() {
        let usages = usage::per_core(state.names(), &table);
        if usages.is_empty() {
            // Woken (possibly by the watchdog) before the first tick landed.
            continue;
        }
        write_block(out, &usages)?;
    }
    Ok(())
}
