use std::thread;
use std::time::Duration;

use crate::state::SharedState;

/// Liveness guard: broadcast readiness on a fixed cadence regardless of what
/// the reader is doing, so no consumer can block forever behind a hung
/// sampler or a crashed reader.
///
/// The interval is validated at configuration time to be strictly greater
/// than the sampling interval; while the reader is healthy these extra
/// broadcasts only make consumers re-read the latest table.
pub fn run(state: &SharedState, interval: Duration) {
    while state.is_running() {
        thread::sleep(interval);
        state.force_wake();
    }
}
