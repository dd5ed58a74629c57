use crossbeam::channel::Receiver;
use std::thread;
use std::time::Duration;

use crate::control::Command;
use crate::sampler::{CpuSnapshot, SampleError, Sampler};
use crate::state::{SharedState, TableData};
use crate::usage::CoreSample;

/// The producer loop: sample, publish under the table lock, broadcast,
/// sleep, repeat while running.
///
/// The previous tick's counters are owned here between ticks; consumers only
/// ever see the published copy. A sample failure is fatal: the whole process
/// is shut down and the error is handed back to main, because deltas against
/// a corrupt reading would be meaningless.
pub fn run(
    mut sampler: Box<dyn Sampler>,
    state: &SharedState,
    control: Option<Receiver<Command>>,
    interval: Duration,
) -> Result<(), SampleError> {
    let mut last: Option<Vec<CoreSample>> = None;

    while state.is_running() {
        let snapshot = match sampler.sample() {
            Ok(snapshot) => snapshot,
            Err(err) => {
                state.shutdown();
                return Err(err);
            }
        };

        match snapshot {
            CpuSnapshot::Counters(curr) => {
                // First tick has no predecessor: pair the sample with itself,
                // which the calculator reports as 0% (zero-delta policy).
                let prev = last.clone().unwrap_or_else(|| curr.clone());
                state.publish(TableData::Counters {
                    prev,
                    curr: curr.clone(),
                });
                last = Some(curr);
            }
            CpuSnapshot::Percentages(percents) => {
                state.publish(TableData::Percentages(percents));
            }
        }

        if let Some(rx) = &control {
            while let Ok(command) = rx.try_recv() {
                if command == Command::Quit {
                    state.shutdown();
                    return Ok(());
                }
            }
        }

        thread::sleep(interval);
    }

    Ok(())
}
