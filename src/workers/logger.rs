use chrono::Utc;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};
use std::thread;
use std::time::Duration;

use crate::state::SharedState;
use crate::usage;

/// Append-only, flush-on-write log destination with its own lock,
/// independent of the table lock. Opened once at startup (an open failure is
/// fatal) and closed when the last handle drops after every loop has joined.
pub struct LogSink {
    file: Mutex<File>,
    path: PathBuf,
}

impl LogSink {
    pub fn open(path: &Path) -> std::io::Result<Self> {
        Ok(Self {
            file: Mutex::new(File::create(path)?),
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one line and flush immediately, so a crash cannot lose the
    /// last written line.
    pub fn append(&self, line: &str) -> std::io::Result<()> {
        let mut file = self.file.lock().unwrap_or_else(PoisonError::into_inner);
        writeln!(file, "{}", line)?;
        file.flush()
    }
}

/// The periodic log writer. Not gated by the readiness signal: it takes a
/// non-blocking snapshot of the table each interval and appends a timestamped
/// heartbeat line.
///
/// A failed write is reported to stderr once per failure streak and the loop
/// keeps going; mid-run sink trouble is not fatal.
pub fn run(state: &SharedState, sink: &LogSink, interval: Duration) {
    let mut write_failed = false;

    while state.is_running() {
        let usages = usage::per_core(state.names(), &state.snapshot());
        match sink.append(&heartbeat_line(state.num_cpus(), &usages)) {
            Ok(()) => write_failed = false,
            Err(err) => {
                if !write_failed {
                    eprintln!("coremon: log write to {:?} failed: {}", sink.path(), err);
                    write_failed = true;
                }
            }
        }
        thread::sleep(interval);
    }
}

// The core count comes from the state, not the usage vector: before the
// first tick the vector is empty but the monitored count is already known.
fn heartbeat_line(num_cpus: usize, usages: &[usage::CoreUsage]) -> String {
    let avg = if usages.is_empty() {
        0.0
    } else {
        usages.iter().map(|u| u.percent).sum::<f64>() / usages.len() as f64
    };
    format!("[{}] cores={} avg={:.2}%", Utc::now(), num_cpus, avg)
}
