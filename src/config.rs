use anyhow::{bail, Result};
use clap::ValueEnum;
use std::path::PathBuf;
use std::time::Duration;

/// Upper bound on monitored cores; the discovered count is capped here and
/// the table is allocated once at startup from the capped count.
pub const MAX_CPUS: usize = 512;

/// Which counter source feeds the reader.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SampleSource {
    /// Raw cumulative counters parsed from /proc/stat (delta-based usage).
    ProcStat,
    /// Pre-aggregated percentages from the sysinfo crate.
    Sysinfo,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub sample_interval: Duration,
    pub watchdog_interval: Duration,
    pub log_interval: Duration,
    pub log_path: PathBuf,
    pub source: SampleSource,
    pub interactive: bool,
}

impl Config {
    /// Validate and assemble the runtime configuration.
    ///
    /// The watchdog interval defaults to twice the sampling interval and must
    /// be strictly greater than it, so the watchdog only intervenes when the
    /// reader has actually stalled.
    pub fn new(
        sample_interval_ms: u64,
        watchdog_interval_ms: Option<u64>,
        log_interval_ms: u64,
        log_path: PathBuf,
        source: SampleSource,
        interactive: bool,
    ) -> Result<Self> {
        if sample_interval_ms == 0 {
            bail!("sampling interval must be non-zero");
        }
        if log_interval_ms == 0 {
            bail!("log interval must be non-zero");
        }
        let watchdog_interval_ms = watchdog_interval_ms.unwrap_or(sample_interval_ms * 2);
        if watchdog_interval_ms <= sample_interval_ms {
            bail!(
                "watchdog interval ({} ms) must exceed the sampling interval ({} ms)",
                watchdog_interval_ms,
                sample_interval_ms
            );
        }

        Ok(Self {
            sample_interval: Duration::from_millis(sample_interval_ms),
            watchdog_interval: Duration::from_millis(watchdog_interval_ms),
            log_interval: Duration::from_millis(log_interval_ms),
            log_path,
            source,
            interactive,
        })
    }
}

/// Number of cores to monitor: discovered from the host, capped at MAX_CPUS.
pub fn discover_num_cpus() -> usize {
    num_cpus::get().min(MAX_CPUS)
}
