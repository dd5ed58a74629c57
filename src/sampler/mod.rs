pub mod percent;
pub mod proc_stat;

pub use percent::PercentSampler;
pub use proc_stat::ProcStatSampler;

use crate::config::SampleSource;
use crate::usage::CoreSample;
use thiserror::Error;

/// One reading of every monitored core, in either of the two supported
/// shapes. Which shape arrives depends on the configured counter source;
/// consumers see both through the same usage mapping.
#[derive(Debug, Clone, PartialEq)]
pub enum CpuSnapshot {
    /// Raw cumulative counters, to be turned into usage via deltas.
    Counters(Vec<CoreSample>),
    /// Already-smoothed busy percentages, one per core.
    Percentages(Vec<f64>),
}

/// Errors from the counter source. All of these are fatal: running on after a
/// corrupt or shrunken reading would make every subsequent delta meaningless,
/// so the reader shuts the process down instead of retrying.
#[derive(Debug, Error)]
pub enum SampleError {
    #[error("cannot read counter source {path}: {source}")]
    Unreadable {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("cpu{core}: missing `{field}` field")]
    MissingField { core: usize, field: &'static str },
    #[error("cpu{core}: non-numeric `{field}` field")]
    NonNumeric { core: usize, field: &'static str },
    #[error("duplicate counter line for cpu{index}")]
    DuplicateCore { index: usize },
    #[error("no counter line for cpu{core}")]
    MissingCore { core: usize },
}

/// A source of per-core CPU readings. Invoked once per reader tick, outside
/// the table lock.
pub trait Sampler: Send {
    fn sample(&mut self) -> Result<CpuSnapshot, SampleError>;
}

/// Build the sampler for the configured source.
pub fn for_source(source: SampleSource, expected_cores: usize) -> Box<dyn Sampler> {
    match source {
        SampleSource::ProcStat => Box::new(ProcStatSampler::new(expected_cores)),
        SampleSource::Sysinfo => Box::new(PercentSampler::new(expected_cores)),
    }
}
