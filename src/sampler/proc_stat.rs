use std::fs;
use std::path::PathBuf;
use std::str::SplitWhitespace;

use crate::sampler::{CpuSnapshot, SampleError, Sampler};
use crate::usage::CoreSample;

/// Raw-counter sampler backed by `/proc/stat`.
///
/// Parses the per-core `cpuN` lines into cumulative counters. Validation is
/// strict: a missing or non-numeric field, a duplicate core line, or a core
/// missing from the listing all fail the sample, and the reader treats every
/// sample failure as fatal. Lines for cores beyond the monitored range are
/// ignored (the range may be capped below the host's core count).
pub struct ProcStatSampler {
    path: PathBuf,
    expected_cores: usize,
}

impl ProcStatSampler {
    pub fn new(expected_cores: usize) -> Self {
        Self::with_path("/proc/stat", expected_cores)
    }

    /// Sample from an alternate stat file. Used by tests.
    pub fn with_path(path: impl Into<PathBuf>, expected_cores: usize) -> Self {
        Self {
            path: path.into(),
            expected_cores,
        }
    }
}

impl Sampler for ProcStatSampler {
    fn sample(&mut self) -> Result<CpuSnapshot, SampleError> {
        let content = fs::read_to_string(&self.path).map_err(|source| SampleError::Unreadable {
            path: self.path.display().to_string(),
            source,
        })?;
        parse_stat(&content, self.expected_cores).map(CpuSnapshot::Counters)
    }
}

fn next_field(
    fields: &mut SplitWhitespace<'_>,
    core: usize,
    field: &'static str,
) -> Result<u64, SampleError> {
    let raw = fields
        .next()
        .ok_or(SampleError::MissingField { core, field })?;
    raw.parse()
        .map_err(|_| SampleError::NonNumeric { core, field })
}

// Absent is fine (pre-2.6.24 kernels), present-but-garbage is not.
fn optional_field(
    fields: &mut SplitWhitespace<'_>,
    core: usize,
    field: &'static str,
) -> Result<u64, SampleError> {
    match fields.next() {
        None => Ok(0),
        Some(raw) => raw
            .parse()
            .map_err(|_| SampleError::NonNumeric { core, field }),
    }
}

/// Parse the `cpuN` lines of a `/proc/stat` listing into one sample per core.
///
/// The aggregate `cpu` line and non-cpu lines (intr, ctxt, ...) are skipped.
/// The first eight fields are required; `guest`/`guest_nice` default to zero
/// because kernels before 2.6.24 do not report them.
pub fn parse_stat(content: &str, expected_cores: usize) -> Result<Vec<CoreSample>, SampleError> {
    let mut cores: Vec<Option<CoreSample>> = vec![None; expected_cores];

    for line in content.lines() {
        let mut fields = line.split_whitespace();
        let label = match fields.next() {
            Some(label) => label,
            None => continue,
        };
        let index_str = match label.strip_prefix("cpu") {
            Some(rest) if !rest.is_empty() => rest,
            // The aggregate "cpu" line and unrelated rows.
            _ => continue,
        };
        // A "cpu"-prefixed label without a numeric id is not a core row;
        // genuinely absent cores are caught below as MissingCore.
        let index: usize = match index_str.parse() {
            Ok(index) => index,
            Err(_) => continue,
        };
        if index >= expected_cores {
            // The host may list more cores than we monitor (MAX_CPUS cap,
            // restricted affinity); entries beyond the range are unused.
            continue;
        }
        if cores[index].is_some() {
            return Err(SampleError::DuplicateCore { index });
        }

        let sample = CoreSample {
            user: next_field(&mut fields, index, "user")?,
            nice: next_field(&mut fields, index, "nice")?,
            system: next_field(&mut fields, index, "system")?,
            idle: next_field(&mut fields, index, "idle")?,
            iowait: next_field(&mut fields, index, "iowait")?,
            irq: next_field(&mut fields, index, "irq")?,
            softirq: next_field(&mut fields, index, "softirq")?,
            steal: next_field(&mut fields, index, "steal")?,
            guest: optional_field(&mut fields, index, "guest")?,
            guest_nice: optional_field(&mut fields, index, "guest_nice")?,
        };
        cores[index] = Some(sample);
    }

    cores
        .into_iter()
        .enumerate()
        .map(|(core, sample)| sample.ok_or(SampleError::MissingCore { core }))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const TWO_CORES: &str = "\
cpu  210 0 105 1710 0 0 0 0 0 0
cpu0 100 0 50 850 0 0 0 0 0 0
cpu1 110 0 55 860 3 1 2 4 0 0
intr 12345 0 1
ctxt 987654
btime 1700000000
";

    #[test]
    fn parses_every_core_line() {
        let cores = parse_stat(TWO_CORES, 2).unwrap();
        assert_eq!(cores.len(), 2);
        assert_eq!(cores[0].user, 100);
        assert_eq!(cores[0].idle, 850);
        assert_eq!(cores[1].user, 110);
        assert_eq!(cores[1].iowait, 3);
        assert_eq!(cores[1].steal, 4);
    }

    #[test]
    fn aggregate_line_is_ignored() {
        // The "cpu" summary row must not land in any per-core slot.
        let cores = parse_stat(TWO_CORES, 2).unwrap();
        assert_ne!(cores[0].user, 210);
    }

    #[test]
    fn guest_fields_are_optional() {
        let cores = parse_stat("cpu0 100 0 50 850 0 0 0 0\n", 1).unwrap();
        assert_eq!(cores[0].steal, 0);
        assert_eq!(cores[0].guest, 0);
        assert_eq!(cores[0].guest_nice, 0);
    }

    #[test]
    fn missing_required_field_is_rejected() {
        let err = parse_stat("cpu0 100 0 50 850 0\n", 1).unwrap_err();
        assert!(matches!(
            err,
            SampleError::MissingField { core: 0, field: "irq" }
        ));
    }

    #[test]
    fn non_numeric_field_is_rejected() {
        let err = parse_stat("cpu0 100 0 abc 850 0 0 0 0 0 0\n", 1).unwrap_err();
        assert!(matches!(
            err,
            SampleError::NonNumeric { core: 0, field: "system" }
        ));
    }

    #[test]
    fn cores_beyond_the_monitored_range_are_unused() {
        let cores = parse_stat(TWO_CORES, 1).unwrap();
        assert_eq!(cores.len(), 1);
        assert_eq!(cores[0].user, 100);
    }

    #[test]
    fn duplicate_core_line_is_rejected() {
        let content = "cpu0 1 0 0 0 0 0 0 0\ncpu0 2 0 0 0 0 0 0 0\n";
        let err = parse_stat(content, 1).unwrap_err();
        assert!(matches!(err, SampleError::DuplicateCore { index: 0 }));
    }

    #[test]
    fn missing_core_line_is_rejected() {
        let err = parse_stat("cpu0 100 0 50 850 0 0 0 0 0 0\n", 2).unwrap_err();
        assert!(matches!(err, SampleError::MissingCore { core: 1 }));
    }

    #[test]
    fn unreadable_source_surfaces_the_path() {
        let mut sampler = ProcStatSampler::with_path("/nonexistent/stat", 1);
        let err = sampler.sample().unwrap_err();
        assert!(matches!(err, SampleError::Unreadable { .. }));
        assert!(err.to_string().contains("/nonexistent/stat"));
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn live_proc_stat_counters_are_monotonic() {
        let content = std::fs::read_to_string("/proc/stat").unwrap();
        let num_cores = content
            .lines()
            .filter(|line| {
                let label = line.split_whitespace().next().unwrap_or("");
                label
                    .strip_prefix("cpu")
                    .map_or(false, |id| !id.is_empty() && id.chars().all(|c| c.is_ascii_digit()))
            })
            .count();
        let mut sampler = ProcStatSampler::new(num_cores);
        let first = match sampler.sample().unwrap() {
            CpuSnapshot::Counters(cores) => cores,
            CpuSnapshot::Percentages(_) => unreachable!(),
        };
        let second = match sampler.sample().unwrap() {
            CpuSnapshot::Counters(cores) => cores,
            CpuSnapshot::Percentages(_) => unreachable!(),
        };
        assert!(second[0].total() >= first[0].total());
    }
}
