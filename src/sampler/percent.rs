use sysinfo::System;

use crate::sampler::{CpuSnapshot, SampleError, Sampler};

/// Pass-through sampler returning already-smoothed busy percentages from
/// `sysinfo`. With this source the usage mapping degrades to an identity
/// function; no deltas are computed.
pub struct PercentSampler {
    system: System,
    expected_cores: usize,
}

impl PercentSampler {
    pub fn new(expected_cores: usize) -> Self {
        let mut system = System::new_all();
        // Warm up: the first refresh always reports 0.0.
        system.refresh_cpu();
        Self {
            system,
            expected_cores,
        }
    }
}

impl Sampler for PercentSampler {
    fn sample(&mut self) -> Result<CpuSnapshot, SampleError> {
        self.system.refresh_cpu();
        let cpus = self.system.cpus();
        if cpus.len() < self.expected_cores {
            return Err(SampleError::MissingCore {
                core: cpus.len(),
            });
        }
        Ok(CpuSnapshot::Percentages(
            cpus.iter()
                .take(self.expected_cores)
                .map(|cpu| cpu.cpu_usage() as f64)
                .collect(),
        ))
    }
}
