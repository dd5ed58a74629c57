use crate::state::TableData;

/// Cumulative time-in-state counters for one core, as reported by the kernel.
/// All values are in clock ticks since boot and never decrease.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CoreSample {
    pub user: u64,
    pub nice: u64,
    pub system: u64,
    pub idle: u64,
    pub iowait: u64,
    pub irq: u64,
    pub softirq: u64,
    pub steal: u64,
    pub guest: u64,
    pub guest_nice: u64,
}

impl CoreSample {
    /// Total elapsed ticks. Guest time is excluded because the kernel already
    /// accounts it inside `user`/`nice`.
    pub fn total(&self) -> u64 {
        self.user
            + self.nice
            + self.system
            + self.idle
            + self.iowait
            + self.irq
            + self.softirq
            + self.steal
    }
}

/// Derived usage for one core over the last sampling interval.
#[derive(Debug, Clone, PartialEq)]
pub struct CoreUsage {
    pub name: String,
    pub percent: f64,
}

/// Busy percentage between two consecutive samples of the same core.
///
/// A zero counter delta (sampled too fast, or counters that did not advance)
/// reports 0.0 rather than dividing by zero. Subtraction saturates and the
/// result is clamped to [0, 100] to absorb counter-read races.
pub fn usage_percent(prev: &CoreSample, curr: &CoreSample) -> f64 {
    let total_diff = curr.total().saturating_sub(prev.total());
    if total_diff == 0 {
        return 0.0;
    }
    let idle_diff = curr.idle.saturating_sub(prev.idle);
    let busy = total_diff.saturating_sub(idle_diff);
    (busy as f64 / total_diff as f64 * 100.0).clamp(0.0, 100.0)
}

/// Map the shared table to per-core usage, in ascending core order.
///
/// This is the single consumer contract for both sampler variants: counter
/// pairs go through the delta formula, pre-aggregated percentages pass
/// through unchanged (clamped), and a table that has not seen its first tick
/// yields no entries.
pub fn per_core(names: &[String], data: &TableData) -> Vec<CoreUsage> {
    match data {
        TableData::Counters { prev, curr } => names
            .iter()
            .zip(prev.iter().zip(curr.iter()))
            .map(|(name, (p, c))| CoreUsage {
                name: name.clone(),
                percent: usage_percent(p, c),
            })
            .collect(),
        TableData::Percentages(percents) => names
            .iter()
            .zip(percents.iter())
            .map(|(name, &percent)| CoreUsage {
                name: name.clone(),
                percent: percent.clamp(0.0, 100.0),
            })
            .collect(),
        TableData::Empty => Vec::new(),
    }
}
