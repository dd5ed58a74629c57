use crate::state::SharedState;
use crate::usage;

/// Aggregate the analyzer builds up across cycles. Returned when the loop
/// exits; nothing is emitted while running.
#[derive(Debug, Clone, PartialEq)]
pub struct UsageStats {
    /// Highest usage observed per core, indexed by core id.
    pub peak: Vec<f64>,
    /// Readiness cycles that carried data.
    pub cycles: u64,
}

impl UsageStats {
    pub fn peak_overall(&self) -> f64 {
        self.peak.iter().copied().fold(0.0, f64::max)
    }
}

/// The silent consumer: same wait-recompute pattern as the printer but with
/// no external side effects. This is the extension point for alerting or
/// aggregation; for now it tracks per-core peaks.
pub fn run(state: &SharedState) -> UsageStats {
    let mut stats = UsageStats {
        peak: vec![0.0; state.num_cpus()],
        cycles: 0,
    };

    while let Some(table) = state.wait_for_update() {
        let usages = usage::per_core(state.names(), &table);
        if usages.is_empty() {
            continue;
        }
        for (peak, usage) in stats.peak.iter_mut().zip(usages.iter()) {
            if usage.percent > *peak {
                *peak = usage.percent;
            }
        }
        stats.cycles += 1;
    }

    stats
}
