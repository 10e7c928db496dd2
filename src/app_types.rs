use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::dna::{Candidate, MutationKind};
use crate::engine::stats::MutationStats;
use crate::fitness::MetricsSnapshot;

/// sent to every observer each time a better candidate is published
#[derive(Clone, Debug)]
pub struct BestUpdate {
    pub best: Arc<Candidate>, // shared, never copied per observer
    pub improvements: u64,
    pub elapsed: Duration,
}

/// consistent view of a task: best, counters and stats read together
#[derive(Clone, Debug)]
pub struct SearchSnapshot {
    pub best: Arc<Candidate>,
    pub mutation_count: u64,
    pub improvement_count: u64,
    pub stats: MutationStats,
    pub elapsed: Duration,
}

/// one line of the per-kind breakdown
#[derive(Clone, Debug, PartialEq)]
pub struct KindLine {
    pub kind: MutationKind,
    pub count: u64,
    /// mean divergence drop per accepted improvement, in percent
    pub mean_percent: f64,
    pub cumulative_percent: f64,
}

/// periodic status produced by the reporter thread
#[derive(Clone, Debug)]
pub struct StatusReport {
    pub divergence: f64,
    pub metrics: MetricsSnapshot,
    pub improvements: u64,
    /// since task start
    pub improvements_per_sec: f64,
    pub mutations: u64,
    /// since the previous report
    pub mutations_per_sec: f64,
    pub elapsed: Duration,
    /// one line per mutation kind, in declaration order
    pub kinds: Vec<KindLine>,
}

/// h:mm:ss
pub fn format_elapsed(elapsed: Duration) -> String {
    let secs = elapsed.as_secs();
    format!("{}:{:02}:{:02}", secs / 3600, secs / 60 % 60, secs % 60)
}

impl fmt::Display for StatusReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Fitness: {:.4}% (PSNR {:.2} dB)", self.metrics.fitness_percent, self.metrics.psnr)?;
        writeln!(f, "Improvements: {} ({:.2}/s)", self.improvements, self.improvements_per_sec)?;
        writeln!(f, "Mutations: {} ({:.0}/s)", self.mutations, self.mutations_per_sec)?;
        write!(f, "Elapsed: {}", format_elapsed(self.elapsed))?;
        for line in &self.kinds {
            write!(
                f,
                "\n{} - {} * {:.4} ({:.4})",
                line.kind, line.count, line.mean_percent, line.cumulative_percent
            )?;
        }
        Ok(())
    }
}
