use std::sync::mpsc::{Receiver, RecvTimeoutError, Sender};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};
use tracing::{info, warn};

use crate::app_types::{KindLine, StatusReport};
use crate::engine::state::SearchState;
use crate::fitness::MetricsSnapshot;

pub type StatusSubscribers = Arc<Mutex<Vec<Sender<StatusReport>>>>;

/// rate bookkeeping between two consecutive reports
pub struct ReportClock {
    last_at: Instant,
    last_mutations: u64,
}

impl ReportClock {
    pub fn new() -> Self {
        Self { last_at: Instant::now(), last_mutations: 0 }
    }

    /// build a report from the current state, without touching the improvement lock
    pub fn report(&mut self, state: &SearchState) -> StatusReport {
        profiling::scope!("ReportClock::report");
        let current = state.current();
        let mutations = state.mutation_count();
        let elapsed = state.elapsed();
        let now = Instant::now();

        let since_last = now.duration_since(self.last_at).as_secs_f64();
        let mutations_per_sec = if since_last > 0.0 {
            mutations.saturating_sub(self.last_mutations) as f64 / since_last
        } else {
            0.0
        };
        self.last_at = now;
        self.last_mutations = mutations;

        let secs = elapsed.as_secs_f64();
        let improvements_per_sec = if secs > 0.0 { current.improvements as f64 / secs } else { 0.0 };

        let kinds = current
            .stats
            .iter()
            .map(|(kind, s)| KindLine {
                kind,
                count: s.count,
                mean_percent: s.mean_improvement() * 100.0,
                cumulative_percent: s.cumulative_improvement * 100.0,
            })
            .collect();

        StatusReport {
            divergence: current.best.divergence,
            metrics: MetricsSnapshot::from_divergence(current.best.divergence),
            improvements: current.improvements,
            improvements_per_sec,
            mutations,
            mutations_per_sec,
            elapsed,
            kinds,
        }
    }
}

impl Default for ReportClock {
    fn default() -> Self {
        Self::new()
    }
}

/// Reporter thread body: wakes every `interval`, logs a status report and hands it
/// to status subscribers. Exits as soon as `shutdown` fires or its sender is dropped.
pub fn run_reporter(
    state: Arc<SearchState>,
    interval: Duration,
    shutdown: Receiver<()>,
    subscribers: StatusSubscribers,
) {
    profiling::register_thread!();
    let mut clock = ReportClock::new();
    loop {
        match shutdown.recv_timeout(interval) {
            Err(RecvTimeoutError::Timeout) => {}
            Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
        }

        let report = clock.report(&state);
        info!(
            target: "polyevolve::status",
            fitness = report.metrics.fitness_percent,
            improvements = report.improvements,
            mutations = report.mutations,
            "\n{report}"
        );

        let mut subs = subscribers.lock().unwrap_or_else(PoisonError::into_inner);
        let before = subs.len();
        subs.retain(|tx| tx.send(report.clone()).is_ok());
        if subs.len() < before {
            warn!(dropped = before - subs.len(), "pruned closed status subscribers");
        }
    }
}
