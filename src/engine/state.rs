use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::mpsc::Sender;
use std::sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError, RwLock};
use std::time::{Duration, Instant};

use tiny_skia as sk;
use tracing::warn;

use crate::app_types::{BestUpdate, SearchSnapshot};
use crate::dna::Candidate;
use crate::engine::stats::MutationStats;
use crate::fitness::{Evaluator, TargetImage};

/// observer list. its mutex doubles as the improvement lock.
pub type Observers = Arc<Mutex<Vec<Sender<BestUpdate>>>>;

/// best candidate, improvement count and stats, replaced together as one record
#[derive(Debug)]
pub struct Published {
    pub best: Arc<Candidate>,
    pub improvements: u64,
    pub stats: MutationStats,
}

/// result of a publish attempt
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PublishOutcome {
    /// divergence dropped by this much
    Published(f64),
    /// not better than the current best (anymore)
    Rejected,
}

/// state shared by all workers and the reporter of one task
pub struct SearchState {
    target: Arc<TargetImage>,
    evaluator: Evaluator,
    published: RwLock<Arc<Published>>,
    improvement: Observers,
    mutations: AtomicU64,
    stop: AtomicBool,
    started: Instant,
    /// set once, by the first stop request
    stopped: OnceLock<Instant>,
}

impl SearchState {
    /// `initial` must already carry its exact divergence
    pub fn new(target: Arc<TargetImage>, evaluator: Evaluator, initial: Candidate, observers: Observers) -> Self {
        Self {
            target,
            evaluator,
            published: RwLock::new(Arc::new(Published {
                best: Arc::new(initial),
                improvements: 0,
                stats: MutationStats::default(),
            })),
            improvement: observers,
            mutations: AtomicU64::new(0),
            stop: AtomicBool::new(false),
            started: Instant::now(),
            stopped: OnceLock::new(),
        }
    }

    #[inline]
    pub fn target(&self) -> &TargetImage {
        &self.target
    }

    #[inline]
    pub fn evaluator(&self) -> Evaluator {
        self.evaluator
    }

    /// current published record; a brief shared read, never the improvement lock
    #[inline]
    pub fn current(&self) -> Arc<Published> {
        self.published.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// count one mutation attempt, returns the new total
    #[inline]
    pub fn count_mutation(&self) -> u64 {
        self.mutations.fetch_add(1, Ordering::Relaxed) + 1
    }

    #[inline]
    pub fn mutation_count(&self) -> u64 {
        self.mutations.load(Ordering::Relaxed)
    }

    pub fn request_stop(&self) {
        let _ = self.stopped.set(Instant::now());
        self.stop.store(true, Ordering::Release);
    }

    #[inline]
    pub fn stop_requested(&self) -> bool {
        self.stop.load(Ordering::Acquire)
    }

    /// run time so far, frozen at the first stop request
    #[inline]
    pub fn elapsed(&self) -> Duration {
        match self.stopped.get() {
            Some(stopped) => stopped.duration_since(self.started),
            None => self.started.elapsed(),
        }
    }

    fn lock_improvement(&self) -> MutexGuard<'_, Vec<Sender<BestUpdate>>> {
        self.improvement.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Try to publish `candidate`, which was evaluated against the record `seen`.
    ///
    /// Under the improvement lock the candidate is checked again against the
    /// freshly read record. If another worker published in between, the
    /// divergence is recomputed with the new bound; if the record is still the
    /// one seen, the earlier (exact, since it was below the bound) value is reused.
    pub fn try_publish(&self, scratch: &mut sk::Pixmap, mut candidate: Candidate, seen: &Arc<Published>) -> PublishOutcome {
        profiling::scope!("SearchState::try_publish");
        if candidate.divergence >= seen.best.divergence {
            return PublishOutcome::Rejected;
        }

        let mut observers = self.lock_improvement();
        let current = self.current();
        if !Arc::ptr_eq(&current, seen) {
            candidate.divergence =
                self.evaluator.divergence(scratch, &candidate, &self.target, Some(current.best.divergence));
        }

        let improvement = current.best.divergence - candidate.divergence;
        if improvement <= 0.0 {
            return PublishOutcome::Rejected;
        }

        let mut stats = current.stats.clone();
        if let Some(kind) = candidate.last_mutation {
            stats.record(kind, improvement);
        }
        let best = Arc::new(candidate);
        let next = Arc::new(Published {
            best: best.clone(),
            improvements: current.improvements + 1,
            stats,
        });
        *self.published.write().unwrap_or_else(PoisonError::into_inner) = next;

        let update = BestUpdate {
            best,
            improvements: current.improvements + 1,
            elapsed: self.elapsed(),
        };
        let before = observers.len();
        observers.retain(|tx| tx.send(update.clone()).is_ok());
        if observers.len() < before {
            warn!(dropped = before - observers.len(), "pruned closed best-update observers");
        }

        PublishOutcome::Published(improvement)
    }

    pub fn snapshot(&self) -> SearchSnapshot {
        let current = self.current();
        SearchSnapshot {
            best: current.best.clone(),
            mutation_count: self.mutation_count(),
            improvement_count: current.improvements,
            stats: current.stats.clone(),
            elapsed: self.elapsed(),
        }
    }
}
