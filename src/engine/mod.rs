// Engine module organization
// Each submodule handles one part of a running task: shared state, workers,
// per-kind stats and the periodic reporter. This file owns the task lifecycle.

pub mod reporter;
pub mod state;
pub mod stats;
pub mod worker;

use rand::SeedableRng;
use rand_pcg::Pcg32;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{error, info, warn};

use crate::app_types::{BestUpdate, SearchSnapshot, StatusReport};
use crate::error::EngineError;
use crate::fitness::{Evaluator, TargetImage};
use crate::initializer::Initializer;
use crate::mutation_config::Mutator;
use crate::render::new_scratch;
use reporter::StatusSubscribers;
use state::{Observers, SearchState};

/// minimum vertices per shape
pub const MIN_VERTICES: usize = 3;

/// everything a task needs, fixed for its lifetime
#[derive(Clone, Debug)]
pub struct EngineConfig {
    pub target: Arc<TargetImage>,
    pub shapes: usize,
    pub vertices: usize,
    pub initializer: Initializer,
    pub mutator: Mutator,
    pub evaluator: Evaluator,
    pub workers: usize,
    /// `None` draws a fresh seed per task
    pub seed: Option<u64>,
    pub report_interval: Duration,
}

impl EngineConfig {
    /// defaults matching a fresh `AppSettings`
    pub fn new(target: Arc<TargetImage>) -> Self {
        Self {
            target,
            shapes: 50,
            vertices: 6,
            initializer: Initializer::Segmented { rgba: [0, 0, 0, 255] },
            mutator: Mutator::Hard,
            evaluator: Evaluator::Rgb { alpha: false },
            workers: 2,
            seed: None,
            report_interval: Duration::from_millis(750),
        }
    }

    pub fn validate(&self) -> Result<(), EngineError> {
        if self.shapes == 0 {
            return Err(EngineError::NoShapes);
        }
        if self.vertices < MIN_VERTICES {
            return Err(EngineError::TooFewVertices { vertices: self.vertices, min: MIN_VERTICES });
        }
        if self.workers == 0 {
            return Err(EngineError::NoWorkers);
        }
        if let Mutator::Soft { divisor: 0 } = self.mutator {
            return Err(EngineError::ZeroSoftDivisor);
        }
        // TargetImage checks its own dimensions and length on construction
        Ok(())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum EnginePhase {
    Idle,
    Running,
    /// `stop` is joining workers and the reporter
    Stopping,
}

impl EnginePhase {
    fn from_u8(value: u8) -> Self {
        match value {
            1 => EnginePhase::Running,
            2 => EnginePhase::Stopping,
            _ => EnginePhase::Idle,
        }
    }
}

/// read-only view of an engine's phase, usable from other threads while `stop` blocks
#[derive(Clone, Debug)]
pub struct PhaseWatch(Arc<AtomicU8>);

impl PhaseWatch {
    #[inline]
    pub fn get(&self) -> EnginePhase {
        EnginePhase::from_u8(self.0.load(Ordering::Acquire))
    }

    fn set(&self, phase: EnginePhase) {
        self.0.store(phase as u8, Ordering::Release);
    }
}

struct RunningTask {
    state: Arc<SearchState>,
    workers: Vec<JoinHandle<Result<(), EngineError>>>,
    reporter: Option<JoinHandle<()>>,
    reporter_shutdown: Sender<()>,
}

/// Owns at most one running task. Observers and status subscribers survive
/// between tasks; the last finished task stays readable through `snapshot`.
pub struct Engine {
    phase: PhaseWatch,
    task: Option<RunningTask>,
    finished: Option<Arc<SearchState>>,
    observers: Observers,
    status_subscribers: StatusSubscribers,
}

impl Engine {
    pub fn new() -> Self {
        Self {
            phase: PhaseWatch(Arc::new(AtomicU8::new(EnginePhase::Idle as u8))),
            task: None,
            finished: None,
            observers: Arc::new(Mutex::new(Vec::new())),
            status_subscribers: Arc::new(Mutex::new(Vec::new())),
        }
    }

    #[inline]
    pub fn phase(&self) -> EnginePhase {
        self.phase.get()
    }

    /// handle that keeps reporting the phase, including `Stopping` while `stop` runs
    pub fn phase_watch(&self) -> PhaseWatch {
        self.phase.clone()
    }

    /// receive a `BestUpdate` for every published improvement
    pub fn subscribe(&self) -> Receiver<BestUpdate> {
        let (tx, rx) = mpsc::channel();
        self.observers.lock().unwrap_or_else(PoisonError::into_inner).push(tx);
        rx
    }

    /// receive every periodic `StatusReport`
    pub fn subscribe_status(&self) -> Receiver<StatusReport> {
        let (tx, rx) = mpsc::channel();
        self.status_subscribers.lock().unwrap_or_else(PoisonError::into_inner).push(tx);
        rx
    }

    /// Validate `config`, build and evaluate the initial candidate, then launch
    /// the workers and the reporter. On error nothing keeps running.
    pub fn start(&mut self, config: EngineConfig) -> Result<(), EngineError> {
        profiling::scope!("Engine::start");
        if self.task.is_some() {
            return Err(EngineError::AlreadyRunning);
        }
        config.validate()?;

        let target = config.target.clone();
        let (width, height) = (target.width(), target.height());
        let seed = config.seed.unwrap_or_else(rand::random);

        let mut rng = Pcg32::seed_from_u64(seed);
        let mut best = config.initializer.initialize(&mut rng, config.shapes, config.vertices, width, height);
        let mut scratch = new_scratch(width, height).ok_or(EngineError::ScratchAllocation { width, height })?;
        best.divergence = config.evaluator.divergence(&mut scratch, &best, &target, None);
        let initial_divergence = best.divergence;

        let state = Arc::new(SearchState::new(target, config.evaluator, best, self.observers.clone()));

        let mut workers = Vec::with_capacity(config.workers);
        for index in 0..config.workers {
            let worker_state = state.clone();
            let mutator = config.mutator;
            let worker_seed = seed.wrapping_add(index as u64 + 1);
            let name = format!("worker-{index}");
            let spawned = thread::Builder::new().name(name.clone()).spawn(move || {
                let result = worker::run_worker(worker_state, mutator, index, worker_seed);
                if let Err(e) = &result {
                    error!(worker = index, error = %e, "worker failed");
                }
                result
            });
            match spawned {
                Ok(handle) => workers.push(handle),
                Err(e) => {
                    abort_workers(&state, workers);
                    return Err(EngineError::WorkerSpawn { name, reason: e.to_string() });
                }
            }
        }

        let (reporter_shutdown, shutdown_rx) = mpsc::channel();
        let reporter_state = state.clone();
        let subscribers = self.status_subscribers.clone();
        let interval = config.report_interval;
        let reporter = thread::Builder::new()
            .name("reporter".to_owned())
            .spawn(move || reporter::run_reporter(reporter_state, interval, shutdown_rx, subscribers));
        let reporter = match reporter {
            Ok(handle) => Some(handle),
            Err(e) => {
                warn!(error = %e, "failed to spawn reporter, running without status reports");
                None
            }
        };

        info!(
            shapes = config.shapes,
            vertices = config.vertices,
            workers = config.workers,
            initializer = config.initializer.name(),
            mutator = %config.mutator.name(),
            evaluator = config.evaluator.name(),
            seed,
            divergence = initial_divergence,
            "task started"
        );

        self.task = Some(RunningTask { state, workers, reporter, reporter_shutdown });
        self.phase.set(EnginePhase::Running);
        Ok(())
    }

    /// Signal stop, join every worker and the reporter, and return the final
    /// snapshot, or the first worker failure.
    pub fn stop(&mut self) -> Result<SearchSnapshot, EngineError> {
        profiling::scope!("Engine::stop");
        let Some(task) = self.task.take() else {
            return Err(EngineError::NotRunning);
        };
        self.phase.set(EnginePhase::Stopping);

        task.state.request_stop();
        // the reporter may already be gone; a closed channel stops it too
        let _ = task.reporter_shutdown.send(());

        let mut failure = None;
        for (index, handle) in task.workers.into_iter().enumerate() {
            match handle.join() {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    failure.get_or_insert(e);
                }
                Err(_) => {
                    error!(worker = index, "worker panicked");
                    failure.get_or_insert(EngineError::WorkerPanicked { worker: index });
                }
            }
        }
        if let Some(reporter) = task.reporter {
            if reporter.join().is_err() {
                warn!("reporter panicked");
            }
        }

        let snapshot = task.state.snapshot();
        self.finished = Some(task.state);
        self.phase.set(EnginePhase::Idle);
        info!(
            divergence = snapshot.best.divergence,
            improvements = snapshot.improvement_count,
            mutations = snapshot.mutation_count,
            elapsed_ms = snapshot.elapsed.as_millis() as u64,
            "task stopped"
        );

        match failure {
            Some(e) => Err(e),
            None => Ok(snapshot),
        }
    }

    /// consistent view of the running task, or of the last finished one.
    /// `None` before the first start.
    pub fn snapshot(&self) -> Option<SearchSnapshot> {
        self.task
            .as_ref()
            .map(|t| &t.state)
            .or(self.finished.as_ref())
            .map(|state| state.snapshot())
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Engine {
    fn drop(&mut self) {
        if self.task.is_some() {
            let _ = self.stop();
        }
    }
}

/// stop and join workers that were already launched when a later spawn failed
fn abort_workers(state: &SearchState, workers: Vec<JoinHandle<Result<(), EngineError>>>) {
    state.request_stop();
    for handle in workers {
        let _ = handle.join();
    }
}
