use rand::SeedableRng;
use rand_pcg::Pcg32;
use std::sync::Arc;
use tracing::debug;

use crate::engine::state::{PublishOutcome, SearchState};
use crate::error::EngineError;
use crate::mutation_config::Mutator;
use crate::render::new_scratch;

/// One search worker: mutate the published best, evaluate against it, and try
/// to publish improvements, until the stop flag is raised.
///
/// The random source and scratch canvas are private to the worker.
pub fn run_worker(state: Arc<SearchState>, mutator: Mutator, index: usize, seed: u64) -> Result<(), EngineError> {
    profiling::register_thread!();
    let (width, height) = (state.target().width(), state.target().height());
    let mut scratch = new_scratch(width, height).ok_or(EngineError::ScratchAllocation { width, height })?;
    let mut rng = Pcg32::seed_from_u64(seed);
    let evaluator = state.evaluator();
    let mut published = 0u64;

    while !state.stop_requested() {
        profiling::scope!("worker_iteration");
        state.count_mutation();

        let seen = state.current();
        let mut candidate = mutator.mutate(&mut rng, &seen.best, width, height);
        candidate.divergence =
            evaluator.divergence(&mut scratch, &candidate, state.target(), Some(seen.best.divergence));

        if candidate.divergence < seen.best.divergence {
            if let PublishOutcome::Published(_) = state.try_publish(&mut scratch, candidate, &seen) {
                published += 1;
            }
        }
    }

    debug!(worker = index, published, "worker exiting");
    Ok(())
}
