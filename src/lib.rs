pub mod app_types;
pub mod dna;
pub mod engine;
pub mod error;
pub mod fitness;
pub mod initializer;
pub mod mutate;
pub mod mutation_config;
pub mod render;
pub mod settings;

pub use app_types::{BestUpdate, SearchSnapshot, StatusReport};
pub use dna::{Candidate, MutationKind, Shape};
pub use engine::{Engine, EngineConfig, EnginePhase, PhaseWatch};
pub use error::EngineError;
pub use fitness::{Evaluator, TargetImage};
pub use initializer::Initializer;
pub use mutation_config::Mutator;
pub use settings::AppSettings;
