use std::fmt;

/// everything the engine can reject or fail with
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EngineError {
    EmptyTarget { width: u32, height: u32 },
    TargetLengthMismatch { expected: usize, actual: usize },
    NoShapes,
    TooFewVertices { vertices: usize, min: usize },
    NoWorkers,
    ZeroSoftDivisor,
    AlreadyRunning,
    NotRunning,
    ScratchAllocation { width: u32, height: u32 },
    WorkerSpawn { name: String, reason: String },
    WorkerPanicked { worker: usize },
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyTarget { width, height } => {
                write!(f, "target image must not be empty (got {width}x{height})")
            }
            Self::TargetLengthMismatch { expected, actual } => {
                write!(f, "target buffer holds {actual} bytes, expected {expected}")
            }
            Self::NoShapes => write!(f, "shape count must be at least 1"),
            Self::TooFewVertices { vertices, min } => {
                write!(f, "vertex count {vertices} is below the minimum of {min}")
            }
            Self::NoWorkers => write!(f, "worker count must be at least 1"),
            Self::ZeroSoftDivisor => write!(f, "soft mutator divisor must be at least 1"),
            Self::AlreadyRunning => write!(f, "a task is already running"),
            Self::NotRunning => write!(f, "no task is running"),
            Self::ScratchAllocation { width, height } => {
                write!(f, "could not allocate a {width}x{height} scratch canvas")
            }
            Self::WorkerSpawn { name, reason } => write!(f, "failed to spawn {name}: {reason}"),
            Self::WorkerPanicked { worker } => write!(f, "worker {worker} panicked"),
        }
    }
}

impl std::error::Error for EngineError {}
