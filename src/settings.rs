/// application settings for polyevolve
/// read from settings.json at startup; missing fields fall back to defaults
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

use crate::engine::EngineConfig;
use crate::fitness::{Evaluator, TargetImage};
use crate::initializer::Initializer;
use crate::mutation_config::Mutator;

pub const SETTINGS_FILE: &str = "settings.json";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum InitializerChoice {
    SolidColor,
    Segmented,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum MutatorChoice {
    Harder,
    Hard,
    Medium,
    /// uses `soft_divisor`
    Soft,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum EvaluatorChoice {
    Rgb,
    Luma,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppSettings {
    // candidate shape
    pub shape_count: usize,
    /// vertices per shape (3 or more)
    pub vertex_count: usize,

    // search strategies
    pub initializer: InitializerChoice,
    /// un-premultiplied RGBA of the initial shapes
    pub starting_color: [u8; 4],
    pub mutator: MutatorChoice,
    /// jitter divisor for the Soft mutator (10 = finest of the stock presets, 2 = coarser)
    pub soft_divisor: u32,
    pub evaluator: EvaluatorChoice,
    /// include the alpha channel in divergence
    pub evaluate_alpha: bool,

    // rendering
    pub polygon_antialiasing: bool,

    // execution
    pub workers: usize,
    /// fixed seed for reproducible runs, None = random per task
    pub seed: Option<u64>,
    /// time between status reports
    pub report_interval_ms: u64,

    // headless driver
    /// stop after this many seconds, 0 = run until killed
    pub run_seconds: u64,
    /// where the final best is written as PNG
    pub output_path: String,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            shape_count: 50,
            vertex_count: 6,

            initializer: InitializerChoice::Segmented,
            starting_color: [0, 0, 0, 255],
            mutator: MutatorChoice::Hard,
            soft_divisor: 10,
            evaluator: EvaluatorChoice::Rgb,
            evaluate_alpha: false,

            polygon_antialiasing: true,

            workers: 2,
            seed: None,
            report_interval_ms: 750,

            run_seconds: 60,
            output_path: "best.png".to_owned(),
        }
    }
}

impl AppSettings {
    /// save settings to JSON file
    pub fn save(&self) -> Result<(), Box<dyn std::error::Error>> {
        self.save_to(SETTINGS_FILE)
    }

    pub fn save_to(&self, path: impl AsRef<Path>) -> Result<(), Box<dyn std::error::Error>> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// load settings from JSON file, or return defaults if file doesn't exist
    pub fn load() -> Self {
        Self::load_from(SETTINGS_FILE)
    }

    pub fn load_from(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match std::fs::read_to_string(path) {
            Ok(json) => match serde_json::from_str(&json) {
                Ok(settings) => settings,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "failed to parse settings, using defaults");
                    Self::default()
                }
            },
            // file doesn't exist or can't be read - use defaults
            Err(_) => Self::default(),
        }
    }

    pub fn initializer(&self) -> Initializer {
        match self.initializer {
            InitializerChoice::SolidColor => Initializer::SolidColor { rgba: self.starting_color },
            InitializerChoice::Segmented => Initializer::Segmented { rgba: self.starting_color },
        }
    }

    pub fn mutator(&self) -> Mutator {
        match self.mutator {
            MutatorChoice::Harder => Mutator::Harder,
            MutatorChoice::Hard => Mutator::Hard,
            MutatorChoice::Medium => Mutator::Medium,
            MutatorChoice::Soft => Mutator::Soft { divisor: self.soft_divisor },
        }
    }

    pub fn evaluator(&self) -> Evaluator {
        match self.evaluator {
            EvaluatorChoice::Rgb => Evaluator::Rgb { alpha: self.evaluate_alpha },
            EvaluatorChoice::Luma => Evaluator::Luma { alpha: self.evaluate_alpha },
        }
    }

    /// convert to the engine's task configuration; validation happens at start
    pub fn to_engine_config(&self, target: Arc<TargetImage>) -> EngineConfig {
        EngineConfig {
            target,
            shapes: self.shape_count,
            vertices: self.vertex_count,
            initializer: self.initializer(),
            mutator: self.mutator(),
            evaluator: self.evaluator(),
            workers: self.workers,
            seed: self.seed,
            report_interval: Duration::from_millis(self.report_interval_ms),
        }
    }

    /// run duration for the driver, None = unbounded
    pub fn run_duration(&self) -> Option<Duration> {
        (self.run_seconds > 0).then(|| Duration::from_secs(self.run_seconds))
    }
}
