use serde::{Deserialize, Serialize};

use crate::dna::MutationKind;

/// mutator variants. fixed for the lifetime of a task.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Mutator {
    /// wholesale replacement only (shapes, colors, points) plus reordering
    Harder,
    /// mostly replacement, some large jitter
    Hard,
    /// mostly moderate jitter
    Medium,
    /// jitter only; jitter size is divided by `divisor` (smaller divisor = bigger steps)
    Soft { divisor: u32 },
}

impl Mutator {
    pub fn name(&self) -> String {
        match self {
            Mutator::Harder => "Harder".to_owned(),
            Mutator::Hard => "Hard".to_owned(),
            Mutator::Medium => "Medium".to_owned(),
            Mutator::Soft { divisor } => format!("Soft({divisor})"),
        }
    }

    /// resolve the weight table and jitter magnitudes for a canvas size
    pub fn profile(&self, width: u32, height: u32) -> MutationProfile {
        let span = width.max(height);
        match *self {
            //                                   RS  RC  RP RPs  AC  AP APs  SW
            Mutator::Harder => MutationProfile::new([30, 20, 20, 15, 0, 0, 0, 15], 1, 1),
            Mutator::Hard => MutationProfile::new([10, 20, 25, 10, 10, 10, 5, 10], span / 4, 64),
            Mutator::Medium => MutationProfile::new([5, 10, 10, 5, 25, 25, 10, 10], span / 8, 32),
            Mutator::Soft { divisor } => {
                let divisor = divisor.max(1);
                MutationProfile::new(
                    [0, 0, 0, 0, 40, 40, 15, 5],
                    span / divisor.saturating_mul(4),
                    (128 / divisor) as u8,
                )
            }
        }
    }
}

/// weight per mutation kind (indexed by `MutationKind::index`) and jitter magnitudes
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MutationProfile {
    pub weights: [u32; MutationKind::COUNT],
    /// max coordinate offset (pixels) for Adjust{Point,Points}
    pub point_jitter: u32,
    /// max per-channel offset for AdjustColor
    pub color_jitter: u8,
}

impl MutationProfile {
    /// jitter magnitudes are floored at 1 so every adjustment can move
    pub fn new(weights: [u32; MutationKind::COUNT], point_jitter: u32, color_jitter: u8) -> Self {
        Self {
            weights,
            point_jitter: point_jitter.max(1),
            color_jitter: color_jitter.max(1),
        }
    }

    pub fn total_weight(&self) -> u32 {
        self.weights.iter().sum()
    }

    /// map a roll in [0, total_weight) to a kind by cumulative weight
    pub fn kind_for_roll(&self, roll: u32) -> MutationKind {
        let mut cumulative = 0;
        for kind in MutationKind::ALL {
            cumulative += self.weights[kind.index()];
            if roll < cumulative {
                return kind;
            }
        }
        // only reachable with roll >= total; fall back to the last weighted kind
        MutationKind::ALL
            .into_iter()
            .rev()
            .find(|k| self.weights[k.index()] > 0)
            .unwrap_or(MutationKind::ReplaceColor)
    }
}
