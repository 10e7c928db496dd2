use serde::{Deserialize, Serialize};

use crate::dna::MutationKind;

/// accepted improvements of one mutation kind
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct KindStats {
    pub count: u64,
    /// sum of divergence drops, in divergence units
    pub cumulative_improvement: f64,
}

impl KindStats {
    #[inline]
    pub fn mean_improvement(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.cumulative_improvement / self.count as f64
        }
    }
}

/// per-kind improvement counters. only ever replaced inside the improvement lock,
/// observers see it as part of an immutable published record.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MutationStats {
    per_kind: [KindStats; MutationKind::COUNT],
}

impl MutationStats {
    #[inline]
    pub fn get(&self, kind: MutationKind) -> KindStats {
        self.per_kind[kind.index()]
    }

    /// count one accepted improvement of `kind`
    pub fn record(&mut self, kind: MutationKind, improvement: f64) {
        let entry = &mut self.per_kind[kind.index()];
        entry.count += 1;
        entry.cumulative_improvement += improvement;
    }

    pub fn total_count(&self) -> u64 {
        self.per_kind.iter().map(|k| k.count).sum()
    }

    pub fn total_improvement(&self) -> f64 {
        self.per_kind.iter().map(|k| k.cumulative_improvement).sum()
    }

    /// kinds in declaration order, including ones that never improved
    pub fn iter(&self) -> impl Iterator<Item = (MutationKind, KindStats)> + '_ {
        MutationKind::ALL.iter().map(move |&kind| (kind, self.get(kind)))
    }
}
