// ─────────────────────────────────────────────────────────────────────
// Absorber — Merge-on-End Accumulators
// ─────────────────────────────────────────────────────────────────────
//! Per-bucket kinetic energy sums.
//!
//! Each run aggregator owns an [`EnergyAccumulators`] mutated without a
//! lock; at end of run it is folded into the shared
//! [`AccumulableManager`]. Summation is commutative, so worker order is
//! irrelevant.

use parking_lot::Mutex;

use absorber_types::{Bucket, N_BUCKETS};

/// Worker-local energy totals (MeV), one slot per bucket.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct EnergyAccumulators {
    totals: [f64; N_BUCKETS],
}

impl EnergyAccumulators {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, bucket: Bucket, energy: f64) {
        self.totals[bucket.index()] += energy;
    }

    pub fn get(&self, bucket: Bucket) -> f64 {
        self.totals[bucket.index()]
    }

    pub fn totals(&self) -> [f64; N_BUCKETS] {
        self.totals
    }

    pub fn sum(&self) -> f64 {
        self.totals.iter().sum()
    }

    pub fn reset(&mut self) {
        self.totals = [0.0; N_BUCKETS];
    }

    pub fn merge(&mut self, other: &EnergyAccumulators) {
        for (a, b) in self.totals.iter_mut().zip(other.totals) {
            *a += b;
        }
    }
}

/// Master-side sum of all merged worker accumulators.
#[derive(Debug, Default)]
pub struct AccumulableManager {
    merged: Mutex<EnergyAccumulators>,
}

impl AccumulableManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&self) {
        self.merged.lock().reset();
    }

    pub fn merge(&self, local: &EnergyAccumulators) {
        self.merged.lock().merge(local);
    }

    pub fn snapshot(&self) -> EnergyAccumulators {
        *self.merged.lock()
    }
}
