// ─────────────────────────────────────────────────────────────────────
// Absorber — Scoring Types
// ─────────────────────────────────────────────────────────────────────

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::particle::{
    ParticleDefinition, PDG_ALPHA, PDG_ANTI_NU_E, PDG_ELECTRON, PDG_GAMMA, PDG_NU_E,
    PDG_POSITRON,
};
use crate::units::best_energy;

/// Number of buckets including the reserved slot 0.
pub const N_BUCKETS: usize = 6;

/// Species classification index selecting a histogram and an accumulator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(usize)]
pub enum Bucket {
    Reserved = 0,
    ElectronPositron = 1,
    Neutrino = 2,
    Gamma = 3,
    Alpha = 4,
    Ion = 5,
}

impl Bucket {
    pub const ALL: [Bucket; N_BUCKETS] = [
        Bucket::Reserved,
        Bucket::ElectronPositron,
        Bucket::Neutrino,
        Bucket::Gamma,
        Bucket::Alpha,
        Bucket::Ion,
    ];

    /// Buckets that can receive scores.
    pub const SCORED: [Bucket; N_BUCKETS - 1] = [
        Bucket::ElectronPositron,
        Bucket::Neutrino,
        Bucket::Gamma,
        Bucket::Alpha,
        Bucket::Ion,
    ];

    /// Classify a particle species.
    ///
    /// Order matters: the generic ion bucket is tested last and only for
    /// charge strictly above +2, so alphas land in `Alpha` and He3 or
    /// tritons are not scored at all.
    pub fn classify(particle: &ParticleDefinition) -> Option<Bucket> {
        match particle.pdg_encoding {
            PDG_ELECTRON | PDG_POSITRON => Some(Bucket::ElectronPositron),
            PDG_NU_E | PDG_ANTI_NU_E => Some(Bucket::Neutrino),
            PDG_GAMMA => Some(Bucket::Gamma),
            PDG_ALPHA => Some(Bucket::Alpha),
            _ if particle.pdg_charge > 2.0 => Some(Bucket::Ion),
            _ => None,
        }
    }

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(index: usize) -> Option<Bucket> {
        Bucket::ALL.get(index).copied()
    }

    /// Histogram id.
    pub fn id(self) -> String {
        self.index().to_string()
    }

    /// Histogram title.
    pub fn title(self) -> &'static str {
        match self {
            Bucket::Reserved => "dummy",
            Bucket::ElectronPositron => "energy spectrum (%): e+ e-",
            Bucket::Neutrino => "energy spectrum (%): nu_e anti_nu_e",
            Bucket::Gamma => "energy spectrum (%): gamma",
            Bucket::Alpha => "energy spectrum (%): alpha",
            Bucket::Ion => "energy spectrum (%): ions",
        }
    }

    /// Species wording used in the end-of-run summary.
    pub fn label(self) -> &'static str {
        match self {
            Bucket::Reserved => "reserved",
            Bucket::ElectronPositron => "electron and positron",
            Bucket::Neutrino => "neutrino and antineutrino",
            Bucket::Gamma => "gamma",
            Bucket::Alpha => "alpha",
            Bucket::Ion => "ion",
        }
    }
}

/// Per-bucket kinetic energy totals published at end of run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    /// Master (global) or worker (local) run.
    pub is_master: bool,
    /// Number of primary events processed.
    pub n_events: u64,
    /// Kinetic energy totals in MeV, indexed by bucket.
    pub totals: [f64; N_BUCKETS],
}

impl RunSummary {
    pub fn total(&self, bucket: Bucket) -> f64 {
        self.totals[bucket.index()]
    }

    pub fn grand_total(&self) -> f64 {
        self.totals.iter().sum()
    }

    pub fn banner(&self) -> &'static str {
        if self.is_master {
            "--------------------End of Global Run-----------------------"
        } else {
            "--------------------End of Local Run------------------------"
        }
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.banner())?;
        writeln!(f, " The run consists of {} primary events.", self.n_events)?;
        for (i, bucket) in Bucket::SCORED.iter().enumerate() {
            write!(
                f,
                " The total {} kinetic energy is {}.",
                bucket.label(),
                best_energy(self.total(*bucket))
            )?;
            if i + 1 < Bucket::SCORED.len() {
                writeln!(f)?;
            }
        }
        Ok(())
    }
}
