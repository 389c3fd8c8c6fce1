// ─────────────────────────────────────────────────────────────────────
// Absorber — Types
// (C) 1998-2026 Miroslav Sotek. All rights reserved.
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
#![deny(unsafe_code)]
//! Type definitions, configuration, units, and error hierarchy for the
//! absorber detector application.

pub mod config;
pub mod error;
pub mod particle;
pub mod score;
pub mod state;
pub mod units;

pub use config::{
    AbsorberConfig, AbsorberSlot, AnalysisConfig, AppConfig, GunConfig, GunParticle, RunConfig,
    MAX_ABSORBERS,
};
pub use error::{AbsorberError, AbsorberResult};
pub use particle::{find_particle, ParticleDefinition};
pub use score::{Bucket, RunSummary, N_BUCKETS};
pub use state::ApplicationState;
