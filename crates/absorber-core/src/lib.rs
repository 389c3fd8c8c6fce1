// ─────────────────────────────────────────────────────────────────────
// Absorber — Core Engine
// (C) 1998-2026 Miroslav Sotek. All rights reserved.
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
#![deny(unsafe_code)]
//! Geometry builder, configuration registry, step scorer and run
//! aggregator for the absorber/detector application.
//!
//! # Invariants
//!
//! 1. **Build at most once**: `DetectorConstruction::construct` freezes the
//!    registry and refuses a second call with `AlreadyBuilt`. Stepping
//!    never observes a configuration change.
//!
//! 2. **Contiguous stack**: the downstream face of the last placed absorber
//!    is the upstream face of the detector. An invalid slot truncates the
//!    stack there; later slots are never placed.
//!
//! 3. **Score once**: a track is scored on its first step inside the
//!    detector and killed in the same call. Histogram fills and
//!    accumulator adds receive the same value, so their per-run sums agree.
//!
//! 4. **No lock on the step path for totals**: accumulators are
//!    thread-local and merged once per run.

pub mod accumulable;
pub mod analysis;
pub mod detector;
pub mod geometry;
pub mod material;
pub mod messenger;
pub mod registry;
pub mod run;
pub mod scorer;
pub mod step;

pub use accumulable::{AccumulableManager, EnergyAccumulators};
pub use analysis::{AnalysisManager, FileType, H1};
pub use detector::{
    build_geometry, DetectorConstruction, DetectorGeometry, PlacedAbsorber, StackLayout,
};
pub use geometry::{GeometryTree, Inside, LogicalVolume, PhysicalVolume, Solid, VolumeId};
pub use material::{Material, MaterialCatalogue, NistCatalogue};
pub use messenger::{AnalysisMessenger, DetectorMessenger, Messenger};
pub use registry::{ConfigRegistry, SlotField, SlotWrite};
pub use run::RunAggregator;
pub use scorer::StepScorer;
pub use step::{Step, StepPoint, Track, TrackStatus};
