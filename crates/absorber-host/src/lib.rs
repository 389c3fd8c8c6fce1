// ─────────────────────────────────────────────────────────────────────
// Absorber — Reference Host
// (C) 1998-2026 Miroslav Sotek. All rights reserved.
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
#![deny(unsafe_code)]
//! Reference host for the absorber core: geometry navigation,
//! straight-line stepping with continuous energy loss, a particle gun,
//! the run manager and the text-command interpreter.

pub mod gun;
pub mod navigator;
pub mod run_manager;
pub mod stepping;
pub mod ui;

pub use gun::ParticleGun;
pub use navigator::Navigator;
pub use run_manager::{RunManager, RunOutcome};
pub use stepping::{stopping_power, SteppingManager, TrackReport};
pub use ui::UiManager;
