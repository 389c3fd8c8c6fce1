// ─────────────────────────────────────────────────────────────────────
// Absorber — Application State Machine
// ─────────────────────────────────────────────────────────────────────
//! Host lifecycle phases.
//!
//! ```text
//! PreInit ──initialize──▶ Idle ──beamOn──▶ GeomClosed ──▶ EventProc
//!                          ▲                                  │
//!                          └──────────── run end ─────────────┘
//! ```
//!
//! Geometry and detector configuration may only change in `PreInit`.

use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ApplicationState {
    #[default]
    PreInit,
    Idle,
    GeomClosed,
    EventProc,
    Quit,
}

impl ApplicationState {
    /// Whether detector configuration commands are accepted.
    pub fn is_pre_init(self) -> bool {
        self == ApplicationState::PreInit
    }

    /// States in which analysis settings may change.
    pub fn allows_analysis_commands(self) -> bool {
        matches!(self, ApplicationState::PreInit | ApplicationState::Idle)
    }
}

impl fmt::Display for ApplicationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ApplicationState::PreInit => "PreInit",
            ApplicationState::Idle => "Idle",
            ApplicationState::GeomClosed => "GeomClosed",
            ApplicationState::EventProc => "EventProc",
            ApplicationState::Quit => "Quit",
        };
        f.write_str(name)
    }
}
