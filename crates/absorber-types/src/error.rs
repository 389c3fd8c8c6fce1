// ─────────────────────────────────────────────────────────────────────
// Absorber — Error Hierarchy
// ─────────────────────────────────────────────────────────────────────

use thiserror::Error;

use crate::state::ApplicationState;

/// Root error type for all absorber application failures.
///
/// Configuration mistakes made through the slot setters are not errors:
/// they are logged and ignored so that the best valid prefix survives.
#[derive(Error, Debug)]
pub enum AbsorberError {
    /// Invalid configuration value (JSON config or builder input).
    #[error("config error: {0}")]
    Config(String),

    /// Invalid input value (out of range index, non-finite quantity).
    #[error("validation error: {0}")]
    Validation(String),

    /// Command line could not be parsed or is unknown.
    #[error("command error: {0}")]
    Command(String),

    /// Command is not available in the current application state.
    #[error("illegal application state {state:?} for command {command}")]
    IllegalState {
        command: String,
        state: ApplicationState,
    },

    /// Particle name not present in the particle table.
    #[error("unknown particle: {0}")]
    UnknownParticle(String),

    /// Geometry construction was requested a second time.
    #[error("geometry already built")]
    AlreadyBuilt,

    /// Run requested before `/run/initialize`.
    #[error("run manager not initialized")]
    NotInitialized,

    /// Histogram back-end failure.
    #[error("analysis error: {0}")]
    Analysis(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type AbsorberResult<T> = Result<T, AbsorberError>;
