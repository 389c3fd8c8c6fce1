// ─────────────────────────────────────────────────────────────────────
// Absorber — Tracks and Steps
// ─────────────────────────────────────────────────────────────────────
//! The per-step view handed to user hooks by the stepping engine.

use std::sync::Arc;

use glam::DVec3;

use absorber_types::ParticleDefinition;

use crate::geometry::VolumeId;

/// Lifecycle flag understood by the stepping engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TrackStatus {
    #[default]
    Alive,
    /// Stopped by energy loss; no further steps.
    StopButAlive,
    /// Terminated by a user hook; no further steps.
    StopAndKill,
    /// Left the world volume.
    OutOfWorld,
}

/// A particle being transported.
#[derive(Debug, Clone)]
pub struct Track {
    pub track_id: u64,
    pub definition: Arc<ParticleDefinition>,
    pub position: DVec3,
    /// Unit direction of flight.
    pub direction: DVec3,
    /// Kinetic energy (MeV).
    pub kinetic_energy: f64,
    pub status: TrackStatus,
    pub step_count: usize,
}

impl Track {
    pub fn new(
        track_id: u64,
        definition: Arc<ParticleDefinition>,
        position: DVec3,
        direction: DVec3,
        kinetic_energy: f64,
    ) -> Self {
        Self {
            track_id,
            definition,
            position,
            direction: direction.normalize_or_zero(),
            kinetic_energy,
            status: TrackStatus::Alive,
            step_count: 0,
        }
    }

    pub fn set_status(&mut self, status: TrackStatus) {
        self.status = status;
    }

    pub fn is_alive(&self) -> bool {
        self.status == TrackStatus::Alive
    }
}

/// Kinematic snapshot at one end of a step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepPoint {
    pub position: DVec3,
    /// Kinetic energy (MeV).
    pub kinetic_energy: f64,
    /// Volume the point belongs to; `None` outside the world.
    pub volume: Option<VolumeId>,
}

/// One transport step of a track.
#[derive(Debug)]
pub struct Step<'a> {
    pub pre_step_point: StepPoint,
    pub post_step_point: StepPoint,
    pub track: &'a mut Track,
}

impl Step<'_> {
    pub fn step_length(&self) -> f64 {
        self.pre_step_point
            .position
            .distance(self.post_step_point.position)
    }

    pub fn energy_deposit(&self) -> f64 {
        (self.pre_step_point.kinetic_energy - self.post_step_point.kinetic_energy).max(0.0)
    }
}
