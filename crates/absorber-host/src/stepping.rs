// ─────────────────────────────────────────────────────────────────────
// Absorber — Straight-Line Stepping
// ─────────────────────────────────────────────────────────────────────
//! Minimal transport for the reference host: tracks fly in straight
//! lines, stop at every volume boundary and lose energy continuously in
//! dense matter.
//!
//! Energy loss is `dE/dx = 0.2 MeV/mm · ρ[g/cm³] · q²` for charged
//! particles in materials with `ρ ≥ 0.01 g/cm³`. Gases and neutral
//! particles are transparent. No secondaries are produced.
//!
//! After each step the user hook receives the [`Step`]; setting the
//! track to `StopAndKill` ends its transport immediately.

use glam::DVec3;

use absorber_core::{GeometryTree, Material, Step, StepPoint, Track, TrackStatus};
use absorber_types::ParticleDefinition;

use crate::navigator::Navigator;

/// Stopping-power scale (MeV/mm per g/cm³ per unit charge²).
pub const STOPPING_SCALE: f64 = 0.2;
/// Materials lighter than this (g/cm³) do not slow particles down.
pub const DENSITY_THRESHOLD: f64 = 0.01;
/// Minimum advance (mm) when a boundary distance collapses to zero.
const MIN_STEP: f64 = 1.0e-9;

/// Continuous energy loss per unit length (MeV/mm).
pub fn stopping_power(material: &Material, particle: &ParticleDefinition) -> f64 {
    if material.density < DENSITY_THRESHOLD || !particle.is_charged() {
        return 0.0;
    }
    STOPPING_SCALE * material.density * particle.pdg_charge * particle.pdg_charge
}

/// Per-track transport counters.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TrackReport {
    pub steps: usize,
    pub path_length: f64,
    pub energy_lost: f64,
}

pub struct SteppingManager<'g> {
    navigator: Navigator<'g>,
    pub max_steps: usize,
    /// Upper bound on a single step (mm).
    pub max_step: f64,
}

impl<'g> SteppingManager<'g> {
    pub fn new(tree: &'g GeometryTree, max_steps: usize, max_step: f64) -> Self {
        Self {
            navigator: Navigator::new(tree),
            max_steps,
            max_step,
        }
    }

    pub fn navigator(&self) -> &Navigator<'g> {
        &self.navigator
    }

    /// Transport `track` until it stops, leaves the world, is killed by
    /// `hook`, or reaches `max_steps`.
    pub fn process_track(
        &self,
        track: &mut Track,
        mut hook: impl FnMut(&mut Step<'_>),
    ) -> TrackReport {
        let tree = self.navigator.tree();
        let mut report = TrackReport::default();

        while track.is_alive() {
            if track.step_count >= self.max_steps {
                log::debug!("track {} hit the step limit", track.track_id);
                track.set_status(TrackStatus::StopAndKill);
                break;
            }
            let Some(volume) = self.navigator.locate(track.position, track.direction) else {
                track.set_status(TrackStatus::OutOfWorld);
                break;
            };

            let boundary = self
                .navigator
                .distance_to_boundary(volume, track.position, track.direction);
            let mut length = boundary.min(self.max_step).max(MIN_STEP);

            let material = &tree.volume(volume).logical.material;
            let dedx = stopping_power(material, &track.definition);
            let e_pre = track.kinetic_energy;
            let mut e_post = e_pre - dedx * length;
            if e_post <= 0.0 {
                length = if dedx > 0.0 { e_pre / dedx } else { length };
                e_post = 0.0;
            }

            let pre = StepPoint {
                position: track.position,
                kinetic_energy: e_pre,
                volume: Some(volume),
            };
            let end = advance(track.position, track.direction, length);
            let post = StepPoint {
                position: end,
                kinetic_energy: e_post,
                volume: self.navigator.locate(end, track.direction),
            };

            track.position = end;
            track.kinetic_energy = e_post;
            track.step_count += 1;
            report.steps += 1;

            let mut step = Step {
                pre_step_point: pre,
                post_step_point: post,
                track: &mut *track,
            };
            report.path_length += step.step_length();
            report.energy_lost += step.energy_deposit();
            hook(&mut step);

            if track.is_alive() && e_post <= 0.0 {
                track.set_status(TrackStatus::StopButAlive);
            }
        }
        report
    }
}

/// Straight-line position after travelling `distance` along `direction`.
pub fn advance(position: DVec3, direction: DVec3, distance: f64) -> DVec3 {
    position + direction * distance
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use absorber_core::{build_geometry, NistCatalogue, VolumeId};
    use absorber_types::{AbsorberConfig, AbsorberSlot};

    fn track(definition: ParticleDefinition, energy: f64) -> Track {
        Track::new(
            1,
            Arc::new(definition),
            DVec3::new(0.0, 0.0, -24.0),
            DVec3::Z,
            energy,
        )
    }

    #[test]
    fn test_stopping_power_rules() {
        let air = Material::new("G4_AIR", 1.20479e-3);
        let pb = Material::new("G4_Pb", 11.35);
        assert_eq!(stopping_power(&air, &ParticleDefinition::electron()), 0.0);
        assert_eq!(stopping_power(&pb, &ParticleDefinition::gamma()), 0.0);
        let alpha = stopping_power(&pb, &ParticleDefinition::alpha());
        assert!((alpha - 0.2 * 11.35 * 4.0).abs() < 1e-12);
    }

    #[test]
    fn test_free_flight_leaves_world() {
        let g = build_geometry(&AbsorberConfig::default(), &NistCatalogue::new(), true).unwrap();
        let stepping = SteppingManager::new(&g.tree, 1000, 1.0e6);
        let mut t = track(ParticleDefinition::gamma(), 5.0);
        let mut visited: Vec<Option<VolumeId>> = Vec::new();
        let report = stepping.process_track(&mut t, |step| {
            visited.push(step.pre_step_point.volume);
        });
        assert_eq!(t.status, TrackStatus::OutOfWorld);
        assert_eq!(report.steps, 3);
        assert!((report.path_length - 48.0).abs() < 1e-6);
        assert_eq!(visited[1], Some(g.layout.detector));
        assert_eq!(t.kinetic_energy, 5.0);
    }

    #[test]
    fn test_hook_kill_stops_transport() {
        let g = build_geometry(&AbsorberConfig::default(), &NistCatalogue::new(), true).unwrap();
        let stepping = SteppingManager::new(&g.tree, 1000, 1.0e6);
        let mut t = track(ParticleDefinition::electron(), 1.0);
        let report = stepping.process_track(&mut t, |step| {
            step.track.set_status(TrackStatus::StopAndKill);
        });
        assert_eq!(report.steps, 1);
        assert_eq!(t.status, TrackStatus::StopAndKill);
    }

    #[test]
    fn test_ranges_out_in_lead() {
        let config = AbsorberConfig {
            enabled: true,
            declared_count: Some(1),
            slots: vec![AbsorberSlot::new(10.0, "G4_Pb")],
        };
        let g = build_geometry(&config, &NistCatalogue::new(), true).unwrap();
        let stepping = SteppingManager::new(&g.tree, 1000, 1.0e6);
        let mut t = track(ParticleDefinition::electron(), 1.0);
        let report = stepping.process_track(&mut t, |_| {});
        assert_eq!(t.status, TrackStatus::StopButAlive);
        assert_eq!(t.kinetic_energy, 0.0);
        assert!((report.energy_lost - 1.0).abs() < 1e-12);
        assert!(t.position.z > -20.0 && t.position.z < -10.0);
    }

    #[test]
    fn test_step_limit() {
        let g = build_geometry(&AbsorberConfig::default(), &NistCatalogue::new(), true).unwrap();
        let stepping = SteppingManager::new(&g.tree, 5, 1.0);
        let mut t = track(ParticleDefinition::gamma(), 1.0);
        let report = stepping.process_track(&mut t, |_| {});
        assert_eq!(report.steps, 5);
        assert_eq!(t.status, TrackStatus::StopAndKill);
    }

    #[test]
    fn test_advance() {
        assert_eq!(advance(DVec3::ZERO, DVec3::Z, 2.0), DVec3::new(0.0, 0.0, 2.0));
    }
}
