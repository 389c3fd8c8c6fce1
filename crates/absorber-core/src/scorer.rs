// ─────────────────────────────────────────────────────────────────────
// Absorber — Detector-Entry Step Scorer
// ─────────────────────────────────────────────────────────────────────
//! Calorimeter-entry surface scorer.
//!
//! A particle whose pre-step point lies in the detector volume is scored
//! once with its kinetic energy at entry, then killed so that neither it
//! nor anything it would produce inside the detector is counted again.
//!
//! The hot path is an id comparison followed, on a hit, by one histogram
//! fill and one unlocked accumulator add. No I/O.

use absorber_types::{AbsorberError, AbsorberResult, Bucket};

use crate::detector::{DetectorGeometry, DETECTOR_NAME};
use crate::geometry::{GeometryTree, VolumeId};
use crate::run::RunAggregator;
use crate::step::{Step, TrackStatus};

/// Per-step observer bound to the detector volume.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepScorer {
    detector: VolumeId,
}

impl StepScorer {
    pub fn new(detector: VolumeId) -> Self {
        Self { detector }
    }

    /// Resolve the detector by name once, at construction.
    pub fn from_tree(tree: &GeometryTree) -> AbsorberResult<Self> {
        tree.find(DETECTOR_NAME)
            .map(Self::new)
            .ok_or_else(|| AbsorberError::Validation(format!("no {DETECTOR_NAME} volume")))
    }

    pub fn from_geometry(geometry: &DetectorGeometry) -> Self {
        Self::new(geometry.layout.detector)
    }

    pub fn detector(&self) -> VolumeId {
        self.detector
    }

    /// Score `step` if it starts inside the detector. Returns the bucket
    /// that received the energy, if any.
    pub fn on_step(&self, step: &mut Step<'_>, run: &mut RunAggregator) -> Option<Bucket> {
        if step.pre_step_point.volume != Some(self.detector) {
            return None;
        }

        let energy = step.pre_step_point.kinetic_energy;
        let bucket = if energy > 0.0 {
            Bucket::classify(&step.track.definition)
        } else {
            None
        };
        if let Some(bucket) = bucket {
            run.fill_histogram(bucket, energy);
            run.add_energy(bucket, energy);
            log::trace!(
                "track {} scored {energy} MeV in bucket {}",
                step.track.track_id,
                bucket.index()
            );
        }

        step.track.set_status(TrackStatus::StopAndKill);
        bucket
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::Arc;

    use glam::DVec3;

    use absorber_types::{AbsorberConfig, AnalysisConfig, ParticleDefinition};

    use crate::detector::build_geometry;
    use crate::material::NistCatalogue;
    use crate::step::{StepPoint, Track};

    fn setup() -> (StepScorer, RunAggregator) {
        let geometry =
            build_geometry(&AbsorberConfig::default(), &NistCatalogue::new(), true).unwrap();
        let scorer = StepScorer::from_tree(&geometry.tree).unwrap();
        assert_eq!(scorer, StepScorer::from_geometry(&geometry));
        let run = RunAggregator::master(&AnalysisConfig::default()).unwrap();
        run.analysis().set_all_h1_activation(true);
        (scorer, run)
    }

    fn step_in<'a>(track: &'a mut Track, volume: Option<VolumeId>) -> Step<'a> {
        let point = StepPoint {
            position: track.position,
            kinetic_energy: track.kinetic_energy,
            volume,
        };
        Step {
            pre_step_point: point,
            post_step_point: point,
            track,
        }
    }

    fn track(definition: ParticleDefinition, energy: f64) -> Track {
        Track::new(1, Arc::new(definition), DVec3::ZERO, DVec3::Z, energy)
    }

    #[test]
    fn test_outside_detector_ignored() {
        let (scorer, mut run) = setup();
        let mut t = track(ParticleDefinition::gamma(), 10.0);
        let mut step = step_in(&mut t, Some(VolumeId(0)));
        assert_eq!(scorer.on_step(&mut step, &mut run), None);
        assert!(t.is_alive());
        assert_eq!(run.local().sum(), 0.0);
    }

    #[test]
    fn test_gamma_scored_and_killed() {
        let (scorer, mut run) = setup();
        let mut t = track(ParticleDefinition::gamma(), 10.0);
        let mut step = step_in(&mut t, Some(scorer.detector()));
        assert_eq!(scorer.on_step(&mut step, &mut run), Some(Bucket::Gamma));
        assert_eq!(t.status, TrackStatus::StopAndKill);
        assert_eq!(run.local().get(Bucket::Gamma), 10.0);
        let h = run.analysis().h1(run.histogram_index(Bucket::Gamma)).unwrap();
        assert_eq!(h.entries(), 1);
        assert_eq!(h.fill_sum(), 10.0);
    }

    #[test]
    fn test_zero_energy_killed_not_scored() {
        let (scorer, mut run) = setup();
        let mut t = track(ParticleDefinition::electron(), 0.0);
        let mut step = step_in(&mut t, Some(scorer.detector()));
        assert_eq!(scorer.on_step(&mut step, &mut run), None);
        assert_eq!(t.status, TrackStatus::StopAndKill);
        assert_eq!(run.local().sum(), 0.0);
    }

    #[test]
    fn test_unclassified_killed_not_scored() {
        let (scorer, mut run) = setup();
        let mut t = track(ParticleDefinition::proton(), 5.0);
        let mut step = step_in(&mut t, Some(scorer.detector()));
        assert_eq!(scorer.on_step(&mut step, &mut run), None);
        assert_eq!(t.status, TrackStatus::StopAndKill);
    }

    #[test]
    fn test_charge_two_non_alpha_not_ion() {
        let (scorer, mut run) = setup();
        let mut t = track(ParticleDefinition::he3(), 5.0);
        let mut step = step_in(&mut t, Some(scorer.detector()));
        assert_eq!(scorer.on_step(&mut step, &mut run), None);

        let mut t = track(ParticleDefinition::alpha(), 5.0);
        let mut step = step_in(&mut t, Some(scorer.detector()));
        assert_eq!(scorer.on_step(&mut step, &mut run), Some(Bucket::Alpha));
    }

    #[test]
    fn test_ion_bucket() {
        let (scorer, mut run) = setup();
        let mut t = track(ParticleDefinition::ion(6, 12).unwrap(), 200.0);
        let mut step = step_in(&mut t, Some(scorer.detector()));
        assert_eq!(scorer.on_step(&mut step, &mut run), Some(Bucket::Ion));
        assert_eq!(run.local().get(Bucket::Ion), 200.0);
    }
}
