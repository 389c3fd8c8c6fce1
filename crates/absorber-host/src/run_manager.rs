// ─────────────────────────────────────────────────────────────────────
// Absorber — Run Manager
// ─────────────────────────────────────────────────────────────────────
//! Drives the application lifecycle:
//!
//! ```text
//! PreInit ──initialize()──▶ Idle ──beam_on(n)──▶ GeomClosed ──▶ EventProc ──▶ Idle
//! ```
//!
//! `initialize` builds the geometry once and binds the step scorer to the
//! detector volume. `beam_on` runs the events either on the calling
//! thread or spread over a rayon pool of workers, each with its own run
//! aggregator. Workers end their runs before the master so that the
//! global summary includes every merged contribution.

use std::path::PathBuf;
use std::sync::Arc;

use rayon::prelude::*;

use absorber_core::{
    AnalysisManager, ConfigRegistry, DetectorConstruction, DetectorGeometry, MaterialCatalogue,
    NistCatalogue, RunAggregator, StepScorer,
};
use absorber_types::units::best_length;
use absorber_types::{
    AbsorberError, AbsorberResult, AppConfig, ApplicationState, RunConfig, RunSummary,
};

use crate::gun::ParticleGun;
use crate::stepping::SteppingManager;

/// What one `beam_on` produced.
#[derive(Debug, Clone, PartialEq)]
pub struct RunOutcome {
    pub run_id: u32,
    pub n_events: u64,
    /// Master summary; `None` for a zero-event run.
    pub global: Option<RunSummary>,
    /// One summary per worker that processed at least one event.
    pub locals: Vec<RunSummary>,
    /// Histogram file written by the master, if it could be opened.
    pub output: Option<PathBuf>,
}

pub struct RunManager {
    run_config: RunConfig,
    state: ApplicationState,
    construction: DetectorConstruction,
    geometry: Option<Arc<DetectorGeometry>>,
    scorer: Option<StepScorer>,
    aggregator: RunAggregator,
    gun: ParticleGun,
    next_run_id: u32,
}

impl RunManager {
    pub fn new(config: AppConfig) -> AbsorberResult<Self> {
        Self::with_catalogue(config, Arc::new(NistCatalogue::new()))
    }

    pub fn with_catalogue(
        config: AppConfig,
        catalogue: Arc<dyn MaterialCatalogue>,
    ) -> AbsorberResult<Self> {
        config.validate()?;
        let registry = Arc::new(ConfigRegistry::with_config(config.detector.clone()));
        let aggregator = RunAggregator::master(&config.analysis)?;
        let gun = ParticleGun::from_config(&config.run.gun)?;
        Ok(Self {
            run_config: config.run,
            state: ApplicationState::PreInit,
            construction: DetectorConstruction::new(registry, catalogue),
            geometry: None,
            scorer: None,
            aggregator,
            gun,
            next_run_id: 0,
        })
    }

    pub fn state(&self) -> ApplicationState {
        self.state
    }

    pub fn registry(&self) -> &ConfigRegistry {
        self.construction.registry()
    }

    pub fn analysis(&self) -> &AnalysisManager {
        self.aggregator.analysis()
    }

    pub fn aggregator(&self) -> &RunAggregator {
        &self.aggregator
    }

    pub fn geometry(&self) -> Option<&DetectorGeometry> {
        self.geometry.as_deref()
    }

    pub fn gun(&self) -> &ParticleGun {
        &self.gun
    }

    pub fn gun_mut(&mut self) -> &mut ParticleGun {
        &mut self.gun
    }

    pub fn n_threads(&self) -> usize {
        self.run_config.n_threads
    }

    /// Worker thread count; only in `PreInit`.
    pub fn set_n_threads(&mut self, n_threads: usize) -> AbsorberResult<()> {
        if !self.state.is_pre_init() {
            return Err(AbsorberError::IllegalState {
                command: "/run/numberOfThreads".to_string(),
                state: self.state,
            });
        }
        self.run_config.n_threads = n_threads;
        Ok(())
    }

    /// Build the geometry and bind the scorer.
    pub fn initialize(&mut self) -> AbsorberResult<()> {
        if !self.state.is_pre_init() {
            return Err(AbsorberError::IllegalState {
                command: "/run/initialize".to_string(),
                state: self.state,
            });
        }
        let geometry = self.construction.construct()?;
        let scorer = StepScorer::from_geometry(&geometry);
        log::info!(
            "geometry built: {} absorber(s), detector at z = {}, {} overlap(s)",
            geometry.layout.absorbers.len(),
            best_length(geometry.layout.detector_center.z),
            geometry.tree.overlaps().len()
        );
        self.geometry = Some(Arc::new(geometry));
        self.scorer = Some(scorer);
        self.state = ApplicationState::Idle;
        Ok(())
    }

    /// Process `n_events` primaries.
    pub fn beam_on(&mut self, n_events: u64) -> AbsorberResult<RunOutcome> {
        match self.state {
            ApplicationState::Idle => {}
            ApplicationState::PreInit => return Err(AbsorberError::NotInitialized),
            state => {
                return Err(AbsorberError::IllegalState {
                    command: "/run/beamOn".to_string(),
                    state,
                })
            }
        }
        let (Some(geometry), Some(scorer)) = (self.geometry.clone(), self.scorer) else {
            return Err(AbsorberError::NotInitialized);
        };

        let run_id = self.next_run_id;
        self.next_run_id += 1;
        self.state = ApplicationState::GeomClosed;
        self.aggregator.begin_run(run_id);
        let output = self
            .analysis()
            .is_open()
            .then(|| self.analysis().output_path(run_id).0);
        self.state = ApplicationState::EventProc;

        let stepping = SteppingManager::new(
            &geometry.tree,
            self.run_config.max_steps_per_track,
            self.run_config.max_step,
        );
        let n_workers = self.run_config.n_threads;
        let result = if n_workers <= 1 {
            for event in 0..n_events {
                process_event(&stepping, &scorer, &self.gun, &mut self.aggregator, event);
            }
            Ok(Vec::new())
        } else {
            self.run_workers(&stepping, &scorer, run_id, n_events, n_workers)
        };

        let global = self.aggregator.end_run(n_events);
        self.state = ApplicationState::Idle;
        let locals = result?;
        Ok(RunOutcome {
            run_id,
            n_events,
            global,
            locals,
            output,
        })
    }

    fn run_workers(
        &self,
        stepping: &SteppingManager<'_>,
        scorer: &StepScorer,
        run_id: u32,
        n_events: u64,
        n_workers: usize,
    ) -> AbsorberResult<Vec<RunSummary>> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(n_workers)
            .build()
            .map_err(|e| AbsorberError::Config(format!("worker pool: {e}")))?;
        let workers: Vec<RunAggregator> =
            (0..n_workers).map(|_| self.aggregator.worker()).collect();
        let gun = &self.gun;

        let locals = pool.install(|| {
            workers
                .into_par_iter()
                .enumerate()
                .filter_map(|(w, mut worker)| {
                    worker.begin_run(run_id);
                    let mut count = 0;
                    for event in (w as u64..n_events).step_by(n_workers) {
                        process_event(stepping, scorer, gun, &mut worker, event);
                        count += 1;
                    }
                    worker.end_run(count)
                })
                .collect()
        });
        Ok(locals)
    }
}

fn process_event(
    stepping: &SteppingManager<'_>,
    scorer: &StepScorer,
    gun: &ParticleGun,
    run: &mut RunAggregator,
    event: u64,
) {
    let mut track = gun.generate(event + 1);
    let report = stepping.process_track(&mut track, |step| {
        scorer.on_step(step, run);
    });
    log::trace!(
        "event {event}: {} step(s), {:.3} mm, ended {:?}",
        report.steps,
        report.path_length,
        track.status
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use absorber_types::AnalysisConfig;

    fn config_in(dir: &std::path::Path) -> AppConfig {
        AppConfig {
            analysis: AnalysisConfig {
                file_name: dir.join("A1").to_string_lossy().into_owned(),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    #[test]
    fn test_lifecycle_states() {
        let dir = tempfile::tempdir().unwrap();
        let mut rm = RunManager::new(config_in(dir.path())).unwrap();
        assert_eq!(rm.state(), ApplicationState::PreInit);
        assert!(matches!(rm.beam_on(1), Err(AbsorberError::NotInitialized)));
        rm.initialize().unwrap();
        assert_eq!(rm.state(), ApplicationState::Idle);
        assert!(matches!(rm.initialize(), Err(AbsorberError::IllegalState { .. })));
        assert!(rm.set_n_threads(2).is_err());
        let outcome = rm.beam_on(2).unwrap();
        assert_eq!(rm.state(), ApplicationState::Idle);
        assert_eq!(outcome.n_events, 2);
        assert_eq!(outcome.output, Some(dir.path().join("A1.json")));
        assert!(outcome.locals.is_empty());
    }

    #[test]
    fn test_run_ids_advance() {
        let dir = tempfile::tempdir().unwrap();
        let mut rm = RunManager::new(config_in(dir.path())).unwrap();
        rm.initialize().unwrap();
        assert_eq!(rm.beam_on(0).unwrap().run_id, 0);
        let second = rm.beam_on(1).unwrap();
        assert_eq!(second.run_id, 1);
        assert_eq!(second.output, Some(dir.path().join("A1_run1.json")));
    }

    #[test]
    fn test_zero_events_no_summary() {
        let dir = tempfile::tempdir().unwrap();
        let mut rm = RunManager::new(config_in(dir.path())).unwrap();
        rm.initialize().unwrap();
        assert!(rm.beam_on(0).unwrap().global.is_none());
    }

    #[test]
    fn test_invalid_config_rejected() {
        let mut config = AppConfig::default();
        config.run.max_step = 0.0;
        assert!(RunManager::new(config).is_err());
    }
}
