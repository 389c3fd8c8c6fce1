// ─────────────────────────────────────────────────────────────────────
// Absorber — Run Aggregator
// ─────────────────────────────────────────────────────────────────────
//! Owns the six species histograms and the per-bucket energy
//! accumulators for one thread's run.
//!
//! The master aggregator books the histograms and handles the output
//! file; worker aggregators share the same analysis manager and only
//! score. Every aggregator merges its local totals into the shared
//! [`AccumulableManager`] at end of run.

use std::sync::Arc;

use absorber_types::{AbsorberResult, AnalysisConfig, Bucket, RunSummary, N_BUCKETS};

use crate::accumulable::{AccumulableManager, EnergyAccumulators};
use crate::analysis::AnalysisManager;

pub struct RunAggregator {
    is_master: bool,
    analysis: Arc<AnalysisManager>,
    accumulables: Arc<AccumulableManager>,
    histograms: [usize; N_BUCKETS],
    local: EnergyAccumulators,
    run_id: u32,
}

impl RunAggregator {
    /// Master aggregator: books the histograms (inactive) in a fresh
    /// analysis manager.
    pub fn master(config: &AnalysisConfig) -> AbsorberResult<Self> {
        let analysis = Arc::new(AnalysisManager::new(config)?);
        let mut histograms = [0; N_BUCKETS];
        for bucket in Bucket::ALL {
            let ih = analysis.create_h1(
                &bucket.id(),
                bucket.title(),
                config.n_bins,
                config.e_min,
                config.e_max,
            );
            analysis.set_h1_activation(ih, false)?;
            histograms[bucket.index()] = ih;
        }
        Ok(Self {
            is_master: true,
            analysis,
            accumulables: Arc::new(AccumulableManager::new()),
            histograms,
            local: EnergyAccumulators::new(),
            run_id: 0,
        })
    }

    /// Worker aggregator sharing this master's histograms and merge target.
    pub fn worker(&self) -> Self {
        Self {
            is_master: false,
            analysis: Arc::clone(&self.analysis),
            accumulables: Arc::clone(&self.accumulables),
            histograms: self.histograms,
            local: EnergyAccumulators::new(),
            run_id: self.run_id,
        }
    }

    pub fn is_master(&self) -> bool {
        self.is_master
    }

    pub fn analysis(&self) -> &Arc<AnalysisManager> {
        &self.analysis
    }

    pub fn histogram_index(&self, bucket: Bucket) -> usize {
        self.histograms[bucket.index()]
    }

    pub fn local(&self) -> &EnergyAccumulators {
        &self.local
    }

    /// Totals merged so far from every aggregator of this run.
    pub fn merged(&self) -> EnergyAccumulators {
        self.accumulables.snapshot()
    }

    pub fn begin_run(&mut self, run_id: u32) {
        self.run_id = run_id;
        if self.is_master {
            self.analysis.reset_h1s();
            self.accumulables.reset();
            if let Err(e) = self.analysis.open_file(run_id) {
                log::error!("run {run_id}: cannot open analysis file: {e}");
            }
        }
        self.local.reset();
    }

    pub fn fill_histogram(&self, bucket: Bucket, energy: f64) {
        self.analysis.fill_h1(self.histograms[bucket.index()], energy);
    }

    pub fn add_energy(&mut self, bucket: Bucket, energy: f64) {
        self.local.add(bucket, energy);
    }

    /// Finish the run. Workers must end before the master so the global
    /// summary sees every merged contribution.
    pub fn end_run(&mut self, n_events: u64) -> Option<RunSummary> {
        if self.is_master && self.analysis.is_open() {
            if let Err(e) = self.analysis.write() {
                log::error!("run {}: cannot write histograms: {e}", self.run_id);
            }
            self.analysis.close_file();
        }
        if n_events == 0 {
            return None;
        }

        self.accumulables.merge(&self.local);
        let totals = if self.is_master {
            self.accumulables.snapshot().totals()
        } else {
            self.local.totals()
        };
        let summary = RunSummary {
            is_master: self.is_master,
            n_events,
            totals,
        };
        log::info!("\n{summary}");
        Some(summary)
    }
}
