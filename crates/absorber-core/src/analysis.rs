// ─────────────────────────────────────────────────────────────────────
// Absorber — Histogram Back-end
// ─────────────────────────────────────────────────────────────────────
//! One-dimensional histograms and the analysis manager that owns them.
//!
//! The manager is shared by every worker; fills go through a
//! `parking_lot::Mutex`. Output files are opened, written and closed by
//! the master run only. The output format follows the file extension
//! (`.json`, `.csv`), falling back to the configured default type.
//!
//! With the activation mechanism enabled, inactive histograms neither
//! accept fills nor get written.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use absorber_types::{AbsorberError, AbsorberResult, AnalysisConfig};

/// Fixed-width 1D histogram with under- and overflow bins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct H1 {
    pub id: String,
    pub title: String,
    pub n_bins: usize,
    pub x_min: f64,
    pub x_max: f64,
    /// Bin contents; index 0 is underflow, `n_bins + 1` is overflow.
    bins: Vec<f64>,
    entries: u64,
    sum_w: f64,
    sum_wx: f64,
    sum_wx2: f64,
    pub active: bool,
}

impl H1 {
    pub fn new(id: &str, title: &str, n_bins: usize, x_min: f64, x_max: f64) -> Self {
        Self {
            id: id.to_string(),
            title: title.to_string(),
            n_bins,
            x_min,
            x_max,
            bins: vec![0.0; n_bins + 2],
            entries: 0,
            sum_w: 0.0,
            sum_wx: 0.0,
            sum_wx2: 0.0,
            active: true,
        }
    }

    pub fn fill(&mut self, x: f64, weight: f64) {
        let slot = if x < self.x_min {
            0
        } else if x >= self.x_max {
            self.n_bins + 1
        } else {
            let width = (self.x_max - self.x_min) / self.n_bins as f64;
            (((x - self.x_min) / width) as usize).min(self.n_bins - 1) + 1
        };
        self.bins[slot] += weight;
        self.entries += 1;
        self.sum_w += weight;
        self.sum_wx += weight * x;
        self.sum_wx2 += weight * x * x;
    }

    /// Content of in-range bin `i` (0-based).
    pub fn bin_content(&self, i: usize) -> f64 {
        self.bins[i + 1]
    }

    pub fn bin_edges(&self, i: usize) -> (f64, f64) {
        let width = (self.x_max - self.x_min) / self.n_bins as f64;
        let lo = self.x_min + i as f64 * width;
        (lo, lo + width)
    }

    pub fn underflow(&self) -> f64 {
        self.bins[0]
    }

    pub fn overflow(&self) -> f64 {
        self.bins[self.n_bins + 1]
    }

    pub fn entries(&self) -> u64 {
        self.entries
    }

    pub fn sum_of_weights(&self) -> f64 {
        self.sum_w
    }

    /// Weighted sum of filled values.
    pub fn fill_sum(&self) -> f64 {
        self.sum_wx
    }

    pub fn mean(&self) -> f64 {
        if self.sum_w == 0.0 {
            return 0.0;
        }
        self.sum_wx / self.sum_w
    }

    pub fn rms(&self) -> f64 {
        if self.sum_w == 0.0 {
            return 0.0;
        }
        let mean = self.mean();
        (self.sum_wx2 / self.sum_w - mean * mean).max(0.0).sqrt()
    }

    pub fn reset(&mut self) {
        self.bins.iter_mut().for_each(|b| *b = 0.0);
        self.entries = 0;
        self.sum_w = 0.0;
        self.sum_wx = 0.0;
        self.sum_wx2 = 0.0;
    }

    /// Change the binning; contents are cleared.
    pub fn set_binning(&mut self, n_bins: usize, x_min: f64, x_max: f64) {
        self.n_bins = n_bins;
        self.x_min = x_min;
        self.x_max = x_max;
        self.bins = vec![0.0; n_bins + 2];
        self.reset();
    }
}

/// Output format of a histogram file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileType {
    Json,
    Csv,
}

impl FileType {
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "json" => Some(FileType::Json),
            "csv" => Some(FileType::Csv),
            _ => None,
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            FileType::Json => "json",
            FileType::Csv => "csv",
        }
    }

    fn write(self, path: &Path, histograms: &[&H1]) -> AbsorberResult<()> {
        let mut out = BufWriter::new(File::create(path)?);
        match self {
            FileType::Json => serde_json::to_writer_pretty(&mut out, histograms)?,
            FileType::Csv => {
                writeln!(out, "id,title,bin,low,high,content")?;
                for h in histograms {
                    for i in 0..h.n_bins {
                        let (lo, hi) = h.bin_edges(i);
                        writeln!(
                            out,
                            "{},\"{}\",{i},{lo},{hi},{}",
                            h.id,
                            h.title.replace('"', "\"\""),
                            h.bin_content(i)
                        )?;
                    }
                }
            }
        }
        out.flush()?;
        Ok(())
    }
}

struct AnalysisState {
    file_name: String,
    default_type: FileType,
    verbose_level: u32,
    activation: bool,
    histograms: Vec<H1>,
    open_file: Option<(PathBuf, FileType)>,
}

/// Shared histogram registry and file handler.
pub struct AnalysisManager {
    state: Mutex<AnalysisState>,
}

impl AnalysisManager {
    pub fn new(config: &AnalysisConfig) -> AbsorberResult<Self> {
        config.validate()?;
        let default_type = FileType::from_extension(&config.file_type).ok_or_else(|| {
            AbsorberError::Config(format!("unsupported file type {}", config.file_type))
        })?;
        Ok(Self {
            state: Mutex::new(AnalysisState {
                file_name: config.file_name.clone(),
                default_type,
                verbose_level: config.verbose_level,
                activation: config.activation,
                histograms: Vec::new(),
                open_file: None,
            }),
        })
    }

    pub fn set_file_name(&self, name: &str) {
        self.state.lock().file_name = name.to_string();
    }

    pub fn file_name(&self) -> String {
        self.state.lock().file_name.clone()
    }

    pub fn set_default_file_type(&self, ext: &str) -> AbsorberResult<()> {
        let ty = FileType::from_extension(ext)
            .ok_or_else(|| AbsorberError::Analysis(format!("unsupported file type {ext}")))?;
        self.state.lock().default_type = ty;
        Ok(())
    }

    pub fn set_verbose_level(&self, level: u32) {
        self.state.lock().verbose_level = level;
    }

    /// Enable or disable the activation mechanism.
    pub fn set_activation(&self, activation: bool) {
        self.state.lock().activation = activation;
    }

    /// Register a histogram and return its index.
    pub fn create_h1(&self, id: &str, title: &str, n_bins: usize, x_min: f64, x_max: f64) -> usize {
        let mut state = self.state.lock();
        state.histograms.push(H1::new(id, title, n_bins, x_min, x_max));
        state.histograms.len() - 1
    }

    pub fn set_h1(&self, index: usize, n_bins: usize, x_min: f64, x_max: f64) -> AbsorberResult<()> {
        if n_bins == 0 || x_max.is_nan() || x_min.is_nan() || x_max <= x_min {
            return Err(AbsorberError::Analysis(format!(
                "invalid binning {n_bins} [{x_min}, {x_max}]"
            )));
        }
        let mut state = self.state.lock();
        let h = state
            .histograms
            .get_mut(index)
            .ok_or_else(|| AbsorberError::Analysis(format!("no histogram {index}")))?;
        h.set_binning(n_bins, x_min, x_max);
        Ok(())
    }

    pub fn set_h1_activation(&self, index: usize, active: bool) -> AbsorberResult<()> {
        let mut state = self.state.lock();
        let h = state
            .histograms
            .get_mut(index)
            .ok_or_else(|| AbsorberError::Analysis(format!("no histogram {index}")))?;
        h.active = active;
        Ok(())
    }

    /// Activate or deactivate every histogram.
    pub fn set_all_h1_activation(&self, active: bool) {
        self.state
            .lock()
            .histograms
            .iter_mut()
            .for_each(|h| h.active = active);
    }

    /// Fill histogram `index`; returns false when the fill was skipped.
    pub fn fill_h1(&self, index: usize, x: f64) -> bool {
        let mut state = self.state.lock();
        let activation = state.activation;
        match state.histograms.get_mut(index) {
            Some(h) if !activation || h.active => {
                h.fill(x, 1.0);
                true
            }
            Some(_) => false,
            None => {
                log::warn!("fill_h1: no histogram {index}");
                false
            }
        }
    }

    pub fn h1(&self, index: usize) -> Option<H1> {
        self.state.lock().histograms.get(index).cloned()
    }

    pub fn num_h1(&self) -> usize {
        self.state.lock().histograms.len()
    }

    pub fn reset_h1s(&self) {
        self.state.lock().histograms.iter_mut().for_each(H1::reset);
    }

    /// Output path for `run_id`: the base name for run 0, `<base>_run<N>`
    /// afterwards.
    pub fn output_path(&self, run_id: u32) -> (PathBuf, FileType) {
        let state = self.state.lock();
        let base = PathBuf::from(&state.file_name);
        let (stem, ty) = match base
            .extension()
            .and_then(|e| e.to_str())
            .and_then(FileType::from_extension)
        {
            Some(ty) => (base.with_extension(""), ty),
            None => (base, state.default_type),
        };
        let stem = if run_id == 0 {
            stem
        } else {
            let mut s = stem.into_os_string();
            s.push(format!("_run{run_id}"));
            PathBuf::from(s)
        };
        (stem.with_extension(ty.extension()), ty)
    }

    pub fn open_file(&self, run_id: u32) -> AbsorberResult<PathBuf> {
        let (path, ty) = self.output_path(run_id);
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        File::create(&path)?;
        let mut state = self.state.lock();
        if state.verbose_level > 0 {
            log::info!("analysis file {} opened", path.display());
        }
        state.open_file = Some((path.clone(), ty));
        Ok(path)
    }

    pub fn is_open(&self) -> bool {
        self.state.lock().open_file.is_some()
    }

    /// Write the eligible histograms into the open file.
    pub fn write(&self) -> AbsorberResult<()> {
        let state = self.state.lock();
        let Some((path, ty)) = state.open_file.as_ref() else {
            return Err(AbsorberError::Analysis("no open file".to_string()));
        };
        let selected: Vec<&H1> = state
            .histograms
            .iter()
            .filter(|h| !state.activation || h.active)
            .collect();
        ty.write(path, &selected)?;
        if state.verbose_level > 0 {
            log::info!("{} histogram(s) written to {}", selected.len(), path.display());
        }
        Ok(())
    }

    pub fn close_file(&self) {
        self.state.lock().open_file = None;
    }
}
