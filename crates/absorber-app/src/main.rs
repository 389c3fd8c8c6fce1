// ─────────────────────────────────────────────────────────────────────
// Absorber — Command-Line Driver
// (C) 1998-2026 Miroslav Sotek. All rights reserved.
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Absorber/detector simulation driver.
//!
//! Usage:
//!     absorber run.mac
//!     absorber --config stack.json --events 1000 --threads 4
//!     absorber --print-config > stack.json

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Parser;

use absorber_host::{RunManager, RunOutcome, UiManager};
use absorber_types::{AppConfig, ApplicationState};

/// Absorber stack in front of an air detector; scores particles entering it
#[derive(Parser)]
#[command(name = "absorber")]
#[command(version)]
#[command(about = "Absorber/detector energy-spectrum simulation", long_about = None)]
struct Cli {
    /// Macro file with /det/, /analysis/, /gun/ and /run/ commands
    macro_file: Option<PathBuf>,

    /// JSON configuration (detector, analysis, run sections)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Worker threads (0 = run on the main thread)
    #[arg(short, long)]
    threads: Option<usize>,

    /// Events to run after the macro, initialising first if needed
    #[arg(short, long)]
    events: Option<u64>,

    /// Histogram output base name
    #[arg(short, long)]
    output: Option<String>,

    /// Print the effective configuration as JSON and exit
    #[arg(long)]
    print_config: bool,
}

fn load_config(cli: &Cli) -> Result<AppConfig> {
    let mut config = match &cli.config {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("reading {}", path.display()))?;
            AppConfig::from_json(&text)?
        }
        None => AppConfig::default(),
    };
    if let Some(n) = cli.threads {
        config.run.n_threads = n;
    }
    if let Some(name) = &cli.output {
        config.analysis.file_name = name.clone();
    }
    config.validate()?;
    Ok(config)
}

/// One line per histogram file written. Run summaries are already
/// logged by the run aggregator and are not repeated here.
fn output_report(outcomes: &[RunOutcome]) -> Vec<String> {
    outcomes
        .iter()
        .filter_map(|o| {
            o.output
                .as_ref()
                .map(|path| format!("run {}: histograms written to {}", o.run_id, path.display()))
        })
        .collect()
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let config = load_config(&cli)?;

    if cli.print_config {
        println!("{}", serde_json::to_string_pretty(&config)?);
        return Ok(());
    }

    if cli.macro_file.is_none() && cli.events.is_none() {
        bail!("nothing to do: give a macro file or --events");
    }

    let mut ui = UiManager::new(RunManager::new(config)?);

    if let Some(path) = &cli.macro_file {
        let failures = ui
            .execute_file(path)
            .with_context(|| format!("executing macro {}", path.display()))?;
        if failures > 0 {
            log::warn!("{failures} macro line(s) failed");
        }
    }

    if let Some(n_events) = cli.events {
        if ui.run_manager().state() == ApplicationState::PreInit {
            ui.apply_command("/run/initialize")?;
        }
        ui.apply_command(&format!("/run/beamOn {n_events}"))?;
    }

    for line in output_report(ui.outcomes()) {
        log::info!("{line}");
    }
    Ok(())
}
