// ─────────────────────────────────────────────────────────────────────
// Absorber — Command Interpreter
// ─────────────────────────────────────────────────────────────────────
//! Routes text commands to their messenger and executes macro files.
//!
//! `/det/` and `/analysis/` go to the core messengers; `/run/`, `/gun/`
//! and `/control/` are host commands handled here. A failing macro line
//! is logged and skipped; execution continues with the next line.

use std::path::Path;

use glam::DVec3;

use absorber_core::messenger::{parse_number, parse_quantity, split_command};
use absorber_core::{AnalysisMessenger, DetectorMessenger, Messenger};
use absorber_types::units::{energy_unit, length_unit};
use absorber_types::{AbsorberError, AbsorberResult, ApplicationState};

use crate::run_manager::{RunManager, RunOutcome};

pub struct UiManager {
    run_manager: RunManager,
    outcomes: Vec<RunOutcome>,
    verbose_level: u32,
}

impl UiManager {
    pub fn new(run_manager: RunManager) -> Self {
        Self {
            run_manager,
            outcomes: Vec::new(),
            verbose_level: 0,
        }
    }

    pub fn run_manager(&self) -> &RunManager {
        &self.run_manager
    }

    pub fn run_manager_mut(&mut self) -> &mut RunManager {
        &mut self.run_manager
    }

    /// Outcomes of every `/run/beamOn` so far.
    pub fn outcomes(&self) -> &[RunOutcome] {
        &self.outcomes
    }

    pub fn verbose_level(&self) -> u32 {
        self.verbose_level
    }

    /// Execute one command line. Blank lines and comments are no-ops.
    pub fn apply_command(&mut self, line: &str) -> AbsorberResult<()> {
        let Some((command, parameters)) = split_command(line) else {
            return Ok(());
        };
        if self.verbose_level > 0 {
            log::info!("{command} {parameters}");
        }
        let state = self.run_manager.state();

        let detector = DetectorMessenger::new(self.run_manager.registry());
        if detector.handles(command) {
            return detector.apply(command, parameters, state);
        }
        let analysis = AnalysisMessenger::new(self.run_manager.analysis());
        if analysis.handles(command) {
            return analysis.apply(command, parameters, state);
        }

        match command {
            "/run/initialize" => self.run_manager.initialize(),
            "/run/beamOn" => {
                let n_events = match parameters.split_whitespace().next() {
                    Some(token) => parse_number(token)?,
                    None => 1,
                };
                let outcome = self.run_manager.beam_on(n_events)?;
                self.outcomes.push(outcome);
                Ok(())
            }
            "/run/numberOfThreads" => {
                let n = parse_number(first_token(command, parameters)?)?;
                self.run_manager.set_n_threads(n)
            }
            "/control/verbose" => {
                self.verbose_level = parse_number(first_token(command, parameters)?)?;
                Ok(())
            }
            _ if command.starts_with("/gun/") => self.apply_gun(command, parameters, state),
            _ => Err(AbsorberError::Command(format!("command not found: {command}"))),
        }
    }

    fn apply_gun(
        &mut self,
        command: &str,
        parameters: &str,
        state: ApplicationState,
    ) -> AbsorberResult<()> {
        if state == ApplicationState::EventProc {
            return Err(AbsorberError::IllegalState {
                command: command.to_string(),
                state,
            });
        }
        let gun = self.run_manager.gun_mut();
        match command {
            "/gun/particle" => gun.set_particle(first_token(command, parameters)?),
            "/gun/ion" => {
                let mut tokens = parameters.split_whitespace();
                let (Some(z), Some(a)) = (tokens.next(), tokens.next()) else {
                    return Err(AbsorberError::Command(format!("{command} expects: Z A")));
                };
                gun.set_ion(parse_number(z)?, parse_number(a)?)
            }
            "/gun/energy" => gun.set_energy(parse_quantity(parameters, "GeV", energy_unit)?),
            "/gun/position" => {
                gun.set_position(parse_vector(command, parameters, Some(length_unit))?);
                Ok(())
            }
            "/gun/direction" => gun.set_direction(parse_vector(command, parameters, None)?),
            _ => Err(AbsorberError::Command(format!("command not found: {command}"))),
        }
    }

    /// Run every line of `text`; returns the number of failed lines.
    pub fn execute_macro(&mut self, text: &str) -> usize {
        let mut failures = 0;
        for (lineno, line) in text.lines().enumerate() {
            if let Err(e) = self.apply_command(line) {
                log::error!("macro line {}: {}: {e}", lineno + 1, line.trim());
                failures += 1;
            }
        }
        failures
    }

    pub fn execute_file(&mut self, path: &Path) -> AbsorberResult<usize> {
        let text = std::fs::read_to_string(path)?;
        Ok(self.execute_macro(&text))
    }
}

fn first_token<'p>(command: &str, parameters: &'p str) -> AbsorberResult<&'p str> {
    parameters
        .split_whitespace()
        .next()
        .ok_or_else(|| AbsorberError::Command(format!("{command}: missing parameter")))
}

/// `x y z [unit]`; the unit defaults to mm for positions.
fn parse_vector(
    command: &str,
    parameters: &str,
    unit_lookup: Option<fn(&str) -> Option<f64>>,
) -> AbsorberResult<DVec3> {
    let tokens: Vec<&str> = parameters.split_whitespace().collect();
    if tokens.len() < 3 {
        return Err(AbsorberError::Command(format!("{command} expects: x y z")));
    }
    let scale = match (unit_lookup, tokens.get(3)) {
        (Some(lookup), Some(unit)) => lookup(unit)
            .ok_or_else(|| AbsorberError::Command(format!("unknown unit {unit:?}")))?,
        _ => 1.0,
    };
    Ok(DVec3::new(
        parse_number::<f64>(tokens[0])? * scale,
        parse_number::<f64>(tokens[1])? * scale,
        parse_number::<f64>(tokens[2])? * scale,
    ))
}
