// ─────────────────────────────────────────────────────────────────────
// Absorber — Command Messengers
// ─────────────────────────────────────────────────────────────────────
//! Text-command bindings for the detector registry and the analysis
//! manager.
//!
//! A command line is `<path> <parameters...>`, e.g.
//! `/det/setAbso2Thick 5 mm`. Messengers borrow the object they drive;
//! the registry and analysis manager always outlive their bindings.
//!
//! Detector commands are honoured only in `PreInit`. Setter-level
//! mistakes (wrong order, out-of-range count) are warnings, not errors.

use std::str::FromStr;

use absorber_types::units::{energy_unit, length_unit};
use absorber_types::{AbsorberError, AbsorberResult, ApplicationState, MAX_ABSORBERS};

use crate::analysis::AnalysisManager;
use crate::registry::{ConfigRegistry, SlotField};

/// Split a macro line into command path and parameter string.
///
/// Returns `None` for blank lines and `#` comments.
pub fn split_command(line: &str) -> Option<(&str, &str)> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return None;
    }
    match line.split_once(char::is_whitespace) {
        Some((command, rest)) => Some((command, rest.trim())),
        None => Some((line, "")),
    }
}

pub fn parse_bool(token: &str) -> AbsorberResult<bool> {
    match token.to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "y" | "t" => Ok(true),
        "false" | "0" | "no" | "n" | "f" => Ok(false),
        _ => Err(AbsorberError::Command(format!("not a boolean: {token:?}"))),
    }
}

pub fn parse_number<T: FromStr>(token: &str) -> AbsorberResult<T> {
    token
        .parse()
        .map_err(|_| AbsorberError::Command(format!("not a number: {token:?}")))
}

/// Parse `value [unit]`, scaling by `lookup(unit)`.
pub fn parse_quantity(
    parameters: &str,
    default_unit: &str,
    lookup: fn(&str) -> Option<f64>,
) -> AbsorberResult<f64> {
    let mut tokens = parameters.split_whitespace();
    let value: f64 = parse_number(
        tokens
            .next()
            .ok_or_else(|| AbsorberError::Command("missing value".to_string()))?,
    )?;
    let unit = tokens.next().unwrap_or(default_unit);
    let scale =
        lookup(unit).ok_or_else(|| AbsorberError::Command(format!("unknown unit {unit:?}")))?;
    Ok(value * scale)
}

fn single_token<'p>(command: &str, parameters: &'p str) -> AbsorberResult<&'p str> {
    let mut tokens = parameters.split_whitespace();
    match (tokens.next(), tokens.next()) {
        (Some(token), None) => Ok(token),
        _ => Err(AbsorberError::Command(format!(
            "{command} takes exactly one parameter"
        ))),
    }
}

/// A directory of text commands.
pub trait Messenger {
    /// Command path prefix, e.g. `/det/`.
    fn directory(&self) -> &'static str;

    fn handles(&self, command: &str) -> bool {
        command.starts_with(self.directory())
    }

    fn apply(
        &self,
        command: &str,
        parameters: &str,
        state: ApplicationState,
    ) -> AbsorberResult<()>;
}

/// `/det/` commands bound to a configuration registry.
pub struct DetectorMessenger<'a> {
    registry: &'a ConfigRegistry,
}

impl<'a> DetectorMessenger<'a> {
    pub fn new(registry: &'a ConfigRegistry) -> Self {
        Self { registry }
    }

    /// `setAbso<N>Thick` / `setAbso<N>Mat` → (N, is_thickness).
    fn slot_command(name: &str) -> Option<(usize, bool)> {
        let rest = name.strip_prefix("setAbso")?;
        let (digit, suffix) = rest.split_at(rest.find(|c: char| !c.is_ascii_digit())?);
        let index: usize = digit.parse().ok()?;
        if !(1..=MAX_ABSORBERS).contains(&index) {
            return None;
        }
        match suffix {
            "Thick" => Some((index, true)),
            "Mat" => Some((index, false)),
            _ => None,
        }
    }
}

impl Messenger for DetectorMessenger<'_> {
    fn directory(&self) -> &'static str {
        "/det/"
    }

    fn apply(
        &self,
        command: &str,
        parameters: &str,
        state: ApplicationState,
    ) -> AbsorberResult<()> {
        let name = command
            .strip_prefix(self.directory())
            .ok_or_else(|| AbsorberError::Command(format!("unknown command {command}")))?;
        let known = matches!(name, "setAbsorber" | "setNbOfAbsoCmd")
            || Self::slot_command(name).is_some();
        if !known {
            return Err(AbsorberError::Command(format!("unknown command {command}")));
        }
        if !state.is_pre_init() {
            return Err(AbsorberError::IllegalState {
                command: command.to_string(),
                state,
            });
        }

        match name {
            "setAbsorber" => {
                self.registry
                    .set_enabled(parse_bool(single_token(command, parameters)?)?);
            }
            "setNbOfAbsoCmd" => {
                self.registry
                    .set_declared_count(parse_number(single_token(command, parameters)?)?);
            }
            _ => {
                let Some((index, is_thickness)) = Self::slot_command(name) else {
                    return Err(AbsorberError::Command(format!("unknown command {command}")));
                };
                let field = if is_thickness {
                    SlotField::Thickness(parse_quantity(parameters, "mm", length_unit)?)
                } else {
                    SlotField::Material(single_token(command, parameters)?.to_string())
                };
                self.registry.set_slot(index, field);
            }
        }
        Ok(())
    }
}

/// `/analysis/` commands bound to the histogram manager.
pub struct AnalysisMessenger<'a> {
    analysis: &'a AnalysisManager,
}

impl<'a> AnalysisMessenger<'a> {
    pub fn new(analysis: &'a AnalysisManager) -> Self {
        Self { analysis }
    }
}

impl Messenger for AnalysisMessenger<'_> {
    fn directory(&self) -> &'static str {
        "/analysis/"
    }

    fn apply(
        &self,
        command: &str,
        parameters: &str,
        state: ApplicationState,
    ) -> AbsorberResult<()> {
        let name = command
            .strip_prefix(self.directory())
            .ok_or_else(|| AbsorberError::Command(format!("unknown command {command}")))?;
        if !state.allows_analysis_commands() {
            return Err(AbsorberError::IllegalState {
                command: command.to_string(),
                state,
            });
        }

        match name {
            "setFileName" => self.analysis.set_file_name(single_token(command, parameters)?),
            "setFileType" => self
                .analysis
                .set_default_file_type(single_token(command, parameters)?)?,
            "verbose" => self
                .analysis
                .set_verbose_level(parse_number(single_token(command, parameters)?)?),
            "activate" => self
                .analysis
                .set_activation(parse_bool(single_token(command, parameters)?)?),
            "h1/setActivation" => {
                let tokens: Vec<&str> = parameters.split_whitespace().collect();
                let &[id, flag] = tokens.as_slice() else {
                    return Err(AbsorberError::Command(format!("{command} expects: id bool")));
                };
                self.analysis
                    .set_h1_activation(parse_number(id)?, parse_bool(flag)?)?;
            }
            "h1/setActivationToAll" => self
                .analysis
                .set_all_h1_activation(parse_bool(single_token(command, parameters)?)?),
            "h1/set" => {
                let tokens: Vec<&str> = parameters.split_whitespace().collect();
                let (id, n_bins, v_min, v_max, unit) = match *tokens.as_slice() {
                    [id, n, lo, hi] => (id, n, lo, hi, "MeV"),
                    [id, n, lo, hi, unit] => (id, n, lo, hi, unit),
                    _ => {
                        return Err(AbsorberError::Command(format!(
                            "{command} expects: id nbins vmin vmax [unit]"
                        )))
                    }
                };
                let scale = energy_unit(unit)
                    .ok_or_else(|| AbsorberError::Command(format!("unknown unit {unit:?}")))?;
                self.analysis.set_h1(
                    parse_number(id)?,
                    parse_number(n_bins)?,
                    parse_number::<f64>(v_min)? * scale,
                    parse_number::<f64>(v_max)? * scale,
                )?;
            }
            _ => return Err(AbsorberError::Command(format!("unknown command {command}"))),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use absorber_types::{AbsorberSlot, AnalysisConfig};

    fn det(registry: &ConfigRegistry, line: &str) -> AbsorberResult<()> {
        let (command, parameters) = split_command(line).unwrap();
        DetectorMessenger::new(registry).apply(command, parameters, ApplicationState::PreInit)
    }

    #[test]
    fn test_split_command() {
        assert_eq!(
            split_command("  /det/setAbso1Mat  G4_Pb "),
            Some(("/det/setAbso1Mat", "G4_Pb"))
        );
        assert_eq!(split_command("/run/initialize"), Some(("/run/initialize", "")));
        assert_eq!(split_command("# comment"), None);
        assert_eq!(split_command("   "), None);
    }

    #[test]
    fn test_parse_bool_forms() {
        for s in ["true", "TRUE", "1", "yes", "y", "t"] {
            assert!(parse_bool(s).unwrap());
        }
        for s in ["false", "0", "No", "n", "f"] {
            assert!(!parse_bool(s).unwrap());
        }
        assert!(parse_bool("maybe").is_err());
    }

    #[test]
    fn test_parse_quantity_units() {
        assert_eq!(parse_quantity("5", "mm", length_unit).unwrap(), 5.0);
        assert_eq!(parse_quantity("1.5 cm", "mm", length_unit).unwrap(), 15.0);
        assert!(parse_quantity("1 parsec", "mm", length_unit).is_err());
        assert!(parse_quantity("", "mm", length_unit).is_err());
    }

    #[test]
    fn test_detector_commands_fill_registry() {
        let registry = ConfigRegistry::new();
        det(&registry, "/det/setAbsorber true").unwrap();
        det(&registry, "/det/setNbOfAbsoCmd 2").unwrap();
        det(&registry, "/det/setAbso1Thick 1 cm").unwrap();
        det(&registry, "/det/setAbso1Mat G4_Pb").unwrap();
        det(&registry, "/det/setAbso2Thick 2").unwrap();
        det(&registry, "/det/setAbso2Mat G4_Al").unwrap();
        let config = registry.snapshot();
        assert!(config.enabled);
        assert_eq!(config.declared_count, Some(2));
        assert_eq!(
            config.slots,
            vec![AbsorberSlot::new(10.0, "G4_Pb"), AbsorberSlot::new(2.0, "G4_Al")]
        );
    }

    #[test]
    fn test_overwrite_keeps_count() {
        let registry = ConfigRegistry::new();
        det(&registry, "/det/setNbOfAbsoCmd 1").unwrap();
        det(&registry, "/det/setAbso1Thick 3 mm").unwrap();
        det(&registry, "/det/setAbso1Thick 7 mm").unwrap();
        let config = registry.snapshot();
        assert_eq!(config.slots[0].thickness, Some(7.0));
        assert_eq!(config.declared_count, Some(1));
    }

    #[test]
    fn test_wrong_order_is_not_an_error() {
        let registry = ConfigRegistry::new();
        det(&registry, "/det/setAbso2Thick 1 mm").unwrap();
        assert!(registry.snapshot().slots.is_empty());
    }

    #[test]
    fn test_detector_rejects_outside_pre_init() {
        let registry = ConfigRegistry::new();
        let err = DetectorMessenger::new(&registry)
            .apply("/det/setAbsorber", "true", ApplicationState::Idle)
            .unwrap_err();
        assert!(matches!(err, AbsorberError::IllegalState { state: ApplicationState::Idle, .. }));
        assert!(!registry.snapshot().enabled);
    }

    #[test]
    fn test_detector_unknown_and_malformed() {
        let registry = ConfigRegistry::new();
        assert!(det(&registry, "/det/setAbso5Thick 1 mm").is_err());
        assert!(det(&registry, "/det/setAbso1Colour red").is_err());
        assert!(det(&registry, "/det/setAbsorber").is_err());
        assert!(det(&registry, "/det/setNbOfAbsoCmd two").is_err());
    }

    #[test]
    fn test_analysis_commands() {
        let analysis = AnalysisManager::new(&AnalysisConfig::default()).unwrap();
        let ih = analysis.create_h1("0", "t", 100, 0.0, 100.0);
        analysis.set_h1_activation(ih, false).unwrap();
        let m = AnalysisMessenger::new(&analysis);
        let state = ApplicationState::Idle;
        m.apply("/analysis/setFileName", "scan", state).unwrap();
        m.apply("/analysis/setFileType", "csv", state).unwrap();
        m.apply("/analysis/h1/setActivation", "0 true", state).unwrap();
        m.apply("/analysis/h1/set", "0 50 0 1 GeV", state).unwrap();
        let h = analysis.h1(ih).unwrap();
        assert!(h.active);
        assert_eq!(h.n_bins, 50);
        assert_eq!(h.x_max, 1000.0);
        assert_eq!(analysis.file_name(), "scan");
        assert!(m.apply("/analysis/setFileType", "root", state).is_err());
        assert!(m.apply("/analysis/h1/set", "0 50", state).is_err());
        assert!(m.apply("/analysis/nope", "", state).is_err());
    }

    #[test]
    fn test_analysis_rejected_during_events() {
        let analysis = AnalysisManager::new(&AnalysisConfig::default()).unwrap();
        let m = AnalysisMessenger::new(&analysis);
        assert!(matches!(
            m.apply("/analysis/setFileName", "x", ApplicationState::EventProc),
            Err(AbsorberError::IllegalState { .. })
        ));
    }
}
