// ─────────────────────────────────────────────────────────────────────
// Absorber — Configuration
// ─────────────────────────────────────────────────────────────────────

use glam::DVec3;
use serde::{Deserialize, Serialize};

use crate::error::{AbsorberError, AbsorberResult};
use crate::units::MEV;

/// Maximum number of absorber slots.
pub const MAX_ABSORBERS: usize = 4;

/// One absorber slot record.
///
/// The two fields are filled independently by the ordered slot setter,
/// so a record may be half-populated until both commands arrive.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AbsorberSlot {
    /// Full thickness along the beam axis (mm).
    pub thickness: Option<f64>,
    /// Material catalogue name, e.g. `G4_Pb`.
    pub material: Option<String>,
}

impl AbsorberSlot {
    pub fn new(thickness: f64, material: &str) -> Self {
        Self {
            thickness: Some(thickness),
            material: Some(material.to_string()),
        }
    }
}

/// Absorber stack configuration record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AbsorberConfig {
    /// When false the absorber stack is skipped entirely.
    pub enabled: bool,
    /// Number of absorbers to build. `None` until set.
    pub declared_count: Option<i32>,
    /// Ordered slot records, index 0 is absorber 1.
    pub slots: Vec<AbsorberSlot>,
}

impl AbsorberConfig {
    /// Number of leading slots with a thickness.
    pub fn thickness_len(&self) -> usize {
        self.slots
            .iter()
            .take_while(|s| s.thickness.is_some())
            .count()
    }

    /// Number of leading slots with a material name.
    pub fn material_len(&self) -> usize {
        self.slots
            .iter()
            .take_while(|s| s.material.is_some())
            .count()
    }

    /// Whether the record describes a stack that the builder may attempt.
    ///
    /// Requires the enable flag, a declared count of at least one, and
    /// both field sequences matching the declared count exactly.
    pub fn stack_requested(&self) -> bool {
        match self.declared_count {
            Some(n) if self.enabled && n >= 1 => {
                let n = n as usize;
                self.thickness_len() == n && self.material_len() == n
            }
            _ => false,
        }
    }

    /// Validate a record loaded from a file.
    ///
    /// Non-positive thicknesses and unknown materials are not rejected
    /// here: the builder reports them and truncates the stack.
    pub fn validate(&self) -> AbsorberResult<()> {
        if let Some(n) = self.declared_count {
            if !(1..=MAX_ABSORBERS as i32).contains(&n) {
                return Err(AbsorberError::Config(format!(
                    "declared_count must be in [1, {MAX_ABSORBERS}], got {n}"
                )));
            }
        }
        if self.slots.len() > MAX_ABSORBERS {
            return Err(AbsorberError::Config(format!(
                "at most {MAX_ABSORBERS} absorber slots, got {}",
                self.slots.len()
            )));
        }
        if self.thickness_len() != self.slots.iter().filter(|s| s.thickness.is_some()).count()
            || self.material_len() != self.slots.iter().filter(|s| s.material.is_some()).count()
        {
            return Err(AbsorberError::Config(
                "absorber slots must be filled left to right".to_string(),
            ));
        }
        for (i, slot) in self.slots.iter().enumerate() {
            if let Some(t) = slot.thickness {
                if !t.is_finite() {
                    return Err(AbsorberError::Config(format!(
                        "absorber {} thickness must be finite, got {t}",
                        i + 1
                    )));
                }
            }
        }
        Ok(())
    }
}

/// Histogram back-end settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Output base name without extension.
    pub file_name: String,
    /// Default output type when the name carries no extension.
    pub file_type: String,
    pub verbose_level: u32,
    /// When true, only activated histograms are written.
    pub activation: bool,
    pub n_bins: usize,
    /// Lower histogram edge (MeV).
    pub e_min: f64,
    /// Upper histogram edge (MeV).
    pub e_max: f64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            file_name: "A1".to_string(),
            file_type: "json".to_string(),
            verbose_level: 0,
            activation: true,
            n_bins: 100,
            e_min: 0.0,
            e_max: 100.0 * MEV,
        }
    }
}

impl AnalysisConfig {
    pub fn validate(&self) -> AbsorberResult<()> {
        if self.file_name.trim().is_empty() {
            return Err(AbsorberError::Config("file_name must not be empty".to_string()));
        }
        if !matches!(self.file_type.as_str(), "json" | "csv") {
            return Err(AbsorberError::Config(format!(
                "file_type must be json or csv, got {}",
                self.file_type
            )));
        }
        if self.n_bins == 0 {
            return Err(AbsorberError::Config("n_bins must be >= 1".to_string()));
        }
        if self.e_max.is_nan() || self.e_min.is_nan() || self.e_max <= self.e_min {
            return Err(AbsorberError::Config(format!(
                "e_max must exceed e_min, got [{}, {}]",
                self.e_min, self.e_max
            )));
        }
        Ok(())
    }
}

/// Primary particle selection for the particle gun.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GunParticle {
    Named { name: String },
    Ion { z: u32, a: u32 },
}

/// Particle gun settings, one primary per event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GunConfig {
    pub particle: GunParticle,
    /// Kinetic energy (MeV).
    pub energy: f64,
    /// Start position (mm).
    pub position: DVec3,
    pub direction: DVec3,
}

impl Default for GunConfig {
    fn default() -> Self {
        Self {
            particle: GunParticle::Named {
                name: "e-".to_string(),
            },
            energy: 1.0 * MEV,
            position: DVec3::new(0.0, 0.0, -24.0),
            direction: DVec3::Z,
        }
    }
}

/// Run manager settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunConfig {
    /// Worker threads; 0 runs everything on the calling thread.
    pub n_threads: usize,
    pub max_steps_per_track: usize,
    /// Upper bound on a single step length (mm).
    pub max_step: f64,
    pub gun: GunConfig,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            n_threads: 0,
            max_steps_per_track: 10_000,
            max_step: 1.0e6,
            gun: GunConfig::default(),
        }
    }
}

impl RunConfig {
    pub fn validate(&self) -> AbsorberResult<()> {
        if self.max_steps_per_track == 0 {
            return Err(AbsorberError::Config(
                "max_steps_per_track must be >= 1".to_string(),
            ));
        }
        if self.max_step.is_nan() || self.max_step <= 0.0 {
            return Err(AbsorberError::Config(format!(
                "max_step must be > 0, got {}",
                self.max_step
            )));
        }
        if self.gun.energy.is_nan() || self.gun.energy < 0.0 {
            return Err(AbsorberError::Config(format!(
                "gun energy must be >= 0, got {}",
                self.gun.energy
            )));
        }
        if self.gun.direction.length_squared() == 0.0 {
            return Err(AbsorberError::Config(
                "gun direction must be non-zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// Top-level application configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub detector: AbsorberConfig,
    pub analysis: AnalysisConfig,
    pub run: RunConfig,
}

impl AppConfig {
    pub fn validate(&self) -> AbsorberResult<()> {
        self.detector.validate()?;
        self.analysis.validate()?;
        self.run.validate()
    }

    /// Load from JSON string.
    pub fn from_json(json: &str) -> AbsorberResult<Self> {
        serde_json::from_str(json)
            .map_err(|e| AbsorberError::Config(format!("JSON parse error: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_validates() {
        assert!(AppConfig::default().validate().is_ok());
    }

    #[test]
    fn test_default_analysis_shape() {
        let a = AnalysisConfig::default();
        assert_eq!(a.file_name, "A1");
        assert_eq!(a.n_bins, 100);
        assert_eq!(a.e_max, 100.0);
    }

    #[test]
    fn test_stack_requested_needs_enable() {
        let cfg = AbsorberConfig {
            enabled: false,
            declared_count: Some(1),
            slots: vec![AbsorberSlot::new(10.0, "G4_Pb")],
        };
        assert!(!cfg.stack_requested());
    }

    #[test]
    fn test_stack_requested_length_mismatch() {
        let cfg = AbsorberConfig {
            enabled: true,
            declared_count: Some(2),
            slots: vec![
                AbsorberSlot::new(10.0, "G4_Pb"),
                AbsorberSlot {
                    thickness: Some(1.0),
                    material: None,
                },
            ],
        };
        assert_eq!(cfg.thickness_len(), 2);
        assert_eq!(cfg.material_len(), 1);
        assert!(!cfg.stack_requested());
    }

    #[test]
    fn test_stack_requested_ok() {
        let cfg = AbsorberConfig {
            enabled: true,
            declared_count: Some(1),
            slots: vec![AbsorberSlot::new(10.0, "G4_Pb")],
        };
        assert!(cfg.stack_requested());
    }

    #[test]
    fn test_validate_declared_count_range() {
        let cfg = AbsorberConfig {
            declared_count: Some(5),
            ..Default::default()
        };
        assert!(matches!(cfg.validate(), Err(AbsorberError::Config(_))));
    }

    #[test]
    fn test_validate_gap_in_slots() {
        let cfg = AbsorberConfig {
            enabled: true,
            declared_count: Some(2),
            slots: vec![
                AbsorberSlot {
                    thickness: None,
                    material: Some("G4_Al".into()),
                },
                AbsorberSlot::new(1.0, "G4_Cu"),
            ],
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_from_json_partial() {
        let json = r#"{
            "detector": {
                "enabled": true,
                "declared_count": 1,
                "slots": [{"thickness": 10.0, "material": "G4_Pb"}]
            }
        }"#;
        let cfg = AppConfig::from_json(json).unwrap();
        assert!(cfg.detector.stack_requested());
        assert_eq!(cfg.analysis, AnalysisConfig::default());
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_from_json_gun_ion() {
        let json = r#"{
            "run": {
                "n_threads": 2,
                "max_steps_per_track": 100,
                "max_step": 1.0,
                "gun": {
                    "particle": {"kind": "ion", "z": 6, "a": 12},
                    "energy": 200.0,
                    "position": [0.0, 0.0, -24.0],
                    "direction": [0.0, 0.0, 1.0]
                }
            }
        }"#;
        let cfg = AppConfig::from_json(json).unwrap();
        assert_eq!(cfg.run.gun.particle, GunParticle::Ion { z: 6, a: 12 });
        assert_eq!(cfg.run.n_threads, 2);
    }

    #[test]
    fn test_from_json_invalid() {
        assert!(matches!(
            AppConfig::from_json("{not json"),
            Err(AbsorberError::Config(_))
        ));
    }

    #[test]
    fn test_analysis_rejects_unknown_type() {
        let a = AnalysisConfig {
            file_type: "root".into(),
            ..Default::default()
        };
        assert!(a.validate().is_err());
    }
}
