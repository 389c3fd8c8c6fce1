// ─────────────────────────────────────────────────────────────────────
// Absorber — Particle Definitions
// ─────────────────────────────────────────────────────────────────────
//! Static particle properties as seen by the stepping hooks.
//!
//! Identity is the PDG encoding; ions follow the `10LZZZAAAI` scheme
//! with `L = I = 0`.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::{AbsorberError, AbsorberResult};

pub const PDG_ELECTRON: i32 = 11;
pub const PDG_POSITRON: i32 = -11;
pub const PDG_NU_E: i32 = 12;
pub const PDG_ANTI_NU_E: i32 = -12;
pub const PDG_GAMMA: i32 = 22;
pub const PDG_PROTON: i32 = 2212;
pub const PDG_NEUTRON: i32 = 2112;
pub const PDG_MU_MINUS: i32 = 13;
pub const PDG_MU_PLUS: i32 = -13;
pub const PDG_PI_PLUS: i32 = 211;
pub const PDG_PI_MINUS: i32 = -211;
pub const PDG_DEUTERON: i32 = 1_000_010_020;
pub const PDG_TRITON: i32 = 1_000_010_030;
pub const PDG_HE3: i32 = 1_000_020_030;
pub const PDG_ALPHA: i32 = 1_000_020_040;

/// Largest mass number representable in a nuclear PDG code.
pub const MAX_MASS_NUMBER: u32 = 999;

/// Atomic mass unit in MeV.
const AMU_MEV: f64 = 931.494_102_42;

const ELEMENT_SYMBOLS: [&str; 92] = [
    "H", "He", "Li", "Be", "B", "C", "N", "O", "F", "Ne", "Na", "Mg", "Al", "Si", "P", "S", "Cl",
    "Ar", "K", "Ca", "Sc", "Ti", "V", "Cr", "Mn", "Fe", "Co", "Ni", "Cu", "Zn", "Ga", "Ge", "As",
    "Se", "Br", "Kr", "Rb", "Sr", "Y", "Zr", "Nb", "Mo", "Tc", "Ru", "Rh", "Pd", "Ag", "Cd", "In",
    "Sn", "Sb", "Te", "I", "Xe", "Cs", "Ba", "La", "Ce", "Pr", "Nd", "Pm", "Sm", "Eu", "Gd", "Tb",
    "Dy", "Ho", "Er", "Tm", "Yb", "Lu", "Hf", "Ta", "W", "Re", "Os", "Ir", "Pt", "Au", "Hg", "Tl",
    "Pb", "Bi", "Po", "At", "Rn", "Fr", "Ra", "Ac", "Th", "Pa", "U",
];

/// Immutable definition of a particle species.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParticleDefinition {
    pub name: String,
    pub pdg_encoding: i32,
    /// Charge in units of the positron charge.
    pub pdg_charge: f64,
    /// Rest mass (MeV).
    pub pdg_mass: f64,
}

impl ParticleDefinition {
    pub fn new(name: &str, pdg_encoding: i32, pdg_charge: f64, pdg_mass: f64) -> Self {
        Self {
            name: name.to_string(),
            pdg_encoding,
            pdg_charge,
            pdg_mass,
        }
    }

    pub fn electron() -> Self {
        Self::new("e-", PDG_ELECTRON, -1.0, 0.510_998_95)
    }

    pub fn positron() -> Self {
        Self::new("e+", PDG_POSITRON, 1.0, 0.510_998_95)
    }

    pub fn nu_e() -> Self {
        Self::new("nu_e", PDG_NU_E, 0.0, 0.0)
    }

    pub fn anti_nu_e() -> Self {
        Self::new("anti_nu_e", PDG_ANTI_NU_E, 0.0, 0.0)
    }

    pub fn gamma() -> Self {
        Self::new("gamma", PDG_GAMMA, 0.0, 0.0)
    }

    pub fn proton() -> Self {
        Self::new("proton", PDG_PROTON, 1.0, 938.272_088)
    }

    pub fn neutron() -> Self {
        Self::new("neutron", PDG_NEUTRON, 0.0, 939.565_420)
    }

    pub fn deuteron() -> Self {
        Self::new("deuteron", PDG_DEUTERON, 1.0, 1875.612_94)
    }

    pub fn triton() -> Self {
        Self::new("triton", PDG_TRITON, 1.0, 2808.921_13)
    }

    pub fn he3() -> Self {
        Self::new("He3", PDG_HE3, 2.0, 2808.391_61)
    }

    pub fn alpha() -> Self {
        Self::new("alpha", PDG_ALPHA, 2.0, 3727.379_41)
    }

    /// Bare nucleus with charge `z` and mass number `a` (at most 999, the
    /// width of the AAA field in the `10LZZZAAAI` code).
    ///
    /// Light nuclei with dedicated definitions (deuteron, triton, He3,
    /// alpha) are returned as those definitions.
    pub fn ion(z: u32, a: u32) -> AbsorberResult<Self> {
        if z == 0 || a < z || a > MAX_MASS_NUMBER || z as usize > ELEMENT_SYMBOLS.len() {
            return Err(AbsorberError::UnknownParticle(format!(
                "ion Z={z} A={a}"
            )));
        }
        let encoding = 1_000_000_000 + (z as i32) * 10_000 + (a as i32) * 10;
        match encoding {
            PDG_DEUTERON => return Ok(Self::deuteron()),
            PDG_TRITON => return Ok(Self::triton()),
            PDG_HE3 => return Ok(Self::he3()),
            PDG_ALPHA => return Ok(Self::alpha()),
            _ => {}
        }
        let name = format!("{}{}", ELEMENT_SYMBOLS[z as usize - 1], a);
        Ok(Self::new(&name, encoding, z as f64, a as f64 * AMU_MEV))
    }

    pub fn is_ion(&self) -> bool {
        self.pdg_encoding >= 1_000_000_000
    }

    pub fn is_charged(&self) -> bool {
        self.pdg_charge != 0.0
    }
}

/// Look up a particle by its table name.
pub fn find_particle(name: &str) -> AbsorberResult<Arc<ParticleDefinition>> {
    let def = match name {
        "e-" => ParticleDefinition::electron(),
        "e+" => ParticleDefinition::positron(),
        "nu_e" => ParticleDefinition::nu_e(),
        "anti_nu_e" => ParticleDefinition::anti_nu_e(),
        "gamma" => ParticleDefinition::gamma(),
        "proton" => ParticleDefinition::proton(),
        "neutron" => ParticleDefinition::neutron(),
        "deuteron" => ParticleDefinition::deuteron(),
        "triton" => ParticleDefinition::triton(),
        "He3" => ParticleDefinition::he3(),
        "alpha" => ParticleDefinition::alpha(),
        "mu-" => ParticleDefinition::new("mu-", PDG_MU_MINUS, -1.0, 105.658_375),
        "mu+" => ParticleDefinition::new("mu+", PDG_MU_PLUS, 1.0, 105.658_375),
        "pi+" => ParticleDefinition::new("pi+", PDG_PI_PLUS, 1.0, 139.570_39),
        "pi-" => ParticleDefinition::new("pi-", PDG_PI_MINUS, -1.0, 139.570_39),
        other => return Err(AbsorberError::UnknownParticle(other.to_string())),
    };
    Ok(Arc::new(def))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_known() {
        let e = find_particle("e-").unwrap();
        assert_eq!(e.pdg_encoding, PDG_ELECTRON);
        assert_eq!(e.pdg_charge, -1.0);
    }

    #[test]
    fn test_find_unknown() {
        assert!(matches!(
            find_particle("graviton"),
            Err(AbsorberError::UnknownParticle(_))
        ));
    }

    #[test]
    fn test_carbon_ion() {
        let c12 = ParticleDefinition::ion(6, 12).unwrap();
        assert_eq!(c12.name, "C12");
        assert_eq!(c12.pdg_encoding, 1_000_060_120);
        assert_eq!(c12.pdg_charge, 6.0);
        assert!(c12.is_ion());
    }

    #[test]
    fn test_ion_alpha_alias() {
        assert_eq!(ParticleDefinition::ion(2, 4).unwrap(), ParticleDefinition::alpha());
    }

    #[test]
    fn test_ion_invalid() {
        assert!(ParticleDefinition::ion(0, 1).is_err());
        assert!(ParticleDefinition::ion(6, 3).is_err());
        assert!(ParticleDefinition::ion(120, 300).is_err());
    }

    #[test]
    fn test_ion_mass_number_bounds() {
        let heaviest = ParticleDefinition::ion(6, MAX_MASS_NUMBER).unwrap();
        assert_eq!(heaviest.pdg_encoding, 1_000_069_990);
        assert!(matches!(
            ParticleDefinition::ion(6, 1000),
            Err(AbsorberError::UnknownParticle(_))
        ));
        assert!(ParticleDefinition::ion(6, 200_000_000).is_err());
        assert!(ParticleDefinition::ion(6, u32::MAX).is_err());
    }
}
