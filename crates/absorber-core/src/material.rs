// ─────────────────────────────────────────────────────────────────────
// Absorber — Material Catalogue
// ─────────────────────────────────────────────────────────────────────
//! Material resolution by name.
//!
//! The built-in catalogue carries a subset of the NIST material names
//! with their nominal densities. Applications with their own material
//! database plug it in through the `MaterialCatalogue` trait.

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// Bulk material filling a logical volume.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Material {
    pub name: String,
    /// Density in g/cm³.
    pub density: f64,
}

impl Material {
    pub fn new(name: &str, density: f64) -> Self {
        Self {
            name: name.to_string(),
            density,
        }
    }
}

/// Trait for material lookup backends.
pub trait MaterialCatalogue: Send + Sync {
    /// Resolve a material by name, `None` if it is unknown.
    fn find_or_build(&self, name: &str) -> Option<Arc<Material>>;
}

const NIST_DENSITIES: [(&str, f64); 19] = [
    ("G4_AIR", 1.204_79e-3),
    ("G4_Galactic", 1.0e-25),
    ("G4_H", 8.374_8e-5),
    ("G4_He", 1.663_22e-4),
    ("G4_Be", 1.848),
    ("G4_C", 2.0),
    ("G4_Al", 2.699),
    ("G4_Si", 2.33),
    ("G4_Fe", 7.874),
    ("G4_Cu", 8.96),
    ("G4_W", 19.3),
    ("G4_Pb", 11.35),
    ("G4_U", 18.95),
    ("G4_WATER", 1.0),
    ("G4_PLASTIC_SC_VINYLTOLUENE", 1.032),
    ("G4_CONCRETE", 2.3),
    ("G4_BGO", 7.13),
    ("G4_SODIUM_IODIDE", 3.667),
    ("G4_lAr", 1.396),
];

/// In-memory catalogue keyed by material name.
pub struct NistCatalogue {
    materials: HashMap<String, Arc<Material>>,
}

impl Default for NistCatalogue {
    fn default() -> Self {
        let materials = NIST_DENSITIES
            .iter()
            .map(|&(name, density)| (name.to_string(), Arc::new(Material::new(name, density))))
            .collect();
        Self { materials }
    }
}

impl NistCatalogue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_materials(materials: Vec<Material>) -> Self {
        Self {
            materials: materials
                .into_iter()
                .map(|m| (m.name.clone(), Arc::new(m)))
                .collect(),
        }
    }

    pub fn add_material(&mut self, material: Material) {
        self.materials
            .insert(material.name.clone(), Arc::new(material));
    }

    pub fn len(&self) -> usize {
        self.materials.len()
    }

    pub fn is_empty(&self) -> bool {
        self.materials.is_empty()
    }
}

impl MaterialCatalogue for NistCatalogue {
    fn find_or_build(&self, name: &str) -> Option<Arc<Material>> {
        self.materials.get(name).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_has_air_and_lead() {
        let nist = NistCatalogue::new();
        assert!(nist.find_or_build("G4_AIR").is_some());
        let pb = nist.find_or_build("G4_Pb").unwrap();
        assert!((pb.density - 11.35).abs() < 1e-9);
    }

    #[test]
    fn test_unknown_material() {
        let nist = NistCatalogue::new();
        assert!(nist.find_or_build("UNKNOWN").is_none());
        assert!(nist.find_or_build("g4_pb").is_none());
    }

    #[test]
    fn test_add_material() {
        let mut cat = NistCatalogue::with_materials(Vec::new());
        assert!(cat.is_empty());
        cat.add_material(Material::new("Kapton", 1.42));
        assert_eq!(cat.len(), 1);
        assert!(cat.find_or_build("Kapton").is_some());
    }
}
