// ─────────────────────────────────────────────────────────────────────
// Absorber — Geometry Builder
// ─────────────────────────────────────────────────────────────────────
//! Builds the world, the absorber stack and the detector cylinder.
//!
//! Layout along +z:
//!
//! ```text
//!  z = -24        -20                                      +24
//!  |  world air  | Abs1 | Abs2 | ... | Detector (20 mm) |   |
//!                ^ stack start       ^ end of last valid absorber
//! ```
//!
//! Absorbers are stacked contiguously from z = -20 mm. The first slot
//! with an unknown material or a non-positive thickness ends the stack;
//! the detector always follows the last absorber that was placed.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use glam::DVec3;

use absorber_types::units::MILLIMETER;
use absorber_types::{AbsorberConfig, AbsorberError, AbsorberResult};

use crate::geometry::{GeometryTree, LogicalVolume, Solid, VolumeId};
use crate::material::MaterialCatalogue;
use crate::registry::ConfigRegistry;

pub const WORLD_NAME: &str = "World";
pub const DETECTOR_NAME: &str = "Detector";
pub const WORLD_MATERIAL: &str = "G4_AIR";
pub const DETECTOR_MATERIAL: &str = "G4_AIR";

/// Side of the cubic world.
pub const WORLD_SIZE: f64 = 48.0 * MILLIMETER;
/// Radius shared by the absorbers and the detector.
pub const DETECTOR_RADIUS: f64 = 20.0 * MILLIMETER;
pub const DETECTOR_LENGTH: f64 = 20.0 * MILLIMETER;
/// Upstream face of the first absorber.
pub const STACK_START_Z: f64 = -20.0 * MILLIMETER;

/// One absorber that made it into the geometry.
#[derive(Debug, Clone, PartialEq)]
pub struct PlacedAbsorber {
    /// 1-based slot index.
    pub index: usize,
    pub material: String,
    pub z_start: f64,
    pub z_end: f64,
    pub volume: VolumeId,
}

/// Axial layout produced by a build.
#[derive(Debug, Clone, PartialEq)]
pub struct StackLayout {
    pub absorbers: Vec<PlacedAbsorber>,
    pub detector: VolumeId,
    pub detector_center: DVec3,
    pub detector_z: (f64, f64),
}

impl StackLayout {
    /// Downstream end of the stack (or the stack start when empty).
    pub fn stack_end(&self) -> f64 {
        self.absorbers
            .last()
            .map_or(STACK_START_Z, |a| a.z_end)
    }
}

/// Result of a successful build.
#[derive(Debug, Clone)]
pub struct DetectorGeometry {
    pub tree: GeometryTree,
    pub layout: StackLayout,
}

/// Geometry builder bound to a configuration registry.
pub struct DetectorConstruction {
    registry: Arc<ConfigRegistry>,
    catalogue: Arc<dyn MaterialCatalogue>,
    check_overlaps: bool,
    built: AtomicBool,
}

impl DetectorConstruction {
    pub fn new(registry: Arc<ConfigRegistry>, catalogue: Arc<dyn MaterialCatalogue>) -> Self {
        Self {
            registry,
            catalogue,
            check_overlaps: true,
            built: AtomicBool::new(false),
        }
    }

    pub fn registry(&self) -> &Arc<ConfigRegistry> {
        &self.registry
    }

    pub fn is_built(&self) -> bool {
        self.built.load(Ordering::SeqCst)
    }

    /// Freeze the registry and build the geometry. Succeeds at most once.
    pub fn construct(&self) -> AbsorberResult<DetectorGeometry> {
        if self.built.swap(true, Ordering::SeqCst) {
            return Err(AbsorberError::AlreadyBuilt);
        }
        let config = self.registry.freeze();
        build_geometry(&config, self.catalogue.as_ref(), self.check_overlaps)
    }
}

/// Lay out the world, absorber stack and detector for `config`.
pub fn build_geometry(
    config: &AbsorberConfig,
    catalogue: &dyn MaterialCatalogue,
    check_overlaps: bool,
) -> AbsorberResult<DetectorGeometry> {
    let air = catalogue.find_or_build(WORLD_MATERIAL).ok_or_else(|| {
        AbsorberError::Config(format!("world material {WORLD_MATERIAL} not in catalogue"))
    })?;

    let mut tree = GeometryTree::with_world(LogicalVolume::new(
        WORLD_NAME,
        Solid::cube(WORLD_SIZE),
        air,
    ));
    let world = tree.world();

    let mut position = STACK_START_Z;
    let mut absorbers = Vec::new();

    if config.stack_requested() {
        let count = config.declared_count.unwrap_or(0) as usize;
        log::info!("Preparing to define {count} absorber(s).");

        for (i, slot) in config.slots.iter().take(count).enumerate() {
            let index = i + 1;
            let material = slot
                .material
                .as_deref()
                .and_then(|name| catalogue.find_or_build(name));
            let thickness = slot.thickness.unwrap_or(0.0);

            let Some(material) = material.filter(|_| thickness > 0.0) else {
                log::warn!(
                    "Warning: Absorber {index} is not defined for wrong Material or Thickness!"
                );
                break;
            };

            let name = format!("Absorber{index}");
            let center = DVec3::new(0.0, 0.0, position + thickness / 2.0);
            let material_name = material.name.clone();
            let solid = Solid::Tubs {
                radius: DETECTOR_RADIUS,
                half_z: thickness / 2.0,
            };
            let volume = tree.place(
                LogicalVolume::new(&name, solid, material),
                center,
                world,
                0,
                check_overlaps,
            );
            absorbers.push(PlacedAbsorber {
                index,
                material: material_name,
                z_start: position,
                z_end: position + thickness,
                volume,
            });
            position += thickness;
        }
    } else {
        log::info!("Absorber(s) not defined.");
    }

    let detector_air = catalogue.find_or_build(DETECTOR_MATERIAL).ok_or_else(|| {
        AbsorberError::Config(format!("detector material {DETECTOR_MATERIAL} not in catalogue"))
    })?;
    let detector_center = DVec3::new(0.0, 0.0, position + DETECTOR_LENGTH / 2.0);
    let detector = tree.place(
        LogicalVolume::new(
            DETECTOR_NAME,
            Solid::Tubs {
                radius: DETECTOR_RADIUS,
                half_z: DETECTOR_LENGTH / 2.0,
            },
            detector_air,
        ),
        detector_center,
        world,
        0,
        check_overlaps,
    );

    Ok(DetectorGeometry {
        tree,
        layout: StackLayout {
            absorbers,
            detector,
            detector_center,
            detector_z: (position, position + DETECTOR_LENGTH),
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::material::NistCatalogue;
    use crate::registry::SlotField;
    use absorber_types::AbsorberSlot;

    fn build(config: AbsorberConfig) -> DetectorGeometry {
        build_geometry(&config, &NistCatalogue::new(), true).unwrap()
    }

    fn stack(slots: Vec<AbsorberSlot>) -> AbsorberConfig {
        AbsorberConfig {
            enabled: true,
            declared_count: Some(slots.len() as i32),
            slots,
        }
    }

    #[test]
    fn test_disabled_stack() {
        let geo = build(AbsorberConfig {
            enabled: false,
            declared_count: Some(1),
            slots: vec![AbsorberSlot::new(10.0, "G4_Pb")],
        });
        assert!(geo.layout.absorbers.is_empty());
        assert_eq!(geo.layout.detector_center, DVec3::new(0.0, 0.0, -10.0));
        assert_eq!(geo.tree.len(), 2);
        assert!(geo.tree.find("Absorber1").is_none());
    }

    #[test]
    fn test_single_absorber() {
        let geo = build(stack(vec![AbsorberSlot::new(10.0, "G4_Pb")]));
        assert_eq!(geo.layout.absorbers.len(), 1);
        let abs = &geo.layout.absorbers[0];
        assert_eq!((abs.z_start, abs.z_end), (-20.0, -10.0));
        let pv = geo.tree.volume(abs.volume);
        assert_eq!(pv.name, "Absorber1");
        assert_eq!(pv.logical.material.name, "G4_Pb");
        assert_eq!(pv.translation, DVec3::new(0.0, 0.0, -15.0));
        assert_eq!(geo.layout.detector_center, DVec3::new(0.0, 0.0, 0.0));
        assert!(geo.tree.overlaps().is_empty());
    }

    #[test]
    fn test_contiguous_stack() {
        let geo = build(stack(vec![
            AbsorberSlot::new(2.0, "G4_Al"),
            AbsorberSlot::new(3.0, "G4_Cu"),
            AbsorberSlot::new(1.0, "G4_Pb"),
        ]));
        let abs = &geo.layout.absorbers;
        assert_eq!(abs.len(), 3);
        for pair in abs.windows(2) {
            assert_eq!(pair[0].z_end, pair[1].z_start);
        }
        assert_eq!(abs[2].z_end, geo.layout.detector_z.0);
        assert_eq!(geo.layout.stack_end(), -14.0);
    }

    #[test]
    fn test_zero_thickness_truncates_stack() {
        let geo = build(stack(vec![
            AbsorberSlot::new(1.0, "G4_Al"),
            AbsorberSlot::new(1.0, "G4_Al"),
            AbsorberSlot::new(0.0, "G4_Al"),
            AbsorberSlot::new(1.0, "G4_Al"),
        ]));
        assert_eq!(geo.layout.absorbers.len(), 2);
        assert!(geo.tree.find("Absorber3").is_none());
        assert!(geo.tree.find("Absorber4").is_none());
        assert_eq!(geo.layout.detector_z.0, -18.0);
    }

    #[test]
    fn test_unknown_material_truncates_stack() {
        let geo = build(stack(vec![
            AbsorberSlot::new(5.0, "G4_Al"),
            AbsorberSlot::new(5.0, "UNKNOWN"),
            AbsorberSlot::new(5.0, "G4_Cu"),
        ]));
        assert_eq!(geo.layout.absorbers.len(), 1);
        assert_eq!(geo.layout.detector_z, (-15.0, 5.0));
    }

    #[test]
    fn test_first_slot_invalid_places_detector_at_entry() {
        let geo = build(stack(vec![AbsorberSlot::new(-1.0, "G4_Pb")]));
        assert!(geo.layout.absorbers.is_empty());
        assert_eq!(geo.layout.detector_center.z, -10.0);
    }

    #[test]
    fn test_count_mismatch_skips_stack() {
        let mut cfg = stack(vec![AbsorberSlot::new(5.0, "G4_Al")]);
        cfg.declared_count = Some(2);
        let geo = build(cfg);
        assert!(geo.layout.absorbers.is_empty());
    }

    #[test]
    fn test_thick_stack_reports_overlap_with_world() {
        let geo = build(stack(vec![AbsorberSlot::new(30.0, "G4_Pb")]));
        assert_eq!(geo.layout.absorbers.len(), 1);
        assert!(geo
            .tree
            .overlaps()
            .iter()
            .any(|o| o.volume == DETECTOR_NAME && o.other == WORLD_NAME));
    }

    #[test]
    fn test_missing_world_material() {
        let empty = NistCatalogue::with_materials(Vec::new());
        let err = build_geometry(&AbsorberConfig::default(), &empty, true).unwrap_err();
        assert!(matches!(err, AbsorberError::Config(_)));
    }

    #[test]
    fn test_construct_freezes_and_builds_once() {
        let registry = Arc::new(ConfigRegistry::new());
        registry.set_enabled(true);
        registry.set_declared_count(1);
        registry.set_slot(1, SlotField::Thickness(10.0));
        registry.set_slot(1, SlotField::Material("G4_Pb".into()));
        let construction =
            DetectorConstruction::new(registry.clone(), Arc::new(NistCatalogue::new()));

        let geo = construction.construct().unwrap();
        assert_eq!(geo.layout.absorbers.len(), 1);
        assert!(registry.is_frozen());
        assert!(construction.is_built());
        assert!(matches!(
            construction.construct(),
            Err(AbsorberError::AlreadyBuilt)
        ));
    }
}
