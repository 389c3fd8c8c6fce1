// ─────────────────────────────────────────────────────────────────────
// Absorber — Geometry Navigator
// ─────────────────────────────────────────────────────────────────────
//! Point location and distance-to-boundary queries on a built
//! [`GeometryTree`].
//!
//! A point on a shared surface belongs to the volume the track is moving
//! into, so a particle sitting on the detector's upstream face while
//! heading downstream is located in the detector.

use glam::DVec3;

use absorber_core::{GeometryTree, Inside, VolumeId};

/// Nudge distance (mm) used to resolve surface points by direction.
const PUSH: f64 = 1.0e-6;

pub struct Navigator<'g> {
    tree: &'g GeometryTree,
}

impl<'g> Navigator<'g> {
    pub fn new(tree: &'g GeometryTree) -> Self {
        Self { tree }
    }

    pub fn tree(&self) -> &'g GeometryTree {
        self.tree
    }

    fn classify(&self, id: VolumeId, p: DVec3, dir: DVec3) -> bool {
        let solid = &self.tree.volume(id).logical.solid;
        let local = p - self.tree.global_translation(id);
        match solid.inside(local) {
            Inside::Inside => true,
            Inside::Surface => solid.inside(local + dir * PUSH) == Inside::Inside,
            Inside::Outside => false,
        }
    }

    /// Deepest volume containing `p` for a track heading along `dir`;
    /// `None` once the track has left the world.
    pub fn locate(&self, p: DVec3, dir: DVec3) -> Option<VolumeId> {
        let mut current = self.tree.world();
        if !self.classify(current, p, dir) {
            return None;
        }
        while let Some(daughter) = self
            .tree
            .daughters(current)
            .find(|&d| self.classify(d, p, dir))
        {
            current = daughter;
        }
        Some(current)
    }

    /// Distance along `dir` to the next boundary of `volume`: its own
    /// surface or the nearest daughter surface.
    pub fn distance_to_boundary(&self, volume: VolumeId, p: DVec3, dir: DVec3) -> f64 {
        let local = p - self.tree.global_translation(volume);
        let to_out = self
            .tree
            .volume(volume)
            .logical
            .solid
            .distance_to_out(local, dir);
        self.tree
            .daughters(volume)
            .filter_map(|d| {
                let local = p - self.tree.global_translation(d);
                self.tree.volume(d).logical.solid.distance_to_in(local, dir)
            })
            .fold(to_out, f64::min)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use absorber_core::{build_geometry, NistCatalogue};
    use absorber_types::{AbsorberConfig, AbsorberSlot};

    fn stacked() -> absorber_core::DetectorGeometry {
        let config = AbsorberConfig {
            enabled: true,
            declared_count: Some(2),
            slots: vec![AbsorberSlot::new(5.0, "G4_Al"), AbsorberSlot::new(5.0, "G4_Cu")],
        };
        build_geometry(&config, &NistCatalogue::new(), true).unwrap()
    }

    #[test]
    fn test_locate_world_entry() {
        let g = build_geometry(&AbsorberConfig::default(), &NistCatalogue::new(), true).unwrap();
        let nav = Navigator::new(&g.tree);
        let entry = DVec3::new(0.0, 0.0, -24.0);
        assert_eq!(nav.locate(entry, DVec3::Z), Some(g.tree.world()));
        assert_eq!(nav.locate(entry, -DVec3::Z), None);
        assert_eq!(nav.locate(DVec3::new(0.0, 0.0, 30.0), DVec3::Z), None);
    }

    #[test]
    fn test_locate_shared_surface_by_direction() {
        let g = stacked();
        let nav = Navigator::new(&g.tree);
        let a1 = g.layout.absorbers[0].volume;
        let a2 = g.layout.absorbers[1].volume;
        let face = DVec3::new(0.0, 0.0, -15.0);
        assert_eq!(nav.locate(face, DVec3::Z), Some(a2));
        assert_eq!(nav.locate(face, -DVec3::Z), Some(a1));
        let det_face = DVec3::new(0.0, 0.0, -10.0);
        assert_eq!(nav.locate(det_face, DVec3::Z), Some(g.layout.detector));
    }

    #[test]
    fn test_distance_to_boundary() {
        let g = stacked();
        let nav = Navigator::new(&g.tree);
        let world = g.tree.world();
        let d = nav.distance_to_boundary(world, DVec3::new(0.0, 0.0, -24.0), DVec3::Z);
        assert!((d - 4.0).abs() < 1e-9);
        let a1 = g.layout.absorbers[0].volume;
        let d = nav.distance_to_boundary(a1, DVec3::new(0.0, 0.0, -20.0), DVec3::Z);
        assert!((d - 5.0).abs() < 1e-9);
        let d = nav.distance_to_boundary(g.layout.detector, DVec3::new(0.0, 0.0, -10.0), DVec3::Z);
        assert!((d - 20.0).abs() < 1e-9);
    }

    #[test]
    fn test_locate_outside_detector_radius() {
        let g = stacked();
        let nav = Navigator::new(&g.tree);
        let p = DVec3::new(22.0, 0.0, 0.0);
        assert_eq!(nav.locate(p, DVec3::Z), Some(g.tree.world()));
    }
}
