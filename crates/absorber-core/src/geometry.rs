// ─────────────────────────────────────────────────────────────────────
// Absorber — Geometry Runtime
// ─────────────────────────────────────────────────────────────────────
//! Solids, logical and physical volumes, and the placement tree.
//!
//! Placements are translations only (no rotations). Volumes are stored
//! in an arena and referred to by `VolumeId`; comparing two ids is the
//! identity test used on the stepping hot path.

use std::fmt;
use std::sync::Arc;

use glam::DVec3;
use serde::{Deserialize, Serialize};

use crate::material::Material;

/// Geometric tolerance (mm).
pub const TOLERANCE: f64 = 1.0e-9;

/// Handle to a placed volume inside a `GeometryTree`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct VolumeId(pub usize);

impl fmt::Display for VolumeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Shape of a volume in its local frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Solid {
    /// Axis-aligned box given by its half-lengths.
    Box { half_x: f64, half_y: f64, half_z: f64 },
    /// Solid cylinder along z with full angular sweep.
    Tubs { radius: f64, half_z: f64 },
}

/// Classification of a point against a solid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Inside {
    Inside,
    Surface,
    Outside,
}

impl Solid {
    pub fn cube(side: f64) -> Self {
        Solid::Box {
            half_x: side / 2.0,
            half_y: side / 2.0,
            half_z: side / 2.0,
        }
    }

    pub fn half_z(&self) -> f64 {
        match *self {
            Solid::Box { half_z, .. } | Solid::Tubs { half_z, .. } => half_z,
        }
    }

    /// Local axis-aligned bounding box `(min, max)`.
    pub fn extent(&self) -> (DVec3, DVec3) {
        let half = match *self {
            Solid::Box {
                half_x,
                half_y,
                half_z,
            } => DVec3::new(half_x, half_y, half_z),
            Solid::Tubs { radius, half_z } => DVec3::new(radius, radius, half_z),
        };
        (-half, half)
    }

    pub fn inside(&self, p: DVec3) -> Inside {
        let (dist_axial, dist_lateral) = match *self {
            Solid::Box {
                half_x,
                half_y,
                half_z,
            } => {
                let lateral = (half_x - p.x.abs()).min(half_y - p.y.abs());
                (half_z - p.z.abs(), lateral)
            }
            Solid::Tubs { radius, half_z } => {
                let rho = (p.x * p.x + p.y * p.y).sqrt();
                (half_z - p.z.abs(), radius - rho)
            }
        };
        let margin = dist_axial.min(dist_lateral);
        if margin > TOLERANCE {
            Inside::Inside
        } else if margin >= -TOLERANCE {
            Inside::Surface
        } else {
            Inside::Outside
        }
    }

    /// Parameter interval `[t0, t1]` along `p + t·v` that lies inside the
    /// solid, or `None` if the line misses it.
    pub fn ray_interval(&self, p: DVec3, v: DVec3) -> Option<(f64, f64)> {
        let mut lo = f64::NEG_INFINITY;
        let mut hi = f64::INFINITY;
        let (min, max) = self.extent();

        let slab = |p: f64, v: f64, min: f64, max: f64, lo: &mut f64, hi: &mut f64| -> bool {
            if v.abs() < f64::EPSILON {
                return p >= min - TOLERANCE && p <= max + TOLERANCE;
            }
            let (a, b) = ((min - p) / v, (max - p) / v);
            *lo = lo.max(a.min(b));
            *hi = hi.min(a.max(b));
            true
        };

        if !slab(p.z, v.z, min.z, max.z, &mut lo, &mut hi) {
            return None;
        }
        match *self {
            Solid::Box { .. } => {
                if !slab(p.x, v.x, min.x, max.x, &mut lo, &mut hi)
                    || !slab(p.y, v.y, min.y, max.y, &mut lo, &mut hi)
                {
                    return None;
                }
            }
            Solid::Tubs { radius, .. } => {
                let a = v.x * v.x + v.y * v.y;
                let b = p.x * v.x + p.y * v.y;
                let c = p.x * p.x + p.y * p.y - radius * radius;
                if a < f64::EPSILON {
                    if c > TOLERANCE {
                        return None;
                    }
                } else {
                    let disc = b * b - a * c;
                    if disc < 0.0 {
                        return None;
                    }
                    let root = disc.sqrt();
                    lo = lo.max((-b - root) / a);
                    hi = hi.min((-b + root) / a);
                }
            }
        }

        if lo > hi + TOLERANCE {
            None
        } else {
            Some((lo, hi))
        }
    }

    /// Distance along `v` from an inside point to the surface.
    pub fn distance_to_out(&self, p: DVec3, v: DVec3) -> f64 {
        match self.ray_interval(p, v) {
            Some((_, t1)) => t1.max(0.0),
            None => 0.0,
        }
    }

    /// Distance along `v` from an outside point to the surface, if hit.
    pub fn distance_to_in(&self, p: DVec3, v: DVec3) -> Option<f64> {
        let (t0, t1) = self.ray_interval(p, v)?;
        if t1 <= TOLERANCE {
            return None;
        }
        Some(t0.max(0.0))
    }
}

/// Shape plus filling.
#[derive(Debug, Clone)]
pub struct LogicalVolume {
    pub name: String,
    pub solid: Solid,
    pub material: Arc<Material>,
}

impl LogicalVolume {
    pub fn new(name: &str, solid: Solid, material: Arc<Material>) -> Self {
        Self {
            name: name.to_string(),
            solid,
            material,
        }
    }
}

/// A logical volume placed inside a mother.
#[derive(Debug, Clone)]
pub struct PhysicalVolume {
    pub name: String,
    pub logical: LogicalVolume,
    /// Translation relative to the mother's frame.
    pub translation: DVec3,
    pub mother: Option<VolumeId>,
    pub copy_no: i32,
}

/// A detected placement overlap.
#[derive(Debug, Clone, PartialEq)]
pub struct Overlap {
    pub volume: String,
    /// Sibling name, or the mother's name when protruding.
    pub other: String,
    /// Penetration depth (mm).
    pub depth: f64,
}

/// Arena of placed volumes rooted at the world.
#[derive(Debug, Clone)]
pub struct GeometryTree {
    volumes: Vec<PhysicalVolume>,
    overlaps: Vec<Overlap>,
}

impl GeometryTree {
    /// Create a tree holding only the world, placed unrotated at the origin.
    pub fn with_world(logical: LogicalVolume) -> Self {
        let world = PhysicalVolume {
            name: logical.name.clone(),
            logical,
            translation: DVec3::ZERO,
            mother: None,
            copy_no: 0,
        };
        Self {
            volumes: vec![world],
            overlaps: Vec::new(),
        }
    }

    pub fn world(&self) -> VolumeId {
        VolumeId(0)
    }

    /// Place `logical` inside `mother` at `translation`.
    ///
    /// With `check_overlaps`, the placement is tested against the mother
    /// boundary and every already-placed sibling. Overlaps are reported
    /// as warnings and recorded; the placement is kept either way.
    pub fn place(
        &mut self,
        logical: LogicalVolume,
        translation: DVec3,
        mother: VolumeId,
        copy_no: i32,
        check_overlaps: bool,
    ) -> VolumeId {
        let pv = PhysicalVolume {
            name: logical.name.clone(),
            logical,
            translation,
            mother: Some(mother),
            copy_no,
        };
        if check_overlaps {
            self.check_overlaps(&pv);
        }
        let id = VolumeId(self.volumes.len());
        log::debug!(
            "placed {} {id} at ({:.3}, {:.3}, {:.3}) mm in {}",
            pv.name,
            translation.x,
            translation.y,
            translation.z,
            self.volumes[mother.0].name
        );
        self.volumes.push(pv);
        id
    }

    fn check_overlaps(&mut self, pv: &PhysicalVolume) {
        let Some(mother) = pv.mother else { return };
        let (dmin, dmax) = pv.logical.solid.extent();
        let (dmin, dmax) = (dmin + pv.translation, dmax + pv.translation);

        let mother_pv = &self.volumes[mother.0];
        let (mmin, mmax) = mother_pv.logical.solid.extent();
        let protrusion = (mmin - dmin).max(dmax - mmax).max_element();
        if protrusion > TOLERANCE {
            log::warn!(
                "Overlap detected: volume {} protrudes from mother {} by {:.4} mm",
                pv.name,
                mother_pv.name,
                protrusion
            );
            self.overlaps.push(Overlap {
                volume: pv.name.clone(),
                other: mother_pv.name.clone(),
                depth: protrusion,
            });
        }

        let mut found = Vec::new();
        for sibling in self.volumes.iter().filter(|v| v.mother == Some(mother)) {
            if let Some(depth) = solids_overlap(pv, sibling) {
                log::warn!(
                    "Overlap detected: volume {} overlaps with {} by {:.4} mm",
                    pv.name,
                    sibling.name,
                    depth
                );
                found.push(Overlap {
                    volume: pv.name.clone(),
                    other: sibling.name.clone(),
                    depth,
                });
            }
        }
        self.overlaps.extend(found);
    }

    pub fn volume(&self, id: VolumeId) -> &PhysicalVolume {
        &self.volumes[id.0]
    }

    pub fn get(&self, id: VolumeId) -> Option<&PhysicalVolume> {
        self.volumes.get(id.0)
    }

    /// First volume with the given name.
    pub fn find(&self, name: &str) -> Option<VolumeId> {
        self.volumes
            .iter()
            .position(|v| v.name == name)
            .map(VolumeId)
    }

    pub fn daughters(&self, mother: VolumeId) -> impl Iterator<Item = VolumeId> + '_ {
        self.volumes
            .iter()
            .enumerate()
            .filter(move |(_, v)| v.mother == Some(mother))
            .map(|(i, _)| VolumeId(i))
    }

    /// Translation of `id` relative to the world frame.
    pub fn global_translation(&self, id: VolumeId) -> DVec3 {
        let mut offset = DVec3::ZERO;
        let mut cursor = Some(id);
        while let Some(current) = cursor {
            let pv = &self.volumes[current.0];
            offset += pv.translation;
            cursor = pv.mother;
        }
        offset
    }

    pub fn overlaps(&self) -> &[Overlap] {
        &self.overlaps
    }

    pub fn len(&self) -> usize {
        self.volumes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.volumes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (VolumeId, &PhysicalVolume)> {
        self.volumes.iter().enumerate().map(|(i, v)| (VolumeId(i), v))
    }
}

/// Penetration depth between two sibling placements, if they overlap.
fn solids_overlap(a: &PhysicalVolume, b: &PhysicalVolume) -> Option<f64> {
    let (amin, amax) = a.logical.solid.extent();
    let (bmin, bmax) = b.logical.solid.extent();
    let (amin, amax) = (amin + a.translation, amax + a.translation);
    let (bmin, bmax) = (bmin + b.translation, bmax + b.translation);

    let depth = (amax.min(bmax) - amin.max(bmin)).min_element();
    if depth <= TOLERANCE {
        return None;
    }
    if let (Solid::Tubs { radius: ra, .. }, Solid::Tubs { radius: rb, .. }) =
        (a.logical.solid, b.logical.solid)
    {
        let axis_gap = (a.translation - b.translation).truncate().length();
        if axis_gap >= ra + rb - TOLERANCE {
            return None;
        }
    }
    Some(depth)
}
