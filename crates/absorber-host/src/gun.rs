// ─────────────────────────────────────────────────────────────────────
// Absorber — Particle Gun
// ─────────────────────────────────────────────────────────────────────
//! Fires one primary per event with fixed species, energy, position and
//! direction.

use std::sync::Arc;

use glam::DVec3;

use absorber_core::Track;
use absorber_types::{
    find_particle, AbsorberError, AbsorberResult, GunConfig, GunParticle, ParticleDefinition,
};

#[derive(Debug, Clone)]
pub struct ParticleGun {
    definition: Arc<ParticleDefinition>,
    /// Kinetic energy (MeV).
    energy: f64,
    position: DVec3,
    direction: DVec3,
}

impl ParticleGun {
    pub fn from_config(config: &GunConfig) -> AbsorberResult<Self> {
        let definition = match &config.particle {
            GunParticle::Named { name } => find_particle(name)?,
            GunParticle::Ion { z, a } => Arc::new(ParticleDefinition::ion(*z, *a)?),
        };
        let mut gun = Self {
            definition,
            energy: 0.0,
            position: config.position,
            direction: DVec3::Z,
        };
        gun.set_energy(config.energy)?;
        gun.set_direction(config.direction)?;
        Ok(gun)
    }

    pub fn definition(&self) -> &Arc<ParticleDefinition> {
        &self.definition
    }

    pub fn energy(&self) -> f64 {
        self.energy
    }

    pub fn position(&self) -> DVec3 {
        self.position
    }

    pub fn direction(&self) -> DVec3 {
        self.direction
    }

    pub fn set_particle(&mut self, name: &str) -> AbsorberResult<()> {
        self.definition = find_particle(name)?;
        Ok(())
    }

    pub fn set_ion(&mut self, z: u32, a: u32) -> AbsorberResult<()> {
        self.definition = Arc::new(ParticleDefinition::ion(z, a)?);
        Ok(())
    }

    pub fn set_energy(&mut self, energy: f64) -> AbsorberResult<()> {
        if energy.is_nan() || energy < 0.0 {
            return Err(AbsorberError::Validation(format!(
                "gun energy must be >= 0, got {energy}"
            )));
        }
        self.energy = energy;
        Ok(())
    }

    pub fn set_position(&mut self, position: DVec3) {
        self.position = position;
    }

    pub fn set_direction(&mut self, direction: DVec3) -> AbsorberResult<()> {
        let unit = direction.try_normalize().ok_or_else(|| {
            AbsorberError::Validation(format!("gun direction {direction} cannot be normalised"))
        })?;
        self.direction = unit;
        Ok(())
    }

    /// Primary track for one event.
    pub fn generate(&self, track_id: u64) -> Track {
        Track::new(
            track_id,
            Arc::clone(&self.definition),
            self.position,
            self.direction,
            self.energy,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_gun() {
        let gun = ParticleGun::from_config(&GunConfig::default()).unwrap();
        assert_eq!(gun.definition().name, "e-");
        assert_eq!(gun.energy(), 1.0);
        let t = gun.generate(7);
        assert_eq!(t.track_id, 7);
        assert_eq!(t.position, DVec3::new(0.0, 0.0, -24.0));
        assert!(t.is_alive());
    }

    #[test]
    fn test_ion_gun() {
        let config = GunConfig {
            particle: GunParticle::Ion { z: 6, a: 12 },
            energy: 200.0,
            ..Default::default()
        };
        let gun = ParticleGun::from_config(&config).unwrap();
        assert_eq!(gun.definition().name, "C12");
        assert_eq!(gun.definition().pdg_charge, 6.0);
    }

    #[test]
    fn test_setters_validate() {
        let mut gun = ParticleGun::from_config(&GunConfig::default()).unwrap();
        assert!(gun.set_particle("graviton").is_err());
        assert!(gun.set_energy(-1.0).is_err());
        assert!(gun.set_direction(DVec3::ZERO).is_err());
        gun.set_direction(DVec3::new(0.0, 0.0, 3.0)).unwrap();
        assert_eq!(gun.direction(), DVec3::Z);
        gun.set_particle("gamma").unwrap();
        assert_eq!(gun.definition().pdg_encoding, 22);
    }
}
