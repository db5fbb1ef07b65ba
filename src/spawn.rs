//! Randomized agent placement at setup.

use glam::Vec3;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use std::f32::consts::{PI, TAU};

use crate::agent::{Agent, Species};
use crate::config::{SimulationVolume, SpeciesConfig};

/// Random placement helpers for spawning one species' population.
///
/// Each context is seeded independently so populations are reproducible
/// for a fixed seed.
pub struct SpawnContext {
    rng: SmallRng,
}

impl SpawnContext {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: SmallRng::seed_from_u64(seed),
        }
    }

    /// Random point inside a sphere of given radius, uniform in volume.
    pub fn random_in_sphere(&mut self, radius: f32) -> Vec3 {
        let theta = self.rng.gen_range(0.0..TAU);
        let phi = self.rng.gen_range(0.0..PI);
        // Cube root for uniform volume distribution
        let r = radius * self.rng.gen::<f32>().cbrt();

        Vec3::new(
            r * phi.sin() * theta.cos(),
            r * phi.sin() * theta.sin(),
            r * phi.cos(),
        )
    }

    /// Random unit vector, uniform on the sphere.
    pub fn random_direction(&mut self) -> Vec3 {
        let theta = self.rng.gen_range(0.0..TAU);
        // Uniform z keeps the distribution unbiased toward the poles
        let z: f32 = self.rng.gen_range(-1.0..1.0);
        let r = (1.0 - z * z).sqrt();
        Vec3::new(r * theta.cos(), r * theta.sin(), z)
    }

    /// Spawn a full species population inside the volume: random position
    /// within `spawn_radius` (capped by the volume's largest extent) around
    /// the volume center, random velocity of `spawn_speed` magnitude, zero
    /// acceleration.
    pub fn spawn_population(
        &mut self,
        config: &SpeciesConfig,
        volume: &SimulationVolume,
    ) -> Vec<Agent> {
        let radius = config.spawn_radius.clamp(0.0, volume.max_extent());
        let center = volume.center();
        (0..config.population)
            .map(|_| Agent {
                position: center + self.random_in_sphere(radius),
                velocity: self.random_direction() * config.spawn_speed,
                acceleration: Vec3::ZERO,
                mass: 1.0,
                species: config.species,
            })
            .collect()
    }
}

/// Spawn every configured species into one contiguous agent array, in
/// configuration order. Returns the agents plus each species' segment
/// offset.
pub fn spawn_all(
    configs: &[SpeciesConfig],
    volume: &SimulationVolume,
    seed: u64,
) -> (Vec<Agent>, Vec<u32>) {
    let mut agents = Vec::new();
    let mut offsets = Vec::with_capacity(configs.len());
    for (i, config) in configs.iter().enumerate() {
        offsets.push(agents.len() as u32);
        let mut ctx = SpawnContext::new(seed.wrapping_add(i as u64));
        agents.extend(ctx.spawn_population(config, volume));
    }
    (agents, offsets)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sphere_volume(radius: f32) -> SimulationVolume {
        SimulationVolume::Sphere {
            center: Vec3::ZERO,
            radius,
        }
    }

    #[test]
    fn random_in_sphere_stays_inside() {
        let mut ctx = SpawnContext::new(1);
        for _ in 0..200 {
            assert!(ctx.random_in_sphere(0.5).length() <= 0.5 + 1e-4);
        }
    }

    #[test]
    fn random_direction_is_unit_length() {
        let mut ctx = SpawnContext::new(2);
        for _ in 0..200 {
            assert!((ctx.random_direction().length() - 1.0).abs() < 1e-4);
        }
    }

    #[test]
    fn spawn_radius_is_capped_by_volume_extent() {
        let mut config = SpeciesConfig::new(Species::Prey, 256);
        config.spawn_radius = 100.0;
        let volume = sphere_volume(3.0);
        let mut ctx = SpawnContext::new(3);
        for agent in ctx.spawn_population(&config, &volume) {
            assert!(agent.position.length() <= 3.0 + 1e-3);
            assert_eq!(agent.acceleration, Vec3::ZERO);
            assert!((agent.velocity.length() - config.spawn_speed).abs() < 1e-3);
        }
    }

    #[test]
    fn spawn_all_lays_out_species_segments_in_order() {
        let configs = vec![
            SpeciesConfig::new(Species::Prey, 512),
            {
                let mut c = SpeciesConfig::new(Species::Predator, 16);
                c.granularity = 16;
                c
            },
        ];
        let (agents, offsets) = spawn_all(&configs, &sphere_volume(10.0), 42);
        assert_eq!(agents.len(), 528);
        assert_eq!(offsets, vec![0, 512]);
        assert!(agents[..512].iter().all(|a| a.species == Species::Prey));
        assert!(agents[512..].iter().all(|a| a.species == Species::Predator));
    }
}
