//! Simulation configuration: species behavior profiles, spawn parameters
//! and the bounding volume.
//!
//! Everything here is read once at setup. The only values resampled per
//! frame are `delta_time` and the food positions, which flow through
//! [`crate::simulation::FlockSimulation::step`].

use glam::Vec3;

use crate::agent::Species;
use crate::dispatch::{self, MAX_GRANULARITY};
use crate::error::ConfigError;

/// The simulation bounding volume. Read-only within a frame; the owner may
/// move its center between frames.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum SimulationVolume {
    Box { center: Vec3, half_extents: Vec3 },
    Sphere { center: Vec3, radius: f32 },
}

impl SimulationVolume {
    pub fn center(&self) -> Vec3 {
        match self {
            SimulationVolume::Box { center, .. } => *center,
            SimulationVolume::Sphere { center, .. } => *center,
        }
    }

    /// Move the volume with its owner.
    pub fn set_center(&mut self, new_center: Vec3) {
        match self {
            SimulationVolume::Box { center, .. } => *center = new_center,
            SimulationVolume::Sphere { center, .. } => *center = new_center,
        }
    }

    /// Largest extent of the volume, used to cap the spawn radius.
    pub fn max_extent(&self) -> f32 {
        match self {
            SimulationVolume::Box { half_extents, .. } => half_extents.max_element(),
            SimulationVolume::Sphere { radius, .. } => *radius,
        }
    }

    /// Kind tag matching `VOLUME_BOX` / `VOLUME_SPHERE` in the kernel.
    pub(crate) fn kind(&self) -> u32 {
        match self {
            SimulationVolume::Box { .. } => 0,
            SimulationVolume::Sphere { .. } => 1,
        }
    }

    /// Extents vector as packed for the params uniform: half extents for a
    /// box, `(radius, 0, 0)` for a sphere.
    pub(crate) fn extents(&self) -> Vec3 {
        match self {
            SimulationVolume::Box { half_extents, .. } => *half_extents,
            SimulationVolume::Sphere { radius, .. } => Vec3::new(*radius, 0.0, 0.0),
        }
    }
}

/// Per-species force weights, distance thresholds and speed limits.
///
/// Weight fields scale the corresponding steering force; distance fields
/// bound the neighborhood each force considers. Defaults mirror the
/// reference parameterization of the prey flock.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BehaviorProfile {
    pub alignment_weight: f32,
    pub cohesion_weight: f32,
    pub separation_weight: f32,
    pub flee_weight: f32,
    pub pursuit_weight: f32,
    pub food_weight: f32,
    pub bounds_weight: f32,

    pub alignment_distance: f32,
    pub cohesion_distance: f32,
    pub separation_distance: f32,
    pub flee_distance: f32,
    pub pursuit_distance: f32,
    pub food_distance: f32,
    pub bounds_distance: f32,

    /// Linear damping, conventionally negative.
    pub drag_coefficient: f32,
    /// Decay rate of force-field influence with distance.
    pub falloff_exponent: f32,
    /// Lead distance along the prey's heading for predator pursuit.
    pub pursue_offset: f32,

    pub min_speed: f32,
    pub max_speed: f32,
}

impl Default for BehaviorProfile {
    fn default() -> Self {
        Self {
            alignment_weight: 1.0,
            cohesion_weight: 1.0,
            separation_weight: 1.0,
            flee_weight: 0.0,
            pursuit_weight: 0.0,
            food_weight: 1.0,
            bounds_weight: 2.0,

            alignment_distance: 3.0,
            cohesion_distance: 3.0,
            separation_distance: 2.0,
            flee_distance: 6.0,
            pursuit_distance: 12.0,
            food_distance: 20.0,
            bounds_distance: 2.0,

            drag_coefficient: -0.05,
            falloff_exponent: 1.0,
            pursue_offset: 1.0,

            min_speed: 1.0,
            max_speed: 6.0,
        }
    }
}

impl BehaviorProfile {
    /// Default prey profile: full flocking, flees predators.
    pub fn prey() -> Self {
        Self {
            flee_weight: 4.0,
            ..Self::default()
        }
    }

    /// Default predator profile: no flocking with prey, pursues them.
    pub fn predator() -> Self {
        Self {
            alignment_weight: 0.5,
            cohesion_weight: 0.2,
            separation_weight: 2.0,
            food_weight: 0.0,
            pursuit_weight: 3.0,
            max_speed: 8.0,
            ..Self::default()
        }
    }
}

/// Setup parameters for one species.
#[derive(Clone, Debug)]
pub struct SpeciesConfig {
    pub species: Species,
    /// Population size, fixed for the simulation's lifetime.
    pub population: u32,
    /// Dispatch granularity: the batch size one work-group processes.
    pub granularity: u32,
    /// Spawn sphere radius, clamped to the volume's largest extent.
    pub spawn_radius: f32,
    /// Magnitude of the randomized initial velocity.
    pub spawn_speed: f32,
    pub profile: BehaviorProfile,
}

impl SpeciesConfig {
    pub fn new(species: Species, population: u32) -> Self {
        let profile = match species {
            Species::Prey => BehaviorProfile::prey(),
            Species::Predator => BehaviorProfile::predator(),
        };
        Self {
            species,
            population,
            granularity: dispatch::WORKGROUP_SIZE,
            spawn_radius: 10.0,
            spawn_speed: 2.0,
            profile,
        }
    }

    pub fn with_granularity(mut self, granularity: u32) -> Self {
        self.granularity = granularity;
        self
    }

    pub fn with_profile(mut self, profile: BehaviorProfile) -> Self {
        self.profile = profile;
        self
    }

    pub fn with_spawn(mut self, radius: f32, speed: f32) -> Self {
        self.spawn_radius = radius;
        self.spawn_speed = speed;
        self
    }

    /// Fail fast at setup, before any GPU resource exists.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.population == 0 {
            return Err(ConfigError::EmptyPopulation(self.species));
        }
        if self.granularity == 0 || self.granularity > MAX_GRANULARITY {
            return Err(ConfigError::InvalidGranularity {
                species: self.species,
                granularity: self.granularity,
            });
        }
        if self.population < self.granularity {
            return Err(ConfigError::PopulationBelowGranularity {
                species: self.species,
                population: self.population,
                granularity: self.granularity,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn population_below_granularity_is_rejected() {
        let mut config = SpeciesConfig::new(Species::Prey, 100);
        config.granularity = 256;
        assert_eq!(
            config.validate(),
            Err(ConfigError::PopulationBelowGranularity {
                species: Species::Prey,
                population: 100,
                granularity: 256,
            })
        );
    }

    #[test]
    fn small_granularity_allows_small_populations() {
        let mut config = SpeciesConfig::new(Species::Predator, 16);
        config.granularity = 16;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn zero_population_is_rejected() {
        let config = SpeciesConfig::new(Species::Prey, 0);
        assert_eq!(
            config.validate(),
            Err(ConfigError::EmptyPopulation(Species::Prey))
        );
    }

    #[test]
    fn oversized_granularity_is_rejected() {
        let mut config = SpeciesConfig::new(Species::Prey, 4096);
        config.granularity = 1024;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidGranularity { .. })
        ));
    }

    #[test]
    fn volume_center_tracks_owner() {
        let mut volume = SimulationVolume::Sphere {
            center: Vec3::ZERO,
            radius: 5.0,
        };
        volume.set_center(Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(volume.center(), Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(volume.max_extent(), 5.0);
    }
}
