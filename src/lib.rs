//! # flockgpu - GPU flocking simulation
//!
//! Multi-species boid flocking computed entirely on the GPU. Agents live in
//! a double-buffered storage buffer; one compute dispatch per species runs
//! a shared steering kernel (alignment, cohesion, separation, flee,
//! pursuit, food seeking, force fields, bounds containment, drag), and the
//! renderer draws every agent by instanced indirect draws straight from the
//! same buffer. Agent state never crosses back to the host on the frame
//! path.
//!
//! ## Quick Start
//!
//! ```ignore
//! use flockgpu::prelude::*;
//!
//! let volume = SimulationVolume::Box {
//!     center: Vec3::ZERO,
//!     half_extents: Vec3::splat(20.0),
//! };
//!
//! let ctx = pollster::block_on(GpuContext::headless())?;
//! let env = StaticEnvironment::new(vec![Vec3::new(5.0, 0.0, 0.0)]);
//!
//! let mut sim = FlockSimulation::builder(volume)
//!     .with_species(SpeciesConfig::new(Species::Prey, 2048))
//!     .with_species(SpeciesConfig::new(Species::Predator, 16).with_granularity(16))
//!     .build(&ctx, &env)?;
//!
//! sim.step(1.0 / 60.0, &env);
//! ```
//!
//! ## Core Concepts
//!
//! - **Species**: prey flock with each other and flee predators; predators
//!   pursue a point ahead of the nearest prey. All agents share one buffer,
//!   segmented per species, and one species-parameterized kernel.
//! - **Environment**: a per-frame food snapshot and a static set of force
//!   fields, supplied through [`EnvironmentSource`]. Positive field
//!   magnitudes repel, negative attract.
//! - **Bounds**: a box or sphere [`SimulationVolume`] steers agents back
//!   inside, softly; nothing teleports or clamps positions.
//! - **Dispatch granularity**: each species' workgroup size. Populations
//!   must be a size the granularity divides into whole workgroups at
//!   least once; validation is fail-fast at setup.
//!
//! The CPU reference in [`forces`] mirrors the WGSL kernel branch for
//! branch and backs the test suite, so steering behavior is verifiable
//! without a GPU.

pub mod agent;
pub mod config;
pub mod dispatch;
pub mod environment;
pub mod error;
pub mod forces;
pub mod gpu;
pub mod simulation;
pub mod spawn;
pub mod time;

pub use bytemuck;
pub use glam::{Vec2, Vec3, Vec4};

pub use agent::{Agent, AgentGpu, Species};
pub use config::{BehaviorProfile, SimulationVolume, SpeciesConfig};
pub use environment::{EnvironmentSource, FoodRespawner, ForceField, StaticEnvironment};
pub use error::{ConfigError, GpuError, SimulationError};
pub use gpu::{FlockRenderer, GpuContext, MESH_INDEX_COUNT};
pub use simulation::FlockSimulation;
pub use time::Time;

/// Common imports for building and driving a simulation.
pub mod prelude {
    pub use crate::agent::{Agent, Species};
    pub use crate::config::{BehaviorProfile, SimulationVolume, SpeciesConfig};
    pub use crate::environment::{
        EnvironmentSource, FoodRespawner, ForceField, StaticEnvironment,
    };
    pub use crate::error::{ConfigError, GpuError, SimulationError};
    pub use crate::gpu::{FlockRenderer, GpuContext, MESH_INDEX_COUNT};
    pub use crate::simulation::FlockSimulation;
    pub use crate::time::Time;
    pub use glam::Vec3;
}
