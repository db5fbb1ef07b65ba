//! Agent state and its GPU memory layout.
//!
//! The simulation keeps every agent of every species in one storage buffer,
//! prey first, then predators. Each record is 48 bytes (a multiple of 16,
//! as WGSL storage layout requires) and doubles as the instance-stepped
//! vertex buffer for rendering.

use bytemuck::{Pod, Zeroable};
use glam::Vec3;

/// Species tag carried by every agent.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Species {
    Prey,
    Predator,
}

impl Species {
    /// The `u32` tag stored in the GPU record.
    pub fn tag(self) -> u32 {
        match self {
            Species::Prey => 0,
            Species::Predator => 1,
        }
    }
}

impl From<Species> for u32 {
    fn from(s: Species) -> u32 {
        s.tag()
    }
}

/// One simulated flocking entity.
#[derive(Clone, Debug)]
pub struct Agent {
    pub position: Vec3,
    pub velocity: Vec3,
    pub acceleration: Vec3,
    pub mass: f32,
    pub species: Species,
}

impl Agent {
    pub fn to_gpu(&self) -> AgentGpu {
        AgentGpu {
            position: self.position.to_array(),
            mass: self.mass,
            velocity: self.velocity.to_array(),
            species: self.species.tag(),
            acceleration: self.acceleration.to_array(),
            _pad: 0.0,
        }
    }

    pub fn from_gpu(gpu: &AgentGpu) -> Self {
        Self {
            position: Vec3::from_array(gpu.position),
            velocity: Vec3::from_array(gpu.velocity),
            acceleration: Vec3::from_array(gpu.acceleration),
            mass: gpu.mass,
            species: if gpu.species == Species::Predator.tag() {
                Species::Predator
            } else {
                Species::Prey
            },
        }
    }
}

/// GPU record for one agent. Layout matches the `Agent` struct in
/// `shaders/flock.wgsl` field for field.
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct AgentGpu {
    pub position: [f32; 3],
    pub mass: f32,
    pub velocity: [f32; 3],
    pub species: u32,
    pub acceleration: [f32; 3],
    pub _pad: f32,
}

impl AgentGpu {
    pub fn position(&self) -> Vec3 {
        Vec3::from_array(self.position)
    }

    pub fn velocity(&self) -> Vec3 {
        Vec3::from_array(self.velocity)
    }

    pub fn speed(&self) -> f32 {
        self.velocity().length()
    }
}

/// Byte offsets used for the instance vertex attributes.
pub const AGENT_STRIDE: u64 = std::mem::size_of::<AgentGpu>() as u64;
pub const AGENT_POSITION_OFFSET: u64 = 0;
pub const AGENT_VELOCITY_OFFSET: u64 = 16;
pub const AGENT_SPECIES_OFFSET: u64 = 28;

/// GPU record for a force field: position plus signed magnitude.
/// Positive magnitude repels, negative attracts.
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct ForceFieldGpu {
    pub position: [f32; 3],
    pub magnitude: f32,
}

/// GPU record for one food source. The pad keeps the array stride at 16
/// bytes, matching WGSL's `vec3<f32>` struct layout.
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct FoodGpu {
    pub position: [f32; 3],
    pub _pad: f32,
}

impl FoodGpu {
    pub fn new(position: Vec3) -> Self {
        Self {
            position: position.to_array(),
            _pad: 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn agent_stride_is_multiple_of_16() {
        assert_eq!(std::mem::size_of::<AgentGpu>(), 48);
        assert_eq!(AGENT_STRIDE % 16, 0);
    }

    #[test]
    fn instance_attribute_offsets() {
        assert_eq!(std::mem::offset_of!(AgentGpu, position) as u64, AGENT_POSITION_OFFSET);
        assert_eq!(std::mem::offset_of!(AgentGpu, velocity) as u64, AGENT_VELOCITY_OFFSET);
        assert_eq!(std::mem::offset_of!(AgentGpu, species) as u64, AGENT_SPECIES_OFFSET);
    }

    #[test]
    fn environment_record_strides() {
        assert_eq!(std::mem::size_of::<ForceFieldGpu>(), 16);
        assert_eq!(std::mem::size_of::<FoodGpu>(), 16);
    }

    #[test]
    fn agent_round_trips_through_gpu_layout() {
        let agent = Agent {
            position: Vec3::new(1.0, 2.0, 3.0),
            velocity: Vec3::new(-1.0, 0.5, 0.0),
            acceleration: Vec3::ZERO,
            mass: 1.0,
            species: Species::Predator,
        };
        let back = Agent::from_gpu(&agent.to_gpu());
        assert_eq!(back.position, agent.position);
        assert_eq!(back.velocity, agent.velocity);
        assert_eq!(back.species, Species::Predator);
    }
}
