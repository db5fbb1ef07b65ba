//! CPU reference implementation of the steering model.
//!
//! `shaders/flock.wgsl` mirrors this module constant for constant and
//! branch for branch; behavioral properties are asserted here, where they
//! run without a GPU. [`CpuFlock`] uses the same double-buffered scheme as
//! the GPU path: every agent reads a frozen previous-frame snapshot and
//! writes a separate next-frame buffer, which swaps after the pass.

use glam::Vec3;

use crate::agent::{AgentGpu, FoodGpu, ForceFieldGpu, Species};
use crate::config::{BehaviorProfile, SimulationVolume};

/// Degeneracy threshold shared with the kernel.
pub const EPSILON: f32 = 1e-5;

/// Everything one agent evaluation reads: the frozen previous-frame agent
/// snapshot plus the frame's environment.
pub struct Neighborhood<'a> {
    pub agents: &'a [AgentGpu],
    pub food: &'a [FoodGpu],
    pub food_count: u32,
    pub fields: &'a [ForceFieldGpu],
    pub volume: SimulationVolume,
}

/// Normalize with a deterministic zero-length fallback of zero.
pub fn safe_normalize(v: Vec3) -> Vec3 {
    let len = v.length();
    if len < EPSILON {
        Vec3::ZERO
    } else {
        v / len
    }
}

/// Clamp speed into `[min, max]`. A zero-length velocity has no direction
/// to preserve; it deterministically becomes `min` along +X.
pub fn clamp_speed(v: Vec3, min: f32, max: f32) -> Vec3 {
    let speed = v.length();
    if speed < EPSILON {
        Vec3::new(min, 0.0, 0.0)
    } else {
        v / speed * speed.clamp(min, max)
    }
}

/// Predator interception point: the prey's position led along its heading
/// by `offset`. True pursuit, not a plain seek of the prey position.
pub fn pursuit_target(prey_position: Vec3, prey_velocity: Vec3, offset: f32) -> Vec3 {
    prey_position + safe_normalize(prey_velocity) * offset
}

/// Force exerted by one field: along the field-to-agent direction, scaled
/// by `magnitude * distance^(-exponent)`. Positive magnitude repels. An
/// agent sitting on the field receives no force.
pub fn field_force(position: Vec3, field: &ForceFieldGpu, exponent: f32) -> Vec3 {
    let away = position - Vec3::from_array(field.position);
    let dist = away.length();
    if dist < EPSILON {
        Vec3::ZERO
    } else {
        away / dist * field.magnitude * dist.powf(-exponent)
    }
}

/// Unit-weight restoring direction once the agent is within `margin` of
/// the volume boundary, or outside it. Zero while safely interior.
pub fn bounds_direction(position: Vec3, volume: &SimulationVolume, margin: f32) -> Vec3 {
    match volume {
        SimulationVolume::Sphere { center, radius } => {
            let offset = position - *center;
            let dist = offset.length();
            if dist > radius - margin && dist > EPSILON {
                -offset / dist
            } else {
                Vec3::ZERO
            }
        }
        SimulationVolume::Box {
            center,
            half_extents,
        } => {
            let local = position - *center;
            let inner = *half_extents - Vec3::splat(margin);
            let mut dir = Vec3::ZERO;
            if local.x > inner.x {
                dir.x -= 1.0;
            }
            if local.x < -inner.x {
                dir.x += 1.0;
            }
            if local.y > inner.y {
                dir.y -= 1.0;
            }
            if local.y < -inner.y {
                dir.y += 1.0;
            }
            if local.z > inner.z {
                dir.z -= 1.0;
            }
            if local.z < -inner.z {
                dir.z += 1.0;
            }
            dir
        }
    }
}

/// Accumulate the full steering force for the agent at `index`.
pub fn steering(index: usize, n: &Neighborhood<'_>, profile: &BehaviorProfile) -> Vec3 {
    let agent = &n.agents[index];
    let position = agent.position();
    let velocity = agent.velocity();
    let prey_tag = Species::Prey.tag();

    let mut force = Vec3::ZERO;

    let mut align_sum = Vec3::ZERO;
    let mut align_count = 0u32;
    let mut cohere_sum = Vec3::ZERO;
    let mut cohere_count = 0u32;
    let mut separation = Vec3::ZERO;
    let mut nearest_prey = usize::MAX;
    let mut nearest_prey_dist = f32::MAX;

    for (i, other) in n.agents.iter().enumerate() {
        if i == index {
            continue;
        }
        let to_self = position - other.position();
        let dist = to_self.length();

        if other.species == agent.species {
            if dist < profile.alignment_distance {
                align_sum += other.velocity();
                align_count += 1;
            }
            if dist < profile.cohesion_distance {
                cohere_sum += other.position();
                cohere_count += 1;
            }
            if dist < profile.separation_distance && dist > EPSILON {
                separation += to_self / (dist * dist);
            }
        } else if agent.species == prey_tag {
            // Prey: inverse-distance-weighted repulsion from predators.
            if dist < profile.flee_distance && dist > EPSILON {
                force += to_self / (dist * dist) * profile.flee_weight;
            }
        } else if other.species == prey_tag && dist < nearest_prey_dist {
            nearest_prey = i;
            nearest_prey_dist = dist;
        }
    }

    if align_count > 0 {
        force += (align_sum / align_count as f32 - velocity) * profile.alignment_weight;
    }
    if cohere_count > 0 {
        force += (cohere_sum / cohere_count as f32 - position) * profile.cohesion_weight;
    }
    force += separation * profile.separation_weight;

    if nearest_prey != usize::MAX && nearest_prey_dist < profile.pursuit_distance {
        let prey = &n.agents[nearest_prey];
        let target = pursuit_target(prey.position(), prey.velocity(), profile.pursue_offset);
        force += safe_normalize(target - position) * profile.pursuit_weight;
    }

    // Nearest food within range.
    let mut nearest_food = usize::MAX;
    let mut nearest_food_dist = profile.food_distance;
    for i in 0..n.food_count as usize {
        let dist = (Vec3::from_array(n.food[i].position) - position).length();
        if dist < nearest_food_dist {
            nearest_food = i;
            nearest_food_dist = dist;
        }
    }
    if nearest_food != usize::MAX {
        let target = Vec3::from_array(n.food[nearest_food].position);
        force += safe_normalize(target - position) * profile.food_weight;
    }

    for field in n.fields {
        force += field_force(position, field, profile.falloff_exponent);
    }

    force += bounds_direction(position, &n.volume, profile.bounds_distance) * profile.bounds_weight;
    force += velocity * profile.drag_coefficient;

    force
}

/// Semi-implicit Euler step with the speed clamp invariant. Acceleration
/// is scratch state, rebuilt from this frame's force.
pub fn integrate(agent: &AgentGpu, force: Vec3, delta_time: f32, profile: &BehaviorProfile) -> AgentGpu {
    let acceleration = force / agent.mass.max(EPSILON);
    let velocity = clamp_speed(
        agent.velocity() + acceleration * delta_time,
        profile.min_speed,
        profile.max_speed,
    );
    let position = agent.position() + velocity * delta_time;
    AgentGpu {
        position: position.to_array(),
        mass: agent.mass,
        velocity: velocity.to_array(),
        species: agent.species,
        acceleration: acceleration.to_array(),
        _pad: 0.0,
    }
}

/// CPU mirror of the GPU flock: the same double-buffered agent store and
/// per-species profiles, stepped on the host. Used by tests and benches.
pub struct CpuFlock {
    buffers: [Vec<AgentGpu>; 2],
    current: usize,
    /// Indexed by species tag.
    profiles: Vec<BehaviorProfile>,
    volume: SimulationVolume,
}

impl CpuFlock {
    pub fn new(agents: Vec<AgentGpu>, profiles: Vec<BehaviorProfile>, volume: SimulationVolume) -> Self {
        let shadow = agents.clone();
        Self {
            buffers: [agents, shadow],
            current: 0,
            profiles,
            volume,
        }
    }

    pub fn agents(&self) -> &[AgentGpu] {
        &self.buffers[self.current]
    }

    pub fn step(&mut self, delta_time: f32, food: &[FoodGpu], food_count: u32, fields: &[ForceFieldGpu]) {
        let (src_half, dst_half) = if self.current == 0 {
            let (a, b) = self.buffers.split_at_mut(1);
            (&a[0], &mut b[0])
        } else {
            let (a, b) = self.buffers.split_at_mut(1);
            (&b[0], &mut a[0])
        };

        let neighborhood = Neighborhood {
            agents: src_half,
            food,
            food_count,
            fields,
            volume: self.volume,
        };

        for index in 0..src_half.len() {
            let agent = &src_half[index];
            let profile = &self.profiles[agent.species as usize];
            let force = steering(index, &neighborhood, profile);
            dst_half[index] = integrate(agent, force, delta_time, profile);
        }

        self.current = 1 - self.current;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::Agent;

    fn lone_agent(position: Vec3, velocity: Vec3) -> AgentGpu {
        Agent {
            position,
            velocity,
            acceleration: Vec3::ZERO,
            mass: 1.0,
            species: Species::Prey,
        }
        .to_gpu()
    }

    fn quiet_profile() -> BehaviorProfile {
        // All steering off; individual tests enable one force at a time.
        BehaviorProfile {
            alignment_weight: 0.0,
            cohesion_weight: 0.0,
            separation_weight: 0.0,
            flee_weight: 0.0,
            pursuit_weight: 0.0,
            food_weight: 0.0,
            bounds_weight: 0.0,
            drag_coefficient: 0.0,
            ..BehaviorProfile::default()
        }
    }

    #[test]
    fn clamp_speed_preserves_direction() {
        let v = clamp_speed(Vec3::new(0.0, 10.0, 0.0), 1.0, 5.0);
        assert!((v - Vec3::new(0.0, 5.0, 0.0)).length() < 1e-5);
        let v = clamp_speed(Vec3::new(0.1, 0.0, 0.0), 1.0, 5.0);
        assert!((v - Vec3::new(1.0, 0.0, 0.0)).length() < 1e-5);
    }

    #[test]
    fn clamp_speed_zero_velocity_fallback_is_deterministic() {
        let v = clamp_speed(Vec3::ZERO, 1.0, 5.0);
        assert_eq!(v, Vec3::new(1.0, 0.0, 0.0));
    }

    #[test]
    fn field_force_matches_inverse_square_expectation() {
        // Field at origin, magnitude +10, exponent 2, agent at distance 5:
        // |force| = 10 / 25, directed away from the origin.
        let field = ForceFieldGpu {
            position: [0.0; 3],
            magnitude: 10.0,
        };
        let force = field_force(Vec3::new(5.0, 0.0, 0.0), &field, 2.0);
        assert!((force.length() - 10.0 / 25.0).abs() < 1e-5);
        assert!(force.x > 0.0 && force.y == 0.0 && force.z == 0.0);
    }

    #[test]
    fn negative_magnitude_attracts() {
        let field = ForceFieldGpu {
            position: [0.0; 3],
            magnitude: -10.0,
        };
        let force = field_force(Vec3::new(5.0, 0.0, 0.0), &field, 2.0);
        assert!(force.x < 0.0);
    }

    #[test]
    fn agent_on_field_receives_no_force() {
        let field = ForceFieldGpu {
            position: [1.0, 2.0, 3.0],
            magnitude: 10.0,
        };
        assert_eq!(field_force(Vec3::new(1.0, 2.0, 3.0), &field, 2.0), Vec3::ZERO);
    }

    #[test]
    fn pursuit_target_leads_the_prey() {
        let target = pursuit_target(Vec3::new(1.0, 0.0, 0.0), Vec3::new(0.0, 3.0, 0.0), 2.0);
        assert!((target - Vec3::new(1.0, 2.0, 0.0)).length() < 1e-5);
        // Stationary prey degrades to a plain seek of its position.
        let target = pursuit_target(Vec3::new(1.0, 0.0, 0.0), Vec3::ZERO, 2.0);
        assert_eq!(target, Vec3::new(1.0, 0.0, 0.0));
    }

    #[test]
    fn bounds_direction_points_toward_interior_of_sphere() {
        let volume = SimulationVolume::Sphere {
            center: Vec3::ZERO,
            radius: 5.0,
        };
        let position = Vec3::new(8.0, 0.0, 0.0);
        let dir = bounds_direction(position, &volume, 2.0);
        assert!(dir.dot(Vec3::ZERO - position) > 0.0);
        // Deep interior: no force.
        assert_eq!(bounds_direction(Vec3::ZERO, &volume, 2.0), Vec3::ZERO);
    }

    #[test]
    fn bounds_direction_points_toward_interior_of_box() {
        let volume = SimulationVolume::Box {
            center: Vec3::new(1.0, 0.0, 0.0),
            half_extents: Vec3::splat(4.0),
        };
        for position in [
            Vec3::new(9.0, 0.0, 0.0),
            Vec3::new(-6.0, 3.9, 0.0),
            Vec3::new(1.0, 7.0, -7.0),
        ] {
            let dir = bounds_direction(position, &volume, 1.0);
            assert!(
                dir.dot(volume.center() - position) > 0.0,
                "force at {position} must point inward"
            );
        }
    }

    #[test]
    fn zero_delta_time_leaves_position_unchanged() {
        let agent = lone_agent(Vec3::new(1.0, 2.0, 3.0), Vec3::new(0.2, 0.0, 0.0));
        let profile = quiet_profile();
        let out = integrate(&agent, Vec3::new(5.0, 5.0, 5.0), 0.0, &profile);
        assert_eq!(out.position, agent.position);
        // Velocity may still change (the clamp raises sub-minimum speeds).
        assert!((out.speed() - profile.min_speed).abs() < 1e-5);
    }

    #[test]
    fn speed_stays_clamped_over_many_frames() {
        let mut profile = quiet_profile();
        profile.drag_coefficient = -0.05;
        profile.min_speed = 1.0;
        profile.max_speed = 5.0;

        let agents = vec![
            lone_agent(Vec3::ZERO, Vec3::new(4.0, 0.0, 0.0)),
            lone_agent(Vec3::new(50.0, 0.0, 0.0), Vec3::new(0.0, 0.5, 0.0)),
        ];
        let volume = SimulationVolume::Sphere {
            center: Vec3::ZERO,
            radius: 1000.0,
        };
        let mut flock = CpuFlock::new(agents, vec![profile, profile], volume);
        let food = FoodGpu { position: [0.0; 3], _pad: 0.0 };
        for _ in 0..500 {
            flock.step(0.016, &[food], 0, &[]);
            for agent in flock.agents() {
                let speed = agent.speed();
                assert!((1.0 - 1e-4..=5.0 + 1e-4).contains(&speed));
            }
        }
    }

    #[test]
    fn alignment_pulls_velocity_toward_flock_average() {
        let mut profile = quiet_profile();
        profile.alignment_weight = 1.0;
        let agents = vec![
            lone_agent(Vec3::ZERO, Vec3::new(1.0, 0.0, 0.0)),
            lone_agent(Vec3::new(1.0, 0.0, 0.0), Vec3::new(0.0, 1.0, 0.0)),
        ];
        let n = Neighborhood {
            agents: &agents,
            food: &[],
            food_count: 0,
            fields: &[],
            volume: SimulationVolume::Sphere {
                center: Vec3::ZERO,
                radius: 100.0,
            },
        };
        let force = steering(0, &n, &profile);
        // Neighbor average velocity is +Y; force is (avg - v).
        assert!((force - Vec3::new(-1.0, 1.0, 0.0)).length() < 1e-5);
    }

    #[test]
    fn separation_pushes_apart_and_cohesion_pulls_together() {
        let agents = vec![
            lone_agent(Vec3::ZERO, Vec3::X),
            lone_agent(Vec3::new(0.5, 0.0, 0.0), Vec3::X),
        ];
        let n = Neighborhood {
            agents: &agents,
            food: &[],
            food_count: 0,
            fields: &[],
            volume: SimulationVolume::Sphere {
                center: Vec3::ZERO,
                radius: 100.0,
            },
        };

        let mut sep = quiet_profile();
        sep.separation_weight = 1.0;
        assert!(steering(0, &n, &sep).x < 0.0);

        let mut coh = quiet_profile();
        coh.cohesion_weight = 1.0;
        assert!(steering(0, &n, &coh).x > 0.0);
    }

    #[test]
    fn prey_flees_and_predator_pursues() {
        let prey = lone_agent(Vec3::ZERO, Vec3::new(0.0, 2.0, 0.0));
        let predator = Agent {
            position: Vec3::new(3.0, 0.0, 0.0),
            velocity: Vec3::ZERO,
            acceleration: Vec3::ZERO,
            mass: 1.0,
            species: Species::Predator,
        }
        .to_gpu();
        let agents = vec![prey, predator];
        let n = Neighborhood {
            agents: &agents,
            food: &[],
            food_count: 0,
            fields: &[],
            volume: SimulationVolume::Sphere {
                center: Vec3::ZERO,
                radius: 100.0,
            },
        };

        let mut prey_profile = quiet_profile();
        prey_profile.flee_weight = 1.0;
        let flee = steering(0, &n, &prey_profile);
        assert!(flee.x < 0.0, "prey must accelerate away from the predator");

        let mut predator_profile = quiet_profile();
        predator_profile.pursuit_weight = 1.0;
        predator_profile.pursue_offset = 2.0;
        let pursue = steering(1, &n, &predator_profile);
        // Steering aims at prey.position + normalize(prey.velocity) * offset
        // = (0, 2, 0), not at the prey itself.
        let expected = safe_normalize(Vec3::new(0.0, 2.0, 0.0) - Vec3::new(3.0, 0.0, 0.0));
        assert!((pursue - expected).length() < 1e-5);
    }

    #[test]
    fn food_attraction_targets_nearest_source_within_range() {
        let mut profile = quiet_profile();
        profile.food_weight = 2.0;
        profile.food_distance = 10.0;
        let agents = vec![lone_agent(Vec3::ZERO, Vec3::X)];
        let food = [
            FoodGpu::new(Vec3::new(8.0, 0.0, 0.0)),
            FoodGpu::new(Vec3::new(0.0, 2.0, 0.0)),
            FoodGpu::new(Vec3::new(0.0, 0.0, 30.0)), // out of range
        ];
        let n = Neighborhood {
            agents: &agents,
            food: &food,
            food_count: 3,
            fields: &[],
            volume: SimulationVolume::Sphere {
                center: Vec3::ZERO,
                radius: 100.0,
            },
        };
        let force = steering(0, &n, &profile);
        assert!((force - Vec3::new(0.0, 2.0, 0.0)).length() < 1e-5);
    }

    #[test]
    fn sentinel_food_is_ignored_when_count_is_zero() {
        let mut profile = quiet_profile();
        profile.food_weight = 2.0;
        let agents = vec![lone_agent(Vec3::new(0.5, 0.0, 0.0), Vec3::X)];
        let sentinel = [FoodGpu::new(Vec3::ZERO)];
        let n = Neighborhood {
            agents: &agents,
            food: &sentinel,
            food_count: 0,
            fields: &[],
            volume: SimulationVolume::Sphere {
                center: Vec3::ZERO,
                radius: 100.0,
            },
        };
        assert_eq!(steering(0, &n, &profile), Vec3::ZERO);
    }
}
