//! Environmental inputs: food sources and force fields.
//!
//! The simulation never queries a scene graph. Collaborators implement
//! [`EnvironmentSource`] and hand over plain snapshots: force fields once
//! at setup, food positions every frame.

use glam::Vec3;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use crate::agent::FoodGpu;

/// A point force field.
///
/// Sign convention: **positive magnitude repels, negative attracts**. The
/// force on an agent acts along the field-to-agent direction scaled by
/// `magnitude * distance^(-falloff_exponent)`, with no distance cutoff.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ForceField {
    pub position: Vec3,
    pub magnitude: f32,
}

impl ForceField {
    pub fn new(position: Vec3, magnitude: f32) -> Self {
        Self {
            position,
            magnitude,
        }
    }
}

/// Collaborator interface supplying environmental inputs.
///
/// `list_force_fields` is called once at setup; `list_food` every frame.
pub trait EnvironmentSource {
    /// Current food positions. May change every frame.
    fn list_food(&self) -> Vec<Vec3>;

    /// Force field descriptors, fixed for the simulation's lifetime.
    fn list_force_fields(&self) -> Vec<ForceField> {
        Vec::new()
    }
}

/// Food snapshot ready for GPU upload.
///
/// The backing storage contract disallows empty buffers, so zero live food
/// yields a single sentinel record with `count` still reporting zero; the
/// kernel only reads the first `count` entries.
#[derive(Clone, Debug)]
pub struct FoodSnapshot {
    records: Vec<FoodGpu>,
    count: u32,
}

impl FoodSnapshot {
    pub fn build(food: &[Vec3]) -> Self {
        let count = food.len() as u32;
        let records = if food.is_empty() {
            vec![FoodGpu::new(Vec3::ZERO)]
        } else {
            food.iter().map(|p| FoodGpu::new(*p)).collect()
        };
        Self { records, count }
    }

    /// Records to upload; never empty.
    pub fn records(&self) -> &[FoodGpu] {
        &self.records
    }

    /// Number of live food sources, excluding the sentinel.
    pub fn count(&self) -> u32 {
        self.count
    }
}

/// A fixed environment, useful for tests and static scenes.
#[derive(Clone, Debug, Default)]
pub struct StaticEnvironment {
    pub food: Vec<Vec3>,
    pub force_fields: Vec<ForceField>,
}

impl StaticEnvironment {
    pub fn new(food: Vec<Vec3>) -> Self {
        Self {
            food,
            force_fields: Vec::new(),
        }
    }

    pub fn with_force_fields(mut self, fields: Vec<ForceField>) -> Self {
        self.force_fields = fields;
        self
    }
}

impl EnvironmentSource for StaticEnvironment {
    fn list_food(&self) -> Vec<Vec3> {
        self.food.clone()
    }

    fn list_force_fields(&self) -> Vec<ForceField> {
        self.force_fields.clone()
    }
}

/// A food population with randomized lifetimes. Expired items respawn at a
/// random point inside a sphere, so the live set drifts every frame.
pub struct FoodRespawner {
    items: Vec<FoodItem>,
    radius: f32,
    lifetime: f32,
    force_fields: Vec<ForceField>,
    rng: SmallRng,
}

struct FoodItem {
    position: Vec3,
    remaining: f32,
}

impl FoodRespawner {
    pub fn new(count: usize, radius: f32, lifetime: f32, seed: u64) -> Self {
        let mut rng = SmallRng::seed_from_u64(seed);
        let items = (0..count)
            .map(|_| FoodItem {
                position: random_in_sphere(&mut rng, radius),
                remaining: rng.gen_range(0.0..lifetime.max(f32::EPSILON)),
            })
            .collect();
        Self {
            items,
            radius,
            lifetime,
            force_fields: Vec::new(),
            rng,
        }
    }

    pub fn with_force_fields(mut self, fields: Vec<ForceField>) -> Self {
        self.force_fields = fields;
        self
    }

    /// Age all items; respawn the expired ones. Call once per frame before
    /// stepping the simulation.
    pub fn update(&mut self, delta_time: f32) {
        for item in &mut self.items {
            item.remaining -= delta_time;
            if item.remaining <= 0.0 {
                item.remaining = self.lifetime;
                item.position = random_in_sphere(&mut self.rng, self.radius);
            }
        }
    }
}

impl EnvironmentSource for FoodRespawner {
    fn list_food(&self) -> Vec<Vec3> {
        self.items.iter().map(|i| i.position).collect()
    }

    fn list_force_fields(&self) -> Vec<ForceField> {
        self.force_fields.clone()
    }
}

fn random_in_sphere(rng: &mut SmallRng, radius: f32) -> Vec3 {
    loop {
        let v = Vec3::new(
            rng.gen_range(-1.0..1.0),
            rng.gen_range(-1.0..1.0),
            rng.gen_range(-1.0..1.0),
        );
        if v.length_squared() <= 1.0 {
            return v * radius;
        }
    }
}
