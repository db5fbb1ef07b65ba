//! Benchmarks for the CPU reference stepper.
//!
//! Run with: `cargo bench`

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use glam::Vec3;

use flockgpu::agent::{Agent, FoodGpu, Species};
use flockgpu::config::{BehaviorProfile, SimulationVolume, SpeciesConfig};
use flockgpu::forces::{self, CpuFlock, Neighborhood};
use flockgpu::spawn;

fn volume() -> SimulationVolume {
    SimulationVolume::Box {
        center: Vec3::ZERO,
        half_extents: Vec3::splat(20.0),
    }
}

fn spawn_agents(prey: u32, predators: u32) -> Vec<flockgpu::AgentGpu> {
    let configs = [
        SpeciesConfig::new(Species::Prey, prey),
        SpeciesConfig::new(Species::Predator, predators).with_granularity(1),
    ];
    let (agents, _) = spawn::spawn_all(&configs, &volume(), 5);
    agents.iter().map(Agent::to_gpu).collect()
}

fn bench_steering(c: &mut Criterion) {
    let mut group = c.benchmark_group("steering");

    for count in [128u32, 512, 2048] {
        let agents = spawn_agents(count, 8);
        let food = vec![
            FoodGpu {
                position: [5.0, 0.0, 0.0],
                _pad: 0.0,
            };
            16
        ];
        let profile = BehaviorProfile::prey();
        let neighborhood = Neighborhood {
            agents: &agents,
            food: &food,
            food_count: 16,
            fields: &[],
            volume: volume(),
        };

        group.bench_with_input(BenchmarkId::new("single_agent", count), &count, |b, _| {
            b.iter(|| black_box(forces::steering(0, &neighborhood, &profile)))
        });
    }

    group.finish();
}

fn bench_full_step(c: &mut Criterion) {
    let mut group = c.benchmark_group("cpu_step");
    group.sample_size(20);

    for count in [128u32, 512] {
        let agents = spawn_agents(count, 8);
        let profiles = vec![BehaviorProfile::prey(), BehaviorProfile::predator()];

        group.bench_with_input(BenchmarkId::new("frame", count), &count, |b, _| {
            let mut flock = CpuFlock::new(agents.clone(), profiles.clone(), volume());
            b.iter(|| flock.step(black_box(1.0 / 60.0), &[], 0, &[]))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_steering, bench_full_step);
criterion_main!(benches);
