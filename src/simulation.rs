//! Simulation setup and the per-frame driver.
//!
//! [`FlockSimulation`] owns every GPU resource of the core: the
//! double-buffered agent store, the environment snapshots, the per-species
//! parameter blocks and the indirect draw arguments. One `step` issues one
//! compute dispatch per species, all sharing the frame's `delta_time`,
//! then swaps the agent buffers. Agent data never returns to the host on
//! the render path.

use bytemuck::{Pod, Zeroable};
use glam::Vec3;
use wgpu::util::DeviceExt;

use crate::agent::{Agent, AgentGpu, ForceFieldGpu, Species, AGENT_STRIDE};
use crate::config::{BehaviorProfile, SimulationVolume, SpeciesConfig};
use crate::dispatch::{group_count, DispatchArgs};
use crate::environment::{EnvironmentSource, FoodSnapshot};
use crate::error::{ConfigError, GpuError, SimulationError};
use crate::gpu::GpuContext;
use crate::spawn;

const FLOCK_SHADER: &str = include_str!("shaders/flock.wgsl");

/// Per-dispatch parameter block; must match `SimParams` in the kernel.
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
struct SimParamsGpu {
    alignment_weight: f32,
    cohesion_weight: f32,
    separation_weight: f32,
    flee_weight: f32,
    pursuit_weight: f32,
    food_weight: f32,
    bounds_weight: f32,
    drag_coefficient: f32,

    alignment_distance: f32,
    cohesion_distance: f32,
    separation_distance: f32,
    flee_distance: f32,
    pursuit_distance: f32,
    food_distance: f32,
    bounds_distance: f32,
    falloff_exponent: f32,

    pursue_offset: f32,
    min_speed: f32,
    max_speed: f32,
    delta_time: f32,

    first_index: u32,
    count: u32,
    total_count: u32,
    food_count: u32,

    field_count: u32,
    species: u32,
    volume_kind: u32,
    _pad0: u32,

    volume_center: [f32; 3],
    _pad1: f32,
    volume_extents: [f32; 3],
    _pad2: f32,
}

impl SimParamsGpu {
    fn new(
        profile: &BehaviorProfile,
        species: Species,
        first_index: u32,
        count: u32,
        total_count: u32,
        volume: &SimulationVolume,
    ) -> Self {
        Self {
            alignment_weight: profile.alignment_weight,
            cohesion_weight: profile.cohesion_weight,
            separation_weight: profile.separation_weight,
            flee_weight: profile.flee_weight,
            pursuit_weight: profile.pursuit_weight,
            food_weight: profile.food_weight,
            bounds_weight: profile.bounds_weight,
            drag_coefficient: profile.drag_coefficient,
            alignment_distance: profile.alignment_distance,
            cohesion_distance: profile.cohesion_distance,
            separation_distance: profile.separation_distance,
            flee_distance: profile.flee_distance,
            pursuit_distance: profile.pursuit_distance,
            food_distance: profile.food_distance,
            bounds_distance: profile.bounds_distance,
            falloff_exponent: profile.falloff_exponent,
            pursue_offset: profile.pursue_offset,
            min_speed: profile.min_speed,
            max_speed: profile.max_speed,
            delta_time: 0.0,
            first_index,
            count,
            total_count,
            food_count: 0,
            field_count: 0,
            species: species.tag(),
            volume_kind: volume.kind(),
            _pad0: 0,
            volume_center: volume.center().to_array(),
            _pad1: 0.0,
            volume_extents: volume.extents().to_array(),
            _pad2: 0.0,
        }
    }
}

/// One species' slice of the simulation: its segment of the agent store,
/// its parameter block, its compute pipeline and its indirect draw record.
pub struct SpeciesState {
    config: SpeciesConfig,
    first_index: u32,
    pipeline: wgpu::ComputePipeline,
    params_buffer: wgpu::Buffer,
    indirect_buffer: wgpu::Buffer,
}

impl SpeciesState {
    pub fn species(&self) -> Species {
        self.config.species
    }

    pub fn population(&self) -> u32 {
        self.config.population
    }

    pub fn first_index(&self) -> u32 {
        self.first_index
    }

    /// Byte offset of this species' segment in the agent buffer.
    pub fn byte_offset(&self) -> u64 {
        self.first_index as u64 * AGENT_STRIDE
    }

    /// The GPU-resident indirect draw arguments for this species.
    /// `instance_count` was fixed at setup and is never re-derived.
    pub fn indirect_buffer(&self) -> &wgpu::Buffer {
        &self.indirect_buffer
    }
}

/// Builder for [`FlockSimulation`].
pub struct SimulationBuilder {
    volume: SimulationVolume,
    species: Vec<SpeciesConfig>,
    mesh_index_count: u32,
    seed: u64,
}

impl SimulationBuilder {
    pub fn new(volume: SimulationVolume) -> Self {
        Self {
            volume,
            species: Vec::new(),
            mesh_index_count: 0,
            seed: 0,
        }
    }

    /// Add a species population.
    pub fn with_species(mut self, config: SpeciesConfig) -> Self {
        self.species.push(config);
        self
    }

    /// Index count of the mesh the renderer will instance; baked into each
    /// species' indirect draw arguments.
    pub fn with_mesh_index_count(mut self, index_count: u32) -> Self {
        self.mesh_index_count = index_count;
        self
    }

    /// Seed for randomized spawn placement.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn build(
        self,
        ctx: &GpuContext,
        environment: &dyn EnvironmentSource,
    ) -> Result<FlockSimulation, SimulationError> {
        FlockSimulation::new(ctx, self, environment)
    }
}

/// The flocking core: agent store, environment snapshots, dispatch
/// scheduling and the render feed.
pub struct FlockSimulation {
    device: wgpu::Device,
    queue: wgpu::Queue,
    volume: SimulationVolume,

    // Double-buffered agent store; `current` indexes the last-written
    // buffer. Kernels read `current` and write the other, then they swap.
    agent_buffers: [wgpu::Buffer; 2],
    current: usize,
    total_population: u32,

    bind_group_layout: wgpu::BindGroupLayout,
    species: Vec<SpeciesState>,

    food_buffer: wgpu::Buffer,
    food_capacity: usize,
    field_buffer: wgpu::Buffer,
    field_count: u32,

    frame: u64,
}

impl FlockSimulation {
    pub fn builder(volume: SimulationVolume) -> SimulationBuilder {
        SimulationBuilder::new(volume)
    }

    fn new(
        ctx: &GpuContext,
        builder: SimulationBuilder,
        environment: &dyn EnvironmentSource,
    ) -> Result<Self, SimulationError> {
        if builder.species.is_empty() {
            return Err(ConfigError::NoSpecies.into());
        }
        for config in &builder.species {
            config.validate()?;
        }

        let device = ctx.device.clone();
        let queue = ctx.queue.clone();

        let (agents, offsets) = spawn::spawn_all(&builder.species, &builder.volume, builder.seed);
        let gpu_agents: Vec<AgentGpu> = agents.iter().map(Agent::to_gpu).collect();
        let total_population = gpu_agents.len() as u32;

        log::info!(
            "Flock setup: {} agents across {} species in {:?}",
            total_population,
            builder.species.len(),
            builder.volume,
        );

        let agent_usage = wgpu::BufferUsages::STORAGE
            | wgpu::BufferUsages::VERTEX
            | wgpu::BufferUsages::COPY_SRC;
        let agent_buffers = [
            device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Agent Buffer A"),
                contents: bytemuck::cast_slice(&gpu_agents),
                usage: agent_usage,
            }),
            device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Agent Buffer B"),
                contents: bytemuck::cast_slice(&gpu_agents),
                usage: agent_usage,
            }),
        ];

        // Force fields are collected once; the buffer is read-only for the
        // simulation's lifetime. Empty is tolerated via a single unused
        // record, since storage bindings cannot be zero-sized.
        let fields: Vec<ForceFieldGpu> = environment
            .list_force_fields()
            .iter()
            .map(|f| ForceFieldGpu {
                position: f.position.to_array(),
                magnitude: f.magnitude,
            })
            .collect();
        let field_count = fields.len() as u32;
        let field_records = if fields.is_empty() {
            vec![ForceFieldGpu::zeroed()]
        } else {
            fields
        };
        let field_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Force Field Buffer"),
            contents: bytemuck::cast_slice(&field_records),
            usage: wgpu::BufferUsages::STORAGE,
        });

        let snapshot = FoodSnapshot::build(&environment.list_food());
        let food_capacity = snapshot.records().len();
        let food_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Food Buffer"),
            contents: bytemuck::cast_slice(snapshot.records()),
            usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_DST,
        });

        let bind_group_layout = create_bind_group_layout(&device);
        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Flock Pipeline Layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let mut species = Vec::with_capacity(builder.species.len());
        for (config, first_index) in builder.species.into_iter().zip(offsets) {
            let pipeline =
                create_species_pipeline(&device, &pipeline_layout, config.granularity);

            let params = SimParamsGpu::new(
                &config.profile,
                config.species,
                first_index,
                config.population,
                total_population,
                &builder.volume,
            );
            let params_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Sim Params"),
                contents: bytemuck::bytes_of(&params),
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            });

            let args = DispatchArgs::for_species(builder.mesh_index_count, config.population, 0);
            let indirect_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Indirect Draw Args"),
                contents: bytemuck::bytes_of(&args),
                usage: wgpu::BufferUsages::INDIRECT,
            });

            species.push(SpeciesState {
                config,
                first_index,
                pipeline,
                params_buffer,
                indirect_buffer,
            });
        }

        Ok(Self {
            device,
            queue,
            volume: builder.volume,
            agent_buffers,
            current: 0,
            total_population,
            bind_group_layout,
            species,
            food_buffer,
            food_capacity,
            field_buffer,
            field_count,
            frame: 0,
        })
    }

    /// Advance the simulation by one frame. Collects the frame's food
    /// snapshot, dispatches the kernel once per species with the shared
    /// `delta_time`, and swaps the agent buffers.
    pub fn step(&mut self, delta_time: f32, environment: &dyn EnvironmentSource) {
        let snapshot = FoodSnapshot::build(&environment.list_food());
        self.upload_food(&snapshot);

        for state in &self.species {
            let mut params = SimParamsGpu::new(
                &state.config.profile,
                state.config.species,
                state.first_index,
                state.config.population,
                self.total_population,
                &self.volume,
            );
            params.delta_time = delta_time;
            params.food_count = snapshot.count();
            params.field_count = self.field_count;
            self.queue
                .write_buffer(&state.params_buffer, 0, bytemuck::bytes_of(&params));
        }

        let src = &self.agent_buffers[self.current];
        let dst = &self.agent_buffers[1 - self.current];
        let bind_groups: Vec<wgpu::BindGroup> = self
            .species
            .iter()
            .map(|state| {
                self.device.create_bind_group(&wgpu::BindGroupDescriptor {
                    label: Some("Flock Bind Group"),
                    layout: &self.bind_group_layout,
                    entries: &[
                        wgpu::BindGroupEntry {
                            binding: 0,
                            resource: src.as_entire_binding(),
                        },
                        wgpu::BindGroupEntry {
                            binding: 1,
                            resource: dst.as_entire_binding(),
                        },
                        wgpu::BindGroupEntry {
                            binding: 2,
                            resource: self.food_buffer.as_entire_binding(),
                        },
                        wgpu::BindGroupEntry {
                            binding: 3,
                            resource: self.field_buffer.as_entire_binding(),
                        },
                        wgpu::BindGroupEntry {
                            binding: 4,
                            resource: state.params_buffer.as_entire_binding(),
                        },
                    ],
                })
            })
            .collect();

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Flock Step Encoder"),
            });
        {
            let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some("Flock Update Pass"),
                timestamp_writes: None,
            });
            for (state, bind_group) in self.species.iter().zip(&bind_groups) {
                pass.set_pipeline(&state.pipeline);
                pass.set_bind_group(0, bind_group, &[]);
                let groups = group_count(state.config.population, state.config.granularity);
                pass.dispatch_workgroups(groups, 1, 1);
            }
        }
        self.queue.submit(std::iter::once(encoder.finish()));

        self.current = 1 - self.current;
        self.frame += 1;
    }

    /// Replace or rewrite the per-frame food storage. When the record count
    /// changes, the previous buffer is destroyed before the new one takes
    /// its place; the setup buffer covers the first-frame path.
    fn upload_food(&mut self, snapshot: &FoodSnapshot) {
        if snapshot.records().len() == self.food_capacity {
            self.queue
                .write_buffer(&self.food_buffer, 0, bytemuck::cast_slice(snapshot.records()));
            return;
        }

        log::debug!(
            "Food storage resized: {} -> {} records",
            self.food_capacity,
            snapshot.records().len()
        );
        let replacement = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Food Buffer"),
                contents: bytemuck::cast_slice(snapshot.records()),
                usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_DST,
            });
        self.food_capacity = snapshot.records().len();
        let previous = std::mem::replace(&mut self.food_buffer, replacement);
        previous.destroy();
    }

    /// Move the bounding volume with its owner.
    pub fn set_volume_center(&mut self, center: Vec3) {
        self.volume.set_center(center);
    }

    pub fn volume(&self) -> &SimulationVolume {
        &self.volume
    }

    /// The post-update agent buffer for this frame; the renderer reads it
    /// as an instance-stepped vertex buffer.
    pub fn agent_buffer(&self) -> &wgpu::Buffer {
        &self.agent_buffers[self.current]
    }

    /// Per-species render feed records.
    pub fn species(&self) -> &[SpeciesState] {
        &self.species
    }

    pub fn total_population(&self) -> u32 {
        self.total_population
    }

    pub fn frame(&self) -> u64 {
        self.frame
    }

    /// Copy the current agent state back to the host. Debug/inspection
    /// only; the render path never touches host memory.
    pub fn read_agents(&self) -> Result<Vec<AgentGpu>, GpuError> {
        let size = self.total_population as u64 * AGENT_STRIDE;
        let staging = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Agent Readback"),
            size,
            usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Agent Readback Encoder"),
            });
        encoder.copy_buffer_to_buffer(self.agent_buffer(), 0, &staging, 0, size);
        self.queue.submit(std::iter::once(encoder.finish()));

        let (tx, rx) = std::sync::mpsc::channel();
        staging
            .slice(..)
            .map_async(wgpu::MapMode::Read, move |result| {
                let _ = tx.send(result);
            });
        self.device
            .poll(wgpu::PollType::Wait)
            .map_err(|e| GpuError::BufferMapping(e.to_string()))?;
        rx.recv()
            .map_err(|e| GpuError::BufferMapping(e.to_string()))?
            .map_err(|e| GpuError::BufferMapping(e.to_string()))?;

        let mapped = staging.slice(..).get_mapped_range();
        let agents: Vec<AgentGpu> = bytemuck::cast_slice(&mapped[..]).to_vec();
        drop(mapped);
        staging.unmap();
        Ok(agents)
    }
}

fn create_bind_group_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    let storage = |binding, read_only| wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::COMPUTE,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Storage { read_only },
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        count: None,
    };
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some("Flock Bind Group Layout"),
        entries: &[
            storage(0, true),
            storage(1, false),
            storage(2, true),
            storage(3, true),
            wgpu::BindGroupLayoutEntry {
                binding: 4,
                visibility: wgpu::ShaderStages::COMPUTE,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            },
        ],
    })
}

fn create_species_pipeline(
    device: &wgpu::Device,
    layout: &wgpu::PipelineLayout,
    granularity: u32,
) -> wgpu::ComputePipeline {
    // The kernel ships with the default granularity baked in; a species
    // with a different batch size gets its own specialization.
    let source = if granularity == crate::dispatch::WORKGROUP_SIZE {
        FLOCK_SHADER.to_string()
    } else {
        FLOCK_SHADER.replace(
            "@workgroup_size(256)",
            &format!("@workgroup_size({})", granularity),
        )
    };
    let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some("Flock Kernel"),
        source: wgpu::ShaderSource::Wgsl(source.into()),
    });
    device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
        label: Some("Flock Pipeline"),
        layout: Some(layout),
        module: &module,
        entry_point: Some("update_flock"),
        compilation_options: Default::default(),
        cache: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn params_block_matches_wgsl_layout() {
        assert_eq!(std::mem::size_of::<SimParamsGpu>(), 144);
        assert_eq!(std::mem::size_of::<SimParamsGpu>() % 16, 0);
    }

    #[test]
    fn params_carry_profile_and_segment() {
        let profile = BehaviorProfile::prey();
        let volume = SimulationVolume::Box {
            center: Vec3::ZERO,
            half_extents: Vec3::splat(10.0),
        };
        let params = SimParamsGpu::new(&profile, Species::Prey, 512, 256, 768, &volume);
        assert_eq!(params.first_index, 512);
        assert_eq!(params.count, 256);
        assert_eq!(params.total_count, 768);
        assert_eq!(params.species, 0);
        assert_eq!(params.volume_kind, 0);
        assert_eq!(params.drag_coefficient, profile.drag_coefficient);
    }
}
