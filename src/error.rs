//! Error types for flockgpu.
//!
//! Setup problems are fatal and reported before any frame runs; nothing
//! in the per-frame path is fallible.

use std::fmt;

use crate::agent::Species;

/// Configuration problems detected at setup. The simulation never starts
/// when one of these is returned.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// No species were configured.
    NoSpecies,
    /// A species has a population of zero.
    EmptyPopulation(Species),
    /// A species population is smaller than its dispatch granularity.
    PopulationBelowGranularity {
        species: Species,
        population: u32,
        granularity: u32,
    },
    /// Dispatch granularity must be between 1 and the device workgroup limit.
    InvalidGranularity { species: Species, granularity: u32 },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::NoSpecies => {
                write!(f, "At least one species must be configured")
            }
            ConfigError::EmptyPopulation(species) => {
                write!(f, "{:?} population must be greater than zero", species)
            }
            ConfigError::PopulationBelowGranularity {
                species,
                population,
                granularity,
            } => write!(
                f,
                "{:?} population ({}) is below the dispatch granularity ({})",
                species, population, granularity
            ),
            ConfigError::InvalidGranularity {
                species,
                granularity,
            } => write!(
                f,
                "{:?} dispatch granularity ({}) must be in 1..={}",
                species,
                granularity,
                crate::dispatch::MAX_GRANULARITY
            ),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Errors that can occur during GPU initialization.
#[derive(Debug)]
pub enum GpuError {
    /// No compatible GPU adapter found.
    NoAdapter,
    /// Failed to create GPU device.
    DeviceCreation(wgpu::RequestDeviceError),
    /// Failed to create a surface for rendering.
    SurfaceCreation(wgpu::CreateSurfaceError),
    /// A debug readback failed to map its staging buffer.
    BufferMapping(String),
}

impl fmt::Display for GpuError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GpuError::NoAdapter => write!(
                f,
                "No compatible GPU adapter found. Ensure your system has a GPU with WebGPU/Vulkan/Metal/DX12 support."
            ),
            GpuError::DeviceCreation(e) => write!(f, "Failed to create GPU device: {}", e),
            GpuError::SurfaceCreation(e) => write!(f, "Failed to create GPU surface: {}", e),
            GpuError::BufferMapping(msg) => write!(f, "Failed to map readback buffer: {}", msg),
        }
    }
}

impl std::error::Error for GpuError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            GpuError::DeviceCreation(e) => Some(e),
            GpuError::SurfaceCreation(e) => Some(e),
            _ => None,
        }
    }
}

impl From<wgpu::RequestDeviceError> for GpuError {
    fn from(e: wgpu::RequestDeviceError) -> Self {
        GpuError::DeviceCreation(e)
    }
}

impl From<wgpu::CreateSurfaceError> for GpuError {
    fn from(e: wgpu::CreateSurfaceError) -> Self {
        GpuError::SurfaceCreation(e)
    }
}

/// Errors that can occur when setting up or running a simulation.
#[derive(Debug)]
pub enum SimulationError {
    /// Invalid configuration; the simulation never starts.
    Config(ConfigError),
    /// GPU initialization failed.
    Gpu(GpuError),
    /// Failed to create event loop (demo window only).
    EventLoop(winit::error::EventLoopError),
}

impl fmt::Display for SimulationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SimulationError::Config(e) => write!(f, "Configuration error: {}", e),
            SimulationError::Gpu(e) => write!(f, "GPU error: {}", e),
            SimulationError::EventLoop(e) => write!(f, "Failed to create event loop: {}", e),
        }
    }
}

impl std::error::Error for SimulationError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SimulationError::Config(e) => Some(e),
            SimulationError::Gpu(e) => Some(e),
            SimulationError::EventLoop(e) => Some(e),
        }
    }
}

impl From<ConfigError> for SimulationError {
    fn from(e: ConfigError) -> Self {
        SimulationError::Config(e)
    }
}

impl From<GpuError> for SimulationError {
    fn from(e: GpuError) -> Self {
        SimulationError::Gpu(e)
    }
}

impl From<winit::error::EventLoopError> for SimulationError {
    fn from(e: winit::error::EventLoopError) -> Self {
        SimulationError::EventLoop(e)
    }
}
