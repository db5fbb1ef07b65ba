//! Work-group math and indirect draw arguments.
//!
//! The dispatch scheduler turns a population size into a work-group count
//! and owns the per-species [`DispatchArgs`] record that the renderer
//! consumes through `draw_indexed_indirect`, without any host round trip.

use bytemuck::{Pod, Zeroable};

/// Default dispatch granularity; matches `@workgroup_size` in the kernel.
pub const WORKGROUP_SIZE: u32 = 256;

/// Upper bound for configurable granularity. The default wgpu device limit
/// for compute invocations per work-group.
pub const MAX_GRANULARITY: u32 = 256;

/// Number of work-groups needed to cover `population` agents at the given
/// granularity.
pub fn group_count(population: u32, granularity: u32) -> u32 {
    population.div_ceil(granularity)
}

/// Standard indirect draw argument layout, five unsigned 32-bit fields.
///
/// `instance_count` is fixed to the population size determined at setup and
/// is never re-derived: the simulation commits to a fixed population for
/// its lifetime.
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct DispatchArgs {
    pub index_count_per_instance: u32,
    pub instance_count: u32,
    pub start_index_location: u32,
    pub base_vertex_location: u32,
    pub start_instance_location: u32,
}

impl DispatchArgs {
    /// Arguments for drawing `instance_count` copies of a mesh with
    /// `index_count` indices, reading instances from `first_instance`
    /// onward in the shared agent buffer.
    pub fn for_species(index_count: u32, instance_count: u32, first_instance: u32) -> Self {
        Self {
            index_count_per_instance: index_count,
            instance_count,
            start_index_location: 0,
            base_vertex_location: 0,
            start_instance_location: first_instance,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn group_count_rounds_up() {
        assert_eq!(group_count(2048, 1024), 2);
        assert_eq!(group_count(16, 16), 1);
        assert_eq!(group_count(17, 16), 2);
    }

    #[test]
    fn group_count_exact_multiple() {
        assert_eq!(group_count(2048, 256), 8);
        assert_eq!(group_count(1, 256), 1);
    }

    #[test]
    fn dispatch_args_layout() {
        assert_eq!(std::mem::size_of::<DispatchArgs>(), 20);
        let args = DispatchArgs::for_species(12, 2048, 0);
        assert_eq!(args.index_count_per_instance, 12);
        assert_eq!(args.instance_count, 2048);
        assert_eq!(args.start_instance_location, 0);
    }
}
