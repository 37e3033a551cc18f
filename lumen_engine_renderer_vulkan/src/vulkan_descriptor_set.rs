/// DescriptorSet - per-frame uniform descriptor sets
///
/// One pool sized to the number of frames in flight, one set per frame slot,
/// each pointing at that slot's uniform buffer. The sets are freed with
/// their pool, which lives until the last set is dropped.

use lumen_engine::lumen::{Error, Result};
use lumen_engine::lumen::device::{Buffer as EngineBuffer, DescriptorSet as EngineDescriptorSet};
use lumen_engine::lumen::frame::UniformBufferObject;
use lumen_engine::engine_debug;
use ash::vk;
use std::any::Any;
use std::sync::Arc;

use crate::vulkan_buffer::Buffer;
use crate::vulkan_context::GpuContext;
use crate::vulkan_convert::vk_error;
use crate::vulkan_pipeline::Pipeline;

/// Descriptor pool, destroyed together with all its sets
struct DescriptorPool {
    ctx: Arc<GpuContext>,
    pool: vk::DescriptorPool,
}

impl Drop for DescriptorPool {
    fn drop(&mut self) {
        unsafe {
            self.ctx.device.destroy_descriptor_pool(self.pool, None);
        }
    }
}

/// Vulkan descriptor set implementation
pub struct DescriptorSet {
    /// Keeps the pool the set was allocated from alive
    _pool: Arc<DescriptorPool>,
    pub(crate) descriptor_set: vk::DescriptorSet,
}

impl EngineDescriptorSet for DescriptorSet {
    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Allocate one descriptor set per uniform buffer, in slot order
pub(crate) fn create_uniform_descriptor_sets(
    ctx: Arc<GpuContext>,
    pipeline: &Pipeline,
    uniform_buffers: &[&dyn EngineBuffer],
) -> Result<Vec<Arc<dyn EngineDescriptorSet>>> {
    let count = uniform_buffers.len() as u32;
    if count == 0 {
        return Err(Error::InvalidResource("no uniform buffers to describe".to_string()));
    }

    unsafe {
        let pool_size = vk::DescriptorPoolSize::default()
            .ty(vk::DescriptorType::UNIFORM_BUFFER)
            .descriptor_count(count);

        let pool_handle = ctx
            .device
            .create_descriptor_pool(
                &vk::DescriptorPoolCreateInfo::default()
                    .pool_sizes(std::slice::from_ref(&pool_size))
                    .max_sets(count),
                None,
            )
            .map_err(|e| vk_error(e, "create_descriptor_pool"))?;
        let pool = Arc::new(DescriptorPool {
            ctx: ctx.clone(),
            pool: pool_handle,
        });

        let layouts = vec![pipeline.descriptor_set_layout; count as usize];
        let sets = ctx
            .device
            .allocate_descriptor_sets(
                &vk::DescriptorSetAllocateInfo::default()
                    .descriptor_pool(pool.pool)
                    .set_layouts(&layouts),
            )
            .map_err(|e| vk_error(e, "allocate_descriptor_sets"))?;

        let mut descriptor_sets: Vec<Arc<dyn EngineDescriptorSet>> = Vec::with_capacity(sets.len());
        for (slot, (set, buffer)) in sets.into_iter().zip(uniform_buffers.iter()).enumerate() {
            let buffer = buffer.as_any().downcast_ref::<Buffer>().ok_or_else(|| {
                Error::InvalidResource(format!("uniform buffer {} is not a Vulkan buffer", slot))
            })?;

            let buffer_info = vk::DescriptorBufferInfo::default()
                .buffer(buffer.buffer)
                .offset(0)
                .range(UniformBufferObject::SIZE);

            let write = vk::WriteDescriptorSet::default()
                .dst_set(set)
                .dst_binding(0)
                .dst_array_element(0)
                .descriptor_type(vk::DescriptorType::UNIFORM_BUFFER)
                .buffer_info(std::slice::from_ref(&buffer_info));

            ctx.device.update_descriptor_sets(std::slice::from_ref(&write), &[]);

            descriptor_sets.push(Arc::new(DescriptorSet {
                _pool: pool.clone(),
                descriptor_set: set,
            }));
        }

        engine_debug!("lumen::vulkan", "Allocated {} uniform descriptor sets", descriptor_sets.len());
        Ok(descriptor_sets)
    }
}
