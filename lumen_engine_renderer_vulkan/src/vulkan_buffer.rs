/// Buffer - Vulkan implementation of the Buffer trait

use lumen_engine::lumen::{Error, Result};
use lumen_engine::lumen::device::{Buffer as EngineBuffer, BufferDesc, BufferUsage, MemoryLocation};
use lumen_engine::{engine_error, engine_warn};
use ash::vk;
use gpu_allocator::vulkan::{Allocation, AllocationCreateDesc, AllocationScheme};
use std::any::Any;
use std::sync::Arc;

use crate::vulkan_context::GpuContext;
use crate::vulkan_convert::{buffer_usage_to_vk, memory_location_to_gpu_allocator, vk_error};

/// Vulkan buffer implementation
///
/// Host-visible allocations are persistently mapped by gpu-allocator, so
/// `map` only hands out the existing pointer.
pub struct Buffer {
    /// Shared GPU context (device, allocator)
    ctx: Arc<GpuContext>,
    /// Vulkan buffer
    pub(crate) buffer: vk::Buffer,
    /// GPU memory allocation
    allocation: Option<Allocation>,
    size: u64,
    usage: BufferUsage,
    location: MemoryLocation,
    mapped: bool,
}

impl Buffer {
    /// Create a buffer and bind it to a fresh allocation
    pub(crate) fn new(ctx: Arc<GpuContext>, desc: &BufferDesc) -> Result<Self> {
        unsafe {
            let buffer_info = vk::BufferCreateInfo::default()
                .size(desc.size)
                .usage(buffer_usage_to_vk(desc.usage))
                .sharing_mode(vk::SharingMode::EXCLUSIVE);

            let buffer = ctx
                .device
                .create_buffer(&buffer_info, None)
                .map_err(|e| vk_error(e, &format!("create_buffer '{}'", desc.name)))?;

            let requirements = ctx.device.get_buffer_memory_requirements(buffer);

            let allocation = {
                let mut allocator = match ctx.allocator.lock() {
                    Ok(allocator) => allocator,
                    Err(_) => {
                        ctx.device.destroy_buffer(buffer, None);
                        return Err(Error::BackendError("allocator mutex poisoned".to_string()));
                    }
                };
                allocator.allocate(&AllocationCreateDesc {
                    name: &desc.name,
                    requirements,
                    location: memory_location_to_gpu_allocator(desc.location),
                    linear: true,
                    allocation_scheme: AllocationScheme::GpuAllocatorManaged,
                })
            };

            let allocation = match allocation {
                Ok(allocation) => allocation,
                Err(e) => {
                    engine_error!("lumen::vulkan", "Failed to allocate memory for '{}' ({} bytes): {:?}", desc.name, desc.size, e);
                    ctx.device.destroy_buffer(buffer, None);
                    return Err(Error::OutOfMemory);
                }
            };

            if let Err(e) = ctx
                .device
                .bind_buffer_memory(buffer, allocation.memory(), allocation.offset())
            {
                if let Ok(mut allocator) = ctx.allocator.lock() {
                    allocator.free(allocation).ok();
                }
                ctx.device.destroy_buffer(buffer, None);
                return Err(vk_error(e, &format!("bind_buffer_memory '{}'", desc.name)));
            }

            ctx.buffer_allocated();

            Ok(Self {
                ctx,
                buffer,
                allocation: Some(allocation),
                size: desc.size,
                usage: desc.usage,
                location: desc.location,
                mapped: false,
            })
        }
    }

    fn allocation_ptr(&self) -> Option<*mut u8> {
        self.allocation
            .as_ref()
            .and_then(Allocation::mapped_ptr)
            .map(|ptr| ptr.as_ptr() as *mut u8)
    }
}

impl EngineBuffer for Buffer {
    fn size(&self) -> u64 {
        self.size
    }

    fn usage(&self) -> BufferUsage {
        self.usage
    }

    fn location(&self) -> MemoryLocation {
        self.location
    }

    fn map(&mut self) -> Result<*mut u8> {
        if !self.location.is_host_visible() {
            return Err(Error::ResourceState("buffer memory is not host-visible".to_string()));
        }
        let ptr = self
            .allocation_ptr()
            .ok_or_else(|| Error::ResourceState("allocation has no host mapping".to_string()))?;
        self.mapped = true;
        Ok(ptr)
    }

    fn unmap(&mut self) {
        self.mapped = false;
    }

    fn mapped_ptr(&self) -> Option<*mut u8> {
        if self.mapped {
            self.allocation_ptr()
        } else {
            None
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl Drop for Buffer {
    fn drop(&mut self) {
        self.unmap();
        unsafe {
            // Free GPU memory
            if let Some(allocation) = self.allocation.take() {
                // Don't panic if lock fails - we still need to destroy the buffer
                match self.ctx.allocator.lock() {
                    Ok(mut allocator) => {
                        if let Err(e) = allocator.free(allocation) {
                            engine_warn!("lumen::vulkan", "Failed to free buffer allocation: {:?}", e);
                        }
                    }
                    Err(_) => engine_warn!("lumen::vulkan", "Allocator mutex poisoned, leaking allocation"),
                }
                self.ctx.buffer_freed();
            }

            self.ctx.device.destroy_buffer(self.buffer, None);
        }
    }
}
