/// Semaphore and Fence - Vulkan implementations of the sync traits

use lumen_engine::lumen::Result;
use lumen_engine::lumen::device::{Fence as EngineFence, Semaphore as EngineSemaphore};
use ash::vk;
use std::any::Any;
use std::sync::Arc;

use crate::vulkan_context::GpuContext;
use crate::vulkan_convert::vk_error;

/// Binary semaphore, destroyed on drop
pub struct Semaphore {
    ctx: Arc<GpuContext>,
    pub(crate) semaphore: vk::Semaphore,
}

impl Semaphore {
    pub(crate) fn new(ctx: Arc<GpuContext>) -> Result<Self> {
        let semaphore = unsafe {
            ctx.device
                .create_semaphore(&vk::SemaphoreCreateInfo::default(), None)
                .map_err(|e| vk_error(e, "create_semaphore"))?
        };
        Ok(Self { ctx, semaphore })
    }
}

impl EngineSemaphore for Semaphore {
    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl Drop for Semaphore {
    fn drop(&mut self) {
        unsafe {
            self.ctx.device.destroy_semaphore(self.semaphore, None);
        }
    }
}

/// Fence, destroyed on drop
pub struct Fence {
    ctx: Arc<GpuContext>,
    pub(crate) fence: vk::Fence,
}

impl Fence {
    pub(crate) fn new(ctx: Arc<GpuContext>, signaled: bool) -> Result<Self> {
        let flags = if signaled {
            vk::FenceCreateFlags::SIGNALED
        } else {
            vk::FenceCreateFlags::empty()
        };
        let fence = unsafe {
            ctx.device
                .create_fence(&vk::FenceCreateInfo::default().flags(flags), None)
                .map_err(|e| vk_error(e, "create_fence"))?
        };
        Ok(Self { ctx, fence })
    }
}

impl EngineFence for Fence {
    fn wait(&self, timeout_ns: u64) -> Result<()> {
        unsafe {
            self.ctx
                .device
                .wait_for_fences(&[self.fence], true, timeout_ns)
                .map_err(|e| vk_error(e, "wait_for_fences"))
        }
    }

    fn reset(&self) -> Result<()> {
        unsafe {
            self.ctx
                .device
                .reset_fences(&[self.fence])
                .map_err(|e| vk_error(e, "reset_fences"))
        }
    }

    fn is_signaled(&self) -> Result<bool> {
        unsafe {
            self.ctx
                .device
                .get_fence_status(self.fence)
                .map_err(|e| vk_error(e, "get_fence_status"))
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl Drop for Fence {
    fn drop(&mut self) {
        unsafe {
            self.ctx.device.destroy_fence(self.fence, None);
        }
    }
}
