/// Framebuffer - Vulkan implementation of the Framebuffer trait
///
/// Wraps the VkFramebuffer of one swapchain image view. Owned by the
/// swapchain and rebuilt whenever the swapchain is recreated.

use lumen_engine::lumen::Result;
use lumen_engine::lumen::device::Framebuffer as EngineFramebuffer;
use ash::vk;
use std::any::Any;

use crate::vulkan_convert::vk_error;

/// Vulkan framebuffer implementation
///
/// Destroyed when dropped.
pub struct Framebuffer {
    /// Vulkan framebuffer handle
    pub(crate) framebuffer: vk::Framebuffer,
    /// Width in pixels
    width: u32,
    /// Height in pixels
    height: u32,
    /// Vulkan device (for cleanup)
    device: ash::Device,
}

impl Framebuffer {
    pub(crate) fn new(
        device: ash::Device,
        render_pass: vk::RenderPass,
        image_view: vk::ImageView,
        extent: vk::Extent2D,
    ) -> Result<Self> {
        let create_info = vk::FramebufferCreateInfo::default()
            .render_pass(render_pass)
            .attachments(std::slice::from_ref(&image_view))
            .width(extent.width)
            .height(extent.height)
            .layers(1);

        let framebuffer = unsafe {
            device
                .create_framebuffer(&create_info, None)
                .map_err(|e| vk_error(e, "create_framebuffer"))?
        };

        Ok(Self {
            framebuffer,
            width: extent.width,
            height: extent.height,
            device,
        })
    }
}

impl EngineFramebuffer for Framebuffer {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl Drop for Framebuffer {
    fn drop(&mut self) {
        unsafe {
            self.device.destroy_framebuffer(self.framebuffer, None);
        }
    }
}
