/// Swapchain - Vulkan implementation of the Swapchain trait
///
/// Manages presentation to the window: image acquisition, presentation,
/// one framebuffer per swapchain image, and recreation on resize. Frame
/// synchronization primitives are owned by the caller and passed in.

use lumen_engine::lumen::{Error, Result};
use lumen_engine::lumen::device::{
    AcquiredImage, Extent2D, Framebuffer as EngineFramebuffer, PresentStatus,
    Semaphore as EngineSemaphore, Swapchain as EngineSwapchain,
};
use lumen_engine::{engine_debug, engine_error, engine_info};
use ash::vk;
use std::any::Any;
use std::sync::Arc;

use crate::vulkan_context::GpuContext;
use crate::vulkan_convert::vk_error;
use crate::vulkan_frame_buffer::Framebuffer;
use crate::vulkan_render_pass::RenderPass;
use crate::vulkan_sync::Semaphore;

// ============================================================================
// Surface property selection
// ============================================================================

/// Prefer B8G8R8A8_SRGB with the SRGB_NONLINEAR color space, else the first format
pub(crate) fn choose_surface_format(formats: &[vk::SurfaceFormatKHR]) -> Option<vk::SurfaceFormatKHR> {
    formats
        .iter()
        .find(|f| f.format == vk::Format::B8G8R8A8_SRGB && f.color_space == vk::ColorSpaceKHR::SRGB_NONLINEAR)
        .or_else(|| formats.first())
        .copied()
}

/// Surface extent, or the window size clamped to the surface limits
pub(crate) fn choose_extent(capabilities: &vk::SurfaceCapabilitiesKHR, width: u32, height: u32) -> vk::Extent2D {
    if capabilities.current_extent.width != u32::MAX {
        return capabilities.current_extent;
    }
    vk::Extent2D {
        width: width.clamp(capabilities.min_image_extent.width, capabilities.max_image_extent.width),
        height: height.clamp(capabilities.min_image_extent.height, capabilities.max_image_extent.height),
    }
}

/// One image more than the minimum, capped by the maximum (0 means no limit)
pub(crate) fn choose_image_count(capabilities: &vk::SurfaceCapabilitiesKHR) -> u32 {
    let count = capabilities.min_image_count + 1;
    if capabilities.max_image_count > 0 {
        count.min(capabilities.max_image_count)
    } else {
        count
    }
}

fn downcast_semaphore(semaphore: &dyn EngineSemaphore) -> Result<vk::Semaphore> {
    semaphore
        .as_any()
        .downcast_ref::<Semaphore>()
        .map(|s| s.semaphore)
        .ok_or_else(|| Error::InvalidResource("semaphore was not created by the Vulkan backend".to_string()))
}

// ============================================================================
// Swapchain
// ============================================================================

/// Vulkan swapchain implementation
pub struct Swapchain {
    ctx: Arc<GpuContext>,
    render_pass: Arc<RenderPass>,

    swapchain_loader: ash::khr::swapchain::Device,
    swapchain: vk::SwapchainKHR,
    swapchain_images: Vec<vk::Image>,
    swapchain_image_views: Vec<vk::ImageView>,
    framebuffers: Vec<Framebuffer>,
    swapchain_extent: vk::Extent2D,
}

impl Swapchain {
    /// Create a swapchain for the device's surface with one framebuffer per image
    pub(crate) fn new(ctx: Arc<GpuContext>, render_pass: Arc<RenderPass>, width: u32, height: u32) -> Result<Self> {
        let swapchain_loader = ash::khr::swapchain::Device::new(&ctx.instance, &ctx.device);

        let mut swapchain = Self {
            ctx,
            render_pass,
            swapchain_loader,
            swapchain: vk::SwapchainKHR::null(),
            swapchain_images: Vec::new(),
            swapchain_image_views: Vec::new(),
            framebuffers: Vec::new(),
            swapchain_extent: vk::Extent2D { width: 0, height: 0 },
        };
        swapchain.build(width, height).map_err(|e| {
            engine_error!("lumen::vulkan", "Failed to create swapchain: {}", e);
            Error::InitializationFailed(format!("swapchain: {}", e))
        })?;

        engine_info!(
            "lumen::vulkan",
            "Swapchain created: {}x{}, {} images",
            swapchain.swapchain_extent.width,
            swapchain.swapchain_extent.height,
            swapchain.swapchain_images.len()
        );
        Ok(swapchain)
    }

    /// (Re)build the swapchain, reusing the current one as `old_swapchain`
    fn build(&mut self, width: u32, height: u32) -> Result<()> {
        let ctx = self.ctx.clone();
        unsafe {
            let capabilities = ctx
                .surface_loader
                .get_physical_device_surface_capabilities(ctx.physical_device, ctx.surface)
                .map_err(|e| vk_error(e, "get_physical_device_surface_capabilities"))?;

            let extent = choose_extent(&capabilities, width, height);
            if extent.width == 0 || extent.height == 0 {
                // Minimized window, nothing can be presented until it is restored
                return Err(Error::SurfaceOutOfDate);
            }

            let create_info = vk::SwapchainCreateInfoKHR::default()
                .surface(ctx.surface)
                .min_image_count(choose_image_count(&capabilities))
                .image_format(ctx.surface_format.format)
                .image_color_space(ctx.surface_format.color_space)
                .image_extent(extent)
                .image_array_layers(1)
                .image_usage(vk::ImageUsageFlags::COLOR_ATTACHMENT)
                .image_sharing_mode(vk::SharingMode::EXCLUSIVE)
                .pre_transform(capabilities.current_transform)
                .composite_alpha(vk::CompositeAlphaFlagsKHR::OPAQUE)
                .present_mode(vk::PresentModeKHR::FIFO)
                .clipped(true)
                .old_swapchain(self.swapchain);

            let new_swapchain = self
                .swapchain_loader
                .create_swapchain(&create_info, None)
                .map_err(|e| vk_error(e, "create_swapchain"))?;

            self.destroy_image_resources();
            if self.swapchain != vk::SwapchainKHR::null() {
                self.swapchain_loader.destroy_swapchain(self.swapchain, None);
            }
            self.swapchain = new_swapchain;
            self.swapchain_extent = extent;

            self.swapchain_images = self
                .swapchain_loader
                .get_swapchain_images(self.swapchain)
                .map_err(|e| vk_error(e, "get_swapchain_images"))?;

            for &image in &self.swapchain_images {
                let view_info = vk::ImageViewCreateInfo::default()
                    .image(image)
                    .view_type(vk::ImageViewType::TYPE_2D)
                    .format(ctx.surface_format.format)
                    .components(vk::ComponentMapping {
                        r: vk::ComponentSwizzle::IDENTITY,
                        g: vk::ComponentSwizzle::IDENTITY,
                        b: vk::ComponentSwizzle::IDENTITY,
                        a: vk::ComponentSwizzle::IDENTITY,
                    })
                    .subresource_range(vk::ImageSubresourceRange {
                        aspect_mask: vk::ImageAspectFlags::COLOR,
                        base_mip_level: 0,
                        level_count: 1,
                        base_array_layer: 0,
                        layer_count: 1,
                    });
                let view = ctx
                    .device
                    .create_image_view(&view_info, None)
                    .map_err(|e| vk_error(e, "create_image_view"))?;
                self.swapchain_image_views.push(view);
            }

            for &view in &self.swapchain_image_views {
                self.framebuffers.push(Framebuffer::new(
                    ctx.device.clone(),
                    self.render_pass.render_pass,
                    view,
                    extent,
                )?);
            }
        }
        Ok(())
    }

    /// Framebuffers first, then the views they reference
    fn destroy_image_resources(&mut self) {
        self.framebuffers.clear();
        unsafe {
            for view in self.swapchain_image_views.drain(..) {
                self.ctx.device.destroy_image_view(view, None);
            }
        }
        self.swapchain_images.clear();
    }

    /// Pixel format of the swapchain images
    pub fn format(&self) -> vk::Format {
        self.ctx.surface_format.format
    }
}

impl EngineSwapchain for Swapchain {
    fn acquire_next_image(&mut self, timeout_ns: u64, signal: &dyn EngineSemaphore) -> Result<AcquiredImage> {
        let semaphore = downcast_semaphore(signal)?;
        unsafe {
            let (image_index, suboptimal) = self
                .swapchain_loader
                .acquire_next_image(self.swapchain, timeout_ns, semaphore, vk::Fence::null())
                .map_err(|e| vk_error(e, "acquire_next_image"))?;
            Ok(AcquiredImage { image_index, suboptimal })
        }
    }

    fn present(&mut self, image_index: u32, wait: &dyn EngineSemaphore) -> Result<PresentStatus> {
        let wait_semaphore = downcast_semaphore(wait)?;
        let swapchains = [self.swapchain];
        let image_indices = [image_index];
        let wait_semaphores = [wait_semaphore];

        let present_info = vk::PresentInfoKHR::default()
            .wait_semaphores(&wait_semaphores)
            .swapchains(&swapchains)
            .image_indices(&image_indices);

        unsafe {
            let suboptimal = self
                .swapchain_loader
                .queue_present(self.ctx.present_queue, &present_info)
                .map_err(|e| vk_error(e, "queue_present"))?;
            Ok(if suboptimal {
                PresentStatus::Suboptimal
            } else {
                PresentStatus::Optimal
            })
        }
    }

    fn recreate(&mut self, width: u32, height: u32) -> Result<()> {
        unsafe {
            self.ctx
                .device
                .device_wait_idle()
                .map_err(|e| vk_error(e, "device_wait_idle before swapchain recreate"))?;
        }
        self.build(width, height)?;
        engine_debug!(
            "lumen::vulkan",
            "Swapchain recreated: {}x{}",
            self.swapchain_extent.width,
            self.swapchain_extent.height
        );
        Ok(())
    }

    fn framebuffer(&self, image_index: u32) -> Result<&dyn EngineFramebuffer> {
        self.framebuffers
            .get(image_index as usize)
            .map(|fb| fb as &dyn EngineFramebuffer)
            .ok_or_else(|| {
                Error::InvalidResource(format!(
                    "swapchain image {} out of range ({} images)",
                    image_index,
                    self.framebuffers.len()
                ))
            })
    }

    fn extent(&self) -> Extent2D {
        Extent2D {
            width: self.swapchain_extent.width,
            height: self.swapchain_extent.height,
        }
    }

    fn image_count(&self) -> usize {
        self.swapchain_images.len()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl Drop for Swapchain {
    fn drop(&mut self) {
        unsafe {
            if let Err(e) = self.ctx.device.device_wait_idle() {
                engine_error!("lumen::vulkan", "device_wait_idle before swapchain teardown failed: {:?}", e);
            }
        }
        self.destroy_image_resources();
        unsafe {
            if self.swapchain != vk::SwapchainKHR::null() {
                self.swapchain_loader.destroy_swapchain(self.swapchain, None);
            }
        }
    }
}

#[cfg(test)]
#[path = "vulkan_swapchain_tests.rs"]
mod tests;
