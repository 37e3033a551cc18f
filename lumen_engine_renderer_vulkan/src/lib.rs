/*!
# Lumen Engine - Vulkan Backend

Vulkan implementation of the `lumen_engine` graphics-device seam.

This crate implements the lumen_engine device traits (buffers, semaphores,
fences, command pools and lists, swapchain) using the Ash library for Vulkan
bindings and gpu-allocator for memory management. It also builds the
pipeline objects the frame loop binds: the render pass, the graphics
pipeline and the per-frame uniform descriptor sets.

# Example

```no_run
use lumen_engine::lumen::Config;
use lumen_engine_renderer_vulkan::VulkanGraphicsDevice;
# fn run(window: &winit::window::Window) -> lumen_engine::lumen::Result<()> {
let device = VulkanGraphicsDevice::new(window, &Config::default())?;
let render_pass = device.create_render_pass()?;
let swapchain = device.create_swapchain(&render_pass, 750, 900)?;
# Ok(())
# }
```
*/

// Vulkan implementation modules
mod vulkan;
mod vulkan_context;
mod vulkan_convert;
mod vulkan_buffer;
mod vulkan_sync;
mod vulkan_command_list;
mod vulkan_render_pass;
mod vulkan_frame_buffer;
mod vulkan_swapchain;
mod vulkan_shader;
mod vulkan_pipeline;
mod vulkan_descriptor_set;
#[cfg(feature = "vulkan-validation")]
mod debug;

pub use vulkan::VulkanGraphicsDevice;
pub use vulkan_buffer::Buffer as VulkanBuffer;
pub use vulkan_sync::{Fence as VulkanFence, Semaphore as VulkanSemaphore};
pub use vulkan_command_list::{CommandList as VulkanCommandList, CommandPool as VulkanCommandPool};
pub use vulkan_render_pass::RenderPass as VulkanRenderPass;
pub use vulkan_frame_buffer::Framebuffer as VulkanFramebuffer;
pub use vulkan_swapchain::Swapchain as VulkanSwapchain;
pub use vulkan_pipeline::Pipeline as VulkanPipeline;
pub use vulkan_descriptor_set::DescriptorSet as VulkanDescriptorSet;
pub use vulkan_shader::ReflectedUniformBlock;

// Re-export debug utilities
#[cfg(feature = "vulkan-validation")]
pub use debug::{get_validation_stats, print_validation_stats_report, ValidationStats};
