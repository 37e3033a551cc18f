/// VulkanGraphicsDevice - Vulkan implementation of the GraphicsDevice trait

use lumen_engine::lumen::{Config, Error, Result};
use lumen_engine::lumen::device::{
    Buffer as EngineBuffer, BufferDesc, CommandList as EngineCommandList,
    CommandPool as EngineCommandPool, CommandPoolKind, DescriptorSet as EngineDescriptorSet,
    Fence as EngineFence, GraphicsDevice, Semaphore as EngineSemaphore, Submission,
};
use lumen_engine::{engine_debug, engine_error, engine_info, engine_warn};
use ash::vk;
use gpu_allocator::vulkan::{Allocator, AllocatorCreateDesc};
use raw_window_handle::{HasDisplayHandle, HasWindowHandle};
use std::ffi::{CStr, CString};
use std::path::Path;
use std::sync::Arc;

use crate::vulkan_buffer::Buffer;
use crate::vulkan_command_list::{CommandList, CommandPool};
use crate::vulkan_context::{DebugMessenger, GpuContext};
use crate::vulkan_convert::{pipeline_stage_to_vk, vk_error};
use crate::vulkan_descriptor_set::create_uniform_descriptor_sets;
use crate::vulkan_pipeline::Pipeline;
use crate::vulkan_render_pass::RenderPass;
use crate::vulkan_swapchain::{choose_surface_format, Swapchain};
use crate::vulkan_sync::{Fence, Semaphore};

const VALIDATION_LAYER: &CStr = c"VK_LAYER_KHRONOS_validation";

fn init_failed(what: &str, detail: impl std::fmt::Debug) -> Error {
    engine_error!("lumen::vulkan", "Failed to {}: {:?}", what, detail);
    Error::InitializationFailed(format!("failed to {}: {:?}", what, detail))
}

/// Vulkan device implementation
///
/// Owns the shared GPU context (instance, surface, device, queues,
/// allocator). Resources created from it keep the context alive, so it is
/// torn down only after the last of them is dropped.
pub struct VulkanGraphicsDevice {
    ctx: Arc<GpuContext>,
}

impl VulkanGraphicsDevice {
    /// Create the instance, window surface, logical device, queues and allocator
    ///
    /// Validation layers are enabled when the `vulkan-validation` feature is
    /// compiled in and `config.enable_validation` is set.
    pub fn new<W: HasDisplayHandle + HasWindowHandle>(window: &W, config: &Config) -> Result<Self> {
        let validation = cfg!(feature = "vulkan-validation") && config.enable_validation;

        unsafe {
            // Create Vulkan Entry
            let entry = ash::Entry::load().map_err(|e| init_failed("load the Vulkan library", e))?;

            // Application Info
            let application_name = CString::new(config.application_name.as_str())
                .map_err(|e| init_failed("encode the application name", e))?;
            let app_info = vk::ApplicationInfo::default()
                .application_name(&application_name)
                .application_version(vk::make_api_version(0, 1, 0, 0))
                .engine_name(c"Lumen")
                .engine_version(vk::make_api_version(0, 0, 1, 0))
                .api_version(vk::API_VERSION_1_0);

            // Get required extensions
            let display_handle = window
                .display_handle()
                .map_err(|e| init_failed("get the display handle", e))?;
            let mut extension_names = ash_window::enumerate_required_extensions(display_handle.as_raw())
                .map_err(|e| init_failed("query required surface extensions", e))?
                .to_vec();

            // Validation layers, only if the loader actually has them
            let validation = validation && Self::validation_layer_available(&entry);
            let layer_names = if validation {
                extension_names.push(ash::ext::debug_utils::NAME.as_ptr());
                vec![VALIDATION_LAYER.as_ptr()]
            } else {
                vec![]
            };

            let create_info = vk::InstanceCreateInfo::default()
                .application_info(&app_info)
                .enabled_layer_names(&layer_names)
                .enabled_extension_names(&extension_names);

            let instance = entry
                .create_instance(&create_info, None)
                .map_err(|e| init_failed("create the Vulkan instance", e))?;

            let debug = if validation {
                Some(Self::create_debug_messenger(&entry, &instance)?)
            } else {
                None
            };

            // Create Surface (kept for the lifetime of the device)
            let window_handle = window
                .window_handle()
                .map_err(|e| init_failed("get the window handle", e))?;
            let surface = ash_window::create_surface(
                &entry,
                &instance,
                display_handle.as_raw(),
                window_handle.as_raw(),
                None,
            )
            .map_err(|e| init_failed("create the window surface", e))?;
            let surface_loader = ash::khr::surface::Instance::new(&entry, &instance);

            // Pick the first device with graphics and present support
            let physical_devices = instance
                .enumerate_physical_devices()
                .map_err(|e| init_failed("enumerate physical devices", e))?;
            let (physical_device, graphics_family_index, present_family_index) = physical_devices
                .into_iter()
                .find_map(|pd| {
                    Self::find_queue_families(&instance, &surface_loader, surface, pd)
                        .map(|(graphics, present)| (pd, graphics, present))
                })
                .ok_or_else(|| init_failed("find a GPU with graphics and present queues", "none found"))?;

            let properties = instance.get_physical_device_properties(physical_device);
            let device_name = properties
                .device_name_as_c_str()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_else(|_| "unknown".to_string());
            engine_info!("lumen::vulkan", "Using GPU '{}'", device_name);

            let surface_formats = surface_loader
                .get_physical_device_surface_formats(physical_device, surface)
                .map_err(|e| init_failed("query surface formats", e))?;
            let surface_format = choose_surface_format(&surface_formats)
                .ok_or_else(|| init_failed("choose a surface format", "surface reports none"))?;

            // Create Logical Device
            let queue_priorities = [1.0];
            let mut queue_create_infos = vec![vk::DeviceQueueCreateInfo::default()
                .queue_family_index(graphics_family_index)
                .queue_priorities(&queue_priorities)];
            if present_family_index != graphics_family_index {
                queue_create_infos.push(
                    vk::DeviceQueueCreateInfo::default()
                        .queue_family_index(present_family_index)
                        .queue_priorities(&queue_priorities),
                );
            }

            let device_extension_names = [ash::khr::swapchain::NAME.as_ptr()];
            let device_features = vk::PhysicalDeviceFeatures::default();

            let device_create_info = vk::DeviceCreateInfo::default()
                .queue_create_infos(&queue_create_infos)
                .enabled_extension_names(&device_extension_names)
                .enabled_features(&device_features);

            let device = instance
                .create_device(physical_device, &device_create_info, None)
                .map_err(|e| init_failed("create the logical device", e))?;

            let graphics_queue = device.get_device_queue(graphics_family_index, 0);
            let present_queue = device.get_device_queue(present_family_index, 0);

            // Create GPU allocator
            let allocator = Allocator::new(&AllocatorCreateDesc {
                instance: instance.clone(),
                device: device.clone(),
                physical_device,
                debug_settings: Default::default(),
                buffer_device_address: false,
                allocation_sizes: Default::default(),
            })
            .map_err(|e| init_failed("create the GPU allocator", e))?;

            let ctx = Arc::new(GpuContext::new(
                entry,
                instance,
                debug,
                surface_loader,
                surface,
                surface_format,
                physical_device,
                device,
                graphics_queue,
                graphics_family_index,
                present_queue,
                allocator,
            ));

            engine_debug!(
                "lumen::vulkan",
                "Device ready (graphics family {}, present family {}, validation {})",
                graphics_family_index,
                present_family_index,
                validation
            );

            Ok(Self { ctx })
        }
    }

    fn validation_layer_available(entry: &ash::Entry) -> bool {
        let available = unsafe { entry.enumerate_instance_layer_properties() }
            .map(|layers| {
                layers
                    .iter()
                    .any(|layer| layer.layer_name_as_c_str().map_or(false, |name| name == VALIDATION_LAYER))
            })
            .unwrap_or(false);
        if !available {
            engine_warn!("lumen::vulkan", "Validation requested but {:?} is not installed", VALIDATION_LAYER);
        }
        available
    }

    #[cfg(feature = "vulkan-validation")]
    fn create_debug_messenger(entry: &ash::Entry, instance: &ash::Instance) -> Result<DebugMessenger> {
        let loader = ash::ext::debug_utils::Instance::new(entry, instance);
        crate::debug::reset_validation_stats();
        let messenger = unsafe {
            loader
                .create_debug_utils_messenger(&crate::debug::messenger_create_info(), None)
                .map_err(|e| init_failed("create the debug messenger", e))?
        };
        Ok(DebugMessenger { loader, messenger })
    }

    #[cfg(not(feature = "vulkan-validation"))]
    fn create_debug_messenger(_entry: &ash::Entry, _instance: &ash::Instance) -> Result<DebugMessenger> {
        Err(Error::InitializationFailed("built without the vulkan-validation feature".to_string()))
    }

    /// Graphics and present queue family indices of `physical_device`, if it has both
    fn find_queue_families(
        instance: &ash::Instance,
        surface_loader: &ash::khr::surface::Instance,
        surface: vk::SurfaceKHR,
        physical_device: vk::PhysicalDevice,
    ) -> Option<(u32, u32)> {
        let queue_families = unsafe { instance.get_physical_device_queue_family_properties(physical_device) };

        let graphics = queue_families
            .iter()
            .position(|qf| qf.queue_flags.contains(vk::QueueFlags::GRAPHICS))? as u32;

        let supports_present = |index: u32| unsafe {
            surface_loader
                .get_physical_device_surface_support(physical_device, index, surface)
                .unwrap_or(false)
        };
        // Prefer presenting from the graphics family
        let present = if supports_present(graphics) {
            graphics
        } else {
            (0..queue_families.len() as u32).find(|&i| supports_present(i))?
        };

        Some((graphics, present))
    }

    /// Render pass with one color attachment in the surface format
    pub fn create_render_pass(&self) -> Result<Arc<RenderPass>> {
        Ok(Arc::new(RenderPass::new(self.ctx.clone(), self.ctx.surface_format.format)?))
    }

    /// Swapchain for the window surface with one framebuffer per image
    pub fn create_swapchain(&self, render_pass: &Arc<RenderPass>, width: u32, height: u32) -> Result<Swapchain> {
        Swapchain::new(self.ctx.clone(), render_pass.clone(), width, height)
    }

    /// Graphics pipeline from vertex and fragment SPIR-V files
    pub fn create_pipeline(
        &self,
        render_pass: &RenderPass,
        vertex_shader: &Path,
        fragment_shader: &Path,
    ) -> Result<Arc<Pipeline>> {
        Ok(Arc::new(Pipeline::new(self.ctx.clone(), render_pass, vertex_shader, fragment_shader)?))
    }

    /// One descriptor set per uniform buffer, in frame-slot order
    pub fn create_descriptor_sets(
        &self,
        pipeline: &Pipeline,
        uniform_buffers: &[&dyn EngineBuffer],
    ) -> Result<Vec<Arc<dyn EngineDescriptorSet>>> {
        create_uniform_descriptor_sets(self.ctx.clone(), pipeline, uniform_buffers)
    }

    /// Surface format chosen at device creation
    pub fn surface_format(&self) -> vk::Format {
        self.ctx.surface_format.format
    }
}

fn vk_semaphore(semaphore: &dyn EngineSemaphore) -> Result<vk::Semaphore> {
    semaphore
        .as_any()
        .downcast_ref::<Semaphore>()
        .map(|s| s.semaphore)
        .ok_or_else(|| Error::InvalidResource("semaphore was not created by the Vulkan backend".to_string()))
}

fn vk_fence(fence: &dyn EngineFence) -> Result<vk::Fence> {
    fence
        .as_any()
        .downcast_ref::<Fence>()
        .map(|f| f.fence)
        .ok_or_else(|| Error::InvalidResource("fence was not created by the Vulkan backend".to_string()))
}

fn vk_command_buffer(command_list: &dyn EngineCommandList) -> Result<vk::CommandBuffer> {
    command_list
        .as_any()
        .downcast_ref::<CommandList>()
        .map(|c| c.command_buffer)
        .ok_or_else(|| Error::InvalidResource("command list was not created by the Vulkan backend".to_string()))
}

impl GraphicsDevice for VulkanGraphicsDevice {
    fn create_buffer(&self, desc: &BufferDesc) -> Result<Box<dyn EngineBuffer>> {
        Ok(Box::new(Buffer::new(self.ctx.clone(), desc)?))
    }

    fn create_semaphore(&self) -> Result<Box<dyn EngineSemaphore>> {
        Ok(Box::new(Semaphore::new(self.ctx.clone())?))
    }

    fn create_fence(&self, signaled: bool) -> Result<Box<dyn EngineFence>> {
        Ok(Box::new(Fence::new(self.ctx.clone(), signaled)?))
    }

    fn create_command_pool(&self, kind: CommandPoolKind) -> Result<Arc<dyn EngineCommandPool>> {
        Ok(Arc::new(CommandPool::new(self.ctx.clone(), kind)?))
    }

    fn submit(&self, submission: &Submission<'_>) -> Result<()> {
        let command_buffers = submission
            .command_lists
            .iter()
            .map(|list| vk_command_buffer(*list))
            .collect::<Result<Vec<_>>>()?;

        let mut wait_semaphores = Vec::with_capacity(1);
        let mut wait_stages = Vec::with_capacity(1);
        if let Some(wait) = &submission.wait {
            wait_semaphores.push(vk_semaphore(wait.semaphore)?);
            wait_stages.push(pipeline_stage_to_vk(wait.stage));
        }

        let signal_semaphores = submission
            .signal
            .map(vk_semaphore)
            .transpose()?
            .into_iter()
            .collect::<Vec<_>>();

        let fence = submission.fence.map(vk_fence).transpose()?.unwrap_or_else(vk::Fence::null);

        let submit_info = vk::SubmitInfo::default()
            .wait_semaphores(&wait_semaphores)
            .wait_dst_stage_mask(&wait_stages)
            .command_buffers(&command_buffers)
            .signal_semaphores(&signal_semaphores);

        unsafe {
            self.ctx
                .device
                .queue_submit(self.ctx.graphics_queue, std::slice::from_ref(&submit_info), fence)
                .map_err(|e| vk_error(e, "queue_submit"))
        }
    }

    fn queue_wait_idle(&self) -> Result<()> {
        unsafe {
            self.ctx
                .device
                .queue_wait_idle(self.ctx.graphics_queue)
                .map_err(|e| vk_error(e, "queue_wait_idle"))
        }
    }

    fn wait_idle(&self) -> Result<()> {
        unsafe {
            self.ctx
                .device
                .device_wait_idle()
                .map_err(|e| vk_error(e, "device_wait_idle"))
        }
    }

    fn live_allocations(&self) -> usize {
        self.ctx.live_buffers()
    }
}
