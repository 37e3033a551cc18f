/// GpuContext - the Vulkan objects every resource in this backend shares
///
/// Owns the instance, the window surface, the logical device, the queues and
/// the memory allocator. Resources hold an `Arc<GpuContext>`, so the context
/// is destroyed only after the last buffer, fence or swapchain is gone.

use ash::vk;
use gpu_allocator::vulkan::Allocator;
use lumen_engine::engine_error;
use std::mem::ManuallyDrop;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// Validation-layer messenger and the loader that created it
pub(crate) struct DebugMessenger {
    pub(crate) loader: ash::ext::debug_utils::Instance,
    pub(crate) messenger: vk::DebugUtilsMessengerEXT,
}

/// Shared GPU context for all Vulkan resources
pub struct GpuContext {
    /// Kept alive for the lifetime of the instance (owns the loaded library)
    #[allow(dead_code)]
    pub(crate) entry: ash::Entry,
    pub(crate) instance: ash::Instance,
    pub(crate) debug: Option<DebugMessenger>,

    pub(crate) surface_loader: ash::khr::surface::Instance,
    pub(crate) surface: vk::SurfaceKHR,
    /// Format every swapchain and the render pass are created with
    pub(crate) surface_format: vk::SurfaceFormatKHR,

    pub(crate) physical_device: vk::PhysicalDevice,
    pub(crate) device: ash::Device,

    pub(crate) graphics_queue: vk::Queue,
    pub(crate) graphics_queue_family: u32,
    pub(crate) present_queue: vk::Queue,

    /// Wrapped in ManuallyDrop so it is dropped BEFORE the device is destroyed
    pub(crate) allocator: ManuallyDrop<Mutex<Allocator>>,

    /// Buffers whose allocation has not been freed yet
    live_buffers: AtomicUsize,
}

impl GpuContext {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        entry: ash::Entry,
        instance: ash::Instance,
        debug: Option<DebugMessenger>,
        surface_loader: ash::khr::surface::Instance,
        surface: vk::SurfaceKHR,
        surface_format: vk::SurfaceFormatKHR,
        physical_device: vk::PhysicalDevice,
        device: ash::Device,
        graphics_queue: vk::Queue,
        graphics_queue_family: u32,
        present_queue: vk::Queue,
        allocator: Allocator,
    ) -> Self {
        Self {
            entry,
            instance,
            debug,
            surface_loader,
            surface,
            surface_format,
            physical_device,
            device,
            graphics_queue,
            graphics_queue_family,
            present_queue,
            allocator: ManuallyDrop::new(Mutex::new(allocator)),
            live_buffers: AtomicUsize::new(0),
        }
    }

    pub(crate) fn buffer_allocated(&self) {
        self.live_buffers.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn buffer_freed(&self) {
        self.live_buffers.fetch_sub(1, Ordering::Relaxed);
    }

    pub(crate) fn live_buffers(&self) -> usize {
        self.live_buffers.load(Ordering::Relaxed)
    }
}

impl Drop for GpuContext {
    fn drop(&mut self) {
        unsafe {
            // Wait for GPU to finish all work
            if let Err(e) = self.device.device_wait_idle() {
                engine_error!("lumen::vulkan", "device_wait_idle during teardown failed: {:?}", e);
            }

            let leaked = self.live_buffers();
            if leaked > 0 {
                engine_error!("lumen::vulkan", "{} buffer allocation(s) still alive at device teardown", leaked);
            }

            // Allocator must go before the device it allocated from
            ManuallyDrop::drop(&mut self.allocator);

            self.device.destroy_device(None);
            self.surface_loader.destroy_surface(self.surface, None);

            if let Some(debug) = self.debug.take() {
                debug.loader.destroy_debug_utils_messenger(debug.messenger, None);
            }

            self.instance.destroy_instance(None);
        }
    }
}
