/// Graphics device module - the trait seam between the frame subsystem and a GPU backend

// Module declarations
pub mod graphics_device;
pub mod buffer;
pub mod sync;
pub mod command_list;
pub mod pipeline;
pub mod frame_buffer;
pub mod swapchain;

// Re-export everything from graphics_device.rs
pub use graphics_device::*;

// Re-export from other modules
pub use buffer::*;
pub use sync::*;
pub use command_list::*;
pub use pipeline::*;
pub use frame_buffer::*;
pub use swapchain::*;

// Mock graphics device for tests (no GPU required)
#[cfg(test)]
pub mod mock_graphics_device;
