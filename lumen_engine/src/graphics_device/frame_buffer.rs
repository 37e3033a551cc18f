/// Framebuffer trait - the attachments of one swapchain image
///
/// Created once per swapchain image and recreated only together with the
/// swapchain (e.g., window resize).

use std::any::Any;

/// Framebuffer for a single swapchain image
pub trait Framebuffer: Send + Sync {
    /// Get the width in pixels
    fn width(&self) -> u32;

    /// Get the height in pixels
    fn height(&self) -> u32;

    /// Downcast support for backends
    fn as_any(&self) -> &dyn Any;
}
