/// Swapchain trait - for window presentation

use std::any::Any;
use crate::error::Result;
use crate::graphics_device::{Extent2D, Framebuffer, Semaphore};

/// Result of a successful image acquisition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AcquiredImage {
    /// Swapchain image index. Unrelated to the frame slot index.
    pub image_index: u32,
    /// The swapchain still works but no longer matches the surface exactly
    pub suboptimal: bool,
}

/// Result of a successful present
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PresentStatus {
    Optimal,
    Suboptimal,
}

/// Swapchain for presenting rendered images to a window
///
/// Owns the presentable images and one framebuffer per image. A stale
/// surface is reported as `Error::SurfaceOutOfDate` by both `acquire_next_image`
/// and `present`.
pub trait Swapchain {
    /// Acquire the next presentable image, signaling `signal` when it is ready
    fn acquire_next_image(&mut self, timeout_ns: u64, signal: &dyn Semaphore) -> Result<AcquiredImage>;

    /// Present `image_index` once `wait` is signaled
    fn present(&mut self, image_index: u32, wait: &dyn Semaphore) -> Result<PresentStatus>;

    /// Recreate the swapchain and its framebuffers (e.g., after window resize)
    ///
    /// The caller must ensure no GPU work still references the old images.
    fn recreate(&mut self, width: u32, height: u32) -> Result<()>;

    /// Framebuffer for a swapchain image
    ///
    /// # Errors
    ///
    /// Returns `InvalidResource` if `image_index >= image_count()`.
    fn framebuffer(&self, image_index: u32) -> Result<&dyn Framebuffer>;

    /// Current image extent
    fn extent(&self) -> Extent2D;

    /// Number of presentable images (M)
    fn image_count(&self) -> usize;

    /// Downcast support for backends
    fn as_any(&self) -> &dyn Any;
}
