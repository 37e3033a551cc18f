/// CommandList and CommandPool traits - for recording and allocating GPU commands

use std::any::Any;
use std::sync::Arc;
use crate::error::Result;
use crate::graphics_device::{
    Buffer, DescriptorSet, Framebuffer, IndexType, Pipeline, RenderPass,
};

/// Viewport for rendering
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub min_depth: f32,
    pub max_depth: f32,
}

impl Viewport {
    /// Full-extent viewport with the standard [0, 1] depth range
    pub fn from_extent(extent: Extent2D) -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            width: extent.width as f32,
            height: extent.height as f32,
            min_depth: 0.0,
            max_depth: 1.0,
        }
    }
}

/// 2D rectangle for scissor and render area
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect2D {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl Rect2D {
    /// Rectangle at the origin covering `extent`
    pub fn from_extent(extent: Extent2D) -> Self {
        Self {
            x: 0,
            y: 0,
            width: extent.width,
            height: extent.height,
        }
    }
}

/// Width and height in pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Extent2D {
    pub width: u32,
    pub height: u32,
}

/// Clear value for attachments
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ClearValue {
    /// Color clear value (RGBA)
    Color([f32; 4]),
    /// Depth/stencil clear value
    DepthStencil { depth: f32, stencil: u32 },
}

/// How a recording is going to be submitted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandListUsage {
    /// Recorded, submitted once, then reset or freed
    OneTimeSubmit,
    /// Recorded and reset by the owner every frame
    Reusable,
}

/// Command list for recording GPU commands
///
/// Commands are recorded and later submitted via `GraphicsDevice::submit()`.
pub trait CommandList: Send {
    /// Discard previous contents and return to the initial state
    fn reset(&mut self) -> Result<()>;

    /// Begin recording commands
    fn begin(&mut self, usage: CommandListUsage) -> Result<()>;

    /// End recording commands
    fn end(&mut self) -> Result<()>;

    /// Begin a render pass on `framebuffer`
    fn begin_render_pass(
        &mut self,
        render_pass: &dyn RenderPass,
        framebuffer: &dyn Framebuffer,
        render_area: Rect2D,
        clear_values: &[ClearValue],
    ) -> Result<()>;

    /// End the current render pass
    fn end_render_pass(&mut self) -> Result<()>;

    /// Bind a graphics pipeline
    fn bind_pipeline(&mut self, pipeline: &dyn Pipeline) -> Result<()>;

    /// Set the dynamic viewport
    fn set_viewport(&mut self, viewport: Viewport) -> Result<()>;

    /// Set the dynamic scissor rectangle
    fn set_scissor(&mut self, scissor: Rect2D) -> Result<()>;

    /// Bind a vertex buffer to binding 0
    fn bind_vertex_buffer(&mut self, buffer: &dyn Buffer, offset: u64) -> Result<()>;

    /// Bind an index buffer
    fn bind_index_buffer(&mut self, buffer: &dyn Buffer, offset: u64, index_type: IndexType) -> Result<()>;

    /// Bind a descriptor set at `set_index` of the pipeline layout
    fn bind_descriptor_set(
        &mut self,
        pipeline: &dyn Pipeline,
        set_index: u32,
        descriptor_set: &dyn DescriptorSet,
    ) -> Result<()>;

    /// Issue an indexed draw
    fn draw_indexed(
        &mut self,
        index_count: u32,
        instance_count: u32,
        first_index: u32,
        vertex_offset: i32,
        first_instance: u32,
    ) -> Result<()>;

    /// Copy `size` bytes from the start of `src` to the start of `dst`
    fn copy_buffer(&mut self, src: &dyn Buffer, dst: &dyn Buffer, size: u64) -> Result<()>;

    /// Downcast support for backends
    fn as_any(&self) -> &dyn Any;
}

/// Kind of command pool
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandPoolKind {
    /// Command lists are reset individually and re-recorded every frame
    ResetIndividual,
    /// Short-lived command lists (uploads)
    Transient,
}

/// Pool that command lists are allocated from
///
/// Command lists keep their pool alive, so the pool is always destroyed
/// after the last list allocated from it.
pub trait CommandPool: Send + Sync {
    /// Allocate `count` primary command lists
    fn allocate(self: Arc<Self>, count: usize) -> Result<Vec<Box<dyn CommandList>>>;

    /// Kind the pool was created with
    fn kind(&self) -> CommandPoolKind;

    /// Downcast support for backends
    fn as_any(&self) -> &dyn Any;
}
