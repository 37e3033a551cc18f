/// GraphicsDevice trait - factory for GPU resources and owner of the graphics queue

use std::sync::Arc;
use crate::error::Result;
use crate::graphics_device::{
    Buffer, BufferDesc, CommandList, CommandPool, CommandPoolKind, Fence, Semaphore,
};

/// Pipeline stage a semaphore wait applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStage {
    /// Color attachment output (waiting for a swapchain image)
    ColorAttachmentOutput,
    /// Transfer operations
    Transfer,
    /// Start of the pipeline
    TopOfPipe,
}

/// A semaphore the queue waits on before executing a submission
#[derive(Clone, Copy)]
pub struct SemaphoreWait<'a> {
    pub semaphore: &'a dyn Semaphore,
    pub stage: PipelineStage,
}

/// One batch of work for the graphics queue
///
/// An empty `command_lists` slice with a fence is valid and signals the fence
/// once all previously submitted work has completed.
#[derive(Default)]
pub struct Submission<'a> {
    pub command_lists: &'a [&'a dyn CommandList],
    pub wait: Option<SemaphoreWait<'a>>,
    pub signal: Option<&'a dyn Semaphore>,
    pub fence: Option<&'a dyn Fence>,
}

/// Graphics device
///
/// Factory for buffers, sync primitives and command pools, and the owner of
/// the graphics queue. Every resource it returns releases itself on drop.
pub trait GraphicsDevice: Send + Sync {
    /// Create a buffer and bind it to a fresh allocation
    fn create_buffer(&self, desc: &BufferDesc) -> Result<Box<dyn Buffer>>;

    /// Create a binary semaphore
    fn create_semaphore(&self) -> Result<Box<dyn Semaphore>>;

    /// Create a fence, optionally already signaled
    fn create_fence(&self, signaled: bool) -> Result<Box<dyn Fence>>;

    /// Create a command pool on the graphics queue family
    fn create_command_pool(&self, kind: CommandPoolKind) -> Result<Arc<dyn CommandPool>>;

    /// Submit work to the graphics queue
    fn submit(&self, submission: &Submission<'_>) -> Result<()>;

    /// Block until the graphics queue is idle
    fn queue_wait_idle(&self) -> Result<()>;

    /// Block until the whole device is idle
    fn wait_idle(&self) -> Result<()>;

    /// Number of buffer allocations currently alive
    fn live_allocations(&self) -> usize;
}
