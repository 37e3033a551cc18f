/// Mock graphics device for unit tests (no GPU required)
///
/// Every resource shares one `MockState` that records an event log, the
/// commands recorded into each command list, and outstanding resource counts.
/// Submissions stay pending until something waits for them: a fence wait
/// retires pending work in submission order up to the submission that owns
/// the fence, which is how a real queue retires work. Waiting on a fence that
/// no pending submission will ever signal fails with `Error::Timeout` instead
/// of hanging the test.

use std::any::Any;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};
use rustc_hash::FxHashMap;

use crate::error::{Error, Result};
use crate::graphics_device::{
    AcquiredImage, Buffer, BufferDesc, BufferUsage, ClearValue, CommandList, CommandListUsage,
    CommandPool, CommandPoolKind, DescriptorSet, Extent2D, Fence, Framebuffer, GraphicsDevice,
    IndexType, MemoryLocation, Pipeline, PresentStatus, Rect2D, RenderPass, Semaphore,
    Submission, Swapchain, Viewport,
};

/// Identifier handed out to every mock resource
pub type ResourceId = u64;

// ============================================================================
// Recorded commands and events
// ============================================================================

/// A command recorded into a mock command list
#[derive(Debug, Clone, PartialEq)]
pub enum MockCommand {
    Begin(CommandListUsage),
    End,
    BeginRenderPass {
        framebuffer: ResourceId,
        render_area: Rect2D,
        clear_values: Vec<ClearValue>,
    },
    EndRenderPass,
    BindPipeline(ResourceId),
    SetViewport(Viewport),
    SetScissor(Rect2D),
    BindVertexBuffer { buffer: ResourceId, offset: u64 },
    BindIndexBuffer { buffer: ResourceId, offset: u64, index_type: IndexType },
    BindDescriptorSet { set_index: u32, descriptor_set: ResourceId },
    DrawIndexed {
        index_count: u32,
        instance_count: u32,
        first_index: u32,
        vertex_offset: i32,
        first_instance: u32,
    },
    CopyBuffer { src: ResourceId, dst: ResourceId, size: u64 },
}

/// Something observable that happened on the mock device
#[derive(Debug, Clone, PartialEq)]
pub enum MockEvent {
    BufferCreated { buffer: ResourceId, size: u64, location: MemoryLocation },
    BufferFreed { buffer: ResourceId },
    BufferMapped { buffer: ResourceId },
    BufferUnmapped { buffer: ResourceId },
    FenceWaited { fence: ResourceId },
    FenceReset { fence: ResourceId },
    CommandListReset { list: ResourceId },
    Submitted {
        lists: Vec<ResourceId>,
        wait: Option<ResourceId>,
        signal: Option<ResourceId>,
        fence: Option<ResourceId>,
    },
    Retired { lists: Vec<ResourceId>, fence: Option<ResourceId> },
    Acquired { image_index: u32, semaphore: ResourceId },
    AcquireFailed,
    Presented { image_index: u32, semaphore: ResourceId },
    QueueWaitIdle,
    DeviceWaitIdle,
    SwapchainRecreated { width: u32, height: u32 },
}

/// Failure injection knobs
#[derive(Debug, Default, Clone)]
pub struct MockFailures {
    /// Fail the n-th buffer creation (0-based, counted since device creation)
    pub fail_buffer_creation_at: Option<usize>,
    /// Fail the n-th fence creation
    pub fail_fence_creation_at: Option<usize>,
    /// Fail the n-th semaphore creation
    pub fail_semaphore_creation_at: Option<usize>,
    /// Every map call fails
    pub fail_map: bool,
    /// Submissions that contain a buffer copy fail
    pub fail_transfer_submit: bool,
    /// Submissions that contain an indexed draw fail with this error
    pub fail_draw_submit: Option<Error>,
}

// ============================================================================
// Shared state
// ============================================================================

struct MemoryBlock {
    ptr: *mut u8,
    len: usize,
}

impl MemoryBlock {
    fn zeroed(len: usize) -> Self {
        let boxed = vec![0u8; len].into_boxed_slice();
        let ptr = Box::into_raw(boxed) as *mut u8;
        Self { ptr, len }
    }
}

impl Drop for MemoryBlock {
    fn drop(&mut self) {
        // SAFETY: ptr/len come from Box::into_raw in `zeroed`.
        unsafe {
            drop(Box::from_raw(std::ptr::slice_from_raw_parts_mut(self.ptr, self.len)));
        }
    }
}

struct PendingSubmission {
    lists: Vec<ResourceId>,
    fence: Option<ResourceId>,
}

/// State shared by the mock device and all of its resources
#[derive(Default)]
pub struct MockState {
    next_id: ResourceId,
    pub events: Vec<MockEvent>,
    pub failures: MockFailures,
    pub live_buffers: usize,
    pub live_semaphores: usize,
    pub live_fences: usize,
    pub live_command_lists: usize,
    pub live_command_pools: usize,
    buffers_created: usize,
    fences_created: usize,
    semaphores_created: usize,
    fences: FxHashMap<ResourceId, bool>,
    memory: FxHashMap<ResourceId, MemoryBlock>,
    recorded: FxHashMap<ResourceId, Vec<MockCommand>>,
    pending: VecDeque<PendingSubmission>,
}

// SAFETY: the raw pointers in `memory` are owned exclusively by the state and
// only dereferenced while the state mutex is held or through a mapped buffer
// owned by the same test thread.
unsafe impl Send for MockState {}

impl MockState {
    fn allocate_id(&mut self) -> ResourceId {
        self.next_id += 1;
        self.next_id
    }

    fn retire_front(&mut self) {
        let Some(submission) = self.pending.pop_front() else {
            return;
        };

        for list in &submission.lists {
            let copies: Vec<(ResourceId, ResourceId, u64)> = self
                .recorded
                .get(list)
                .map(|commands| {
                    commands
                        .iter()
                        .filter_map(|c| match c {
                            MockCommand::CopyBuffer { src, dst, size } => Some((*src, *dst, *size)),
                            _ => None,
                        })
                        .collect()
                })
                .unwrap_or_default();

            for (src, dst, size) in copies {
                if let (Some(s), Some(d)) = (self.memory.get(&src), self.memory.get(&dst)) {
                    let len = (size as usize).min(s.len).min(d.len);
                    // SAFETY: both blocks are live allocations of at least `len` bytes.
                    unsafe { std::ptr::copy(s.ptr, d.ptr, len) };
                }
            }
        }

        if let Some(fence) = submission.fence {
            self.fences.insert(fence, true);
        }
        self.events.push(MockEvent::Retired {
            lists: submission.lists,
            fence: submission.fence,
        });
    }

    fn retire_all(&mut self) {
        while !self.pending.is_empty() {
            self.retire_front();
        }
    }

    fn record(&mut self, list: ResourceId, command: MockCommand) {
        self.recorded.entry(list).or_default().push(command);
    }
}

type SharedState = Arc<Mutex<MockState>>;

fn buffer_id(buffer: &dyn Buffer) -> Result<ResourceId> {
    buffer
        .as_any()
        .downcast_ref::<MockBuffer>()
        .map(|b| b.id)
        .ok_or_else(|| Error::InvalidResource("not a mock buffer".to_string()))
}

fn semaphore_id(semaphore: &dyn Semaphore) -> Result<ResourceId> {
    semaphore
        .as_any()
        .downcast_ref::<MockSemaphore>()
        .map(|s| s.id)
        .ok_or_else(|| Error::InvalidResource("not a mock semaphore".to_string()))
}

fn fence_id(fence: &dyn Fence) -> Result<ResourceId> {
    fence
        .as_any()
        .downcast_ref::<MockFence>()
        .map(|f| f.id)
        .ok_or_else(|| Error::InvalidResource("not a mock fence".to_string()))
}

fn command_list_id(list: &dyn CommandList) -> Result<(ResourceId, bool)> {
    list.as_any()
        .downcast_ref::<MockCommandList>()
        .map(|l| (l.id, l.recording))
        .ok_or_else(|| Error::InvalidResource("not a mock command list".to_string()))
}

// ============================================================================
// Mock GraphicsDevice
// ============================================================================

/// Mock implementation of `GraphicsDevice`
#[derive(Clone, Default)]
pub struct MockGraphicsDevice {
    state: SharedState,
}

impl MockGraphicsDevice {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a device with failure injection configured
    pub fn with_failures(failures: MockFailures) -> Self {
        let device = Self::new();
        device.state().failures = failures;
        device
    }

    /// Lock the shared state
    pub fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap()
    }

    /// Snapshot of the event log
    pub fn events(&self) -> Vec<MockEvent> {
        self.state().events.clone()
    }

    /// Commands currently recorded in a command list
    pub fn recorded_commands(&self, list: ResourceId) -> Vec<MockCommand> {
        self.state().recorded.get(&list).cloned().unwrap_or_default()
    }

    /// Current contents of a buffer's memory, whatever its memory class
    pub fn buffer_contents(&self, buffer: ResourceId) -> Vec<u8> {
        let state = self.state();
        match state.memory.get(&buffer) {
            // SAFETY: the block is live while it is in the map.
            Some(block) => unsafe { std::slice::from_raw_parts(block.ptr, block.len).to_vec() },
            None => Vec::new(),
        }
    }

    /// Signaled state of a fence
    pub fn fence_signaled(&self, fence: ResourceId) -> Option<bool> {
        self.state().fences.get(&fence).copied()
    }

    /// Number of submissions that have not retired yet
    pub fn pending_submissions(&self) -> usize {
        self.state().pending.len()
    }

    /// Create a mock swapchain sharing this device's state
    pub fn create_swapchain(&self, image_count: u32, width: u32, height: u32) -> MockSwapchain {
        MockSwapchain::new(self.state.clone(), image_count, Extent2D { width, height })
    }
}

impl GraphicsDevice for MockGraphicsDevice {
    fn create_buffer(&self, desc: &BufferDesc) -> Result<Box<dyn Buffer>> {
        let mut state = self.state();
        let index = state.buffers_created;
        state.buffers_created += 1;
        if state.failures.fail_buffer_creation_at == Some(index) {
            return Err(Error::OutOfMemory);
        }

        let id = state.allocate_id();
        state.memory.insert(id, MemoryBlock::zeroed(desc.size as usize));
        state.live_buffers += 1;
        state.events.push(MockEvent::BufferCreated {
            buffer: id,
            size: desc.size,
            location: desc.location,
        });

        Ok(Box::new(MockBuffer {
            id,
            state: self.state.clone(),
            size: desc.size,
            usage: desc.usage,
            location: desc.location,
            mapped: None,
        }))
    }

    fn create_semaphore(&self) -> Result<Box<dyn Semaphore>> {
        let mut state = self.state();
        let index = state.semaphores_created;
        state.semaphores_created += 1;
        if state.failures.fail_semaphore_creation_at == Some(index) {
            return Err(Error::BackendError("simulated semaphore creation failure".to_string()));
        }

        let id = state.allocate_id();
        state.live_semaphores += 1;
        Ok(Box::new(MockSemaphore { id, state: self.state.clone() }))
    }

    fn create_fence(&self, signaled: bool) -> Result<Box<dyn Fence>> {
        let mut state = self.state();
        let index = state.fences_created;
        state.fences_created += 1;
        if state.failures.fail_fence_creation_at == Some(index) {
            return Err(Error::BackendError("simulated fence creation failure".to_string()));
        }

        let id = state.allocate_id();
        state.fences.insert(id, signaled);
        state.live_fences += 1;
        Ok(Box::new(MockFence { id, state: self.state.clone() }))
    }

    fn create_command_pool(&self, kind: CommandPoolKind) -> Result<Arc<dyn CommandPool>> {
        let mut state = self.state();
        let id = state.allocate_id();
        state.live_command_pools += 1;
        Ok(Arc::new(MockCommandPool { id, kind, state: self.state.clone() }))
    }

    fn submit(&self, submission: &Submission<'_>) -> Result<()> {
        let mut lists = Vec::with_capacity(submission.command_lists.len());
        for list in submission.command_lists {
            let (id, recording) = command_list_id(*list)?;
            if recording {
                return Err(Error::PreconditionViolation(format!(
                    "command list {} submitted while still recording",
                    id
                )));
            }
            lists.push(id);
        }
        let wait = submission.wait.map(|w| semaphore_id(w.semaphore)).transpose()?;
        let signal = submission.signal.map(semaphore_id).transpose()?;
        let fence = submission.fence.map(fence_id).transpose()?;

        let mut state = self.state();

        if state.failures.fail_transfer_submit {
            let has_copy = lists.iter().any(|id| {
                state.recorded.get(id).is_some_and(|commands| {
                    commands.iter().any(|c| matches!(c, MockCommand::CopyBuffer { .. }))
                })
            });
            if has_copy {
                return Err(Error::BackendError("simulated transfer failure".to_string()));
            }
        }

        if let Some(error) = state.failures.fail_draw_submit.clone() {
            let has_draw = lists.iter().any(|id| {
                state.recorded.get(id).is_some_and(|commands| {
                    commands.iter().any(|c| matches!(c, MockCommand::DrawIndexed { .. }))
                })
            });
            if has_draw {
                return Err(error);
            }
        }

        if let Some(fence) = fence {
            if state.fences.get(&fence).copied().unwrap_or(false) {
                return Err(Error::PreconditionViolation(format!(
                    "fence {} submitted while signaled",
                    fence
                )));
            }
        }

        state.events.push(MockEvent::Submitted {
            lists: lists.clone(),
            wait,
            signal,
            fence,
        });
        state.pending.push_back(PendingSubmission { lists, fence });
        Ok(())
    }

    fn queue_wait_idle(&self) -> Result<()> {
        let mut state = self.state();
        state.retire_all();
        state.events.push(MockEvent::QueueWaitIdle);
        Ok(())
    }

    fn wait_idle(&self) -> Result<()> {
        let mut state = self.state();
        state.retire_all();
        state.events.push(MockEvent::DeviceWaitIdle);
        Ok(())
    }

    fn live_allocations(&self) -> usize {
        self.state().live_buffers
    }
}

// ============================================================================
// Mock Buffer
// ============================================================================

pub struct MockBuffer {
    pub id: ResourceId,
    state: SharedState,
    size: u64,
    usage: BufferUsage,
    location: MemoryLocation,
    mapped: Option<*mut u8>,
}

// SAFETY: the mapped pointer points into memory owned by the shared state,
// which outlives the buffer entry.
unsafe impl Send for MockBuffer {}
unsafe impl Sync for MockBuffer {}

impl Buffer for MockBuffer {
    fn size(&self) -> u64 {
        self.size
    }

    fn usage(&self) -> BufferUsage {
        self.usage
    }

    fn location(&self) -> MemoryLocation {
        self.location
    }

    fn map(&mut self) -> Result<*mut u8> {
        if let Some(ptr) = self.mapped {
            return Ok(ptr);
        }

        let mut state = self.state.lock().unwrap();
        if state.failures.fail_map {
            return Err(Error::ResourceState(format!("simulated map failure on buffer {}", self.id)));
        }
        if !self.location.is_host_visible() {
            return Err(Error::ResourceState(format!("buffer {} is not host-visible", self.id)));
        }

        let ptr = state
            .memory
            .get(&self.id)
            .map(|block| block.ptr)
            .ok_or_else(|| Error::ResourceState(format!("buffer {} has no memory", self.id)))?;
        state.events.push(MockEvent::BufferMapped { buffer: self.id });
        self.mapped = Some(ptr);
        Ok(ptr)
    }

    fn unmap(&mut self) {
        if self.mapped.take().is_some() {
            self.state
                .lock()
                .unwrap()
                .events
                .push(MockEvent::BufferUnmapped { buffer: self.id });
        }
    }

    fn mapped_ptr(&self) -> Option<*mut u8> {
        self.mapped
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl Drop for MockBuffer {
    fn drop(&mut self) {
        self.unmap();
        let mut state = self.state.lock().unwrap();
        state.memory.remove(&self.id);
        state.live_buffers -= 1;
        state.events.push(MockEvent::BufferFreed { buffer: self.id });
    }
}

// ============================================================================
// Mock sync primitives
// ============================================================================

pub struct MockSemaphore {
    pub id: ResourceId,
    state: SharedState,
}

impl Semaphore for MockSemaphore {
    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl Drop for MockSemaphore {
    fn drop(&mut self) {
        self.state.lock().unwrap().live_semaphores -= 1;
    }
}

pub struct MockFence {
    pub id: ResourceId,
    state: SharedState,
}

impl Fence for MockFence {
    fn wait(&self, _timeout_ns: u64) -> Result<()> {
        let mut state = self.state.lock().unwrap();

        if !state.fences.get(&self.id).copied().unwrap_or(false) {
            let owner = state.pending.iter().position(|p| p.fence == Some(self.id));
            match owner {
                Some(position) => {
                    for _ in 0..=position {
                        state.retire_front();
                    }
                }
                None => {
                    return Err(Error::Timeout(format!(
                        "fence {} is unsignaled and no pending submission will signal it",
                        self.id
                    )));
                }
            }
        }

        state.events.push(MockEvent::FenceWaited { fence: self.id });
        Ok(())
    }

    fn reset(&self) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.fences.insert(self.id, false);
        state.events.push(MockEvent::FenceReset { fence: self.id });
        Ok(())
    }

    fn is_signaled(&self) -> Result<bool> {
        Ok(self.state.lock().unwrap().fences.get(&self.id).copied().unwrap_or(false))
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl Drop for MockFence {
    fn drop(&mut self) {
        let mut state = self.state.lock().unwrap();
        state.fences.remove(&self.id);
        state.live_fences -= 1;
    }
}

// ============================================================================
// Mock command pool and command list
// ============================================================================

pub struct MockCommandPool {
    pub id: ResourceId,
    kind: CommandPoolKind,
    state: SharedState,
}

impl CommandPool for MockCommandPool {
    fn allocate(self: Arc<Self>, count: usize) -> Result<Vec<Box<dyn CommandList>>> {
        let mut lists: Vec<Box<dyn CommandList>> = Vec::with_capacity(count);
        for _ in 0..count {
            let mut state = self.state.lock().unwrap();
            let id = state.allocate_id();
            state.live_command_lists += 1;
            state.recorded.insert(id, Vec::new());
            drop(state);

            lists.push(Box::new(MockCommandList {
                id,
                state: self.state.clone(),
                _pool: self.clone(),
                recording: false,
                in_render_pass: false,
            }));
        }
        Ok(lists)
    }

    fn kind(&self) -> CommandPoolKind {
        self.kind
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl Drop for MockCommandPool {
    fn drop(&mut self) {
        self.state.lock().unwrap().live_command_pools -= 1;
    }
}

pub struct MockCommandList {
    pub id: ResourceId,
    state: SharedState,
    _pool: Arc<MockCommandPool>,
    recording: bool,
    in_render_pass: bool,
}

impl MockCommandList {
    fn push(&mut self, command: MockCommand) -> Result<()> {
        if !self.recording {
            return Err(Error::PreconditionViolation(format!(
                "command list {} is not recording",
                self.id
            )));
        }
        self.state.lock().unwrap().record(self.id, command);
        Ok(())
    }
}

impl CommandList for MockCommandList {
    fn reset(&mut self) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.recorded.insert(self.id, Vec::new());
        state.events.push(MockEvent::CommandListReset { list: self.id });
        self.recording = false;
        self.in_render_pass = false;
        Ok(())
    }

    fn begin(&mut self, usage: CommandListUsage) -> Result<()> {
        if self.recording {
            return Err(Error::PreconditionViolation(format!(
                "command list {} is already recording",
                self.id
            )));
        }
        self.recording = true;
        self.push(MockCommand::Begin(usage))
    }

    fn end(&mut self) -> Result<()> {
        if self.in_render_pass {
            return Err(Error::PreconditionViolation("end() inside a render pass".to_string()));
        }
        self.push(MockCommand::End)?;
        self.recording = false;
        Ok(())
    }

    fn begin_render_pass(
        &mut self,
        _render_pass: &dyn RenderPass,
        framebuffer: &dyn Framebuffer,
        render_area: Rect2D,
        clear_values: &[ClearValue],
    ) -> Result<()> {
        let framebuffer = framebuffer
            .as_any()
            .downcast_ref::<MockFramebuffer>()
            .map(|f| f.id)
            .ok_or_else(|| Error::InvalidResource("not a mock framebuffer".to_string()))?;
        self.push(MockCommand::BeginRenderPass {
            framebuffer,
            render_area,
            clear_values: clear_values.to_vec(),
        })?;
        self.in_render_pass = true;
        Ok(())
    }

    fn end_render_pass(&mut self) -> Result<()> {
        if !self.in_render_pass {
            return Err(Error::PreconditionViolation("no render pass to end".to_string()));
        }
        self.push(MockCommand::EndRenderPass)?;
        self.in_render_pass = false;
        Ok(())
    }

    fn bind_pipeline(&mut self, pipeline: &dyn Pipeline) -> Result<()> {
        let id = pipeline
            .as_any()
            .downcast_ref::<MockPipeline>()
            .map(|p| p.id)
            .ok_or_else(|| Error::InvalidResource("not a mock pipeline".to_string()))?;
        self.push(MockCommand::BindPipeline(id))
    }

    fn set_viewport(&mut self, viewport: Viewport) -> Result<()> {
        self.push(MockCommand::SetViewport(viewport))
    }

    fn set_scissor(&mut self, scissor: Rect2D) -> Result<()> {
        self.push(MockCommand::SetScissor(scissor))
    }

    fn bind_vertex_buffer(&mut self, buffer: &dyn Buffer, offset: u64) -> Result<()> {
        let buffer = buffer_id(buffer)?;
        self.push(MockCommand::BindVertexBuffer { buffer, offset })
    }

    fn bind_index_buffer(&mut self, buffer: &dyn Buffer, offset: u64, index_type: IndexType) -> Result<()> {
        let buffer = buffer_id(buffer)?;
        self.push(MockCommand::BindIndexBuffer { buffer, offset, index_type })
    }

    fn bind_descriptor_set(
        &mut self,
        _pipeline: &dyn Pipeline,
        set_index: u32,
        descriptor_set: &dyn DescriptorSet,
    ) -> Result<()> {
        let descriptor_set = descriptor_set
            .as_any()
            .downcast_ref::<MockDescriptorSet>()
            .map(|d| d.id)
            .ok_or_else(|| Error::InvalidResource("not a mock descriptor set".to_string()))?;
        self.push(MockCommand::BindDescriptorSet { set_index, descriptor_set })
    }

    fn draw_indexed(
        &mut self,
        index_count: u32,
        instance_count: u32,
        first_index: u32,
        vertex_offset: i32,
        first_instance: u32,
    ) -> Result<()> {
        if !self.in_render_pass {
            return Err(Error::PreconditionViolation("draw outside a render pass".to_string()));
        }
        self.push(MockCommand::DrawIndexed {
            index_count,
            instance_count,
            first_index,
            vertex_offset,
            first_instance,
        })
    }

    fn copy_buffer(&mut self, src: &dyn Buffer, dst: &dyn Buffer, size: u64) -> Result<()> {
        let src = buffer_id(src)?;
        let dst = buffer_id(dst)?;
        self.push(MockCommand::CopyBuffer { src, dst, size })
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl Drop for MockCommandList {
    fn drop(&mut self) {
        let mut state = self.state.lock().unwrap();
        state.recorded.remove(&self.id);
        state.live_command_lists -= 1;
    }
}

// ============================================================================
// Mock pipeline objects
// ============================================================================

pub struct MockRenderPass;

impl RenderPass for MockRenderPass {
    fn as_any(&self) -> &dyn Any {
        self
    }
}

pub struct MockPipeline {
    pub id: ResourceId,
}

impl Pipeline for MockPipeline {
    fn as_any(&self) -> &dyn Any {
        self
    }
}

pub struct MockDescriptorSet {
    pub id: ResourceId,
}

impl DescriptorSet for MockDescriptorSet {
    fn as_any(&self) -> &dyn Any {
        self
    }
}

pub struct MockFramebuffer {
    /// Equals the swapchain image index it belongs to
    pub id: ResourceId,
    width: u32,
    height: u32,
}

impl Framebuffer for MockFramebuffer {
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

// ============================================================================
// Mock Swapchain
// ============================================================================

/// Mock swapchain with scripted acquire/present results
///
/// Without a script, images are handed out round-robin.
pub struct MockSwapchain {
    state: SharedState,
    extent: Extent2D,
    framebuffers: Vec<MockFramebuffer>,
    next_image: u32,
    pub acquire_script: VecDeque<Result<AcquiredImage>>,
    pub present_script: VecDeque<Result<PresentStatus>>,
}

impl MockSwapchain {
    fn new(state: SharedState, image_count: u32, extent: Extent2D) -> Self {
        Self {
            state,
            extent,
            framebuffers: Self::build_framebuffers(image_count, extent),
            next_image: 0,
            acquire_script: VecDeque::new(),
            present_script: VecDeque::new(),
        }
    }

    fn build_framebuffers(image_count: u32, extent: Extent2D) -> Vec<MockFramebuffer> {
        (0..image_count)
            .map(|i| MockFramebuffer {
                id: i as ResourceId,
                width: extent.width,
                height: extent.height,
            })
            .collect()
    }

    /// Queue acquisitions of specific image indices
    pub fn script_images(&mut self, indices: &[u32]) {
        for &image_index in indices {
            self.acquire_script.push_back(Ok(AcquiredImage { image_index, suboptimal: false }));
        }
    }
}

impl Swapchain for MockSwapchain {
    fn acquire_next_image(&mut self, _timeout_ns: u64, signal: &dyn Semaphore) -> Result<AcquiredImage> {
        let semaphore = semaphore_id(signal)?;
        let acquired = match self.acquire_script.pop_front() {
            Some(scripted) => scripted,
            None => {
                let image_index = self.next_image;
                self.next_image = (self.next_image + 1) % self.framebuffers.len() as u32;
                Ok(AcquiredImage { image_index, suboptimal: false })
            }
        };

        let mut state = self.state.lock().unwrap();
        match &acquired {
            Ok(image) => state.events.push(MockEvent::Acquired {
                image_index: image.image_index,
                semaphore,
            }),
            Err(_) => state.events.push(MockEvent::AcquireFailed),
        }
        acquired
    }

    fn present(&mut self, image_index: u32, wait: &dyn Semaphore) -> Result<PresentStatus> {
        let semaphore = semaphore_id(wait)?;
        self.state
            .lock()
            .unwrap()
            .events
            .push(MockEvent::Presented { image_index, semaphore });
        self.present_script.pop_front().unwrap_or(Ok(PresentStatus::Optimal))
    }

    fn recreate(&mut self, width: u32, height: u32) -> Result<()> {
        self.extent = Extent2D { width, height };
        self.framebuffers = Self::build_framebuffers(self.framebuffers.len() as u32, self.extent);
        self.next_image = 0;
        self.state
            .lock()
            .unwrap()
            .events
            .push(MockEvent::SwapchainRecreated { width, height });
        Ok(())
    }

    fn framebuffer(&self, image_index: u32) -> Result<&dyn Framebuffer> {
        self.framebuffers
            .get(image_index as usize)
            .map(|f| f as &dyn Framebuffer)
            .ok_or_else(|| Error::InvalidResource(format!("no framebuffer for image {}", image_index)))
    }

    fn extent(&self) -> Extent2D {
        self.extent
    }

    fn image_count(&self) -> usize {
        self.framebuffers.len()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[cfg(test)]
#[path = "mock_graphics_device_tests.rs"]
mod tests;
