/// Frame orchestrator - drives one frame through WAIT, ACQUIRE, RECORD, SUBMIT, PRESENT
///
/// The only state kept between frames is the frame-slot counter. The
/// swapchain and the pipeline objects are supplied by the caller on every
/// frame, so a recreated swapchain is picked up without touching the
/// orchestrator.

use std::sync::Arc;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::frame::{BufferManager, CommandSyncManager, UniformBufferObject};
use crate::graphics_device::{
    ClearValue, CommandList, CommandListUsage, DescriptorSet, Fence, GraphicsDevice, Pipeline,
    PipelineStage, PresentStatus, Rect2D, RenderPass, Semaphore, SemaphoreWait, Submission,
    Swapchain, Viewport,
};
use crate::{engine_debug, engine_error, engine_warn};

// ============================================================================
// Frame counter
// ============================================================================

/// Round-robin frame-slot counter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameCounter {
    current: usize,
    frames_in_flight: usize,
    frame_number: u64,
}

impl FrameCounter {
    pub fn new(frames_in_flight: usize) -> Self {
        Self {
            current: 0,
            frames_in_flight: frames_in_flight.max(1),
            frame_number: 0,
        }
    }

    /// Active frame slot
    pub fn current(&self) -> usize {
        self.current
    }

    /// Number of completed advances since creation
    pub fn frame_number(&self) -> u64 {
        self.frame_number
    }

    /// Move to the next slot (`(slot + 1) % N`) and return it
    pub fn advance(&mut self) -> usize {
        self.current = (self.current + 1) % self.frames_in_flight;
        self.frame_number += 1;
        self.current
    }
}

// ============================================================================
// Draw bindings
// ============================================================================

/// Pipeline objects the per-frame commands bind
///
/// Holds one descriptor set per frame slot, each pointing at that slot's
/// uniform buffer.
#[derive(Clone)]
pub struct DrawBindings {
    pub render_pass: Arc<dyn RenderPass>,
    pub pipeline: Arc<dyn Pipeline>,
    pub descriptor_sets: Vec<Arc<dyn DescriptorSet>>,
}

impl DrawBindings {
    /// Descriptor set of a frame slot (bounds-checked)
    pub fn descriptor_set(&self, slot: usize) -> Result<&dyn DescriptorSet> {
        self.descriptor_sets
            .get(slot)
            .map(|set| &**set)
            .ok_or(Error::FrameSlotOutOfRange {
                slot,
                frames_in_flight: self.descriptor_sets.len(),
            })
    }
}

/// Step of the per-frame state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameStage {
    Wait,
    Acquire,
    Record,
    Submit,
    Present,
}

/// What a successfully presented frame used
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameOutcome {
    /// Frame slot the frame ran in
    pub slot: usize,
    /// Swapchain image that was rendered and presented
    pub image_index: u32,
    /// The swapchain reported it no longer matches the surface exactly
    pub suboptimal: bool,
}

// ============================================================================
// Frame orchestrator
// ============================================================================

pub struct FrameOrchestrator {
    device: Arc<dyn GraphicsDevice>,
    // Command lists and sync objects go before the buffers they reference.
    sync: CommandSyncManager,
    buffers: BufferManager,
    counter: FrameCounter,
    acquire_timeout_ns: u64,
    clear_color: [f32; 4],
}

impl FrameOrchestrator {
    /// Create the per-slot command lists and sync objects around `buffers`
    ///
    /// # Errors
    ///
    /// Returns `InitializationFailed` if `buffers` was built for a different
    /// number of frames in flight, or if sync object creation fails.
    pub fn new(device: Arc<dyn GraphicsDevice>, config: &Config, buffers: BufferManager) -> Result<Self> {
        config.validate()?;
        if buffers.frames_in_flight() != config.frames_in_flight {
            return Err(Error::InitializationFailed(format!(
                "buffer manager holds {} uniform buffers for {} frames in flight",
                buffers.frames_in_flight(),
                config.frames_in_flight
            )));
        }

        let sync = CommandSyncManager::new(device.clone(), config)?;

        Ok(Self {
            device,
            sync,
            buffers,
            counter: FrameCounter::new(config.frames_in_flight),
            acquire_timeout_ns: config.acquire_timeout_ns,
            clear_color: config.clear_color,
        })
    }

    /// Run one full frame in the current slot, then advance the slot
    ///
    /// `uniforms`, when given, is written into the slot's uniform buffer after
    /// the slot's fence has been waited on.
    ///
    /// # Errors
    ///
    /// Errors are returned from the stage that detected them. A stale surface
    /// is reported as `Error::SurfaceOutOfDate`. If the frame is abandoned
    /// before submission, the slot's fence is re-armed so the next frame in
    /// this slot does not block forever; the slot does not advance. A present
    /// failure happens after submission, so the slot advances first.
    ///
    /// A RECORD or SUBMIT failure leaves the acquired image unpresented, and
    /// the swapchain does not get it back. Such errors are never reported as
    /// transient: the caller must end the frame loop instead of retrying, or
    /// repeated failures exhaust the swapchain images and block the next
    /// acquisition.
    pub fn draw_frame(
        &mut self,
        swapchain: &mut dyn Swapchain,
        bindings: &DrawBindings,
        uniforms: Option<&UniformBufferObject>,
    ) -> Result<FrameOutcome> {
        let slot = self.counter.current();

        // WAIT
        self.sync.wait_for_fences(slot)?;
        self.sync.reset_fences(slot)?;

        // ACQUIRE
        let acquired = match swapchain.acquire_next_image(
            self.acquire_timeout_ns,
            self.sync.image_available_semaphore(slot)?,
        ) {
            Ok(acquired) => acquired,
            Err(e) => return Err(self.abandon_frame(slot, FrameStage::Acquire, false, e)),
        };

        // RECORD
        let recorded = match uniforms {
            Some(data) => self.buffers.update_uniform_buffer(slot, data),
            None => Ok(()),
        }
        .and_then(|_| self.record_command_buffer(slot, acquired.image_index, &*swapchain, bindings));
        if let Err(e) = recorded {
            return Err(self.abandon_frame(slot, FrameStage::Record, true, e));
        }

        // SUBMIT
        if let Err(e) = self.submit(slot) {
            return Err(self.abandon_frame(slot, FrameStage::Submit, true, e));
        }

        // PRESENT
        let presented = swapchain.present(acquired.image_index, self.sync.render_finished_semaphore(slot)?);
        self.counter.advance();
        let status = presented.map_err(|e| {
            self.log_failure(slot, FrameStage::Present, &e);
            e
        })?;

        Ok(FrameOutcome {
            slot,
            image_index: acquired.image_index,
            suboptimal: acquired.suboptimal || status == PresentStatus::Suboptimal,
        })
    }

    /// Record the draw commands of `slot` targeting swapchain image `image_index`
    ///
    /// Resets the slot's command list first.
    ///
    /// # Errors
    ///
    /// Returns `PreconditionViolation` if the slot's last submission has not
    /// been waited on, since the GPU may still be reading its command list.
    pub fn record_command_buffer(
        &mut self,
        slot: usize,
        image_index: u32,
        swapchain: &dyn Swapchain,
        bindings: &DrawBindings,
    ) -> Result<()> {
        if self.sync.is_in_flight(slot)? {
            return Err(Error::PreconditionViolation(format!(
                "command list of frame {} recorded while its submission is pending",
                slot
            )));
        }

        let framebuffer = swapchain.framebuffer(image_index)?;
        let extent = swapchain.extent();
        let descriptor_set = bindings.descriptor_set(slot)?;
        let clear_values = [ClearValue::Color(self.clear_color)];

        let buffers = &self.buffers;
        let cmd = self.sync.command_list_mut(slot)?;

        cmd.reset()?;
        cmd.begin(CommandListUsage::Reusable)?;
        cmd.begin_render_pass(
            bindings.render_pass.as_ref(),
            framebuffer,
            Rect2D::from_extent(extent),
            &clear_values,
        )?;
        cmd.bind_pipeline(bindings.pipeline.as_ref())?;
        cmd.set_viewport(Viewport::from_extent(extent))?;
        cmd.set_scissor(Rect2D::from_extent(extent))?;
        cmd.bind_vertex_buffer(buffers.vertex_buffer(), 0)?;
        cmd.bind_index_buffer(buffers.index_buffer(), 0, buffers.index_type())?;
        cmd.bind_descriptor_set(bindings.pipeline.as_ref(), 0, descriptor_set)?;
        cmd.draw_indexed(buffers.index_count(), 1, 0, 0, 0)?;
        cmd.end_render_pass()?;
        cmd.end()
    }

    /// Submit the recorded command list of `slot`
    ///
    /// Waits on image-available at color-attachment output, signals
    /// render-finished and the slot's fence.
    fn submit(&mut self, slot: usize) -> Result<()> {
        let command_lists = [self.sync.command_list(slot)?];
        self.device.submit(&Submission {
            command_lists: &command_lists,
            wait: Some(SemaphoreWait {
                semaphore: self.sync.image_available_semaphore(slot)?,
                stage: PipelineStage::ColorAttachmentOutput,
            }),
            signal: Some(self.sync.render_finished_semaphore(slot)?),
            fence: Some(self.sync.in_flight_fence(slot)?),
        })?;
        self.sync.mark_submitted(slot)
    }

    /// Give up on the frame in `slot` after its fence was reset
    ///
    /// Returns the error to report. With an image acquired, a transient error
    /// is reported as a `BackendError` so the caller does not retry.
    fn abandon_frame(&self, slot: usize, stage: FrameStage, image_acquired: bool, error: Error) -> Error {
        self.log_failure(slot, stage, &error);
        if let Err(rearm) = self.sync.rearm_fence(slot, image_acquired) {
            engine_error!("lumen::frame", "Failed to re-arm fence of frame {}: {}", slot, rearm);
        }
        if !image_acquired {
            return error;
        }
        engine_error!("lumen::frame", "Frame {} keeps its swapchain image, the frame loop must stop", slot);
        if error.is_transient() {
            Error::BackendError(format!("frame {} abandoned at {:?}: {}", slot, stage, error))
        } else {
            error
        }
    }

    fn log_failure(&self, slot: usize, stage: FrameStage, error: &Error) {
        if error.is_transient() {
            engine_warn!("lumen::frame", "Frame {} stopped at {:?}: {}", slot, stage, error);
        } else {
            engine_error!("lumen::frame", "Frame {} failed at {:?}: {}", slot, stage, error);
        }
    }

    /// Block until the previous submission of `slot` has completed
    pub fn wait_for_fences(&mut self, slot: usize) -> Result<()> {
        self.sync.wait_for_fences(slot)
    }

    /// Unsignal the fence of `slot` (after `wait_for_fences`)
    pub fn reset_fences(&mut self, slot: usize) -> Result<()> {
        self.sync.reset_fences(slot)
    }

    pub fn update_uniform_buffer(&self, slot: usize, data: &UniformBufferObject) -> Result<()> {
        self.buffers.update_uniform_buffer(slot, data)
    }

    pub fn command_buffer(&self, slot: usize) -> Result<&dyn CommandList> {
        self.sync.command_list(slot)
    }

    pub fn image_available_semaphore(&self, slot: usize) -> Result<&dyn Semaphore> {
        self.sync.image_available_semaphore(slot)
    }

    pub fn render_finished_semaphore(&self, slot: usize) -> Result<&dyn Semaphore> {
        self.sync.render_finished_semaphore(slot)
    }

    pub fn in_flight_fence(&self, slot: usize) -> Result<&dyn Fence> {
        self.sync.in_flight_fence(slot)
    }

    /// Active frame slot
    pub fn current_slot(&self) -> usize {
        self.counter.current()
    }

    /// Advance to the next frame slot without running a frame
    pub fn advance(&mut self) -> usize {
        self.counter.advance()
    }

    pub fn frame_number(&self) -> u64 {
        self.counter.frame_number()
    }

    pub fn frames_in_flight(&self) -> usize {
        self.sync.frames_in_flight()
    }

    pub fn buffers(&self) -> &BufferManager {
        &self.buffers
    }

    pub fn sync(&self) -> &CommandSyncManager {
        &self.sync
    }

    /// Block until the device has finished all submitted work
    pub fn wait_idle(&self) -> Result<()> {
        self.device.wait_idle()
    }
}

impl Drop for FrameOrchestrator {
    fn drop(&mut self) {
        if let Err(e) = self.device.wait_idle() {
            engine_error!("lumen::frame", "wait_idle before teardown failed: {}", e);
        }
        engine_debug!("lumen::frame", "Frame orchestrator released after {} frames", self.counter.frame_number());
    }
}

#[cfg(test)]
#[path = "frame_orchestrator_tests.rs"]
mod tests;
