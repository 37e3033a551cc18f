/// Command/sync manager - per-slot command lists and synchronization primitives
///
/// Each frame slot bundles its command list with the three primitives that
/// guard it (image-available semaphore, render-finished semaphore, in-flight
/// fence), so the one-to-one correspondence cannot drift.

use std::sync::Arc;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::graphics_device::{
    CommandList, CommandPool, CommandPoolKind, Fence, GraphicsDevice, PipelineStage, Semaphore,
    SemaphoreWait, Submission,
};
use crate::{engine_debug, engine_error};

/// Synchronization primitives of one frame slot
pub struct SyncObjects {
    pub image_available: Box<dyn Semaphore>,
    pub render_finished: Box<dyn Semaphore>,
    pub in_flight: Box<dyn Fence>,
}

/// Everything one frame slot owns apart from its uniform buffer
struct FrameSlot {
    command_list: Box<dyn CommandList>,
    sync: SyncObjects,
    /// Set by `wait_for_fences`, cleared by `reset_fences`
    fence_waited: bool,
    /// Set by `mark_submitted`, cleared by `wait_for_fences`
    in_flight: bool,
}

pub struct CommandSyncManager {
    device: Arc<dyn GraphicsDevice>,
    // Slots drop before the pool; command lists also hold the pool alive.
    slots: Box<[FrameSlot]>,
    command_pool: Arc<dyn CommandPool>,
    fence_timeout_ns: u64,
}

impl CommandSyncManager {
    /// Create the command pool, N command lists and N sets of sync objects
    ///
    /// # Errors
    ///
    /// Every creation failure is reported as `InitializationFailed`. Objects
    /// created before the failure are released.
    pub fn new(device: Arc<dyn GraphicsDevice>, config: &Config) -> Result<Self> {
        config.validate()?;
        let frames_in_flight = config.frames_in_flight;

        let command_pool = device
            .create_command_pool(CommandPoolKind::ResetIndividual)
            .map_err(|e| {
                engine_error!("lumen::sync", "Failed to create command pool: {}", e);
                Error::InitializationFailed(format!("command pool: {}", e))
            })?;

        let command_lists = command_pool.clone().allocate(frames_in_flight).map_err(|e| {
            engine_error!("lumen::sync", "Failed to allocate {} command lists: {}", frames_in_flight, e);
            Error::InitializationFailed(format!("command lists: {}", e))
        })?;
        if command_lists.len() != frames_in_flight {
            return Err(Error::InitializationFailed(format!(
                "expected {} command lists, got {}",
                frames_in_flight,
                command_lists.len()
            )));
        }

        let sync_objects = Self::create_sync_objects(device.as_ref(), frames_in_flight)?;

        let slots: Box<[FrameSlot]> = command_lists
            .into_iter()
            .zip(sync_objects)
            .map(|(command_list, sync)| FrameSlot {
                command_list,
                sync,
                fence_waited: false,
                in_flight: false,
            })
            .collect();

        engine_debug!("lumen::sync", "Created {} frame slots", frames_in_flight);

        Ok(Self {
            device,
            slots,
            command_pool,
            fence_timeout_ns: config.fence_timeout_ns,
        })
    }

    /// Create `count` sets of sync objects with their fences already signaled
    ///
    /// Pre-signaled fences let the first wait on every slot return at once.
    ///
    /// # Errors
    ///
    /// Returns `InitializationFailed` naming the slot that failed. This only
    /// runs at startup and is never retried.
    pub fn create_sync_objects(device: &dyn GraphicsDevice, count: usize) -> Result<Vec<SyncObjects>> {
        let mut objects = Vec::with_capacity(count);

        for slot in 0..count {
            let created = device.create_semaphore().and_then(|image_available| {
                let render_finished = device.create_semaphore()?;
                let in_flight = device.create_fence(true)?;
                Ok(SyncObjects {
                    image_available,
                    render_finished,
                    in_flight,
                })
            });

            match created {
                Ok(sync) => objects.push(sync),
                Err(e) => {
                    engine_error!("lumen::sync", "Failed to create sync objects for frame {}: {}", slot, e);
                    return Err(Error::InitializationFailed(format!(
                        "sync objects for frame {}: {}",
                        slot, e
                    )));
                }
            }
        }

        Ok(objects)
    }

    fn slot(&self, slot: usize) -> Result<&FrameSlot> {
        self.slots.get(slot).ok_or(Error::FrameSlotOutOfRange {
            slot,
            frames_in_flight: self.slots.len(),
        })
    }

    fn slot_mut(&mut self, slot: usize) -> Result<&mut FrameSlot> {
        let frames_in_flight = self.slots.len();
        self.slots
            .get_mut(slot)
            .ok_or(Error::FrameSlotOutOfRange { slot, frames_in_flight })
    }

    /// Block until the previous submission of `slot` has completed
    pub fn wait_for_fences(&mut self, slot: usize) -> Result<()> {
        let timeout = self.fence_timeout_ns;
        let frame = self.slot_mut(slot)?;
        frame.sync.in_flight.wait(timeout).map_err(|e| {
            engine_error!("lumen::sync", "Waiting for in-flight fence of frame {} failed: {}", slot, e);
            e
        })?;
        frame.fence_waited = true;
        frame.in_flight = false;
        Ok(())
    }

    /// Record that the command list of `slot` was handed to the GPU
    pub fn mark_submitted(&mut self, slot: usize) -> Result<()> {
        self.slot_mut(slot)?.in_flight = true;
        Ok(())
    }

    /// Whether the command list of `slot` may still be read by the GPU
    pub fn is_in_flight(&self, slot: usize) -> Result<bool> {
        Ok(self.slot(slot)?.in_flight)
    }

    /// Return the fence of `slot` to the unsignaled state
    ///
    /// # Errors
    ///
    /// Returns `PreconditionViolation` unless `wait_for_fences` returned for
    /// this slot since the last reset.
    pub fn reset_fences(&mut self, slot: usize) -> Result<()> {
        let frame = self.slot_mut(slot)?;
        if !frame.fence_waited {
            return Err(Error::PreconditionViolation(format!(
                "fence of frame {} reset without a prior wait",
                slot
            )));
        }
        frame.sync.in_flight.reset()?;
        frame.fence_waited = false;
        Ok(())
    }

    /// Submit empty work that signals the fence of `slot`
    ///
    /// Used when a frame is abandoned after its fence was reset, so the next
    /// wait on the slot still returns. With `consume_image_available` the
    /// submission also waits on the image-available semaphore, which leaves
    /// it unsignaled for the next acquisition.
    pub fn rearm_fence(&self, slot: usize, consume_image_available: bool) -> Result<()> {
        let frame = self.slot(slot)?;
        let wait = consume_image_available.then(|| SemaphoreWait {
            semaphore: frame.sync.image_available.as_ref(),
            stage: PipelineStage::ColorAttachmentOutput,
        });

        self.device.submit(&Submission {
            wait,
            fence: Some(frame.sync.in_flight.as_ref()),
            ..Submission::default()
        })
    }

    pub fn command_list(&self, slot: usize) -> Result<&dyn CommandList> {
        Ok(self.slot(slot)?.command_list.as_ref())
    }

    pub fn command_list_mut(&mut self, slot: usize) -> Result<&mut dyn CommandList> {
        let frame = self.slot_mut(slot)?;
        Ok(&mut *frame.command_list)
    }

    pub fn image_available_semaphore(&self, slot: usize) -> Result<&dyn Semaphore> {
        Ok(self.slot(slot)?.sync.image_available.as_ref())
    }

    pub fn render_finished_semaphore(&self, slot: usize) -> Result<&dyn Semaphore> {
        Ok(self.slot(slot)?.sync.render_finished.as_ref())
    }

    pub fn in_flight_fence(&self, slot: usize) -> Result<&dyn Fence> {
        Ok(self.slot(slot)?.sync.in_flight.as_ref())
    }

    pub fn command_pool(&self) -> &Arc<dyn CommandPool> {
        &self.command_pool
    }

    pub fn frames_in_flight(&self) -> usize {
        self.slots.len()
    }
}

#[cfg(test)]
#[path = "command_sync_manager_tests.rs"]
mod tests;
