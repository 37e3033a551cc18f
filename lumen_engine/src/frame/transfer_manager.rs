/// Transfer manager - one-shot buffer copies on the graphics queue
///
/// Copies are synchronous: the call returns after the queue is idle, so
/// uploads never overlap rendering.

use std::sync::Arc;
use crate::error::{Error, Result};
use crate::graphics_device::{
    Buffer, BufferUsage, CommandListUsage, CommandPool, CommandPoolKind, GraphicsDevice, Submission,
};

pub struct TransferManager {
    device: Arc<dyn GraphicsDevice>,
    command_pool: Arc<dyn CommandPool>,
}

impl TransferManager {
    /// Create a transfer manager with its own transient command pool
    pub fn new(device: Arc<dyn GraphicsDevice>) -> Result<Self> {
        let command_pool = device.create_command_pool(CommandPoolKind::Transient)?;
        Ok(Self { device, command_pool })
    }

    /// Copy `size` bytes from `src` to `dst` and wait for completion
    ///
    /// The one-shot command list is freed on every exit path.
    ///
    /// # Errors
    ///
    /// Returns `PreconditionViolation` if the usage flags or sizes do not
    /// allow the copy, or the backend error if recording or submission fails.
    pub fn copy_buffer(&self, src: &dyn Buffer, dst: &dyn Buffer, size: u64) -> Result<()> {
        if !src.usage().contains(BufferUsage::TRANSFER_SRC) {
            return Err(Error::PreconditionViolation("copy source lacks TRANSFER_SRC usage".to_string()));
        }
        if !dst.usage().contains(BufferUsage::TRANSFER_DST) {
            return Err(Error::PreconditionViolation("copy destination lacks TRANSFER_DST usage".to_string()));
        }
        if size > src.size() || size > dst.size() {
            return Err(Error::PreconditionViolation(format!(
                "copy of {} bytes exceeds source ({}) or destination ({})",
                size,
                src.size(),
                dst.size()
            )));
        }

        let mut command_list = self
            .command_pool
            .clone()
            .allocate(1)?
            .pop()
            .ok_or_else(|| Error::BackendError("command pool returned no command list".to_string()))?;

        command_list.begin(CommandListUsage::OneTimeSubmit)?;
        command_list.copy_buffer(src, dst, size)?;
        command_list.end()?;

        let command_lists = [command_list.as_ref()];
        self.device.submit(&Submission {
            command_lists: &command_lists,
            ..Submission::default()
        })?;
        self.device.queue_wait_idle()
    }
}
