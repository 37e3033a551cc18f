/// Resource allocator - buffer creation, staging and device copies
///
/// Thin layer over `GraphicsDevice` used by every buffer owner. Buffers
/// returned here free their allocation when dropped.

use std::sync::Arc;
use crate::error::{Error, Result};
use crate::graphics_device::{Buffer, BufferDesc, BufferUsage, GraphicsDevice, MemoryLocation};
use crate::frame::TransferManager;
use crate::engine_error;

pub struct ResourceAllocator {
    device: Arc<dyn GraphicsDevice>,
    transfer: TransferManager,
}

impl ResourceAllocator {
    pub fn new(device: Arc<dyn GraphicsDevice>) -> Result<Self> {
        let transfer = TransferManager::new(device.clone())?;
        Ok(Self { device, transfer })
    }

    /// Allocate a buffer of `size` bytes
    ///
    /// # Errors
    ///
    /// Returns `InvalidResource` for a zero size, otherwise whatever the
    /// device reports.
    pub fn create_buffer(
        &self,
        name: &str,
        size: u64,
        usage: BufferUsage,
        location: MemoryLocation,
    ) -> Result<Box<dyn Buffer>> {
        if size == 0 {
            return Err(Error::InvalidResource(format!("buffer '{}' has zero size", name)));
        }

        self.device
            .create_buffer(&BufferDesc {
                name: name.to_string(),
                size,
                usage,
                location,
            })
            .map_err(|e| {
                engine_error!("lumen::allocator", "Failed to allocate buffer '{}' ({} bytes): {}", name, size, e);
                e
            })
    }

    /// Allocate a host-visible transfer source holding a copy of `data`
    ///
    /// The buffer is left unmapped.
    pub fn create_staging_buffer(&self, name: &str, data: &[u8]) -> Result<Box<dyn Buffer>> {
        let mut staging = self.create_buffer(
            name,
            data.len() as u64,
            BufferUsage::TRANSFER_SRC,
            MemoryLocation::CpuToGpu,
        )?;

        Self::map(staging.as_mut())?;
        let written = staging.write(0, data);
        Self::unmap(staging.as_mut());
        written?;

        Ok(staging)
    }

    /// Map a buffer, logging failures
    pub fn map(buffer: &mut dyn Buffer) -> Result<*mut u8> {
        buffer.map().map_err(|e| {
            engine_error!("lumen::allocator", "Failed to map buffer: {}", e);
            e
        })
    }

    /// Unmap a buffer
    pub fn unmap(buffer: &mut dyn Buffer) {
        buffer.unmap();
    }

    /// Copy between buffers on the graphics queue and wait for completion
    pub fn copy_buffer(&self, src: &dyn Buffer, dst: &dyn Buffer, size: u64) -> Result<()> {
        self.transfer.copy_buffer(src, dst, size).map_err(|e| {
            engine_error!("lumen::allocator", "Buffer copy of {} bytes failed: {}", size, e);
            e
        })
    }

    /// Number of buffer allocations currently alive on the device
    pub fn live_allocations(&self) -> usize {
        self.device.live_allocations()
    }

    pub fn device(&self) -> &Arc<dyn GraphicsDevice> {
        &self.device
    }
}

#[cfg(test)]
#[path = "resource_allocator_tests.rs"]
mod tests;
