/// Buffer trait and buffer descriptor

use std::any::Any;
use bitflags::bitflags;
use crate::error::{Error, Result};

bitflags! {
    /// Buffer usage flags
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct BufferUsage: u32 {
        /// Vertex buffer
        const VERTEX = 1 << 0;
        /// Index buffer
        const INDEX = 1 << 1;
        /// Uniform/constant buffer
        const UNIFORM = 1 << 2;
        /// Source of a transfer (staging)
        const TRANSFER_SRC = 1 << 3;
        /// Destination of a transfer
        const TRANSFER_DST = 1 << 4;
    }
}

/// Memory class a buffer is allocated from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MemoryLocation {
    /// Device-local, not host-visible
    GpuOnly,
    /// Host-visible, written by the CPU and read by the GPU
    CpuToGpu,
    /// Host-visible, written by the GPU and read back by the CPU
    GpuToCpu,
}

impl MemoryLocation {
    /// Whether the CPU can map memory of this class
    pub fn is_host_visible(self) -> bool {
        !matches!(self, MemoryLocation::GpuOnly)
    }
}

/// Index element type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexType {
    /// 16-bit unsigned indices
    U16,
    /// 32-bit unsigned indices
    U32,
}

impl IndexType {
    /// Size of one index in bytes
    pub fn size_bytes(self) -> u64 {
        match self {
            IndexType::U16 => 2,
            IndexType::U32 => 4,
        }
    }
}

/// Descriptor for creating a buffer
#[derive(Debug, Clone)]
pub struct BufferDesc {
    /// Debug name, forwarded to the allocator
    pub name: String,
    /// Size in bytes
    pub size: u64,
    /// Buffer usage
    pub usage: BufferUsage,
    /// Memory class
    pub location: MemoryLocation,
}

/// Buffer resource trait
///
/// Implemented by backend-specific buffer types (e.g., the Vulkan buffer).
/// The buffer and its allocation are released when dropped. A buffer that is
/// still mapped is unmapped first.
pub trait Buffer: Send + Sync {
    /// Size in bytes
    fn size(&self) -> u64;

    /// Usage flags the buffer was created with
    fn usage(&self) -> BufferUsage;

    /// Memory class the buffer was allocated from
    fn location(&self) -> MemoryLocation;

    /// Map the buffer into host memory
    ///
    /// Mapping an already-mapped buffer returns the same pointer.
    ///
    /// # Errors
    ///
    /// Returns `ResourceState` if the memory is not host-visible or mapping fails.
    fn map(&mut self) -> Result<*mut u8>;

    /// Unmap the buffer. Does nothing if it is not mapped.
    fn unmap(&mut self);

    /// Raw pointer to the mapped memory, or None while unmapped
    fn mapped_ptr(&self) -> Option<*mut u8>;

    /// Downcast support for backends
    fn as_any(&self) -> &dyn Any;

    /// Copy bytes into the mapped memory
    ///
    /// # Errors
    ///
    /// Returns `ResourceState` if the buffer is not mapped and
    /// `PreconditionViolation` if the write would overrun the buffer.
    fn write(&self, offset: u64, data: &[u8]) -> Result<()> {
        let end = offset.checked_add(data.len() as u64);
        if end.map_or(true, |end| end > self.size()) {
            return Err(Error::PreconditionViolation(format!(
                "write of {} bytes at offset {} overruns buffer of {} bytes",
                data.len(),
                offset,
                self.size()
            )));
        }

        let ptr = self.mapped_ptr().ok_or_else(|| {
            Error::ResourceState("buffer is not mapped".to_string())
        })?;

        // SAFETY: the range was checked against the buffer size above and the
        // pointer stays valid while the buffer is mapped.
        unsafe {
            std::ptr::copy_nonoverlapping(data.as_ptr(), ptr.add(offset as usize), data.len());
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "buffer_tests.rs"]
mod tests;
