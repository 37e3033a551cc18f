/// Buffer manager - vertex, index and per-frame uniform buffers
///
/// Vertex and index buffers are device-local and immutable, filled once
/// through a staging buffer. Uniform buffers are host-visible, one per frame
/// slot, and stay mapped for their whole lifetime.

use bytemuck::Pod;
use crate::error::{Error, Result};
use crate::graphics_device::{Buffer, BufferUsage, IndexType, MemoryLocation};
use crate::frame::{ResourceAllocator, UniformBufferObject};
use crate::{engine_debug, engine_error};

/// Persistently mapped uniform buffer of one frame slot
///
/// Unmapped on drop, before the buffer itself is freed.
pub struct UniformBuffer {
    buffer: Box<dyn Buffer>,
}

impl UniformBuffer {
    fn new(allocator: &ResourceAllocator, slot: usize) -> Result<Self> {
        let mut buffer = allocator.create_buffer(
            &format!("uniform_buffer_{}", slot),
            UniformBufferObject::SIZE,
            BufferUsage::UNIFORM,
            MemoryLocation::CpuToGpu,
        )?;
        ResourceAllocator::map(buffer.as_mut())?;
        Ok(Self { buffer })
    }

    pub fn buffer(&self) -> &dyn Buffer {
        self.buffer.as_ref()
    }

    pub fn is_mapped(&self) -> bool {
        self.buffer.mapped_ptr().is_some()
    }
}

impl Drop for UniformBuffer {
    fn drop(&mut self) {
        self.buffer.unmap();
    }
}

/// Owner of all GPU buffers the frame loop reads
pub struct BufferManager {
    // Field order is drop order: uniform buffers, then vertex, then index.
    uniform_buffers: Box<[UniformBuffer]>,
    vertex_buffer: Box<dyn Buffer>,
    index_buffer: Box<dyn Buffer>,
    vertex_count: u32,
    index_count: u32,
}

impl BufferManager {
    /// Upload geometry and create `frames_in_flight` uniform buffers
    ///
    /// Any failure releases everything created so far before returning.
    ///
    /// # Errors
    ///
    /// Returns `InvalidResource` for empty geometry or indices that reference
    /// missing vertices, and propagates allocation, mapping and copy errors.
    pub fn new<V: Pod>(
        allocator: &ResourceAllocator,
        vertices: &[V],
        indices: &[u16],
        frames_in_flight: usize,
    ) -> Result<Self> {
        if indices.is_empty() {
            return Err(Error::InvalidResource("index array is empty".to_string()));
        }
        if let Some(&bad) = indices.iter().find(|&&i| i as usize >= vertices.len()) {
            return Err(Error::InvalidResource(format!(
                "index {} references a missing vertex ({} vertices)",
                bad,
                vertices.len()
            )));
        }
        if frames_in_flight == 0 {
            return Err(Error::InitializationFailed("frames_in_flight must be at least 1".to_string()));
        }

        let vertex_buffer = Self::create_vertex_buffer(allocator, vertices)?;
        let index_buffer = Self::create_index_buffer(allocator, indices)?;
        let uniform_buffers = Self::create_uniform_buffers(allocator, frames_in_flight)?;

        engine_debug!(
            "lumen::buffers",
            "Created {} vertices, {} indices, {} uniform buffers",
            vertices.len(),
            indices.len(),
            frames_in_flight
        );

        Ok(Self {
            uniform_buffers,
            vertex_buffer,
            index_buffer,
            vertex_count: vertices.len() as u32,
            index_count: indices.len() as u32,
        })
    }

    /// Upload vertices into a device-local vertex buffer
    pub fn create_vertex_buffer<V: Pod>(allocator: &ResourceAllocator, vertices: &[V]) -> Result<Box<dyn Buffer>> {
        Self::upload_immutable(allocator, "vertex_buffer", bytemuck::cast_slice(vertices), BufferUsage::VERTEX)
    }

    /// Upload 16-bit indices into a device-local index buffer
    pub fn create_index_buffer(allocator: &ResourceAllocator, indices: &[u16]) -> Result<Box<dyn Buffer>> {
        Self::upload_immutable(allocator, "index_buffer", bytemuck::cast_slice(indices), BufferUsage::INDEX)
    }

    /// Create one mapped uniform buffer per frame slot
    ///
    /// If buffer `i` fails, buffers `0..i` are released before the error is
    /// returned.
    pub fn create_uniform_buffers(
        allocator: &ResourceAllocator,
        frames_in_flight: usize,
    ) -> Result<Box<[UniformBuffer]>> {
        let mut buffers = Vec::with_capacity(frames_in_flight);
        for slot in 0..frames_in_flight {
            match UniformBuffer::new(allocator, slot) {
                Ok(buffer) => buffers.push(buffer),
                Err(e) => {
                    engine_error!(
                        "lumen::buffers",
                        "Failed to create uniform buffer {} of {}: {}",
                        slot,
                        frames_in_flight,
                        e
                    );
                    return Err(e);
                }
            }
        }
        Ok(buffers.into_boxed_slice())
    }

    /// Staged upload: staging buffer, device-local destination, one-shot copy
    ///
    /// The staging buffer never outlives this call, and the destination is
    /// released if the copy fails.
    fn upload_immutable(
        allocator: &ResourceAllocator,
        name: &str,
        bytes: &[u8],
        usage: BufferUsage,
    ) -> Result<Box<dyn Buffer>> {
        if bytes.is_empty() {
            return Err(Error::InvalidResource(format!("{} has no data", name)));
        }
        let size = bytes.len() as u64;

        let staging = allocator.create_staging_buffer(&format!("{}_staging", name), bytes)?;
        let destination = allocator.create_buffer(
            name,
            size,
            usage | BufferUsage::TRANSFER_DST,
            MemoryLocation::GpuOnly,
        )?;

        if let Err(e) = allocator.copy_buffer(staging.as_ref(), destination.as_ref(), size) {
            engine_error!("lumen::buffers", "Upload of {} ({} bytes) failed: {}", name, size, e);
            return Err(e);
        }

        Ok(destination)
    }

    /// Write `data` into the mapped uniform buffer of `slot`
    ///
    /// The slot's fence must have been waited on, so the GPU is done reading
    /// the previous contents.
    ///
    /// # Errors
    ///
    /// Returns `FrameSlotOutOfRange` if `slot >= frames_in_flight` (nothing is
    /// written) and `ResourceState` if the buffer is not mapped.
    pub fn update_uniform_buffer(&self, slot: usize, data: &UniformBufferObject) -> Result<()> {
        let uniform = self.uniform_buffers.get(slot).ok_or(Error::FrameSlotOutOfRange {
            slot,
            frames_in_flight: self.uniform_buffers.len(),
        })?;

        if !uniform.is_mapped() {
            return Err(Error::ResourceState(format!("uniform buffer {} is not mapped", slot)));
        }

        uniform.buffer.write(0, data.as_bytes())
    }

    pub fn vertex_buffer(&self) -> &dyn Buffer {
        self.vertex_buffer.as_ref()
    }

    pub fn index_buffer(&self) -> &dyn Buffer {
        self.index_buffer.as_ref()
    }

    pub fn vertex_count(&self) -> u32 {
        self.vertex_count
    }

    pub fn index_count(&self) -> u32 {
        self.index_count
    }

    pub fn index_type(&self) -> IndexType {
        IndexType::U16
    }

    /// Uniform buffer of a frame slot (bounds-checked)
    pub fn uniform_buffer(&self, slot: usize) -> Result<&dyn Buffer> {
        self.uniform_buffers
            .get(slot)
            .map(UniformBuffer::buffer)
            .ok_or(Error::FrameSlotOutOfRange {
                slot,
                frames_in_flight: self.uniform_buffers.len(),
            })
    }

    /// All uniform buffers, indexed by frame slot
    pub fn uniform_buffers(&self) -> impl Iterator<Item = &dyn Buffer> {
        self.uniform_buffers.iter().map(UniformBuffer::buffer)
    }

    pub fn frames_in_flight(&self) -> usize {
        self.uniform_buffers.len()
    }
}

#[cfg(test)]
#[path = "buffer_manager_tests.rs"]
mod tests;
