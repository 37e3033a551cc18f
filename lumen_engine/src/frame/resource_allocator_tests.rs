//! Unit tests for resource_allocator.rs and transfer_manager.rs

use std::sync::Arc;
use crate::error::Error;
use crate::frame::ResourceAllocator;
use crate::graphics_device::mock_graphics_device::{MockBuffer, MockEvent, MockFailures, MockGraphicsDevice};
use crate::graphics_device::{BufferUsage, GraphicsDevice, MemoryLocation};

fn allocator_for(device: &MockGraphicsDevice) -> ResourceAllocator {
    let device: Arc<dyn GraphicsDevice> = Arc::new(device.clone());
    ResourceAllocator::new(device).unwrap()
}

fn id_of(buffer: &dyn crate::graphics_device::Buffer) -> u64 {
    buffer.as_any().downcast_ref::<MockBuffer>().unwrap().id
}

// ============================================================================
// BUFFER CREATION
// ============================================================================

#[test]
fn test_create_buffer_rejects_zero_size() {
    let device = MockGraphicsDevice::new();
    let allocator = allocator_for(&device);

    let result = allocator.create_buffer("empty", 0, BufferUsage::VERTEX, MemoryLocation::GpuOnly);

    assert!(matches!(result, Err(Error::InvalidResource(_))));
    assert_eq!(allocator.live_allocations(), 0);
}

#[test]
fn test_staging_buffer_holds_data_and_is_unmapped() {
    let device = MockGraphicsDevice::new();
    let allocator = allocator_for(&device);

    let staging = allocator.create_staging_buffer("staging", &[1, 2, 3]).unwrap();

    assert!(staging.mapped_ptr().is_none());
    assert!(staging.usage().contains(BufferUsage::TRANSFER_SRC));
    assert_eq!(staging.location(), MemoryLocation::CpuToGpu);
    assert_eq!(device.buffer_contents(id_of(staging.as_ref())), vec![1, 2, 3]);
}

#[test]
fn test_staging_buffer_map_failure_frees_buffer() {
    let device = MockGraphicsDevice::with_failures(MockFailures {
        fail_map: true,
        ..MockFailures::default()
    });
    let allocator = allocator_for(&device);

    let result = allocator.create_staging_buffer("staging", &[1, 2, 3]);

    assert!(matches!(result, Err(Error::ResourceState(_))));
    assert_eq!(allocator.live_allocations(), 0);
}

// ============================================================================
// TRANSFERS
// ============================================================================

#[test]
fn test_copy_buffer_is_synchronous() {
    let device = MockGraphicsDevice::new();
    let allocator = allocator_for(&device);
    let staging = allocator.create_staging_buffer("staging", &[9, 8, 7, 6]).unwrap();
    let dst = allocator
        .create_buffer("dst", 4, BufferUsage::VERTEX | BufferUsage::TRANSFER_DST, MemoryLocation::GpuOnly)
        .unwrap();

    allocator.copy_buffer(staging.as_ref(), dst.as_ref(), 4).unwrap();

    assert_eq!(device.pending_submissions(), 0);
    assert_eq!(device.buffer_contents(id_of(dst.as_ref())), vec![9, 8, 7, 6]);
    assert!(device.events().contains(&MockEvent::QueueWaitIdle));
    // One-shot command list is freed after the copy
    assert_eq!(device.state().live_command_lists, 0);
}

#[test]
fn test_copy_buffer_requires_transfer_usage() {
    let device = MockGraphicsDevice::new();
    let allocator = allocator_for(&device);
    let src = allocator
        .create_buffer("src", 4, BufferUsage::VERTEX, MemoryLocation::CpuToGpu)
        .unwrap();
    let dst = allocator
        .create_buffer("dst", 4, BufferUsage::TRANSFER_DST, MemoryLocation::GpuOnly)
        .unwrap();

    let result = allocator.copy_buffer(src.as_ref(), dst.as_ref(), 4);
    assert!(matches!(result, Err(Error::PreconditionViolation(_))));
}

#[test]
fn test_copy_buffer_rejects_oversized_copy() {
    let device = MockGraphicsDevice::new();
    let allocator = allocator_for(&device);
    let staging = allocator.create_staging_buffer("staging", &[1, 2]).unwrap();
    let dst = allocator
        .create_buffer("dst", 8, BufferUsage::TRANSFER_DST, MemoryLocation::GpuOnly)
        .unwrap();

    let result = allocator.copy_buffer(staging.as_ref(), dst.as_ref(), 8);
    assert!(matches!(result, Err(Error::PreconditionViolation(_))));
}

#[test]
fn test_failed_copy_frees_command_list() {
    let device = MockGraphicsDevice::with_failures(MockFailures {
        fail_transfer_submit: true,
        ..MockFailures::default()
    });
    let allocator = allocator_for(&device);
    let staging = allocator.create_staging_buffer("staging", &[1, 2]).unwrap();
    let dst = allocator
        .create_buffer("dst", 2, BufferUsage::TRANSFER_DST, MemoryLocation::GpuOnly)
        .unwrap();

    let result = allocator.copy_buffer(staging.as_ref(), dst.as_ref(), 2);

    assert!(matches!(result, Err(Error::BackendError(_))));
    assert_eq!(device.state().live_command_lists, 0);
    assert_eq!(device.pending_submissions(), 0);
}
