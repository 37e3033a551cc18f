/// Conversions between engine types and Vulkan types
///
/// Pure functions only, so they are testable without a GPU.

use ash::vk;
use lumen_engine::lumen::device::{BufferUsage, IndexType, MemoryLocation, PipelineStage};
use lumen_engine::lumen::Error;
use lumen_engine::{engine_error, engine_warn};

/// Translate a Vulkan result code into an engine error
///
/// `context` names the failing call and ends up in the error message.
pub(crate) fn vk_result_to_error(result: vk::Result, context: &str) -> Error {
    match result {
        vk::Result::ERROR_OUT_OF_DATE_KHR => Error::SurfaceOutOfDate,
        vk::Result::ERROR_OUT_OF_DEVICE_MEMORY | vk::Result::ERROR_OUT_OF_HOST_MEMORY => {
            Error::OutOfMemory
        }
        vk::Result::ERROR_DEVICE_LOST => Error::DeviceLost,
        vk::Result::TIMEOUT | vk::Result::NOT_READY => Error::Timeout(context.to_string()),
        other => Error::BackendError(format!("{}: {:?}", context, other)),
    }
}

/// Like `vk_result_to_error`, logging the failure first
///
/// Transient results are logged as warnings, everything else as errors.
pub(crate) fn vk_error(result: vk::Result, context: &str) -> Error {
    let error = vk_result_to_error(result, context);
    if error.is_transient() {
        engine_warn!("lumen::vulkan", "{}: {:?}", context, result);
    } else {
        engine_error!("lumen::vulkan", "{}: {:?}", context, result);
    }
    error
}

pub(crate) fn buffer_usage_to_vk(usage: BufferUsage) -> vk::BufferUsageFlags {
    let mut flags = vk::BufferUsageFlags::empty();
    if usage.contains(BufferUsage::VERTEX) {
        flags |= vk::BufferUsageFlags::VERTEX_BUFFER;
    }
    if usage.contains(BufferUsage::INDEX) {
        flags |= vk::BufferUsageFlags::INDEX_BUFFER;
    }
    if usage.contains(BufferUsage::UNIFORM) {
        flags |= vk::BufferUsageFlags::UNIFORM_BUFFER;
    }
    if usage.contains(BufferUsage::TRANSFER_SRC) {
        flags |= vk::BufferUsageFlags::TRANSFER_SRC;
    }
    if usage.contains(BufferUsage::TRANSFER_DST) {
        flags |= vk::BufferUsageFlags::TRANSFER_DST;
    }
    flags
}

pub(crate) fn memory_location_to_gpu_allocator(location: MemoryLocation) -> gpu_allocator::MemoryLocation {
    match location {
        MemoryLocation::GpuOnly => gpu_allocator::MemoryLocation::GpuOnly,
        MemoryLocation::CpuToGpu => gpu_allocator::MemoryLocation::CpuToGpu,
        MemoryLocation::GpuToCpu => gpu_allocator::MemoryLocation::GpuToCpu,
    }
}

pub(crate) fn index_type_to_vk(index_type: IndexType) -> vk::IndexType {
    match index_type {
        IndexType::U16 => vk::IndexType::UINT16,
        IndexType::U32 => vk::IndexType::UINT32,
    }
}

pub(crate) fn pipeline_stage_to_vk(stage: PipelineStage) -> vk::PipelineStageFlags {
    match stage {
        PipelineStage::ColorAttachmentOutput => vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT,
        PipelineStage::Transfer => vk::PipelineStageFlags::TRANSFER,
        PipelineStage::TopOfPipe => vk::PipelineStageFlags::TOP_OF_PIPE,
    }
}

#[cfg(test)]
#[path = "vulkan_convert_tests.rs"]
mod tests;
