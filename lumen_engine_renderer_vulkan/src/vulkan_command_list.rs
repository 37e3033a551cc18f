/// CommandList and CommandPool - Vulkan implementations of the recording traits

use lumen_engine::lumen::{Error, Result};
use lumen_engine::lumen::device::{
    Buffer as EngineBuffer,
    ClearValue,
    CommandList as EngineCommandList,
    CommandListUsage,
    CommandPool as EngineCommandPool,
    CommandPoolKind,
    DescriptorSet as EngineDescriptorSet,
    Framebuffer as EngineFramebuffer,
    IndexType,
    Pipeline as EnginePipeline,
    Rect2D,
    RenderPass as EngineRenderPass,
    Viewport,
};
use lumen_engine::engine_bail;
use ash::vk;
use std::any::Any;
use std::sync::Arc;

use crate::vulkan_buffer::Buffer;
use crate::vulkan_context::GpuContext;
use crate::vulkan_convert::{index_type_to_vk, vk_error};
use crate::vulkan_descriptor_set::DescriptorSet;
use crate::vulkan_frame_buffer::Framebuffer;
use crate::vulkan_pipeline::Pipeline;
use crate::vulkan_render_pass::RenderPass;

/// Recover the Vulkan type behind an engine trait object
fn downcast<'a, T: 'static>(any: &'a dyn Any, what: &str) -> Result<&'a T> {
    any.downcast_ref::<T>()
        .ok_or_else(|| Error::InvalidResource(format!("{} was not created by the Vulkan backend", what)))
}

// ============================================================================
// Command pool
// ============================================================================

/// Vulkan command pool
///
/// Command buffers allocated from one pool must be recorded from one thread
/// at a time.
pub struct CommandPool {
    ctx: Arc<GpuContext>,
    pub(crate) pool: vk::CommandPool,
    kind: CommandPoolKind,
}

impl CommandPool {
    pub(crate) fn new(ctx: Arc<GpuContext>, kind: CommandPoolKind) -> Result<Self> {
        let flags = match kind {
            CommandPoolKind::ResetIndividual => vk::CommandPoolCreateFlags::RESET_COMMAND_BUFFER,
            CommandPoolKind::Transient => {
                vk::CommandPoolCreateFlags::TRANSIENT | vk::CommandPoolCreateFlags::RESET_COMMAND_BUFFER
            }
        };

        let pool = unsafe {
            ctx.device
                .create_command_pool(
                    &vk::CommandPoolCreateInfo::default()
                        .queue_family_index(ctx.graphics_queue_family)
                        .flags(flags),
                    None,
                )
                .map_err(|e| vk_error(e, "create_command_pool"))?
        };

        Ok(Self { ctx, pool, kind })
    }
}

impl EngineCommandPool for CommandPool {
    fn allocate(self: Arc<Self>, count: usize) -> Result<Vec<Box<dyn EngineCommandList>>> {
        let allocate_info = vk::CommandBufferAllocateInfo::default()
            .command_pool(self.pool)
            .level(vk::CommandBufferLevel::PRIMARY)
            .command_buffer_count(count as u32);

        let command_buffers = unsafe {
            self.ctx
                .device
                .allocate_command_buffers(&allocate_info)
                .map_err(|e| vk_error(e, "allocate_command_buffers"))?
        };

        Ok(command_buffers
            .into_iter()
            .map(|command_buffer| {
                Box::new(CommandList {
                    pool: self.clone(),
                    command_buffer,
                    is_recording: false,
                    in_render_pass: false,
                }) as Box<dyn EngineCommandList>
            })
            .collect())
    }

    fn kind(&self) -> CommandPoolKind {
        self.kind
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl Drop for CommandPool {
    fn drop(&mut self) {
        unsafe {
            self.ctx.device.destroy_command_pool(self.pool, None);
        }
    }
}

// ============================================================================
// Command list
// ============================================================================

/// Vulkan command list implementation
///
/// Records rendering commands for later submission to the GPU. The command
/// buffer is freed back to its pool on drop.
pub struct CommandList {
    /// Pool the buffer was allocated from (kept alive by this list)
    pool: Arc<CommandPool>,
    /// Command buffer for recording
    pub(crate) command_buffer: vk::CommandBuffer,
    /// Whether the command list is currently recording
    is_recording: bool,
    /// Whether we're inside a render pass
    in_render_pass: bool,
}

impl CommandList {
    fn device(&self) -> &ash::Device {
        &self.pool.ctx.device
    }

    fn ensure_recording(&self) -> Result<()> {
        if !self.is_recording {
            engine_bail!("lumen::vulkan", "Command list not recording");
        }
        Ok(())
    }

    fn ensure_in_render_pass(&self) -> Result<()> {
        self.ensure_recording()?;
        if !self.in_render_pass {
            engine_bail!("lumen::vulkan", "Command requires an active render pass");
        }
        Ok(())
    }
}

impl EngineCommandList for CommandList {
    fn reset(&mut self) -> Result<()> {
        unsafe {
            self.device()
                .reset_command_buffer(self.command_buffer, vk::CommandBufferResetFlags::empty())
                .map_err(|e| vk_error(e, "reset_command_buffer"))?;
        }
        self.is_recording = false;
        self.in_render_pass = false;
        Ok(())
    }

    fn begin(&mut self, usage: CommandListUsage) -> Result<()> {
        if self.is_recording {
            engine_bail!("lumen::vulkan", "Command list already recording");
        }

        let flags = match usage {
            CommandListUsage::OneTimeSubmit => vk::CommandBufferUsageFlags::ONE_TIME_SUBMIT,
            CommandListUsage::Reusable => vk::CommandBufferUsageFlags::empty(),
        };

        unsafe {
            self.device()
                .begin_command_buffer(self.command_buffer, &vk::CommandBufferBeginInfo::default().flags(flags))
                .map_err(|e| vk_error(e, "begin_command_buffer"))?;
        }
        self.is_recording = true;
        self.in_render_pass = false;
        Ok(())
    }

    fn end(&mut self) -> Result<()> {
        self.ensure_recording()?;
        if self.in_render_pass {
            engine_bail!("lumen::vulkan", "Render pass not ended before ending command list");
        }

        unsafe {
            self.device()
                .end_command_buffer(self.command_buffer)
                .map_err(|e| vk_error(e, "end_command_buffer"))?;
        }
        self.is_recording = false;
        Ok(())
    }

    fn begin_render_pass(
        &mut self,
        render_pass: &dyn EngineRenderPass,
        framebuffer: &dyn EngineFramebuffer,
        render_area: Rect2D,
        clear_values: &[ClearValue],
    ) -> Result<()> {
        self.ensure_recording()?;
        if self.in_render_pass {
            engine_bail!("lumen::vulkan", "Already inside a render pass");
        }

        let vk_render_pass = downcast::<RenderPass>(render_pass.as_any(), "render pass")?;
        let vk_framebuffer = downcast::<Framebuffer>(framebuffer.as_any(), "framebuffer")?;

        let vk_clear_values: Vec<vk::ClearValue> = clear_values
            .iter()
            .map(|value| match *value {
                ClearValue::Color(color) => vk::ClearValue {
                    color: vk::ClearColorValue { float32: color },
                },
                ClearValue::DepthStencil { depth, stencil } => vk::ClearValue {
                    depth_stencil: vk::ClearDepthStencilValue { depth, stencil },
                },
            })
            .collect();

        let begin_info = vk::RenderPassBeginInfo::default()
            .render_pass(vk_render_pass.render_pass)
            .framebuffer(vk_framebuffer.framebuffer)
            .render_area(vk::Rect2D {
                offset: vk::Offset2D { x: render_area.x, y: render_area.y },
                extent: vk::Extent2D { width: render_area.width, height: render_area.height },
            })
            .clear_values(&vk_clear_values);

        unsafe {
            self.device()
                .cmd_begin_render_pass(self.command_buffer, &begin_info, vk::SubpassContents::INLINE);
        }
        self.in_render_pass = true;
        Ok(())
    }

    fn end_render_pass(&mut self) -> Result<()> {
        self.ensure_in_render_pass()?;
        unsafe {
            self.device().cmd_end_render_pass(self.command_buffer);
        }
        self.in_render_pass = false;
        Ok(())
    }

    fn bind_pipeline(&mut self, pipeline: &dyn EnginePipeline) -> Result<()> {
        self.ensure_in_render_pass()?;
        let vk_pipeline = downcast::<Pipeline>(pipeline.as_any(), "pipeline")?;
        unsafe {
            self.device().cmd_bind_pipeline(
                self.command_buffer,
                vk::PipelineBindPoint::GRAPHICS,
                vk_pipeline.pipeline,
            );
        }
        Ok(())
    }

    fn set_viewport(&mut self, viewport: Viewport) -> Result<()> {
        self.ensure_recording()?;
        let vk_viewport = vk::Viewport {
            x: viewport.x,
            y: viewport.y,
            width: viewport.width,
            height: viewport.height,
            min_depth: viewport.min_depth,
            max_depth: viewport.max_depth,
        };
        unsafe {
            self.device().cmd_set_viewport(self.command_buffer, 0, &[vk_viewport]);
        }
        Ok(())
    }

    fn set_scissor(&mut self, scissor: Rect2D) -> Result<()> {
        self.ensure_recording()?;
        let vk_scissor = vk::Rect2D {
            offset: vk::Offset2D { x: scissor.x, y: scissor.y },
            extent: vk::Extent2D { width: scissor.width, height: scissor.height },
        };
        unsafe {
            self.device().cmd_set_scissor(self.command_buffer, 0, &[vk_scissor]);
        }
        Ok(())
    }

    fn bind_vertex_buffer(&mut self, buffer: &dyn EngineBuffer, offset: u64) -> Result<()> {
        self.ensure_recording()?;
        let vk_buffer = downcast::<Buffer>(buffer.as_any(), "vertex buffer")?;
        unsafe {
            self.device()
                .cmd_bind_vertex_buffers(self.command_buffer, 0, &[vk_buffer.buffer], &[offset]);
        }
        Ok(())
    }

    fn bind_index_buffer(&mut self, buffer: &dyn EngineBuffer, offset: u64, index_type: IndexType) -> Result<()> {
        self.ensure_recording()?;
        let vk_buffer = downcast::<Buffer>(buffer.as_any(), "index buffer")?;
        unsafe {
            self.device().cmd_bind_index_buffer(
                self.command_buffer,
                vk_buffer.buffer,
                offset,
                index_type_to_vk(index_type),
            );
        }
        Ok(())
    }

    fn bind_descriptor_set(
        &mut self,
        pipeline: &dyn EnginePipeline,
        set_index: u32,
        descriptor_set: &dyn EngineDescriptorSet,
    ) -> Result<()> {
        self.ensure_recording()?;
        let vk_pipeline = downcast::<Pipeline>(pipeline.as_any(), "pipeline")?;
        let vk_set = downcast::<DescriptorSet>(descriptor_set.as_any(), "descriptor set")?;
        unsafe {
            self.device().cmd_bind_descriptor_sets(
                self.command_buffer,
                vk::PipelineBindPoint::GRAPHICS,
                vk_pipeline.pipeline_layout,
                set_index,
                &[vk_set.descriptor_set],
                &[],
            );
        }
        Ok(())
    }

    fn draw_indexed(
        &mut self,
        index_count: u32,
        instance_count: u32,
        first_index: u32,
        vertex_offset: i32,
        first_instance: u32,
    ) -> Result<()> {
        self.ensure_in_render_pass()?;
        unsafe {
            self.device().cmd_draw_indexed(
                self.command_buffer,
                index_count,
                instance_count,
                first_index,
                vertex_offset,
                first_instance,
            );
        }
        Ok(())
    }

    fn copy_buffer(&mut self, src: &dyn EngineBuffer, dst: &dyn EngineBuffer, size: u64) -> Result<()> {
        self.ensure_recording()?;
        if self.in_render_pass {
            engine_bail!("lumen::vulkan", "Buffer copies are not allowed inside a render pass");
        }
        let vk_src = downcast::<Buffer>(src.as_any(), "copy source")?;
        let vk_dst = downcast::<Buffer>(dst.as_any(), "copy destination")?;
        let region = vk::BufferCopy::default().src_offset(0).dst_offset(0).size(size);
        unsafe {
            self.device()
                .cmd_copy_buffer(self.command_buffer, vk_src.buffer, vk_dst.buffer, &[region]);
        }
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl Drop for CommandList {
    fn drop(&mut self) {
        unsafe {
            self.pool
                .ctx
                .device
                .free_command_buffers(self.pool.pool, &[self.command_buffer]);
        }
    }
}
