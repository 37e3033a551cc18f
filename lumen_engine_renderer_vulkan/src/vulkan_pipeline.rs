/// Pipeline - Vulkan graphics pipeline for indexed 2D geometry
///
/// Fixed state: `Vertex` layout (stride 20, position at location 0, color
/// at location 1), triangle list, fill, back-face culling, counter-clockwise
/// front face, no blending, dynamic viewport and scissor. The layout carries one
/// descriptor set with the uniform buffer at binding 0.

use lumen_engine::lumen::Result;
use lumen_engine::lumen::device::Pipeline as EnginePipeline;
use lumen_engine::lumen::frame::{UniformBufferObject, Vertex};
use lumen_engine::engine_debug;
use ash::vk;
use std::any::Any;
use std::path::Path;
use std::sync::Arc;

use crate::vulkan_context::GpuContext;
use crate::vulkan_convert::vk_error;
use crate::vulkan_render_pass::RenderPass;
use crate::vulkan_shader::{check_uniform_blocks, Shader};

/// Vulkan pipeline implementation
pub struct Pipeline {
    ctx: Arc<GpuContext>,
    /// Vulkan graphics pipeline
    pub(crate) pipeline: vk::Pipeline,
    /// Pipeline layout (used for descriptor set binding)
    pub(crate) pipeline_layout: vk::PipelineLayout,
    /// Layout of the per-frame uniform descriptor set
    pub(crate) descriptor_set_layout: vk::DescriptorSetLayout,
}

/// Vertex binding 0 and its two attributes
pub(crate) fn vertex_input_descriptions() -> (vk::VertexInputBindingDescription, [vk::VertexInputAttributeDescription; 2]) {
    let binding = vk::VertexInputBindingDescription::default()
        .binding(0)
        .stride(Vertex::STRIDE)
        .input_rate(vk::VertexInputRate::VERTEX);

    let attributes = [
        vk::VertexInputAttributeDescription::default()
            .location(0)
            .binding(0)
            .format(vk::Format::R32G32_SFLOAT)
            .offset(Vertex::POSITION_OFFSET),
        vk::VertexInputAttributeDescription::default()
            .location(1)
            .binding(0)
            .format(vk::Format::R32G32B32_SFLOAT)
            .offset(Vertex::COLOR_OFFSET),
    ];

    (binding, attributes)
}

impl Pipeline {
    /// Build the pipeline from SPIR-V files for `render_pass`
    ///
    /// # Errors
    ///
    /// Returns `InitializationFailed` if a shader file cannot be read, and
    /// `BackendError` if a shader declares uniforms the layout does not
    /// provide or a Vulkan call fails.
    pub(crate) fn new(
        ctx: Arc<GpuContext>,
        render_pass: &RenderPass,
        vertex_shader: &Path,
        fragment_shader: &Path,
    ) -> Result<Self> {
        let device = ctx.device.clone();
        let vertex = Shader::from_file(device.clone(), vertex_shader, vk::ShaderStageFlags::VERTEX)?;
        let fragment = Shader::from_file(device.clone(), fragment_shader, vk::ShaderStageFlags::FRAGMENT)?;
        for shader in [&vertex, &fragment] {
            check_uniform_blocks(&shader.uniform_blocks, UniformBufferObject::SIZE as usize)?;
        }

        unsafe {
            let ubo_binding = vk::DescriptorSetLayoutBinding::default()
                .binding(0)
                .descriptor_type(vk::DescriptorType::UNIFORM_BUFFER)
                .descriptor_count(1)
                .stage_flags(vk::ShaderStageFlags::VERTEX);

            let descriptor_set_layout = device
                .create_descriptor_set_layout(
                    &vk::DescriptorSetLayoutCreateInfo::default().bindings(std::slice::from_ref(&ubo_binding)),
                    None,
                )
                .map_err(|e| vk_error(e, "create_descriptor_set_layout"))?;

            let pipeline_layout = match device.create_pipeline_layout(
                &vk::PipelineLayoutCreateInfo::default().set_layouts(std::slice::from_ref(&descriptor_set_layout)),
                None,
            ) {
                Ok(layout) => layout,
                Err(e) => {
                    device.destroy_descriptor_set_layout(descriptor_set_layout, None);
                    return Err(vk_error(e, "create_pipeline_layout"));
                }
            };

            let entry_name = c"main";
            let stages = [
                vk::PipelineShaderStageCreateInfo::default()
                    .stage(vertex.stage)
                    .module(vertex.module)
                    .name(entry_name),
                vk::PipelineShaderStageCreateInfo::default()
                    .stage(fragment.stage)
                    .module(fragment.module)
                    .name(entry_name),
            ];

            let (binding, attributes) = vertex_input_descriptions();
            let vertex_input = vk::PipelineVertexInputStateCreateInfo::default()
                .vertex_binding_descriptions(std::slice::from_ref(&binding))
                .vertex_attribute_descriptions(&attributes);

            let input_assembly = vk::PipelineInputAssemblyStateCreateInfo::default()
                .topology(vk::PrimitiveTopology::TRIANGLE_LIST)
                .primitive_restart_enable(false);

            // Counts only; the rectangles are set per frame
            let viewport_state = vk::PipelineViewportStateCreateInfo::default()
                .viewport_count(1)
                .scissor_count(1);

            let rasterizer = vk::PipelineRasterizationStateCreateInfo::default()
                .depth_clamp_enable(false)
                .rasterizer_discard_enable(false)
                .polygon_mode(vk::PolygonMode::FILL)
                .line_width(1.0)
                .cull_mode(vk::CullModeFlags::BACK)
                // Matches the winding of the presets under the Y-flipped projection
                .front_face(vk::FrontFace::COUNTER_CLOCKWISE)
                .depth_bias_enable(false);

            let multisampling = vk::PipelineMultisampleStateCreateInfo::default()
                .sample_shading_enable(false)
                .rasterization_samples(vk::SampleCountFlags::TYPE_1);

            let color_blend_attachment = vk::PipelineColorBlendAttachmentState::default()
                .color_write_mask(vk::ColorComponentFlags::RGBA)
                .blend_enable(false);

            let color_blending = vk::PipelineColorBlendStateCreateInfo::default()
                .logic_op_enable(false)
                .attachments(std::slice::from_ref(&color_blend_attachment));

            let dynamic_states = [vk::DynamicState::VIEWPORT, vk::DynamicState::SCISSOR];
            let dynamic_state = vk::PipelineDynamicStateCreateInfo::default().dynamic_states(&dynamic_states);

            let pipeline_info = vk::GraphicsPipelineCreateInfo::default()
                .stages(&stages)
                .vertex_input_state(&vertex_input)
                .input_assembly_state(&input_assembly)
                .viewport_state(&viewport_state)
                .rasterization_state(&rasterizer)
                .multisample_state(&multisampling)
                .color_blend_state(&color_blending)
                .dynamic_state(&dynamic_state)
                .layout(pipeline_layout)
                .render_pass(render_pass.render_pass)
                .subpass(0);

            let pipeline = match device.create_graphics_pipelines(
                vk::PipelineCache::null(),
                std::slice::from_ref(&pipeline_info),
                None,
            ) {
                Ok(pipelines) => pipelines[0],
                Err((_, e)) => {
                    device.destroy_pipeline_layout(pipeline_layout, None);
                    device.destroy_descriptor_set_layout(descriptor_set_layout, None);
                    return Err(vk_error(e, "create_graphics_pipelines"));
                }
            };

            engine_debug!(
                "lumen::vulkan",
                "Graphics pipeline created from '{}' and '{}'",
                vertex_shader.display(),
                fragment_shader.display()
            );

            // Shader modules are no longer needed once the pipeline exists
            drop(vertex);
            drop(fragment);

            Ok(Self {
                ctx,
                pipeline,
                pipeline_layout,
                descriptor_set_layout,
            })
        }
    }
}

impl EnginePipeline for Pipeline {
    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl Drop for Pipeline {
    fn drop(&mut self) {
        unsafe {
            self.ctx.device.destroy_pipeline(self.pipeline, None);
            self.ctx.device.destroy_pipeline_layout(self.pipeline_layout, None);
            self.ctx.device.destroy_descriptor_set_layout(self.descriptor_set_layout, None);
        }
    }
}
