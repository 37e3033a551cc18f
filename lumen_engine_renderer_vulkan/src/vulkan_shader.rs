/// Shader - SPIR-V loading, reflection and the Vulkan shader module wrapper

use lumen_engine::lumen::{Error, Result};
use lumen_engine::{engine_bail, engine_err, engine_error};
use ash::vk;
use std::path::Path;

use crate::vulkan_convert::vk_error;

/// A uniform buffer declared by a shader
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReflectedUniformBlock {
    pub name: String,
    pub set: u32,
    pub binding: u32,
    /// Block size in bytes, when the reflection could determine it
    pub size: Option<usize>,
}

/// Vulkan shader module, destroyed on drop
pub struct Shader {
    pub(crate) module: vk::ShaderModule,
    pub(crate) stage: vk::ShaderStageFlags,
    /// Uniform buffers the shader reads
    pub(crate) uniform_blocks: Vec<ReflectedUniformBlock>,
    device: ash::Device,
}

impl Shader {
    /// Load a SPIR-V file and create a shader module from it
    pub(crate) fn from_file(device: ash::Device, path: &Path, stage: vk::ShaderStageFlags) -> Result<Self> {
        let bytes = std::fs::read(path).map_err(|e| {
            engine_error!("lumen::vulkan", "Failed to read shader '{}': {}", path.display(), e);
            Error::InitializationFailed(format!("failed to read shader '{}': {}", path.display(), e))
        })?;
        Self::from_bytes(device, &bytes, stage)
            .map_err(|e| Error::InitializationFailed(format!("shader '{}': {}", path.display(), e)))
    }

    /// Create a shader module from SPIR-V bytes
    pub(crate) fn from_bytes(device: ash::Device, bytes: &[u8], stage: vk::ShaderStageFlags) -> Result<Self> {
        // read_spv checks the magic number and copies into u32-aligned storage
        let code = ash::util::read_spv(&mut std::io::Cursor::new(bytes))
            .map_err(|e| engine_err!("lumen::vulkan", "Invalid SPIR-V ({} bytes): {}", bytes.len(), e))?;

        let uniform_blocks = reflect_uniform_blocks(&code)?;

        let module = unsafe {
            device
                .create_shader_module(&vk::ShaderModuleCreateInfo::default().code(&code), None)
                .map_err(|e| vk_error(e, "create_shader_module"))?
        };

        Ok(Self {
            module,
            stage,
            uniform_blocks,
            device,
        })
    }
}

impl Drop for Shader {
    fn drop(&mut self) {
        unsafe {
            self.device.destroy_shader_module(self.module, None);
        }
    }
}

/// List the uniform buffers declared by a SPIR-V module using spirq
pub(crate) fn reflect_uniform_blocks(code: &[u32]) -> Result<Vec<ReflectedUniformBlock>> {
    let entry_points = spirq::ReflectConfig::new()
        .spv(code)
        .ref_all_rscs(true)
        .reflect()
        .map_err(|e| engine_err!("lumen::vulkan", "SPIR-V reflection failed: {:?}", e))?;

    let mut blocks = Vec::new();
    for entry_point in &entry_points {
        for var in entry_point.vars.iter() {
            if let spirq::var::Variable::Descriptor { name, desc_bind, desc_ty, ty, .. } = var {
                if matches!(desc_ty, spirq::ty::DescriptorType::UniformBuffer()) {
                    let block = ReflectedUniformBlock {
                        name: name.clone().unwrap_or_default(),
                        set: desc_bind.set(),
                        binding: desc_bind.bind(),
                        size: ty.nbyte(),
                    };
                    if !blocks.contains(&block) {
                        blocks.push(block);
                    }
                }
            }
        }
    }
    Ok(blocks)
}

/// Check that the uniform blocks match the one layout the pipeline provides
///
/// The pipeline layout has exactly one uniform buffer, at set 0 binding 0,
/// holding `expected_size` bytes. A shader may also declare no uniforms.
pub(crate) fn check_uniform_blocks(blocks: &[ReflectedUniformBlock], expected_size: usize) -> Result<()> {
    for block in blocks {
        if block.set != 0 || block.binding != 0 {
            engine_bail!(
                "lumen::vulkan",
                "Uniform block '{}' at set {} binding {} is not provided (only set 0 binding 0)",
                block.name,
                block.set,
                block.binding
            );
        }
        if let Some(size) = block.size {
            if size != expected_size {
                engine_bail!(
                    "lumen::vulkan",
                    "Uniform block '{}' is {} bytes, the uniform buffer holds {}",
                    block.name,
                    size,
                    expected_size
                );
            }
        }
    }
    Ok(())
}

#[cfg(test)]
#[path = "vulkan_shader_tests.rs"]
mod tests;
