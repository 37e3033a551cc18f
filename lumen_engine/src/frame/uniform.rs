/// Per-frame uniform data

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3};

/// Model, view and projection transforms read by the vertex shader
///
/// Three column-major 4x4 matrices, 192 bytes, no padding.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct UniformBufferObject {
    pub model: Mat4,
    pub view: Mat4,
    pub projection: Mat4,
}

impl UniformBufferObject {
    /// Size in bytes
    pub const SIZE: u64 = std::mem::size_of::<UniformBufferObject>() as u64;

    /// All three transforms set to identity
    pub fn identity() -> Self {
        Self {
            model: Mat4::IDENTITY,
            view: Mat4::IDENTITY,
            projection: Mat4::IDENTITY,
        }
    }

    /// Geometry spinning around Z at 90 degrees per second, seen from (2, 2, 2)
    ///
    /// The projection flips Y to match Vulkan clip space.
    pub fn rotating(elapsed_secs: f32, aspect_ratio: f32) -> Self {
        let model = Mat4::from_rotation_z(elapsed_secs * 90f32.to_radians());
        let view = Mat4::look_at_rh(Vec3::splat(2.0), Vec3::ZERO, Vec3::Z);
        let mut projection = Mat4::perspective_rh(45f32.to_radians(), aspect_ratio, 0.1, 10.0);
        projection.y_axis.y *= -1.0;

        Self { model, view, projection }
    }

    /// Raw bytes as written to the uniform buffer
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::bytes_of(self)
    }
}

impl Default for UniformBufferObject {
    fn default() -> Self {
        Self::identity()
    }
}

#[cfg(test)]
#[path = "uniform_tests.rs"]
mod tests;
