/// Vertex layout and the built-in indexed geometry

use bytemuck::{Pod, Zeroable};

/// 2D position plus RGB color
///
/// Layout: `position` at location 0 (R32G32_SFLOAT, offset 0) and `color`
/// at location 1 (R32G32B32_SFLOAT, offset 8), 20 bytes per vertex.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 2],
    pub color: [f32; 3],
}

impl Vertex {
    /// Size of one vertex in bytes
    pub const STRIDE: u32 = std::mem::size_of::<Vertex>() as u32;
    /// Byte offset of `position`
    pub const POSITION_OFFSET: u32 = 0;
    /// Byte offset of `color`
    pub const COLOR_OFFSET: u32 = 8;

    pub const fn new(position: [f32; 2], color: [f32; 3]) -> Self {
        Self { position, color }
    }
}

/// Static indexed geometry with 16-bit indices
#[derive(Debug, Clone, PartialEq)]
pub struct IndexedGeometry {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u16>,
}

impl IndexedGeometry {
    /// Red/green/blue triangle
    pub fn triangle() -> Self {
        Self {
            vertices: vec![
                Vertex::new([0.0, -0.5], [1.0, 0.0, 0.0]),
                Vertex::new([0.5, 0.5], [0.0, 1.0, 0.0]),
                Vertex::new([-0.5, 0.5], [0.0, 0.0, 1.0]),
            ],
            indices: vec![0, 1, 2],
        }
    }

    /// Quad made of two triangles sharing an edge
    pub fn quad() -> Self {
        Self {
            vertices: vec![
                Vertex::new([-0.5, -0.5], [1.0, 0.0, 0.0]),
                Vertex::new([0.5, -0.5], [0.0, 1.0, 0.0]),
                Vertex::new([0.5, 0.5], [0.0, 0.0, 1.0]),
                Vertex::new([-0.5, 0.5], [1.0, 1.0, 1.0]),
            ],
            indices: vec![0, 1, 2, 2, 3, 0],
        }
    }
}

#[cfg(test)]
#[path = "vertex_tests.rs"]
mod tests;
