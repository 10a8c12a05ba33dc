use bytemuck::{Pod, Zeroable};

use crate::coords::Vec2;
use crate::tessellate::Geometry;

/// Region-local device-space vertex with a premultiplied color.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct MeshVertex {
    pub pos: [f32; 2],
    pub color: [f32; 4],
}

impl MeshVertex {
    const ATTRS: [wgpu::VertexAttribute; 2] = wgpu::vertex_attr_array![
        0 => Float32x2, // pos
        1 => Float32x4  // color
    ];

    pub(super) fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<MeshVertex>() as u64,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRS,
        }
    }
}

/// Indexed triangle list ready for a rasterizer.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Mesh {
    pub vertices: Vec<MeshVertex>,
    pub indices: Vec<u32>,
}

impl Mesh {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty() || self.indices.len() < 3
    }

    /// Builds a mesh from device-space geometry, shifting every vertex by
    /// `-origin` and giving each the same premultiplied `color`.
    pub fn from_geometry(geometry: &Geometry, origin: Vec2, color: [f32; 4]) -> Self {
        let vertices = geometry
            .vertices
            .iter()
            .map(|v| MeshVertex {
                pos: [(v.x - origin.x) as f32, (v.y - origin.y) as f32],
                color,
            })
            .collect();
        Self { vertices, indices: geometry.indices.clone() }
    }

    /// Two triangles covering `width` × `height` from the region origin.
    pub fn quad(width: f32, height: f32, color: [f32; 4]) -> Self {
        let v = |x: f32, y: f32| MeshVertex { pos: [x, y], color };
        Self {
            vertices: vec![v(0.0, 0.0), v(width, 0.0), v(width, height), v(0.0, height)],
            indices: vec![0, 1, 2, 0, 2, 3],
        }
    }
}

/// Premultiplied per-pixel paint in device space.
#[derive(Debug, Clone, PartialEq)]
pub struct PaintImage {
    width: u32,
    height: u32,
    texels: Vec<[f32; 4]>,
}

impl PaintImage {
    /// Evaluates `f(x, y)` at every texel; dimensions clamp to at least 1×1.
    pub fn from_fn(width: u32, height: u32, mut f: impl FnMut(u32, u32) -> [f32; 4]) -> Self {
        let width = width.max(1);
        let height = height.max(1);
        let mut texels = Vec::with_capacity(width as usize * height as usize);
        for y in 0..height {
            for x in 0..width {
                texels.push(f(x, y));
            }
        }
        Self { width, height, texels }
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Out-of-range texels are transparent.
    #[inline]
    pub fn texel(&self, x: i64, y: i64) -> [f32; 4] {
        if x < 0 || y < 0 || x >= self.width as i64 || y >= self.height as i64 {
            return [0.0; 4];
        }
        self.texels[(y as usize) * self.width as usize + x as usize]
    }

    #[inline]
    pub fn texels(&self) -> &[[f32; 4]] {
        &self.texels
    }

    /// Scales every texel by `alpha` (for paint-with-alpha and group opacity).
    pub fn scale_alpha(&mut self, alpha: f32) {
        let a = alpha.clamp(0.0, 1.0);
        for t in &mut self.texels {
            *t = t.map(|c| c * a);
        }
    }
}

/// Where a fragment's color comes from.
#[derive(Debug, Clone, PartialEq)]
pub enum MeshPaint {
    /// Interpolated vertex colors.
    VertexColor,
    /// `image` texel at the fragment's device position, modulated by the vertex color.
    ///
    /// `origin` is the device pixel that texel `(0, 0)` covers.
    Texture { image: PaintImage, origin: (i32, i32) },
}
