use crate::coords::PixelRect;
use crate::surface::Bitmap;

use super::{Mesh, MeshPaint, Operator};

/// Antialiasing request carried in drawing state.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Hash)]
pub enum Antialias {
    /// Backend default (antialiased).
    #[default]
    Default,
    /// Aliased: one sample per pixel.
    None,
    Gray,
    Fast,
    Good,
    Best,
}

impl Antialias {
    #[inline]
    pub fn is_enabled(self) -> bool {
        !matches!(self, Antialias::None)
    }
}

/// Per-draw rasterization settings.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct RasterParams {
    pub antialias: bool,
    pub operator: Operator,
}

/// Rasterizes region-local triangle meshes into a bitmap.
///
/// `region` is the device-space sub-rectangle of `target` being drawn into;
/// mesh coordinates are relative to its origin and nothing outside it is touched.
pub trait Rasterizer: Send {
    fn name(&self) -> &'static str;

    fn draw_mesh(
        &mut self,
        target: &mut Bitmap,
        region: PixelRect,
        mesh: &Mesh,
        paint: &MeshPaint,
        params: &RasterParams,
    );
}
