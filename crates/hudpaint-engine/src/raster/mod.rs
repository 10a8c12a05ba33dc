//! Triangle-mesh rasterization into surface bitmaps.

mod gpu;
mod mesh;
mod operator;
mod rasterizer;
mod software;

pub use gpu::{GpuRasterizer, GpuRasterizerInit};
pub use mesh::{Mesh, MeshPaint, MeshVertex, PaintImage};
pub use operator::Operator;
pub use rasterizer::{Antialias, RasterParams, Rasterizer};
pub use software::SoftwareRasterizer;
