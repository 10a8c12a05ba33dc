//! Fill and stroke triangulation of user-space paths.

mod geometry;
mod style;
mod tessellator;

pub use geometry::Geometry;
pub use style::{FillRule, LineCap, LineJoin, StrokeStyle};
pub use tessellator::{fill, stroke};
