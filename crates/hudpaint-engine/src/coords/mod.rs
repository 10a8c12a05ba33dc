//! Coordinate and geometry types shared by the path engine and rasterizers.
//!
//! Canonical device space:
//! - Pixels of the bound surface
//! - Origin top-left
//! - +X right, +Y down
//!
//! User space is device space seen through the current [`AffineTransform`].

mod affine;
mod bounds;
mod rect;
mod vec2;

pub use affine::AffineTransform;
pub use bounds::Bounds;
pub use rect::{PixelRect, Rect};
pub use vec2::Vec2;
