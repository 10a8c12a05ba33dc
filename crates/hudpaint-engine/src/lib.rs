//! hudpaint engine crate.
//!
//! Immediate-mode vector drawing for overlay graphics: a stateful drawing
//! context (paths, transforms, bounding-box clipping, patterns, groups) that
//! lowers every drawing op to triangle meshes for a pluggable rasterizer.
//!
//! Layers, bottom-up:
//! - [`coords`], [`paint`], [`path`]: value types
//! - [`tessellate`]: fill/stroke triangulation
//! - [`raster`]: mesh rasterizers (software reference, wgpu)
//! - [`surface`]: off-screen bitmaps with an explicit lifecycle
//! - [`context`], [`shared`]: the drawing API

pub mod coords;
pub mod error;
pub mod logging;
pub mod paint;
pub mod path;
pub mod raster;
pub mod surface;
pub mod tessellate;
pub mod text;

pub mod context;
pub mod shared;

pub use context::{ContextConfig, DrawingContext, GraphicsState};
pub use coords::{AffineTransform, Vec2};
pub use paint::{Color, Extend, Pattern};
pub use raster::{Antialias, Operator};
pub use shared::SharedContext;
pub use surface::{Content, Surface};
