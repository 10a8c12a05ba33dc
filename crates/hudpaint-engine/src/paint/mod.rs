//! Paint model shared between the drawing context and rasterizers.
//!
//! Scope:
//! - color representation (straight alpha)
//! - gradient stops and extend policies
//! - the [`Pattern`] tagged union and its sampling entry point

pub mod color;
pub mod gradient;
mod pattern;

pub use color::Color;
pub use gradient::{ColorStop, Extend, GradientStops, LinearGradient, RadialGradient};
pub use pattern::{Pattern, PatternKind, PatternSampler, SurfaceSource};
