//! Off-screen bitmaps.
//!
//! Scope:
//! - [`Bitmap`]: plain straight-alpha RGBA8 pixel storage
//! - [`Surface`]: shared handle with an explicit create/destroy lifecycle
//! - PNG import/export for regression baselines

mod bitmap;
mod codec;
#[allow(clippy::module_inception)]
mod surface;

pub use bitmap::{Bitmap, MAX_DIMENSION};
pub use surface::{Content, Surface};
