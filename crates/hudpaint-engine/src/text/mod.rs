//! Text measurement and glyph drawing collaborator.
//!
//! The drawing context forwards font selection opaquely and calls into a
//! [`TextEngine`] for measurement and glyph output. [`FontRegistry`] is the
//! fontdue-backed implementation.

mod font;
mod registry;

pub use font::{FontExtents, FontSelection, FontSlant, FontWeight, TextExtents};
pub use registry::FontRegistry;

use crate::coords::{PixelRect, Vec2};
use crate::paint::Color;
use crate::surface::Bitmap;

/// Font measurement and glyph rasterization.
pub trait TextEngine: Send + Sync {
    /// Advance and line height of `text` set in `font`.
    fn measure_text(&self, text: &str, font: &FontSelection) -> TextExtents;

    fn font_extents(&self, font: &FontSelection) -> FontExtents;

    /// Draws `text` with its baseline starting at device-space `origin`,
    /// compositing `color` over `target` inside `clip`.
    fn draw_text(
        &self,
        target: &mut Bitmap,
        origin: Vec2,
        text: &str,
        font: &FontSelection,
        color: Color,
        clip: PixelRect,
    );
}
