use crate::coords::{AffineTransform, Bounds, PixelRect, Rect, Vec2};

/// Bounding-box clip, tracked in device space.
///
/// Clipping is approximate: a clip path is reduced to the axis-aligned box of
/// its device-space bounds, and drawing is confined to the pixels that box
/// touches.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub enum ClipRegion {
    /// No clip: the whole target.
    #[default]
    Unbounded,
    Box(Rect),
    /// Clip path had no extent; nothing can be drawn.
    Empty,
}

impl ClipRegion {
    /// Box around user-space `bounds` seen through `matrix`.
    pub fn from_bounds(bounds: &Bounds, matrix: &AffineTransform) -> Self {
        let Some(rect) = bounds.to_rect() else {
            return ClipRegion::Empty;
        };
        match device_box(rect, matrix) {
            Some(r) => ClipRegion::Box(r),
            None => ClipRegion::Empty,
        }
    }

    #[inline]
    pub fn is_active(&self) -> bool {
        !matches!(self, ClipRegion::Unbounded)
    }

    /// Inclusive containment of a device-space point.
    pub fn contains(&self, p: Vec2) -> bool {
        match self {
            ClipRegion::Unbounded => true,
            ClipRegion::Box(r) => r.contains_inclusive(p),
            ClipRegion::Empty => false,
        }
    }

    /// Device-space extent of the clip within a `target` of the given size.
    pub fn device_extent(&self, target: PixelRect) -> Option<Rect> {
        match self {
            ClipRegion::Unbounded => Some(target.to_rect()),
            ClipRegion::Box(r) => Some(*r),
            ClipRegion::Empty => None,
        }
    }

    /// Pixels of `target` a draw may touch; `None` when nothing is drawable.
    pub fn resolve(&self, target: PixelRect) -> Option<PixelRect> {
        match self {
            ClipRegion::Unbounded => (!target.is_empty()).then_some(target),
            ClipRegion::Box(r) => r.round_out().intersect(target),
            ClipRegion::Empty => None,
        }
    }
}

/// Axis-aligned box covering the four corners of `rect` mapped by `matrix`.
pub(crate) fn device_box(rect: Rect, matrix: &AffineTransform) -> Option<Rect> {
    let r = rect.normalized();
    let (min, max) = (r.min(), r.max());
    let mut out = Bounds::empty();
    for corner in [
        min,
        Vec2::new(max.x, min.y),
        max,
        Vec2::new(min.x, max.y),
    ] {
        let p = matrix.transform_point(corner);
        if !p.is_finite() {
            return None;
        }
        out.include(p);
    }
    out.to_rect()
}
