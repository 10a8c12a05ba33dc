use super::{Rect, Vec2};

/// Running axis-aligned bounding box.
///
/// Starts empty; every [`include`](Self::include) grows it to cover the point.
/// Non-finite points are ignored so a single bad coordinate cannot poison the box.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Bounds {
    min: Vec2,
    max: Vec2,
    empty: bool,
}

impl Default for Bounds {
    fn default() -> Self {
        Self::empty()
    }
}

impl Bounds {
    #[inline]
    pub const fn empty() -> Self {
        Self {
            min: Vec2::zero(),
            max: Vec2::zero(),
            empty: true,
        }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.empty
    }

    pub fn include(&mut self, p: Vec2) {
        if !p.is_finite() {
            return;
        }
        if self.empty {
            self.min = p;
            self.max = p;
            self.empty = false;
            return;
        }
        self.min.x = self.min.x.min(p.x);
        self.min.y = self.min.y.min(p.y);
        self.max.x = self.max.x.max(p.x);
        self.max.y = self.max.y.max(p.y);
    }

    pub fn union(&mut self, other: &Bounds) {
        if other.empty {
            return;
        }
        self.include(other.min);
        self.include(other.max);
    }

    /// `(x1, y1, x2, y2)`; all zero when empty.
    #[inline]
    pub fn extents(&self) -> (f64, f64, f64, f64) {
        if self.empty {
            (0.0, 0.0, 0.0, 0.0)
        } else {
            (self.min.x, self.min.y, self.max.x, self.max.y)
        }
    }

    #[inline]
    pub fn to_rect(&self) -> Option<Rect> {
        if self.empty {
            None
        } else {
            Some(Rect::from_corners(self.min, self.max))
        }
    }
}
