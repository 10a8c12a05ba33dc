use super::Vec2;

/// Axis-aligned rectangle (top-left origin).
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct Rect {
    pub origin: Vec2,
    pub size: Vec2,
}

impl Rect {
    #[inline]
    pub const fn new(x: f64, y: f64, w: f64, h: f64) -> Self {
        Self {
            origin: Vec2::new(x, y),
            size: Vec2::new(w, h),
        }
    }

    /// Rectangle spanning two corners, in any order.
    #[inline]
    pub fn from_corners(a: Vec2, b: Vec2) -> Self {
        Rect::new(a.x, a.y, b.x - a.x, b.y - a.y).normalized()
    }

    #[inline]
    pub fn min(self) -> Vec2 {
        self.origin
    }

    #[inline]
    pub fn max(self) -> Vec2 {
        Vec2::new(self.origin.x + self.size.x, self.origin.y + self.size.y)
    }

    #[inline]
    pub fn is_empty(self) -> bool {
        self.size.x <= 0.0 || self.size.y <= 0.0
    }

    #[inline]
    pub fn is_finite(self) -> bool {
        self.origin.is_finite() && self.size.is_finite()
    }

    /// Normalizes the rectangle so width/height are non-negative.
    #[inline]
    pub fn normalized(self) -> Self {
        let mut x = self.origin.x;
        let mut y = self.origin.y;
        let mut w = self.size.x;
        let mut h = self.size.y;

        if w < 0.0 {
            x += w;
            w = -w;
        }
        if h < 0.0 {
            y += h;
            h = -h;
        }

        Rect::new(x, y, w, h)
    }

    /// Closed containment: [min, max] on both axes.
    ///
    /// Clip tests use this form so that points on the clip boundary count as inside.
    #[inline]
    pub fn contains_inclusive(self, p: Vec2) -> bool {
        let r = self.normalized();
        p.x >= r.origin.x
            && p.y >= r.origin.y
            && p.x <= (r.origin.x + r.size.x)
            && p.y <= (r.origin.y + r.size.y)
    }

    /// Overlap of two rectangles; `None` when they do not share any area.
    #[inline]
    pub fn intersect(self, other: Rect) -> Option<Rect> {
        let a = self.normalized();
        let b = other.normalized();

        let x0 = a.origin.x.max(b.origin.x);
        let y0 = a.origin.y.max(b.origin.y);
        let x1 = (a.origin.x + a.size.x).min(b.origin.x + b.size.x);
        let y1 = (a.origin.y + a.size.y).min(b.origin.y + b.size.y);

        let w = x1 - x0;
        let h = y1 - y0;

        if w <= 0.0 || h <= 0.0 {
            None
        } else {
            Some(Rect::new(x0, y0, w, h))
        }
    }

    /// Smallest pixel rectangle fully covering `self` (edges rounded outward).
    pub fn round_out(self) -> PixelRect {
        let r = self.normalized();
        let x0 = r.origin.x.floor();
        let y0 = r.origin.y.floor();
        let x1 = (r.origin.x + r.size.x).ceil();
        let y1 = (r.origin.y + r.size.y).ceil();
        if !(x0.is_finite() && y0.is_finite() && x1.is_finite() && y1.is_finite()) {
            return PixelRect::new(0, 0, 0, 0);
        }
        let x0 = x0.clamp(i32::MIN as f64, i32::MAX as f64) as i32;
        let y0 = y0.clamp(i32::MIN as f64, i32::MAX as f64) as i32;
        let x1 = x1.clamp(i32::MIN as f64, i32::MAX as f64) as i32;
        let y1 = y1.clamp(i32::MIN as f64, i32::MAX as f64) as i32;
        PixelRect::new(
            x0,
            y0,
            x1.saturating_sub(x0).max(0) as u32,
            y1.saturating_sub(y0).max(0) as u32,
        )
    }
}

/// Integer pixel rectangle used to address bitmap sub-regions.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Hash)]
pub struct PixelRect {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl PixelRect {
    #[inline]
    pub const fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self { x, y, width, height }
    }

    /// Full extent of a `width` × `height` bitmap.
    #[inline]
    pub const fn of_size(width: u32, height: u32) -> Self {
        Self::new(0, 0, width, height)
    }

    #[inline]
    pub fn is_empty(self) -> bool {
        self.width == 0 || self.height == 0
    }

    #[inline]
    pub fn right(self) -> i64 {
        self.x as i64 + self.width as i64
    }

    #[inline]
    pub fn bottom(self) -> i64 {
        self.y as i64 + self.height as i64
    }

    #[inline]
    pub fn area(self) -> usize {
        self.width as usize * self.height as usize
    }

    pub fn intersect(self, other: PixelRect) -> Option<PixelRect> {
        let x0 = (self.x as i64).max(other.x as i64);
        let y0 = (self.y as i64).max(other.y as i64);
        let x1 = self.right().min(other.right());
        let y1 = self.bottom().min(other.bottom());
        if x1 <= x0 || y1 <= y0 {
            return None;
        }
        Some(PixelRect::new(
            x0 as i32,
            y0 as i32,
            (x1 - x0) as u32,
            (y1 - y0) as u32,
        ))
    }

    #[inline]
    pub fn to_rect(self) -> Rect {
        Rect::new(
            self.x as f64,
            self.y as f64,
            self.width as f64,
            self.height as f64,
        )
    }
}
