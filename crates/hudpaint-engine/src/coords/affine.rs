use super::Vec2;

/// Determinants with a smaller magnitude are treated as singular.
const SINGULAR_EPSILON: f64 = 1e-12;

/// 2×3 affine map.
///
/// ```text
/// x' = xx * x + xy * y + x0
/// y' = yx * x + yy * y + y0
/// ```
///
/// Composition order is fixed by [`multiply`](Self::multiply): `a.multiply(&b)`
/// applies `a` first, then `b`. The in-place mutators (`translate`, `scale`,
/// `rotate`) append their step after the accumulated map.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct AffineTransform {
    pub xx: f64,
    pub yx: f64,
    pub xy: f64,
    pub yy: f64,
    pub x0: f64,
    pub y0: f64,
}

impl Default for AffineTransform {
    fn default() -> Self {
        Self::identity()
    }
}

impl AffineTransform {
    #[inline]
    pub const fn new(xx: f64, yx: f64, xy: f64, yy: f64, x0: f64, y0: f64) -> Self {
        Self { xx, yx, xy, yy, x0, y0 }
    }

    #[inline]
    pub const fn identity() -> Self {
        Self::new(1.0, 0.0, 0.0, 1.0, 0.0, 0.0)
    }

    #[inline]
    pub const fn translation(tx: f64, ty: f64) -> Self {
        Self::new(1.0, 0.0, 0.0, 1.0, tx, ty)
    }

    #[inline]
    pub const fn scaling(sx: f64, sy: f64) -> Self {
        Self::new(sx, 0.0, 0.0, sy, 0.0, 0.0)
    }

    /// Rotation by `radians`; positive angles turn +X towards +Y.
    #[inline]
    pub fn rotation(radians: f64) -> Self {
        let (s, c) = radians.sin_cos();
        Self::new(c, s, -s, c, 0.0, 0.0)
    }

    /// Resets to the identity map.
    #[inline]
    pub fn set_identity(&mut self) {
        *self = Self::identity();
    }

    #[inline]
    pub fn translate(&mut self, tx: f64, ty: f64) {
        *self = self.multiply(&Self::translation(tx, ty));
    }

    #[inline]
    pub fn scale(&mut self, sx: f64, sy: f64) {
        *self = self.multiply(&Self::scaling(sx, sy));
    }

    #[inline]
    pub fn rotate(&mut self, radians: f64) {
        *self = self.multiply(&Self::rotation(radians));
    }

    /// Map equivalent to applying `self`, then `other`.
    pub fn multiply(&self, other: &AffineTransform) -> AffineTransform {
        let a = self;
        let b = other;
        AffineTransform {
            xx: a.xx * b.xx + a.yx * b.xy,
            yx: a.xx * b.yx + a.yx * b.yy,
            xy: a.xy * b.xx + a.yy * b.xy,
            yy: a.xy * b.yx + a.yy * b.yy,
            x0: a.x0 * b.xx + a.y0 * b.xy + b.x0,
            y0: a.x0 * b.yx + a.y0 * b.yy + b.y0,
        }
    }

    #[inline]
    pub fn transform_point(&self, p: Vec2) -> Vec2 {
        Vec2::new(
            self.xx * p.x + self.xy * p.y + self.x0,
            self.yx * p.x + self.yy * p.y + self.y0,
        )
    }

    /// Linear part only; translation is ignored.
    #[inline]
    pub fn transform_distance(&self, d: Vec2) -> Vec2 {
        Vec2::new(self.xx * d.x + self.xy * d.y, self.yx * d.x + self.yy * d.y)
    }

    #[inline]
    pub fn determinant(&self) -> f64 {
        self.xx * self.yy - self.yx * self.xy
    }

    #[inline]
    pub fn is_invertible(&self) -> bool {
        let det = self.determinant();
        det.is_finite() && det.abs() >= SINGULAR_EPSILON
    }

    #[inline]
    pub fn is_identity(&self) -> bool {
        *self == Self::identity()
    }

    /// Inverse map, or `None` when the determinant is (near) zero or non-finite.
    pub fn invert(&self) -> Option<AffineTransform> {
        if !self.is_invertible() {
            return None;
        }
        let inv_det = 1.0 / self.determinant();
        let xx = self.yy * inv_det;
        let yx = -self.yx * inv_det;
        let xy = -self.xy * inv_det;
        let yy = self.xx * inv_det;
        let x0 = -(xx * self.x0 + xy * self.y0);
        let y0 = -(yx * self.x0 + yy * self.y0);
        let inv = AffineTransform::new(xx, yx, xy, yy, x0, y0);
        inv.is_finite().then_some(inv)
    }

    #[inline]
    pub fn is_finite(&self) -> bool {
        self.xx.is_finite()
            && self.yx.is_finite()
            && self.xy.is_finite()
            && self.yy.is_finite()
            && self.x0.is_finite()
            && self.y0.is_finite()
    }

    /// Geometric-mean scale of the linear part (`sqrt(|det|)`).
    ///
    /// Used to convert device-pixel tolerances into user units.
    #[inline]
    pub fn mean_scale(&self) -> f64 {
        let det = self.determinant().abs();
        if det.is_finite() { det.sqrt() } else { 0.0 }
    }
}
