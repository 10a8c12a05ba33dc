/// Straight-alpha RGBA color, channels in `[0, 1]`.
///
/// Invariant:
/// - channels are *not* premultiplied; gradient interpolation happens in this space.
///
/// Rasterizers work in premultiplied space; convert with
/// [`premultiplied`](Self::premultiplied) at the submission boundary.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    #[inline]
    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    #[inline]
    pub const fn transparent() -> Self {
        Self::new(0.0, 0.0, 0.0, 0.0)
    }

    #[inline]
    pub const fn black() -> Self {
        Self::new(0.0, 0.0, 0.0, 1.0)
    }

    #[inline]
    pub const fn white() -> Self {
        Self::new(1.0, 1.0, 1.0, 1.0)
    }

    /// Opaque color from `f64` components, as taken by `set_source_rgb`.
    #[inline]
    pub fn rgb(r: f64, g: f64, b: f64) -> Self {
        Self::rgba(r, g, b, 1.0)
    }

    #[inline]
    pub fn rgba(r: f64, g: f64, b: f64, a: f64) -> Self {
        Self::new(r as f32, g as f32, b as f32, a as f32).clamped()
    }

    /// Color from straight-alpha bytes (`0`–`255`).
    #[inline]
    pub fn from_rgba8(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self::new(
            r as f32 / 255.0,
            g as f32 / 255.0,
            b as f32 / 255.0,
            a as f32 / 255.0,
        )
    }

    /// Rounds to straight-alpha bytes.
    #[inline]
    pub fn to_rgba8(self) -> [u8; 4] {
        let c = self.clamped();
        [
            unit_to_u8(c.r),
            unit_to_u8(c.g),
            unit_to_u8(c.b),
            unit_to_u8(c.a),
        ]
    }

    #[inline]
    pub fn is_finite(self) -> bool {
        self.r.is_finite() && self.g.is_finite() && self.b.is_finite() && self.a.is_finite()
    }

    /// Clamps every channel into `[0, 1]`; non-finite channels become 0.
    #[inline]
    pub fn clamped(self) -> Self {
        Self {
            r: clamp_unit(self.r),
            g: clamp_unit(self.g),
            b: clamp_unit(self.b),
            a: clamp_unit(self.a),
        }
    }

    /// Per-channel linear interpolation (`t = 0` → `self`, `t = 1` → `other`).
    #[inline]
    pub fn lerp(self, other: Color, t: f32) -> Color {
        Color {
            r: self.r + (other.r - self.r) * t,
            g: self.g + (other.g - self.g) * t,
            b: self.b + (other.b - self.b) * t,
            a: self.a + (other.a - self.a) * t,
        }
    }

    #[inline]
    pub fn with_alpha_scaled(self, alpha: f32) -> Color {
        Color { a: self.a * clamp_unit(alpha), ..self }
    }

    /// Premultiplied `[r, g, b, a]`.
    #[inline]
    pub fn premultiplied(self) -> [f32; 4] {
        let c = self.clamped();
        [c.r * c.a, c.g * c.a, c.b * c.a, c.a]
    }

    /// Inverse of [`premultiplied`](Self::premultiplied); `a == 0` yields transparent black.
    #[inline]
    pub fn from_premultiplied(p: [f32; 4]) -> Color {
        let a = clamp_unit(p[3]);
        if a <= 0.0 {
            return Color::transparent();
        }
        let inv = 1.0 / a;
        Color::new(p[0] * inv, p[1] * inv, p[2] * inv, a).clamped()
    }
}

#[inline]
fn clamp_unit(v: f32) -> f32 {
    if v.is_finite() { v.clamp(0.0, 1.0) } else { 0.0 }
}

#[inline]
fn unit_to_u8(v: f32) -> u8 {
    (v * 255.0).round() as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bytes_round_trip() {
        for v in [0u8, 1, 127, 128, 200, 254, 255] {
            let c = Color::from_rgba8(v, 255 - v, v / 2, 255);
            assert_eq!(c.to_rgba8(), [v, 255 - v, v / 2, 255]);
        }
    }

    #[test]
    fn lerp_midpoint() {
        let a = Color::from_rgba8(0, 0, 0, 0);
        let b = Color::from_rgba8(200, 100, 50, 250);
        assert_eq!(a.lerp(b, 0.5).to_rgba8(), [100, 50, 25, 125]);
    }

    #[test]
    fn premultiply_round_trip() {
        let c = Color::new(0.8, 0.4, 0.2, 0.5);
        let back = Color::from_premultiplied(c.premultiplied());
        assert!((back.r - c.r).abs() < 1e-6);
        assert!((back.a - c.a).abs() < 1e-6);
        assert_eq!(Color::from_premultiplied([0.3, 0.3, 0.3, 0.0]), Color::transparent());
    }

    #[test]
    fn clamped_scrubs_nan() {
        let c = Color::new(f32::NAN, 2.0, -1.0, 0.5).clamped();
        assert_eq!(c, Color::new(0.0, 1.0, 0.0, 0.5));
    }
}
