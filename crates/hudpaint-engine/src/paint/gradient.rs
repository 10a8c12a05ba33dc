use crate::coords::Vec2;

use super::Color;

/// Radial deltas / axis lengths below this are treated as degenerate.
const DEGENERATE_EPSILON: f64 = 1e-9;

/// Behavior for gradient parameters (or surface coordinates) outside the defined range.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Hash)]
pub enum Extend {
    /// Transparent outside the range.
    None,
    /// Repeat the pattern.
    Repeat,
    /// Mirror-repeat the pattern.
    Reflect,
    /// Clamp to the edge color.
    #[default]
    Pad,
}

impl Extend {
    /// Maps a gradient parameter into `[0, 1]`; `None` means "transparent here".
    #[inline]
    pub fn apply(self, t: f64) -> Option<f64> {
        if !t.is_finite() {
            return None;
        }
        match self {
            Extend::None => (0.0..=1.0).contains(&t).then_some(t),
            Extend::Pad => Some(t.clamp(0.0, 1.0)),
            Extend::Repeat => Some(t - t.floor()),
            Extend::Reflect => {
                let m = t.rem_euclid(2.0);
                Some(if m > 1.0 { 2.0 - m } else { m })
            }
        }
    }

    /// Maps an integer texel coordinate into `0..len`; `None` means "outside".
    #[inline]
    pub fn apply_texel(self, i: i64, len: u32) -> Option<u32> {
        let len = len as i64;
        if len <= 0 {
            return None;
        }
        let mapped = match self {
            Extend::None => {
                if i < 0 || i >= len {
                    return None;
                }
                i
            }
            Extend::Pad => i.clamp(0, len - 1),
            Extend::Repeat => i.rem_euclid(len),
            Extend::Reflect => {
                let m = i.rem_euclid(2 * len);
                if m >= len { 2 * len - 1 - m } else { m }
            }
        };
        Some(mapped as u32)
    }
}

/// A single gradient stop.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ColorStop {
    /// Position along the gradient, clamped into `[0, 1]` on insertion.
    pub offset: f64,
    pub color: Color,
}

impl ColorStop {
    #[inline]
    pub const fn new(offset: f64, color: Color) -> Self {
        Self { offset, color }
    }
}

/// Ordered stop list.
///
/// Invariant: offsets are non-decreasing. Stops added at an existing offset land
/// after the ones already there, which is what produces hard color edges.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GradientStops {
    stops: Vec<ColorStop>,
}

impl GradientStops {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, offset: f64, color: Color) {
        let offset = if offset.is_finite() { offset.clamp(0.0, 1.0) } else { 0.0 };
        let at = self.stops.partition_point(|s| s.offset <= offset);
        self.stops.insert(at, ColorStop::new(offset, color.clamped()));
    }

    #[inline]
    pub fn as_slice(&self) -> &[ColorStop] {
        &self.stops
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.stops.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.stops.is_empty()
    }

    /// First stop color, or transparent without stops.
    #[inline]
    pub fn first_color(&self) -> Color {
        self.stops.first().map_or(Color::transparent(), |s| s.color)
    }

    /// Color at parameter `t` after applying `extend`.
    ///
    /// Between two bracketing stops the color is interpolated linearly per
    /// straight-alpha channel, proportional to position.
    pub fn color_at(&self, t: f64, extend: Extend) -> Color {
        let Some(t) = extend.apply(t) else {
            return Color::transparent();
        };
        let (Some(first), Some(last)) = (self.stops.first(), self.stops.last()) else {
            return Color::transparent();
        };
        if t <= first.offset {
            return first.color;
        }
        if t >= last.offset {
            return last.color;
        }
        for pair in self.stops.windows(2) {
            let (a, b) = (pair[0], pair[1]);
            if t < b.offset {
                let span = b.offset - a.offset;
                if span <= DEGENERATE_EPSILON {
                    return b.color;
                }
                let frac = ((t - a.offset) / span) as f32;
                return a.color.lerp(b.color, frac);
            }
        }
        last.color
    }
}

/// Linear gradient geometry (pattern space).
#[derive(Debug, Clone, PartialEq)]
pub struct LinearGradient {
    pub start: Vec2,
    pub end: Vec2,
}

impl LinearGradient {
    #[inline]
    pub const fn new(start: Vec2, end: Vec2) -> Self {
        Self { start, end }
    }

    /// Projection of `p` onto the axis: 0 at `start`, 1 at `end`.
    ///
    /// `None` when the axis has zero length.
    pub fn parameter_at(&self, p: Vec2) -> Option<f64> {
        let axis = self.end - self.start;
        let len2 = axis.dot(axis);
        if !(len2.is_finite() && len2 > DEGENERATE_EPSILON) {
            return None;
        }
        Some((p - self.start).dot(axis) / len2)
    }
}

/// Two-circle radial gradient geometry (pattern space).
///
/// Parameter `t` interpolates both the center and the radius between the inner
/// circle (`t = 0`) and the outer circle (`t = 1`).
#[derive(Debug, Clone, PartialEq)]
pub struct RadialGradient {
    pub inner_center: Vec2,
    pub inner_radius: f64,
    pub outer_center: Vec2,
    pub outer_radius: f64,
}

/// Outcome of locating a point in a radial gradient's circle field.
#[derive(Debug, Copy, Clone, PartialEq)]
pub(crate) enum RadialParam {
    /// The point lies on the circle with parameter `t`.
    At(f64),
    /// No circle of non-negative radius passes through the point.
    Outside,
    /// Both circles coincide; the field is undefined.
    Degenerate,
}

impl RadialGradient {
    #[inline]
    pub fn new(
        inner_center: Vec2,
        inner_radius: f64,
        outer_center: Vec2,
        outer_radius: f64,
    ) -> Self {
        Self {
            inner_center,
            inner_radius: inner_radius.max(0.0),
            outer_center,
            outer_radius: outer_radius.max(0.0),
        }
    }

    /// Largest `t` whose interpolated circle passes through `p` with a non-negative radius.
    ///
    /// For concentric circles this reduces to
    /// `(distance(p, center) - r0) / (r1 - r0)`.
    pub(crate) fn parameter_at(&self, p: Vec2) -> RadialParam {
        let cd = self.outer_center - self.inner_center;
        let pd = p - self.inner_center;
        let r0 = self.inner_radius;
        let dr = self.outer_radius - r0;

        let a = cd.dot(cd) - dr * dr;
        let b = pd.dot(cd) + r0 * dr;
        let c = pd.dot(pd) - r0 * r0;

        if a.abs() <= DEGENERATE_EPSILON {
            if b.abs() <= DEGENERATE_EPSILON {
                return RadialParam::Degenerate;
            }
            let t = c / (2.0 * b);
            return if r0 + t * dr >= 0.0 && t.is_finite() {
                RadialParam::At(t)
            } else {
                RadialParam::Outside
            };
        }

        let disc = b * b - a * c;
        if disc < 0.0 || !disc.is_finite() {
            return RadialParam::Outside;
        }
        let s = disc.sqrt();
        let t1 = (b + s) / a;
        let t2 = (b - s) / a;
        let (hi, lo) = if t1 >= t2 { (t1, t2) } else { (t2, t1) };
        if r0 + hi * dr >= 0.0 {
            RadialParam::At(hi)
        } else if r0 + lo * dr >= 0.0 {
            RadialParam::At(lo)
        } else {
            RadialParam::Outside
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stops(list: &[(f64, Color)]) -> GradientStops {
        let mut s = GradientStops::new();
        for &(o, c) in list {
            s.add(o, c);
        }
        s
    }

    // ── stop ordering ─────────────────────────────────────────────────────

    #[test]
    fn stops_stay_sorted() {
        let s = stops(&[
            (0.8, Color::white()),
            (0.2, Color::black()),
            (0.5, Color::transparent()),
            (1.5, Color::white()),
        ]);
        let offsets: Vec<f64> = s.as_slice().iter().map(|s| s.offset).collect();
        assert_eq!(offsets, vec![0.2, 0.5, 0.8, 1.0]);
    }

    #[test]
    fn equal_offsets_keep_insertion_order() {
        let red = Color::new(1.0, 0.0, 0.0, 1.0);
        let blue = Color::new(0.0, 0.0, 1.0, 1.0);
        let s = stops(&[(0.0, Color::black()), (0.5, red), (0.5, blue), (1.0, Color::white())]);
        assert_eq!(s.as_slice()[1].color, red);
        assert_eq!(s.as_slice()[2].color, blue);
        // Hard edge: just past 0.5 the later stop wins.
        assert_eq!(s.color_at(0.5, Extend::Pad), blue);
    }

    // ── interpolation ─────────────────────────────────────────────────────

    #[test]
    fn endpoints_hit_stop_colors() {
        let a = Color::from_rgba8(10, 20, 30, 255);
        let b = Color::from_rgba8(200, 100, 50, 250);
        let s = stops(&[(0.0, a), (1.0, b)]);
        assert_eq!(s.color_at(0.0, Extend::Pad), a);
        assert_eq!(s.color_at(1.0, Extend::Pad), b);
    }

    #[test]
    fn interpolation_is_monotonic_between_stops() {
        let s = stops(&[(0.0, Color::black()), (1.0, Color::white())]);
        let mut prev = -1.0f32;
        for i in 0..=20 {
            let c = s.color_at(i as f64 / 20.0, Extend::Pad);
            assert!(c.r >= prev);
            prev = c.r;
        }
    }

    #[test]
    fn no_stops_is_transparent() {
        assert_eq!(GradientStops::new().color_at(0.5, Extend::Pad), Color::transparent());
    }

    // ── extend ────────────────────────────────────────────────────────────

    #[test]
    fn extend_policies() {
        assert_eq!(Extend::Pad.apply(-0.5), Some(0.0));
        assert_eq!(Extend::None.apply(-0.5), None);
        assert_eq!(Extend::None.apply(1.0), Some(1.0));
        assert!((Extend::Repeat.apply(1.25).unwrap() - 0.25).abs() < 1e-12);
        assert!((Extend::Reflect.apply(1.25).unwrap() - 0.75).abs() < 1e-12);
        assert!((Extend::Reflect.apply(-0.25).unwrap() - 0.25).abs() < 1e-12);
        assert_eq!(Extend::Pad.apply(f64::NAN), None);
    }

    #[test]
    fn texel_extend_policies() {
        assert_eq!(Extend::None.apply_texel(-1, 4), None);
        assert_eq!(Extend::Pad.apply_texel(-3, 4), Some(0));
        assert_eq!(Extend::Pad.apply_texel(9, 4), Some(3));
        assert_eq!(Extend::Repeat.apply_texel(5, 4), Some(1));
        assert_eq!(Extend::Reflect.apply_texel(4, 4), Some(3));
        assert_eq!(Extend::Reflect.apply_texel(-1, 4), Some(0));
    }

    // ── geometry ──────────────────────────────────────────────────────────

    #[test]
    fn linear_projection() {
        let g = LinearGradient::new(Vec2::new(0.0, 0.0), Vec2::new(100.0, 0.0));
        assert_eq!(g.parameter_at(Vec2::new(25.0, 40.0)), Some(0.25));
        assert!(LinearGradient::new(Vec2::new(3.0, 3.0), Vec2::new(3.0, 3.0))
            .parameter_at(Vec2::zero())
            .is_none());
    }

    #[test]
    fn concentric_radial_matches_distance_ratio() {
        let c = Vec2::new(50.0, 50.0);
        let g = RadialGradient::new(c, 10.0, c, 50.0);
        match g.parameter_at(Vec2::new(80.0, 50.0)) {
            RadialParam::At(t) => assert!((t - 0.5).abs() < 1e-9),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn coincident_circles_are_degenerate() {
        let c = Vec2::new(5.0, 5.0);
        let same = RadialGradient::new(c, 4.0, c, 4.0);
        assert_eq!(same.parameter_at(Vec2::zero()), RadialParam::Degenerate);
    }

    #[test]
    fn offset_radial_outside_cone() {
        // Inner circle at x=0 r=0, outer at x=100 r=10: points far above the cone have no circle.
        let g = RadialGradient::new(Vec2::new(0.0, 0.0), 0.0, Vec2::new(100.0, 0.0), 10.0);
        assert_eq!(g.parameter_at(Vec2::new(-50.0, 200.0)), RadialParam::Outside);
        assert!(matches!(g.parameter_at(Vec2::new(100.0, 0.0)), RadialParam::At(_)));
    }
}
