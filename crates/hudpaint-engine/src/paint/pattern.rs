use crate::coords::{AffineTransform, Vec2};
use crate::surface::{Bitmap, Surface};

use super::gradient::{GradientStops, LinearGradient, RadialGradient, RadialParam};
use super::{Color, ColorStop, Extend};

/// Bitmap-backed paint source.
#[derive(Debug, Clone)]
pub struct SurfaceSource {
    pub surface: Surface,
    /// Pattern-space position of the bitmap's top-left corner.
    pub offset: Vec2,
}

impl PartialEq for SurfaceSource {
    /// Same surface handle at the same offset; pixels are not compared.
    fn eq(&self, other: &Self) -> bool {
        self.surface.ptr_eq(&other.surface) && self.offset == other.offset
    }
}

/// Paint-source variants.
#[derive(Debug, Clone, PartialEq)]
pub enum PatternKind {
    Solid(Color),
    LinearGradient(LinearGradient, GradientStops),
    RadialGradient(RadialGradient, GradientStops),
    Surface(SurfaceSource),
}

/// Paint source sampled when filling, stroking, painting or masking.
///
/// Semantics:
/// - `matrix` maps user space to pattern space (identity by default)
/// - `extend` decides what lies outside `[0, 1]` (gradients) or outside the
///   bitmap (surfaces); gradients default to [`Extend::Pad`], surfaces to
///   [`Extend::None`]
/// - [`color_at_point`](Self::color_at_point) is the single sampling entry point
#[derive(Debug, Clone, PartialEq)]
pub struct Pattern {
    kind: PatternKind,
    extend: Extend,
    matrix: AffineTransform,
}

impl Pattern {
    fn from_kind(kind: PatternKind, extend: Extend) -> Self {
        Self {
            kind,
            extend,
            matrix: AffineTransform::identity(),
        }
    }

    #[inline]
    pub fn solid(color: Color) -> Self {
        Self::from_kind(PatternKind::Solid(color.clamped()), Extend::Pad)
    }

    #[inline]
    pub fn rgb(r: f64, g: f64, b: f64) -> Self {
        Self::solid(Color::rgb(r, g, b))
    }

    #[inline]
    pub fn rgba(r: f64, g: f64, b: f64, a: f64) -> Self {
        Self::solid(Color::rgba(r, g, b, a))
    }

    /// Linear gradient along `(x0, y0)` → `(x1, y1)`, without stops.
    pub fn linear(x0: f64, y0: f64, x1: f64, y1: f64) -> Self {
        Self::from_kind(
            PatternKind::LinearGradient(
                LinearGradient::new(Vec2::new(x0, y0), Vec2::new(x1, y1)),
                GradientStops::new(),
            ),
            Extend::Pad,
        )
    }

    /// Radial gradient between circle `(cx0, cy0, r0)` and circle `(cx1, cy1, r1)`, without stops.
    pub fn radial(cx0: f64, cy0: f64, r0: f64, cx1: f64, cy1: f64, r1: f64) -> Self {
        Self::from_kind(
            PatternKind::RadialGradient(
                RadialGradient::new(Vec2::new(cx0, cy0), r0, Vec2::new(cx1, cy1), r1),
                GradientStops::new(),
            ),
            Extend::Pad,
        )
    }

    /// Pattern reading from `surface`, its top-left corner at the pattern-space origin.
    pub fn for_surface(surface: &Surface) -> Self {
        Self::for_surface_at(surface, 0.0, 0.0)
    }

    /// Pattern reading from `surface` with its top-left corner at `(x, y)`.
    pub fn for_surface_at(surface: &Surface, x: f64, y: f64) -> Self {
        Self::from_kind(
            PatternKind::Surface(SurfaceSource {
                surface: surface.clone(),
                offset: Vec2::new(x, y),
            }),
            Extend::None,
        )
    }

    #[inline]
    pub fn kind(&self) -> &PatternKind {
        &self.kind
    }

    #[inline]
    pub fn extend(&self) -> Extend {
        self.extend
    }

    #[inline]
    pub fn set_extend(&mut self, extend: Extend) {
        self.extend = extend;
    }

    #[inline]
    pub fn matrix(&self) -> AffineTransform {
        self.matrix
    }

    #[inline]
    pub fn set_matrix(&mut self, matrix: AffineTransform) {
        self.matrix = matrix;
    }

    /// Adds a stop to a gradient pattern, keeping offsets non-decreasing.
    ///
    /// Returns `false` (and changes nothing) for solid and surface patterns.
    pub fn add_color_stop(&mut self, offset: f64, color: Color) -> bool {
        match &mut self.kind {
            PatternKind::LinearGradient(_, stops) | PatternKind::RadialGradient(_, stops) => {
                stops.add(offset, color);
                true
            }
            PatternKind::Solid(_) | PatternKind::Surface(_) => {
                log::debug!("add_color_stop on a non-gradient pattern ignored");
                false
            }
        }
    }

    #[inline]
    pub fn add_color_stop_rgba(&mut self, offset: f64, r: f64, g: f64, b: f64, a: f64) -> bool {
        self.add_color_stop(offset, Color::rgba(r, g, b, a))
    }

    /// Gradient stops; empty for solid and surface patterns.
    pub fn color_stops(&self) -> &[ColorStop] {
        match &self.kind {
            PatternKind::LinearGradient(_, stops) | PatternKind::RadialGradient(_, stops) => {
                stops.as_slice()
            }
            PatternKind::Solid(_) | PatternKind::Surface(_) => &[],
        }
    }

    /// Solid color, when this is a solid pattern.
    #[inline]
    pub fn as_solid(&self) -> Option<Color> {
        match self.kind {
            PatternKind::Solid(c) => Some(c),
            _ => None,
        }
    }

    /// Surface backing a surface pattern.
    #[inline]
    pub fn surface(&self) -> Option<&Surface> {
        match &self.kind {
            PatternKind::Surface(src) => Some(&src.surface),
            _ => None,
        }
    }

    /// Color of the pattern at user-space point `(x, y)`.
    ///
    /// Surface patterns lock their bitmap for the single read; use
    /// [`sampler`](Self::sampler) for bulk sampling.
    pub fn color_at_point(&self, x: f64, y: f64) -> Color {
        let p = Vec2::new(x, y);
        match &self.kind {
            PatternKind::Surface(src) => src
                .surface
                .with_bitmap(|bitmap| self.sample(p, Some(bitmap)))
                .unwrap_or_else(Color::transparent),
            _ => self.sample(p, None),
        }
    }

    /// Snapshot-based sampler for evaluating the pattern at many points.
    ///
    /// Surface patterns copy their bitmap once, so the sampler can be used while
    /// the source surface is also the drawing target.
    pub fn sampler(&self) -> PatternSampler<'_> {
        let snapshot = match &self.kind {
            PatternKind::Surface(src) => src.surface.image(),
            _ => None,
        };
        PatternSampler {
            pattern: self,
            snapshot,
        }
    }

    fn sample(&self, user: Vec2, bitmap: Option<&Bitmap>) -> Color {
        let p = self.matrix.transform_point(user);
        match &self.kind {
            PatternKind::Solid(c) => *c,
            PatternKind::LinearGradient(g, stops) => match g.parameter_at(p) {
                Some(t) => stops.color_at(t, self.extend),
                None => stops.first_color(),
            },
            PatternKind::RadialGradient(g, stops) => match g.parameter_at(p) {
                RadialParam::At(t) => stops.color_at(t, self.extend),
                RadialParam::Outside => Color::transparent(),
                RadialParam::Degenerate => stops.first_color(),
            },
            PatternKind::Surface(src) => match bitmap {
                Some(bitmap) => sample_bitmap(bitmap, p - src.offset, self.extend),
                None => Color::transparent(),
            },
        }
    }
}

impl From<Color> for Pattern {
    fn from(color: Color) -> Self {
        Pattern::solid(color)
    }
}

/// Bulk sampler returned by [`Pattern::sampler`].
pub struct PatternSampler<'a> {
    pattern: &'a Pattern,
    snapshot: Option<Bitmap>,
}

impl PatternSampler<'_> {
    #[inline]
    pub fn sample(&self, user: Vec2) -> Color {
        self.pattern.sample(user, self.snapshot.as_ref())
    }
}

/// Nearest-texel lookup at pattern-space point `p`.
fn sample_bitmap(bitmap: &Bitmap, p: Vec2, extend: Extend) -> Color {
    if !p.is_finite() {
        return Color::transparent();
    }
    let tx = Extend::apply_texel(extend, p.x.floor() as i64, bitmap.width());
    let ty = Extend::apply_texel(extend, p.y.floor() as i64, bitmap.height());
    match (tx, ty) {
        (Some(x), Some(y)) => bitmap.pixel(x, y),
        _ => Color::transparent(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rgba8(c: Color) -> [i32; 4] {
        let [r, g, b, a] = c.to_rgba8();
        [r as i32, g as i32, b as i32, a as i32]
    }

    fn close(a: [i32; 4], b: [i32; 4]) -> bool {
        a.iter().zip(b.iter()).all(|(x, y)| (x - y).abs() <= 1)
    }

    // ── solid ─────────────────────────────────────────────────────────────

    #[test]
    fn solid_is_constant() {
        let p = Pattern::rgba(0.2, 0.4, 0.6, 0.8);
        assert_eq!(p.color_at_point(-1e6, 3.0), p.color_at_point(5.0, 5.0));
        assert!(!Pattern::rgb(0.0, 0.0, 0.0).add_color_stop(0.5, Color::white()));
    }

    // ── linear ────────────────────────────────────────────────────────────

    #[test]
    fn linear_midpoint_interpolates_straight_channels() {
        let mut p = Pattern::linear(0.0, 0.0, 100.0, 0.0);
        p.add_color_stop(0.0, Color::from_rgba8(0, 0, 0, 0));
        p.add_color_stop(1.0, Color::from_rgba8(200, 100, 50, 250));
        assert!(close(rgba8(p.color_at_point(50.0, 17.0)), [100, 50, 25, 125]));
    }

    #[test]
    fn linear_pad_before_start_returns_first_stop() {
        let first = Color::from_rgba8(10, 200, 30, 255);
        let mut p = Pattern::linear(0.0, 0.0, 100.0, 0.0);
        p.add_color_stop(0.0, first);
        p.add_color_stop(1.0, Color::white());
        assert_eq!(p.extend(), Extend::Pad);
        assert_eq!(p.color_at_point(-50.0, 0.0), first);
        assert_eq!(p.color_at_point(250.0, 0.0), Color::white());
    }

    #[test]
    fn linear_none_is_transparent_outside() {
        let mut p = Pattern::linear(0.0, 0.0, 10.0, 0.0);
        p.add_color_stop(0.0, Color::black());
        p.add_color_stop(1.0, Color::white());
        p.set_extend(Extend::None);
        assert_eq!(p.color_at_point(-5.0, 0.0), Color::transparent());
    }

    #[test]
    fn linear_repeat_wraps() {
        let mut p = Pattern::linear(0.0, 0.0, 10.0, 0.0);
        p.add_color_stop(0.0, Color::black());
        p.add_color_stop(1.0, Color::white());
        p.set_extend(Extend::Repeat);
        let a = p.color_at_point(2.5, 0.0);
        let b = p.color_at_point(12.5, 0.0);
        assert!((a.r - b.r).abs() < 1e-5);
    }

    #[test]
    fn zero_length_axis_returns_first_stop() {
        let mut p = Pattern::linear(5.0, 5.0, 5.0, 5.0);
        p.add_color_stop(0.0, Color::from_rgba8(1, 2, 3, 255));
        p.add_color_stop(1.0, Color::white());
        let c = p.color_at_point(100.0, -3.0);
        assert_eq!(c.to_rgba8(), [1, 2, 3, 255]);
        assert!(c.is_finite());
    }

    #[test]
    fn pattern_matrix_maps_user_to_pattern_space() {
        let mut p = Pattern::linear(0.0, 0.0, 10.0, 0.0);
        p.add_color_stop(0.0, Color::black());
        p.add_color_stop(1.0, Color::white());
        p.set_matrix(AffineTransform::translation(-100.0, 0.0));
        assert_eq!(p.color_at_point(110.0, 0.0), Color::white());
        assert_eq!(p.color_at_point(100.0, 0.0), Color::black());
    }

    // ── radial ────────────────────────────────────────────────────────────

    #[test]
    fn radial_samples_between_circles() {
        let mut p = Pattern::radial(50.0, 50.0, 0.0, 50.0, 50.0, 40.0);
        p.add_color_stop(0.0, Color::black());
        p.add_color_stop(1.0, Color::white());
        assert_eq!(p.color_at_point(50.0, 50.0), Color::black());
        let mid = p.color_at_point(70.0, 50.0);
        assert!((mid.r - 0.5).abs() < 1e-4);
        assert_eq!(p.color_at_point(150.0, 50.0), Color::white());
    }

    #[test]
    fn degenerate_radial_returns_first_stop() {
        let mut p = Pattern::radial(0.0, 0.0, 3.0, 0.0, 0.0, 3.0);
        p.add_color_stop(0.0, Color::black());
        p.add_color_stop(1.0, Color::white());
        assert_eq!(p.color_at_point(1.0, 1.0), Color::black());
    }

    // ── surface ───────────────────────────────────────────────────────────

    fn checker() -> Surface {
        let s = Surface::new(2, 2);
        s.with_bitmap_mut(|b| {
            b.set_pixel(0, 0, Color::white());
            b.set_pixel(1, 1, Color::white());
        });
        s
    }

    #[test]
    fn surface_pattern_honors_offset_and_bounds() {
        let p = Pattern::for_surface_at(&checker(), 10.0, 10.0);
        assert_eq!(p.extend(), Extend::None);
        assert_eq!(p.color_at_point(10.5, 10.5), Color::white());
        assert_eq!(p.color_at_point(11.5, 10.5), Color::transparent());
        assert_eq!(p.color_at_point(9.5, 10.5), Color::transparent());
        assert_eq!(p.color_at_point(12.5, 12.5), Color::transparent());
    }

    #[test]
    fn surface_pattern_repeat_tiles() {
        let mut p = Pattern::for_surface(&checker());
        p.set_extend(Extend::Repeat);
        assert_eq!(p.color_at_point(2.5, 2.5), Color::white());
        assert_eq!(p.color_at_point(-0.5, -0.5), Color::white());
        assert_eq!(p.color_at_point(-0.5, -1.5), Color::transparent());
    }

    #[test]
    fn destroyed_surface_samples_transparent() {
        let s = checker();
        let p = Pattern::for_surface(&s);
        s.destroy();
        assert_eq!(p.color_at_point(0.5, 0.5), Color::transparent());
        assert_eq!(p.sampler().sample(Vec2::new(0.5, 0.5)), Color::transparent());
    }
}
