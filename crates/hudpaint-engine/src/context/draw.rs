use crate::coords::{PixelRect, Vec2};
use crate::paint::Pattern;
use crate::raster::{Mesh, MeshPaint, PaintImage, RasterParams};
use crate::surface::Surface;
use crate::tessellate::{self, Geometry};
use crate::text::TextEngine;

use super::DrawingContext;

/// Tolerance floor in user units, for extreme scale factors.
const MIN_USER_TOLERANCE: f64 = 1e-4;

impl DrawingContext {
    // ── drawing ───────────────────────────────────────────────────────────

    /// Fills the current path with the source, then clears the path.
    pub fn fill(&mut self) {
        self.fill_preserve();
        self.path.clear();
    }

    pub fn fill_preserve(&mut self) {
        let geometry = self.fill_geometry();
        self.draw_user_geometry(geometry, None, 1.0);
    }

    /// Strokes the current path with the source, then clears the path.
    pub fn stroke(&mut self) {
        self.stroke_preserve();
        self.path.clear();
    }

    pub fn stroke_preserve(&mut self) {
        let geometry = self.stroke_geometry();
        self.draw_user_geometry(geometry, None, 1.0);
    }

    /// Paints the source everywhere inside the clip.
    pub fn paint(&mut self) {
        self.paint_with_alpha(1.0);
    }

    /// Paints the source everywhere inside the clip, faded by `alpha`.
    pub fn paint_with_alpha(&mut self, alpha: f64) {
        if alpha.is_nan() || alpha <= 0.0 {
            return;
        }
        let Some(region) = self.draw_region() else {
            return;
        };
        self.draw_device_geometry(region_quad(region), None, alpha);
    }

    /// Paints the source using the alpha channel of `mask` as coverage.
    pub fn mask(&mut self, mask: &Pattern) {
        let Some(region) = self.draw_region() else {
            return;
        };
        self.draw_device_geometry(region_quad(region), Some(mask), 1.0);
    }

    /// Masks with `surface`, its top-left corner at user-space `(x, y)`.
    pub fn mask_surface(&mut self, surface: &Surface, x: f64, y: f64) {
        self.mask(&Pattern::for_surface_at(surface, x, y));
    }

    /// Draws `text` with its baseline starting at the current point (the
    /// origin when there is none), then advances the current point.
    ///
    /// Glyphs are drawn with the source color at the starting point; the
    /// compositing operator does not apply to text.
    pub fn show_text(&mut self, text: &str) {
        let Some(engine) = self.text.clone() else {
            log::debug!("context: show_text without a text engine");
            return;
        };
        if text.is_empty() {
            return;
        }
        let start = self.path.current_point().unwrap_or_else(Vec2::zero);
        let extents = engine.measure_text(text, &self.state.font);
        self.draw_glyphs(engine.as_ref(), start, text);
        self.path.move_to(start.x + extents.x_advance, start.y);
    }

    // ── hit testing and extents ───────────────────────────────────────────

    /// Whether user-space `(x, y)` lies inside the area `fill` would cover.
    pub fn in_fill(&self, x: f64, y: f64) -> bool {
        self.fill_geometry().contains(Vec2::new(x, y))
    }

    /// Whether user-space `(x, y)` lies inside the area `stroke` would cover.
    pub fn in_stroke(&self, x: f64, y: f64) -> bool {
        self.stroke_geometry().contains(Vec2::new(x, y))
    }

    /// User-space box `fill` would cover, as `(x1, y1, x2, y2)`.
    pub fn fill_extents(&self) -> (f64, f64, f64, f64) {
        self.fill_geometry().bounds().extents()
    }

    pub fn stroke_extents(&self) -> (f64, f64, f64, f64) {
        self.stroke_geometry().bounds().extents()
    }

    // ── lowering ──────────────────────────────────────────────────────────

    /// Device tolerance expressed in user units.
    fn user_tolerance(&self) -> f64 {
        let scale = self.state.matrix.mean_scale();
        if scale > 0.0 {
            (self.state.tolerance / scale).max(MIN_USER_TOLERANCE)
        } else {
            self.state.tolerance
        }
    }

    fn fill_geometry(&self) -> Geometry {
        tessellate::fill(&self.path, self.state.fill_rule, self.user_tolerance())
    }

    fn stroke_geometry(&self) -> Geometry {
        tessellate::stroke(&self.path, &self.state.stroke, self.user_tolerance())
    }

    /// Pixels of the current target a draw may touch.
    fn draw_region(&self) -> Option<PixelRect> {
        if self.target.is_destroyed() {
            log::debug!("context: draw on destroyed surface {} skipped", self.target.id());
            return None;
        }
        let bounds = PixelRect::of_size(self.target.width(), self.target.height());
        self.state.clip.resolve(bounds)
    }

    fn draw_user_geometry(&mut self, mut geometry: Geometry, mask: Option<&Pattern>, alpha: f64) {
        if geometry.is_empty() {
            return;
        }
        let matrix = self.state.matrix;
        if !(matrix.is_finite() && matrix.is_invertible()) {
            log::debug!("context: draw under singular transform skipped: {matrix:?}");
            return;
        }
        geometry.transform(&matrix);
        self.draw_device_geometry(geometry, mask, alpha);
    }

    /// Rasterizes device-space `geometry` with the source (optionally masked)
    /// into the clipped target.
    fn draw_device_geometry(&mut self, geometry: Geometry, mask: Option<&Pattern>, alpha: f64) {
        if geometry.is_empty() {
            return;
        }
        let Some(region) = self.draw_region() else {
            return;
        };
        let Some(region) = geometry
            .bounds()
            .to_rect()
            .and_then(|r| r.round_out().intersect(region))
        else {
            return;
        };
        let Some((paint, color)) = self.resolve_paint(region, mask, alpha) else {
            return;
        };

        let origin = Vec2::new(region.x as f64, region.y as f64);
        let mesh = Mesh::from_geometry(&geometry, origin, color);
        let params = RasterParams {
            antialias: self.state.antialias.is_enabled(),
            operator: self.state.operator,
        };
        let rasterizer = &mut self.rasterizer;
        self.target
            .with_bitmap_mut(|bitmap| rasterizer.draw_mesh(bitmap, region, &mesh, &paint, &params));
    }

    /// Paint for `region` and the premultiplied vertex color it is modulated by.
    ///
    /// Solid sources become vertex colors; anything else is sampled once per
    /// pixel center through the inverse transform.
    fn resolve_paint(
        &self,
        region: PixelRect,
        mask: Option<&Pattern>,
        alpha: f64,
    ) -> Option<(MeshPaint, [f32; 4])> {
        let alpha = alpha.clamp(0.0, 1.0) as f32;
        if mask.is_none() && self.state.operator.ignores_source() {
            return Some((MeshPaint::VertexColor, [0.0; 4]));
        }
        if let (Some(color), None) = (self.state.source.as_solid(), mask) {
            let color = color.with_alpha_scaled(alpha).premultiplied();
            return Some((MeshPaint::VertexColor, color));
        }

        let Some(inverse) = self.state.matrix.invert() else {
            log::debug!("context: pattern paint under singular transform skipped");
            return None;
        };
        // Samplers snapshot surface sources, which may be the target itself.
        let source = self.state.source.sampler();
        let mask = mask.map(Pattern::sampler);

        let mut image = PaintImage::from_fn(region.width, region.height, |x, y| {
            let device = Vec2::new(
                region.x as f64 + x as f64 + 0.5,
                region.y as f64 + y as f64 + 0.5,
            );
            let user = inverse.transform_point(device);
            let color = source.sample(user).premultiplied();
            match &mask {
                Some(m) => {
                    let coverage = m.sample(user).a.clamp(0.0, 1.0);
                    color.map(|c| c * coverage)
                }
                None => color,
            }
        });
        if alpha < 1.0 {
            image.scale_alpha(alpha);
        }
        Some((
            MeshPaint::Texture { image, origin: (region.x, region.y) },
            [1.0; 4],
        ))
    }

    fn draw_glyphs(&self, engine: &dyn TextEngine, origin: Vec2, text: &str) {
        let matrix = self.state.matrix;
        if !(matrix.is_finite() && matrix.is_invertible()) {
            log::debug!("context: text under singular transform skipped");
            return;
        }
        let Some(clip) = self.draw_region() else {
            return;
        };
        let device_origin = matrix.transform_point(origin);
        let font = self
            .state
            .font
            .with_size(self.state.font.size * matrix.mean_scale());
        let color = match self.state.source.as_solid() {
            Some(color) => color,
            None => self.state.source.color_at_point(origin.x, origin.y),
        };
        self.target.with_bitmap_mut(|bitmap| {
            engine.draw_text(bitmap, device_origin, text, &font, color, clip);
        });
    }
}

/// Two triangles covering `region` in device space.
fn region_quad(region: PixelRect) -> Geometry {
    let r = region.to_rect();
    let (min, max) = (r.min(), r.max());
    Geometry {
        vertices: vec![min, Vec2::new(max.x, min.y), max, Vec2::new(min.x, max.y)],
        indices: vec![0, 1, 2, 0, 2, 3],
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use crate::context::DrawingContext;
    use crate::coords::{AffineTransform, PixelRect, Vec2};
    use crate::paint::{Color, Pattern};
    use crate::raster::{Antialias, Operator};
    use crate::surface::{Bitmap, Surface};
    use crate::text::{FontExtents, FontSelection, TextEngine, TextExtents};

    fn ctx(w: i32, h: i32) -> (Surface, DrawingContext) {
        let surface = Surface::new(w, h);
        let c = DrawingContext::new(&surface).unwrap();
        (surface, c)
    }

    fn px(surface: &Surface, x: u32, y: u32) -> [u8; 4] {
        surface.with_bitmap(|b| b.pixel(x, y).to_rgba8()).unwrap()
    }

    const RED: [u8; 4] = [255, 0, 0, 255];
    const CLEAR: [u8; 4] = [0, 0, 0, 0];

    // ── fill and stroke ───────────────────────────────────────────────────

    #[test]
    fn fill_covers_the_rectangle_and_clears_the_path() {
        let (surface, mut c) = ctx(10, 10);
        c.set_source_rgb(1.0, 0.0, 0.0);
        c.rectangle(2.0, 2.0, 4.0, 4.0);
        c.fill();
        assert!(c.path().is_empty());
        assert_eq!(px(&surface, 2, 2), RED);
        assert_eq!(px(&surface, 5, 5), RED);
        assert_eq!(px(&surface, 1, 1), CLEAR);
        assert_eq!(px(&surface, 6, 6), CLEAR);
    }

    #[test]
    fn preserve_variants_keep_the_path() {
        let (_surface, mut c) = ctx(10, 10);
        c.rectangle(1.0, 1.0, 3.0, 3.0);
        c.fill_preserve();
        c.stroke_preserve();
        assert_eq!(c.path_extents(), (1.0, 1.0, 4.0, 4.0));
        c.stroke();
        assert!(c.path().is_empty());
    }

    #[test]
    fn stroke_widens_around_the_line() {
        let (surface, mut c) = ctx(10, 10);
        c.set_source_rgb(1.0, 0.0, 0.0);
        c.move_to(0.0, 5.0);
        c.line_to(10.0, 5.0);
        c.stroke();
        assert_eq!(px(&surface, 5, 4), RED);
        assert_eq!(px(&surface, 5, 5), RED);
        assert_eq!(px(&surface, 5, 3), CLEAR);
        assert_eq!(px(&surface, 5, 6), CLEAR);
    }

    #[test]
    fn transform_at_draw_time_is_authoritative() {
        let (surface, mut c) = ctx(10, 10);
        c.set_source_rgb(1.0, 0.0, 0.0);
        c.rectangle(0.0, 0.0, 2.0, 2.0);
        c.scale(2.0, 2.0);
        c.fill();
        assert_eq!(px(&surface, 3, 3), RED);
        assert_eq!(px(&surface, 4, 4), CLEAR);
    }

    #[test]
    fn aliased_fill_samples_pixel_centers() {
        let (surface, mut c) = ctx(10, 10);
        c.set_antialias(Antialias::None);
        c.set_source_rgb(1.0, 0.0, 0.0);
        c.rectangle(0.0, 0.0, 2.4, 2.6);
        c.fill();
        assert_eq!(px(&surface, 1, 2), RED);
        assert_eq!(px(&surface, 2, 0), CLEAR);
    }

    // ── paint, alpha and operators ────────────────────────────────────────

    #[test]
    fn paint_respects_the_clip() {
        let (surface, mut c) = ctx(10, 10);
        c.set_source_rgb(1.0, 0.0, 0.0);
        c.rectangle(0.0, 0.0, 5.0, 5.0);
        c.clip();
        c.paint();
        assert_eq!(px(&surface, 0, 0), RED);
        assert_eq!(px(&surface, 4, 4), RED);
        assert_eq!(px(&surface, 5, 5), CLEAR);
        assert_eq!(px(&surface, 9, 0), CLEAR);
    }

    #[test]
    fn paint_with_alpha_fades_the_source() {
        let (surface, mut c) = ctx(2, 2);
        c.set_source_rgb(1.0, 0.0, 0.0);
        c.paint_with_alpha(0.5);
        let [r, g, b, a] = px(&surface, 1, 1);
        assert_eq!((r, g, b), (255, 0, 0));
        assert!((a as i32 - 128).abs() <= 1);
        c.paint_with_alpha(0.0);
        assert!((px(&surface, 1, 1)[3] as i32 - 128).abs() <= 1);
    }

    #[test]
    fn clear_operator_erases_covered_pixels() {
        let (surface, mut c) = ctx(4, 4);
        c.set_source_rgb(1.0, 0.0, 0.0);
        c.paint();
        c.set_operator(Operator::Clear);
        c.rectangle(0.0, 0.0, 2.0, 2.0);
        c.fill();
        assert_eq!(px(&surface, 0, 0), CLEAR);
        assert_eq!(px(&surface, 1, 1), CLEAR);
        assert_eq!(px(&surface, 3, 3), RED);
    }

    #[test]
    fn gradient_source_is_sampled_per_pixel() {
        let (surface, mut c) = ctx(10, 1);
        let mut g = Pattern::linear(0.0, 0.0, 10.0, 0.0);
        g.add_color_stop(0.0, Color::black());
        g.add_color_stop(1.0, Color::white());
        c.set_source(g);
        c.paint();
        let reds: Vec<u8> = (0..10).map(|x| px(&surface, x, 0)[0]).collect();
        assert!(reds.windows(2).all(|w| w[0] < w[1]), "{reds:?}");
        assert!(reds[0] < 20 && reds[9] > 235);
        assert!((0..10).all(|x| px(&surface, x, 0)[3] == 255));
    }

    #[test]
    fn surface_source_can_be_the_target() {
        let (surface, mut c) = ctx(4, 1);
        c.set_source_rgb(1.0, 0.0, 0.0);
        c.rectangle(0.0, 0.0, 1.0, 1.0);
        c.fill();
        c.set_source_surface(&surface, 1.0, 0.0);
        c.paint();
        assert_eq!(px(&surface, 0, 0), RED);
        assert_eq!(px(&surface, 1, 0), RED);
        assert_eq!(px(&surface, 2, 0), CLEAR);
    }

    // ── mask ──────────────────────────────────────────────────────────────

    #[test]
    fn mask_surface_uses_alpha_as_coverage() {
        let mask = Surface::new(4, 1);
        mask.with_bitmap_mut(|b| {
            b.set_pixel(0, 0, Color::white());
            b.set_pixel(1, 0, Color::rgba(0.0, 0.0, 0.0, 1.0));
        });
        let (surface, mut c) = ctx(4, 1);
        c.set_source_rgb(1.0, 0.0, 0.0);
        c.mask_surface(&mask, 0.0, 0.0);
        assert_eq!(px(&surface, 0, 0), RED);
        assert_eq!(px(&surface, 1, 0), RED);
        assert_eq!(px(&surface, 2, 0), CLEAR);
        assert_eq!(px(&surface, 3, 0), CLEAR);
    }

    #[test]
    fn mask_pattern_scales_coverage() {
        let (surface, mut c) = ctx(2, 2);
        c.set_source_rgb(0.0, 0.0, 1.0);
        c.mask(&Pattern::rgba(0.0, 0.0, 0.0, 0.5));
        let [_, _, b, a] = px(&surface, 0, 0);
        assert_eq!(b, 255);
        assert!((a as i32 - 128).abs() <= 1);
    }

    // ── hit testing ───────────────────────────────────────────────────────

    #[test]
    fn in_fill_and_in_stroke() {
        let (_surface, mut c) = ctx(4, 4);
        c.rectangle(10.0, 10.0, 20.0, 20.0);
        assert!(c.in_fill(15.0, 15.0));
        assert!(!c.in_fill(5.0, 5.0));
        assert!(c.in_stroke(10.0, 15.0));
        assert!(c.in_stroke(10.9, 15.0));
        assert!(!c.in_stroke(15.0, 15.0));
        assert!(!c.path().is_empty());
    }

    #[test]
    fn hit_tests_follow_the_transform() {
        let (_surface, mut c) = ctx(4, 4);
        c.scale(2.0, 2.0);
        c.rectangle(0.0, 0.0, 5.0, 5.0);
        // Hit tests take user-space points.
        assert!(c.in_fill(4.0, 4.0));
        assert!(!c.in_fill(6.0, 6.0));
    }

    #[test]
    fn fill_and_stroke_extents() {
        let (_surface, mut c) = ctx(4, 4);
        assert_eq!(c.fill_extents(), (0.0, 0.0, 0.0, 0.0));
        c.rectangle(10.0, 10.0, 20.0, 20.0);
        assert_eq!(c.fill_extents(), (10.0, 10.0, 30.0, 30.0));
        let (x1, y1, x2, y2) = c.stroke_extents();
        assert!((x1 - 9.0).abs() < 1e-4 && (y1 - 9.0).abs() < 1e-4);
        assert!((x2 - 31.0).abs() < 1e-4 && (y2 - 31.0).abs() < 1e-4);
    }

    // ── degenerate input ──────────────────────────────────────────────────

    #[test]
    fn singular_transform_skips_path_draws() {
        let (surface, mut c) = ctx(4, 4);
        c.set_source_rgb(1.0, 0.0, 0.0);
        c.set_matrix(AffineTransform::scaling(0.0, 0.0));
        c.rectangle(0.0, 0.0, 4.0, 4.0);
        c.fill();
        c.set_source(Pattern::linear(0.0, 0.0, 1.0, 0.0));
        c.paint();
        assert_eq!(px(&surface, 1, 1), CLEAR);
    }

    #[test]
    fn destroyed_target_makes_draws_no_ops() {
        let (surface, mut c) = ctx(4, 4);
        surface.destroy();
        c.rectangle(0.0, 0.0, 4.0, 4.0);
        c.fill();
        c.paint();
        c.mask(&Pattern::rgb(0.0, 0.0, 0.0));
        c.push_group();
        c.paint();
        c.pop_group_to_source();
        c.paint();
        assert!(surface.image().is_none());
    }

    #[test]
    fn one_pixel_surface_and_single_point_paths() {
        let (surface, mut c) = ctx(0, 0);
        c.move_to(0.5, 0.5);
        c.fill_preserve();
        c.stroke();
        c.arc(0.5, 0.5, 0.0, 0.0, 1.0);
        c.fill();
        c.set_source(Pattern::linear(0.0, 0.0, 0.0, 0.0));
        c.paint();
        c.set_source(Pattern::radial(0.0, 0.0, 0.0, 0.0, 0.0, 0.0));
        c.paint();
        assert_eq!((surface.width(), surface.height()), (1, 1));
    }

    #[test]
    fn sub_tolerance_dash_strokes_at_average_coverage() {
        let (surface, mut c) = ctx(64, 64);
        c.set_source_rgb(1.0, 0.0, 0.0);
        c.set_dash(&[1e-7, 1e-7], 0.0);
        c.move_to(0.0, 32.5);
        c.line_to(1000.0, 32.5);
        let started = std::time::Instant::now();
        c.stroke();
        assert!(started.elapsed() < std::time::Duration::from_secs(5));
        assert_eq!(px(&surface, 10, 32), RED);
        assert_eq!(px(&surface, 10, 31), CLEAR);
        assert_eq!(px(&surface, 10, 33), CLEAR);
    }

    #[test]
    fn non_finite_coordinates_do_not_panic() {
        let (_surface, mut c) = ctx(4, 4);
        c.move_to(f64::NAN, 1.0);
        c.line_to(f64::INFINITY, 2.0);
        c.curve_to(1.0, f64::NAN, 2.0, 2.0, 3.0, 3.0);
        c.fill_preserve();
        c.stroke_preserve();
        c.clip();
        c.paint();
        assert!(!c.in_fill(f64::NAN, 0.0));
    }

    // ── text ──────────────────────────────────────────────────────────────

    #[derive(Default)]
    struct Recorder {
        calls: Mutex<Vec<(Vec2, String, f64, PixelRect)>>,
    }

    impl TextEngine for Recorder {
        fn measure_text(&self, text: &str, font: &FontSelection) -> TextExtents {
            let w = text.chars().count() as f64 * font.size / 2.0;
            TextExtents { width: w, height: font.size, x_advance: w }
        }

        fn font_extents(&self, font: &FontSelection) -> FontExtents {
            FontExtents { ascent: font.size, descent: 0.0, height: font.size }
        }

        fn draw_text(
            &self,
            _target: &mut Bitmap,
            origin: Vec2,
            text: &str,
            font: &FontSelection,
            _color: Color,
            clip: PixelRect,
        ) {
            self.calls
                .lock()
                .unwrap()
                .push((origin, text.to_string(), font.size, clip));
        }
    }

    #[test]
    fn show_text_forwards_device_origin_and_advances() {
        let (_surface, mut c) = ctx(100, 50);
        let engine = Arc::new(Recorder::default());
        c.set_text_engine(engine.clone());
        c.set_font_size(10.0);
        c.scale(2.0, 2.0);
        c.move_to(5.0, 10.0);
        c.show_text("abcd");

        let calls = engine.calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        let (origin, text, size, clip) = &calls[0];
        assert_eq!(*origin, Vec2::new(10.0, 20.0));
        assert_eq!(text, "abcd");
        assert_eq!(*size, 20.0);
        assert_eq!(*clip, PixelRect::of_size(100, 50));
        drop(calls);

        assert_eq!(c.current_point(), Some((25.0, 10.0)));
        assert_eq!(c.text_extents("ab").x_advance, 10.0);
        assert_eq!(c.font_extents().ascent, 10.0);
    }

    #[test]
    fn show_text_without_engine_is_a_no_op() {
        let (_surface, mut c) = ctx(4, 4);
        c.move_to(1.0, 1.0);
        c.show_text("hi");
        assert_eq!(c.current_point(), Some((1.0, 1.0)));
    }
}
