use std::sync::Arc;

use crate::coords::{AffineTransform, PixelRect, Vec2};
use crate::paint::{Color, Pattern};
use crate::path::{Dash, Path};
use crate::raster::{Antialias, Operator, Rasterizer, SoftwareRasterizer};
use crate::surface::Surface;
use crate::tessellate::{FillRule, LineCap, LineJoin};
use crate::text::{FontExtents, FontSelection, FontSlant, FontWeight, TextEngine, TextExtents};

use super::clip::device_box;
use super::group::GroupFrame;
use super::state::sanitize_tolerance;
use super::{ClipRegion, ContextConfig, GraphicsState};

/// Stateful, immediate-mode drawing context bound to one [`Surface`].
///
/// Model:
/// - path coordinates are recorded in user space; the transform in effect
///   when a path is filled, stroked or clipped is the one applied
/// - `save`/`restore` push and pop [`GraphicsState`] snapshots; the path and
///   the group stack are not part of a snapshot
/// - `push_group` redirects drawing to a fresh surface until `pop_group`
///
/// Degenerate input never panics: singular transforms, empty paths and
/// destroyed surfaces turn the affected operation into a logged no-op.
pub struct DrawingContext {
    pub(super) target: Surface,
    pub(super) rasterizer: Box<dyn Rasterizer>,
    pub(super) text: Option<Arc<dyn TextEngine>>,
    pub(super) state: GraphicsState,
    pub(super) saved: Vec<GraphicsState>,
    pub(super) path: Path,
    pub(super) groups: Vec<GroupFrame>,
}

impl std::fmt::Debug for DrawingContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DrawingContext")
            .field("target", &self.target)
            .field("rasterizer", &self.rasterizer.name())
            .field("state", &self.state)
            .field("saved", &self.saved.len())
            .field("groups", &self.groups.len())
            .finish_non_exhaustive()
    }
}

impl DrawingContext {
    /// Binds a software-rasterized context to `surface`.
    ///
    /// Returns `None` when the surface is already destroyed.
    pub fn new(surface: &Surface) -> Option<Self> {
        Self::with_config(surface, ContextConfig::default())
    }

    pub fn with_config(surface: &Surface, config: ContextConfig) -> Option<Self> {
        Self::with_rasterizer(surface, Box::new(SoftwareRasterizer::new()), config)
    }

    /// Binds a context that submits its triangle lists to `rasterizer`.
    pub fn with_rasterizer(
        surface: &Surface,
        rasterizer: Box<dyn Rasterizer>,
        config: ContextConfig,
    ) -> Option<Self> {
        if surface.is_destroyed() {
            log::debug!("context: refusing to bind destroyed surface {}", surface.id());
            return None;
        }
        log::debug!(
            "context: bound to surface {} ({} rasterizer)",
            surface.id(),
            rasterizer.name()
        );
        Some(Self {
            target: surface.clone(),
            rasterizer,
            text: None,
            state: GraphicsState::from_config(&config),
            saved: Vec::new(),
            path: Path::new(),
            groups: Vec::new(),
        })
    }

    /// Installs the font collaborator used by the text operations.
    pub fn set_text_engine(&mut self, engine: Arc<dyn TextEngine>) {
        self.text = Some(engine);
    }

    pub fn with_text_engine(mut self, engine: Arc<dyn TextEngine>) -> Self {
        self.set_text_engine(engine);
        self
    }

    pub fn text_engine(&self) -> Option<&Arc<dyn TextEngine>> {
        self.text.as_ref()
    }

    /// Surface the context was created for, regardless of open groups.
    pub fn target(&self) -> &Surface {
        self.groups
            .first()
            .map(|frame| &frame.parent)
            .unwrap_or(&self.target)
    }

    /// Surface currently drawn into: the innermost group's, or the target.
    #[inline]
    pub fn group_target(&self) -> &Surface {
        &self.target
    }

    /// Current attribute set.
    #[inline]
    pub fn state(&self) -> &GraphicsState {
        &self.state
    }

    // ── save / restore ────────────────────────────────────────────────────

    pub fn save(&mut self) {
        self.saved.push(self.state.clone());
    }

    /// Pops the most recent `save`. With nothing to pop (or only snapshots
    /// owned by an enclosing group) this does nothing.
    pub fn restore(&mut self) {
        let floor = self.groups.last().map_or(0, |frame| frame.saved_depth);
        if self.saved.len() <= floor {
            log::debug!("context: restore without matching save ignored");
            return;
        }
        if let Some(state) = self.saved.pop() {
            self.state = state;
        }
    }

    /// Number of `save` calls not yet restored.
    #[inline]
    pub fn save_depth(&self) -> usize {
        self.saved.len()
    }

    // ── source ────────────────────────────────────────────────────────────

    pub fn set_source_rgb(&mut self, r: f64, g: f64, b: f64) {
        self.state.source = Pattern::rgb(r, g, b);
    }

    pub fn set_source_rgba(&mut self, r: f64, g: f64, b: f64, a: f64) {
        self.state.source = Pattern::rgba(r, g, b, a);
    }

    pub fn set_source_color(&mut self, color: Color) {
        self.state.source = Pattern::solid(color);
    }

    pub fn set_source(&mut self, pattern: Pattern) {
        self.state.source = pattern;
    }

    /// Uses `surface` as the paint, its top-left corner at user-space `(x, y)`.
    pub fn set_source_surface(&mut self, surface: &Surface, x: f64, y: f64) {
        self.state.source = Pattern::for_surface_at(surface, x, y);
    }

    #[inline]
    pub fn source(&self) -> &Pattern {
        &self.state.source
    }

    // ── stroke and fill attributes ────────────────────────────────────────

    /// Negative or non-finite widths are ignored.
    pub fn set_line_width(&mut self, width: f64) {
        if !(width.is_finite() && width >= 0.0) {
            log::debug!("context: ignoring line width {width}");
            return;
        }
        self.state.stroke.width = width;
    }

    #[inline]
    pub fn line_width(&self) -> f64 {
        self.state.stroke.width
    }

    pub fn set_line_cap(&mut self, cap: LineCap) {
        self.state.stroke.cap = cap;
    }

    #[inline]
    pub fn line_cap(&self) -> LineCap {
        self.state.stroke.cap
    }

    pub fn set_line_join(&mut self, join: LineJoin) {
        self.state.stroke.join = join;
    }

    #[inline]
    pub fn line_join(&self) -> LineJoin {
        self.state.stroke.join
    }

    pub fn set_miter_limit(&mut self, limit: f64) {
        if !limit.is_finite() {
            log::debug!("context: ignoring miter limit {limit}");
            return;
        }
        self.state.stroke.miter_limit = limit;
    }

    #[inline]
    pub fn miter_limit(&self) -> f64 {
        self.state.stroke.miter_limit
    }

    /// Sets the dash pattern; an empty `dashes` slice turns dashing off.
    ///
    /// Invalid patterns (negative or non-finite entries, all zeros) leave the
    /// current setting unchanged.
    pub fn set_dash(&mut self, dashes: &[f64], offset: f64) {
        if dashes.is_empty() {
            self.state.stroke.dash = None;
            return;
        }
        match Dash::new(dashes, offset) {
            Some(dash) => self.state.stroke.dash = Some(dash),
            None => log::debug!("context: invalid dash pattern {dashes:?} ignored"),
        }
    }

    /// Current dash pattern and offset; empty when dashing is off.
    pub fn dash(&self) -> (&[f64], f64) {
        match &self.state.stroke.dash {
            Some(dash) => (dash.pattern(), dash.offset()),
            None => (&[], 0.0),
        }
    }

    pub fn set_fill_rule(&mut self, rule: FillRule) {
        self.state.fill_rule = rule;
    }

    #[inline]
    pub fn fill_rule(&self) -> FillRule {
        self.state.fill_rule
    }

    pub fn set_antialias(&mut self, antialias: Antialias) {
        self.state.antialias = antialias;
    }

    #[inline]
    pub fn antialias(&self) -> Antialias {
        self.state.antialias
    }

    pub fn set_operator(&mut self, operator: Operator) {
        self.state.operator = operator;
    }

    #[inline]
    pub fn operator(&self) -> Operator {
        self.state.operator
    }

    /// Flattening tolerance in device pixels.
    pub fn set_tolerance(&mut self, tolerance: f64) {
        self.state.tolerance = sanitize_tolerance(tolerance);
    }

    #[inline]
    pub fn tolerance(&self) -> f64 {
        self.state.tolerance
    }

    // ── path building ─────────────────────────────────────────────────────

    pub fn new_path(&mut self) {
        self.path.clear();
    }

    pub fn new_sub_path(&mut self) {
        self.path.new_sub_path();
    }

    pub fn move_to(&mut self, x: f64, y: f64) {
        self.path.move_to(x, y);
    }

    pub fn line_to(&mut self, x: f64, y: f64) {
        self.path.line_to(x, y);
    }

    pub fn curve_to(&mut self, x1: f64, y1: f64, x2: f64, y2: f64, x3: f64, y3: f64) {
        self.path.curve_to(x1, y1, x2, y2, x3, y3);
    }

    pub fn arc(&mut self, xc: f64, yc: f64, radius: f64, angle1: f64, angle2: f64) {
        self.path.arc(xc, yc, radius, angle1, angle2);
    }

    pub fn arc_negative(&mut self, xc: f64, yc: f64, radius: f64, angle1: f64, angle2: f64) {
        self.path.arc_negative(xc, yc, radius, angle1, angle2);
    }

    pub fn close_path(&mut self) {
        self.path.close_path();
    }

    pub fn rectangle(&mut self, x: f64, y: f64, width: f64, height: f64) {
        self.path.rectangle(x, y, width, height);
    }

    /// Relative operations do nothing when there is no current point.
    pub fn rel_move_to(&mut self, dx: f64, dy: f64) {
        self.path.rel_move_to(dx, dy);
    }

    pub fn rel_line_to(&mut self, dx: f64, dy: f64) {
        self.path.rel_line_to(dx, dy);
    }

    pub fn rel_curve_to(&mut self, dx1: f64, dy1: f64, dx2: f64, dy2: f64, dx3: f64, dy3: f64) {
        self.path.rel_curve_to(dx1, dy1, dx2, dy2, dx3, dy3);
    }

    /// Appends `path`'s segments to the current path.
    pub fn append_path(&mut self, path: &Path) {
        self.path.append(path);
    }

    // ── path queries ──────────────────────────────────────────────────────

    #[inline]
    pub fn has_current_point(&self) -> bool {
        self.path.current_point().is_some()
    }

    /// Current point in user space.
    pub fn current_point(&self) -> Option<(f64, f64)> {
        self.path.current_point().map(|p| (p.x, p.y))
    }

    /// Running bounding box of the current path as `(x1, y1, x2, y2)`.
    ///
    /// Arcs and curves contribute conservative boxes; an empty path reports zeros.
    pub fn path_extents(&self) -> (f64, f64, f64, f64) {
        self.path.bounds().extents()
    }

    pub fn copy_path(&self) -> Path {
        self.path.clone()
    }

    #[inline]
    pub fn path(&self) -> &Path {
        &self.path
    }

    // ── transforms ────────────────────────────────────────────────────────

    pub fn translate(&mut self, tx: f64, ty: f64) {
        self.transform(&AffineTransform::translation(tx, ty));
    }

    pub fn scale(&mut self, sx: f64, sy: f64) {
        self.transform(&AffineTransform::scaling(sx, sy));
    }

    pub fn rotate(&mut self, radians: f64) {
        self.transform(&AffineTransform::rotation(radians));
    }

    /// Applies `matrix` to user space ahead of the current transform.
    pub fn transform(&mut self, matrix: &AffineTransform) {
        self.state.matrix = matrix.multiply(&self.state.matrix);
    }

    /// Replaces the user-to-device transform.
    ///
    /// A singular matrix is accepted; draws made while it is current are skipped.
    pub fn set_matrix(&mut self, matrix: AffineTransform) {
        if !matrix.is_invertible() {
            log::debug!("context: singular transform installed: {matrix:?}");
        }
        self.state.matrix = matrix;
    }

    #[inline]
    pub fn matrix(&self) -> AffineTransform {
        self.state.matrix
    }

    pub fn identity_matrix(&mut self) {
        self.state.matrix = AffineTransform::identity();
    }

    pub fn user_to_device(&self, x: f64, y: f64) -> (f64, f64) {
        let p = self.state.matrix.transform_point(Vec2::new(x, y));
        (p.x, p.y)
    }

    pub fn user_to_device_distance(&self, dx: f64, dy: f64) -> (f64, f64) {
        let d = self.state.matrix.transform_distance(Vec2::new(dx, dy));
        (d.x, d.y)
    }

    /// `None` under a singular transform.
    pub fn device_to_user(&self, x: f64, y: f64) -> Option<(f64, f64)> {
        let inv = self.state.matrix.invert()?;
        let p = inv.transform_point(Vec2::new(x, y));
        Some((p.x, p.y))
    }

    pub fn device_to_user_distance(&self, dx: f64, dy: f64) -> Option<(f64, f64)> {
        let inv = self.state.matrix.invert()?;
        let d = inv.transform_distance(Vec2::new(dx, dy));
        Some((d.x, d.y))
    }

    // ── clip ──────────────────────────────────────────────────────────────

    /// Replaces the clip with the box of the current path, then clears the path.
    pub fn clip(&mut self) {
        self.clip_preserve();
        self.path.clear();
    }

    /// Replaces the clip with the device-space box of the current path.
    pub fn clip_preserve(&mut self) {
        self.state.clip = ClipRegion::from_bounds(&self.path.bounds(), &self.state.matrix);
        log::trace!("context: clip set to {:?}", self.state.clip);
    }

    pub fn reset_clip(&mut self) {
        self.state.clip = ClipRegion::Unbounded;
    }

    /// Whether user-space `(x, y)` lies inside the clip (boundary included).
    pub fn in_clip(&self, x: f64, y: f64) -> bool {
        let p = self.state.matrix.transform_point(Vec2::new(x, y));
        p.is_finite() && self.state.clip.contains(p)
    }

    /// User-space box around the clip as `(x1, y1, x2, y2)`; zeros when
    /// everything is clipped out or the transform is singular.
    pub fn clip_extents(&self) -> (f64, f64, f64, f64) {
        let target = PixelRect::of_size(self.target.width(), self.target.height());
        let user = self
            .state
            .clip
            .device_extent(target)
            .zip(self.state.matrix.invert())
            .and_then(|(rect, inv)| device_box(rect, &inv));
        match user {
            Some(r) => (r.origin.x, r.origin.y, r.origin.x + r.size.x, r.origin.y + r.size.y),
            None => (0.0, 0.0, 0.0, 0.0),
        }
    }

    // ── text ──────────────────────────────────────────────────────────────

    pub fn select_font_face(&mut self, family: &str, slant: FontSlant, weight: FontWeight) {
        self.state.font.family = family.to_string();
        self.state.font.slant = slant;
        self.state.font.weight = weight;
    }

    /// Font size in user-space units.
    pub fn set_font_size(&mut self, size: f64) {
        if !(size.is_finite() && size >= 0.0) {
            log::debug!("context: ignoring font size {size}");
            return;
        }
        self.state.font.size = size;
    }

    #[inline]
    pub fn font_selection(&self) -> &FontSelection {
        &self.state.font
    }

    /// User-space extents of `text` in the current font; zero without a text engine.
    pub fn text_extents(&self, text: &str) -> TextExtents {
        self.text
            .as_ref()
            .map(|engine| engine.measure_text(text, &self.state.font))
            .unwrap_or_default()
    }

    pub fn font_extents(&self) -> FontExtents {
        self.text
            .as_ref()
            .map(|engine| engine.font_extents(&self.state.font))
            .unwrap_or_default()
    }
}
