use std::f64::consts::TAU;

use crate::coords::{Bounds, Vec2};

use super::outline::{self, SubPath};

/// One recorded path-building step, in user-space coordinates.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum PathSegment {
    MoveTo(Vec2),
    LineTo(Vec2),
    /// Cubic Bézier: two control points, then the end point.
    CurveTo(Vec2, Vec2, Vec2),
    /// Counter-clockwise (increasing angle) arc; `angle2 >= angle1`.
    Arc {
        center: Vec2,
        radius: f64,
        angle1: f64,
        angle2: f64,
    },
    /// Clockwise (decreasing angle) arc; `angle2 <= angle1`.
    ArcNegative {
        center: Vec2,
        radius: f64,
        angle1: f64,
        angle2: f64,
    },
    ClosePath,
}

/// The current drawable shape.
///
/// Invariants:
/// - `bounds` covers every point the segments can reach (arcs and curves use
///   their full circle / control-point extents, not exact extrema)
/// - relative operations are no-ops when there is no current point
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Path {
    segments: Vec<PathSegment>,
    bounds: Bounds,
    current: Option<Vec2>,
    subpath_start: Option<Vec2>,
}

impl Path {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Drops every segment and the current point.
    pub fn clear(&mut self) {
        self.segments.clear();
        self.bounds = Bounds::empty();
        self.current = None;
        self.subpath_start = None;
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    #[inline]
    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    #[inline]
    pub fn bounds(&self) -> Bounds {
        self.bounds
    }

    #[inline]
    pub fn current_point(&self) -> Option<Vec2> {
        self.current
    }

    /// Forgets the current point without closing anything.
    ///
    /// The next `line_to`/`arc` starts a fresh subpath instead of connecting.
    #[inline]
    pub fn new_sub_path(&mut self) {
        self.current = None;
    }

    pub fn move_to(&mut self, x: f64, y: f64) {
        let p = Vec2::new(x, y);
        self.segments.push(PathSegment::MoveTo(p));
        self.bounds.include(p);
        self.current = Some(p);
        self.subpath_start = Some(p);
    }

    /// Line from the current point; acts as `move_to` when there is none.
    pub fn line_to(&mut self, x: f64, y: f64) {
        if self.current.is_none() {
            self.move_to(x, y);
            return;
        }
        let p = Vec2::new(x, y);
        self.segments.push(PathSegment::LineTo(p));
        self.bounds.include(p);
        self.current = Some(p);
    }

    /// Cubic Bézier from the current point; starts at `(x1, y1)` when there is none.
    pub fn curve_to(&mut self, x1: f64, y1: f64, x2: f64, y2: f64, x3: f64, y3: f64) {
        if self.current.is_none() {
            self.move_to(x1, y1);
        }
        let c1 = Vec2::new(x1, y1);
        let c2 = Vec2::new(x2, y2);
        let end = Vec2::new(x3, y3);
        self.segments.push(PathSegment::CurveTo(c1, c2, end));
        self.bounds.include(c1);
        self.bounds.include(c2);
        self.bounds.include(end);
        self.current = Some(end);
    }

    /// Arc of increasing angle around `(xc, yc)`.
    ///
    /// A line joins the current point (if any) to the arc start. `angle2` is
    /// advanced by whole turns until it is not less than `angle1`.
    pub fn arc(&mut self, xc: f64, yc: f64, radius: f64, angle1: f64, angle2: f64) {
        let Some(angle2) = normalize_sweep(angle1, angle2, false) else {
            log::debug!("arc with non-finite angles ignored");
            return;
        };
        self.push_arc(xc, yc, radius, angle1, angle2, false);
    }

    /// Arc of decreasing angle around `(xc, yc)`.
    ///
    /// `angle2` is reduced by whole turns until it is not greater than `angle1`.
    pub fn arc_negative(&mut self, xc: f64, yc: f64, radius: f64, angle1: f64, angle2: f64) {
        let Some(angle2) = normalize_sweep(angle1, angle2, true) else {
            log::debug!("arc_negative with non-finite angles ignored");
            return;
        };
        self.push_arc(xc, yc, radius, angle1, angle2, true);
    }

    fn push_arc(
        &mut self,
        xc: f64,
        yc: f64,
        radius: f64,
        angle1: f64,
        angle2: f64,
        negative: bool,
    ) {
        if !(radius > 0.0 && radius.is_finite()) {
            self.line_to(xc, yc);
            return;
        }
        let angle2 = outline::clamp_arc_end(angle1, angle2);
        let center = Vec2::new(xc, yc);
        let start = outline::point_on_circle(center, radius, angle1);
        let end = outline::point_on_circle(center, radius, angle2);

        if self.current.is_some() {
            self.line_to(start.x, start.y);
        } else {
            self.move_to(start.x, start.y);
        }

        self.segments.push(if negative {
            PathSegment::ArcNegative { center, radius, angle1, angle2 }
        } else {
            PathSegment::Arc { center, radius, angle1, angle2 }
        });
        self.bounds.include(Vec2::new(xc - radius, yc - radius));
        self.bounds.include(Vec2::new(xc + radius, yc + radius));
        self.bounds.include(end);
        self.current = Some(end);
    }

    /// Closes the current subpath; the current point returns to its start.
    pub fn close_path(&mut self) {
        if self.current.is_none() {
            return;
        }
        self.segments.push(PathSegment::ClosePath);
        self.current = self.subpath_start;
    }

    /// Closed axis-aligned rectangle starting at `(x, y)`.
    pub fn rectangle(&mut self, x: f64, y: f64, width: f64, height: f64) {
        self.move_to(x, y);
        self.line_to(x + width, y);
        self.line_to(x + width, y + height);
        self.line_to(x, y + height);
        self.close_path();
    }

    /// `move_to` relative to the current point; no-op without one.
    pub fn rel_move_to(&mut self, dx: f64, dy: f64) {
        match self.current {
            Some(c) => self.move_to(c.x + dx, c.y + dy),
            None => log::debug!("rel_move_to without a current point ignored"),
        }
    }

    /// `line_to` relative to the current point; no-op without one.
    pub fn rel_line_to(&mut self, dx: f64, dy: f64) {
        match self.current {
            Some(c) => self.line_to(c.x + dx, c.y + dy),
            None => log::debug!("rel_line_to without a current point ignored"),
        }
    }

    /// `curve_to` relative to the current point; no-op without one.
    pub fn rel_curve_to(&mut self, dx1: f64, dy1: f64, dx2: f64, dy2: f64, dx3: f64, dy3: f64) {
        match self.current {
            Some(c) => self.curve_to(
                c.x + dx1,
                c.y + dy1,
                c.x + dx2,
                c.y + dy2,
                c.x + dx3,
                c.y + dy3,
            ),
            None => log::debug!("rel_curve_to without a current point ignored"),
        }
    }

    /// Replays `other`'s segments onto this path.
    pub fn append(&mut self, other: &Path) {
        for seg in other.segments() {
            match *seg {
                PathSegment::MoveTo(p) => self.move_to(p.x, p.y),
                PathSegment::LineTo(p) => self.line_to(p.x, p.y),
                PathSegment::CurveTo(a, b, c) => self.curve_to(a.x, a.y, b.x, b.y, c.x, c.y),
                PathSegment::Arc { center, radius, angle1, angle2 } => {
                    self.arc(center.x, center.y, radius, angle1, angle2)
                }
                PathSegment::ArcNegative { center, radius, angle1, angle2 } => {
                    self.arc_negative(center.x, center.y, radius, angle1, angle2)
                }
                PathSegment::ClosePath => self.close_path(),
            }
        }
    }

    /// Splits the path into subpaths of lines and cubics (arcs converted).
    pub fn outline(&self) -> Vec<SubPath> {
        outline::build(&self.segments)
    }
}

/// Advances (or retreats) `angle2` by whole turns so the sweep runs in the
/// requested direction. `None` for non-finite input.
fn normalize_sweep(angle1: f64, angle2: f64, negative: bool) -> Option<f64> {
    if !(angle1.is_finite() && angle2.is_finite()) {
        return None;
    }
    let sweep = angle2 - angle1;
    Some(if negative {
        if sweep > 0.0 { angle1 - (-sweep).rem_euclid(TAU) } else { angle2 }
    } else if sweep < 0.0 {
        angle1 + sweep.rem_euclid(TAU)
    } else {
        angle2
    })
}
