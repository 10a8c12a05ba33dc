//! Path segments lowered to subpaths of lines and cubic Béziers.

use std::f64::consts::{FRAC_PI_2, TAU};

use crate::coords::Vec2;

use super::PathSegment;

/// Sweeps longer than this many turns are truncated when converting arcs.
const MAX_ARC_TURNS: f64 = 8.0;
/// Upper bound on segments per flattened cubic.
const MAX_CUBIC_STEPS: usize = 256;

#[derive(Debug, Copy, Clone, PartialEq)]
pub enum Element {
    Line(Vec2),
    Cubic(Vec2, Vec2, Vec2),
}

impl Element {
    #[inline]
    pub fn end(&self) -> Vec2 {
        match *self {
            Element::Line(p) | Element::Cubic(_, _, p) => p,
        }
    }
}

/// A connected run of elements starting at `start`.
#[derive(Debug, Clone, PartialEq)]
pub struct SubPath {
    pub start: Vec2,
    pub elements: Vec<Element>,
    pub closed: bool,
}

impl SubPath {
    fn new(start: Vec2) -> Self {
        Self { start, elements: Vec::new(), closed: false }
    }

    /// Polyline approximation within `tolerance` user units.
    ///
    /// The first point is `start`. Closed subpaths do not repeat it at the end.
    pub fn flatten(&self, tolerance: f64) -> Vec<Vec2> {
        let tolerance = tolerance.max(1e-3);
        let mut out = vec![self.start];
        let mut from = self.start;
        for el in &self.elements {
            match *el {
                Element::Line(p) => out.push(p),
                Element::Cubic(c1, c2, p) => flatten_cubic(from, c1, c2, p, tolerance, &mut out),
            }
            from = el.end();
        }
        if self.closed && out.len() > 1 && out.last() == Some(&self.start) {
            out.pop();
        }
        out
    }
}

/// `angle2` pulled to within `MAX_ARC_TURNS` turns of `angle1`.
#[inline]
pub(crate) fn clamp_arc_end(angle1: f64, angle2: f64) -> f64 {
    let limit = MAX_ARC_TURNS * TAU;
    angle1 + (angle2 - angle1).clamp(-limit, limit)
}

#[inline]
pub(crate) fn point_on_circle(center: Vec2, radius: f64, angle: f64) -> Vec2 {
    Vec2::new(center.x + radius * angle.cos(), center.y + radius * angle.sin())
}

pub(super) fn build(segments: &[PathSegment]) -> Vec<SubPath> {
    let mut subpaths: Vec<SubPath> = Vec::new();
    let mut open: Option<SubPath> = None;
    // Where a drawing op after `ClosePath` restarts.
    let mut reopen_at: Option<Vec2> = None;

    fn ensure<'a>(
        open: &'a mut Option<SubPath>,
        reopen_at: &mut Option<Vec2>,
        fallback: Vec2,
    ) -> &'a mut SubPath {
        let start = reopen_at.take().unwrap_or(fallback);
        open.get_or_insert_with(|| SubPath::new(start))
    }

    for seg in segments {
        match *seg {
            PathSegment::MoveTo(p) => {
                if let Some(sp) = open.take() {
                    subpaths.push(sp);
                }
                reopen_at = None;
                open = Some(SubPath::new(p));
            }
            PathSegment::LineTo(p) => {
                ensure(&mut open, &mut reopen_at, p).elements.push(Element::Line(p));
            }
            PathSegment::CurveTo(c1, c2, p) => {
                ensure(&mut open, &mut reopen_at, c1)
                    .elements
                    .push(Element::Cubic(c1, c2, p));
            }
            PathSegment::Arc { center, radius, angle1, angle2 }
            | PathSegment::ArcNegative { center, radius, angle1, angle2 } => {
                let start = point_on_circle(center, radius, angle1);
                let sp = ensure(&mut open, &mut reopen_at, start);
                arc_to_cubics(center, radius, angle1, angle2, &mut sp.elements);
            }
            PathSegment::ClosePath => {
                if let Some(mut sp) = open.take() {
                    sp.closed = true;
                    reopen_at = Some(sp.start);
                    subpaths.push(sp);
                }
            }
        }
    }
    if let Some(sp) = open {
        subpaths.push(sp);
    }
    subpaths
}

/// Appends cubic approximations of the arc, one per quarter turn or less.
fn arc_to_cubics(center: Vec2, radius: f64, angle1: f64, angle2: f64, out: &mut Vec<Element>) {
    let sweep = clamp_arc_end(angle1, angle2) - angle1;
    if sweep == 0.0 {
        return;
    }
    let steps = (sweep.abs() / FRAC_PI_2).ceil().max(1.0) as usize;
    let step = sweep / steps as f64;
    let k = 4.0 / 3.0 * (step / 4.0).tan();

    let mut a0 = angle1;
    for _ in 0..steps {
        let a1 = a0 + step;
        let (s0, c0) = a0.sin_cos();
        let (s1, c1) = a1.sin_cos();
        let p0 = Vec2::new(center.x + radius * c0, center.y + radius * s0);
        let p1 = Vec2::new(center.x + radius * c1, center.y + radius * s1);
        let ctrl1 = p0 + Vec2::new(-s0, c0) * (k * radius);
        let ctrl2 = p1 - Vec2::new(-s1, c1) * (k * radius);
        out.push(Element::Cubic(ctrl1, ctrl2, p1));
        a0 = a1;
    }
}

fn flatten_cubic(p0: Vec2, c1: Vec2, c2: Vec2, p3: Vec2, tolerance: f64, out: &mut Vec<Vec2>) {
    let dd1 = (p0 - c1 * 2.0 + c2).length();
    let dd2 = (c1 - c2 * 2.0 + p3).length();
    let dd = dd1.max(dd2);
    let steps = if dd.is_finite() {
        ((0.75 * dd / tolerance).sqrt().ceil() as usize).clamp(1, MAX_CUBIC_STEPS)
    } else {
        1
    };
    for i in 1..=steps {
        let t = i as f64 / steps as f64;
        let mt = 1.0 - t;
        let p = p0 * (mt * mt * mt)
            + c1 * (3.0 * mt * mt * t)
            + c2 * (3.0 * mt * t * t)
            + p3 * (t * t * t);
        out.push(p);
    }
}
