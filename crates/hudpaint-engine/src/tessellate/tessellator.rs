use lyon::lyon_tessellation::{
    BuffersBuilder, FillOptions, FillTessellator, FillVertex, StrokeOptions, StrokeTessellator,
    StrokeVertex, VertexBuffers,
};
use lyon::math::{Point, point};
use lyon::path::PathEvent;

use crate::coords::Vec2;
use crate::path::{Dash, Element, MAX_DASH_PIECES, Path, SubPath, polyline_length};

use super::{FillRule, Geometry, LineCap, LineJoin, StrokeStyle};

const MIN_TOLERANCE: f64 = 1e-3;

#[inline]
fn lp(v: Vec2) -> Point {
    point(v.x as f32, v.y as f32)
}

fn subpath_is_finite(sp: &SubPath) -> bool {
    sp.start.is_finite()
        && sp.elements.iter().all(|el| match *el {
            Element::Line(p) => p.is_finite(),
            Element::Cubic(a, b, c) => a.is_finite() && b.is_finite() && c.is_finite(),
        })
}

/// Lyon events for the drawable subpaths; `force_close` closes every one.
fn subpath_events(subpaths: &[SubPath], force_close: bool) -> Vec<PathEvent> {
    let mut events = Vec::new();
    for sp in subpaths {
        if sp.elements.is_empty() {
            continue;
        }
        if !subpath_is_finite(sp) {
            log::debug!("skipping subpath with non-finite coordinates");
            continue;
        }
        events.push(PathEvent::Begin { at: lp(sp.start) });
        let mut from = sp.start;
        for el in &sp.elements {
            match *el {
                Element::Line(to) => events.push(PathEvent::Line { from: lp(from), to: lp(to) }),
                Element::Cubic(c1, c2, to) => events.push(PathEvent::Cubic {
                    from: lp(from),
                    ctrl1: lp(c1),
                    ctrl2: lp(c2),
                    to: lp(to),
                }),
            }
            from = el.end();
        }
        events.push(PathEvent::End {
            last: lp(from),
            first: lp(sp.start),
            close: force_close || sp.closed,
        });
    }
    events
}

fn polyline_events(pieces: &[Vec<Vec2>]) -> Vec<PathEvent> {
    let mut events = Vec::new();
    for piece in pieces {
        let [first, rest @ ..] = piece.as_slice() else {
            continue;
        };
        if rest.is_empty() {
            continue;
        }
        events.push(PathEvent::Begin { at: lp(*first) });
        let mut from = *first;
        for &to in rest {
            events.push(PathEvent::Line { from: lp(from), to: lp(to) });
            from = to;
        }
        events.push(PathEvent::End { last: lp(from), first: lp(*first), close: false });
    }
    events
}

/// Triangulates the interior of `path` under `rule`.
///
/// `tolerance` is the curve flattening error in path units.
pub fn fill(path: &Path, rule: FillRule, tolerance: f64) -> Geometry {
    let events = subpath_events(&path.outline(), true);
    if events.is_empty() {
        return Geometry::new();
    }

    let mut buffers: VertexBuffers<Vec2, u32> = VertexBuffers::new();
    let mut tessellator = FillTessellator::new();

    let options = FillOptions::default()
        .with_tolerance(tolerance.max(MIN_TOLERANCE) as f32)
        .with_fill_rule(match rule {
            FillRule::Winding => lyon::lyon_tessellation::FillRule::NonZero,
            FillRule::EvenOdd => lyon::lyon_tessellation::FillRule::EvenOdd,
        });

    let result = tessellator.tessellate(
        events,
        &options,
        &mut BuffersBuilder::new(&mut buffers, |vertex: FillVertex| {
            let p = vertex.position();
            Vec2::new(p.x as f64, p.y as f64)
        }),
    );

    if let Err(err) = result {
        log::warn!("path fill tessellation failed: {err:?}");
        return Geometry::new();
    }

    Geometry { vertices: buffers.vertices, indices: buffers.indices }
}

/// Triangulates the outline of `path` as stroked with `style`.
///
/// Dashes are applied to the flattened path before widening.
pub fn stroke(path: &Path, style: &StrokeStyle, tolerance: f64) -> Geometry {
    if !(style.width > 0.0 && style.width.is_finite()) {
        return Geometry::new();
    }
    let tolerance = tolerance.max(MIN_TOLERANCE);
    let subpaths = path.outline();

    let mut width = style.width;
    let events = match &style.dash {
        None => subpath_events(&subpaths, false),
        Some(dash) => {
            let polylines: Vec<(Vec<Vec2>, bool)> = subpaths
                .iter()
                .filter(|sp| subpath_is_finite(sp))
                .map(|sp| (sp.flatten(tolerance), sp.closed))
                .collect();
            if dash_is_unresolvable(dash, &polylines, tolerance) {
                // Average coverage of the pattern, as a thinner solid line.
                log::debug!("dash {:?} too fine for the path, stroking solid", dash.pattern());
                width *= dash.on_fraction();
                subpath_events(&subpaths, false)
            } else {
                let pieces: Vec<Vec<Vec2>> = polylines
                    .iter()
                    .flat_map(|(points, closed)| dash.apply(points, *closed))
                    .collect();
                polyline_events(&pieces)
            }
        }
    };
    if events.is_empty() || !(width > 0.0) {
        return Geometry::new();
    }

    let mut buffers: VertexBuffers<Vec2, u32> = VertexBuffers::new();
    let mut tessellator = StrokeTessellator::new();

    let options = StrokeOptions::default()
        .with_line_width(width as f32)
        .with_tolerance(tolerance as f32)
        .with_line_cap(match style.cap {
            LineCap::Butt => lyon::lyon_tessellation::LineCap::Butt,
            LineCap::Round => lyon::lyon_tessellation::LineCap::Round,
            LineCap::Square => lyon::lyon_tessellation::LineCap::Square,
        })
        .with_line_join(match style.join {
            LineJoin::Miter => lyon::lyon_tessellation::LineJoin::Miter,
            LineJoin::Round => lyon::lyon_tessellation::LineJoin::Round,
            LineJoin::Bevel => lyon::lyon_tessellation::LineJoin::Bevel,
        })
        .with_miter_limit(sanitize_miter_limit(style.miter_limit));

    let result = tessellator.tessellate(
        events,
        &options,
        &mut BuffersBuilder::new(&mut buffers, |vertex: StrokeVertex| {
            let p = vertex.position();
            Vec2::new(p.x as f64, p.y as f64)
        }),
    );

    if let Err(err) = result {
        log::warn!("path stroke tessellation failed: {err:?}");
        return Geometry::new();
    }

    Geometry { vertices: buffers.vertices, indices: buffers.indices }
}

/// Whether `dash` is finer than the flattening tolerance, or would cut
/// `polylines` into more pieces than a stroke is allowed to have.
fn dash_is_unresolvable(dash: &Dash, polylines: &[(Vec<Vec2>, bool)], tolerance: f64) -> bool {
    if dash.period() < tolerance {
        return true;
    }
    let length: f64 = polylines
        .iter()
        .map(|(points, closed)| polyline_length(points, *closed))
        .sum();
    dash.piece_estimate(length) > MAX_DASH_PIECES as f64
}

fn sanitize_miter_limit(limit: f64) -> f32 {
    if limit.is_finite() {
        (limit as f32).max(StrokeOptions::MINIMUM_MITER_LIMIT)
    } else {
        StrokeOptions::DEFAULT_MITER_LIMIT
    }
}
