use crate::coords::Vec2;

/// Most "on" pieces one `apply` call produces before falling back to the
/// undashed polyline.
pub const MAX_DASH_PIECES: usize = 1 << 16;

/// Validated on/off dash pattern.
///
/// Odd-length patterns are repeated once so that entries alternate on/off
/// across cycles.
#[derive(Debug, Clone, PartialEq)]
pub struct Dash {
    pattern: Vec<f64>,
    offset: f64,
}

impl Dash {
    /// `None` for an empty pattern, any negative or non-finite entry, or an
    /// all-zero pattern.
    pub fn new(pattern: &[f64], offset: f64) -> Option<Self> {
        if pattern.is_empty() || pattern.iter().any(|d| !d.is_finite() || *d < 0.0) {
            return None;
        }
        if pattern.iter().sum::<f64>() <= 0.0 {
            return None;
        }
        let mut pattern = pattern.to_vec();
        if pattern.len() % 2 == 1 {
            pattern.extend_from_within(..);
        }
        let offset = if offset.is_finite() { offset } else { 0.0 };
        Some(Self { pattern, offset })
    }

    #[inline]
    pub fn pattern(&self) -> &[f64] {
        &self.pattern
    }

    #[inline]
    pub fn offset(&self) -> f64 {
        self.offset
    }

    /// Length of one full on/off cycle.
    #[inline]
    pub fn period(&self) -> f64 {
        self.pattern.iter().sum()
    }

    /// Share of each cycle that is "on", in `[0, 1]`.
    pub fn on_fraction(&self) -> f64 {
        let on: f64 = self.pattern.iter().step_by(2).sum();
        (on / self.period()).clamp(0.0, 1.0)
    }

    /// Upper bound on the number of "on" pieces `apply` would produce for a
    /// polyline of `length`.
    pub fn piece_estimate(&self, length: f64) -> f64 {
        let cycles = (length / self.period()).ceil() + 1.0;
        cycles * (self.pattern.len() / 2) as f64
    }

    /// Splits a polyline into its "on" pieces.
    ///
    /// The pattern restarts at `offset` for every polyline. A pattern that
    /// would cut the polyline into more than [`MAX_DASH_PIECES`] pieces
    /// leaves it whole.
    pub fn apply(&self, points: &[Vec2], closed: bool) -> Vec<Vec<Vec2>> {
        let mut out = Vec::new();
        if points.len() < 2 {
            return out;
        }
        if self.piece_estimate(polyline_length(points, closed)) > MAX_DASH_PIECES as f64 {
            log::debug!("dash: pattern too fine for polyline, leaving it undashed");
            let mut whole = points.to_vec();
            whole.extend(closed.then(|| points[0]));
            out.push(whole);
            return out;
        }

        let total = self.period();
        let mut idx = 0usize;
        let mut skip = self.offset.rem_euclid(total);
        while skip >= self.pattern[idx] {
            skip -= self.pattern[idx];
            idx = (idx + 1) % self.pattern.len();
        }
        let mut remaining = self.pattern[idx] - skip;

        let mut piece: Vec<Vec2> = Vec::new();
        let closing = closed.then(|| points[0]);
        let mut vertices = points.iter().copied().chain(closing);
        let Some(mut a) = vertices.next() else {
            return out;
        };

        for b in vertices {
            let len = a.distance(b);
            if !(len > 0.0) {
                a = b;
                continue;
            }
            let dir = (b - a) / len;
            let mut pos = 0.0;
            while pos < len {
                let take = remaining.min(len - pos);
                let on = idx % 2 == 0;
                if on {
                    if piece.is_empty() {
                        piece.push(a + dir * pos);
                    }
                    piece.push(a + dir * (pos + take));
                }
                pos += take;
                remaining -= take;
                if remaining <= 1e-12 {
                    if on && piece.len() >= 2 {
                        out.push(std::mem::take(&mut piece));
                    } else {
                        piece.clear();
                    }
                    idx = (idx + 1) % self.pattern.len();
                    remaining = self.pattern[idx];
                }
            }
            a = b;
        }
        if piece.len() >= 2 {
            out.push(piece);
        }
        out
    }
}

/// Sum of segment lengths, including the closing edge when `closed`.
pub fn polyline_length(points: &[Vec2], closed: bool) -> f64 {
    let closing = closed.then(|| points.first().copied()).flatten();
    points
        .windows(2)
        .map(|w| w[0].distance(w[1]))
        .chain(closing.zip(points.last()).map(|(first, last)| last.distance(first)))
        .filter(|len| len.is_finite())
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(len: f64) -> Vec<Vec2> {
        vec![Vec2::new(0.0, 0.0), Vec2::new(len, 0.0)]
    }

    #[test]
    fn invalid_patterns_are_rejected() {
        assert!(Dash::new(&[], 0.0).is_none());
        assert!(Dash::new(&[0.0, 0.0], 0.0).is_none());
        assert!(Dash::new(&[4.0, -1.0], 0.0).is_none());
        assert!(Dash::new(&[f64::NAN], 0.0).is_none());
    }

    #[test]
    fn odd_pattern_is_doubled() {
        let d = Dash::new(&[1.0, 2.0, 3.0], 0.0).unwrap();
        assert_eq!(d.pattern(), &[1.0, 2.0, 3.0, 1.0, 2.0, 3.0]);
    }

    #[test]
    fn splits_line_into_on_pieces() {
        let d = Dash::new(&[4.0, 2.0], 0.0).unwrap();
        let pieces = d.apply(&line(14.0), false);
        let spans: Vec<(f64, f64)> = pieces
            .iter()
            .map(|p| (p[0].x, p[p.len() - 1].x))
            .collect();
        assert_eq!(spans, vec![(0.0, 4.0), (6.0, 10.0), (12.0, 14.0)]);
    }

    #[test]
    fn offset_shifts_the_pattern() {
        let d = Dash::new(&[4.0, 2.0], 5.0).unwrap();
        let pieces = d.apply(&line(10.0), false);
        assert_eq!(pieces[0][0].x, 1.0);
        assert_eq!(pieces[0].last().unwrap().x, 5.0);
    }

    #[test]
    fn dashes_continue_around_corners() {
        let d = Dash::new(&[6.0, 100.0], 0.0).unwrap();
        let pts = vec![Vec2::new(0.0, 0.0), Vec2::new(4.0, 0.0), Vec2::new(4.0, 4.0)];
        let pieces = d.apply(&pts, false);
        assert_eq!(pieces.len(), 1);
        assert_eq!(pieces[0], vec![Vec2::new(0.0, 0.0), Vec2::new(4.0, 0.0), Vec2::new(4.0, 2.0)]);
    }

    #[test]
    fn closed_polylines_dash_the_closing_edge() {
        let d = Dash::new(&[1.0, 1.0], 0.0).unwrap();
        let square = vec![
            Vec2::new(0.0, 0.0),
            Vec2::new(4.0, 0.0),
            Vec2::new(4.0, 4.0),
            Vec2::new(0.0, 4.0),
        ];
        assert_eq!(d.apply(&square, true).len(), 8);
        assert_eq!(d.apply(&square, false).len(), 6);
    }

    // ── fine patterns ─────────────────────────────────────────────────────

    #[test]
    fn period_and_on_fraction() {
        let d = Dash::new(&[3.0, 1.0], 0.0).unwrap();
        assert_eq!(d.period(), 4.0);
        assert_eq!(d.on_fraction(), 0.75);
        assert_eq!(Dash::new(&[0.0, 2.0], 0.0).unwrap().on_fraction(), 0.0);
    }

    #[test]
    fn too_fine_pattern_leaves_polyline_whole() {
        let d = Dash::new(&[1e-4, 1e-4], 0.0).unwrap();
        let pieces = d.apply(&line(200.0), false);
        assert_eq!(pieces, vec![line(200.0)]);

        let square = vec![Vec2::new(0.0, 0.0), Vec2::new(4.0, 0.0), Vec2::new(4.0, 4.0)];
        let closed = Dash::new(&[1e-9], 0.0).unwrap().apply(&square, true);
        assert_eq!(closed.len(), 1);
        assert_eq!(closed[0].last(), Some(&Vec2::new(0.0, 0.0)));
    }

    #[test]
    fn polyline_length_counts_the_closing_edge() {
        let pts = vec![Vec2::new(0.0, 0.0), Vec2::new(3.0, 0.0), Vec2::new(3.0, 4.0)];
        assert_eq!(polyline_length(&pts, false), 7.0);
        assert_eq!(polyline_length(&pts, true), 12.0);
    }
}
