use crate::coords::{AffineTransform, Bounds, Vec2};

/// Indexed triangle list.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Geometry {
    pub vertices: Vec<Vec2>,
    pub indices: Vec<u32>,
}

impl Geometry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty() || self.indices.len() < 3
    }

    /// Appends `other`, rebasing its indices.
    pub fn extend(&mut self, other: Geometry) {
        let base = self.vertices.len() as u32;
        self.vertices.extend(other.vertices);
        self.indices.extend(other.indices.into_iter().map(|i| i + base));
    }

    /// Iterates complete triangles; trailing or out-of-range indices are skipped.
    pub fn triangles(&self) -> impl Iterator<Item = [Vec2; 3]> + '_ {
        self.indices.chunks_exact(3).filter_map(|tri| {
            let a = *self.vertices.get(tri[0] as usize)?;
            let b = *self.vertices.get(tri[1] as usize)?;
            let c = *self.vertices.get(tri[2] as usize)?;
            Some([a, b, c])
        })
    }

    pub fn bounds(&self) -> Bounds {
        let mut b = Bounds::empty();
        for tri in self.triangles() {
            tri.into_iter().for_each(|p| b.include(p));
        }
        b
    }

    /// Maps every vertex through `m`.
    pub fn transform(&mut self, m: &AffineTransform) {
        for v in &mut self.vertices {
            *v = m.transform_point(*v);
        }
    }

    pub fn translate(&mut self, offset: Vec2) {
        for v in &mut self.vertices {
            *v = *v + offset;
        }
    }

    /// Point containment; points on a triangle edge count as inside.
    pub fn contains(&self, p: Vec2) -> bool {
        p.is_finite() && self.triangles().any(|t| triangle_contains(t, p))
    }
}

fn triangle_contains([a, b, c]: [Vec2; 3], p: Vec2) -> bool {
    let area = (b - a).cross(c - a);
    if !(area.abs() > 1e-12) {
        return false;
    }
    let scale = (b - a).length().max((c - a).length()).max(1.0);
    let eps = 1e-9 * scale;

    let d1 = (b - a).cross(p - a);
    let d2 = (c - b).cross(p - b);
    let d3 = (a - c).cross(p - c);
    let has_neg = d1 < -eps || d2 < -eps || d3 < -eps;
    let has_pos = d1 > eps || d2 > eps || d3 > eps;
    !(has_neg && has_pos)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_square() -> Geometry {
        Geometry {
            vertices: vec![
                Vec2::new(0.0, 0.0),
                Vec2::new(1.0, 0.0),
                Vec2::new(1.0, 1.0),
                Vec2::new(0.0, 1.0),
            ],
            indices: vec![0, 1, 2, 0, 2, 3],
        }
    }

    #[test]
    fn contains_is_inclusive() {
        let g = unit_square();
        assert!(g.contains(Vec2::new(0.5, 0.5)));
        assert!(g.contains(Vec2::new(0.0, 0.0)));
        assert!(g.contains(Vec2::new(1.0, 0.5)));
        assert!(!g.contains(Vec2::new(1.01, 0.5)));
        assert!(!g.contains(Vec2::new(f64::NAN, 0.5)));
    }

    #[test]
    fn degenerate_triangles_contain_nothing() {
        let g = Geometry {
            vertices: vec![Vec2::new(0.0, 0.0), Vec2::new(1.0, 1.0), Vec2::new(2.0, 2.0)],
            indices: vec![0, 1, 2],
        };
        assert!(!g.contains(Vec2::new(5.0, 5.0)));
    }

    #[test]
    fn extend_rebases_indices() {
        let mut g = unit_square();
        g.extend(unit_square());
        assert_eq!(g.indices[6..], [4, 5, 6, 4, 6, 7]);
    }

    #[test]
    fn transform_moves_bounds() {
        let mut g = unit_square();
        g.transform(&AffineTransform::scaling(10.0, 2.0));
        g.translate(Vec2::new(1.0, 1.0));
        assert_eq!(g.bounds().extents(), (1.0, 1.0, 11.0, 3.0));
    }
}
