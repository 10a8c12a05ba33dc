use crate::path::Dash;

/// Shape of open subpath ends.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Hash)]
pub enum LineCap {
    #[default]
    Butt,
    Round,
    Square,
}

/// Shape of the corner between two stroked segments.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Hash)]
pub enum LineJoin {
    #[default]
    Miter,
    Round,
    Bevel,
}

/// Which regions of a self-intersecting path count as inside.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Hash)]
pub enum FillRule {
    #[default]
    Winding,
    EvenOdd,
}

/// Stroke settings, in user-space units.
#[derive(Debug, Clone, PartialEq)]
pub struct StrokeStyle {
    pub width: f64,
    pub cap: LineCap,
    pub join: LineJoin,
    pub miter_limit: f64,
    pub dash: Option<Dash>,
}

impl Default for StrokeStyle {
    fn default() -> Self {
        Self {
            width: 2.0,
            cap: LineCap::Butt,
            join: LineJoin::Miter,
            miter_limit: 10.0,
            dash: None,
        }
    }
}
