use crate::coords::AffineTransform;
use crate::paint::Pattern;
use crate::raster::{Antialias, Operator};
use crate::tessellate::{FillRule, StrokeStyle};
use crate::text::FontSelection;

use super::ClipRegion;

/// Default flattening tolerance, in device pixels.
pub const DEFAULT_TOLERANCE: f64 = 0.1;

/// Construction-time settings for a [`DrawingContext`](super::DrawingContext).
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ContextConfig {
    /// Maximum distance, in device pixels, between a curve and its flattened polyline.
    pub tolerance: f64,
    pub antialias: Antialias,
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            tolerance: DEFAULT_TOLERANCE,
            antialias: Antialias::Default,
        }
    }
}

/// Every context attribute that `save`/`restore` covers.
///
/// The current path and the group stack are deliberately absent.
#[derive(Debug, Clone, PartialEq)]
pub struct GraphicsState {
    pub source: Pattern,
    pub stroke: StrokeStyle,
    pub fill_rule: FillRule,
    pub antialias: Antialias,
    pub operator: Operator,
    pub tolerance: f64,
    pub font: FontSelection,
    /// User space to device space.
    pub matrix: AffineTransform,
    pub clip: ClipRegion,
}

impl Default for GraphicsState {
    fn default() -> Self {
        Self::from_config(&ContextConfig::default())
    }
}

impl GraphicsState {
    pub fn from_config(config: &ContextConfig) -> Self {
        Self {
            source: Pattern::rgb(0.0, 0.0, 0.0),
            stroke: StrokeStyle::default(),
            fill_rule: FillRule::Winding,
            antialias: config.antialias,
            operator: Operator::Over,
            tolerance: sanitize_tolerance(config.tolerance),
            font: FontSelection::default(),
            matrix: AffineTransform::identity(),
            clip: ClipRegion::Unbounded,
        }
    }
}

/// Non-positive or non-finite tolerances fall back to the default.
pub(crate) fn sanitize_tolerance(tolerance: f64) -> f64 {
    if tolerance.is_finite() && tolerance > 0.0 {
        tolerance
    } else {
        DEFAULT_TOLERANCE
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_drawing_contract() {
        let s = GraphicsState::default();
        assert_eq!(s.stroke.width, 2.0);
        assert_eq!(s.stroke.miter_limit, 10.0);
        assert_eq!(s.operator, Operator::Over);
        assert_eq!(s.fill_rule, FillRule::Winding);
        assert_eq!(s.tolerance, DEFAULT_TOLERANCE);
        assert!(s.matrix.is_identity());
        assert!(!s.clip.is_active());
        assert_eq!(s.source.as_solid().map(|c| c.a), Some(1.0));
    }

    #[test]
    fn bad_config_tolerance_falls_back() {
        let cfg = ContextConfig { tolerance: -1.0, antialias: Antialias::None };
        let s = GraphicsState::from_config(&cfg);
        assert_eq!(s.tolerance, DEFAULT_TOLERANCE);
        assert_eq!(s.antialias, Antialias::None);
        assert_eq!(sanitize_tolerance(f64::NAN), DEFAULT_TOLERANCE);
        assert_eq!(sanitize_tolerance(0.5), 0.5);
    }
}
