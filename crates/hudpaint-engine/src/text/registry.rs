use std::path::Path;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use fontdue::layout::{CoordinateSystem, Layout, LayoutSettings, TextStyle};

use crate::coords::{PixelRect, Vec2};
use crate::error::FontError;
use crate::paint::Color;
use crate::surface::Bitmap;

use super::{FontExtents, FontSelection, FontSlant, FontWeight, TextEngine, TextExtents};

/// Line height used when a face reports no horizontal metrics.
const FALLBACK_LINE_FACTOR: f64 = 1.2;

struct Face {
    family: String,
    slant: FontSlant,
    weight: FontWeight,
    font: fontdue::Font,
}

/// Explicit, constructible font registry.
///
/// Fonts are registered under a family name with a slant and weight and are
/// immutable afterwards. Lookups pick the exact face when present, then the
/// closest style within the family, then the first registered face.
///
/// An empty registry measures every string as zero-width and draws nothing.
#[derive(Default)]
pub struct FontRegistry {
    faces: RwLock<Vec<Face>>,
}

impl std::fmt::Debug for FontRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FontRegistry")
            .field("faces", &self.len())
            .finish()
    }
}

impl FontRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses and stores a TrueType or OpenType font from raw bytes.
    pub fn register_bytes(
        &self,
        family: &str,
        slant: FontSlant,
        weight: FontWeight,
        bytes: &[u8],
    ) -> Result<(), FontError> {
        let font = fontdue::Font::from_bytes(bytes, fontdue::FontSettings::default())
            .map_err(|e| FontError::Parse(e.to_string()))?;
        log::debug!("font registry: registered {family} ({slant:?}, {weight:?})");
        self.write().push(Face {
            family: family.to_ascii_lowercase(),
            slant,
            weight,
            font,
        });
        Ok(())
    }

    /// Reads and registers a font file.
    pub fn register_file(
        &self,
        family: &str,
        slant: FontSlant,
        weight: FontWeight,
        path: impl AsRef<Path>,
    ) -> Result<(), FontError> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|source| FontError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        self.register_bytes(family, slant, weight, &bytes)
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    /// Registered family names (lowercased), without duplicates.
    pub fn families(&self) -> Vec<String> {
        let mut out: Vec<String> = Vec::new();
        for face in self.read().iter() {
            if !out.contains(&face.family) {
                out.push(face.family.clone());
            }
        }
        out
    }

    fn with_face<R>(&self, sel: &FontSelection, f: impl FnOnce(&fontdue::Font) -> R) -> Option<R> {
        let faces = self.read();
        let keys: Vec<(&str, FontSlant, FontWeight)> = faces
            .iter()
            .map(|face| (face.family.as_str(), face.slant, face.weight))
            .collect();
        let idx = pick_face(&keys, sel)?;
        Some(f(&faces[idx].font))
    }

    fn read(&self) -> RwLockReadGuard<'_, Vec<Face>> {
        self.faces.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Vec<Face>> {
        self.faces.write().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Index of the face that best matches `sel`; `None` when there are no faces.
fn pick_face(faces: &[(&str, FontSlant, FontWeight)], sel: &FontSelection) -> Option<usize> {
    let family = sel.family.to_ascii_lowercase();
    let style_score = |slant: FontSlant, weight: FontWeight| {
        let slant_score = if slant == sel.slant {
            2
        } else if slant != FontSlant::Normal && sel.slant != FontSlant::Normal {
            // Italic and oblique stand in for each other.
            1
        } else {
            0
        };
        slant_score * 2 + u32::from(weight == sel.weight)
    };

    faces
        .iter()
        .enumerate()
        .filter(|(_, (fam, _, _))| *fam == family)
        .max_by_key(|(i, (_, slant, weight))| (style_score(*slant, *weight), std::cmp::Reverse(*i)))
        .map(|(i, _)| i)
        .or_else(|| (!faces.is_empty()).then_some(0))
}

fn font_size(sel: &FontSelection) -> Option<f32> {
    (sel.size.is_finite() && sel.size > 0.0).then_some(sel.size as f32)
}

fn line_metrics(font: &fontdue::Font, size: f32) -> FontExtents {
    match font.horizontal_line_metrics(size) {
        Some(m) => FontExtents {
            ascent: m.ascent as f64,
            descent: (-m.descent) as f64,
            height: m.new_line_size as f64,
        },
        None => FontExtents {
            ascent: size as f64,
            descent: 0.0,
            height: size as f64 * FALLBACK_LINE_FACTOR,
        },
    }
}

fn layout_run(font: &fontdue::Font, text: &str, size: f32, x: f32, y: f32) -> Layout<()> {
    let mut layout: Layout<()> = Layout::new(CoordinateSystem::PositiveYDown);
    layout.reset(&LayoutSettings { x, y, ..LayoutSettings::default() });
    layout.append(&[font], &TextStyle::new(text, size, 0));
    layout
}

impl TextEngine for FontRegistry {
    fn measure_text(&self, text: &str, font: &FontSelection) -> TextExtents {
        let Some(size) = font_size(font) else {
            return TextExtents::default();
        };
        self.with_face(font, |face| {
            let layout = layout_run(face, text, size, 0.0, 0.0);
            // Pen position after each glyph rather than its bitmap right edge.
            let advance = layout
                .glyphs()
                .iter()
                .map(|g| {
                    let m = face.metrics_indexed(g.key.glyph_index, size);
                    (g.x - m.xmin as f32 + m.advance_width).max(0.0)
                })
                .fold(0.0f32, f32::max) as f64;
            let height = if text.is_empty() { 0.0 } else { line_metrics(face, size).height };
            TextExtents { width: advance, height, x_advance: advance }
        })
        .unwrap_or_default()
    }

    fn font_extents(&self, font: &FontSelection) -> FontExtents {
        let Some(size) = font_size(font) else {
            return FontExtents::default();
        };
        self.with_face(font, |face| line_metrics(face, size)).unwrap_or_default()
    }

    fn draw_text(
        &self,
        target: &mut Bitmap,
        origin: Vec2,
        text: &str,
        font: &FontSelection,
        color: Color,
        clip: PixelRect,
    ) {
        let Some(size) = font_size(font) else {
            return;
        };
        if !origin.is_finite() || text.is_empty() {
            return;
        }
        let Some(clip) = clip.intersect(target.bounds()) else {
            return;
        };
        let src = color.clamped().premultiplied();

        self.with_face(font, |face| {
            let ascent = line_metrics(face, size).ascent as f32;
            let layout = layout_run(face, text, size, origin.x as f32, origin.y as f32 - ascent);
            for g in layout.glyphs() {
                if g.width == 0 || g.height == 0 {
                    continue;
                }
                let (_, coverage) = face.rasterize_config(g.key);
                let gx = g.x.round() as i64;
                let gy = g.y.round() as i64;
                for row in 0..g.height {
                    for col in 0..g.width {
                        let cov = coverage[row * g.width + col];
                        if cov == 0 {
                            continue;
                        }
                        let px = gx + col as i64;
                        let py = gy + row as i64;
                        if px < clip.x as i64
                            || py < clip.y as i64
                            || px >= clip.right()
                            || py >= clip.bottom()
                        {
                            continue;
                        }
                        let (px, py) = (px as u32, py as u32);
                        let a = cov as f32 / 255.0;
                        let dst = target.premul_at(px, py);
                        let k = 1.0 - src[3] * a;
                        let out = [
                            src[0] * a + dst[0] * k,
                            src[1] * a + dst[1] * k,
                            src[2] * a + dst[2] * k,
                            src[3] * a + dst[3] * k,
                        ];
                        target.store_premul(px, py, out);
                    }
                }
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sel(family: &str, slant: FontSlant, weight: FontWeight) -> FontSelection {
        FontSelection {
            family: family.to_string(),
            slant,
            weight,
            size: 12.0,
        }
    }

    // ── selection ─────────────────────────────────────────────────────────

    #[test]
    fn exact_face_wins() {
        let faces = [
            ("mono", FontSlant::Normal, FontWeight::Normal),
            ("mono", FontSlant::Normal, FontWeight::Bold),
            ("mono", FontSlant::Italic, FontWeight::Bold),
        ];
        let s = sel("Mono", FontSlant::Italic, FontWeight::Bold);
        assert_eq!(pick_face(&faces, &s), Some(2));
        let s = sel("mono", FontSlant::Normal, FontWeight::Bold);
        assert_eq!(pick_face(&faces, &s), Some(1));
    }

    #[test]
    fn closest_style_within_family() {
        let faces = [
            ("sans", FontSlant::Normal, FontWeight::Normal),
            ("serif", FontSlant::Normal, FontWeight::Normal),
            ("serif", FontSlant::Italic, FontWeight::Normal),
        ];
        let s = sel("serif", FontSlant::Oblique, FontWeight::Bold);
        assert_eq!(pick_face(&faces, &s), Some(2));
    }

    #[test]
    fn unknown_family_falls_back_to_first_face() {
        let faces = [
            ("sans", FontSlant::Normal, FontWeight::Normal),
            ("serif", FontSlant::Normal, FontWeight::Normal),
        ];
        assert_eq!(
            pick_face(&faces, &sel("fantasy", FontSlant::Normal, FontWeight::Normal)),
            Some(0)
        );
        assert_eq!(pick_face(&[], &sel("sans", FontSlant::Normal, FontWeight::Normal)), None);
    }

    // ── empty registry ────────────────────────────────────────────────────

    #[test]
    fn empty_registry_measures_zero_and_draws_nothing() {
        let reg = FontRegistry::new();
        let s = FontSelection::default();
        assert_eq!(reg.measure_text("hello", &s), TextExtents::default());
        assert_eq!(reg.font_extents(&s), FontExtents::default());
        let mut bmp = Bitmap::new(8, 8);
        let clip = PixelRect::of_size(8, 8);
        reg.draw_text(&mut bmp, Vec2::new(1.0, 6.0), "hi", &s, Color::white(), clip);
        assert!(bmp.as_raw().iter().all(|b| *b == 0));
    }

    // ── loading errors ────────────────────────────────────────────────────

    #[test]
    fn bad_bytes_and_missing_files_are_errors() {
        let reg = FontRegistry::new();
        assert!(matches!(
            reg.register_bytes("x", FontSlant::Normal, FontWeight::Normal, b"not a font"),
            Err(FontError::Parse(_))
        ));
        let missing = std::env::temp_dir().join("hudpaint-no-such-font.ttf");
        assert!(matches!(
            reg.register_file("x", FontSlant::Normal, FontWeight::Normal, &missing),
            Err(FontError::Io { .. })
        ));
        assert!(reg.is_empty());
        assert!(reg.families().is_empty());
    }
}
