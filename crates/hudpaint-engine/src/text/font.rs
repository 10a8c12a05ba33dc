/// Font style axis forwarded from the drawing context.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Hash)]
pub enum FontSlant {
    #[default]
    Normal,
    Italic,
    Oblique,
}

#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Hash)]
pub enum FontWeight {
    #[default]
    Normal,
    Bold,
}

/// Font face request: family, style and size in device pixels.
#[derive(Debug, Clone, PartialEq)]
pub struct FontSelection {
    pub family: String,
    pub slant: FontSlant,
    pub weight: FontWeight,
    pub size: f64,
}

impl Default for FontSelection {
    fn default() -> Self {
        Self {
            family: "sans-serif".to_string(),
            slant: FontSlant::Normal,
            weight: FontWeight::Normal,
            size: 10.0,
        }
    }
}

impl FontSelection {
    /// Same face at a different size.
    pub fn with_size(&self, size: f64) -> Self {
        Self { size, ..self.clone() }
    }
}

/// Measured size of a run of text.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct TextExtents {
    pub width: f64,
    pub height: f64,
    /// Pen movement after drawing the run.
    pub x_advance: f64,
}

/// Vertical metrics of a face at a given size.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct FontExtents {
    pub ascent: f64,
    /// Positive distance below the baseline.
    pub descent: f64,
    pub height: f64,
}
