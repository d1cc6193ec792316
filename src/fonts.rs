//! System font loading and skrifa-backed text measurement.
//!
//! Widths come from the font's horizontal advances, so the marquee engine's
//! "does it fit" decision matches what the renderer actually draws.

use skrifa::MetadataProvider;
use skrifa::instance::{LocationRef, Size};
use tracing::debug;
use vello::Glyph;
use vello::peniko::FontData;

use crate::canvas::{FixedAdvance, FontMetrics, FontSpec, TextMeasure};

// ---------------------------------------------------------------------------
// Font loading
// ---------------------------------------------------------------------------

const FONT_DIRS: &[&str] = &[
    "/System/Library/Fonts/",
    "/System/Library/Fonts/Supplemental/",
    "/Library/Fonts/",
    "/usr/share/fonts/opentype/noto/",
    "/usr/share/fonts/truetype/dejavu/",
    "/usr/share/fonts/truetype/",
    "/usr/share/fonts/opentype/",
];

const FONT_EXTENSIONS: &[&str] = &["ttf", "otf", "ttc"];

/// Try each name in `font_names` across the common font directories.
fn load_system_font(font_names: &[&str]) -> Option<FontData> {
    for name in font_names {
        for dir in FONT_DIRS {
            for ext in FONT_EXTENSIONS {
                let path = format!("{dir}{name}.{ext}");
                if let Ok(data) = std::fs::read(&path) {
                    debug!(target: "render", path = %path, "loaded font");
                    return Some(FontData::new(data.into(), 0));
                }
            }
        }
    }
    None
}

/// Load the board font. CJK-capable faces come first because line status
/// text is frequently Japanese.
pub fn load_board_font() -> Option<FontData> {
    load_system_font(&[
        "Hiragino Sans GB",
        "ヒラギノ角ゴシック W3",
        "NotoSansCJK-Regular",
        "NotoSansJP-Regular",
        "Helvetica",
        "Arial",
        "DejaVuSans",
        "LiberationSans-Regular",
    ])
}

// ---------------------------------------------------------------------------
// Measurement
// ---------------------------------------------------------------------------

/// Measures text with real glyph advances from a loaded font.
#[derive(Clone)]
pub struct FontMeasure {
    font: FontData,
}

impl FontMeasure {
    /// Returns `None` if the font bytes cannot be parsed.
    pub fn new(font: FontData) -> Option<Self> {
        skrifa::FontRef::from_index(font.data.as_ref(), font.index).ok()?;
        Some(Self { font })
    }

    pub fn font_data(&self) -> &FontData {
        &self.font
    }
}

impl std::fmt::Debug for FontMeasure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FontMeasure")
            .field("bytes", &self.font.data.as_ref().len())
            .finish()
    }
}

impl TextMeasure for FontMeasure {
    fn advance(&self, text: &str, font: &FontSpec) -> f64 {
        let Ok(font_ref) = skrifa::FontRef::from_index(self.font.data.as_ref(), self.font.index)
        else {
            return FixedAdvance::default().advance(text, font);
        };
        let charmap = font_ref.charmap();
        let glyph_metrics = font_ref.glyph_metrics(Size::new(font.size_px), LocationRef::default());

        text.chars()
            .map(|ch| {
                let gid = charmap.map(ch).unwrap_or_default();
                glyph_metrics
                    .advance_width(gid)
                    .unwrap_or(font.size_px * 0.5) as f64
            })
            .sum()
    }

    fn metrics(&self, font: &FontSpec) -> FontMetrics {
        let Ok(font_ref) = skrifa::FontRef::from_index(self.font.data.as_ref(), self.font.index)
        else {
            return FixedAdvance::default().metrics(font);
        };
        let metrics = font_ref.metrics(Size::new(font.size_px), LocationRef::default());
        FontMetrics {
            ascent: metrics.ascent as f64,
            descent: metrics.descent.abs() as f64,
        }
    }
}

/// Measurement used by the window host: the system font when one was found,
/// fixed advances otherwise.
#[derive(Debug, Clone)]
pub enum BoardMeasure {
    Font(FontMeasure),
    Fixed(FixedAdvance),
}

impl BoardMeasure {
    pub fn from_system() -> Self {
        match load_board_font().and_then(FontMeasure::new) {
            Some(measure) => BoardMeasure::Font(measure),
            None => BoardMeasure::Fixed(FixedAdvance::default()),
        }
    }

    pub fn font_data(&self) -> Option<&FontData> {
        match self {
            BoardMeasure::Font(m) => Some(m.font_data()),
            BoardMeasure::Fixed(_) => None,
        }
    }
}

impl TextMeasure for BoardMeasure {
    fn advance(&self, text: &str, font: &FontSpec) -> f64 {
        match self {
            BoardMeasure::Font(m) => m.advance(text, font),
            BoardMeasure::Fixed(m) => m.advance(text, font),
        }
    }

    fn metrics(&self, font: &FontSpec) -> FontMetrics {
        match self {
            BoardMeasure::Font(m) => m.metrics(font),
            BoardMeasure::Fixed(m) => m.metrics(font),
        }
    }
}

// ---------------------------------------------------------------------------
// Glyph layout
// ---------------------------------------------------------------------------

/// Lay out a single line of text starting at `start_x` on `baseline`.
pub fn glyph_run(
    font_data: &FontData,
    text: &str,
    size_px: f32,
    start_x: f64,
    baseline: f64,
) -> Vec<Glyph> {
    let Ok(font_ref) = skrifa::FontRef::from_index(font_data.data.as_ref(), font_data.index) else {
        return vec![];
    };
    let charmap = font_ref.charmap();
    let glyph_metrics = font_ref.glyph_metrics(Size::new(size_px), LocationRef::default());

    let mut glyphs = Vec::with_capacity(text.len());
    let mut x = start_x;
    for ch in text.chars() {
        let gid = charmap.map(ch).unwrap_or_default();
        glyphs.push(Glyph {
            id: gid.to_u32(),
            x: x as f32,
            y: baseline as f32,
        });
        x += glyph_metrics.advance_width(gid).unwrap_or(size_px * 0.5) as f64;
    }
    glyphs
}
