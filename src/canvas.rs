//! Drawing surfaces and text measurement.
//!
//! The marquee engine only talks to the [`Geometry`] and [`Drawing`] traits.
//! [`RetainedCanvas`] is the in-process implementation: it keeps every drawn
//! text item per surface so the window renderer can paint them each frame,
//! and so tests can inspect exactly what is on screen.

use std::collections::HashMap;
use std::fmt;

use crate::error::{BoardError, Result};

// ---------------------------------------------------------------------------
// Identifiers and value types
// ---------------------------------------------------------------------------

/// A lane's drawing surface. The engine holds these as non-owning references.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SurfaceId(u32);

impl fmt::Display for SurfaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "surface#{}", self.0)
    }
}

/// A text primitive drawn on a surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContentId(u64);

/// Pixel size of a surface. Either side <= 1 means "not laid out yet".
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceSize {
    pub width: f64,
    pub height: f64,
}

impl SurfaceSize {
    pub const UNSET: SurfaceSize = SurfaceSize {
        width: 1.0,
        height: 1.0,
    };

    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    pub fn has_width(&self) -> bool {
        self.width > 1.0
    }

    pub fn has_height(&self) -> bool {
        self.height > 1.0
    }

    pub fn is_laid_out(&self) -> bool {
        self.has_width() && self.has_height()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FontSpec {
    pub size_px: f32,
}

impl FontSpec {
    pub fn new(size_px: f32) -> Self {
        Self { size_px }
    }
}

/// Vertical metrics in pixels. `descent` is a positive distance below the
/// baseline.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FontMetrics {
    pub ascent: f64,
    pub descent: f64,
}

impl FontMetrics {
    pub fn line_height(&self) -> f64 {
        self.ascent + self.descent
    }
}

/// Plain RGB fill color, components in 0.0..=1.0.
#[derive(Debug, Clone, Copy, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct Rgb {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Rgb {
    pub const BLACK: Rgb = Rgb::new(0.0, 0.0, 0.0);

    pub const fn new(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }
}

// ---------------------------------------------------------------------------
// Collaborator traits
// ---------------------------------------------------------------------------

/// Read-only layout queries.
pub trait Geometry {
    /// Best-effort current size, or `None` if the surface does not exist.
    fn surface_size(&self, surface: SurfaceId) -> Option<SurfaceSize>;

    /// Rendered width of `text` in pixels. Deterministic for a given font.
    fn measure_text(&self, text: &str, font: &FontSpec) -> f64;

    fn font_metrics(&self, font: &FontSpec) -> FontMetrics;
}

/// Retained-mode text primitives. Coordinates are the text's center.
pub trait Drawing {
    fn draw_centered_text(
        &mut self,
        surface: SurfaceId,
        x: f64,
        y: f64,
        text: &str,
        font: &FontSpec,
        color: Rgb,
    ) -> Result<ContentId>;

    fn move_content(&mut self, surface: SurfaceId, content: ContentId, x: f64, y: f64)
    -> Result<()>;

    fn delete_content(&mut self, surface: SurfaceId, content: ContentId) -> Result<()>;
}

/// Everything the marquee engine needs from its host.
pub trait Canvas: Geometry + Drawing {}

impl<T: Geometry + Drawing> Canvas for T {}

// ---------------------------------------------------------------------------
// Text measurement strategies
// ---------------------------------------------------------------------------

pub trait TextMeasure {
    fn advance(&self, text: &str, font: &FontSpec) -> f64;
    fn metrics(&self, font: &FontSpec) -> FontMetrics;
}

/// Every character advances `em * font size` pixels.
///
/// Used when no system font could be loaded, and in tests where exact widths
/// matter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixedAdvance {
    pub em: f64,
}

impl FixedAdvance {
    pub fn new(em: f64) -> Self {
        Self { em }
    }
}

impl Default for FixedAdvance {
    fn default() -> Self {
        Self { em: 0.6 }
    }
}

impl TextMeasure for FixedAdvance {
    fn advance(&self, text: &str, font: &FontSpec) -> f64 {
        text.chars().count() as f64 * font.size_px as f64 * self.em
    }

    fn metrics(&self, font: &FontSpec) -> FontMetrics {
        let size = font.size_px as f64;
        FontMetrics {
            ascent: size * 0.8,
            descent: size * 0.2,
        }
    }
}

// ---------------------------------------------------------------------------
// RetainedCanvas
// ---------------------------------------------------------------------------

/// One text item as currently drawn.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawnText {
    pub id: ContentId,
    pub x: f64,
    pub y: f64,
    pub text: String,
    pub font: FontSpec,
    pub color: Rgb,
}

#[derive(Debug)]
struct Surface {
    size: SurfaceSize,
    items: Vec<DrawnText>,
}

#[derive(Debug)]
pub struct RetainedCanvas<M> {
    measure: M,
    surfaces: HashMap<SurfaceId, Surface>,
    next_surface: u32,
    next_content: u64,
}

impl<M: TextMeasure> RetainedCanvas<M> {
    pub fn new(measure: M) -> Self {
        Self {
            measure,
            surfaces: HashMap::new(),
            next_surface: 0,
            next_content: 0,
        }
    }

    /// Create a surface that has not been laid out yet.
    pub fn add_surface(&mut self) -> SurfaceId {
        let id = SurfaceId(self.next_surface);
        self.next_surface += 1;
        self.surfaces.insert(
            id,
            Surface {
                size: SurfaceSize::UNSET,
                items: Vec::new(),
            },
        );
        id
    }

    /// Returns `false` if the surface does not exist.
    pub fn set_surface_size(&mut self, surface: SurfaceId, width: f64, height: f64) -> bool {
        match self.surfaces.get_mut(&surface) {
            Some(s) => {
                s.size = SurfaceSize::new(width, height);
                true
            }
            None => false,
        }
    }

    /// Destroy a surface and everything drawn on it.
    pub fn remove_surface(&mut self, surface: SurfaceId) -> bool {
        self.surfaces.remove(&surface).is_some()
    }

    pub fn items(&self, surface: SurfaceId) -> &[DrawnText] {
        self.surfaces
            .get(&surface)
            .map(|s| s.items.as_slice())
            .unwrap_or(&[])
    }

    pub fn item(&self, surface: SurfaceId, content: ContentId) -> Option<&DrawnText> {
        self.items(surface).iter().find(|item| item.id == content)
    }

    /// Total number of drawn items across all surfaces.
    pub fn total_items(&self) -> usize {
        self.surfaces.values().map(|s| s.items.len()).sum()
    }

    fn surface_mut(&mut self, surface: SurfaceId) -> Result<&mut Surface> {
        self.surfaces
            .get_mut(&surface)
            .ok_or_else(|| BoardError::drawing(surface, "surface no longer exists"))
    }
}

impl<M: TextMeasure> Geometry for RetainedCanvas<M> {
    fn surface_size(&self, surface: SurfaceId) -> Option<SurfaceSize> {
        self.surfaces.get(&surface).map(|s| s.size)
    }

    fn measure_text(&self, text: &str, font: &FontSpec) -> f64 {
        self.measure.advance(text, font)
    }

    fn font_metrics(&self, font: &FontSpec) -> FontMetrics {
        self.measure.metrics(font)
    }
}

impl<M: TextMeasure> Drawing for RetainedCanvas<M> {
    fn draw_centered_text(
        &mut self,
        surface: SurfaceId,
        x: f64,
        y: f64,
        text: &str,
        font: &FontSpec,
        color: Rgb,
    ) -> Result<ContentId> {
        let id = ContentId(self.next_content);
        let target = self.surface_mut(surface)?;
        target.items.push(DrawnText {
            id,
            x,
            y,
            text: text.to_string(),
            font: *font,
            color,
        });
        self.next_content += 1;
        Ok(id)
    }

    fn move_content(
        &mut self,
        surface: SurfaceId,
        content: ContentId,
        x: f64,
        y: f64,
    ) -> Result<()> {
        let target = self.surface_mut(surface)?;
        let item = target
            .items
            .iter_mut()
            .find(|item| item.id == content)
            .ok_or_else(|| BoardError::drawing(surface, "content no longer exists"))?;
        item.x = x;
        item.y = y;
        Ok(())
    }

    fn delete_content(&mut self, surface: SurfaceId, content: ContentId) -> Result<()> {
        let target = self.surface_mut(surface)?;
        let before = target.items.len();
        target.items.retain(|item| item.id != content);
        if target.items.len() == before {
            return Err(BoardError::drawing(surface, "content no longer exists"));
        }
        Ok(())
    }
}
