//! Text rasterizer - lays out and draws inline text annotation contents.
//!
//! Fonts come from a `fontdb` database, text is shaped with `rustybuzz` and the
//! glyph outlines are filled with tiny-skia. Layout is top-aligned inside a box,
//! word wrapped at the box width, with left/center/right alignment per line.
//!
//! Without the `text-rendering` feature, or when no font is available, nothing
//! is drawn and the caller still draws the box itself.

use tiny_skia::{Pixmap, Rect};

use crate::annotation_types::{Rgba8, TextAlignment};
use crate::annotations::FontSpec;

/// Wrapped lines ready for drawing.
#[derive(Debug, Clone, PartialEq)]
pub struct TextLayout {
    /// Line text and advance width in pixels
    pub lines: Vec<(String, f32)>,
    /// Baseline-to-baseline distance in pixels
    pub line_height: f32,
    /// Line top to baseline in pixels
    pub ascent: f32,
}

impl TextLayout {
    /// Horizontal start of a line inside a box of `width`.
    pub fn line_x(&self, line_width: f32, box_width: f32, alignment: TextAlignment) -> f32 {
        match alignment {
            TextAlignment::Left => 0.0,
            TextAlignment::Center => (box_width - line_width) / 2.0,
            TextAlignment::Right => box_width - line_width,
        }
    }
}

/// Greedy word wrap.
///
/// Explicit newlines always break. A word wider than `max_width` gets a line of
/// its own rather than being split.
pub fn wrap_words(text: &str, max_width: f32, measure: impl Fn(&str) -> f32) -> Vec<(String, f32)> {
    let mut lines = Vec::new();
    for paragraph in text.split('\n') {
        let mut current = String::new();
        for word in paragraph.split_whitespace() {
            let candidate = if current.is_empty() {
                word.to_string()
            } else {
                format!("{} {}", current, word)
            };
            if current.is_empty() || measure(&candidate) <= max_width {
                current = candidate;
            } else {
                let width = measure(&current);
                lines.push((std::mem::replace(&mut current, word.to_string()), width));
            }
        }
        let width = measure(&current);
        lines.push((current, width));
    }
    lines
}

/// Font lookup plus shaping and glyph rasterization.
pub struct TextRasterizer {
    #[cfg(feature = "text-rendering")]
    fonts: fontdb::Database,
}

impl TextRasterizer {
    /// Create a rasterizer with an empty font database.
    pub fn new() -> Self {
        Self {
            #[cfg(feature = "text-rendering")]
            fonts: fontdb::Database::new(),
        }
    }

    /// Create a rasterizer that loads the system fonts.
    pub fn with_system_fonts() -> Self {
        #[allow(unused_mut)]
        let mut rasterizer = Self::new();
        #[cfg(feature = "text-rendering")]
        {
            rasterizer.fonts.load_system_fonts();
            log::debug!("Loaded {} font faces", rasterizer.fonts.len());
        }
        rasterizer
    }

    /// Add a font from TrueType/OpenType data.
    #[cfg(feature = "text-rendering")]
    pub fn load_font_data(&mut self, data: Vec<u8>) {
        self.fonts.load_font_data(data);
    }

    /// Whether any font face is available.
    pub fn has_fonts(&self) -> bool {
        #[cfg(feature = "text-rendering")]
        {
            !self.fonts.is_empty()
        }
        #[cfg(not(feature = "text-rendering"))]
        {
            false
        }
    }

    /// Wrap `text` for a box `max_width` px wide at `font_px` pixels per em.
    ///
    /// `None` when no font matches.
    pub fn layout(&self, text: &str, font: &FontSpec, font_px: f32, max_width: f32) -> Option<TextLayout> {
        #[cfg(feature = "text-rendering")]
        {
            self.with_face(font, |face| {
                let metrics = FaceMetrics::new(face, font_px);
                TextLayout {
                    lines: wrap_words(text, max_width, |s| shaped_width(face, s, metrics.scale)),
                    line_height: metrics.line_height,
                    ascent: metrics.ascent,
                }
            })
        }
        #[cfg(not(feature = "text-rendering"))]
        {
            let _ = (text, font, font_px, max_width);
            None
        }
    }

    /// Draw `text` into `rect` of `pixmap`, clipped to the rect. Returns the
    /// number of glyphs drawn.
    #[allow(clippy::too_many_arguments)]
    pub fn draw_text(
        &self,
        pixmap: &mut Pixmap,
        rect: Rect,
        text: &str,
        font: &FontSpec,
        font_px: f32,
        alignment: TextAlignment,
        color: Rgba8,
    ) -> usize {
        if text.trim().is_empty() || font_px <= 0.0 {
            return 0;
        }
        #[cfg(feature = "text-rendering")]
        {
            let Some(layout) = self.layout(text, font, font_px, rect.width()) else {
                log::debug!("No font available for inline text");
                return 0;
            };
            self.with_face(font, |face| draw_layout(pixmap, rect, face, &layout, font_px, alignment, color))
                .unwrap_or(0)
        }
        #[cfg(not(feature = "text-rendering"))]
        {
            let _ = (pixmap, rect, font, alignment, color);
            0
        }
    }

    #[cfg(feature = "text-rendering")]
    fn with_face<R>(&self, font: &FontSpec, f: impl FnOnce(&rustybuzz::Face<'_>) -> R) -> Option<R> {
        let mut families = Vec::with_capacity(2);
        if let Some(name) = &font.family {
            families.push(fontdb::Family::Name(name.as_str()));
        }
        families.push(fontdb::Family::SansSerif);
        let query = fontdb::Query {
            families: &families,
            weight: fontdb::Weight::NORMAL,
            stretch: fontdb::Stretch::Normal,
            style: fontdb::Style::Normal,
        };
        let id = self
            .fonts
            .query(&query)
            .or_else(|| self.fonts.faces().next().map(|face| face.id))?;
        self.fonts
            .with_face_data(id, |data, index| {
                rustybuzz::Face::from_slice(data, index).map(|face| f(&face))
            })
            .flatten()
    }
}

impl Default for TextRasterizer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(feature = "text-rendering")]
struct FaceMetrics {
    scale: f32,
    ascent: f32,
    line_height: f32,
}

#[cfg(feature = "text-rendering")]
impl FaceMetrics {
    fn new(face: &rustybuzz::Face<'_>, font_px: f32) -> Self {
        let scale = font_px / face.units_per_em().max(1) as f32;
        let ascent = face.ascender() as f32 * scale;
        let descent = face.descender() as f32 * scale;
        let gap = face.line_gap() as f32 * scale;
        Self {
            scale,
            ascent,
            line_height: (ascent - descent + gap).max(font_px),
        }
    }
}

#[cfg(feature = "text-rendering")]
fn shaped_width(face: &rustybuzz::Face<'_>, text: &str, scale: f32) -> f32 {
    let mut buffer = rustybuzz::UnicodeBuffer::new();
    buffer.push_str(text);
    let output = rustybuzz::shape(face, &[], buffer);
    output
        .glyph_positions()
        .iter()
        .map(|pos| pos.x_advance as f32 * scale)
        .sum()
}

#[cfg(feature = "text-rendering")]
fn draw_layout(
    pixmap: &mut Pixmap,
    rect: Rect,
    face: &rustybuzz::Face<'_>,
    layout: &TextLayout,
    font_px: f32,
    alignment: TextAlignment,
    color: Rgba8,
) -> usize {
    use rustybuzz::ttf_parser::GlyphId;
    use tiny_skia::{FillRule, Mask, PathBuilder, Transform};

    let metrics = FaceMetrics::new(face, font_px);
    let mut clip = Mask::new(pixmap.width(), pixmap.height());
    if let Some(mask) = clip.as_mut() {
        mask.fill_path(&PathBuilder::from_rect(rect), FillRule::Winding, false, Transform::identity());
    }
    let paint = super::create_fill_paint(color, super::CompositionMode::Normal);

    let mut glyphs = 0;
    let mut baseline = rect.top() + layout.ascent;
    for (line, width) in &layout.lines {
        if baseline - layout.ascent > rect.bottom() {
            break;
        }
        let mut pen_x = rect.left() + layout.line_x(*width, rect.width(), alignment);
        let mut buffer = rustybuzz::UnicodeBuffer::new();
        buffer.push_str(line);
        let output = rustybuzz::shape(face, &[], buffer);

        let mut builder = GlyphPathBuilder::new(metrics.scale);
        for (info, pos) in output.glyph_infos().iter().zip(output.glyph_positions()) {
            builder.origin_x = pen_x + pos.x_offset as f32 * metrics.scale;
            builder.origin_y = baseline - pos.y_offset as f32 * metrics.scale;
            if face.outline_glyph(GlyphId(info.glyph_id as u16), &mut builder).is_some() {
                glyphs += 1;
            }
            pen_x += pos.x_advance as f32 * metrics.scale;
        }
        if let Some(path) = builder.builder.finish() {
            pixmap.fill_path(&path, &paint, FillRule::Winding, Transform::identity(), clip.as_ref());
        }
        baseline += layout.line_height;
    }
    glyphs
}

/// Collects glyph outlines in pixel space; font units are y-up.
#[cfg(feature = "text-rendering")]
struct GlyphPathBuilder {
    builder: tiny_skia::PathBuilder,
    origin_x: f32,
    origin_y: f32,
    scale: f32,
}

#[cfg(feature = "text-rendering")]
impl GlyphPathBuilder {
    fn new(scale: f32) -> Self {
        Self {
            builder: tiny_skia::PathBuilder::new(),
            origin_x: 0.0,
            origin_y: 0.0,
            scale,
        }
    }

    fn map(&self, x: f32, y: f32) -> (f32, f32) {
        (self.origin_x + x * self.scale, self.origin_y - y * self.scale)
    }
}

#[cfg(feature = "text-rendering")]
impl rustybuzz::ttf_parser::OutlineBuilder for GlyphPathBuilder {
    fn move_to(&mut self, x: f32, y: f32) {
        let (x, y) = self.map(x, y);
        self.builder.move_to(x, y);
    }

    fn line_to(&mut self, x: f32, y: f32) {
        let (x, y) = self.map(x, y);
        self.builder.line_to(x, y);
    }

    fn quad_to(&mut self, x1: f32, y1: f32, x: f32, y: f32) {
        let (x1, y1) = self.map(x1, y1);
        let (x, y) = self.map(x, y);
        self.builder.quad_to(x1, y1, x, y);
    }

    fn curve_to(&mut self, x1: f32, y1: f32, x2: f32, y2: f32, x: f32, y: f32) {
        let (x1, y1) = self.map(x1, y1);
        let (x2, y2) = self.map(x2, y2);
        let (x, y) = self.map(x, y);
        self.builder.cubic_to(x1, y1, x2, y2, x, y);
    }

    fn close(&mut self) {
        self.builder.close();
    }
}
