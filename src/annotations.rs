//! Annotation model consumed by the overlay renderer.
//!
//! An [`Annotation`] carries the fields every subtype shares (style, state flags,
//! transformed bounding rectangle) plus a closed [`AnnotationKind`] union with the
//! subtype-specific geometry. All coordinates are normalized to the page at its
//! current rotation.
//!
//! # Supported Annotation Types
//!
//! - Text (inline text boxes and linked popup icons)
//! - Line (straight lines with end decorations, polylines, polygons)
//! - Geometric (inscribed square or ellipse)
//! - Highlight (Highlight, Underline, Squiggly, StrikeOut markup)
//! - Stamp (named icon)
//! - Ink (freehand strokes)

use crate::annotation_types::{
    AnnotationFlags, GeometricShape, LineEndingStyle, LineStyle, Rgba8, TextAlignment,
    TextMarkupType,
};
use crate::geometry::{NormalizedPoint, NormalizedRect};

/// Visual style shared by every annotation subtype.
#[derive(Debug, Clone, PartialEq)]
pub struct AnnotationStyle {
    /// Main color; `None` when the document never set one
    pub color: Option<Rgba8>,
    /// Stroke width in page units
    pub width: f64,
    /// Opacity in `[0, 1]`
    pub opacity: f64,
    /// Solid or dashed outline
    pub line_style: LineStyle,
}

impl Default for AnnotationStyle {
    fn default() -> Self {
        Self {
            color: None,
            width: 1.0,
            opacity: 1.0,
            line_style: LineStyle::Solid,
        }
    }
}

impl AnnotationStyle {
    /// Style with a color and defaults otherwise.
    pub fn with_color(color: Rgba8) -> Self {
        Self {
            color: Some(color),
            ..Default::default()
        }
    }
}

/// Font request for inline text.
#[derive(Debug, Clone, PartialEq)]
pub struct FontSpec {
    /// Family name; `None` selects the default sans-serif family
    pub family: Option<String>,
    /// Size in page units
    pub size: f64,
}

impl Default for FontSpec {
    fn default() -> Self {
        Self {
            family: None,
            size: 10.0,
        }
    }
}

/// How a text annotation is shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextAnnotationKind {
    /// Text drawn inside the bounding box
    #[default]
    Inline,
    /// Fixed-size icon that opens a popup
    Linked,
}

/// Text annotation payload.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TextAnnotation {
    /// Inline text or linked icon
    pub text_type: TextAnnotationKind,
    /// Text contents
    pub contents: String,
    /// Font for inline text
    pub font: FontSpec,
    /// Glyph color for inline text
    pub text_color: Rgba8,
    /// Horizontal alignment of inline text
    pub alignment: TextAlignment,
    /// Icon name for linked annotations ("Note", "Comment", ...)
    pub icon: String,
}

/// Line annotation payload.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LineAnnotation {
    /// Vertices; two for a straight line, more for a polyline or polygon
    pub points: Vec<NormalizedPoint>,
    /// Decoration at the first point
    pub start_style: LineEndingStyle,
    /// Decoration at the last point
    pub end_style: LineEndingStyle,
    /// Close the polygon
    pub closed: bool,
    /// Fill color of closed shapes and decorations
    pub inner_color: Option<Rgba8>,
    /// Leader line length in page units (signed)
    pub leader_forward: f64,
    /// Leader line extension beyond the line in page units
    pub leader_backward: f64,
}

/// Geometric shape annotation payload.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct GeometricAnnotation {
    /// Square or ellipse
    pub shape: GeometricShape,
    /// Optional interior fill
    pub inner_color: Option<Rgba8>,
}

/// Four corners of a markup quad.
///
/// Points 0 and 1 run along the top of the text line, 3 and 2 along its baseline.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct HighlightQuad {
    /// Corners in order top-left, top-right, bottom-right, bottom-left
    pub points: [NormalizedPoint; 4],
}

impl HighlightQuad {
    /// Axis-aligned quad covering a rectangle.
    pub fn from_rect(rect: &NormalizedRect) -> Self {
        Self {
            points: [
                NormalizedPoint::new(rect.left, rect.top),
                NormalizedPoint::new(rect.right, rect.top),
                NormalizedPoint::new(rect.right, rect.bottom),
                NormalizedPoint::new(rect.left, rect.bottom),
            ],
        }
    }
}

/// Text markup annotation payload.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct HighlightAnnotation {
    /// Highlight, underline, squiggly or strike-out
    pub markup: TextMarkupType,
    /// Marked regions
    pub quads: Vec<HighlightQuad>,
}

/// Stamp annotation payload.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct StampAnnotation {
    /// Name of the stamp icon in the asset cache
    pub icon_name: String,
}

/// Freehand ink annotation payload.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct InkAnnotation {
    /// One point list per pen stroke
    pub paths: Vec<Vec<NormalizedPoint>>,
}

/// Subtype-specific annotation data.
#[derive(Debug, Clone, PartialEq)]
pub enum AnnotationKind {
    /// Inline text or linked popup icon
    Text(TextAnnotation),
    /// Line, polyline or polygon
    Line(LineAnnotation),
    /// Square or ellipse
    Geometric(GeometricAnnotation),
    /// Text markup over quads
    Highlight(HighlightAnnotation),
    /// Named icon
    Stamp(StampAnnotation),
    /// Freehand strokes
    Ink(InkAnnotation),
}

impl AnnotationKind {
    /// Subtypes composited through an intermediate image so that multiply and
    /// screen blending see the page underneath.
    pub fn is_buffered(&self) -> bool {
        matches!(self, Self::Line(_) | Self::Highlight(_) | Self::Ink(_))
    }

    /// Short subtype name for logging.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Text(_) => "Text",
            Self::Line(_) => "Line",
            Self::Geometric(_) => "Geometric",
            Self::Highlight(_) => "Highlight",
            Self::Stamp(_) => "Stamp",
            Self::Ink(_) => "Ink",
        }
    }
}

/// An annotation on a page.
#[derive(Debug, Clone, PartialEq)]
pub struct Annotation {
    /// Visual style
    pub style: AnnotationStyle,
    /// State flags
    pub flags: AnnotationFlags,
    /// Bounding rectangle after page rotation
    pub bounding_rect: NormalizedRect,
    /// Subtype payload
    pub kind: AnnotationKind,
}

impl Annotation {
    /// Create an annotation with default style and no flags.
    pub fn new(kind: AnnotationKind, bounding_rect: NormalizedRect) -> Self {
        Self {
            style: AnnotationStyle::default(),
            flags: AnnotationFlags::empty(),
            bounding_rect,
            kind,
        }
    }

    /// Replace the style.
    pub fn with_style(mut self, style: AnnotationStyle) -> Self {
        self.style = style;
        self
    }

    /// Replace the flags.
    pub fn with_flags(mut self, flags: AnnotationFlags) -> Self {
        self.flags = flags;
        self
    }

    /// Color alpha multiplied by style opacity, in `0..=255`.
    ///
    /// An unset color counts as opaque.
    pub fn main_opacity(&self) -> u8 {
        let alpha = self.style.color.map_or(255, |c| c.a) as f64;
        (alpha * self.style.opacity.clamp(0.0, 1.0)) as u8
    }

    /// Main color with [`Self::main_opacity`] as alpha; yellow when unset.
    pub fn main_color(&self) -> Rgba8 {
        self.style
            .color
            .unwrap_or(Rgba8::YELLOW)
            .with_alpha(self.main_opacity())
    }

    /// Whether this is a linked (icon) text annotation.
    pub fn is_linked_text(&self) -> bool {
        matches!(
            &self.kind,
            AnnotationKind::Text(t) if t.text_type == TextAnnotationKind::Linked
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rect() -> NormalizedRect {
        NormalizedRect::new(0.1, 0.1, 0.5, 0.2)
    }

    #[test]
    fn test_buffered_subtypes() {
        assert!(AnnotationKind::Line(LineAnnotation::default()).is_buffered());
        assert!(AnnotationKind::Highlight(HighlightAnnotation::default()).is_buffered());
        assert!(AnnotationKind::Ink(InkAnnotation::default()).is_buffered());
        assert!(!AnnotationKind::Text(TextAnnotation::default()).is_buffered());
        assert!(!AnnotationKind::Geometric(GeometricAnnotation::default()).is_buffered());
        assert!(!AnnotationKind::Stamp(StampAnnotation::default()).is_buffered());
    }

    #[test]
    fn test_main_opacity() {
        let mut style = AnnotationStyle::with_color(Rgba8::new(255, 0, 0, 200));
        style.opacity = 0.5;
        let annot = Annotation::new(AnnotationKind::Ink(InkAnnotation::default()), rect())
            .with_style(style);
        assert_eq!(annot.main_opacity(), 100);
        assert_eq!(annot.main_color(), Rgba8::new(255, 0, 0, 100));
    }

    #[test]
    fn test_main_color_falls_back_to_yellow() {
        let annot = Annotation::new(AnnotationKind::Ink(InkAnnotation::default()), rect());
        assert_eq!(annot.main_opacity(), 255);
        assert_eq!(annot.main_color(), Rgba8::YELLOW);
    }

    #[test]
    fn test_linked_text_detection() {
        let linked = Annotation::new(
            AnnotationKind::Text(TextAnnotation {
                text_type: TextAnnotationKind::Linked,
                ..Default::default()
            }),
            rect(),
        );
        let inline = Annotation::new(AnnotationKind::Text(TextAnnotation::default()), rect());
        assert!(linked.is_linked_text());
        assert!(!inline.is_linked_text());
    }

    #[test]
    fn test_quad_from_rect() {
        let quad = HighlightQuad::from_rect(&rect());
        assert_eq!(quad.points[0], NormalizedPoint::new(0.1, 0.1));
        assert_eq!(quad.points[2], NormalizedPoint::new(0.5, 0.2));
    }
}
