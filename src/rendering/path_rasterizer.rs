//! Shape rasterizer - draws normalized polylines, polygons and ellipses with tiny-skia.
//!
//! Point coordinates are normalized to the *target* raster, not to the page.
//! Callers map page-normalized annotation geometry into target space first.

use super::{create_fill_paint, create_stroke_paint};
use crate::annotation_types::{LineStyle, Rgba8};
use crate::annotations::AnnotationStyle;
use crate::geometry::NormalizedPoint;
use tiny_skia::{
    BlendMode, FillRule, LineCap, LineJoin, Mask, PathBuilder, Pixmap, Rect, Stroke, StrokeDash,
    Transform,
};

/// How source pixels combine with the target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CompositionMode {
    /// Source over
    #[default]
    Normal,
    /// Darkens, white is neutral
    Multiply,
    /// Lightens, black is neutral
    Screen,
}

impl CompositionMode {
    /// Mode for highlight-like overlays: multiply on light pages, screen on black ones.
    pub fn for_background(background: Rgba8) -> Self {
        if background.r == 0 && background.g == 0 && background.b == 0 {
            CompositionMode::Screen
        } else {
            CompositionMode::Multiply
        }
    }

    pub(crate) fn blend_mode(self) -> BlendMode {
        match self {
            CompositionMode::Normal => BlendMode::SourceOver,
            CompositionMode::Multiply => BlendMode::Multiply,
            CompositionMode::Screen => BlendMode::Screen,
        }
    }
}

/// Stroke description.
///
/// `width` is in logical units before any scale multiplier. A width of zero
/// draws a one device pixel hairline.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pen {
    /// Stroke color including alpha
    pub color: Rgba8,
    /// Logical stroke width
    pub width: f64,
    /// Dash pattern of 4 width on, 2 width off
    pub dashed: bool,
    /// End cap
    pub line_cap: LineCap,
    /// Corner join
    pub line_join: LineJoin,
}

impl Pen {
    /// Solid pen with square caps and bevel joins.
    pub fn new(color: Rgba8, width: f64) -> Self {
        Self {
            color,
            width,
            dashed: false,
            line_cap: LineCap::Square,
            line_join: LineJoin::Bevel,
        }
    }

    /// One device pixel wide pen.
    pub fn hairline(color: Rgba8) -> Self {
        Self::new(color, 0.0)
    }

    /// Pen for an annotation outline.
    ///
    /// The alpha comes from the style opacity, not from `color`. Dashed styles
    /// get a dash pattern; caps are square and joins mitered.
    pub fn for_annotation(style: &AnnotationStyle, width: f64, color: Rgba8) -> Self {
        Self {
            color: color.with_alpha_f(style.opacity as f32),
            width,
            dashed: style.line_style == LineStyle::Dashed,
            line_cap: LineCap::Square,
            line_join: LineJoin::Miter,
        }
    }

    /// Toggle dashing.
    pub fn with_dash(mut self, dashed: bool) -> Self {
        self.dashed = dashed;
        self
    }

    /// Device stroke for a pen scaled by `scale` (multiplier times device pixel ratio).
    pub(crate) fn to_stroke(&self, scale: f32) -> Stroke {
        let width = (self.width as f32 * scale).max(0.0);
        let dash = if self.dashed {
            let unit = width.max(1.0);
            StrokeDash::new(vec![4.0 * unit, 2.0 * unit], 0.0)
        } else {
            None
        };
        Stroke {
            width,
            miter_limit: 4.0,
            line_cap: self.line_cap,
            line_join: self.line_join,
            dash,
        }
    }

    pub(crate) fn is_hairline(&self) -> bool {
        self.width <= 0.0
    }
}

/// Pen, fill and blending used for one shape draw.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShapeStyle {
    /// Outline; `None` skips the stroke
    pub pen: Option<Pen>,
    /// Interior; `None` draws an open polyline
    pub fill: Option<Rgba8>,
    /// Factor applied to the pen width
    pub scale_multiplier: f64,
    /// Composition with the target
    pub mode: CompositionMode,
}

impl ShapeStyle {
    /// Stroke only.
    pub fn stroke(pen: Pen) -> Self {
        Self {
            pen: Some(pen),
            fill: None,
            scale_multiplier: 1.0,
            mode: CompositionMode::Normal,
        }
    }

    /// Fill only.
    pub fn filled(color: Rgba8) -> Self {
        Self {
            pen: None,
            fill: Some(color),
            scale_multiplier: 1.0,
            mode: CompositionMode::Normal,
        }
    }

    /// Set or clear the fill.
    pub fn with_fill(mut self, fill: Option<Rgba8>) -> Self {
        self.fill = fill;
        self
    }

    /// Set the pen width multiplier.
    pub fn with_scale_multiplier(mut self, multiplier: f64) -> Self {
        self.scale_multiplier = multiplier;
        self
    }

    /// Set the composition mode.
    pub fn with_mode(mut self, mode: CompositionMode) -> Self {
        self.mode = mode;
        self
    }
}

/// A raster plus the device pixel ratio and clip it is drawn with.
pub struct RasterTarget<'a> {
    /// Destination pixels
    pub pixmap: &'a mut Pixmap,
    /// Device pixels per logical unit
    pub device_pixel_ratio: f32,
    /// Optional coverage mask the size of `pixmap`
    pub clip: Option<&'a Mask>,
}

impl<'a> RasterTarget<'a> {
    /// Unclipped target.
    pub fn new(pixmap: &'a mut Pixmap, device_pixel_ratio: f32) -> Self {
        Self {
            pixmap,
            device_pixel_ratio,
            clip: None,
        }
    }

    fn to_pixel(&self, point: &NormalizedPoint) -> (f32, f32) {
        (
            (point.x * self.pixmap.width() as f64) as f32,
            (point.y * self.pixmap.height() as f64) as f32,
        )
    }
}

/// Rasterizer for normalized shapes.
pub struct ShapeRasterizer {}

impl ShapeRasterizer {
    /// Create a new shape rasterizer.
    pub fn new() -> Self {
        Self {}
    }

    /// Draw a polyline or polygon.
    ///
    /// Fewer than two points is a no-op. Without a fill the points are stroked as
    /// a polyline, repeating the first point when `closed`. With a fill the path
    /// is filled with the winding rule and then stroked.
    pub fn draw_path(
        &self,
        target: &mut RasterTarget<'_>,
        points: &[NormalizedPoint],
        closed: bool,
        style: &ShapeStyle,
    ) {
        if points.len() < 2 {
            return;
        }

        let mut pb = PathBuilder::new();
        let (x0, y0) = target.to_pixel(&points[0]);
        pb.move_to(x0, y0);
        for point in &points[1..] {
            let (x, y) = target.to_pixel(point);
            pb.line_to(x, y);
        }
        if closed {
            if style.fill.is_some() {
                pb.close();
            } else {
                pb.line_to(x0, y0);
            }
        }
        let Some(path) = pb.finish() else {
            log::trace!("Skipping degenerate shape with {} points", points.len());
            return;
        };

        if let Some(fill) = style.fill {
            let paint = create_fill_paint(fill, style.mode);
            target.pixmap.fill_path(
                &path,
                &paint,
                FillRule::Winding,
                Transform::identity(),
                target.clip,
            );
        }
        self.stroke(target, &path, style);
    }

    /// Draw an ellipse inscribed in the box spanned by the first two points.
    ///
    /// Without a fill only the outline is stroked.
    pub fn draw_ellipse(
        &self,
        target: &mut RasterTarget<'_>,
        points: &[NormalizedPoint],
        style: &ShapeStyle,
    ) {
        if points.len() < 2 {
            return;
        }
        let (x0, y0) = target.to_pixel(&points[0]);
        let (x1, y1) = target.to_pixel(&points[1]);
        let Some(path) = Rect::from_ltrb(x0.min(x1), y0.min(y1), x0.max(x1), y0.max(y1))
            .and_then(PathBuilder::from_oval)
        else {
            return;
        };

        if let Some(fill) = style.fill {
            let paint = create_fill_paint(fill, style.mode);
            target.pixmap.fill_path(
                &path,
                &paint,
                FillRule::Winding,
                Transform::identity(),
                target.clip,
            );
        }
        self.stroke(target, &path, style);
    }

    fn stroke(&self, target: &mut RasterTarget<'_>, path: &tiny_skia::Path, style: &ShapeStyle) {
        let Some(pen) = style.pen else {
            return;
        };
        let scale = style.scale_multiplier as f32 * target.device_pixel_ratio;
        let paint = create_stroke_paint(&pen, style.mode);
        target.pixmap.stroke_path(
            path,
            &paint,
            &pen.to_stroke(scale),
            Transform::identity(),
            target.clip,
        );
    }
}

impl Default for ShapeRasterizer {
    fn default() -> Self {
        Self::new()
    }
}
