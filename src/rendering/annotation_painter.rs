//! Annotation overlay drawing.
//!
//! Every annotation subtype has one drawing routine selected by a single match
//! over [`AnnotationKind`]. Geometry arrives in page-normalized coordinates and
//! is mapped into the canvas at the current scale and device pixel ratio.
//!
//! Line, markup and ink annotations are *buffered*: their presence makes the
//! compositor draw the page through an intermediate image, so Multiply and
//! Screen blending see the page pixels underneath. Within the annotation stage
//! buffered annotations are drawn before the others.

use tiny_skia::{Path, PathBuilder, Pixmap, Transform};

use super::assets::AssetCache;
use super::canvas::Canvas;
use super::create_stroke_paint;
use super::line_painter::LineAnnotationPainter;
use super::path_rasterizer::{CompositionMode, Pen, RasterTarget, ShapeRasterizer, ShapeStyle};
use super::recolor::{colorize, PixelBuffer, Recolorer};
use super::text_rasterizer::TextRasterizer;
use crate::annotation_types::{AnnotationFlags, GeometricShape, Rgba8, TextMarkupType};
use crate::annotations::{
    Annotation, AnnotationKind, GeometricAnnotation, HighlightAnnotation, InkAnnotation,
    LineAnnotation, StampAnnotation, TextAnnotation, TextAnnotationKind,
};
use crate::config::RenderConfig;
use crate::geometry::{NormalizedPoint, PixelRect};

/// Line annotations reserve this many stroke widths around their bounding box
/// for decorations and leader lines.
const LINE_MARGIN_WIDTHS: f64 = 20.0;

/// Pen width of underline and strike-out markup, in logical pixels.
const MARKUP_LINE_WIDTH: f64 = 2.0;

/// Annotations of one page split by how they are composited.
#[derive(Debug, Default, Clone)]
pub struct AnnotationBatches<'p> {
    /// Line, markup and ink annotations, drawn through the intermediate image
    pub buffered: Vec<&'p Annotation>,
    /// Text, geometric and stamp annotations, drawn onto the destination
    pub unbuffered: Vec<&'p Annotation>,
    /// Externally drawn annotations currently moved or resized
    pub being_edited: Vec<&'p Annotation>,
}

impl<'p> AnnotationBatches<'p> {
    /// Split `annotations` keeping list order inside each batch.
    ///
    /// Hidden annotations are dropped. Externally drawn ones only show up in
    /// `being_edited`, and only while they are moved or resized.
    pub fn partition(annotations: &'p [Annotation]) -> Self {
        let mut batches = Self::default();
        for annotation in annotations {
            if annotation.flags.contains(AnnotationFlags::HIDDEN) {
                continue;
            }
            if annotation.flags.contains(AnnotationFlags::EXTERNALLY_DRAWN) {
                if annotation.flags.is_being_edited() {
                    batches.being_edited.push(annotation);
                }
                continue;
            }
            if annotation.kind.is_buffered() {
                batches.buffered.push(annotation);
            } else {
                batches.unbuffered.push(annotation);
            }
        }
        batches
    }

    /// Whether nothing at all has to be drawn.
    pub fn is_empty(&self) -> bool {
        self.buffered.is_empty() && self.unbuffered.is_empty() && self.being_edited.is_empty()
    }
}

/// Draws annotations of one page for one paint call.
pub struct AnnotationOverlayRenderer<'a> {
    config: &'a RenderConfig,
    assets: &'a AssetCache,
    text: &'a TextRasterizer,
    recolorer: Option<&'a Recolorer>,
    background: Rgba8,
    /// Page size at scale 1.0
    page_size: (f64, f64),
    scale: f64,
    rasterizer: ShapeRasterizer,
}

impl<'a> AnnotationOverlayRenderer<'a> {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        config: &'a RenderConfig,
        assets: &'a AssetCache,
        text: &'a TextRasterizer,
        recolorer: Option<&'a Recolorer>,
        background: Rgba8,
        page_size: (f64, f64),
        scale: f64,
    ) -> Self {
        Self {
            config,
            assets,
            text,
            recolorer,
            background,
            page_size,
            scale,
            rasterizer: ShapeRasterizer::new(),
        }
    }

    /// Draw every annotation in order; returns how many were actually drawn.
    pub(crate) fn draw_all(&self, canvas: &mut Canvas<'_>, annotations: &[&Annotation]) -> usize {
        annotations
            .iter()
            .filter(|annotation| self.draw(canvas, annotation))
            .count()
    }

    /// Draw one annotation. Returns `false` when it was skipped.
    pub(crate) fn draw(&self, canvas: &mut Canvas<'_>, annotation: &Annotation) -> bool {
        let opacity = annotation.main_opacity();
        if opacity == 0 && !matches!(annotation.kind, AnnotationKind::Text(_)) {
            return false;
        }

        let bbox = self.device_bounds(canvas, annotation);
        let hit_area = if annotation.is_linked_text() {
            let size = self.icon_size(canvas) as i32;
            PixelRect::new(bbox.x, bbox.y, size, size)
        } else {
            bbox
        };
        if !hit_area.intersects(&canvas.limits()) {
            return false;
        }

        log::trace!(
            "Drawing {} annotation at {}x{}+{}+{}",
            annotation.kind.name(),
            bbox.width,
            bbox.height,
            bbox.x,
            bbox.y
        );

        let drawn = match &annotation.kind {
            AnnotationKind::Text(text) => match text.text_type {
                TextAnnotationKind::Inline => self.draw_inline_text(canvas, annotation, text, bbox),
                TextAnnotationKind::Linked => self.draw_linked_text(canvas, annotation, text, bbox),
            },
            AnnotationKind::Line(line) => self.draw_line(canvas, annotation, line, bbox),
            AnnotationKind::Geometric(geom) => self.draw_geometric(canvas, annotation, geom, bbox),
            AnnotationKind::Highlight(markup) => self.draw_markup(canvas, annotation, markup),
            AnnotationKind::Stamp(stamp) => self.draw_stamp(canvas, annotation, stamp, bbox),
            AnnotationKind::Ink(ink) => self.draw_ink(canvas, annotation, ink),
        };

        if drawn && self.config.debug_draw_annotation_rect {
            self.outline_bounds(canvas, &bbox, &Pen::hairline(annotation.main_color().with_alpha(255)));
        }
        drawn
    }

    /// Dashed box around an externally drawn annotation that is being edited.
    pub(crate) fn draw_edit_outline(&self, canvas: &mut Canvas<'_>, annotation: &Annotation) {
        let bbox = self.device_bounds(canvas, annotation);
        if bbox.intersects(&canvas.limits()) {
            self.outline_bounds(canvas, &bbox, &Pen::hairline(Rgba8::BLACK).with_dash(true));
        }
    }

    fn device_bounds(&self, canvas: &Canvas<'_>, annotation: &Annotation) -> PixelRect {
        let (width, height) = canvas.page_size();
        annotation
            .bounding_rect
            .geometry(width as i32, height as i32)
    }

    fn icon_size(&self, canvas: &Canvas<'_>) -> u32 {
        (self.config.limits.text_icon_size * canvas.dpr())
            .round()
            .max(1.0) as u32
    }

    fn recolor(&self, color: Rgba8) -> Rgba8 {
        self.recolorer
            .map_or(color, |recolorer| recolorer.apply_to_color(color))
    }

    fn outline_bounds(&self, canvas: &mut Canvas<'_>, bbox: &PixelRect, pen: &Pen) {
        let rect = tiny_skia::Rect::from_xywh(
            bbox.x as f32 + 0.5,
            bbox.y as f32 + 0.5,
            (bbox.width - 1).max(1) as f32,
            (bbox.height - 1).max(1) as f32,
        );
        if let Some(rect) = rect {
            let transform = canvas.device_transform();
            canvas.stroke_path(
                &PathBuilder::from_rect(rect),
                pen,
                CompositionMode::Normal,
                transform,
            );
        }
    }

    fn draw_inline_text(
        &self,
        canvas: &mut Canvas<'_>,
        annotation: &Annotation,
        text: &TextAnnotation,
        bbox: PixelRect,
    ) -> bool {
        let Some(mut image) = Pixmap::new(bbox.width.max(1) as u32, bbox.height.max(1) as u32)
        else {
            return false;
        };
        image.fill(annotation.main_color().to_skia());

        let device_scale = self.scale * canvas.dpr();
        let border = (annotation.style.width * device_scale).max(0.0) as f32;
        let (width, height) = (image.width() as f32, image.height() as f32);

        if let Some(rect) =
            tiny_skia::Rect::from_xywh(border, border, width - 2.0 * border, height - 2.0 * border)
        {
            let glyphs = self.text.draw_text(
                &mut image,
                rect,
                &text.contents,
                &text.font,
                (text.font.size * device_scale) as f32,
                text.alignment,
                self.recolor(text.text_color),
            );
            log::trace!("Inline text annotation drew {} glyphs", glyphs);
        }

        if border > 0.0 {
            let frame = tiny_skia::Rect::from_xywh(
                border / 2.0,
                border / 2.0,
                width - border,
                height - border,
            );
            if let Some(frame) = frame {
                let pen = Pen::new(self.recolor(Rgba8::BLACK), border as f64);
                image.stroke_path(
                    &PathBuilder::from_rect(frame),
                    &create_stroke_paint(&pen, CompositionMode::Normal),
                    &pen.to_stroke(1.0),
                    Transform::identity(),
                    None,
                );
            }
        }

        canvas.draw_pixmap(
            image.as_ref(),
            Transform::from_translate(bbox.x as f32, bbox.y as f32),
            1.0,
        );
        true
    }

    fn draw_linked_text(
        &self,
        canvas: &mut Canvas<'_>,
        annotation: &Annotation,
        text: &TextAnnotation,
        bbox: PixelRect,
    ) -> bool {
        let Some(mut icon) = self.assets.text_icon_at(&text.icon, self.icon_size(canvas)) else {
            return false;
        };
        let opacity = if annotation.style.color.is_some() {
            colorize(
                &mut PixelBuffer::from_pixmap(&mut icon),
                annotation.main_color(),
                annotation.main_opacity(),
            );
            1.0
        } else {
            annotation.main_opacity() as f32 / 255.0
        };
        canvas.draw_pixmap(
            icon.as_ref(),
            Transform::from_translate(bbox.x as f32, bbox.y as f32),
            opacity,
        );
        true
    }

    fn draw_line(
        &self,
        canvas: &mut Canvas<'_>,
        annotation: &Annotation,
        line: &LineAnnotation,
        bbox: PixelRect,
    ) -> bool {
        let margin = (annotation.style.width * LINE_MARGIN_WIDTHS * self.scale * canvas.dpr())
            .ceil()
            .max(0.0) as i32;
        let Some(area) = bbox.inflated(margin).intersect(&canvas.limits()) else {
            return false;
        };
        let Some(mut image) = Pixmap::new(area.width as u32, area.height as u32) else {
            return false;
        };

        let (page_w, page_h) = canvas.page_size();
        let (image_w, image_h) = (area.width as f64, area.height as f64);
        let to_image = Transform::from_row(
            (page_w / image_w) as f32,
            0.0,
            0.0,
            (page_h / image_h) as f32,
            (-area.x as f64 / image_w) as f32,
            (-area.y as f64 / image_h) as f32,
        );
        let pen = Pen::for_annotation(
            &annotation.style,
            annotation.style.width,
            annotation.main_color(),
        );
        let painter = LineAnnotationPainter::new(line, pen, self.page_size, self.scale, to_image);
        let mut target = RasterTarget::new(&mut image, canvas.dpr() as f32);
        painter.draw(&self.rasterizer, &mut target);

        canvas.draw_pixmap(
            image.as_ref(),
            Transform::from_translate(area.x as f32, area.y as f32),
            1.0,
        );
        true
    }

    fn draw_geometric(
        &self,
        canvas: &mut Canvas<'_>,
        annotation: &Annotation,
        geom: &GeometricAnnotation,
        bbox: PixelRect,
    ) -> bool {
        let line_width = (annotation.style.width * self.scale * canvas.dpr()).max(0.0);
        let outline = inset(&bbox, line_width / 2.0);
        let transform = canvas.device_transform();

        if let Some(inner) = geom.inner_color {
            let fill = self.recolor(inner).with_alpha(annotation.main_opacity());
            let inner_rect = outline.and_then(|rect| inset_rect(rect, line_width / 2.0));
            if let Some(path) = inner_rect.and_then(|rect| shape_path(geom.shape, rect)) {
                canvas.fill_path(&path, fill, CompositionMode::Normal, transform);
            }
        }

        if line_width > 0.0 {
            let pen = Pen::for_annotation(&annotation.style, line_width, annotation.main_color());
            if let Some(path) = outline.and_then(|rect| shape_path(geom.shape, rect)) {
                canvas.stroke_path(&path, &pen, CompositionMode::Normal, transform);
            }
        }
        true
    }

    fn draw_markup(
        &self,
        canvas: &mut Canvas<'_>,
        annotation: &Annotation,
        markup: &HighlightAnnotation,
    ) -> bool {
        // Markup keeps its authored color in every render mode.
        let color = annotation.main_color();
        let to_target = canvas.normalized_transform();
        let style = if markup.markup.is_filled() {
            ShapeStyle::filled(color).with_mode(CompositionMode::for_background(self.background))
        } else {
            ShapeStyle::stroke(Pen::new(color, MARKUP_LINE_WIDTH))
        };

        let mut target = canvas.target();
        for quad in &markup.quads {
            let [p0, p1, p2, p3] = quad.points.map(|p| p.transformed(&to_target));
            match markup.markup {
                TextMarkupType::Highlight => {
                    self.rasterizer
                        .draw_path(&mut target, &[p0, p1, p2, p3], true, &style)
                },
                TextMarkupType::Squiggly => {
                    let top = [p0.midpoint(&p3), p1.midpoint(&p2)];
                    self.rasterizer
                        .draw_path(&mut target, &[top[0], top[1], p2, p3], true, &style)
                },
                TextMarkupType::Underline => {
                    let line = [p0.lerp(&p3, 0.75), p1.lerp(&p2, 0.75)];
                    self.rasterizer.draw_path(&mut target, &line, false, &style)
                },
                TextMarkupType::StrikeOut => {
                    let line = [p0.midpoint(&p3), p1.midpoint(&p2)];
                    self.rasterizer.draw_path(&mut target, &line, false, &style)
                },
            }
        }
        !markup.quads.is_empty()
    }

    fn draw_stamp(
        &self,
        canvas: &mut Canvas<'_>,
        annotation: &Annotation,
        stamp: &StampAnnotation,
        bbox: PixelRect,
    ) -> bool {
        let size = bbox.width.max(bbox.height).max(1) as u32;
        let Some(mut icon) = self.assets.stamp_at(&stamp.icon_name, size) else {
            return false;
        };
        if let Some(recolorer) = self.recolorer {
            recolorer.apply_to_pixmap(&mut icon);
        }
        let transform = Transform::from_row(
            bbox.width as f32 / size as f32,
            0.0,
            0.0,
            bbox.height as f32 / size as f32,
            bbox.x as f32,
            bbox.y as f32,
        );
        canvas.draw_pixmap(
            icon.as_ref(),
            transform,
            annotation.main_opacity() as f32 / 255.0,
        );
        true
    }

    fn draw_ink(&self, canvas: &mut Canvas<'_>, annotation: &Annotation, ink: &InkAnnotation) -> bool {
        let pen = Pen::for_annotation(
            &annotation.style,
            annotation.style.width,
            annotation.main_color(),
        );
        let style = ShapeStyle::stroke(pen).with_scale_multiplier(self.scale);
        let to_target = canvas.normalized_transform();

        let mut target = canvas.target();
        for path in &ink.paths {
            let points: Vec<NormalizedPoint> =
                path.iter().map(|p| p.transformed(&to_target)).collect();
            self.rasterizer
                .draw_path(&mut target, &points, false, &style);
        }
        ink.paths.iter().any(|path| path.len() >= 2)
    }
}

/// Bounding box shrunk by `d` on every side, as a float rect.
fn inset(rect: &PixelRect, d: f64) -> Option<tiny_skia::Rect> {
    inset_rect(rect.to_rect()?, d)
}

fn inset_rect(rect: tiny_skia::Rect, d: f64) -> Option<tiny_skia::Rect> {
    let d = d as f32;
    tiny_skia::Rect::from_xywh(
        rect.x() + d,
        rect.y() + d,
        rect.width() - 2.0 * d,
        rect.height() - 2.0 * d,
    )
}

fn shape_path(shape: GeometricShape, rect: tiny_skia::Rect) -> Option<Path> {
    match shape {
        GeometricShape::InscribedSquare => Some(PathBuilder::from_rect(rect)),
        GeometricShape::InscribedCircle => PathBuilder::from_oval(rect),
    }
}
