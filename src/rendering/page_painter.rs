//! Page compositor - the entry point of a paint call.
//!
//! Paints one page region onto a caller-supplied [`Surface`]. Stages run in a
//! fixed order: background, page raster (recolored when requested), highlights
//! and selection, annotations, object borders, viewport marker.
//!
//! When the paint call carries buffered annotations, highlights or a viewport
//! marker, every stage draws into an intermediate image covering the painting
//! limits, which is then copied onto the surface. Otherwise the stages draw
//! straight onto the surface, clipped to the limits.

use bitflags::bitflags;
use tiny_skia::{BlendMode, FilterQuality, PathBuilder, Pixmap, PixmapPaint, Transform};

use super::annotation_painter::{AnnotationBatches, AnnotationOverlayRenderer};
use super::assets::AssetCache;
use super::canvas::Canvas;
use super::path_rasterizer::{CompositionMode, Pen};
use super::recolor::Recolorer;
use super::text_rasterizer::TextRasterizer;
use super::tile_compositor::{PageSource, PixmapDrawResult, TileCompositor};
use crate::annotation_types::Rgba8;
use crate::config::RenderConfig;
use crate::error::{Error, Result};
use crate::geometry::{NormalizedPoint, NormalizedRect, PixelRect, Rect};
use crate::page::{ObjectKind, Page, PixmapProvider};

/// Logical offset of the busy icon from the page's top-left corner.
const PLACEHOLDER_OFFSET: f64 = 10.0;

bitflags! {
    /// What a paint call draws besides the page raster.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct PaintFlags: u32 {
        /// Apply the configured accessibility color mode
        const ACCESSIBILITY = 1 << 0;
        /// Outline link areas (needs `highlight_links` in the configuration)
        const ENHANCE_LINKS = 1 << 1;
        /// Outline image areas (needs `highlight_images` in the configuration)
        const ENHANCE_IMAGES = 1 << 2;
        /// Draw search and user highlights
        const HIGHLIGHTS = 1 << 3;
        /// Draw the active text selection
        const TEXT_SELECTION = 1 << 4;
        /// Draw annotations
        const ANNOTATIONS = 1 << 5;
        /// Draw the viewport marker line
        const VIEWPORT_POINT = 1 << 6;
    }
}

/// Destination raster with its device pixel ratio.
#[derive(Debug, Clone)]
pub struct Surface {
    pixmap: Pixmap,
    device_pixel_ratio: f64,
}

impl Surface {
    /// Allocate a transparent surface of `width`×`height` device pixels.
    pub fn new(width: u32, height: u32, device_pixel_ratio: f64) -> Result<Self> {
        if !(device_pixel_ratio.is_finite() && device_pixel_ratio > 0.0) {
            return Err(Error::InvalidConfig(format!(
                "device pixel ratio must be positive, got {}",
                device_pixel_ratio
            )));
        }
        let pixmap = Pixmap::new(width, height).ok_or(Error::SurfaceAllocation { width, height })?;
        Ok(Self {
            pixmap,
            device_pixel_ratio,
        })
    }

    /// Wrap an existing raster.
    pub fn from_pixmap(pixmap: Pixmap, device_pixel_ratio: f64) -> Self {
        Self {
            pixmap,
            device_pixel_ratio,
        }
    }

    /// Width in device pixels.
    pub fn width(&self) -> u32 {
        self.pixmap.width()
    }

    /// Height in device pixels.
    pub fn height(&self) -> u32 {
        self.pixmap.height()
    }

    /// Device pixels per logical pixel.
    pub fn device_pixel_ratio(&self) -> f64 {
        self.device_pixel_ratio
    }

    /// Painted pixels.
    pub fn pixmap(&self) -> &Pixmap {
        &self.pixmap
    }

    /// Mutable access to the pixels.
    pub fn pixmap_mut(&mut self) -> &mut Pixmap {
        &mut self.pixmap
    }

    /// Take the painted raster.
    pub fn into_pixmap(self) -> Pixmap {
        self.pixmap
    }

    /// Straight-alpha color of one device pixel.
    pub fn pixel(&self, x: u32, y: u32) -> Option<Rgba8> {
        let p = self.pixmap.pixel(x, y)?.demultiply();
        Some(Rgba8::new(p.red(), p.green(), p.blue(), p.alpha()))
    }
}

/// Parameters of one paint call.
#[derive(Debug, Clone, PartialEq)]
pub struct PaintRequest {
    /// Region to paint, in logical coordinates relative to the page's top-left corner
    pub crop_rect: Rect,
    /// Page pixels to logical pixels
    pub scale: f64,
    /// Overlays to draw
    pub flags: PaintFlags,
    /// Vertical position of the viewport marker
    pub viewport_point: Option<NormalizedPoint>,
    /// Logical position of the page's top-left corner on the surface
    pub origin: (f64, f64),
}

impl PaintRequest {
    /// Paint `crop_rect` at `scale` with the page placed at the surface origin.
    pub fn new(crop_rect: Rect, scale: f64, flags: PaintFlags) -> Self {
        Self {
            crop_rect,
            scale,
            flags,
            viewport_point: None,
            origin: (0.0, 0.0),
        }
    }

    /// Show the viewport marker at `point` (also needs [`PaintFlags::VIEWPORT_POINT`]).
    pub fn with_viewport_point(mut self, point: NormalizedPoint) -> Self {
        self.viewport_point = Some(point);
        self
    }

    /// Place the page's top-left corner at a logical surface position.
    pub fn with_origin(mut self, x: f64, y: f64) -> Self {
        self.origin = (x, y);
        self
    }
}

/// What a paint call did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PaintOutcome {
    /// Quality of the page raster that was drawn
    pub pixmaps: PixmapDrawResult,
    /// Whether stages were composed in an intermediate image
    pub used_intermediate_buffer: bool,
    /// Number of annotations drawn
    pub annotations_drawn: usize,
}

/// Everything the stages need, resolved once per paint call.
struct PaintContext<'p> {
    page: &'p Page,
    scale: f64,
    flags: PaintFlags,
    source: PageSource<'p>,
    batches: AnnotationBatches<'p>,
    spans: Vec<(Rgba8, NormalizedRect)>,
    viewport: Option<NormalizedPoint>,
    background: Rgba8,
    recolorer: Option<&'p Recolorer>,
    page_pixels: (i32, i32),
}

/// Composites a page raster and its overlays onto a surface.
pub struct PageCompositor {
    config: RenderConfig,
    recolorer: Recolorer,
    tiles: TileCompositor,
    assets: AssetCache,
    text: TextRasterizer,
}

impl PageCompositor {
    /// Create a compositor without icons or fonts.
    pub fn new(config: RenderConfig) -> Self {
        Self {
            recolorer: Recolorer::from_config(&config),
            tiles: TileCompositor::new(config.limits.clone()),
            assets: AssetCache::new(),
            text: TextRasterizer::new(),
            config,
        }
    }

    /// Use these icons for placeholders, linked text and stamps.
    pub fn with_assets(mut self, assets: AssetCache) -> Self {
        self.assets = assets;
        self
    }

    /// Use this rasterizer for inline text annotations.
    pub fn with_text_rasterizer(mut self, text: TextRasterizer) -> Self {
        self.text = text;
        self
    }

    /// Configuration snapshot in use.
    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    /// Whether the stages have to be composed in an intermediate image.
    ///
    /// Multiply and Screen blending of buffered annotations and highlights need
    /// the page pixels underneath, and the viewport marker is drawn with them.
    pub fn needs_intermediate_buffer(
        has_buffered_annotations: bool,
        has_highlights: bool,
        has_viewport_marker: bool,
    ) -> bool {
        has_buffered_annotations || has_highlights || has_viewport_marker
    }

    /// Paint `request.crop_rect` of `page` onto `surface`.
    ///
    /// Never fails: a missing page raster yields a placeholder and
    /// [`PixmapDrawResult::NoPixmap`], with no overlays drawn.
    pub fn paint(
        &self,
        surface: &mut Surface,
        page: &Page,
        provider: &dyn PixmapProvider,
        request: &PaintRequest,
    ) -> PaintOutcome {
        let dpr = surface.device_pixel_ratio();
        let page_device = (
            page.width * request.scale * dpr,
            page.height * request.scale * dpr,
        );
        let page_pixels = (page_device.0 as i32, page_device.1 as i32);
        let origin = (
            (request.origin.0 * dpr).round() as i32,
            (request.origin.1 * dpr).round() as i32,
        );
        let surface_area = PixelRect::new(
            -origin.0,
            -origin.1,
            surface.width() as i32,
            surface.height() as i32,
        );
        let Some(limits) = request
            .crop_rect
            .to_device_aligned(dpr)
            .intersect(&surface_area)
        else {
            log::debug!("Crop rect of page {} misses the surface", page.number);
            return PaintOutcome::default();
        };

        let background = if request.flags.contains(PaintFlags::ACCESSIBILITY) {
            self.config.background_color()
        } else {
            Rgba8::WHITE
        };
        let recolorer = (request.flags.contains(PaintFlags::ACCESSIBILITY)
            && self.recolorer.is_active())
        .then_some(&self.recolorer);

        let Some(source) = self
            .tiles
            .resolve(provider, page.number, page_pixels, &limits)
        else {
            log::debug!("Page {} has no usable raster, drawing placeholder", page.number);
            let mut canvas = Canvas::new(surface.pixmap_mut(), dpr, origin, limits, page_device);
            canvas.fill_rect(&limits, background, CompositionMode::Normal);
            self.draw_placeholder(&mut canvas);
            return PaintOutcome {
                pixmaps: PixmapDrawResult::NoPixmap,
                ..PaintOutcome::default()
            };
        };

        let batches = if request.flags.contains(PaintFlags::ANNOTATIONS) {
            AnnotationBatches::partition(&page.annotations)
        } else {
            AnnotationBatches::default()
        };
        let viewport = if request.flags.contains(PaintFlags::VIEWPORT_POINT) {
            request.viewport_point
        } else {
            None
        };
        let ctx = PaintContext {
            page,
            scale: request.scale,
            flags: request.flags,
            source,
            spans: highlight_spans(page, request.flags),
            batches,
            viewport,
            background,
            recolorer,
            page_pixels,
        };

        let mut buffer = if Self::needs_intermediate_buffer(
            !ctx.batches.buffered.is_empty(),
            !ctx.spans.is_empty(),
            ctx.viewport.is_some(),
        ) {
            let buffer = Pixmap::new(limits.width as u32, limits.height as u32);
            if buffer.is_none() {
                log::warn!(
                    "Could not allocate {}x{} intermediate image, drawing directly",
                    limits.width,
                    limits.height
                );
            }
            buffer
        } else {
            None
        };

        let (pixmaps, annotations_drawn) = match buffer.as_mut() {
            Some(buffer) => {
                log::trace!("Composing page {} through intermediate image", page.number);
                let mut canvas =
                    Canvas::new(buffer, dpr, (-limits.x, -limits.y), limits, page_device);
                self.compose(&mut canvas, &ctx)
            },
            None => {
                let mut canvas =
                    Canvas::new(surface.pixmap_mut(), dpr, origin, limits, page_device);
                self.compose(&mut canvas, &ctx)
            },
        };

        if let Some(buffer) = &buffer {
            let paint = PixmapPaint {
                blend_mode: BlendMode::Source,
                quality: FilterQuality::Nearest,
                ..PixmapPaint::default()
            };
            surface.pixmap_mut().draw_pixmap(
                limits.x + origin.0,
                limits.y + origin.1,
                buffer.as_ref(),
                &paint,
                Transform::identity(),
                None,
            );
        }

        if pixmaps == PixmapDrawResult::PixmapsOfIncorrectSize {
            log::debug!("Page {} was painted from rescaled rasters", page.number);
        }

        PaintOutcome {
            pixmaps,
            used_intermediate_buffer: buffer.is_some(),
            annotations_drawn,
        }
    }

    fn compose(&self, canvas: &mut Canvas<'_>, ctx: &PaintContext<'_>) -> (PixmapDrawResult, usize) {
        let limits = canvas.limits();
        canvas.fill_rect(&limits, ctx.background, CompositionMode::Normal);

        let pixmaps = self
            .tiles
            .draw(canvas, &ctx.source, ctx.page_pixels, ctx.recolorer);

        self.draw_highlights(canvas, ctx);

        let renderer = AnnotationOverlayRenderer::new(
            &self.config,
            &self.assets,
            &self.text,
            ctx.recolorer,
            ctx.background,
            (ctx.page.width, ctx.page.height),
            ctx.scale,
        );
        let mut drawn = renderer.draw_all(canvas, &ctx.batches.buffered);
        drawn += renderer.draw_all(canvas, &ctx.batches.unbuffered);
        for annotation in &ctx.batches.being_edited {
            renderer.draw_edit_outline(canvas, annotation);
        }

        self.draw_object_borders(canvas, ctx);

        if let Some(point) = ctx.viewport {
            self.draw_viewport_marker(canvas, point);
        }
        (pixmaps, drawn)
    }

    fn draw_highlights(&self, canvas: &mut Canvas<'_>, ctx: &PaintContext<'_>) {
        let mode = CompositionMode::for_background(ctx.background);
        let limits = canvas.limits();
        let transform = canvas.device_transform();
        for (color, rect) in &ctx.spans {
            let area = rect.geometry(ctx.page_pixels.0, ctx.page_pixels.1);
            if !area.intersects(&limits) {
                continue;
            }
            canvas.fill_rect(&area, *color, mode);
            if let Some(frame) = frame_rect(&area) {
                canvas.stroke_path(
                    &PathBuilder::from_rect(frame),
                    &Pen::hairline(color.darker(150)),
                    mode,
                    transform,
                );
            }
        }
    }

    fn draw_object_borders(&self, canvas: &mut Canvas<'_>, ctx: &PaintContext<'_>) {
        let links = ctx.flags.contains(PaintFlags::ENHANCE_LINKS) && self.config.highlight_links;
        let images = ctx.flags.contains(PaintFlags::ENHANCE_IMAGES) && self.config.highlight_images;
        if !(links || images) {
            return;
        }

        let hit_area = canvas
            .limits()
            .inflated(self.config.limits.object_border_slack);
        let (width, height) = canvas.page_size();
        let pen = Pen::hairline(self.config.highlight_color);
        let transform = canvas.device_transform();

        for object in &ctx.page.object_rects {
            let wanted = match object.kind {
                ObjectKind::Link => links,
                ObjectKind::Image => images,
                _ => false,
            };
            if !wanted
                || !object
                    .bounding_rect()
                    .geometry(ctx.page_pixels.0, ctx.page_pixels.1)
                    .intersects(&hit_area)
            {
                continue;
            }

            let mut pb = PathBuilder::new();
            for (i, p) in object.region.iter().enumerate() {
                let (x, y) = ((p.x * width) as f32, (p.y * height) as f32);
                if i == 0 {
                    pb.move_to(x, y);
                } else {
                    pb.line_to(x, y);
                }
            }
            pb.close();
            if let Some(path) = pb.finish() {
                canvas.stroke_path(&path, &pen, CompositionMode::Normal, transform);
            }
        }
    }

    fn draw_viewport_marker(&self, canvas: &mut Canvas<'_>, point: NormalizedPoint) {
        let (width, height) = canvas.page_size();
        let y = (point.y * height).floor() as f32 + 0.5;
        let mut pb = PathBuilder::new();
        pb.move_to(0.0, y);
        pb.line_to(width as f32, y);
        if let Some(path) = pb.finish() {
            let transform = canvas.device_transform();
            canvas.stroke_path(
                &path,
                &Pen::hairline(self.config.highlight_color),
                CompositionMode::Normal,
                transform,
            );
        }
    }

    fn draw_placeholder(&self, canvas: &mut Canvas<'_>) {
        if let Some(icon) = self.assets.busy_icon() {
            let offset = (PLACEHOLDER_OFFSET * canvas.dpr()).round() as f32;
            canvas.draw_pixmap(
                icon.as_ref(),
                Transform::from_translate(offset, offset),
                1.0,
            );
            return;
        }

        let (width, height) = canvas.page_size();
        let (right, bottom) = (width as f32 - 0.5, height as f32 - 0.5);
        let mut pb = PathBuilder::new();
        pb.move_to(0.5, 0.5);
        pb.line_to(right, bottom);
        pb.move_to(right, 0.5);
        pb.line_to(0.5, bottom);
        if let Some(path) = pb.finish() {
            let transform = canvas.device_transform();
            canvas.stroke_path(
                &path,
                &Pen::hairline(Rgba8::GRAY),
                CompositionMode::Normal,
                transform,
            );
        }
    }
}

/// Highlight and selection rectangles requested by `flags`, in paint order.
fn highlight_spans(page: &Page, flags: PaintFlags) -> Vec<(Rgba8, NormalizedRect)> {
    let mut spans = Vec::new();
    if flags.contains(PaintFlags::HIGHLIGHTS) {
        spans.extend(page.highlights.iter().map(|h| (h.color, h.rect)));
    }
    if flags.contains(PaintFlags::TEXT_SELECTION) {
        if let Some(selection) = &page.text_selection {
            spans.extend(selection.iter().map(|r| (page.text_selection_color, *r)));
        }
    }
    spans
}

/// Hairline frame running through the outermost pixels of `area`.
fn frame_rect(area: &PixelRect) -> Option<tiny_skia::Rect> {
    tiny_skia::Rect::from_xywh(
        area.x as f32 + 0.5,
        area.y as f32 + 0.5,
        (area.width - 1).max(1) as f32,
        (area.height - 1).max(1) as f32,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotations::{Annotation, AnnotationKind, AnnotationStyle, StampAnnotation};
    use crate::page::{HighlightSpan, InMemoryPixmapStore, ObjectRect};

    fn white_store(page: usize, width: u32, height: u32) -> InMemoryPixmapStore {
        let mut bitmap = Pixmap::new(width, height).unwrap();
        bitmap.fill(tiny_skia::Color::WHITE);
        let mut store = InMemoryPixmapStore::new();
        store.insert_bitmap(page, bitmap);
        store
    }

    fn full_request(page: &Page) -> PaintRequest {
        PaintRequest::new(
            Rect::new(0.0, 0.0, page.width, page.height),
            1.0,
            PaintFlags::all(),
        )
    }

    #[test]
    fn test_needs_intermediate_buffer() {
        assert!(!PageCompositor::needs_intermediate_buffer(false, false, false));
        assert!(PageCompositor::needs_intermediate_buffer(true, false, false));
        assert!(PageCompositor::needs_intermediate_buffer(false, true, false));
        assert!(PageCompositor::needs_intermediate_buffer(false, false, true));
    }

    #[test]
    fn test_surface_rejects_bad_sizes() {
        assert!(matches!(
            Surface::new(0, 10, 1.0),
            Err(Error::SurfaceAllocation { width: 0, height: 10 })
        ));
        assert!(matches!(Surface::new(10, 10, 0.0), Err(Error::InvalidConfig(_))));
        assert_eq!(Surface::new(10, 10, 2.0).unwrap().device_pixel_ratio(), 2.0);
    }

    #[test]
    fn test_plain_page_skips_buffer() {
        let page = Page::new(0, 40.0, 20.0);
        let store = white_store(0, 40, 20);
        let mut surface = Surface::new(40, 20, 1.0).unwrap();

        let outcome = PageCompositor::new(RenderConfig::default()).paint(
            &mut surface,
            &page,
            &store,
            &full_request(&page),
        );
        assert_eq!(outcome.pixmaps, PixmapDrawResult::Fine);
        assert!(!outcome.used_intermediate_buffer);
        assert_eq!(surface.pixel(20, 10), Some(Rgba8::WHITE));
    }

    #[test]
    fn test_highlight_span_uses_buffer_and_frame() {
        let page = Page::new(0, 40.0, 40.0).with_highlight(HighlightSpan::new(
            Rgba8::rgb(255, 255, 0),
            NormalizedRect::new(0.25, 0.25, 0.75, 0.75),
        ));
        let store = white_store(0, 40, 40);
        let mut surface = Surface::new(40, 40, 1.0).unwrap();

        let outcome = PageCompositor::new(RenderConfig::default()).paint(
            &mut surface,
            &page,
            &store,
            &full_request(&page),
        );
        assert!(outcome.used_intermediate_buffer);
        assert_eq!(surface.pixel(20, 20), Some(Rgba8::rgb(255, 255, 0)));
        // darker(150) frame multiplied over the fill
        assert_eq!(surface.pixel(10, 20), Some(Rgba8::rgb(170, 170, 0)));
        assert_eq!(surface.pixel(5, 5), Some(Rgba8::WHITE));
    }

    #[test]
    fn test_unbuffered_annotation_only_draws_directly() {
        let stamp = Annotation::new(
            AnnotationKind::Stamp(StampAnnotation::default()),
            NormalizedRect::new(0.1, 0.1, 0.5, 0.5),
        )
        .with_style(AnnotationStyle::with_color(Rgba8::BLACK));
        let page = Page::new(0, 40.0, 40.0).with_annotation(stamp);
        let store = white_store(0, 40, 40);
        let mut surface = Surface::new(40, 40, 1.0).unwrap();

        let outcome = PageCompositor::new(RenderConfig::default()).paint(
            &mut surface,
            &page,
            &store,
            &full_request(&page),
        );
        assert!(!outcome.used_intermediate_buffer);
        assert_eq!(outcome.annotations_drawn, 1);
    }

    #[test]
    fn test_missing_raster_draws_cross_placeholder() {
        let page = Page::new(3, 20.0, 20.0).with_highlight(HighlightSpan::new(
            Rgba8::YELLOW,
            NormalizedRect::FULL,
        ));
        let store = InMemoryPixmapStore::new();
        let mut surface = Surface::new(20, 20, 1.0).unwrap();

        let outcome = PageCompositor::new(RenderConfig::default()).paint(
            &mut surface,
            &page,
            &store,
            &full_request(&page),
        );
        assert_eq!(outcome.pixmaps, PixmapDrawResult::NoPixmap);
        assert!(!outcome.used_intermediate_buffer);
        assert_eq!(surface.pixel(10, 10), Some(Rgba8::GRAY));
        // No highlight on an unrendered page.
        assert_eq!(surface.pixel(15, 10), Some(Rgba8::WHITE));
    }

    #[test]
    fn test_busy_icon_placeholder_offset() {
        let mut icon = Pixmap::new(4, 4).unwrap();
        icon.fill(tiny_skia::Color::BLACK);
        let compositor = PageCompositor::new(RenderConfig::default())
            .with_assets(AssetCache::new().with_busy_pixmap(icon));
        let page = Page::new(0, 20.0, 20.0);
        let mut surface = Surface::new(40, 40, 2.0).unwrap();

        compositor.paint(
            &mut surface,
            &page,
            &InMemoryPixmapStore::new(),
            &full_request(&page),
        );
        assert_eq!(surface.pixel(21, 21), Some(Rgba8::BLACK));
        assert_eq!(surface.pixel(19, 19), Some(Rgba8::WHITE));
    }

    #[test]
    fn test_viewport_marker_row() {
        let page = Page::new(0, 40.0, 20.0);
        let store = white_store(0, 40, 20);
        let mut surface = Surface::new(40, 20, 1.0).unwrap();
        let config = RenderConfig::default();
        let color = config.highlight_color;

        let request = full_request(&page).with_viewport_point(NormalizedPoint::new(0.0, 0.5));
        let outcome = PageCompositor::new(config).paint(&mut surface, &page, &store, &request);
        assert!(outcome.used_intermediate_buffer);
        assert_eq!(surface.pixel(20, 10), Some(color));
        assert_eq!(surface.pixel(20, 9), Some(Rgba8::WHITE));
    }

    #[test]
    fn test_link_borders_need_flag_and_setting() {
        let page = Page::new(0, 40.0, 40.0).with_object_rect(ObjectRect::from_rect(
            ObjectKind::Link,
            &NormalizedRect::new(0.25, 0.25, 0.75, 0.75),
        ));
        let store = white_store(0, 40, 40);
        let config = RenderConfig::default().with_object_highlighting(true, false);
        let color = config.highlight_color;

        let mut surface = Surface::new(40, 40, 1.0).unwrap();
        PageCompositor::new(config.clone()).paint(&mut surface, &page, &store, &full_request(&page));
        let left_edge = [surface.pixel(9, 20), surface.pixel(10, 20)];
        assert!(left_edge.contains(&Some(color)));

        let mut surface = Surface::new(40, 40, 1.0).unwrap();
        let request = PaintRequest::new(
            Rect::new(0.0, 0.0, 40.0, 40.0),
            1.0,
            PaintFlags::all() - PaintFlags::ENHANCE_LINKS,
        );
        PageCompositor::new(config).paint(&mut surface, &page, &store, &request);
        assert_eq!(surface.pixel(9, 20), Some(Rgba8::WHITE));
        assert_eq!(surface.pixel(10, 20), Some(Rgba8::WHITE));
    }

    #[test]
    fn test_origin_and_crop_limit_painting() {
        let page = Page::new(0, 20.0, 20.0);
        let store = white_store(0, 20, 20);
        let mut surface = Surface::new(40, 40, 1.0).unwrap();

        let request = PaintRequest::new(Rect::new(0.0, 0.0, 10.0, 20.0), 1.0, PaintFlags::empty())
            .with_origin(20.0, 20.0);
        PageCompositor::new(RenderConfig::default()).paint(&mut surface, &page, &store, &request);
        assert_eq!(surface.pixel(25, 25), Some(Rgba8::WHITE));
        assert_eq!(surface.pixel(35, 25).map(|c| c.a), Some(0));
        assert_eq!(surface.pixel(5, 5).map(|c| c.a), Some(0));
    }

    #[test]
    fn test_crop_outside_surface_paints_nothing() {
        let page = Page::new(0, 20.0, 20.0);
        let store = white_store(0, 20, 20);
        let mut surface = Surface::new(10, 10, 1.0).unwrap();
        let request = PaintRequest::new(Rect::new(15.0, 15.0, 5.0, 5.0), 1.0, PaintFlags::all());

        let outcome =
            PageCompositor::new(RenderConfig::default()).paint(&mut surface, &page, &store, &request);
        assert_eq!(outcome, PaintOutcome::default());
        assert!(surface.pixmap().pixels().iter().all(|p| p.alpha() == 0));
    }

    #[test]
    fn test_compositor_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<PageCompositor>();
        assert_send_sync::<Surface>();
    }
}
