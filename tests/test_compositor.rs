//! End-to-end tests for the page compositor.
//!
//! Each test builds a page, fills an in-memory pixmap store and paints onto a
//! fresh surface, then samples exact device pixels.

use page_oxide::annotations::{HighlightAnnotation, HighlightQuad, LineAnnotation};
use page_oxide::page::{HighlightSpan, Tile};
use page_oxide::rendering::{LineAnnotationPainter, Pen};
use page_oxide::{
    Annotation, AnnotationKind, AnnotationStyle, InMemoryPixmapStore, LineEndingStyle,
    NormalizedPoint, NormalizedRect, Page, PageCompositor, PaintFlags, PaintRequest,
    PixmapDrawResult, Rect, RenderConfig, RenderMode, Rgba8, Surface, TextMarkupType,
};
use tiny_skia::{Color, Pixmap, Transform};

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn solid(width: u32, height: u32, color: Color) -> Pixmap {
    let mut pixmap = Pixmap::new(width, height).expect("pixmap");
    pixmap.fill(color);
    pixmap
}

fn white_page_store(width: u32, height: u32) -> InMemoryPixmapStore {
    let mut store = InMemoryPixmapStore::new();
    store.insert_bitmap(0, solid(width, height, Color::WHITE));
    store
}

fn paint_all(compositor: &PageCompositor, page: &Page, store: &InMemoryPixmapStore) -> Surface {
    let mut surface =
        Surface::new(page.width as u32, page.height as u32, 1.0).expect("surface");
    let request = PaintRequest::new(
        Rect::new(0.0, 0.0, page.width, page.height),
        1.0,
        PaintFlags::all(),
    );
    compositor.paint(&mut surface, page, store, &request);
    surface
}

mod end_to_end {
    use super::*;

    #[test]
    fn test_highlight_annotation_center_pixel() {
        init_logging();
        let quad = NormalizedRect::new(0.1, 0.1, 0.5, 0.2);
        let highlight = Annotation::new(
            AnnotationKind::Highlight(HighlightAnnotation {
                markup: TextMarkupType::Highlight,
                quads: vec![HighlightQuad::from_rect(&quad)],
            }),
            quad,
        )
        .with_style(AnnotationStyle::with_color(Rgba8::YELLOW));
        let page = Page::new(0, 100.0, 100.0).with_annotation(highlight);
        let store = white_page_store(100, 100);

        let background = paint_all(
            &PageCompositor::new(RenderConfig::default()),
            &Page::new(0, 100.0, 100.0),
            &store,
        );
        let surface = paint_all(&PageCompositor::new(RenderConfig::default()), &page, &store);

        assert_eq!(background.pixel(30, 15), Some(Rgba8::WHITE));
        // Multiply of opaque yellow over white is yellow.
        assert_eq!(surface.pixel(30, 15), Some(Rgba8::YELLOW));
        assert_eq!(surface.pixel(30, 50), Some(Rgba8::WHITE));
    }

    fn translucent_highlight(opacity: f64) -> Annotation {
        let quad = NormalizedRect::new(0.1, 0.1, 0.5, 0.2);
        let mut style = AnnotationStyle::with_color(Rgba8::YELLOW);
        style.opacity = opacity;
        Annotation::new(
            AnnotationKind::Highlight(HighlightAnnotation {
                markup: TextMarkupType::Highlight,
                quads: vec![HighlightQuad::from_rect(&quad)],
            }),
            quad,
        )
        .with_style(style)
    }

    fn gray_page_store() -> InMemoryPixmapStore {
        let mut store = InMemoryPixmapStore::new();
        store.insert_bitmap(0, solid(100, 100, Color::from_rgba8(200, 200, 200, 255)));
        store
    }

    #[test]
    fn test_translucent_highlight_multiplies_gray_page() {
        init_logging();
        let store = gray_page_store();
        let compositor = PageCompositor::new(RenderConfig::default());
        let gray = Rgba8::rgb(200, 200, 200);

        let background = paint_all(&compositor, &Page::new(0, 100.0, 100.0), &store);
        let page = Page::new(0, 100.0, 100.0).with_annotation(translucent_highlight(0.5));
        let surface = paint_all(&compositor, &page, &store);

        assert_eq!(background.pixel(30, 15), Some(gray));
        // Half-opaque yellow multiplied onto 200 gray: red and green keep 200, blue halves.
        assert_eq!(surface.pixel(30, 15), Some(Rgba8::rgb(200, 200, 100)));
        assert_eq!(surface.pixel(30, 50), Some(gray));
    }

    #[test]
    fn test_translucent_span_multiplies_gray_page() {
        init_logging();
        let store = gray_page_store();
        let page = Page::new(0, 100.0, 100.0).with_highlight(HighlightSpan::new(
            Rgba8::new(255, 255, 0, 128),
            NormalizedRect::new(0.1, 0.1, 0.5, 0.2),
        ));

        let surface = paint_all(&PageCompositor::new(RenderConfig::default()), &page, &store);
        assert_eq!(surface.pixel(30, 15), Some(Rgba8::rgb(200, 200, 100)));
        assert_eq!(surface.pixel(30, 50), Some(Rgba8::rgb(200, 200, 200)));
    }

    #[test]
    fn test_translucent_highlight_screens_inverted_page() {
        init_logging();
        let store = white_page_store(100, 100);
        let config = RenderConfig::new()
            .with_accessibility(true)
            .with_render_mode(RenderMode::Inverted);
        let page = Page::new(0, 100.0, 100.0).with_annotation(translucent_highlight(0.5));

        let surface = paint_all(&PageCompositor::new(config), &page, &store);
        // Screen over black leaves the premultiplied highlight color, which is
        // not itself recolored.
        assert_eq!(surface.pixel(30, 15), Some(Rgba8::rgb(127, 127, 0)));
        assert_eq!(surface.pixel(30, 50), Some(Rgba8::BLACK));
    }

    #[test]
    fn test_inverted_white_page_is_black() {
        init_logging();
        let page = Page::new(0, 64.0, 48.0);
        let store = white_page_store(64, 48);
        let config = RenderConfig::new()
            .with_accessibility(true)
            .with_render_mode(RenderMode::Inverted);

        let surface = paint_all(&PageCompositor::new(config), &page, &store);
        for y in 0..48 {
            for x in 0..64 {
                assert_eq!(surface.pixel(x, y), Some(Rgba8::BLACK), "pixel {},{}", x, y);
            }
        }
    }

    #[test]
    fn test_missing_bitmap_yields_placeholder_only() {
        init_logging();
        let page = Page::new(7, 50.0, 50.0).with_highlight(HighlightSpan::new(
            Rgba8::YELLOW,
            NormalizedRect::FULL,
        ));
        let mut surface = Surface::new(50, 50, 1.0).expect("surface");
        let request = PaintRequest::new(Rect::new(0.0, 0.0, 50.0, 50.0), 1.0, PaintFlags::all());

        let outcome = PageCompositor::new(RenderConfig::default()).paint(
            &mut surface,
            &page,
            &InMemoryPixmapStore::new(),
            &request,
        );
        assert_eq!(outcome.pixmaps, PixmapDrawResult::NoPixmap);
        assert_eq!(outcome.annotations_drawn, 0);
        assert_eq!(surface.pixel(25, 25), Some(Rgba8::GRAY));
        assert_eq!(surface.pixel(25, 5), Some(Rgba8::WHITE));
    }

    #[test]
    fn test_closed_arrow_tip_is_segment_end() {
        let line = LineAnnotation {
            points: vec![NormalizedPoint::new(0.1, 0.5), NormalizedPoint::new(0.9, 0.5)],
            start_style: LineEndingStyle::None,
            end_style: LineEndingStyle::ClosedArrow,
            ..LineAnnotation::default()
        };
        let width = 2.0;
        let page_size = (100.0, 100.0);
        let painter = LineAnnotationPainter::new(
            &line,
            Pen::new(Rgba8::BLACK, width),
            page_size,
            1.0,
            Transform::identity(),
        );
        let shapes = painter.shapes();
        let (segment, arrow) = (&shapes[0], &shapes[1]);

        let size = (6.0 * width / page_size.0).min(0.8 / 2.0);
        assert!(arrow.closed);
        assert!((arrow.points[1].x - 0.9).abs() < 1e-12);
        assert!((arrow.points[1].y - 0.5).abs() < 1e-12);
        assert!((segment.points[1].x - (0.9 - size)).abs() < 1e-12);

        // Triangle of base `size` and height `size`.
        let p = &arrow.points;
        let area = ((p[1].x - p[0].x) * (p[2].y - p[0].y) - (p[2].x - p[0].x) * (p[1].y - p[0].y))
            .abs()
            / 2.0;
        assert!((area - size * size / 2.0).abs() < 1e-12);
    }
}

mod tiles {
    use super::*;

    fn colors() -> [Color; 4] {
        [
            Color::from_rgba8(255, 0, 0, 255),
            Color::from_rgba8(0, 255, 0, 255),
            Color::from_rgba8(0, 0, 255, 255),
            Color::from_rgba8(255, 255, 0, 255),
        ]
    }

    fn quadrant_bitmap() -> Pixmap {
        let mut pixmap = Pixmap::new(40, 40).expect("pixmap");
        for (i, color) in colors().iter().enumerate() {
            let (x, y) = ((i % 2) as f32 * 20.0, (i / 2) as f32 * 20.0);
            let mut paint = tiny_skia::Paint::default();
            paint.set_color(*color);
            let rect = tiny_skia::Rect::from_xywh(x, y, 20.0, 20.0).expect("rect");
            pixmap.fill_rect(rect, &paint, Transform::identity(), None);
        }
        pixmap
    }

    fn quadrant_tiles() -> Vec<Tile> {
        colors()
            .iter()
            .enumerate()
            .map(|(i, color)| {
                let (left, top) = ((i % 2) as f64 * 0.5, (i / 2) as f64 * 0.5);
                Tile {
                    rect: NormalizedRect::new(left, top, left + 0.5, top + 0.5),
                    bitmap: solid(20, 20, *color),
                }
            })
            .collect()
    }

    #[test]
    fn test_tile_grid_matches_whole_bitmap() {
        init_logging();
        let page = Page::new(0, 40.0, 40.0);
        let compositor = PageCompositor::new(RenderConfig::default());

        let mut whole = InMemoryPixmapStore::new();
        whole.insert_bitmap(0, quadrant_bitmap());
        let mut tiled = InMemoryPixmapStore::new();
        tiled.set_tiles(0, quadrant_tiles());

        let expected = paint_all(&compositor, &page, &whole);
        let stitched = paint_all(&compositor, &page, &tiled);
        assert_eq!(expected.pixmap().data(), stitched.pixmap().data());
    }

    #[test]
    fn test_partial_crop_across_seams() {
        let page = Page::new(0, 40.0, 40.0);
        let compositor = PageCompositor::new(RenderConfig::default());
        let mut tiled = InMemoryPixmapStore::new();
        tiled.set_tiles(0, quadrant_tiles());

        let mut surface = Surface::new(40, 40, 1.0).expect("surface");
        let request = PaintRequest::new(Rect::new(10.0, 10.0, 20.0, 20.0), 1.0, PaintFlags::empty());
        let outcome = compositor.paint(&mut surface, &page, &tiled, &request);

        assert_eq!(outcome.pixmaps, PixmapDrawResult::Fine);
        assert_eq!(surface.pixel(15, 15), Some(Rgba8::rgb(255, 0, 0)));
        assert_eq!(surface.pixel(25, 15), Some(Rgba8::rgb(0, 255, 0)));
        assert_eq!(surface.pixel(15, 25), Some(Rgba8::rgb(0, 0, 255)));
        assert_eq!(surface.pixel(25, 25), Some(Rgba8::rgb(255, 255, 0)));
        // Outside the crop nothing is touched.
        assert_eq!(surface.pixel(5, 5).map(|c| c.a), Some(0));
    }

    #[test]
    fn test_oversized_tile_is_rescaled() {
        let page = Page::new(0, 40.0, 40.0);
        let mut tiles = quadrant_tiles();
        tiles[0].bitmap = solid(30, 30, colors()[0]);
        let mut store = InMemoryPixmapStore::new();
        store.set_tiles(0, tiles);

        let mut surface = Surface::new(40, 40, 1.0).expect("surface");
        let request = PaintRequest::new(Rect::new(0.0, 0.0, 40.0, 40.0), 1.0, PaintFlags::empty());
        let outcome = PageCompositor::new(RenderConfig::default()).paint(
            &mut surface,
            &page,
            &store,
            &request,
        );
        assert_eq!(outcome.pixmaps, PixmapDrawResult::PixmapsOfIncorrectSize);
        assert_eq!(surface.pixel(10, 10), Some(Rgba8::rgb(255, 0, 0)));
    }
}

mod accessibility {
    use super::*;

    #[test]
    fn test_mode_ignored_without_flag() {
        let page = Page::new(0, 20.0, 20.0);
        let store = white_page_store(20, 20);
        let config = RenderConfig::new()
            .with_accessibility(true)
            .with_render_mode(RenderMode::Inverted);

        let mut surface = Surface::new(20, 20, 1.0).expect("surface");
        let request = PaintRequest::new(
            Rect::new(0.0, 0.0, 20.0, 20.0),
            1.0,
            PaintFlags::all() - PaintFlags::ACCESSIBILITY,
        );
        PageCompositor::new(config).paint(&mut surface, &page, &store, &request);
        assert_eq!(surface.pixel(10, 10), Some(Rgba8::WHITE));
    }

    #[test]
    fn test_paper_mode_only_changes_background() {
        let paper = Rgba8::rgb(250, 240, 200);
        let page = Page::new(0, 20.0, 20.0);
        let mut store = InMemoryPixmapStore::new();
        // A transparent page raster shows the background through.
        store.insert_bitmap(0, solid(20, 20, Color::from_rgba8(0, 0, 0, 0)));
        let config = RenderConfig::new()
            .with_accessibility(true)
            .with_render_mode(RenderMode::Paper)
            .with_paper_color(paper);

        let surface = paint_all(&PageCompositor::new(config), &page, &store);
        assert_eq!(surface.pixel(10, 10), Some(paper));
    }

    #[test]
    fn test_highlight_screens_on_black_background() {
        let span = HighlightSpan::new(Rgba8::rgb(0, 0, 255), NormalizedRect::new(0.25, 0.25, 0.75, 0.75));
        let page = Page::new(0, 40.0, 40.0).with_highlight(span);
        let store = white_page_store(40, 40);
        let config = RenderConfig::new()
            .with_accessibility(true)
            .with_render_mode(RenderMode::Inverted);

        let surface = paint_all(&PageCompositor::new(config), &page, &store);
        // Screen of blue over the inverted (black) page keeps the highlight visible.
        assert_eq!(surface.pixel(20, 20), Some(Rgba8::rgb(0, 0, 255)));
        assert_eq!(surface.pixel(5, 5), Some(Rgba8::BLACK));
    }

    #[test]
    fn test_recolor_limited_to_painted_region() {
        let page = Page::new(0, 40.0, 20.0);
        let store = white_page_store(40, 20);
        let config = RenderConfig::new()
            .with_accessibility(true)
            .with_render_mode(RenderMode::Inverted);
        let compositor = PageCompositor::new(config);

        let mut surface = Surface::from_pixmap(solid(40, 20, Color::WHITE), 1.0);
        let request = PaintRequest::new(Rect::new(0.0, 0.0, 20.0, 20.0), 1.0, PaintFlags::all());
        compositor.paint(&mut surface, &page, &store, &request);

        assert_eq!(surface.pixel(10, 10), Some(Rgba8::BLACK));
        assert_eq!(surface.pixel(30, 10), Some(Rgba8::WHITE));
    }
}

mod configuration {
    use super::*;

    #[test]
    fn test_config_from_json_drives_compositor() {
        let json = r#"{
            "accessibility_enabled": true,
            "render_mode": "BlackWhite",
            "bw_contrast": 6,
            "bw_threshold": 200
        }"#;
        let config = RenderConfig::from_json(json).expect("valid config");
        let compositor = PageCompositor::new(config);
        assert_eq!(compositor.config().effective_mode(), RenderMode::BlackWhite);
        assert!(compositor.config().recolors_page());
    }

    #[test]
    fn test_invalid_config_rejected() {
        assert!(RenderConfig::from_json(r#"{ "bw_contrast": 9 }"#).is_err());
        assert!(RenderConfig::from_json("not json").is_err());
    }

    #[test]
    fn test_hidpi_paint_covers_device_pixels() {
        let page = Page::new(0, 20.0, 10.0);
        let store = white_page_store(40, 20);
        let mut surface = Surface::new(40, 20, 2.0).expect("surface");
        let request = PaintRequest::new(Rect::new(0.0, 0.0, 20.0, 10.0), 1.0, PaintFlags::all());

        let outcome = PageCompositor::new(RenderConfig::default()).paint(
            &mut surface,
            &page,
            &store,
            &request,
        );
        assert_eq!(outcome.pixmaps, PixmapDrawResult::Fine);
        assert_eq!(surface.pixel(39, 19), Some(Rgba8::WHITE));
    }
}
