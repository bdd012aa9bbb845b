//! Page compositing on top of pre-rasterized page bitmaps.
//!
//! This module turns finished page rasters plus overlay objects into the pixels
//! shown for one page, using the pure-Rust `tiny-skia` library.
//!
//! ## Architecture
//!
//! The compositing pipeline, in fixed order:
//!
//! 1. Fill the painting limits with the background of the active color mode
//! 2. Stitch tiles or scale the nearest whole-page bitmap ([`TileCompositor`])
//! 3. Recolor the visible part of the page image ([`recolor`])
//! 4. Draw highlights and the text selection
//! 5. Draw annotations ([`AnnotationOverlayRenderer`])
//! 6. Outline link and image areas
//! 7. Draw the viewport marker
//!
//! [`PageCompositor`] is the entry point that runs these stages.
//!
//! ## Example
//!
//! ```
//! use page_oxide::config::RenderConfig;
//! use page_oxide::geometry::Rect;
//! use page_oxide::page::{InMemoryPixmapStore, Page};
//! use page_oxide::rendering::{PageCompositor, PaintFlags, PaintRequest, PixmapDrawResult, Surface};
//!
//! let mut store = InMemoryPixmapStore::new();
//! store.insert_bitmap(0, tiny_skia::Pixmap::new(100, 50).unwrap());
//!
//! let page = Page::new(0, 100.0, 50.0);
//! let mut surface = Surface::new(100, 50, 1.0).unwrap();
//! let compositor = PageCompositor::new(RenderConfig::default());
//! let request = PaintRequest::new(Rect::new(0.0, 0.0, 100.0, 50.0), 1.0, PaintFlags::all());
//!
//! let outcome = compositor.paint(&mut surface, &page, &store, &request);
//! assert_eq!(outcome.pixmaps, PixmapDrawResult::Fine);
//! ```

mod annotation_painter;
mod assets;
mod canvas;
mod line_painter;
mod page_painter;
mod path_rasterizer;
pub mod recolor;
mod text_rasterizer;
mod tile_compositor;

pub use annotation_painter::{AnnotationBatches, AnnotationOverlayRenderer};
pub use assets::AssetCache;
pub use line_painter::{LineAnnotationPainter, LineShape, LineShapeKind};
pub use page_painter::{PageCompositor, PaintFlags, PaintOutcome, PaintRequest, Surface};
pub use path_rasterizer::{CompositionMode, Pen, RasterTarget, ShapeRasterizer, ShapeStyle};
pub use text_rasterizer::{TextLayout, TextRasterizer};
pub use tile_compositor::{PixmapDrawResult, TileCompositor};

use crate::annotation_types::Rgba8;
use tiny_skia::Paint;

/// Create a Paint configured for fill operations.
pub(crate) fn create_fill_paint(color: Rgba8, mode: CompositionMode) -> Paint<'static> {
    let mut paint = Paint::default();
    paint.set_color(color.to_skia());
    paint.anti_alias = true;
    paint.blend_mode = mode.blend_mode();
    paint
}

/// Create a Paint configured for stroke operations.
///
/// Hairlines are drawn aliased so they land on whole device pixels.
pub(crate) fn create_stroke_paint(pen: &Pen, mode: CompositionMode) -> Paint<'static> {
    let mut paint = create_fill_paint(pen.color, mode);
    paint.anti_alias = !pen.is_hairline();
    paint
}
