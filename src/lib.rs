// Allow some clippy lints that are too pedantic for this project
#![allow(clippy::too_many_arguments)]
#![allow(clippy::needless_range_loop)]
// Allow unused for tests
#![cfg_attr(test, allow(dead_code))]

//! # Page Oxide
//!
//! Page compositor for document viewers, in pure Rust on top of `tiny-skia`.
//!
//! The crate does not render documents. It takes page rasters that a renderer
//! already produced (whole-page bitmaps or tile sets) and paints the visible
//! part of a page for one view: stitched and scaled, optionally recolored for
//! accessibility, with highlights, the text selection and annotations on top.
//!
//! ## Core Features
//!
//! - **Tile compositing**: stitches tiles or scales the nearest whole-page bitmap,
//!   with a placeholder when nothing usable exists
//! - **Accessibility color modes**: inversion, paper color, dark/light recoloring,
//!   black & white, lightness and luma inversion with preserved hue, hue rotation
//! - **Annotation overlays**: inline and linked text, lines with end decorations,
//!   squares and ellipses, markup highlights, stamps and freehand ink
//! - **Correct blending**: highlights multiply onto the page (screen on dark
//!   backgrounds) through an intermediate image
//!
//! ## Quick Start
//!
//! ```
//! use page_oxide::{InMemoryPixmapStore, Page, PageCompositor, PaintFlags, PaintRequest, Rect};
//! use page_oxide::{RenderConfig, RenderMode, Surface};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut store = InMemoryPixmapStore::new();
//! let mut bitmap = tiny_skia::Pixmap::new(200, 100).ok_or("allocation failed")?;
//! bitmap.fill(tiny_skia::Color::WHITE);
//! store.insert_bitmap(0, bitmap);
//!
//! let config = RenderConfig::new()
//!     .with_accessibility(true)
//!     .with_render_mode(RenderMode::Inverted);
//! let compositor = PageCompositor::new(config);
//!
//! let page = Page::new(0, 200.0, 100.0);
//! let mut surface = Surface::new(200, 100, 1.0)?;
//! let request = PaintRequest::new(Rect::new(0.0, 0.0, 200.0, 100.0), 1.0, PaintFlags::all());
//! compositor.paint(&mut surface, &page, &store, &request);
//!
//! assert_eq!(surface.pixel(50, 50).map(|c| (c.r, c.g, c.b)), Some((0, 0, 0)));
//! # Ok(())
//! # }
//! ```
//!
//! ## License
//!
//! Licensed under either of:
//!
//! * Apache License, Version 2.0 ([LICENSE-APACHE](LICENSE-APACHE) or <http://www.apache.org/licenses/LICENSE-2.0>)
//! * MIT license ([LICENSE-MIT](LICENSE-MIT) or <http://opensource.org/licenses/MIT>)
//!
//! at your option.

#![warn(missing_docs)]
#![cfg_attr(docsrs, feature(doc_cfg))]

// Error handling
pub mod error;

// Configuration snapshot
pub mod config;

// Coordinates
pub mod geometry;

// Page store model
/// Colors, line endings, markup kinds and annotation flags
pub mod annotation_types;
pub mod annotations;
pub mod page;

// Compositing
pub mod rendering;

// Re-exports
pub use annotation_types::{
    AnnotationFlags, GeometricShape, LineEndingStyle, LineStyle, Rgba8, TextAlignment,
    TextMarkupType,
};
pub use annotations::{Annotation, AnnotationKind, AnnotationStyle};
pub use config::{CompositorLimits, RenderConfig, RenderMode};
pub use error::{Error, Result};
pub use geometry::{NormalizedPoint, NormalizedRect, PixelRect, Rect};
pub use page::{InMemoryPixmapStore, Page, PixmapProvider, Tile};
pub use rendering::{
    AssetCache, PageCompositor, PaintFlags, PaintOutcome, PaintRequest, PixmapDrawResult, Surface,
};

// Version info
/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
