//! Page store model and the pixmap provider seam.
//!
//! The compositor reads a [`Page`] (geometry, annotations, highlights, object
//! regions) and borrows finished rasters from a [`PixmapProvider`]. Both are
//! owned elsewhere and only read during a paint call.

use std::collections::HashMap;

use tiny_skia::Pixmap;

use crate::annotation_types::Rgba8;
use crate::annotations::Annotation;
use crate::geometry::{NormalizedPoint, NormalizedRect};

/// Identifies a page towards the pixmap provider.
pub type PageHandle = usize;

/// One rectangle of a search highlight or of the text selection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HighlightSpan {
    /// Fill color
    pub color: Rgba8,
    /// Covered area
    pub rect: NormalizedRect,
}

impl HighlightSpan {
    /// Create a new span.
    pub fn new(color: Rgba8, rect: NormalizedRect) -> Self {
        Self { color, rect }
    }
}

/// Classification of an interactive page object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectKind {
    /// Hyperlink or other action
    Link,
    /// Embedded image
    Image,
    /// Annotation hit area
    Annotation,
    /// Source reference (synctex style)
    SourceRef,
}

/// An interactive object area with its outline polygon.
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectRect {
    /// Object classification
    pub kind: ObjectKind,
    /// Closed outline in normalized page coordinates
    pub region: Vec<NormalizedPoint>,
}

impl ObjectRect {
    /// Object whose region is an axis-aligned rectangle.
    pub fn from_rect(kind: ObjectKind, rect: &NormalizedRect) -> Self {
        Self {
            kind,
            region: vec![
                NormalizedPoint::new(rect.left, rect.top),
                NormalizedPoint::new(rect.right, rect.top),
                NormalizedPoint::new(rect.right, rect.bottom),
                NormalizedPoint::new(rect.left, rect.bottom),
            ],
        }
    }

    /// Bounding rectangle of the region.
    pub fn bounding_rect(&self) -> NormalizedRect {
        let mut iter = self.region.iter();
        let Some(first) = iter.next() else {
            return NormalizedRect::default();
        };
        iter.fold(NormalizedRect::new(first.x, first.y, first.x, first.y), |r, p| {
            NormalizedRect::new(
                r.left.min(p.x),
                r.top.min(p.y),
                r.right.max(p.x),
                r.bottom.max(p.y),
            )
        })
    }
}

/// Read-only view of one page of the page store.
#[derive(Debug, Clone)]
pub struct Page {
    /// Handle used with the pixmap provider
    pub number: PageHandle,
    /// Width in page pixels at scale 1.0
    pub width: f64,
    /// Height in page pixels at scale 1.0
    pub height: f64,
    /// Annotations in paint order
    pub annotations: Vec<Annotation>,
    /// Search and user highlights
    pub highlights: Vec<HighlightSpan>,
    /// Active text selection, if any
    pub text_selection: Option<Vec<NormalizedRect>>,
    /// Fill color of the text selection
    pub text_selection_color: Rgba8,
    /// Link, image and other object areas
    pub object_rects: Vec<ObjectRect>,
}

impl Page {
    /// Create an empty page.
    pub fn new(number: PageHandle, width: f64, height: f64) -> Self {
        Self {
            number,
            width,
            height,
            annotations: Vec::new(),
            highlights: Vec::new(),
            text_selection: None,
            text_selection_color: Rgba8::rgb(48, 140, 198),
            object_rects: Vec::new(),
        }
    }

    /// Height over width.
    pub fn aspect_ratio(&self) -> f64 {
        self.height / self.width
    }

    /// Add an annotation.
    pub fn with_annotation(mut self, annotation: Annotation) -> Self {
        self.annotations.push(annotation);
        self
    }

    /// Add a highlight span.
    pub fn with_highlight(mut self, span: HighlightSpan) -> Self {
        self.highlights.push(span);
        self
    }

    /// Set the text selection.
    pub fn with_text_selection(mut self, rects: Vec<NormalizedRect>, color: Rgba8) -> Self {
        self.text_selection = Some(rects);
        self.text_selection_color = color;
        self
    }

    /// Add an object area.
    pub fn with_object_rect(mut self, object: ObjectRect) -> Self {
        self.object_rects.push(object);
        self
    }
}

/// A provider-owned sub-bitmap of a page.
#[derive(Debug, Clone)]
pub struct Tile {
    /// Page area covered by the tile
    pub rect: NormalizedRect,
    /// Rendered pixels
    pub bitmap: Pixmap,
}

/// Source of already rendered page rasters.
///
/// Implementations never block: whatever is available when the compositor asks
/// is returned, and the borrowed rasters stay valid for the current paint call.
pub trait PixmapProvider {
    /// Whether the page is rendered as a tile set rather than one bitmap.
    fn has_tiles(&self, page: PageHandle) -> bool;

    /// Tiles that overlap `rect`.
    fn tiles_intersecting(&self, page: PageHandle, rect: &NormalizedRect) -> Vec<&Tile>;

    /// Whole-page bitmap whose size is closest to `width`×`height`.
    fn nearest_bitmap(&self, page: PageHandle, width: u32, height: u32) -> Option<&Pixmap>;
}

#[derive(Debug, Default)]
struct PageRasters {
    bitmaps: Vec<Pixmap>,
    tiles: Option<Vec<Tile>>,
}

/// In-memory [`PixmapProvider`] keyed by page handle.
#[derive(Debug, Default)]
pub struct InMemoryPixmapStore {
    pages: HashMap<PageHandle, PageRasters>,
}

impl InMemoryPixmapStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a whole-page bitmap.
    pub fn insert_bitmap(&mut self, page: PageHandle, bitmap: Pixmap) {
        self.pages.entry(page).or_default().bitmaps.push(bitmap);
    }

    /// Replace the tile set of a page.
    pub fn set_tiles(&mut self, page: PageHandle, tiles: Vec<Tile>) {
        self.pages.entry(page).or_default().tiles = Some(tiles);
    }

    /// Drop every raster of a page.
    pub fn invalidate(&mut self, page: PageHandle) {
        self.pages.remove(&page);
    }
}

impl PixmapProvider for InMemoryPixmapStore {
    fn has_tiles(&self, page: PageHandle) -> bool {
        self.pages
            .get(&page)
            .is_some_and(|p| p.tiles.is_some())
    }

    fn tiles_intersecting(&self, page: PageHandle, rect: &NormalizedRect) -> Vec<&Tile> {
        self.pages
            .get(&page)
            .and_then(|p| p.tiles.as_ref())
            .map(|tiles| tiles.iter().filter(|t| t.rect.intersects(rect)).collect())
            .unwrap_or_default()
    }

    fn nearest_bitmap(&self, page: PageHandle, width: u32, height: u32) -> Option<&Pixmap> {
        let wanted = width as i64 * height as i64;
        self.pages.get(&page)?.bitmaps.iter().min_by_key(|b| {
            let pixels = b.width() as i64 * b.height() as i64;
            (pixels - wanted).abs()
        })
    }
}
