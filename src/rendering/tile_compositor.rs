//! Tile compositor - stitches tiles or scales the nearest page bitmap.
//!
//! Nothing here waits for a raster: whatever the provider holds when asked is
//! drawn, and a missing or unusable bitmap is reported as
//! [`PixmapDrawResult::NoPixmap`] so the caller can draw a placeholder.

use tiny_skia::{Pixmap, Transform};

use super::canvas::Canvas;
use super::recolor::Recolorer;
use crate::config::CompositorLimits;
use crate::geometry::{NormalizedRect, PixelRect};
use crate::page::{PageHandle, PixmapProvider, Tile};

/// Outcome of drawing the page raster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PixmapDrawResult {
    /// Every raster matched its expected size
    #[default]
    Fine,
    /// At least one raster was rescaled
    PixmapsOfIncorrectSize,
    /// No usable raster; nothing was drawn
    NoPixmap,
}

impl PixmapDrawResult {
    /// The worse of two results.
    pub fn combine(self, other: PixmapDrawResult) -> PixmapDrawResult {
        use PixmapDrawResult::*;
        match (self, other) {
            (NoPixmap, _) | (_, NoPixmap) => NoPixmap,
            (PixmapsOfIncorrectSize, _) | (_, PixmapsOfIncorrectSize) => PixmapsOfIncorrectSize,
            _ => Fine,
        }
    }
}

/// Rasters selected for one paint call, borrowed from the provider.
pub(crate) enum PageSource<'p> {
    /// Tiles overlapping the visible area
    Tiles(Vec<&'p Tile>),
    /// One whole-page bitmap
    Bitmap(&'p Pixmap),
}

/// Selects and draws page rasters.
#[derive(Debug, Clone, Default)]
pub struct TileCompositor {
    limits: CompositorLimits,
}

impl TileCompositor {
    /// Create a compositor with the given thresholds.
    pub fn new(limits: CompositorLimits) -> Self {
        Self { limits }
    }

    /// Draw the part of the page covering `visible` into `target`.
    ///
    /// `page_size` is the page size in device pixels and `visible` a rectangle in
    /// that space; `target` holds exactly the visible rectangle. When the result
    /// is [`PixmapDrawResult::NoPixmap`] the target is left untouched.
    pub fn composite(
        &self,
        target: &mut Pixmap,
        provider: &dyn PixmapProvider,
        page: PageHandle,
        page_size: (i32, i32),
        visible: &PixelRect,
        recolorer: Option<&Recolorer>,
    ) -> PixmapDrawResult {
        let Some(source) = self.resolve(provider, page, page_size, visible) else {
            return PixmapDrawResult::NoPixmap;
        };
        let mut canvas = Canvas::new(
            target,
            1.0,
            (-visible.x, -visible.y),
            *visible,
            (page_size.0 as f64, page_size.1 as f64),
        );
        self.draw(&mut canvas, &source, page_size, recolorer)
    }

    /// Pick the rasters to draw, `None` when there is nothing usable.
    pub(crate) fn resolve<'p>(
        &self,
        provider: &'p dyn PixmapProvider,
        page: PageHandle,
        page_size: (i32, i32),
        visible: &PixelRect,
    ) -> Option<PageSource<'p>> {
        if provider.has_tiles(page) {
            let area = NormalizedRect::from_pixel_rect(visible, page_size.0, page_size.1);
            return Some(PageSource::Tiles(provider.tiles_intersecting(page, &area)));
        }

        let (width, height) = (page_size.0.max(0) as u32, page_size.1.max(0) as u32);
        let Some(bitmap) = provider.nearest_bitmap(page, width, height) else {
            log::debug!("No bitmap for page {} at {}x{}", page, width, height);
            return None;
        };
        if !self.is_usable(bitmap, page_size.0) {
            log::debug!(
                "Bitmap {}x{} of page {} unusable for width {}",
                bitmap.width(),
                bitmap.height(),
                page,
                page_size.0
            );
            return None;
        }
        Some(PageSource::Bitmap(bitmap))
    }

    fn is_usable(&self, bitmap: &Pixmap, target_width: i32) -> bool {
        let ratio = target_width as f64 / bitmap.width() as f64;
        let pixels = bitmap.width() as u64 * bitmap.height() as u64;
        let upscaling = target_width as u32 > bitmap.width();
        !(ratio > self.limits.max_upscale_ratio
            || ratio < self.limits.min_downscale_ratio
            || (upscaling && pixels > self.limits.max_upscale_source_pixels))
    }

    pub(crate) fn draw(
        &self,
        canvas: &mut Canvas<'_>,
        source: &PageSource<'_>,
        page_size: (i32, i32),
        recolorer: Option<&Recolorer>,
    ) -> PixmapDrawResult {
        match source {
            PageSource::Bitmap(bitmap) => self.draw_bitmap(canvas, bitmap, page_size, recolorer),
            PageSource::Tiles(tiles) => tiles.iter().fold(PixmapDrawResult::Fine, |result, tile| {
                result.combine(self.draw_tile(canvas, tile, page_size, recolorer))
            }),
        }
    }

    fn draw_bitmap(
        &self,
        canvas: &mut Canvas<'_>,
        bitmap: &Pixmap,
        page_size: (i32, i32),
        recolorer: Option<&Recolorer>,
    ) -> PixmapDrawResult {
        if bitmap.width() as i32 == page_size.0 && bitmap.height() as i32 == page_size.1 {
            draw_with_color_mode(canvas, bitmap, Transform::identity(), recolorer);
            return PixmapDrawResult::Fine;
        }
        // Component-wise: some bitmaps come with a slightly wrong aspect ratio.
        let sx = page_size.0 as f32 / bitmap.width() as f32;
        let sy = page_size.1 as f32 / bitmap.height() as f32;
        log::debug!(
            "Scaling bitmap {}x{} to {}x{}",
            bitmap.width(),
            bitmap.height(),
            page_size.0,
            page_size.1
        );
        draw_with_color_mode(canvas, bitmap, Transform::from_scale(sx, sy), recolorer);
        PixmapDrawResult::PixmapsOfIncorrectSize
    }

    fn draw_tile(
        &self,
        canvas: &mut Canvas<'_>,
        tile: &Tile,
        page_size: (i32, i32),
        recolorer: Option<&Recolorer>,
    ) -> PixmapDrawResult {
        let geometry = tile.rect.geometry(page_size.0, page_size.1);
        // Round up so neighbouring tiles never leave a gap.
        let should = (
            (page_size.0 as f64 * tile.rect.width() - 1e-6).ceil() as i32,
            (page_size.1 as f64 * tile.rect.height() - 1e-6).ceil() as i32,
        );
        let is = (tile.bitmap.width() as i32, tile.bitmap.height() as i32);
        let tolerance = self.limits.tile_size_tolerance;

        let position = Transform::from_translate(geometry.x as f32, geometry.y as f32);
        if (is.0 - should.0).abs() > tolerance || (is.1 - should.1).abs() > tolerance {
            log::debug!(
                "Tile at {:?} is {}x{}, expected {}x{}",
                geometry,
                is.0,
                is.1,
                should.0,
                should.1
            );
            let scale = Transform::from_scale(
                should.0 as f32 / is.0.max(1) as f32,
                should.1 as f32 / is.1.max(1) as f32,
            );
            draw_with_color_mode(canvas, &tile.bitmap, position.pre_concat(scale), recolorer);
            PixmapDrawResult::PixmapsOfIncorrectSize
        } else {
            draw_with_color_mode(canvas, &tile.bitmap, position, recolorer);
            PixmapDrawResult::Fine
        }
    }
}

/// Draw `pixmap` placed by `placement` (pixmap pixels to page-device), recoloring
/// only the part that lands inside the painting limits.
fn draw_with_color_mode(
    canvas: &mut Canvas<'_>,
    pixmap: &Pixmap,
    placement: Transform,
    recolorer: Option<&Recolorer>,
) {
    let Some(recolorer) = recolorer.filter(|r| r.is_active()) else {
        canvas.draw_pixmap(pixmap.as_ref(), placement, 1.0);
        return;
    };

    let Some(part) = visible_part(canvas.limits(), pixmap, &placement) else {
        return;
    };
    let Some(mut image) = part.to_int_rect().and_then(|r| pixmap.clone_rect(r)) else {
        return;
    };
    recolorer.apply_to_pixmap(&mut image);
    let offset = Transform::from_translate(part.x as f32, part.y as f32);
    canvas.draw_pixmap(image.as_ref(), placement.pre_concat(offset), 1.0);
}

/// Pixmap pixels that map into `limits`, `None` when nothing is visible.
fn visible_part(limits: PixelRect, pixmap: &Pixmap, placement: &Transform) -> Option<PixelRect> {
    let sx = placement.sx as f64;
    let sy = placement.sy as f64;
    if sx <= 0.0 || sy <= 0.0 {
        return None;
    }
    let left = (limits.x as f64 - placement.tx as f64) / sx;
    let top = (limits.y as f64 - placement.ty as f64) / sy;
    let right = (limits.right() as f64 - placement.tx as f64) / sx;
    let bottom = (limits.bottom() as f64 - placement.ty as f64) / sy;
    let mapped = PixelRect::from_ltrb(
        left.floor() as i32,
        top.floor() as i32,
        right.ceil() as i32,
        bottom.ceil() as i32,
    );
    mapped.intersect(&PixelRect::new(0, 0, pixmap.width() as i32, pixmap.height() as i32))
}
