//! Drawing context shared by the compositing stages.
//!
//! A [`Canvas`] wraps the raster being painted (the caller's surface or the
//! intermediate buffer) and knows where the page lands inside it. Two
//! coordinate systems are accepted:
//!
//! - page-device: device pixels with the page's top-left corner at the origin
//! - page-normalized: `[0,1]` over the page
//!
//! Every draw is clipped to the painting limits.

use tiny_skia::{
    FillRule, FilterQuality, Mask, Path, PathBuilder, Pixmap, PixmapPaint, PixmapRef, Transform,
};

use super::path_rasterizer::{CompositionMode, Pen, RasterTarget};
use super::{create_fill_paint, create_stroke_paint};
use crate::annotation_types::Rgba8;
use crate::geometry::PixelRect;

pub(crate) struct Canvas<'a> {
    pixmap: &'a mut Pixmap,
    clip: Option<Mask>,
    dpr: f64,
    /// Position of the page-device origin inside `pixmap`
    origin: (i32, i32),
    /// Painting limits in page-device pixels
    limits: PixelRect,
    /// Page size in device pixels before rounding
    page_size: (f64, f64),
}

impl<'a> Canvas<'a> {
    /// `limits` must lie inside `pixmap` once moved by `origin`.
    pub(crate) fn new(
        pixmap: &'a mut Pixmap,
        dpr: f64,
        origin: (i32, i32),
        limits: PixelRect,
        page_size: (f64, f64),
    ) -> Self {
        let bounds = PixelRect::new(0, 0, pixmap.width() as i32, pixmap.height() as i32);
        let clip_rect = limits.translated(origin.0, origin.1);
        let clip = if clip_rect == bounds {
            None
        } else {
            build_clip(pixmap.width(), pixmap.height(), &clip_rect)
        };
        Self {
            pixmap,
            clip,
            dpr,
            origin,
            limits,
            page_size,
        }
    }

    pub(crate) fn dpr(&self) -> f64 {
        self.dpr
    }

    pub(crate) fn limits(&self) -> PixelRect {
        self.limits
    }

    /// Page size in device pixels before rounding.
    pub(crate) fn page_size(&self) -> (f64, f64) {
        self.page_size
    }

    /// Page-device to raster pixels.
    pub(crate) fn device_transform(&self) -> Transform {
        Transform::from_translate(self.origin.0 as f32, self.origin.1 as f32)
    }

    /// Page-normalized to raster-normalized coordinates, for shape drawing.
    pub(crate) fn normalized_transform(&self) -> Transform {
        let w = self.pixmap.width() as f64;
        let h = self.pixmap.height() as f64;
        Transform::from_row(
            (self.page_size.0 / w) as f32,
            0.0,
            0.0,
            (self.page_size.1 / h) as f32,
            (self.origin.0 as f64 / w) as f32,
            (self.origin.1 as f64 / h) as f32,
        )
    }

    /// Shape rasterizer target over the whole raster, clipped to the limits.
    pub(crate) fn target(&mut self) -> RasterTarget<'_> {
        RasterTarget {
            pixmap: &mut *self.pixmap,
            device_pixel_ratio: self.dpr as f32,
            clip: self.clip.as_ref(),
        }
    }

    /// Fill a page-device rectangle.
    pub(crate) fn fill_rect(&mut self, rect: &PixelRect, color: Rgba8, mode: CompositionMode) {
        let Some(r) = rect.to_rect() else {
            return;
        };
        let paint = create_fill_paint(color, mode);
        let transform = self.device_transform();
        self.pixmap
            .fill_rect(r, &paint, transform, self.clip.as_ref());
    }

    /// Fill a path given in the coordinates `transform` maps to raster pixels.
    pub(crate) fn fill_path(
        &mut self,
        path: &Path,
        color: Rgba8,
        mode: CompositionMode,
        transform: Transform,
    ) {
        let paint = create_fill_paint(color, mode);
        self.pixmap.fill_path(
            path,
            &paint,
            FillRule::Winding,
            transform,
            self.clip.as_ref(),
        );
    }

    /// Stroke a path; the pen width is in the units of `transform`'s source space.
    pub(crate) fn stroke_path(
        &mut self,
        path: &Path,
        pen: &Pen,
        mode: CompositionMode,
        transform: Transform,
    ) {
        let paint = create_stroke_paint(pen, mode);
        self.pixmap.stroke_path(
            path,
            &paint,
            &pen.to_stroke(1.0),
            transform,
            self.clip.as_ref(),
        );
    }

    /// Draw a raster whose pixel grid maps to page-device space through `transform`.
    pub(crate) fn draw_pixmap(&mut self, src: PixmapRef<'_>, transform: Transform, opacity: f32) {
        let exact = transform.sx == 1.0
            && transform.sy == 1.0
            && transform.kx == 0.0
            && transform.ky == 0.0
            && transform.tx.fract() == 0.0
            && transform.ty.fract() == 0.0;
        let paint = PixmapPaint {
            opacity,
            quality: if exact {
                FilterQuality::Nearest
            } else {
                FilterQuality::Bilinear
            },
            ..PixmapPaint::default()
        };
        let transform = self.device_transform().pre_concat(transform);
        self.pixmap
            .draw_pixmap(0, 0, src, &paint, transform, self.clip.as_ref());
    }
}

fn build_clip(width: u32, height: u32, rect: &PixelRect) -> Option<Mask> {
    let mut mask = Mask::new(width, height)?;
    let path = PathBuilder::from_rect(rect.to_rect()?);
    mask.fill_path(&path, FillRule::Winding, false, Transform::identity());
    Some(mask)
}
