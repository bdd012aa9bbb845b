//! Icon assets: the busy placeholder, linked text annotation icons and stamps.
//!
//! Assets are registered as encoded image bytes when the compositor is built and
//! decoded the first time they are drawn. Each asset is decoded at most once.

use std::collections::HashMap;
use std::sync::OnceLock;

use tiny_skia::{FilterQuality, Pixmap, PixmapPaint, Transform};

use crate::annotation_types::Rgba8;
use crate::error::{Error, Result};

/// Encoded image plus its decoded form once requested.
#[derive(Debug)]
struct Asset {
    bytes: Vec<u8>,
    decoded: OnceLock<Option<Pixmap>>,
}

impl Asset {
    fn encoded(bytes: Vec<u8>) -> Result<Self> {
        image::guess_format(&bytes)?;
        Ok(Self {
            bytes,
            decoded: OnceLock::new(),
        })
    }

    fn ready(pixmap: Pixmap) -> Self {
        Self {
            bytes: Vec::new(),
            decoded: OnceLock::from(Some(pixmap)),
        }
    }

    fn pixmap(&self) -> Option<&Pixmap> {
        self.decoded
            .get_or_init(|| match decode_pixmap(&self.bytes) {
                Ok(pixmap) => Some(pixmap),
                Err(e) => {
                    log::warn!("Dropping undecodable icon asset: {}", e);
                    None
                },
            })
            .as_ref()
    }
}

/// Decode PNG/JPEG/TIFF bytes into a premultiplied pixmap.
pub(crate) fn decode_pixmap(bytes: &[u8]) -> Result<Pixmap> {
    let img = image::load_from_memory(bytes)?;
    let rgba = img.to_rgba8();
    let (width, height) = (rgba.width(), rgba.height());

    let mut data = rgba.into_raw();
    for px in data.chunks_exact_mut(4) {
        let a = px[3] as u32;
        for c in &mut px[..3] {
            *c = ((*c as u32 * a + 127) / 255) as u8;
        }
    }
    tiny_skia::IntSize::from_wh(width, height)
        .and_then(|size| Pixmap::from_vec(data, size))
        .ok_or(Error::SurfaceAllocation { width, height })
}

/// Scale a pixmap to exactly `width`×`height`.
pub(crate) fn scaled(src: &Pixmap, width: u32, height: u32) -> Option<Pixmap> {
    let mut out = Pixmap::new(width.max(1), height.max(1))?;
    if src.width() == out.width() && src.height() == out.height() {
        return Some(src.clone());
    }
    let paint = PixmapPaint {
        quality: FilterQuality::Bicubic,
        ..PixmapPaint::default()
    };
    let transform = Transform::from_scale(
        out.width() as f32 / src.width() as f32,
        out.height() as f32 / src.height() as f32,
    );
    out.draw_pixmap(0, 0, src.as_ref(), &paint, transform, None);
    Some(out)
}

/// Icons used by the compositor, injected at construction.
#[derive(Debug, Default)]
pub struct AssetCache {
    busy_icon: Option<Asset>,
    text_icons: HashMap<String, Asset>,
    stamps: HashMap<String, Asset>,
}

impl AssetCache {
    /// Create an empty cache. Without a busy icon the placeholder is a cross.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the placeholder drawn while a page has no bitmap.
    pub fn with_busy_icon(mut self, bytes: Vec<u8>) -> Result<Self> {
        self.busy_icon = Some(Asset::encoded(bytes)?);
        Ok(self)
    }

    /// Register the placeholder from ready pixels.
    pub fn with_busy_pixmap(mut self, pixmap: Pixmap) -> Self {
        self.busy_icon = Some(Asset::ready(pixmap));
        self
    }

    /// Register a linked text annotation icon ("Note", "Comment", ...).
    pub fn register_text_icon(&mut self, name: impl Into<String>, bytes: Vec<u8>) -> Result<()> {
        self.text_icons.insert(name.into(), Asset::encoded(bytes)?);
        Ok(())
    }

    /// Register a stamp icon ("Approved", "Draft", ...).
    pub fn register_stamp(&mut self, name: impl Into<String>, bytes: Vec<u8>) -> Result<()> {
        self.stamps.insert(name.into(), Asset::encoded(bytes)?);
        Ok(())
    }

    /// Register a stamp from ready pixels.
    pub fn register_stamp_pixmap(&mut self, name: impl Into<String>, pixmap: Pixmap) {
        self.stamps.insert(name.into(), Asset::ready(pixmap));
    }

    /// Placeholder icon at its natural size.
    pub fn busy_icon(&self) -> Option<&Pixmap> {
        self.busy_icon.as_ref().and_then(Asset::pixmap)
    }

    /// Decoded stamp at its natural size.
    pub fn stamp(&self, name: &str) -> Result<&Pixmap> {
        self.stamps
            .get(name)
            .and_then(Asset::pixmap)
            .ok_or_else(|| Error::UnknownAsset(name.to_string()))
    }

    /// Decoded text icon at its natural size.
    pub fn text_icon(&self, name: &str) -> Result<&Pixmap> {
        self.text_icons
            .get(name)
            .and_then(Asset::pixmap)
            .ok_or_else(|| Error::UnknownAsset(name.to_string()))
    }

    /// Text icon scaled to a `size` px square. Unknown names get a plain note glyph.
    pub(crate) fn text_icon_at(&self, name: &str, size: u32) -> Option<Pixmap> {
        match self.text_icon(name) {
            Ok(icon) => scaled(icon, size, size),
            Err(_) => {
                log::debug!("No text icon '{}', drawing generic note", name);
                generic_note(size)
            },
        }
    }

    /// Stamp scaled to a `size` px square. Unknown names get a framed square.
    pub(crate) fn stamp_at(&self, name: &str, size: u32) -> Option<Pixmap> {
        match self.stamp(name) {
            Ok(stamp) => scaled(stamp, size, size),
            Err(_) => {
                log::debug!("No stamp '{}', drawing generic stamp", name);
                generic_stamp(size)
            },
        }
    }
}

fn generic_note(size: u32) -> Option<Pixmap> {
    let mut pixmap = Pixmap::new(size.max(1), size.max(1))?;
    pixmap.fill(Rgba8::WHITE.to_skia());
    let s = size as f32;
    let mut paint = tiny_skia::Paint::default();
    paint.set_color(Rgba8::BLACK.to_skia());
    let border = tiny_skia::Stroke {
        width: (s / 12.0).max(1.0),
        ..Default::default()
    };
    let rect = tiny_skia::Rect::from_xywh(0.5, 0.5, s - 1.0, s - 1.0)?;
    pixmap.stroke_path(
        &tiny_skia::PathBuilder::from_rect(rect),
        &paint,
        &border,
        Transform::identity(),
        None,
    );
    for i in 1..4 {
        let y = s * i as f32 / 4.0;
        if let Some(line) = tiny_skia::Rect::from_xywh(s * 0.2, y, s * 0.6, (s / 16.0).max(1.0)) {
            pixmap.fill_rect(line, &paint, Transform::identity(), None);
        }
    }
    Some(pixmap)
}

fn generic_stamp(size: u32) -> Option<Pixmap> {
    let mut pixmap = Pixmap::new(size.max(1), size.max(1))?;
    pixmap.fill(Rgba8::new(255, 255, 255, 200).to_skia());
    let s = size as f32;
    let mut paint = tiny_skia::Paint::default();
    paint.set_color(Rgba8::rgb(200, 30, 30).to_skia());
    paint.anti_alias = true;
    let frame = tiny_skia::Stroke {
        width: (s / 10.0).max(1.0),
        ..Default::default()
    };
    let inset = frame.width / 2.0;
    let rect = tiny_skia::Rect::from_xywh(inset, inset, s - 2.0 * inset, s - 2.0 * inset)?;
    pixmap.stroke_path(
        &tiny_skia::PathBuilder::from_rect(rect),
        &paint,
        &frame,
        Transform::identity(),
        None,
    );
    Some(pixmap)
}
