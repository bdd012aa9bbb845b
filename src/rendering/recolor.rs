//! Accessibility color transforms on RGBA8 pixel buffers.
//!
//! Every transform works in place on premultiplied RGBA8 data (the layout of a
//! tiny-skia [`Pixmap`]). A buffer tagged as straight alpha is premultiplied
//! first, with a warning logged the first time that happens in the process.
//!
//! The transforms never fail. Resulting color channels are clamped to the pixel's
//! alpha so the buffer stays valid premultiplied data.

use std::sync::atomic::{AtomicBool, Ordering};

use tiny_skia::Pixmap;

use crate::annotation_types::Rgba8;
use crate::config::{RenderConfig, RenderMode};

static FORMAT_WARNING_LOGGED: AtomicBool = AtomicBool::new(false);

/// Alpha layout of a [`PixelBuffer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelFormat {
    /// Color channels already multiplied by alpha
    Premultiplied,
    /// Independent color and alpha channels
    Straight,
}

/// Mutable view of RGBA8 pixels with a known alpha layout.
#[derive(Debug)]
pub struct PixelBuffer<'a> {
    data: &'a mut [u8],
    format: PixelFormat,
}

impl<'a> PixelBuffer<'a> {
    /// Wrap premultiplied RGBA8 bytes.
    pub fn premultiplied(data: &'a mut [u8]) -> Self {
        Self {
            data,
            format: PixelFormat::Premultiplied,
        }
    }

    /// Wrap straight-alpha RGBA8 bytes, e.g. decoded image data.
    pub fn straight(data: &'a mut [u8]) -> Self {
        Self {
            data,
            format: PixelFormat::Straight,
        }
    }

    /// Wrap the pixels of a pixmap.
    pub fn from_pixmap(pixmap: &'a mut Pixmap) -> Self {
        Self::premultiplied(pixmap.data_mut())
    }

    /// Current alpha layout.
    pub fn format(&self) -> PixelFormat {
        self.format
    }

    /// Convert to premultiplied alpha in place if needed.
    pub fn ensure_premultiplied(&mut self) {
        if self.format == PixelFormat::Premultiplied {
            return;
        }
        if !FORMAT_WARNING_LOGGED.swap(true, Ordering::Relaxed) {
            log::warn!("Color transform received straight-alpha pixels, converting to premultiplied");
        }
        for px in self.data.chunks_exact_mut(4) {
            let a = px[3] as u32;
            for c in &mut px[..3] {
                *c = ((*c as u32 * a + 127) / 255) as u8;
            }
        }
        self.format = PixelFormat::Premultiplied;
    }

    fn pixels(&mut self) -> std::slice::ChunksExactMut<'_, u8> {
        self.ensure_premultiplied();
        self.data.chunks_exact_mut(4)
    }
}

#[inline]
fn store(px: &mut [u8], r: u8, g: u8, b: u8) {
    let a = px[3];
    px[0] = r.min(a);
    px[1] = g.min(a);
    px[2] = b.min(a);
}

/// Luminance-weighted gray value, `0.299R + 0.587G + 0.114B` rounded.
///
/// # Examples
///
/// ```
/// use page_oxide::rendering::recolor::gray;
///
/// assert_eq!(gray(255, 255, 255), 255);
/// assert_eq!(gray(255, 0, 0), 76);
/// ```
#[inline]
pub fn gray(r: u8, g: u8, b: u8) -> u8 {
    ((r as u32 * 299 + g as u32 * 587 + b as u32 * 114 + 500) / 1000) as u8
}

/// Replace the gray ramp with the segment from `foreground` (black) to
/// `background` (white). Alpha is unchanged.
pub fn paper_color(buffer: &mut PixelBuffer<'_>, foreground: Rgba8, background: Rgba8) {
    let span = |fg: u8, bg: u8| bg as f32 - fg as f32;
    let (span_r, span_g, span_b) = (
        span(foreground.r, background.r),
        span(foreground.g, background.g),
        span(foreground.b, background.b),
    );

    for px in buffer.pixels() {
        let lightness = gray(px[0], px[1], px[2]) as f32;
        let r = span_r * lightness / 255.0 + foreground.r as f32;
        let g = span_g * lightness / 255.0 + foreground.g as f32;
        let b = span_b * lightness / 255.0 + foreground.b as f32;
        store(px, r as u8, g as u8, b as u8);
    }
}

/// Map one gray value through the black/white curve.
///
/// Piecewise linear through `(0, 0)`, `(thr, 128)`, `(255, 255)` with
/// `thr = 255 - threshold`, then stretched around `thr` by `contrast / 2` when
/// `contrast > 2`.
pub fn black_white_value(value: u8, contrast: i32, threshold: i32) -> u8 {
    let thr = 255 - threshold.clamp(1, 254);
    let mut val = value as i32;

    if val >= thr {
        val = 128 + (127 * (val - thr)) / (255 - thr);
    } else {
        val = (128 * val) / thr;
    }

    if contrast > 2 {
        val = thr + (val - thr) * contrast / 2;
        val = val.clamp(0, 255);
    }

    val as u8
}

/// Gray-scale binarization-like mapping with tunable contrast (2..=6) and
/// threshold (2..=253).
pub fn black_white(buffer: &mut PixelBuffer<'_>, contrast: i32, threshold: i32) {
    for px in buffer.pixels() {
        let val = black_white_value(gray(px[0], px[1], px[2]), contrast, threshold);
        store(px, val, val, val);
    }
}

/// Invert HSL lightness of one color, keeping hue and chroma.
///
/// With `m = min(R,G,B)` and chroma `C = max - m`, lightness is `m + C/2`, so the
/// inverted lightness needs the new base `m' = 255 - C - m`.
#[inline]
pub fn invert_lightness_pixel(r: u8, g: u8, b: u8) -> [u8; 3] {
    let m = r.min(g).min(b);
    let (r, g, b) = (r - m, g - m, b - m);
    let c = r.max(g).max(b);
    let m_inv = 255 - c - m;
    [r + m_inv, g + m_inv, b + m_inv]
}

/// Invert lightness of every pixel, see [`invert_lightness_pixel`].
pub fn invert_lightness(buffer: &mut PixelBuffer<'_>) {
    for px in buffer.pixels() {
        let [r, g, b] = invert_lightness_pixel(px[0], px[1], px[2]);
        store(px, r, g, b);
    }
}

/// Luma weights of the red, green and blue channels; they sum to 1.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LumaCoefficients {
    /// Red weight
    pub r: f32,
    /// Green weight
    pub g: f32,
    /// Blue weight
    pub b: f32,
}

impl LumaCoefficients {
    /// sRGB / Rec. 709 luma.
    pub const REC709: LumaCoefficients = LumaCoefficients {
        r: 0.2126,
        g: 0.7152,
        b: 0.0722,
    };

    /// Equal weights, keeps colors more saturated.
    pub const SYMMETRIC: LumaCoefficients = LumaCoefficients {
        r: 0.3333,
        g: 0.3334,
        b: 0.3333,
    };
}

/// Invert the luma of one color in the HCY bicone, keeping hue and chroma.
///
/// Gray input (hue undefined) is inverted channel-wise.
pub fn invert_luma_pixel(r: u8, g: u8, b: u8, y: LumaCoefficients) -> [u8; 3] {
    if r == g && g == b {
        return [255 - r, 255 - g, 255 - b];
    }

    let luma = r as f32 * y.r + g as f32 * y.g + b as f32 * y.b;
    let luma_inv = 255.0 - luma;

    // Drop the common component; what is left is chroma spread over the hue sector.
    let m = r.min(g).min(b);
    let (r, g, b) = ((r - m) as f32, (g - m) as f32, (b - m) as f32);

    // Luma of the fully saturated color of this hue, linear between the two
    // dominant channels' coefficients.
    let luma_full_c = if r >= b && b >= g {
        255.0 * y.r + 255.0 * y.b * b / r
    } else if r >= g && g >= b {
        255.0 * y.r + 255.0 * y.g * g / r
    } else if g >= r && r >= b {
        255.0 * y.g + 255.0 * y.r * r / g
    } else if g >= b && b >= r {
        255.0 * y.g + 255.0 * y.b * b / g
    } else if b >= g && g >= r {
        255.0 * y.b + 255.0 * y.g * g / b
    } else {
        255.0 * y.b + 255.0 * y.r * r / b
    };

    // Largest chroma reachable at the old and at the new luma.
    let c_max = if luma >= luma_full_c {
        luma_inv / (255.0 - luma_full_c)
    } else {
        luma / luma_full_c
    };
    let c_inv_max = if luma_inv >= luma_full_c {
        luma / (255.0 - luma_full_c)
    } else {
        luma_inv / luma_full_c
    };

    let c_scale = c_inv_max / c_max;
    let (r, g, b) = (r * c_scale, g * c_scale, b * c_scale);

    // New common component so the result has exactly the inverted luma.
    let m_inv = luma_inv - (y.r * r + y.g * g + y.b * b);

    [
        (r + m_inv + 0.5) as u8,
        (g + m_inv + 0.5) as u8,
        (b + m_inv + 0.5) as u8,
    ]
}

/// Invert luma of every pixel, see [`invert_luma_pixel`].
pub fn invert_luma(buffer: &mut PixelBuffer<'_>, coefficients: LumaCoefficients) {
    for px in buffer.pixels() {
        let [r, g, b] = invert_luma_pixel(px[0], px[1], px[2], coefficients);
        store(px, r, g, b);
    }
}

/// Rotate hue by +120°: `(R, G, B) -> (B, R, G)`.
pub fn hue_shift_positive(buffer: &mut PixelBuffer<'_>) {
    for px in buffer.pixels() {
        let (r, g, b) = (px[0], px[1], px[2]);
        px[0] = b;
        px[1] = r;
        px[2] = g;
    }
}

/// Rotate hue by -120°: `(R, G, B) -> (G, B, R)`.
pub fn hue_shift_negative(buffer: &mut PixelBuffer<'_>) {
    for px in buffer.pixels() {
        let (r, g, b) = (px[0], px[1], px[2]);
        px[0] = g;
        px[1] = b;
        px[2] = r;
    }
}

/// Invert color channels; on premultiplied data each channel becomes `alpha - c`.
pub fn invert(buffer: &mut PixelBuffer<'_>) {
    for px in buffer.pixels() {
        let a = px[3];
        px[0] = a - px[0].min(a);
        px[1] = a - px[1].min(a);
        px[2] = a - px[2].min(a);
    }
}

/// Tint a monochrome icon.
///
/// The red channel is read as saturation and scales `color`. Opaque pixels get
/// `dest_alpha`; translucent ones are scaled by it.
pub fn colorize(buffer: &mut PixelBuffer<'_>, color: Rgba8, dest_alpha: u8) {
    for px in buffer.pixels() {
        let a = px[3] as u32;
        if a == 0 {
            continue;
        }
        let saturation = (px[0] as u32 * 255 + a / 2) / a;
        let saturation = saturation.min(255);
        let new_alpha = if a == 255 {
            dest_alpha as u32
        } else {
            a * dest_alpha as u32 / 255
        };
        let tint = |c: u8| {
            let straight = saturation * c as u32 / 255;
            ((straight * new_alpha + 127) / 255) as u8
        };
        px[0] = tint(color.r);
        px[1] = tint(color.g);
        px[2] = tint(color.b);
        px[3] = new_alpha as u8;
    }
}

/// Applies the configured [`RenderMode`] to images and single colors.
#[derive(Debug, Clone, PartialEq)]
pub struct Recolorer {
    mode: RenderMode,
    foreground: Rgba8,
    background: Rgba8,
    contrast: i32,
    threshold: i32,
}

impl Recolorer {
    /// Snapshot the color mode of a configuration (`Normal` when accessibility is off).
    pub fn from_config(config: &RenderConfig) -> Self {
        Self {
            mode: config.effective_mode(),
            foreground: config.recolor_foreground,
            background: config.recolor_background,
            contrast: config.bw_contrast,
            threshold: config.bw_threshold,
        }
    }

    /// Active mode.
    pub fn mode(&self) -> RenderMode {
        self.mode
    }

    /// Whether pixels change at all. Paper mode only affects the background.
    pub fn is_active(&self) -> bool {
        !matches!(self.mode, RenderMode::Normal | RenderMode::Paper)
    }

    /// Run the active transform over a buffer.
    pub fn apply(&self, buffer: &mut PixelBuffer<'_>) {
        match self.mode {
            RenderMode::Normal | RenderMode::Paper => {}
            RenderMode::Inverted => invert(buffer),
            RenderMode::RecolorDarkLight => paper_color(buffer, self.foreground, self.background),
            RenderMode::BlackWhite => black_white(buffer, self.contrast, self.threshold),
            RenderMode::InvertLightness => invert_lightness(buffer),
            RenderMode::InvertLuma => invert_luma(buffer, LumaCoefficients::REC709),
            RenderMode::InvertLumaSymmetric => invert_luma(buffer, LumaCoefficients::SYMMETRIC),
            RenderMode::HueShiftPositive => hue_shift_positive(buffer),
            RenderMode::HueShiftNegative => hue_shift_negative(buffer),
        }
    }

    /// Run the active transform over a pixmap.
    pub fn apply_to_pixmap(&self, pixmap: &mut Pixmap) {
        if self.is_active() {
            self.apply(&mut PixelBuffer::from_pixmap(pixmap));
        }
    }

    /// Transform a single color; its alpha is kept.
    ///
    /// # Examples
    ///
    /// ```
    /// use page_oxide::annotation_types::Rgba8;
    /// use page_oxide::config::{RenderConfig, RenderMode};
    /// use page_oxide::rendering::recolor::Recolorer;
    ///
    /// let config = RenderConfig::new()
    ///     .with_accessibility(true)
    ///     .with_render_mode(RenderMode::Inverted);
    /// let recolorer = Recolorer::from_config(&config);
    /// assert_eq!(recolorer.apply_to_color(Rgba8::new(255, 0, 0, 128)), Rgba8::new(0, 255, 255, 128));
    /// ```
    pub fn apply_to_color(&self, color: Rgba8) -> Rgba8 {
        if !self.is_active() {
            return color;
        }
        let mut px = [color.r, color.g, color.b, 255];
        self.apply(&mut PixelBuffer::premultiplied(&mut px));
        Rgba8::new(px[0], px[1], px[2], color.a)
    }
}
