//! Read-only configuration snapshot for a paint call.
//!
//! Mirrors the user's accessibility and display settings. The compositor never
//! writes to it; a new snapshot is taken whenever settings change.

use serde::{Deserialize, Serialize};

use crate::annotation_types::Rgba8;
use crate::error::{Error, Result};

/// Accessibility color mode applied to page pixmaps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RenderMode {
    /// No change
    #[default]
    Normal,
    /// Invert RGB channels
    Inverted,
    /// Map the gray ramp onto black..paper color via the background only
    Paper,
    /// Map the gray ramp onto the dark..light color segment
    RecolorDarkLight,
    /// Thresholded gray with adjustable contrast
    BlackWhite,
    /// Invert HSL lightness, keep hue and chroma
    InvertLightness,
    /// Invert Rec. 709 luma, keep hue and chroma
    InvertLuma,
    /// Invert luma with equal channel weights
    InvertLumaSymmetric,
    /// Rotate hue by +120°
    HueShiftPositive,
    /// Rotate hue by -120°
    HueShiftNegative,
}

impl RenderMode {
    /// Whether the page background becomes black in this mode.
    pub fn has_dark_background(&self) -> bool {
        matches!(
            self,
            Self::Inverted | Self::InvertLightness | Self::InvertLuma | Self::InvertLumaSymmetric
        )
    }
}

/// Empirically chosen thresholds of the tile compositor and overlay renderer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompositorLimits {
    /// Tile size mismatch per axis (device px) that is still blitted without scaling
    pub tile_size_tolerance: i32,
    /// Largest accepted upscale ratio of a whole-page bitmap
    pub max_upscale_ratio: f64,
    /// Smallest accepted downscale ratio of a whole-page bitmap
    pub min_downscale_ratio: f64,
    /// Largest bitmap (in source pixels) that may be upscaled
    pub max_upscale_source_pixels: u64,
    /// Logical size of linked text annotation icons
    pub text_icon_size: f64,
    /// Slack (device px) added to the painting limits when testing object borders
    pub object_border_slack: i32,
}

impl Default for CompositorLimits {
    fn default() -> Self {
        Self {
            tile_size_tolerance: 1,
            max_upscale_ratio: 4.0,
            min_downscale_ratio: 0.25,
            max_upscale_source_pixels: 60_000_000,
            text_icon_size: 24.0,
            object_border_slack: 2,
        }
    }
}

/// Rendering configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Master switch for accessibility recoloring.
    pub accessibility_enabled: bool,

    /// Active color mode.
    pub render_mode: RenderMode,

    /// Background used by [`RenderMode::Paper`].
    pub paper_color: Rgba8,

    /// Dark end of [`RenderMode::RecolorDarkLight`].
    pub recolor_foreground: Rgba8,

    /// Light end of [`RenderMode::RecolorDarkLight`]; also its background.
    pub recolor_background: Rgba8,

    /// Contrast of [`RenderMode::BlackWhite`], 2..=6.
    pub bw_contrast: i32,

    /// Threshold of [`RenderMode::BlackWhite`], 2..=253.
    pub bw_threshold: i32,

    /// Outline link areas when the paint request asks for it.
    pub highlight_links: bool,

    /// Outline image areas when the paint request asks for it.
    pub highlight_images: bool,

    /// Outline every painted annotation's bounding box.
    pub debug_draw_annotation_rect: bool,

    /// Viewport marker and object border color.
    pub highlight_color: Rgba8,

    /// Compositor thresholds.
    pub limits: CompositorLimits,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl RenderConfig {
    /// Create new configuration with defaults.
    pub fn new() -> Self {
        Self {
            accessibility_enabled: false,
            render_mode: RenderMode::Normal,
            paper_color: Rgba8::WHITE,
            recolor_foreground: Rgba8::BLACK,
            recolor_background: Rgba8::WHITE,
            bw_contrast: 2,
            bw_threshold: 127,
            highlight_links: false,
            highlight_images: false,
            debug_draw_annotation_rect: false,
            highlight_color: Rgba8::rgb(61, 174, 233),
            limits: CompositorLimits::default(),
        }
    }

    /// Parse and validate a JSON settings snapshot.
    ///
    /// Missing fields take their default values.
    ///
    /// # Examples
    ///
    /// ```
    /// use page_oxide::config::{RenderConfig, RenderMode};
    ///
    /// let config = RenderConfig::from_json(
    ///     r#"{ "accessibility_enabled": true, "render_mode": "InvertLuma" }"#,
    /// ).unwrap();
    /// assert_eq!(config.render_mode, RenderMode::InvertLuma);
    /// assert_eq!(config.bw_threshold, 127);
    /// ```
    pub fn from_json(json: &str) -> Result<Self> {
        let config: RenderConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Check that every parameter lies in its accepted range.
    pub fn validate(&self) -> Result<()> {
        if !(2..=6).contains(&self.bw_contrast) {
            return Err(Error::InvalidConfig(format!(
                "bw_contrast must be in 2..=6, got {}",
                self.bw_contrast
            )));
        }
        if !(2..=253).contains(&self.bw_threshold) {
            return Err(Error::InvalidConfig(format!(
                "bw_threshold must be in 2..=253, got {}",
                self.bw_threshold
            )));
        }
        let limits = &self.limits;
        if limits.tile_size_tolerance < 0 || limits.object_border_slack < 0 {
            return Err(Error::InvalidConfig(
                "tile_size_tolerance and object_border_slack must not be negative".to_string(),
            ));
        }
        if limits.min_downscale_ratio.is_nan()
            || limits.min_downscale_ratio <= 0.0
            || limits.min_downscale_ratio > 1.0
        {
            return Err(Error::InvalidConfig(format!(
                "min_downscale_ratio must be in (0, 1], got {}",
                limits.min_downscale_ratio
            )));
        }
        if limits.max_upscale_ratio.is_nan() || limits.max_upscale_ratio < 1.0 {
            return Err(Error::InvalidConfig(format!(
                "max_upscale_ratio must be at least 1, got {}",
                limits.max_upscale_ratio
            )));
        }
        if limits.text_icon_size.is_nan() || limits.text_icon_size <= 0.0 {
            return Err(Error::InvalidConfig(format!(
                "text_icon_size must be positive, got {}",
                limits.text_icon_size
            )));
        }
        Ok(())
    }

    /// Enable or disable accessibility recoloring.
    pub fn with_accessibility(mut self, enable: bool) -> Self {
        self.accessibility_enabled = enable;
        self
    }

    /// Set the color mode.
    pub fn with_render_mode(mut self, mode: RenderMode) -> Self {
        self.render_mode = mode;
        self
    }

    /// Set the paper color.
    pub fn with_paper_color(mut self, color: Rgba8) -> Self {
        self.paper_color = color;
        self
    }

    /// Set the dark/light recolor pair.
    pub fn with_recolor_colors(mut self, foreground: Rgba8, background: Rgba8) -> Self {
        self.recolor_foreground = foreground;
        self.recolor_background = background;
        self
    }

    /// Set black/white contrast and threshold.
    pub fn with_black_white(mut self, contrast: i32, threshold: i32) -> Self {
        self.bw_contrast = contrast;
        self.bw_threshold = threshold;
        self
    }

    /// Toggle link and image border enhancement.
    pub fn with_object_highlighting(mut self, links: bool, images: bool) -> Self {
        self.highlight_links = links;
        self.highlight_images = images;
        self
    }

    /// Toggle the annotation bounding box debug outline.
    pub fn with_debug_annotation_rects(mut self, enable: bool) -> Self {
        self.debug_draw_annotation_rect = enable;
        self
    }

    /// Replace the compositor thresholds.
    pub fn with_limits(mut self, limits: CompositorLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Effective color mode: `Normal` while accessibility is off.
    pub fn effective_mode(&self) -> RenderMode {
        if self.accessibility_enabled {
            self.render_mode
        } else {
            RenderMode::Normal
        }
    }

    /// Page background for the active mode.
    pub fn background_color(&self) -> Rgba8 {
        match self.effective_mode() {
            mode if mode.has_dark_background() => Rgba8::BLACK,
            RenderMode::Paper => self.paper_color,
            RenderMode::RecolorDarkLight => self.recolor_background,
            _ => Rgba8::WHITE,
        }
    }

    /// Whether page pixels are run through a color transform.
    ///
    /// Paper mode only changes the background.
    pub fn recolors_page(&self) -> bool {
        !matches!(self.effective_mode(), RenderMode::Normal | RenderMode::Paper)
    }
}
