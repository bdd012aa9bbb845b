//! Shared value types for annotations and overlays.
//!
//! Colors, line ending styles, markup kinds, text alignment and the annotation
//! state flags consumed by the overlay renderer.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

/// An 8-bit straight-alpha RGBA color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rgba8 {
    /// Red channel
    pub r: u8,
    /// Green channel
    pub g: u8,
    /// Blue channel
    pub b: u8,
    /// Alpha channel (255 = opaque)
    pub a: u8,
}

impl Rgba8 {
    /// Opaque white.
    pub const WHITE: Rgba8 = Rgba8::rgb(255, 255, 255);
    /// Opaque black.
    pub const BLACK: Rgba8 = Rgba8::rgb(0, 0, 0);
    /// Opaque yellow, the fallback color of annotations without one.
    pub const YELLOW: Rgba8 = Rgba8::rgb(255, 255, 0);
    /// Opaque mid gray used by the placeholder cross.
    pub const GRAY: Rgba8 = Rgba8::rgb(160, 160, 164);
    /// Fully transparent black.
    pub const TRANSPARENT: Rgba8 = Rgba8::new(0, 0, 0, 0);

    /// Create a color from all four channels.
    ///
    /// # Examples
    ///
    /// ```
    /// use page_oxide::annotation_types::Rgba8;
    ///
    /// let c = Rgba8::new(10, 20, 30, 40);
    /// assert_eq!(c.a, 40);
    /// ```
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Create an opaque color.
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    /// Same color with a different alpha.
    pub fn with_alpha(self, a: u8) -> Self {
        Self { a, ..self }
    }

    /// Same color with alpha given as a fraction in `[0, 1]`.
    pub fn with_alpha_f(self, alpha: f32) -> Self {
        self.with_alpha((alpha.clamp(0.0, 1.0) * 255.0).round() as u8)
    }

    /// Darken by `factor` percent, e.g. 150 divides every channel by 1.5.
    ///
    /// Hue and saturation are kept; alpha is unchanged.
    ///
    /// # Examples
    ///
    /// ```
    /// use page_oxide::annotation_types::Rgba8;
    ///
    /// assert_eq!(Rgba8::rgb(255, 255, 0).darker(150), Rgba8::rgb(170, 170, 0));
    /// ```
    pub fn darker(self, factor: u32) -> Self {
        if factor == 0 {
            return self;
        }
        let scale = |c: u8| ((c as u32 * 100 + factor / 2) / factor).min(255) as u8;
        Self {
            r: scale(self.r),
            g: scale(self.g),
            b: scale(self.b),
            a: self.a,
        }
    }

    /// Convert to a tiny-skia color.
    pub fn to_skia(self) -> tiny_skia::Color {
        tiny_skia::Color::from_rgba8(self.r, self.g, self.b, self.a)
    }
}

impl Default for Rgba8 {
    fn default() -> Self {
        Self::BLACK
    }
}

/// Line ending style of a line annotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LineEndingStyle {
    /// No line ending
    #[default]
    None,
    /// Square filled with interior color
    Square,
    /// Circle filled with interior color
    Circle,
    /// Diamond filled with interior color
    Diamond,
    /// Open arrow (two lines forming acute angle)
    OpenArrow,
    /// Closed arrow (filled triangle)
    ClosedArrow,
    /// Butt (perpendicular line at endpoint)
    Butt,
    /// Reverse open arrow
    ROpenArrow,
    /// Reverse closed arrow
    RClosedArrow,
    /// Slash (30 degrees from perpendicular)
    Slash,
}

impl LineEndingStyle {
    /// Distance the main segment gives up at this end to make room for the decoration.
    pub fn shortening(&self, size: f64) -> f64 {
        match self {
            Self::Square | Self::Circle | Self::Diamond | Self::ClosedArrow => size,
            _ => 0.0,
        }
    }

    /// Parse from the conventional style name, unknown names map to `None`.
    pub fn from_name(name: &str) -> Self {
        match name {
            "Square" => Self::Square,
            "Circle" => Self::Circle,
            "Diamond" => Self::Diamond,
            "OpenArrow" => Self::OpenArrow,
            "ClosedArrow" => Self::ClosedArrow,
            "Butt" => Self::Butt,
            "ROpenArrow" => Self::ROpenArrow,
            "RClosedArrow" => Self::RClosedArrow,
            "Slash" => Self::Slash,
            _ => Self::None,
        }
    }
}

/// Kind of text markup drawn over a quad.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TextMarkupType {
    /// Fill the whole quad
    #[default]
    Highlight,
    /// Line at three quarters of the quad height
    Underline,
    /// Fill the bottom half of the quad
    Squiggly,
    /// Line through the middle of the quad
    StrikeOut,
}

impl TextMarkupType {
    /// Whether this markup fills an area (as opposed to stroking a line).
    pub fn is_filled(&self) -> bool {
        matches!(self, Self::Highlight | Self::Squiggly)
    }
}

/// Horizontal alignment of inline text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TextAlignment {
    /// Left-justified (0)
    #[default]
    Left,
    /// Centered (1)
    Center,
    /// Right-justified (2)
    Right,
}

impl TextAlignment {
    /// Parse from the integer alignment code (0 left, 1 center, 2 right).
    pub fn from_int(value: i32) -> Self {
        match value {
            1 => Self::Center,
            2 => Self::Right,
            _ => Self::Left,
        }
    }
}

/// Stroke pattern of an annotation outline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LineStyle {
    /// Continuous stroke
    #[default]
    Solid,
    /// Dashed stroke
    Dashed,
}

/// Shape drawn by a geometric annotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum GeometricShape {
    /// Rectangle inscribed in the bounding box
    #[default]
    InscribedSquare,
    /// Ellipse inscribed in the bounding box
    InscribedCircle,
}

bitflags! {
    /// Annotation state flags relevant to painting.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct AnnotationFlags: u32 {
        /// Never painted
        const HIDDEN = 1 << 0;
        /// Painted by someone else; only the bounding box is shown while it moves
        const EXTERNALLY_DRAWN = 1 << 1;
        /// Currently dragged by the user
        const BEING_MOVED = 1 << 2;
        /// Currently resized by the user
        const BEING_RESIZED = 1 << 3;
    }
}

impl AnnotationFlags {
    /// Whether the annotation is being interactively moved or resized.
    pub fn is_being_edited(&self) -> bool {
        self.intersects(Self::BEING_MOVED | Self::BEING_RESIZED)
    }
}
