//! Geometric primitives for page compositing.
//!
//! Three coordinate spaces meet in the compositor:
//!
//! - **Normalized**: `[0,1]×[0,1]` relative to the unrotated page ([`NormalizedPoint`],
//!   [`NormalizedRect`]).
//! - **Logical**: destination coordinates before the device pixel ratio is applied
//!   ([`Rect`]).
//! - **Device**: integer pixels of a raster ([`PixelRect`]).

/// A point in normalized page space.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct NormalizedPoint {
    /// Horizontal position, 0 is the left page edge
    pub x: f64,
    /// Vertical position, 0 is the top page edge
    pub y: f64,
}

impl NormalizedPoint {
    /// Create a new point.
    ///
    /// # Examples
    ///
    /// ```
    /// use page_oxide::geometry::NormalizedPoint;
    ///
    /// let point = NormalizedPoint::new(0.25, 0.5);
    /// assert_eq!(point.x, 0.25);
    /// assert_eq!(point.y, 0.5);
    /// ```
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Midpoint between two points.
    pub fn midpoint(&self, other: &NormalizedPoint) -> Self {
        self.lerp(other, 0.5)
    }

    /// Linear interpolation: `t = 0` is `self`, `t = 1` is `other`.
    pub fn lerp(&self, other: &NormalizedPoint, t: f64) -> Self {
        Self {
            x: self.x + (other.x - self.x) * t,
            y: self.y + (other.y - self.y) * t,
        }
    }

    /// Map through an affine transform.
    pub fn transformed(&self, transform: &tiny_skia::Transform) -> Self {
        let t = transform;
        Self {
            x: t.sx as f64 * self.x + t.kx as f64 * self.y + t.tx as f64,
            y: t.ky as f64 * self.x + t.sy as f64 * self.y + t.ty as f64,
        }
    }
}

/// A rectangle in normalized page space.
///
/// Callers keep `left <= right` and `top <= bottom`.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct NormalizedRect {
    /// Left edge
    pub left: f64,
    /// Top edge
    pub top: f64,
    /// Right edge
    pub right: f64,
    /// Bottom edge
    pub bottom: f64,
}

impl NormalizedRect {
    /// The whole page.
    pub const FULL: NormalizedRect = NormalizedRect {
        left: 0.0,
        top: 0.0,
        right: 1.0,
        bottom: 1.0,
    };

    /// Create a rectangle from its edges.
    pub fn new(left: f64, top: f64, right: f64, bottom: f64) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    /// Normalize a device rectangle against a `width`×`height` page.
    ///
    /// # Examples
    ///
    /// ```
    /// use page_oxide::geometry::{NormalizedRect, PixelRect};
    ///
    /// let n = NormalizedRect::from_pixel_rect(&PixelRect::new(50, 0, 50, 100), 100, 200);
    /// assert_eq!(n, NormalizedRect::new(0.5, 0.0, 1.0, 0.5));
    /// ```
    pub fn from_pixel_rect(rect: &PixelRect, width: i32, height: i32) -> Self {
        let w = width.max(1) as f64;
        let h = height.max(1) as f64;
        Self {
            left: rect.x as f64 / w,
            top: rect.y as f64 / h,
            right: rect.right() as f64 / w,
            bottom: rect.bottom() as f64 / h,
        }
    }

    /// Width in normalized units.
    pub fn width(&self) -> f64 {
        self.right - self.left
    }

    /// Height in normalized units.
    pub fn height(&self) -> f64 {
        self.bottom - self.top
    }

    /// Top-left corner.
    pub fn top_left(&self) -> NormalizedPoint {
        NormalizedPoint::new(self.left, self.top)
    }

    /// Bottom-right corner.
    pub fn bottom_right(&self) -> NormalizedPoint {
        NormalizedPoint::new(self.right, self.bottom)
    }

    /// Check whether the two rectangles share any area or touch.
    pub fn intersects(&self, other: &NormalizedRect) -> bool {
        self.left <= other.right
            && other.left <= self.right
            && self.top <= other.bottom
            && other.top <= self.bottom
    }

    /// Pixel geometry on a `width`×`height` raster.
    ///
    /// Edges snap outwards so the result always covers the normalized area.
    ///
    /// # Examples
    ///
    /// ```
    /// use page_oxide::geometry::{NormalizedRect, PixelRect};
    ///
    /// let r = NormalizedRect::new(0.1, 0.1, 0.5, 0.2).geometry(100, 100);
    /// assert_eq!(r, PixelRect::new(10, 10, 40, 10));
    /// ```
    pub fn geometry(&self, width: i32, height: i32) -> PixelRect {
        let w = width as f64;
        let h = height as f64;
        PixelRect::from_ltrb(
            snap_floor(self.left * w),
            snap_floor(self.top * h),
            snap_ceil(self.right * w),
            snap_ceil(self.bottom * h),
        )
    }
}

// Normalized values rarely multiply back to exact integers, so values within a
// tiny epsilon of one are treated as that integer before rounding.
const SNAP_EPSILON: f64 = 1e-6;

fn snap_floor(v: f64) -> i32 {
    let r = v.round();
    if (v - r).abs() < SNAP_EPSILON {
        r as i32
    } else {
        v.floor() as i32
    }
}

fn snap_ceil(v: f64) -> i32 {
    let r = v.round();
    if (v - r).abs() < SNAP_EPSILON {
        r as i32
    } else {
        v.ceil() as i32
    }
}

/// A rectangle in logical (pre device pixel ratio) destination coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    /// X coordinate of top-left corner
    pub x: f64,
    /// Y coordinate of top-left corner
    pub y: f64,
    /// Width of rectangle
    pub width: f64,
    /// Height of rectangle
    pub height: f64,
}

impl Rect {
    /// Create a new rectangle from position and dimensions.
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Get the right edge x-coordinate.
    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    /// Get the bottom edge y-coordinate.
    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    /// Scale to device pixels and expand to the smallest covering pixel rectangle.
    ///
    /// # Examples
    ///
    /// ```
    /// use page_oxide::geometry::{PixelRect, Rect};
    ///
    /// let r = Rect::new(0.5, 0.0, 10.0, 10.0).to_device_aligned(2.0);
    /// assert_eq!(r, PixelRect::new(1, 0, 20, 20));
    /// ```
    pub fn to_device_aligned(&self, dpr: f64) -> PixelRect {
        PixelRect::from_ltrb(
            snap_floor(self.x * dpr),
            snap_floor(self.y * dpr),
            snap_ceil(self.right() * dpr),
            snap_ceil(self.bottom() * dpr),
        )
    }
}

/// An integer rectangle in device pixels. `right()`/`bottom()` are exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct PixelRect {
    /// Left edge
    pub x: i32,
    /// Top edge
    pub y: i32,
    /// Width in pixels
    pub width: i32,
    /// Height in pixels
    pub height: i32,
}

impl PixelRect {
    /// Create a new rectangle from position and dimensions.
    pub fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Create from edges; `right`/`bottom` are exclusive.
    pub fn from_ltrb(left: i32, top: i32, right: i32, bottom: i32) -> Self {
        Self {
            x: left,
            y: top,
            width: right - left,
            height: bottom - top,
        }
    }

    /// Exclusive right edge.
    pub fn right(&self) -> i32 {
        self.x + self.width
    }

    /// Exclusive bottom edge.
    pub fn bottom(&self) -> i32 {
        self.y + self.height
    }

    /// True when the rectangle covers no pixel.
    pub fn is_empty(&self) -> bool {
        self.width <= 0 || self.height <= 0
    }

    /// Pixel count, zero for empty rectangles.
    pub fn area(&self) -> i64 {
        if self.is_empty() {
            0
        } else {
            self.width as i64 * self.height as i64
        }
    }

    /// Common area of two rectangles, `None` when they do not overlap.
    pub fn intersect(&self, other: &PixelRect) -> Option<PixelRect> {
        let r = PixelRect::from_ltrb(
            self.x.max(other.x),
            self.y.max(other.y),
            self.right().min(other.right()),
            self.bottom().min(other.bottom()),
        );
        if r.is_empty() {
            None
        } else {
            Some(r)
        }
    }

    /// Check whether the two rectangles overlap.
    pub fn intersects(&self, other: &PixelRect) -> bool {
        self.intersect(other).is_some()
    }

    /// Move by an offset.
    pub fn translated(&self, dx: i32, dy: i32) -> PixelRect {
        PixelRect::new(self.x + dx, self.y + dy, self.width, self.height)
    }

    /// Grow (positive) or shrink (negative) every edge by `d`.
    pub fn inflated(&self, d: i32) -> PixelRect {
        PixelRect::new(self.x - d, self.y - d, self.width + 2 * d, self.height + 2 * d)
    }

    /// Convert to a tiny-skia integer rectangle, `None` when empty.
    pub fn to_int_rect(&self) -> Option<tiny_skia::IntRect> {
        if self.is_empty() {
            return None;
        }
        tiny_skia::IntRect::from_xywh(self.x, self.y, self.width as u32, self.height as u32)
    }

    /// Convert to a tiny-skia float rectangle, `None` when empty.
    pub fn to_rect(&self) -> Option<tiny_skia::Rect> {
        tiny_skia::Rect::from_xywh(
            self.x as f32,
            self.y as f32,
            self.width as f32,
            self.height as f32,
        )
    }
}
