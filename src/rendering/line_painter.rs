//! Line annotation geometry: the main segment, end decorations and leader lines.
//!
//! A two-point line is laid out in an intermediate frame where the segment runs
//! along the x axis from `0` to its length. Decorations are small point lists in
//! that frame, mapped to the target image through the frame transform followed by
//! the page-to-image transform.

use tiny_skia::Transform;

use super::path_rasterizer::{CompositionMode, Pen, RasterTarget, ShapeRasterizer, ShapeStyle};
use crate::annotation_types::{LineEndingStyle, Rgba8};
use crate::annotations::LineAnnotation;
use crate::geometry::NormalizedPoint;

/// Kind of a [`LineShape`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineShapeKind {
    /// Polyline or polygon through the points
    Path,
    /// Ellipse inside the box spanned by two points
    Ellipse,
}

/// One shape of a line annotation, in target-normalized coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct LineShape {
    /// Path or ellipse
    pub kind: LineShapeKind,
    /// Points mapped to the target
    pub points: Vec<NormalizedPoint>,
    /// Closed polygon
    pub closed: bool,
}

impl LineShape {
    fn path(points: Vec<NormalizedPoint>, closed: bool) -> Self {
        Self {
            kind: LineShapeKind::Path,
            points,
            closed,
        }
    }
}

// Affine map kept in f64; decoration sizes are tiny fractions of the page.
#[derive(Debug, Clone, Copy)]
struct Affine {
    sx: f64,
    ky: f64,
    kx: f64,
    sy: f64,
    tx: f64,
    ty: f64,
}

impl Affine {
    fn from_skia(t: &Transform) -> Self {
        Self {
            sx: t.sx as f64,
            ky: t.ky as f64,
            kx: t.kx as f64,
            sy: t.sy as f64,
            tx: t.tx as f64,
            ty: t.ty as f64,
        }
    }

    fn map(&self, x: f64, y: f64) -> NormalizedPoint {
        NormalizedPoint::new(
            self.sx * x + self.kx * y + self.tx,
            self.ky * x + self.sy * y + self.ty,
        )
    }

    /// `self` first, then `next`.
    fn then(&self, next: &Affine) -> Affine {
        Affine {
            sx: next.sx * self.sx + next.kx * self.ky,
            ky: next.ky * self.sx + next.sy * self.ky,
            kx: next.sx * self.kx + next.kx * self.sy,
            sy: next.ky * self.kx + next.sy * self.sy,
            tx: next.sx * self.tx + next.kx * self.ty + next.tx,
            ty: next.ky * self.tx + next.sy * self.ty + next.ty,
        }
    }
}

/// Frame of a two-point line: segment length, decoration size and frame transform.
#[derive(Debug, Clone, Copy)]
struct SegmentFrame {
    length: f64,
    size: f64,
    to_page: Affine,
}

/// Draws one line annotation into a target image.
pub struct LineAnnotationPainter<'a> {
    line: &'a LineAnnotation,
    pen: Pen,
    page_size: (f64, f64),
    page_scale: f64,
    aspect_ratio: f64,
    to_image: Affine,
    fill: Option<Rgba8>,
}

impl<'a> LineAnnotationPainter<'a> {
    /// Create a painter.
    ///
    /// `page_size` is the page size at scale 1.0, `page_scale` multiplies the pen
    /// width, and `to_normalized_image` maps page-normalized points into the
    /// target's normalized space.
    pub fn new(
        line: &'a LineAnnotation,
        pen: Pen,
        page_size: (f64, f64),
        page_scale: f64,
        to_normalized_image: Transform,
    ) -> Self {
        let fill = if line.closed || line.points.len() == 2 {
            line.inner_color
        } else {
            None
        };
        Self {
            line,
            pen,
            page_size,
            page_scale,
            aspect_ratio: page_size.1 / page_size.0,
            to_image: Affine::from_skia(&to_normalized_image),
            fill,
        }
    }

    /// Every shape in draw order, mapped to the target.
    ///
    /// Two points yield the shortened segment, the start and end decorations and
    /// the leader lines. More points yield the whole path. Fewer yield nothing.
    pub fn shapes(&self) -> Vec<LineShape> {
        let points = &self.line.points;
        match points.len() {
            0 | 1 => Vec::new(),
            2 => self.segment_shapes(&points[0], &points[1]),
            _ => vec![LineShape::path(
                points.iter().map(|p| self.to_image.map(p.x, p.y)).collect(),
                self.line.closed,
            )],
        }
    }

    /// Draw every shape with the annotation pen and fill.
    pub fn draw(&self, rasterizer: &ShapeRasterizer, target: &mut RasterTarget<'_>) {
        let style = ShapeStyle {
            pen: Some(self.pen),
            fill: self.fill,
            scale_multiplier: self.page_scale,
            mode: CompositionMode::Normal,
        };
        for shape in self.shapes() {
            match shape.kind {
                LineShapeKind::Path => {
                    rasterizer.draw_path(target, &shape.points, shape.closed, &style)
                },
                LineShapeKind::Ellipse => rasterizer.draw_ellipse(target, &shape.points, &style),
            }
        }
    }

    fn frame(&self, first: &NormalizedPoint, last: &NormalizedPoint) -> SegmentFrame {
        let aspect = self.aspect_ratio;
        let dx = last.x - first.x;
        let dy = first.y - last.y;
        let angle = (dy * aspect).atan2(dx);
        let cos_a = (-angle).cos();
        let sin_a = (-angle).sin();
        let to_page = Affine {
            sx: cos_a,
            ky: sin_a / aspect,
            kx: -sin_a,
            sy: cos_a / aspect,
            tx: first.x,
            ty: first.y,
        };
        let deaspected_dy = dy * aspect;
        let length = (dx * dx + deaspected_dy * deaspected_dy).sqrt();
        let size = (6.0 * self.pen.width / self.page_size.0).min(length / 2.0);
        SegmentFrame {
            length,
            size,
            to_page,
        }
    }

    fn segment_shapes(&self, first: &NormalizedPoint, last: &NormalizedPoint) -> Vec<LineShape> {
        let frame = self.frame(first, last);
        let combined = frame.to_page.then(&self.to_image);
        let map = |pts: &[(f64, f64)]| -> Vec<NormalizedPoint> {
            pts.iter().map(|&(x, y)| combined.map(x, y)).collect()
        };
        let (len, size) = (frame.length, frame.size);

        let mut shapes = vec![LineShape::path(
            map(&[
                (self.line.start_style.shortening(size), 0.0),
                (len - self.line.end_style.shortening(size), 0.0),
            ]),
            self.line.closed,
        )];

        use LineEndingStyle as S;
        let start = match self.line.start_style {
            S::None => None,
            S::Square => Some(self.square(0.0, -size)),
            S::Circle => Some(self.circle(&frame, 0.0, -size)),
            S::Diamond => Some(self.diamond(0.0, -size)),
            S::OpenArrow => Some(self.arrow(0.0, -size, 1.0, false)),
            S::ClosedArrow => Some(self.arrow(0.0, -size, 1.0, true)),
            S::Butt => Some(self.butt(0.0, size)),
            S::ROpenArrow => Some(self.arrow(0.0, size, 1.0, false)),
            S::RClosedArrow => Some(self.arrow(0.0, size, 1.0, true)),
            S::Slash => Some(self.slash(0.0, -size)),
        };
        let end = match self.line.end_style {
            S::None => None,
            S::Square => Some(self.square(len, size)),
            S::Circle => Some(self.circle(&frame, len, size)),
            S::Diamond => Some(self.diamond(len, size)),
            S::OpenArrow => Some(self.arrow(len, size, 1.0, false)),
            S::ClosedArrow => Some(self.arrow(len, size, 1.0, true)),
            S::Butt => Some(self.butt(len, size)),
            S::ROpenArrow => Some(self.arrow(len, size, -1.0, false)),
            S::RClosedArrow => Some(self.arrow(len, size, -1.0, true)),
            S::Slash => Some(self.slash(len, size)),
        };
        for decoration in [start, end].into_iter().flatten() {
            shapes.push(match decoration {
                Decoration::Frame { points, closed } => LineShape::path(map(&points), closed),
                Decoration::Ellipse([a, b]) => LineShape {
                    kind: LineShapeKind::Ellipse,
                    points: vec![self.to_image.map(a.x, a.y), self.to_image.map(b.x, b.y)],
                    closed: true,
                },
            });
        }

        for x in [0.0, len] {
            if let Some(points) = self.leader_line(x) {
                shapes.push(LineShape::path(map(&points), false));
            }
        }
        shapes
    }

    fn arrow(&self, x: f64, size: f64, flip: f64, closed: bool) -> Decoration {
        Decoration::Frame {
            points: vec![
                (x - size * flip, size / 2.0),
                (x, 0.0),
                (x - size * flip, -size / 2.0),
            ],
            closed,
        }
    }

    fn butt(&self, x: f64, size: f64) -> Decoration {
        let half = size / 2.0;
        Decoration::Frame {
            points: vec![(x, half), (x, -half)],
            closed: true,
        }
    }

    // Built in page space so the circle stays round on non-square pages.
    fn circle(&self, frame: &SegmentFrame, x: f64, size: f64) -> Decoration {
        let center = frame.to_page.map(x - size / 2.0, 0.0);
        let half = size / 2.0;
        Decoration::Ellipse([
            NormalizedPoint::new(center.x - half, center.y - half / self.aspect_ratio),
            NormalizedPoint::new(center.x + half, center.y + half / self.aspect_ratio),
        ])
    }

    fn square(&self, x: f64, size: f64) -> Decoration {
        let half = size / 2.0;
        Decoration::Frame {
            points: vec![(x, half), (x - size, half), (x - size, -half), (x, -half)],
            closed: true,
        }
    }

    fn diamond(&self, x: f64, size: f64) -> Decoration {
        let half = size / 2.0;
        Decoration::Frame {
            points: vec![(x, 0.0), (x - half, half), (x - size, 0.0), (x - half, -half)],
            closed: true,
        }
    }

    fn slash(&self, x: f64, size: f64) -> Decoration {
        let half = size / 2.0;
        let x_offset = (std::f64::consts::PI / 3.0).cos() * half;
        Decoration::Frame {
            points: vec![(x - x_offset, half), (x + x_offset, -half)],
            closed: true,
        }
    }

    fn leader_line(&self, x: f64) -> Option<Vec<(f64, f64)>> {
        let forward = self.aspect_ratio * self.line.leader_forward / self.page_size.1;
        let backward = self.aspect_ratio * self.line.leader_backward / self.page_size.1;
        if forward.abs() <= 0.0 {
            return None;
        }
        let sign = if forward > 0.0 { -1.0 } else { 1.0 };
        let extension = if backward.abs() > 0.0 {
            sign * backward
        } else {
            0.0
        };
        Some(vec![(x, forward), (x, extension)])
    }
}

enum Decoration {
    /// Points in the segment frame
    Frame {
        points: Vec<(f64, f64)>,
        closed: bool,
    },
    /// Bounding box in page-normalized space
    Ellipse([NormalizedPoint; 2]),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotations::AnnotationStyle;

    const EPS: f64 = 1e-9;

    fn line(points: Vec<NormalizedPoint>, start: LineEndingStyle, end: LineEndingStyle) -> LineAnnotation {
        LineAnnotation {
            points,
            start_style: start,
            end_style: end,
            ..Default::default()
        }
    }

    fn pen(width: f64) -> Pen {
        Pen::for_annotation(&AnnotationStyle::default(), width, Rgba8::BLACK)
    }

    fn shoelace(points: &[NormalizedPoint]) -> f64 {
        let n = points.len();
        let twice: f64 = (0..n)
            .map(|i| {
                let a = points[i];
                let b = points[(i + 1) % n];
                a.x * b.y - b.x * a.y
            })
            .sum();
        twice.abs() / 2.0
    }

    #[test]
    fn test_closed_arrow_tip_hits_endpoint() {
        let annot = line(
            vec![NormalizedPoint::new(0.2, 0.3), NormalizedPoint::new(0.7, 0.6)],
            LineEndingStyle::None,
            LineEndingStyle::ClosedArrow,
        );
        let painter =
            LineAnnotationPainter::new(&annot, pen(2.0), (200.0, 300.0), 1.0, Transform::identity());
        let shapes = painter.shapes();
        assert_eq!(shapes.len(), 2);

        let arrow = &shapes[1];
        assert!(arrow.closed);
        assert_eq!(arrow.points.len(), 3);
        assert!((arrow.points[1].x - 0.7).abs() < EPS);
        assert!((arrow.points[1].y - 0.6).abs() < EPS);
    }

    #[test]
    fn test_closed_arrow_area_matches_size() {
        // Square page: aspect 1, so the frame is a pure rotation
        let width = 3.0;
        let page = (100.0, 100.0);
        let annot = line(
            vec![NormalizedPoint::new(0.1, 0.1), NormalizedPoint::new(0.9, 0.5)],
            LineEndingStyle::None,
            LineEndingStyle::ClosedArrow,
        );
        let painter = LineAnnotationPainter::new(&annot, pen(width), page, 1.0, Transform::identity());
        let shapes = painter.shapes();
        let arrow = &shapes[1];

        let length = (0.8f64 * 0.8 + 0.4 * 0.4).sqrt();
        let size = (6.0 * width / page.0).min(length / 2.0);
        assert!((shoelace(&arrow.points) - size * size / 2.0).abs() < 1e-12);

        // main segment stops where the arrow starts
        let main = &shapes[0];
        let end = main.points[1];
        let tip = arrow.points[1];
        let shortened = ((tip.x - end.x).powi(2) + (tip.y - end.y).powi(2)).sqrt();
        assert!((shortened - size).abs() < 1e-12);
    }

    #[test]
    fn test_decoration_size_capped_by_half_length() {
        let annot = line(
            vec![NormalizedPoint::new(0.5, 0.5), NormalizedPoint::new(0.51, 0.5)],
            LineEndingStyle::Square,
            LineEndingStyle::None,
        );
        let painter = LineAnnotationPainter::new(&annot, pen(10.0), (100.0, 100.0), 1.0, Transform::identity());
        let shapes = painter.shapes();
        let main = &shapes[0];
        // start shortened by size = 0.005
        assert!((main.points[0].x - 0.505).abs() < 1e-9);
        assert!((main.points[1].x - 0.51).abs() < 1e-9);
    }

    #[test]
    fn test_open_styles_do_not_shorten() {
        for style in [LineEndingStyle::OpenArrow, LineEndingStyle::Butt, LineEndingStyle::Slash] {
            let annot = line(
                vec![NormalizedPoint::new(0.1, 0.5), NormalizedPoint::new(0.9, 0.5)],
                style,
                style,
            );
            let painter =
                LineAnnotationPainter::new(&annot, pen(2.0), (100.0, 100.0), 1.0, Transform::identity());
            let main = &painter.shapes()[0];
            assert!((main.points[0].x - 0.1).abs() < EPS);
            assert!((main.points[1].x - 0.9).abs() < EPS);
        }
    }

    #[test]
    fn test_circle_stays_round_on_tall_page() {
        let annot = line(
            vec![NormalizedPoint::new(0.1, 0.5), NormalizedPoint::new(0.9, 0.5)],
            LineEndingStyle::None,
            LineEndingStyle::Circle,
        );
        let page = (100.0, 200.0);
        let painter = LineAnnotationPainter::new(&annot, pen(2.0), page, 1.0, Transform::identity());
        let shapes = painter.shapes();
        let circle = &shapes[1];
        assert_eq!(circle.kind, LineShapeKind::Ellipse);

        let w = (circle.points[1].x - circle.points[0].x) * page.0;
        let h = (circle.points[1].y - circle.points[0].y) * page.1;
        assert!((w - h).abs() < 1e-9);
        // centered half a size before the endpoint
        let size = 6.0 * 2.0 / page.0;
        let cx = (circle.points[0].x + circle.points[1].x) / 2.0;
        assert!((cx - (0.9 - size / 2.0)).abs() < 1e-9);
    }

    #[test]
    fn test_leader_lines() {
        let mut annot = line(
            vec![NormalizedPoint::new(0.1, 0.5), NormalizedPoint::new(0.9, 0.5)],
            LineEndingStyle::None,
            LineEndingStyle::None,
        );
        annot.leader_forward = 10.0;
        annot.leader_backward = 5.0;
        let painter = LineAnnotationPainter::new(&annot, pen(1.0), (100.0, 100.0), 1.0, Transform::identity());
        let shapes = painter.shapes();
        assert_eq!(shapes.len(), 3);

        // horizontal line: frame y maps to page y unchanged
        let leader = &shapes[1];
        assert!(!leader.closed);
        assert!((leader.points[0].x - 0.1).abs() < EPS);
        assert!((leader.points[0].y - 0.6).abs() < EPS);
        assert!((leader.points[1].y - 0.45).abs() < EPS);
        assert!((shapes[2].points[0].x - 0.9).abs() < EPS);
    }

    #[test]
    fn test_polyline_and_degenerate_input() {
        let poly = line(
            vec![
                NormalizedPoint::new(0.1, 0.1),
                NormalizedPoint::new(0.5, 0.5),
                NormalizedPoint::new(0.9, 0.1),
            ],
            LineEndingStyle::ClosedArrow,
            LineEndingStyle::ClosedArrow,
        );
        let t = Transform::from_scale(2.0, 2.0);
        let painter = LineAnnotationPainter::new(&poly, pen(1.0), (100.0, 100.0), 1.0, t);
        let shapes = painter.shapes();
        assert_eq!(shapes.len(), 1);
        assert_eq!(shapes[0].points[1], NormalizedPoint::new(1.0, 1.0));

        let single = line(vec![NormalizedPoint::new(0.1, 0.1)], LineEndingStyle::None, LineEndingStyle::None);
        let painter = LineAnnotationPainter::new(&single, pen(1.0), (100.0, 100.0), 1.0, t);
        assert!(painter.shapes().is_empty());
    }

    #[test]
    fn test_fill_only_for_closed_or_two_point_lines() {
        let mut poly = line(
            vec![
                NormalizedPoint::new(0.1, 0.1),
                NormalizedPoint::new(0.5, 0.5),
                NormalizedPoint::new(0.9, 0.1),
            ],
            LineEndingStyle::None,
            LineEndingStyle::None,
        );
        poly.inner_color = Some(Rgba8::YELLOW);
        let open = LineAnnotationPainter::new(&poly, pen(1.0), (100.0, 100.0), 1.0, Transform::identity());
        assert_eq!(open.fill, None);

        poly.closed = true;
        let closed = LineAnnotationPainter::new(&poly, pen(1.0), (100.0, 100.0), 1.0, Transform::identity());
        assert_eq!(closed.fill, Some(Rgba8::YELLOW));
    }

    #[test]
    fn test_draw_closed_arrow_fills_pixels() {
        let mut annot = line(
            vec![NormalizedPoint::new(0.1, 0.5), NormalizedPoint::new(0.9, 0.5)],
            LineEndingStyle::None,
            LineEndingStyle::ClosedArrow,
        );
        annot.inner_color = Some(Rgba8::rgb(255, 0, 0));
        let mut pixmap = tiny_skia::Pixmap::new(100, 100).unwrap();
        let painter = LineAnnotationPainter::new(&annot, pen(4.0), (100.0, 100.0), 1.0, Transform::identity());
        painter.draw(&ShapeRasterizer::new(), &mut RasterTarget::new(&mut pixmap, 1.0));

        // size = 0.24: arrow base at x = 66, tip at 90
        let inside = pixmap.pixel(75, 50).unwrap();
        assert_eq!(inside.alpha(), 255);
        assert!(pixmap.pixel(95, 20).unwrap().alpha() == 0);
    }
}
