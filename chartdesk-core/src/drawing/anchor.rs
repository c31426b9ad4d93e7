//! Edit handles and hit-testing for drawn shapes.

use crate::domain::{Point, Segment, Shape};

/// Size of the chart drawing surface in the same units as shape coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

impl Viewport {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Corner {
    TopLeft,
    TopRight,
    BottomRight,
    BottomLeft,
}

/// Which part of the selected shape a drag edits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AnchorKind {
    Move,
    Endpoint1,
    Endpoint2,
    Corner(Corner),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Anchor {
    pub kind: AnchorKind,
    pub at: Point,
}

/// Hit-test tolerances.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HitConfig {
    pub tolerance: f64,
    /// Approximate width of one character of a text annotation.
    pub text_char_width: f64,
    /// Height of a text annotation box above its baseline.
    pub text_height: f64,
}

impl Default for HitConfig {
    fn default() -> Self {
        Self {
            tolerance: 6.0,
            text_char_width: 7.0,
            text_height: 14.0,
        }
    }
}

/// Handles shown for a selected shape.
///
/// Rectangle corners map to (x1,y1), (x2,y1), (x2,y2), (x1,y2) regardless of
/// which point is visually top-left. The fifth rectangle handle, at the centre,
/// moves the whole shape.
pub fn anchors_for(shape: &Shape, viewport: Viewport) -> Vec<Anchor> {
    match shape {
        Shape::Trendline(s) | Shape::Arrow(s) | Shape::Fib(s) => vec![
            Anchor {
                kind: AnchorKind::Endpoint1,
                at: s.start(),
            },
            Anchor {
                kind: AnchorKind::Endpoint2,
                at: s.end(),
            },
        ],
        Shape::Rectangle(s) => {
            let mut anchors: Vec<Anchor> = [
                (Corner::TopLeft, s.x1, s.y1),
                (Corner::TopRight, s.x2, s.y1),
                (Corner::BottomRight, s.x2, s.y2),
                (Corner::BottomLeft, s.x1, s.y2),
            ]
            .into_iter()
            .map(|(c, x, y)| Anchor {
                kind: AnchorKind::Corner(c),
                at: Point::new(x, y),
            })
            .collect();
            anchors.push(Anchor {
                kind: AnchorKind::Move,
                at: Point::new((s.x1 + s.x2) / 2.0, (s.y1 + s.y2) / 2.0),
            });
            anchors
        }
        Shape::Hline { y } => vec![Anchor {
            kind: AnchorKind::Move,
            at: Point::new(viewport.width / 2.0, *y),
        }],
        Shape::Text { x, y, .. } => vec![Anchor {
            kind: AnchorKind::Move,
            at: Point::new(*x, *y),
        }],
    }
}

/// Nearest handle within `tolerance` of `p`.
pub fn hit_anchor(shape: &Shape, p: Point, viewport: Viewport, tolerance: f64) -> Option<AnchorKind> {
    anchors_for(shape, viewport)
        .into_iter()
        .map(|a| (a.kind, a.at.distance(p)))
        .filter(|(_, d)| *d <= tolerance)
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(kind, _)| kind)
}

/// Whether `p` lies on the body of `shape`.
pub fn hits_body(shape: &Shape, p: Point, cfg: &HitConfig) -> bool {
    let tol = cfg.tolerance;
    match shape {
        Shape::Trendline(s) | Shape::Arrow(s) => distance_to_segment(p, s) <= tol,
        Shape::Rectangle(s) | Shape::Fib(s) => {
            let (left, top, right, bottom) = s.bounds();
            p.x >= left - tol && p.x <= right + tol && p.y >= top - tol && p.y <= bottom + tol
        }
        Shape::Hline { y } => (p.y - y).abs() <= tol,
        Shape::Text { x, y, text } => {
            let width = text.chars().count() as f64 * cfg.text_char_width;
            p.x >= x - tol && p.x <= x + width + tol && p.y >= y - cfg.text_height - tol && p.y <= y + tol
        }
    }
}

/// Index of the top-most shape under `p`. Later shapes are drawn on top.
pub fn hit_test(drawings: &[Shape], p: Point, cfg: &HitConfig) -> Option<usize> {
    drawings.iter().rposition(|s| hits_body(s, p, cfg))
}

/// Geometry after dragging `kind` to `to`; `delta` is the pointer movement since the last event.
///
/// An anchor that does not apply to the shape leaves it unchanged.
pub fn apply_anchor_drag(shape: &Shape, kind: AnchorKind, to: Point, delta: (f64, f64)) -> Shape {
    if kind == AnchorKind::Move {
        return shape.translated(delta.0, delta.1);
    }
    let mut next = shape.clone();
    let is_rect = matches!(shape, Shape::Rectangle(_));
    if let Some(seg) = next.segment_mut() {
        match kind {
            AnchorKind::Endpoint1 if !is_rect => set_start(seg, to),
            AnchorKind::Endpoint2 if !is_rect => set_end(seg, to),
            AnchorKind::Corner(corner) if is_rect => match corner {
                Corner::TopLeft => set_start(seg, to),
                Corner::TopRight => {
                    seg.x2 = to.x;
                    seg.y1 = to.y;
                }
                Corner::BottomRight => set_end(seg, to),
                Corner::BottomLeft => {
                    seg.x1 = to.x;
                    seg.y2 = to.y;
                }
            },
            _ => {}
        }
    }
    next
}

fn set_start(seg: &mut Segment, p: Point) {
    seg.x1 = p.x;
    seg.y1 = p.y;
}

fn set_end(seg: &mut Segment, p: Point) {
    seg.x2 = p.x;
    seg.y2 = p.y;
}

fn distance_to_segment(p: Point, s: &Segment) -> f64 {
    let (dx, dy) = (s.x2 - s.x1, s.y2 - s.y1);
    let len_sq = dx * dx + dy * dy;
    if len_sq == 0.0 {
        return p.distance(s.start());
    }
    let t = (((p.x - s.x1) * dx + (p.y - s.y1) * dy) / len_sq).clamp(0.0, 1.0);
    p.distance(Point::new(s.x1 + t * dx, s.y1 + t * dy))
}
