//! Annotation shapes drawn over the chart.
//!
//! Coordinates are chart-local pixels captured when the shape was drawn; they
//! are not re-projected when the chart pans or zooms.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance(self, other: Point) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

/// Two-point geometry shared by trendlines, rectangles, arrows and fib retracements.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Segment {
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
}

impl Segment {
    pub fn new(x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        Self { x1, y1, x2, y2 }
    }

    /// Degenerate segment at a single point, used to seed a draft.
    pub fn at(p: Point) -> Self {
        Self::new(p.x, p.y, p.x, p.y)
    }

    pub fn start(&self) -> Point {
        Point::new(self.x1, self.y1)
    }

    pub fn end(&self) -> Point {
        Point::new(self.x2, self.y2)
    }

    pub fn length(&self) -> f64 {
        self.start().distance(self.end())
    }

    pub fn translated(&self, dx: f64, dy: f64) -> Self {
        Self::new(self.x1 + dx, self.y1 + dy, self.x2 + dx, self.y2 + dy)
    }

    /// Axis-aligned bounds as (left, top, right, bottom).
    pub fn bounds(&self) -> (f64, f64, f64, f64) {
        (
            self.x1.min(self.x2),
            self.y1.min(self.y2),
            self.x1.max(self.x2),
            self.y1.max(self.y2),
        )
    }
}

/// A drawn annotation. The `type` tag selects which fields exist.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Shape {
    Trendline(Segment),
    Rectangle(Segment),
    Arrow(Segment),
    Fib(Segment),
    Hline { y: f64 },
    Text { x: f64, y: f64, text: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShapeKind {
    Trendline,
    Rectangle,
    Arrow,
    Fib,
    Hline,
    Text,
}

impl ShapeKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ShapeKind::Trendline => "trendline",
            ShapeKind::Rectangle => "rectangle",
            ShapeKind::Arrow => "arrow",
            ShapeKind::Fib => "fib",
            ShapeKind::Hline => "hline",
            ShapeKind::Text => "text",
        }
    }

    /// Kinds built by dragging from one point to another.
    pub fn is_two_point(self) -> bool {
        matches!(
            self,
            ShapeKind::Trendline | ShapeKind::Rectangle | ShapeKind::Arrow | ShapeKind::Fib
        )
    }

    /// Build a two-point shape of this kind. Returns `None` for hline and text.
    pub fn with_segment(self, seg: Segment) -> Option<Shape> {
        match self {
            ShapeKind::Trendline => Some(Shape::Trendline(seg)),
            ShapeKind::Rectangle => Some(Shape::Rectangle(seg)),
            ShapeKind::Arrow => Some(Shape::Arrow(seg)),
            ShapeKind::Fib => Some(Shape::Fib(seg)),
            ShapeKind::Hline | ShapeKind::Text => None,
        }
    }
}

impl fmt::Display for ShapeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Shape {
    pub fn kind(&self) -> ShapeKind {
        match self {
            Shape::Trendline(_) => ShapeKind::Trendline,
            Shape::Rectangle(_) => ShapeKind::Rectangle,
            Shape::Arrow(_) => ShapeKind::Arrow,
            Shape::Fib(_) => ShapeKind::Fib,
            Shape::Hline { .. } => ShapeKind::Hline,
            Shape::Text { .. } => ShapeKind::Text,
        }
    }

    pub fn segment(&self) -> Option<&Segment> {
        match self {
            Shape::Trendline(s) | Shape::Rectangle(s) | Shape::Arrow(s) | Shape::Fib(s) => Some(s),
            Shape::Hline { .. } | Shape::Text { .. } => None,
        }
    }

    pub fn segment_mut(&mut self) -> Option<&mut Segment> {
        match self {
            Shape::Trendline(s) | Shape::Rectangle(s) | Shape::Arrow(s) | Shape::Fib(s) => Some(s),
            Shape::Hline { .. } | Shape::Text { .. } => None,
        }
    }

    /// Copy of this shape moved by (dx, dy). Horizontal lines only move vertically.
    pub fn translated(&self, dx: f64, dy: f64) -> Shape {
        match self {
            Shape::Trendline(s) => Shape::Trendline(s.translated(dx, dy)),
            Shape::Rectangle(s) => Shape::Rectangle(s.translated(dx, dy)),
            Shape::Arrow(s) => Shape::Arrow(s.translated(dx, dy)),
            Shape::Fib(s) => Shape::Fib(s.translated(dx, dy)),
            Shape::Hline { y } => Shape::Hline { y: y + dy },
            Shape::Text { x, y, text } => Shape::Text {
                x: x + dx,
                y: y + dy,
                text: text.clone(),
            },
        }
    }
}
