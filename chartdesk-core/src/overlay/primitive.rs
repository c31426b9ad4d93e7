//! Visual primitives emitted by the overlay renderer.
//!
//! Front ends map these onto whatever they draw with (SVG, canvas, terminal
//! cells). Nothing here knows about a concrete toolkit.

use crate::domain::Point;
use crate::drawing::AnchorKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parse `#rrggbb`.
    pub fn from_hex(hex: &str) -> Option<Self> {
        let h = hex.strip_prefix('#')?;
        if h.len() != 6 {
            return None;
        }
        let c = |i: usize| u8::from_str_radix(h.get(i..i + 2)?, 16).ok();
        Some(Self::rgb(c(0)?, c(2)?, c(4)?))
    }

    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

pub mod palette {
    use super::Color;

    pub const TRENDLINE: Color = Color::rgb(0x00, 0x96, 0x88);
    pub const SELECTED: Color = Color::rgb(0x29, 0x62, 0xff);
    pub const RECTANGLE: Color = Color::rgb(0x29, 0x62, 0xff);
    pub const RECTANGLE_FILL: Color = Color::rgb(44, 130, 201);
    pub const HLINE: Color = Color::rgb(0x8e, 0x24, 0xaa);
    pub const TEXT: Color = Color::rgb(0x1e, 0x88, 0xe5);
    pub const ARROW: Color = Color::rgb(0x43, 0xa0, 0x47);
    pub const ALERT: Color = Color::rgb(0xfb, 0xc0, 0x2d);
    pub const HANDLE: Color = Color::rgb(0xff, 0xff, 0xff);

    pub const SMA: Color = Color::rgb(0x19, 0x76, 0xd2);
    pub const EMA: Color = Color::rgb(0xff, 0x98, 0x00);
    pub const RSI: Color = Color::rgb(0xf5, 0x00, 0x57);
    pub const MACD: Color = Color::rgb(0x00, 0x96, 0x88);
    pub const MACD_SIGNAL: Color = Color::rgb(0x9c, 0x27, 0xb0);
    pub const MACD_HISTOGRAM: Color = Color::rgb(0x78, 0x90, 0x9c);
    pub const BB_BAND: Color = Color::rgb(0x43, 0xa0, 0x47);
    pub const BB_MIDDLE: Color = Color::rgb(0x60, 0x7d, 0x8b);
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Stroke {
    pub color: Color,
    pub width: f64,
    pub dashed: bool,
    pub opacity: f64,
}

impl Stroke {
    pub fn solid(color: Color, width: f64) -> Self {
        Self {
            color,
            width,
            dashed: false,
            opacity: 1.0,
        }
    }

    pub fn dashed(color: Color, width: f64) -> Self {
        Self {
            dashed: true,
            ..Self::solid(color, width)
        }
    }

    pub fn with_opacity(self, opacity: f64) -> Self {
        Self { opacity, ..self }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Fill {
    pub color: Color,
    pub alpha: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Primitive {
    Line {
        from: Point,
        to: Point,
        stroke: Stroke,
        arrow_head: bool,
    },
    Polyline {
        series: String,
        points: Vec<Point>,
        stroke: Stroke,
    },
    Rect {
        origin: Point,
        width: f64,
        height: f64,
        stroke: Stroke,
        fill: Option<Fill>,
    },
    Label {
        at: Point,
        text: String,
        color: Color,
    },
    Handle {
        at: Point,
        anchor: AnchorKind,
    },
}
