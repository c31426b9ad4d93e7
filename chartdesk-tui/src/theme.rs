//! Parrot/neon theme tokens for the ChartDesk TUI.
//!
//! Chart-side colours come from the core palette (`overlay::palette`) so
//! drawings look the same in every front end; `to_tui` converts them.

use chartdesk_core::alerts::ToastLevel;
use chartdesk_core::overlay::Color as CoreColor;
use ratatui::style::{Color, Modifier, Style};

pub const ACCENT: Color = Color::Rgb(0, 255, 255);
pub const POSITIVE: Color = Color::Rgb(0, 255, 128);
pub const NEGATIVE: Color = Color::Rgb(255, 20, 147);
pub const WARNING: Color = Color::Rgb(255, 140, 0);
pub const NEUTRAL: Color = Color::Rgb(147, 112, 219);
pub const MUTED: Color = Color::Rgb(100, 149, 237);

#[derive(Debug, Clone, Copy)]
pub struct Theme {
    pub background: Color,
    pub accent: Color,
    /// Up candles.
    pub positive: Color,
    /// Down candles.
    pub negative: Color,
    pub warning: Color,
    pub neutral: Color,
    pub muted: Color,
    pub text_primary: Color,
    pub text_secondary: Color,
}

impl Default for Theme {
    fn default() -> Self {
        Self::parrot_neon()
    }
}

impl Theme {
    pub fn parrot_neon() -> Self {
        Self {
            background: Color::Rgb(18, 18, 20),
            accent: ACCENT,
            positive: POSITIVE,
            negative: NEGATIVE,
            warning: WARNING,
            neutral: NEUTRAL,
            muted: MUTED,
            text_primary: Color::White,
            text_secondary: Color::Rgb(170, 170, 170),
        }
    }

    pub fn candle_color(&self, open: f64, close: f64) -> Color {
        if close >= open {
            self.positive
        } else {
            self.negative
        }
    }

    pub fn toast_color(&self, level: ToastLevel) -> Color {
        match level {
            ToastLevel::Info => self.accent,
            ToastLevel::Success => self.positive,
            ToastLevel::Warning => self.warning,
            ToastLevel::Error => self.negative,
        }
    }

    /// RSI zone colour: overbought above 70, oversold below 30.
    pub fn rsi_color(&self, rsi: f64) -> Color {
        match rsi {
            v if v >= 70.0 => self.negative,
            v if v <= 30.0 => self.positive,
            _ => self.text_secondary,
        }
    }
}

pub fn to_tui(c: CoreColor) -> Color {
    Color::Rgb(c.r, c.g, c.b)
}

/// Blend a core colour towards the background by `opacity` (0..=1).
pub fn faded(c: CoreColor, opacity: f64) -> Color {
    let bg = (18.0, 18.0, 20.0);
    let o = opacity.clamp(0.0, 1.0);
    let mix = |fg: u8, bg: f64| (fg as f64 * o + bg * (1.0 - o)).round() as u8;
    Color::Rgb(mix(c.r, bg.0), mix(c.g, bg.1), mix(c.b, bg.2))
}

// ── Style helpers ─────────────────────────────────────────────────────

pub fn accent() -> Style {
    Style::default().fg(ACCENT)
}

pub fn accent_bold() -> Style {
    accent().add_modifier(Modifier::BOLD)
}

pub fn positive() -> Style {
    Style::default().fg(POSITIVE)
}

pub fn negative() -> Style {
    Style::default().fg(NEGATIVE)
}

pub fn warning() -> Style {
    Style::default().fg(WARNING)
}

pub fn neutral() -> Style {
    Style::default().fg(NEUTRAL)
}

pub fn muted() -> Style {
    Style::default().fg(MUTED)
}

pub fn panel_border(active: bool) -> Style {
    if active {
        accent()
    } else {
        muted()
    }
}

pub fn panel_title(active: bool) -> Style {
    if active {
        accent_bold()
    } else {
        muted()
    }
}
