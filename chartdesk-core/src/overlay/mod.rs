//! Overlay rendering: shapes, drafts, handles, alert markers and indicator lines.

pub mod primitive;
pub mod render;
pub mod scale;

pub use primitive::{palette, Color, Fill, Primitive, Stroke};
pub use render::{
    is_price_overlay, render, render_series, render_shape, series_style, AlertMarker, OverlayOptions,
    ALERT_GLYPH, DRAFT_OPACITY, FIB_LEVELS,
};
pub use scale::{project_series, ChartScale};
