//! Domain types for ChartDesk

pub mod bar;
pub mod series;
pub mod shape;
pub mod timeframe;

pub use bar::{is_monotonic, Bar};
pub use series::{round4, to_series, Series, SeriesPoint};
pub use shape::{Point, Segment, Shape, ShapeKind};
pub use timeframe::{ParseTimeframeError, Timeframe};

/// Symbol type alias
pub type Symbol = String;
