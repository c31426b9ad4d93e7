//! Drawing tools selectable in the toolbar.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::ShapeKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tool {
    #[default]
    Select,
    Trendline,
    Rectangle,
    Arrow,
    Fib,
    Hline,
    Text,
    Erase,
}

impl Tool {
    pub const ALL: [Tool; 8] = [
        Tool::Select,
        Tool::Trendline,
        Tool::Rectangle,
        Tool::Arrow,
        Tool::Fib,
        Tool::Hline,
        Tool::Text,
        Tool::Erase,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Tool::Select => "select",
            Tool::Trendline => "trendline",
            Tool::Rectangle => "rectangle",
            Tool::Arrow => "arrow",
            Tool::Fib => "fib",
            Tool::Hline => "hline",
            Tool::Text => "text",
            Tool::Erase => "erase",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Tool::Select => "Select",
            Tool::Trendline => "Trendline",
            Tool::Rectangle => "Rectangle",
            Tool::Arrow => "Arrow",
            Tool::Fib => "Fib Retracement",
            Tool::Hline => "Horizontal Line",
            Tool::Text => "Text",
            Tool::Erase => "Erase All",
        }
    }

    /// The shape this tool produces, if any.
    pub fn shape_kind(self) -> Option<ShapeKind> {
        match self {
            Tool::Trendline => Some(ShapeKind::Trendline),
            Tool::Rectangle => Some(ShapeKind::Rectangle),
            Tool::Arrow => Some(ShapeKind::Arrow),
            Tool::Fib => Some(ShapeKind::Fib),
            Tool::Hline => Some(ShapeKind::Hline),
            Tool::Text => Some(ShapeKind::Text),
            Tool::Select | Tool::Erase => None,
        }
    }

    /// Tools that build a shape by dragging between two points.
    pub fn is_drag_tool(self) -> bool {
        self.shape_kind().is_some_and(ShapeKind::is_two_point)
    }
}

impl fmt::Display for Tool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Tool {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Tool::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| format!("unknown tool '{s}'"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drag_tools() {
        let drag: Vec<Tool> = Tool::ALL.into_iter().filter(|t| t.is_drag_tool()).collect();
        assert_eq!(drag, vec![Tool::Trendline, Tool::Rectangle, Tool::Arrow, Tool::Fib]);
    }

    #[test]
    fn parse_names() {
        for tool in Tool::ALL {
            assert_eq!(tool.as_str().parse::<Tool>(), Ok(tool));
        }
        assert!("lasso".parse::<Tool>().is_err());
    }
}
