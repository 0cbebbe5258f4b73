//! Query interpretation: from a free-text question to a [`ChartSpec`].
//!
//! ```text
//!  query ──► extract (entities) ──► ExtractedIntent
//!                                        │ no chart type?
//!                                        ▼
//!                                  resolve (model)
//!                                        │
//!                                        ▼
//!                                    ChartSpec ──► chart::dispatch
//! ```

pub mod extract;
pub mod pipeline;
pub mod resolve;
pub mod summary;

use std::fmt;

use thiserror::Error;

use crate::chart::ChartError;

// ---------------------------------------------------------------------------
// ChartType
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChartType {
    Bar,
    Line,
    Scatter,
    Histogram,
    Pie,
    Box,
    Heatmap,
    Violin,
    Map,
}

impl ChartType {
    pub const ALL: [ChartType; 9] = [
        ChartType::Bar,
        ChartType::Line,
        ChartType::Scatter,
        ChartType::Histogram,
        ChartType::Pie,
        ChartType::Box,
        ChartType::Heatmap,
        ChartType::Violin,
        ChartType::Map,
    ];

    pub fn label(self) -> &'static str {
        match self {
            ChartType::Bar => "bar",
            ChartType::Line => "line",
            ChartType::Scatter => "scatter",
            ChartType::Histogram => "histogram",
            ChartType::Pie => "pie",
            ChartType::Box => "box",
            ChartType::Heatmap => "heatmap",
            ChartType::Violin => "violin",
            ChartType::Map => "map",
        }
    }

    /// Exact match against the lowercase labels.
    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.label() == label)
    }
}

impl fmt::Display for ChartType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// ---------------------------------------------------------------------------
// Intent and spec
// ---------------------------------------------------------------------------

/// What the entity extractor pulled out of a query.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractedIntent {
    pub chart_type: Option<String>,
    /// Quantity entities in detection order.
    pub attributes: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChartSpec {
    pub chart_type: ChartType,
    pub x: String,
    pub y: String,
}

impl ChartSpec {
    /// Take the first two attributes positionally as x and y.
    pub fn from_attributes(chart_type: ChartType, attributes: &[String]) -> Result<Self, QueryError> {
        match attributes {
            [x, y, ..] => Ok(Self {
                chart_type,
                x: x.clone(),
                y: y.clone(),
            }),
            _ => Err(QueryError::NotEnoughAttributes),
        }
    }
}

// ---------------------------------------------------------------------------
// Errors shown inline under the query box
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Error)]
pub enum QueryError {
    #[error("Not enough attributes found for the query.")]
    NotEnoughAttributes,

    #[error("Unsupported chart type: '{0}'")]
    UnsupportedChartType(String),

    #[error(transparent)]
    Chart(#[from] ChartError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_round_trip() {
        for t in ChartType::ALL {
            assert_eq!(ChartType::from_label(t.label()), Some(t));
        }
        assert_eq!(ChartType::from_label("Bar"), None);
        assert_eq!(ChartType::from_label("area"), None);
    }

    #[test]
    fn spec_takes_first_two_attributes() {
        let attrs = vec!["revenue".to_string(), "2023".to_string(), "units".to_string()];
        let spec = ChartSpec::from_attributes(ChartType::Bar, &attrs).unwrap();
        assert_eq!(spec.x, "revenue");
        assert_eq!(spec.y, "2023");
    }

    #[test]
    fn spec_needs_two_attributes() {
        let err = ChartSpec::from_attributes(ChartType::Bar, &["revenue".to_string()]).unwrap_err();
        assert_eq!(err, QueryError::NotEnoughAttributes);
        assert_eq!(err.to_string(), "Not enough attributes found for the query.");
    }
}
