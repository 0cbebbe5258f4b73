//! Chart dispatch: a [`ChartSpec`](crate::query::ChartSpec) plus the dataset
//! become a [`Figure`], the plot-ready data the UI draws with `egui_plot`.

pub mod dispatch;

pub use dispatch::dispatch;

use thiserror::Error;

use crate::query::ChartType;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ChartError {
    #[error("Column '{0}' not found in the dataset.")]
    MissingColumn(String),

    #[error("Column '{0}' has no numeric values to plot.")]
    NoNumericValues(String),

    #[error("No rows have values for both '{x}' and '{y}'.")]
    NoData { x: String, y: String },

    #[error("Column '{column}' has {count} categories; at most {limit} can be binned.")]
    TooManyCategories {
        column: String,
        count: usize,
        limit: usize,
    },

    #[error("'{0}' charts are not supported: they need geographic coordinates and map tiles.")]
    Unsupported(ChartType),
}

// ---------------------------------------------------------------------------
// Figure
// ---------------------------------------------------------------------------

/// Everything needed to draw one chart.
#[derive(Debug, Clone, PartialEq)]
pub struct Figure {
    pub chart_type: ChartType,
    pub x_label: String,
    pub y_label: String,
    /// Tick labels when the x axis is categorical (position `i` ↔ label `i`).
    pub x_categories: Option<Vec<String>>,
    /// Same for the y axis; only heatmaps use it.
    pub y_categories: Option<Vec<String>>,
    pub kind: FigureKind,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FigureKind {
    Bars { bars: Vec<BarDatum>, width: f64 },
    Line(Vec<[f64; 2]>),
    Scatter(Vec<[f64; 2]>),
    Histogram(Vec<HistogramBin>),
    Pie(Vec<PieSlice>),
    Box(Vec<BoxSummary>),
    Heatmap(Heatmap),
    Violin(Vec<ViolinShape>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct BarDatum {
    pub label: String,
    pub position: f64,
    pub height: f64,
}

/// A histogram bar spanning `[start, end)` whose height is the sum of y.
#[derive(Debug, Clone, PartialEq)]
pub struct HistogramBin {
    pub start: f64,
    pub end: f64,
    pub total: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PieSlice {
    pub label: String,
    pub value: f64,
}

impl PieSlice {
    /// Fraction of the whole pie, in `[0, 1]`.
    pub fn share(&self, slices: &[PieSlice]) -> f64 {
        let total: f64 = slices.iter().map(|s| s.value).sum();
        if total > 0.0 {
            self.value / total
        } else {
            0.0
        }
    }
}

/// Five-number summary with Tukey whiskers.
#[derive(Debug, Clone, PartialEq)]
pub struct BoxSummary {
    pub label: String,
    pub position: f64,
    pub lower_whisker: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub upper_whisker: f64,
    pub outliers: Vec<f64>,
}

/// Row counts over a grid; `counts[xi][yi]` covers
/// `[x_edges[xi], x_edges[xi + 1])` × `[y_edges[yi], y_edges[yi + 1])`.
#[derive(Debug, Clone, PartialEq)]
pub struct Heatmap {
    pub x_edges: Vec<f64>,
    pub y_edges: Vec<f64>,
    pub counts: Vec<Vec<u32>>,
    pub max_count: u32,
}

/// Kernel density outline: `(y, half_width)` pairs, widest point 0.4.
#[derive(Debug, Clone, PartialEq)]
pub struct ViolinShape {
    pub label: String,
    pub position: f64,
    pub outline: Vec<[f64; 2]>,
    pub median: f64,
}
