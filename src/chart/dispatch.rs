use std::collections::HashMap;

use super::{
    BarDatum, BoxSummary, ChartError, Figure, FigureKind, Heatmap, HistogramBin, PieSlice,
    ViolinShape,
};
use crate::data::model::{Column, Dataset, Value};
use crate::data::stats::quantile;
use crate::query::{ChartSpec, ChartType};

/// Samples along each violin outline.
const VIOLIN_SAMPLES: usize = 64;
const VIOLIN_HALF_WIDTH: f64 = 0.4;
/// Upper bound on bins per axis, numeric or categorical.
const MAX_BINS: usize = 50;

/// Turn a chart spec into plot-ready data.
pub fn dispatch(spec: &ChartSpec, dataset: &Dataset) -> Result<Figure, ChartError> {
    let x_col = dataset
        .column(&spec.x)
        .ok_or_else(|| ChartError::MissingColumn(spec.x.clone()))?;
    let y_col = dataset
        .column(&spec.y)
        .ok_or_else(|| ChartError::MissingColumn(spec.y.clone()))?;

    log::debug!(
        "Dispatching {} chart: x='{}' y='{}'",
        spec.chart_type,
        spec.x,
        spec.y
    );

    let mut figure = Figure {
        chart_type: spec.chart_type,
        x_label: spec.x.clone(),
        y_label: spec.y.clone(),
        x_categories: None,
        y_categories: None,
        kind: FigureKind::Line(Vec::new()),
    };

    let kind = match spec.chart_type {
        ChartType::Bar => bar(x_col, y_col, &mut figure)?,
        ChartType::Line => FigureKind::Line(points(x_col, y_col, &mut figure)?),
        ChartType::Scatter => FigureKind::Scatter(points(x_col, y_col, &mut figure)?),
        ChartType::Histogram => histogram(x_col, y_col, &mut figure)?,
        ChartType::Pie => pie(x_col, y_col)?,
        ChartType::Box => box_plot(x_col, y_col, &mut figure)?,
        ChartType::Heatmap => heatmap(x_col, y_col, &mut figure)?,
        ChartType::Violin => violin(x_col, y_col, &mut figure)?,
        ChartType::Map => return Err(ChartError::Unsupported(ChartType::Map)),
    };
    figure.kind = kind;
    Ok(figure)
}

// ---------------------------------------------------------------------------
// Axis handling
// ---------------------------------------------------------------------------

/// Positions along one axis. Numeric columns keep their values; anything
/// else is numbered by category in order of first appearance.
struct Axis {
    positions: Vec<Option<f64>>,
    categories: Option<Vec<String>>,
}

impl Axis {
    fn from_column(col: &Column) -> Self {
        if col.is_numeric() {
            return Self {
                positions: col.values.iter().map(Value::as_f64).collect(),
                categories: None,
            };
        }
        let mut labels: Vec<String> = Vec::new();
        let mut index: HashMap<String, usize> = HashMap::new();
        let positions = col
            .values
            .iter()
            .map(|v| {
                if v.is_null() {
                    return None;
                }
                let label = v.to_string();
                let idx = *index.entry(label).or_insert_with_key(|label| {
                    labels.push(label.clone());
                    labels.len() - 1
                });
                Some(idx as f64)
            })
            .collect();
        Self {
            positions,
            categories: Some(labels),
        }
    }

    /// Categorical axes get one bin per category, so their size is bounded
    /// like the numeric bin count.
    fn binnable(col: &Column) -> Result<Self, ChartError> {
        let axis = Self::from_column(col);
        match &axis.categories {
            Some(labels) if labels.len() > MAX_BINS => Err(ChartError::TooManyCategories {
                column: col.name.clone(),
                count: labels.len(),
                limit: MAX_BINS,
            }),
            _ => Ok(axis),
        }
    }
}

fn numeric_values(col: &Column) -> Result<Vec<Option<f64>>, ChartError> {
    let values: Vec<Option<f64>> = col.values.iter().map(Value::as_f64).collect();
    if values.iter().all(Option::is_none) {
        return Err(ChartError::NoNumericValues(col.name.clone()));
    }
    Ok(values)
}

fn no_data(x: &Column, y: &Column) -> ChartError {
    ChartError::NoData {
        x: x.name.clone(),
        y: y.name.clone(),
    }
}

/// Group numeric y by the string form of x, in order of first appearance.
fn groups(x: &Column, y: &[Option<f64>]) -> Vec<(String, Vec<f64>)> {
    let mut out: Vec<(String, Vec<f64>)> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();
    for (xv, yv) in x.values.iter().zip(y) {
        let Some(yv) = yv else { continue };
        if xv.is_null() {
            continue;
        }
        let key = xv.to_string();
        match index.get(&key) {
            Some(&i) => out[i].1.push(*yv),
            None => {
                index.insert(key.clone(), out.len());
                out.push((key, vec![*yv]));
            }
        }
    }
    out
}

// ---------------------------------------------------------------------------
// Per-type builders
// ---------------------------------------------------------------------------

fn bar(x: &Column, y: &Column, figure: &mut Figure) -> Result<FigureKind, ChartError> {
    let yv = numeric_values(y)?;
    let grouped = groups(x, &yv);
    if grouped.is_empty() {
        return Err(no_data(x, y));
    }

    let numeric_x = x.is_numeric();
    let bars: Vec<BarDatum> = grouped
        .iter()
        .enumerate()
        .map(|(i, (label, vals))| BarDatum {
            label: label.clone(),
            position: if numeric_x {
                label.parse().unwrap_or(i as f64)
            } else {
                i as f64
            },
            height: vals.iter().sum(),
        })
        .collect();

    let width = if numeric_x {
        let mut pos: Vec<f64> = bars.iter().map(|b| b.position).collect();
        pos.sort_by(f64::total_cmp);
        pos.windows(2)
            .map(|w| w[1] - w[0])
            .filter(|d| *d > 0.0)
            .fold(None, |acc: Option<f64>, d| Some(acc.map_or(d, |a| a.min(d))))
            .map_or(0.8, |gap| gap * 0.8)
    } else {
        figure.x_categories = Some(grouped.into_iter().map(|(l, _)| l).collect());
        0.8
    };

    Ok(FigureKind::Bars { bars, width })
}

fn points(x: &Column, y: &Column, figure: &mut Figure) -> Result<Vec<[f64; 2]>, ChartError> {
    let yv = numeric_values(y)?;
    let axis = Axis::from_column(x);
    let pts: Vec<[f64; 2]> = axis
        .positions
        .iter()
        .zip(&yv)
        .filter_map(|(xp, yp)| Some([(*xp)?, (*yp)?]))
        .collect();
    if pts.is_empty() {
        return Err(no_data(x, y));
    }
    figure.x_categories = axis.categories;
    Ok(pts)
}

/// Bins over x with y summed per bin.
fn histogram(x: &Column, y: &Column, figure: &mut Figure) -> Result<FigureKind, ChartError> {
    let yv = numeric_values(y)?;
    let axis = Axis::binnable(x)?;
    let pairs: Vec<(f64, f64)> = axis
        .positions
        .iter()
        .zip(&yv)
        .filter_map(|(xp, yp)| Some(((*xp)?, (*yp)?)))
        .collect();
    if pairs.is_empty() {
        return Err(no_data(x, y));
    }

    let xs: Vec<f64> = pairs.iter().map(|(xp, _)| *xp).collect();
    let edges = bin_edges(&xs, axis.categories.as_ref().map(Vec::len));
    let mut totals = vec![0.0; edges.len() - 1];
    for (xp, yp) in &pairs {
        if let Some(i) = bin_index(&edges, *xp) {
            totals[i] += yp;
        }
    }

    let bins = edges
        .windows(2)
        .zip(totals)
        .map(|(w, total)| HistogramBin {
            start: w[0],
            end: w[1],
            total,
        })
        .collect();
    figure.x_categories = axis.categories;
    Ok(FigureKind::Histogram(bins))
}

/// Slices named by x, sized by the sum of y; empty or negative slices are dropped.
fn pie(x: &Column, y: &Column) -> Result<FigureKind, ChartError> {
    let yv = numeric_values(y)?;
    let slices: Vec<PieSlice> = groups(x, &yv)
        .into_iter()
        .map(|(label, vals)| PieSlice {
            label,
            value: vals.iter().sum(),
        })
        .filter(|s| s.value > 0.0)
        .collect();
    if slices.is_empty() {
        return Err(no_data(x, y));
    }
    Ok(FigureKind::Pie(slices))
}

fn box_plot(x: &Column, y: &Column, figure: &mut Figure) -> Result<FigureKind, ChartError> {
    let yv = numeric_values(y)?;
    let grouped = groups(x, &yv);
    if grouped.is_empty() {
        return Err(no_data(x, y));
    }

    let mut labels = Vec::with_capacity(grouped.len());
    let mut boxes = Vec::with_capacity(grouped.len());
    for (i, (label, mut vals)) in grouped.into_iter().enumerate() {
        vals.sort_by(f64::total_cmp);
        if let Some(summary) = box_summary(&label, i as f64, &vals) {
            boxes.push(summary);
        }
        labels.push(label);
    }
    figure.x_categories = Some(labels);
    Ok(FigureKind::Box(boxes))
}

fn box_summary(label: &str, position: f64, sorted: &[f64]) -> Option<BoxSummary> {
    let q1 = quantile(sorted, 0.25)?;
    let median = quantile(sorted, 0.5)?;
    let q3 = quantile(sorted, 0.75)?;
    let iqr = q3 - q1;
    let (lo_fence, hi_fence) = (q1 - 1.5 * iqr, q3 + 1.5 * iqr);

    let inside: Vec<f64> = sorted
        .iter()
        .copied()
        .filter(|v| *v >= lo_fence && *v <= hi_fence)
        .collect();
    let outliers = sorted
        .iter()
        .copied()
        .filter(|v| *v < lo_fence || *v > hi_fence)
        .collect();

    Some(BoxSummary {
        label: label.to_string(),
        position,
        lower_whisker: inside.first().copied().unwrap_or(q1),
        q1,
        median,
        q3,
        upper_whisker: inside.last().copied().unwrap_or(q3),
        outliers,
    })
}

/// Count density of x against y.
fn heatmap(x: &Column, y: &Column, figure: &mut Figure) -> Result<FigureKind, ChartError> {
    let x_axis = Axis::binnable(x)?;
    let y_axis = Axis::binnable(y)?;
    let pairs: Vec<(f64, f64)> = x_axis
        .positions
        .iter()
        .zip(&y_axis.positions)
        .filter_map(|(xp, yp)| Some(((*xp)?, (*yp)?)))
        .collect();
    if pairs.is_empty() {
        return Err(no_data(x, y));
    }

    let xs: Vec<f64> = pairs.iter().map(|p| p.0).collect();
    let ys: Vec<f64> = pairs.iter().map(|p| p.1).collect();
    let x_edges = bin_edges(&xs, x_axis.categories.as_ref().map(Vec::len));
    let y_edges = bin_edges(&ys, y_axis.categories.as_ref().map(Vec::len));

    let mut counts = vec![vec![0u32; y_edges.len() - 1]; x_edges.len() - 1];
    for (xp, yp) in &pairs {
        if let (Some(xi), Some(yi)) = (bin_index(&x_edges, *xp), bin_index(&y_edges, *yp)) {
            counts[xi][yi] += 1;
        }
    }
    let max_count = counts.iter().flatten().copied().max().unwrap_or(0);

    figure.x_categories = x_axis.categories;
    figure.y_categories = y_axis.categories;
    Ok(FigureKind::Heatmap(Heatmap {
        x_edges,
        y_edges,
        counts,
        max_count,
    }))
}

fn violin(x: &Column, y: &Column, figure: &mut Figure) -> Result<FigureKind, ChartError> {
    let yv = numeric_values(y)?;
    let grouped = groups(x, &yv);
    if grouped.is_empty() {
        return Err(no_data(x, y));
    }

    let mut labels = Vec::with_capacity(grouped.len());
    let mut shapes = Vec::with_capacity(grouped.len());
    for (i, (label, mut vals)) in grouped.into_iter().enumerate() {
        vals.sort_by(f64::total_cmp);
        shapes.push(ViolinShape {
            label: label.clone(),
            position: i as f64,
            outline: kde_outline(&vals),
            median: quantile(&vals, 0.5).unwrap_or_default(),
        });
        labels.push(label);
    }
    figure.x_categories = Some(labels);
    Ok(FigureKind::Violin(shapes))
}

/// Gaussian KDE with Scott's bandwidth, sampled from `min - 2h` to
/// `max + 2h` and scaled so the widest point is [`VIOLIN_HALF_WIDTH`].
fn kde_outline(sorted: &[f64]) -> Vec<[f64; 2]> {
    let n = sorted.len() as f64;
    let mean = sorted.iter().sum::<f64>() / n;
    let var = if sorted.len() > 1 {
        sorted.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0)
    } else {
        0.0
    };
    let sigma = var.sqrt();
    let h = if sigma > 0.0 {
        sigma * n.powf(-0.2)
    } else {
        // Degenerate sample: a narrow bump around the single value.
        (mean.abs() * 0.05).max(0.5)
    };

    let (lo, hi) = (sorted[0] - 2.0 * h, sorted[sorted.len() - 1] + 2.0 * h);
    let step = (hi - lo) / (VIOLIN_SAMPLES - 1) as f64;
    let density: Vec<[f64; 2]> = (0..VIOLIN_SAMPLES)
        .map(|i| {
            let at = lo + step * i as f64;
            let d: f64 = sorted
                .iter()
                .map(|v| (-0.5 * ((at - v) / h).powi(2)).exp())
                .sum();
            [at, d]
        })
        .collect();

    let peak = density.iter().map(|p| p[1]).fold(0.0, f64::max);
    density
        .into_iter()
        .map(|[at, d]| [at, if peak > 0.0 { d / peak * VIOLIN_HALF_WIDTH } else { 0.0 }])
        .collect()
}

// ---------------------------------------------------------------------------
// Binning
// ---------------------------------------------------------------------------

/// Bin edges: one unit-wide bin per category, otherwise Sturges' rule over
/// the data range.
fn bin_edges(values: &[f64], categories: Option<usize>) -> Vec<f64> {
    if let Some(n) = categories {
        return (0..=n).map(|i| i as f64 - 0.5).collect();
    }

    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if (max - min).abs() < f64::EPSILON {
        return vec![min - 0.5, min + 0.5];
    }
    let k = ((values.len() as f64).log2().ceil() as usize + 1).clamp(1, MAX_BINS);
    let width = (max - min) / k as f64;
    (0..=k).map(|i| min + width * i as f64).collect()
}

/// Index of the bin containing `v`; the last bin is closed on the right.
fn bin_index(edges: &[f64], v: f64) -> Option<usize> {
    let last = edges.len().checked_sub(2)?;
    if v < edges[0] || v > edges[last + 1] {
        return None;
    }
    let idx = edges[1..].iter().position(|e| v < *e).unwrap_or(last);
    Some(idx.min(last))
}
