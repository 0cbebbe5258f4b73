use std::f64::consts::TAU;

use eframe::egui::{Color32, Stroke, Ui};
use egui_plot::{
    Bar, BarChart, BoxElem, BoxPlot, BoxSpread, Legend, Line, Plot, PlotPoints, PlotUi, Points,
    Polygon,
};

use crate::chart::{
    BarDatum, BoxSummary, Figure, FigureKind, Heatmap, HistogramBin, PieSlice, ViolinShape,
};
use crate::color::{generate_palette, heat_color};
use crate::state::AppState;

const PLOT_HEIGHT: f32 = 420.0;

// ---------------------------------------------------------------------------
// Chart (central panel, below the data panels)
// ---------------------------------------------------------------------------

/// Render the chart for the last answered query, if it produced one.
pub fn chart_view(ui: &mut Ui, state: &AppState) {
    let Some(figure) = state.answer.as_ref().and_then(|a| a.figure.as_ref().ok()) else {
        if state.dataset().is_some() {
            ui.weak("Ask a question to see a chart.");
        }
        return;
    };

    ui.heading(format!(
        "{} chart: {} vs {}",
        figure.chart_type, figure.x_label, figure.y_label
    ));
    draw_figure(ui, figure);
}

fn draw_figure(ui: &mut Ui, figure: &Figure) {
    let mut plot = Plot::new("chart_plot")
        .height(PLOT_HEIGHT)
        .legend(Legend::default())
        .allow_boxed_zoom(true)
        .allow_drag(true)
        .allow_scroll(true)
        .allow_zoom(true);

    if let FigureKind::Pie(_) = figure.kind {
        plot = plot.data_aspect(1.0).show_axes(false).show_grid(false);
    } else {
        plot = plot
            .x_axis_label(figure.x_label.clone())
            .y_axis_label(figure.y_label.clone());
    }

    if let Some(categories) = figure.x_categories.clone() {
        plot = plot.x_axis_formatter(move |mark, _range| category_label(&categories, mark.value));
    }
    if let Some(categories) = figure.y_categories.clone() {
        plot = plot.y_axis_formatter(move |mark, _range| category_label(&categories, mark.value));
    }

    plot.show(ui, |plot_ui| match &figure.kind {
        FigureKind::Bars { bars, width } => draw_bars(plot_ui, figure, bars, *width),
        FigureKind::Line(points) => {
            let pts: PlotPoints = points.iter().copied().collect();
            plot_ui.line(Line::new(pts).name(&figure.y_label).width(2.0));
        }
        FigureKind::Scatter(points) => {
            let pts: PlotPoints = points.iter().copied().collect();
            plot_ui.points(Points::new(pts).name(&figure.y_label).radius(3.0));
        }
        FigureKind::Histogram(bins) => draw_histogram(plot_ui, figure, bins),
        FigureKind::Pie(slices) => draw_pie(plot_ui, slices),
        FigureKind::Box(boxes) => draw_boxes(plot_ui, boxes),
        FigureKind::Heatmap(map) => draw_heatmap(plot_ui, map),
        FigureKind::Violin(shapes) => draw_violins(plot_ui, shapes),
    });
}

/// Tick text for a categorical axis; only integer positions get a label.
fn category_label(categories: &[String], value: f64) -> String {
    let idx = value.round();
    if (value - idx).abs() > 1e-6 || idx < 0.0 {
        return String::new();
    }
    categories.get(idx as usize).cloned().unwrap_or_default()
}

// ---------------------------------------------------------------------------
// Per-kind drawing
// ---------------------------------------------------------------------------

fn draw_bars(plot_ui: &mut PlotUi, figure: &Figure, bars: &[BarDatum], width: f64) {
    let bars: Vec<Bar> = bars
        .iter()
        .map(|b| Bar::new(b.position, b.height).width(width).name(&b.label))
        .collect();
    plot_ui.bar_chart(
        BarChart::new(bars)
            .name(&figure.y_label)
            .color(Color32::LIGHT_BLUE),
    );
}

fn draw_histogram(plot_ui: &mut PlotUi, figure: &Figure, bins: &[HistogramBin]) {
    let bars: Vec<Bar> = bins
        .iter()
        .map(|b| Bar::new((b.start + b.end) / 2.0, b.total).width(b.end - b.start))
        .collect();
    plot_ui.bar_chart(
        BarChart::new(bars)
            .name(format!("sum of {}", figure.y_label))
            .color(Color32::LIGHT_BLUE),
    );
}

/// Sectors are split into pieces of at most a quarter turn so every
/// polygon stays convex.
fn draw_pie(plot_ui: &mut PlotUi, slices: &[PieSlice]) {
    let colours = generate_palette(slices.len());
    let mut start = 0.0_f64;
    for (slice, colour) in slices.iter().zip(colours) {
        let sweep = slice.share(slices) * TAU;
        let name = format!("{} ({:.1}%)", slice.label, slice.share(slices) * 100.0);
        let pieces = (sweep / (TAU / 4.0)).ceil().max(1.0) as usize;
        for p in 0..pieces {
            let a0 = start + sweep * p as f64 / pieces as f64;
            let a1 = start + sweep * (p + 1) as f64 / pieces as f64;
            let steps = (((a1 - a0) / TAU) * 96.0).ceil().max(2.0) as usize;
            let mut pts = vec![[0.0, 0.0]];
            pts.extend((0..=steps).map(|s| {
                let a = a0 + (a1 - a0) * s as f64 / steps as f64;
                [a.cos(), a.sin()]
            }));
            plot_ui.polygon(
                Polygon::new(PlotPoints::from(pts))
                    .fill_color(colour)
                    .stroke(Stroke::new(1.0, Color32::WHITE))
                    .name(&name),
            );
        }
        start += sweep;
    }
}

fn draw_boxes(plot_ui: &mut PlotUi, boxes: &[BoxSummary]) {
    let colours = generate_palette(boxes.len());
    let elems: Vec<BoxElem> = boxes
        .iter()
        .zip(&colours)
        .map(|(b, colour)| {
            BoxElem::new(
                b.position,
                BoxSpread::new(b.lower_whisker, b.q1, b.median, b.q3, b.upper_whisker),
            )
            .name(&b.label)
            .box_width(0.5)
            .whisker_width(0.3)
            .fill(colour.gamma_multiply(0.4))
            .stroke(Stroke::new(1.5, *colour))
        })
        .collect();
    plot_ui.box_plot(BoxPlot::new(elems));

    let outliers: PlotPoints = boxes
        .iter()
        .flat_map(|b| b.outliers.iter().map(move |v| [b.position, *v]))
        .collect();
    plot_ui.points(Points::new(outliers).name("outliers").radius(2.5));
}

fn draw_heatmap(plot_ui: &mut PlotUi, map: &Heatmap) {
    if map.max_count == 0 {
        return;
    }
    for (xi, column) in map.counts.iter().enumerate() {
        for (yi, &count) in column.iter().enumerate() {
            if count == 0 {
                continue;
            }
            let (x0, x1) = (map.x_edges[xi], map.x_edges[xi + 1]);
            let (y0, y1) = (map.y_edges[yi], map.y_edges[yi + 1]);
            let colour = heat_color(count as f64 / map.max_count as f64);
            plot_ui.polygon(
                Polygon::new(PlotPoints::from(vec![[x0, y0], [x1, y0], [x1, y1], [x0, y1]]))
                    .fill_color(colour)
                    .stroke(Stroke::NONE),
            );
        }
    }
}

/// Filled as a stack of symmetric trapezoids (each convex), outlined by a line.
fn draw_violins(plot_ui: &mut PlotUi, shapes: &[ViolinShape]) {
    let colours = generate_palette(shapes.len());
    for (shape, colour) in shapes.iter().zip(colours) {
        let c = shape.position;
        for pair in shape.outline.windows(2) {
            let ([y0, w0], [y1, w1]) = (pair[0], pair[1]);
            plot_ui.polygon(
                Polygon::new(PlotPoints::from(vec![
                    [c - w0, y0],
                    [c + w0, y0],
                    [c + w1, y1],
                    [c - w1, y1],
                ]))
                .fill_color(colour.gamma_multiply(0.4))
                .stroke(Stroke::NONE),
            );
        }

        let outline: PlotPoints = shape
            .outline
            .iter()
            .map(|[y, w]| [c + w, *y])
            .chain(shape.outline.iter().rev().map(|[y, w]| [c - w, *y]))
            .collect();
        plot_ui.line(Line::new(outline).name(&shape.label).color(colour).width(1.5));

        let median = vec![[c - 0.2, shape.median], [c + 0.2, shape.median]];
        plot_ui.line(Line::new(PlotPoints::from(median)).color(Color32::WHITE).width(2.0));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_ticks_only_at_integer_positions() {
        let cats = vec!["north".to_string(), "south".to_string()];
        assert_eq!(category_label(&cats, 0.0), "north");
        assert_eq!(category_label(&cats, 1.0000000001), "south");
        assert_eq!(category_label(&cats, 0.5), "");
        assert_eq!(category_label(&cats, 2.0), "");
        assert_eq!(category_label(&cats, -1.0), "");
    }
}
