use eframe::egui::{ScrollArea, Ui};
use egui_extras::{Column as TableColumn, TableBuilder};

use crate::data::model::Dataset;
use crate::data::stats::ColumnStats;

/// Rows shown in the preview panel.
pub const PREVIEW_ROWS: usize = 5;

// ---------------------------------------------------------------------------
// Preview / statistics tables
// ---------------------------------------------------------------------------

pub fn preview_table(ui: &mut Ui, dataset: &Dataset) {
    let headers = dataset.column_names();
    let rows: Vec<Vec<String>> = dataset
        .head(PREVIEW_ROWS)
        .into_iter()
        .map(|row| row.into_iter().map(|v| v.to_string()).collect())
        .collect();
    grid(ui, "preview_table", &headers, &rows);
}

/// One row per column of the dataset (the transposed `describe` layout).
pub fn statistics_table(ui: &mut Ui, stats: &[ColumnStats]) {
    let rows: Vec<Vec<String>> = stats.iter().map(ColumnStats::cells).collect();
    grid(ui, "statistics_table", &ColumnStats::HEADERS, &rows);
}

fn grid(ui: &mut Ui, id: &str, headers: &[&str], rows: &[Vec<String>]) {
    ui.push_id(id, |ui: &mut Ui| {
        ScrollArea::horizontal().show(ui, |ui: &mut Ui| {
            TableBuilder::new(ui)
                .striped(true)
                .resizable(true)
                .vscroll(false)
                .columns(TableColumn::auto().at_least(60.0), headers.len())
                .header(20.0, |mut header| {
                    for h in headers {
                        header.col(|ui: &mut Ui| {
                            ui.strong(*h);
                        });
                    }
                })
                .body(|mut body| {
                    for row in rows {
                        body.row(18.0, |mut table_row| {
                            for cell in row {
                                table_row.col(|ui: &mut Ui| {
                                    ui.label(cell.as_str());
                                });
                            }
                        });
                    }
                });
        });
    });
}
