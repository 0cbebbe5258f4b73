use eframe::egui::{self, Color32, Key, RichText, ScrollArea, Ui};

use crate::state::{AppState, Busy};
use crate::ui::table;
use crate::worker::{Job, Worker};

/// Extensions offered by the file picker. `.txt` is offered but rejected
/// by the loader, which reports it as unsupported.
const PICKER_EXTENSIONS: [&str; 5] = ["csv", "xlsx", "json", "parquet", "txt"];

// ---------------------------------------------------------------------------
// Left side panel – upload and query
// ---------------------------------------------------------------------------

/// Render the left panel: upload button, query box and query feedback.
pub fn side_panel(ui: &mut Ui, state: &mut AppState, worker: &Worker) {
    ui.heading("Interactive Data Visualization");
    ui.label("Upload your data file and enter your query below:");
    ui.separator();

    egui::CollapsingHeader::new(RichText::new("Upload Data File").strong())
        .default_open(true)
        .show(ui, |ui: &mut Ui| {
            if ui
                .add_enabled(!state.is_busy(), egui::Button::new("Choose a file…"))
                .clicked()
            {
                open_file_dialog(state, worker, ui.ctx());
            }
            if let Some(upload) = &state.upload {
                ui.label(format!("Loaded: {}", upload.file_name));
            }
        });
    ui.separator();

    if state.dataset().is_none() {
        ui.label("No dataset loaded.");
        return;
    }

    ui.strong("Query");
    let response = ui.add(
        egui::TextEdit::singleline(&mut state.query)
            .hint_text("e.g. bar chart of revenue by 2023")
            .desired_width(f32::INFINITY),
    );
    let enter = response.lost_focus() && ui.input(|i| i.key_pressed(Key::Enter));

    let submit = ui
        .add_enabled(state.can_submit_query(), egui::Button::new("Submit"))
        .clicked();
    if (submit || enter) && state.can_submit_query() {
        submit_query(state, worker, ui.ctx());
    }

    if state.busy == Some(Busy::Querying) {
        ui.horizontal(|ui: &mut Ui| {
            ui.spinner();
            ui.label("Processing...");
        });
    }

    if let Some(answer) = &state.answer {
        ui.separator();
        ui.label(format!("Extracted attributes: {:?}", answer.attributes));
        if let Some(label) = &answer.determined_chart_type {
            ui.label(format!("Determined chart type: {label}"));
        }
        if let Err(e) = &answer.figure {
            ui.label(RichText::new(e.to_string()).color(Color32::RED));
        }
    }
}

// ---------------------------------------------------------------------------
// Central panel – data panels above the chart
// ---------------------------------------------------------------------------

pub fn data_panels(ui: &mut Ui, state: &AppState) {
    let Some(upload) = &state.upload else {
        ui.centered_and_justified(|ui: &mut Ui| {
            ui.heading("Upload a file to get started  (File → Upload…)");
        });
        return;
    };

    ui.label(format!(
        "Data loaded successfully! {} rows, {} columns.",
        upload.dataset.n_rows(),
        upload.dataset.n_columns()
    ));

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            egui::CollapsingHeader::new("Data Preview")
                .default_open(false)
                .show(ui, |ui: &mut Ui| {
                    ui.label("Here's a preview of your data:");
                    table::preview_table(ui, &upload.dataset);
                });

            egui::CollapsingHeader::new("Statistics")
                .default_open(false)
                .show(ui, |ui: &mut Ui| {
                    table::statistics_table(ui, &upload.statistics);
                });

            egui::CollapsingHeader::new("Data Summary")
                .default_open(false)
                .show(ui, |ui: &mut Ui| {
                    ui.label(upload.summary.as_str());
                });

            ui.separator();
            super::plot::chart_view(ui, state);
        });
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar.
pub fn top_bar(ui: &mut Ui, state: &mut AppState, worker: &Worker) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui
                .add_enabled(!state.is_busy(), egui::Button::new("Upload…"))
                .clicked()
            {
                open_file_dialog(state, worker, ui.ctx());
                ui.close_menu();
            }
        });

        ui.separator();

        if let Some(Busy::Uploading(name)) = &state.busy {
            ui.spinner();
            ui.label(format!("Loading {name}…"));
        } else if let Some(ds) = state.dataset() {
            ui.label(format!("{} rows × {} columns", ds.n_rows(), ds.n_columns()));
        }

        if let Some(msg) = &state.status_message {
            ui.separator();
            ui.label(RichText::new(msg).color(Color32::RED));
        }
    });
}

// ---------------------------------------------------------------------------
// Actions
// ---------------------------------------------------------------------------

pub fn open_file_dialog(state: &mut AppState, worker: &Worker, ctx: &egui::Context) {
    let file = rfd::FileDialog::new()
        .set_title("Choose a file")
        .add_filter("Supported files", &PICKER_EXTENSIONS)
        .add_filter("CSV", &["csv"])
        .add_filter("Excel", &["xlsx"])
        .add_filter("JSON", &["json"])
        .add_filter("Parquet", &["parquet"])
        .pick_file();

    let Some(path) = file else {
        return;
    };
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    match std::fs::read(&path) {
        Ok(bytes) => {
            log::info!("Uploading {file_name} ({} bytes)", bytes.len());
            state.begin_upload(&file_name);
            worker.submit(Job::Upload { file_name, bytes }, ctx);
        }
        Err(e) => {
            log::error!("Failed to read {}: {e}", path.display());
            state.status_message = Some(format!("Error: {e}"));
        }
    }
}

fn submit_query(state: &mut AppState, worker: &Worker, ctx: &egui::Context) {
    let Some(dataset) = state.dataset().cloned() else {
        return;
    };
    let query = state.query.trim().to_string();
    log::info!("Submitting query: {query}");
    state.begin_query();
    worker.submit(Job::Query { dataset, query }, ctx);
}
