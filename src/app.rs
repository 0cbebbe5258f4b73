use eframe::egui;

use crate::services::Services;
use crate::state::AppState;
use crate::ui::panels;
use crate::worker::Worker;

// ---------------------------------------------------------------------------
// eframe App implementation
// ---------------------------------------------------------------------------

pub struct ChartsmithApp {
    pub state: AppState,
    worker: Worker,
}

impl ChartsmithApp {
    pub fn new(services: Services) -> Self {
        Self {
            state: AppState::default(),
            worker: Worker::new(services),
        }
    }
}

impl eframe::App for ChartsmithApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        while let Some(result) = self.worker.poll() {
            self.state.apply(result);
        }

        // ---- Top panel: menu bar ----
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            panels::top_bar(ui, &mut self.state, &self.worker);
        });

        // ---- Left side panel: upload and query ----
        egui::SidePanel::left("query_panel")
            .default_width(320.0)
            .resizable(true)
            .show(ctx, |ui| {
                panels::side_panel(ui, &mut self.state, &self.worker);
            });

        // ---- Central panel: data panels and chart ----
        egui::CentralPanel::default().show(ctx, |ui| {
            panels::data_panels(ui, &self.state);
        });
    }
}
