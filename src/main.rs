mod app;
mod chart;
mod color;
mod config;
mod data;
mod error;
mod query;
mod services;
mod state;
mod ui;
mod worker;

use app::ChartsmithApp;
use config::AppConfig;
use eframe::egui;
use services::Services;

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let config = AppConfig::load()?;
    let services = Services::from_config(&config)?;
    log::info!(
        "Storage backend {:?} (bucket '{}'), model '{}'",
        config.storage.backend,
        config.storage.bucket,
        config.text_generation.model_id
    );

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1200.0, 800.0])
            .with_min_inner_size([600.0, 400.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Chartsmith – Interactive Data Visualization",
        options,
        Box::new(|_cc| Ok(Box::new(ChartsmithApp::new(services)))),
    )
    .map_err(|e| anyhow::anyhow!("running UI: {e}"))
}
