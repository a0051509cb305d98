mod app;
mod color;
mod config;
mod dashboard;
mod data;
mod selection;
mod state;
mod ui;
mod views;

use std::path::Path;

use app::JobVizApp;
use config::DashboardConfig;
use eframe::egui;

fn main() -> eframe::Result {
    env_logger::init();

    // Optional first argument: path to a JSON config file.
    let config = match std::env::args().nth(1) {
        Some(path) => DashboardConfig::load(Path::new(&path)).unwrap_or_else(|e| {
            log::error!("{e:#}; using defaults");
            DashboardConfig::default()
        }),
        None => DashboardConfig::default(),
    };

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 860.0])
            .with_min_inner_size([640.0, 420.0]),
        ..Default::default()
    };

    eframe::run_native(
        "jobviz – Data Science Job Postings",
        options,
        Box::new(move |_cc| Ok(Box::new(JobVizApp::new(config)))),
    )
}
