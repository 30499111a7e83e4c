// src/main.rs
#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]
use anyhow::Context;
use eframe::egui;
use gridviewer::config::ViewerConfig;
use gridviewer::gui::GridViewerApp;

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let config = ViewerConfig::from_env().context("invalid configuration")?;
    let app = GridViewerApp::new(config).context("failed to start viewer")?;

    let viewport = egui::ViewportBuilder::default()
        .with_inner_size([1000.0, 760.0])
        .with_min_inner_size([480.0, 360.0])
        .with_title("Grid Viewer");
    let options = eframe::NativeOptions {
        viewport,
        ..Default::default()
    };
    eframe::run_native("Grid Viewer", options, Box::new(move |_cc| Box::new(app)))
        .map_err(|err| anyhow::anyhow!("eframe: {err}"))
}
