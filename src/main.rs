mod app;
mod color;
mod config;
mod data;
mod optics;
mod state;
mod ui;

use std::path::PathBuf;

use app::OpticalPathApp;
use config::AppConfig;
use eframe::egui;
use log::{error, info};

/// Config from the first CLI argument, or the built-in catalog.
fn load_config() -> AppConfig {
    let Some(path) = std::env::args_os().nth(1).map(PathBuf::from) else {
        return AppConfig::default();
    };
    match AppConfig::load(&path) {
        Ok(config) => {
            info!("Loaded config from {}", path.display());
            config
        }
        Err(e) => {
            error!("{e:#}; using the built-in catalog");
            AppConfig::default()
        }
    }
}

fn main() -> eframe::Result {
    env_logger::init();

    let config = load_config();

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 860.0])
            .with_min_inner_size([700.0, 500.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Optical Path – Light Propagation Viewer",
        options,
        Box::new(|_cc| Ok(Box::new(OpticalPathApp::new(config)))),
    )
}
