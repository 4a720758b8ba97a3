mod annotations;
mod commands;
mod editor;
mod image_store;
mod render;
mod state;
mod tools;
mod ui;
mod viewport;

use std::path::PathBuf;

fn main() {
    env_logger::init();

    let initial_image = std::env::args_os().nth(1).map(PathBuf::from);

    let options = eframe::NativeOptions {
        viewport: eframe::egui::ViewportBuilder::default()
            .with_inner_size([1000.0, 760.0])
            .with_min_inner_size([820.0, 680.0])
            .with_title("Snapfix - Inspection Photo Editor"),
        ..Default::default()
    };

    if let Err(e) = eframe::run_native(
        "Snapfix",
        options,
        Box::new(move |cc| Ok(Box::new(ui::SnapfixApp::new(cc, initial_image)))),
    ) {
        log::error!("Failed to start application: {}", e);
    }
}
