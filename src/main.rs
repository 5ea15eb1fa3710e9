mod app;
mod state;
mod ui;

use std::path::PathBuf;

use app::CmeExplorerApp;
use eframe::egui;

fn main() -> eframe::Result {
    env_logger::init();

    // Fixed-path variant: a file given on the command line loads at startup.
    // Without one the app starts empty and waits for File → Open….
    let initial_file = std::env::args().nth(1).map(PathBuf::from);

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1200.0, 800.0])
            .with_min_inner_size([600.0, 400.0]),
        ..Default::default()
    };

    eframe::run_native(
        "CME Explorer – Ion Flux Viewer",
        options,
        Box::new(move |_cc| Ok(Box::new(CmeExplorerApp::new(initial_file)))),
    )
}
