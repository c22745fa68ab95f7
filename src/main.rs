mod state;
mod ui;

use std::path::PathBuf;

fn main() {
    env_logger::init();

    let initial = std::env::args_os().nth(1).map(PathBuf::from);
    let settings = state::EditorSettings::default();

    let options = eframe::NativeOptions {
        viewport: eframe::egui::ViewportBuilder::default()
            .with_inner_size(settings.window_size)
            .with_min_inner_size(settings.min_window_size)
            .with_title("ArsEdit"),
        ..Default::default()
    };

    if let Err(e) = eframe::run_native(
        "ArsEdit",
        options,
        Box::new(|cc| Ok(Box::new(ui::ArsEditApp::new(cc, initial)?))),
    ) {
        log::error!("Failed to start application: {}", e);
    }
}
