use std::path::PathBuf;

use rx_annotate::app::AnnotateApp;

fn main() {
    env_logger::init();

    // Optional image path; otherwise the app opens with a file picker.
    let image_path = std::env::args().nth(1).map(PathBuf::from);

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1200.0, 860.0])
            .with_title("Rx Annotate"),
        ..Default::default()
    };

    eframe::run_native(
        "Rx Annotate",
        options,
        Box::new(move |_cc| Ok(Box::new(AnnotateApp::new(image_path)))),
    )
    .expect("Failed to run eframe");
}
