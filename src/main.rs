use clap::Parser;
use eframe::egui;
use log::info;
use std::path::PathBuf;

use tapdeck::{config, PlayerApp};

/// Touch-friendly local video player.
#[derive(Parser)]
#[command(name = "tapdeck", version)]
struct Args {
    /// Video files handed over at launch; the first readable one plays.
    files: Vec<PathBuf>,
}

fn main() -> eframe::Result<()> {
    let logging_config = config::load_for_logging();

    let logger = fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "{}[{}][{}] {}",
                chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
                record.target(),
                record.level(),
                message
            ))
        })
        .level(log::LevelFilter::Debug)
        .chain(std::io::stdout())
        .chain(fern::log_file(&logging_config.file).unwrap());
    logger.apply().unwrap();

    info!("Starting tapdeck");

    let args = Args::parse();

    #[cfg(feature = "gstreamer")]
    gstreamer::init().expect("Failed to initialize GStreamer");

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default().with_inner_size([1280.0, 720.0]),
        ..Default::default()
    };

    eframe::run_native(
        "tapdeck",
        options,
        Box::new(move |_cc| Ok(Box::new(PlayerApp::new(args.files)))),
    )
}
