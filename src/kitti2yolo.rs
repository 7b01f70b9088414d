use clap::Parser;
use log::{error, info};
use std::process::ExitCode;

use kitti2yolo::{process_dataset, ConvertArgs};

fn main() -> ExitCode {
    // Initialize the logger
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = ConvertArgs::parse();

    let config = match args.to_config() {
        Ok(config) => config,
        Err(e) => {
            error!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    if !config.label_dir().is_dir() {
        error!(
            "The KITTI label directory does not exist: {}",
            config.label_dir().display()
        );
        return ExitCode::FAILURE;
    }

    info!("Starting the conversion process...");

    match process_dataset(&config) {
        Ok(stats) if stats.frames_failed == 0 => {
            info!("Conversion process completed successfully.");
            ExitCode::SUCCESS
        }
        Ok(stats) => {
            error!(
                "Conversion finished with {} unreadable label file(s)",
                stats.frames_failed
            );
            ExitCode::FAILURE
        }
        Err(e) => {
            error!("Failed to process dataset: {}", e);
            ExitCode::FAILURE
        }
    }
}
