use clap::Parser;
use log::{error, info};
use std::path::PathBuf;
use std::process::ExitCode;

use kitti2yolo::{generate_splits, SplitArgs};

fn main() -> ExitCode {
    // Initialize the logger
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = SplitArgs::parse();

    let config = match args.to_config() {
        Ok(config) => config,
        Err(e) => {
            error!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    info!(
        "Splitting {} frames with train ratio {} (seed {})",
        config.total_frames, config.train_ratio, config.seed
    );

    match generate_splits(&config, &PathBuf::from(&args.output_dir)) {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            error!("Failed to create split files: {}", e);
            ExitCode::FAILURE
        }
    }
}
