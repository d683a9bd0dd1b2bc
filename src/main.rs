//! raystage - scene editing core for a real-time ray traced renderer
//!
//! Drives the editor loop headlessly:
//! - Picking and click-to-place against the analytic scene
//! - Progressive accumulation with restarts on any change
//! - Keyframe camera paths rendered to numbered PNG frames

mod animation;
mod app;
mod cli;
mod config;
mod geometry;
mod render;
mod scene;

use clap::Parser;

fn main() {
    let args = cli::Args::parse();

    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(args.log_level.as_filter()),
    )
    .format_timestamp_millis()
    .init();

    log::info!("raystage {}", env!("CARGO_PKG_VERSION"));

    if let Err(err) = app::run(args) {
        log::error!("{}", err);
        std::process::exit(1);
    }
}
