//! PhysBridge demo
//!
//! Runs a headless scene for a fixed number of frames: a player body falls
//! onto a triangle-mesh ground while a skinned limb is converted into per-bone
//! boxes. The physics world's debug geometry is rebuilt into a line list every
//! frame.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Arg, ArgAction, Command};
use physbridge::config::Config;
use physbridge::foundation::logging;

mod app;
mod clock;
mod config;
mod meshes;
mod rapier_world;

use app::DemoApp;
use config::DemoConfig;

const DEFAULT_CONFIG_PATH: &str = "physbridge_demo.toml";

fn main() -> Result<()> {
    let matches = Command::new("physbridge_demo")
        .about("Drops a body onto a mesh ground and draws the physics debug lines")
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("Configuration file (.toml or .ron); defaults are used when it is missing")
                .default_value(DEFAULT_CONFIG_PATH),
        )
        .arg(
            Arg::new("frames")
                .short('f')
                .long("frames")
                .value_name("COUNT")
                .help("Frames to run (overrides the configuration)")
                .value_parser(clap::value_parser!(u32)),
        )
        .arg(
            Arg::new("no-debug-draw")
                .long("no-debug-draw")
                .help("Start with debug drawing disabled")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("write-config")
                .long("write-config")
                .value_name("FILE")
                .help("Write the effective configuration to FILE and exit"),
        )
        .get_matches();

    let config_path = matches
        .get_one::<String>("config")
        .map_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH), PathBuf::from);
    let mut config = DemoConfig::load_or_default(&config_path)
        .with_context(|| format!("Failed to load configuration from {}", config_path.display()))?;

    let filter = std::env::var("RUST_LOG").unwrap_or_else(|_| config.log_filter.clone());
    if !logging::init_with_filter(&filter) {
        eprintln!("Logger already installed; ignoring filter {filter:?}");
    }

    if let Some(frames) = matches.get_one::<u32>("frames") {
        config.run.frames = *frames;
    }

    if let Some(path) = matches.get_one::<String>("write-config") {
        config
            .save_to_file(path)
            .with_context(|| format!("Failed to write configuration to {path}"))?;
        log::info!("Configuration written to {path}");
        return Ok(());
    }

    log::info!("Starting PhysBridge demo");
    let frames = config.run.frames;
    let mut app = DemoApp::new(config).context("Failed to build demo scene")?;
    if matches.get_flag("no-debug-draw") {
        app.set_debug_drawing(false);
    }
    let summary = app.run(frames)?;
    log::debug!(
        "{} line primitive(s) alive before shutdown",
        app.scene_manager().borrow().manual_object_count()
    );
    app.shutdown();

    log::info!(
        "Demo finished: player at height {:.2} after {} frames ({} sub-steps, {} contact pairs, {} debug lines)",
        summary.player_position.y,
        summary.frames,
        summary.sub_steps,
        summary.contact_pairs,
        summary.debug_lines
    );
    Ok(())
}
