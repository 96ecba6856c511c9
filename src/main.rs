mod actions;
mod app;
mod assets;
mod config;
mod dialogs;
mod library;
mod preview;
mod remote;
mod stage;
mod toolbar;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use deskpet_ui::{EventLoop, OverlayWindowBuilder};

use crate::app::App;
use crate::config::Config;

#[derive(Parser)]
#[command(name = "deskpet", about = "Transparent desktop overlay for GIFs, images and videos")]
struct Cli {
    /// Path to the TOML configuration
    #[arg(default_value = "deskpet.toml")]
    config: PathBuf,
}

fn main() -> ExitCode {
    // Initialize logging
    env_logger::init();

    let cli = Cli::parse();

    // --- 1. LOAD CONFIG ---
    let config = match Config::load_or_default(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            log::error!("Failed to load {}: {}", cli.config.display(), e);
            return ExitCode::FAILURE;
        }
    };

    // --- 2. OPEN ASSET LIBRARY ---
    let app = match App::new(config.clone()) {
        Ok(app) => app,
        Err(e) => {
            log::error!("Failed to open asset library: {}", e);
            return ExitCode::FAILURE;
        }
    };

    // --- 3. CREATE OVERLAY WINDOW ---
    let event_loop = EventLoop::new();
    let window = match OverlayWindowBuilder::new()
        .with_config(config.window_config())
        .build(&event_loop)
    {
        Ok(window) => window,
        Err(e) => {
            log::error!("Failed to create overlay window: {}", e);
            return ExitCode::FAILURE;
        }
    };

    // Run the event loop
    deskpet_ui::run_with_app(window, event_loop, app)
}
