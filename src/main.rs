//! Marble Grid entry point
//!
//! Runs one mode on an ANSI terminal stand-in for the LED panel.

use std::io;
use std::path::PathBuf;
use std::thread;
use std::time::{Duration, Instant};

use clap::Parser;
use marblegrid::consts::FRAME_PERIOD;
use marblegrid::display::{AnsiTerminal, Display};
use marblegrid::{Grid, ModeManager, Settings};

/// Default run length when no duration is given
const DEFAULT_SECONDS: u64 = 30;

/// Physics-driven marble animations, drawn in the terminal
#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Mode to run (Bounce, Pachinko, Ringer, PhysicsRoller, Connect4, MarbleTrack)
    mode: Option<String>,
    /// How long to run before shutting down
    #[arg(value_name = "SECONDS", default_value_t = DEFAULT_SECONDS)]
    seconds: u64,
    /// JSON settings file
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
    /// Animation speed (0 - 255), overriding the settings file
    #[arg(long, value_name = "SPEED")]
    speed: Option<u8>,
}

fn load_settings(path: Option<&PathBuf>) -> Settings {
    let Some(path) = path else {
        return Settings::default();
    };
    match Settings::load(path) {
        Ok(settings) => settings,
        Err(e) => {
            log::warn!("Using default settings: {e}");
            Settings::default()
        }
    }
}

fn main() {
    env_logger::init();

    let args = Args::parse();
    let settings = load_settings(args.config.as_ref());
    let mode = args.mode.unwrap_or_else(|| settings.mode.clone());
    let run_for = Duration::from_secs(args.seconds);

    let mut manager = ModeManager::new(Grid::default(), &settings);
    if let Some(speed) = args.speed {
        manager.set_speed(speed);
    }
    log::info!(
        "Marble Grid starting in {mode} for {run_for:?} at speed {}",
        manager.speed()
    );
    if !manager.activate(&mode) {
        log::warn!("Unknown mode {mode:?}, staying on {:?}", manager.current_name());
    }

    let mut display = AnsiTerminal::new(io::stdout().lock(), settings.effective_brightness());
    let start = Instant::now();
    let mut next_frame = start;
    while start.elapsed() < run_for {
        let now = Instant::now();
        manager.render(now);

        if manager.pixels_mut().take_dirty() {
            let grid = *manager.grid();
            if let Err(e) = display.show(&grid, manager.pixels()) {
                log::warn!("Display write failed: {e}");
                break;
            }
        }

        next_frame += FRAME_PERIOD;
        let now = Instant::now();
        if next_frame > now {
            thread::sleep(next_frame - now);
        } else {
            next_frame = now;
        }
    }

    if let Some(stats) = manager.session().and_then(|s| s.stepper_stats()) {
        log::info!(
            "Physics stepped {} ticks ({} skipped on contention)",
            stats.steps(),
            stats.skipped()
        );
    }
    manager.activate("off");
    log::info!("Shut down after {} frames", display.frames());
}
