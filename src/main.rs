//! Headless driver: loads a scenario and water settings, runs the rebuild loop and
//! prints what was generated.
#![forbid(unsafe_code)]

mod scenario;
mod sim;
mod terrain;
mod watch;

use clap::Parser;
use std::error::Error;
use std::path::{Path, PathBuf};
use std::time::Duration;

use waterworks_tiles::WaterConfig;

use crate::scenario::Scenario;
use crate::sim::Sim;

#[derive(Parser, Debug)]
#[command(version, about = "Water tile clustering and connector simulation", long_about = None)]
struct Args {
    /// Scenario TOML with tiles, scripted edits and probes
    #[arg(short, long, default_value = "demos/scenario.toml")]
    scenario: PathBuf,

    /// Water settings TOML; missing file means defaults
    #[arg(short, long, default_value = "demos/water.toml")]
    config: PathBuf,

    /// Number of fixed steps to simulate
    #[arg(long, default_value_t = 60)]
    ticks: u32,

    /// Step length in seconds
    #[arg(long, default_value_t = 0.05)]
    dt: f32,

    /// Print a report every N steps (0 = only at the end)
    #[arg(long, default_value_t = 0)]
    report_every: u32,

    /// Keep running in real time and reload the settings file when it changes
    #[arg(long)]
    watch: bool,
}

fn load_config(path: &Path) -> WaterConfig {
    if !path.exists() {
        log::info!("{} not found, using default water settings", path.display());
        return WaterConfig::default();
    }
    match WaterConfig::from_path(path) {
        Ok(cfg) => cfg,
        Err(e) => {
            log::warn!("failed to load {}: {}; using defaults", path.display(), e);
            WaterConfig::default()
        }
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let config = load_config(&args.config);
    let scenario = Scenario::from_path(&args.scenario)?;
    let mut sim = Sim::new(config, scenario);
    let dt = if args.dt.is_finite() && args.dt > 0.0 { args.dt } else { 0.05 };

    for step in 1..=args.ticks {
        sim.step(dt);
        if args.report_every > 0 && step % args.report_every == 0 {
            print!("{}", sim.report());
        }
    }
    print!("{}", sim.report());

    if !args.watch {
        return Ok(());
    }
    let changes = watch::watch_file(args.config.clone());
    loop {
        let mut reload = false;
        for _ in changes.try_iter() {
            reload = true;
        }
        if reload {
            log::info!("water settings changed, reloading");
            sim.reload_config(load_config(&args.config));
            sim.world.flush();
            print!("{}", sim.report());
        }
        sim.step(dt);
        std::thread::sleep(Duration::from_secs_f32(dt));
    }
}
