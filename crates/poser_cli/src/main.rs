//! Poser CLI - headless driver for the fighter pose pipeline
//!
//! `poser simulate` runs a fighter through a fixed number of frames and
//! prints the live joint angles; `poser check` validates configuration and
//! rig files without running anything.

mod config;
mod simulate;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Poser - procedural fighter pose simulation
#[derive(Parser)]
#[command(name = "poser")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable debug logging (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a fighter through a number of frames and print its pose
    Simulate {
        /// Fighter configuration (JSON or TOML); defaults when omitted
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Number of frames to run
        #[arg(short, long, default_value_t = 60)]
        frames: u32,

        /// Milliseconds per frame
        #[arg(long, default_value_t = 16.0)]
        dt_ms: f64,

        /// Horizontal speed in pixels per second
        #[arg(short, long, default_value_t = 0.0)]
        speed: f32,

        /// Weapon rig to equip (JSON or TOML)
        #[arg(short, long)]
        weapon: Option<PathBuf>,

        /// Timed layer pushes to replay (JSON or TOML)
        #[arg(long)]
        script: Option<PathBuf>,

        /// World aim angle in degrees
        #[arg(long, allow_hyphen_values = true)]
        aim_deg: Option<f32>,

        /// Print one JSON document instead of text lines
        #[arg(long)]
        json: bool,
    },

    /// Parse and validate configuration files
    Check {
        /// Fighter configuration (JSON or TOML)
        #[arg(short, long)]
        config: PathBuf,

        /// Weapon rig to validate alongside
        #[arg(short, long)]
        weapon: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(if cli.verbose { "debug" } else { "warn" }));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match cli.command {
        Commands::Simulate {
            config: config_path,
            frames,
            dt_ms,
            speed,
            weapon,
            script,
            aim_deg,
            json,
        } => cmd_simulate(
            simulate::Simulation {
                fighter: match &config_path {
                    Some(path) => config::load_fighter(path)?,
                    None => Default::default(),
                },
                weapon: weapon.as_deref().map(config::load_rig).transpose()?,
                script: script
                    .as_deref()
                    .map(config::Script::load)
                    .transpose()?
                    .unwrap_or_default(),
                frames,
                dt_ms,
                speed,
                aim_deg,
            },
            json,
        ),
        Commands::Check {
            config: config_path,
            weapon,
        } => cmd_check(&config_path, weapon.as_deref()),
    }
}

fn cmd_simulate(sim: simulate::Simulation, json: bool) -> Result<()> {
    let reports = simulate::run(sim)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&reports)?);
    } else {
        for report in &reports {
            println!("{}", simulate::format_report(report));
        }
    }
    Ok(())
}

fn cmd_check(config_path: &Path, weapon: Option<&Path>) -> Result<()> {
    let fighter = config::load_fighter(config_path)?;
    println!(
        "{}: ok (stance torso {:.1}, gait {:.2} Hz base)",
        config_path.display(),
        fighter.stance(poser_core::Joint::Torso),
        fighter.gait.base_frequency
    );
    if let Some(path) = weapon {
        let rig = config::load_rig(path)?;
        let grips: usize = rig.bones.iter().map(|b| b.grips.len()).sum();
        println!(
            "{}: ok ({} with {} bones, {} grips)",
            path.display(),
            rig.key,
            rig.bones.len(),
            grips
        );
    }
    Ok(())
}
