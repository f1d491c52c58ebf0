//! # Sparsetex CLI
//!
//! Command-line front end for the sparsetex paging engine.
//!
//! ## Commands
//! - `init` - Write a default virtual texture config
//! - `validate` - Check a config and print the derived layout
//! - `simulate` - Drive the engine with a moving viewer and report paging stats

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use glam::Vec2;
use serde::Serialize;

use sparsetex_core::{
    ActiveTile, IndirectionTable, PagingEngine, PagingStats, VirtualTextureConfig,
    WorldPositionDriver,
};

/// Sparse virtual texture paging CLI
#[derive(Parser)]
#[command(name = "sparsetex")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Write the default config as JSON
    Init {
        /// Output file (stdout if omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Validate a config file
    Validate {
        /// Config file
        config: PathBuf,
    },

    /// Move a viewer across the texture and page tiles in
    Simulate {
        /// Config file (defaults are used if omitted)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Number of frames
        #[arg(short, long, default_value = "600")]
        frames: u32,

        /// Viewer start position
        #[arg(long, default_value = "-0.5,0", value_parser = parse_vec2, allow_hyphen_values = true)]
        start: Vec2,

        /// Viewer movement per frame
        #[arg(long, default_value = "0.002,0.001", value_parser = parse_vec2, allow_hyphen_values = true)]
        velocity: Vec2,

        /// World position of the texture centre
        #[arg(long, default_value = "0,0", value_parser = parse_vec2, allow_hyphen_values = true)]
        center: Vec2,

        /// World extent covered by the texture
        #[arg(long, default_value = "1,1", value_parser = parse_vec2, allow_hyphen_values = true)]
        scale: Vec2,

        /// Mip levels requested per frame (defaults to the texture's)
        #[arg(long)]
        mip_levels: Option<u32>,

        /// Write the final report as JSON
        #[arg(short, long)]
        snapshot: Option<PathBuf>,
    },
}

/// Parse `x,y` into a vector
pub fn parse_vec2(value: &str) -> Result<Vec2, String> {
    let (x, y) = value
        .split_once(',')
        .ok_or_else(|| format!("expected `x,y`, got `{}`", value))?;
    let x = x.trim().parse::<f32>().map_err(|e| format!("invalid x `{}`: {}", x, e))?;
    let y = y.trim().parse::<f32>().map_err(|e| format!("invalid y `{}`: {}", y, e))?;
    Ok(Vec2::new(x, y))
}

/// Simulation parameters
#[derive(Debug, Clone)]
pub struct Simulation {
    pub frames: u32,
    pub start: Vec2,
    pub velocity: Vec2,
    pub driver: WorldPositionDriver,
}

/// Outcome of a simulation run
#[derive(Debug, Clone, Serialize)]
pub struct SimulationReport {
    pub frames: u32,
    pub final_position: Vec2,
    pub stats: PagingStats,
    pub resident: usize,
    pub indirection_rebuilds: u64,
    pub tiles: Vec<ActiveTile>,
}

/// Run a simulation against a fresh engine built from `config`
pub fn run_simulation(config: &VirtualTextureConfig, simulation: &Simulation) -> Result<SimulationReport> {
    let mut engine = PagingEngine::from_texture_config(config).context("Failed to create paging engine")?;
    let mut table = IndirectionTable::new(&engine).context("Failed to create indirection table")?;

    let mut position = simulation.start;
    for frame in 0..simulation.frames {
        let requests = simulation.driver.update(position, &mut engine);
        let rebuilt = table.update(&mut engine);

        log::debug!(
            "Frame {}: pos ({:.3}, {:.3}), {} requests, {} resident, rebuilt: {}",
            frame,
            position.x,
            position.y,
            requests,
            engine.resident_count(),
            rebuilt
        );
        position += simulation.velocity;
    }

    Ok(SimulationReport {
        frames: simulation.frames,
        final_position: position,
        stats: *engine.stats(),
        resident: engine.resident_count(),
        indirection_rebuilds: table.rebuild_count(),
        tiles: table.tiles().to_vec(),
    })
}

fn load_config(path: Option<&Path>) -> Result<VirtualTextureConfig> {
    match path {
        Some(path) => VirtualTextureConfig::load(path)
            .with_context(|| format!("Failed to load config {}", path.display())),
        None => Ok(VirtualTextureConfig::default()),
    }
}

/// Execute the CLI command
pub fn execute(cli: Cli) -> Result<()> {
    if cli.verbose {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("debug")).init();
    } else {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    }

    match cli.command {
        Commands::Init { output } => {
            let json = VirtualTextureConfig::default().to_json_pretty()?;
            match output {
                Some(output) => {
                    std::fs::write(&output, json)
                        .with_context(|| format!("Failed to write {}", output.display()))?;
                    log::info!("Wrote default config to {}", output.display());
                }
                None => println!("{}", json),
            }
        }

        Commands::Validate { config } => {
            let loaded = load_config(Some(&config))?;
            let layout = loaded.layout()?;
            log::info!("Config '{}' is valid", loaded.name);
            log::info!("  Virtual size: {}x{} px", layout.virtual_width, layout.virtual_height);
            log::info!("  Pages: {}x{}", loaded.page_count_x, loaded.page_count_y);
            log::info!("  Mip levels: {} (requested {})", layout.mipmap_count, loaded.mip_count);
            log::info!("  Tile capacity: {} of {}", loaded.tile_capacity, loaded.max_tile_capacity);
        }

        Commands::Simulate { config, frames, start, velocity, center, scale, mip_levels, snapshot } => {
            let config = load_config(config.as_deref())?;
            let layout = config.layout()?;
            let simulation = Simulation {
                frames,
                start,
                velocity,
                driver: WorldPositionDriver {
                    center,
                    scale,
                    page_size: config.page_count_x,
                    mip_levels: mip_levels.unwrap_or(layout.mipmap_count),
                },
            };

            log::info!("Simulating {} frames over '{}'...", frames, config.name);
            let report = run_simulation(&config, &simulation)?;
            log::info!("  Activations: {}", report.stats.activations);
            log::info!("  Hit rate: {:.1}%", report.stats.hit_rate() * 100.0);
            log::info!("  Evictions: {}", report.stats.evictions);
            log::info!("  Ignored requests: {}", report.stats.ignored);
            log::info!("  Resident tiles: {} of {}", report.resident, config.tile_capacity);
            log::info!("  Indirection rebuilds: {}", report.indirection_rebuilds);

            if let Some(snapshot) = snapshot {
                let json = serde_json::to_string_pretty(&report)?;
                std::fs::write(&snapshot, json)
                    .with_context(|| format!("Failed to write {}", snapshot.display()))?;
                log::info!("Wrote report to {}", snapshot.display());
            }
        }
    }

    Ok(())
}
